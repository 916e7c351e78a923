//! Builder for [`LogglyLogger`].
//!
//! Collects overrides on top of [`LogglyConfig::new`] and validates them in
//! one place before any thread is started.

use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::{LogglyConfig, OverflowPolicy},
    diagnostics::DiagnosticSink,
    error::BuildError,
    logger::LogglyLogger,
    retry::RetryPolicy,
    transport::Transport,
};

macro_rules! ensure_positive {
    ($value:expr, $field:expr) => {{
        if $value == 0 {
            Err(BuildError::InvalidConfig(format!(
                "{} must be greater than zero",
                $field
            )))
        } else {
            Ok($value)
        }
    }};
}

macro_rules! config_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: $ty) -> Self {
            self.config.$field = value;
            self
        }
    };
}

/// Builder for constructing [`LogglyLogger`] instances.
#[derive(Clone, Debug)]
pub struct LogglyBuilder {
    config: LogglyConfig,
}

impl LogglyBuilder {
    /// Start from the defaults for `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            config: LogglyConfig::new(token),
        }
    }

    /// Send to another scheme and host, e.g. a proxy or a local test server.
    pub fn with_endpoint_host(mut self, host: impl Into<String>) -> Self {
        self.config.endpoint_host = host.into();
        self
    }

    /// Replace the default `bulk` tag.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    config_setter!(
        #[doc = "Set the submission and retry queue capacity."]
        with_capacity,
        capacity,
        usize
    );
    config_setter!(
        #[doc = "Set the number of send worker threads."]
        with_workers,
        workers,
        usize
    );
    config_setter!(
        #[doc = "Set the retry policy for the asynchronous path."]
        with_retry_policy,
        retry,
        RetryPolicy
    );
    config_setter!(
        #[doc = "Choose what happens when the submission queue is full."]
        with_overflow_policy,
        overflow,
        OverflowPolicy
    );
    config_setter!(
        #[doc = "Set the connect timeout of the built-in transport."]
        with_connect_timeout,
        connect_timeout,
        Duration
    );
    config_setter!(
        #[doc = "Set the whole-request timeout of the built-in transport."]
        with_request_timeout,
        request_timeout,
        Duration
    );
    config_setter!(
        #[doc = "Set the interval between coalesced overflow warnings."]
        with_warn_interval,
        warn_interval,
        Duration
    );

    /// Set the number of retries after the first attempt.
    pub fn with_retry_limit(mut self, limit: u32) -> Self {
        self.config.retry.limit = limit;
        self
    }

    /// Set the fixed wait before each resubmission.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry.delay = delay;
        self
    }

    /// Cap concurrent HTTP requests. A limit of one serialises every send.
    pub fn with_max_in_flight(mut self, limit: usize) -> Self {
        self.config.max_in_flight = Some(limit);
        self
    }

    /// Bound how long `stop()` waits; `None` waits until drained.
    pub fn with_shutdown_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.shutdown_timeout = timeout;
        self
    }

    /// Use a custom transport instead of the built-in ureq agent.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.config.transport = Some(transport);
        self
    }

    /// Route diagnostics to a custom sink.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.config.sink = Some(sink);
        self
    }

    /// Validate and return the assembled configuration.
    pub fn build_config(self) -> Result<LogglyConfig, BuildError> {
        validate(&self.config)?;
        Ok(self.config)
    }

    /// Validate the configuration and start the logger.
    pub fn build(self) -> Result<LogglyLogger, BuildError> {
        LogglyLogger::with_config(self.build_config()?)
    }
}

pub(crate) fn validate(config: &LogglyConfig) -> Result<(), BuildError> {
    validate_token(&config.token)?;
    validate_endpoint(config)?;
    ensure_positive!(config.capacity, "capacity")?;
    ensure_positive!(config.workers, "workers")?;
    if let Some(limit) = config.max_in_flight {
        ensure_positive!(limit, "max_in_flight")?;
    }
    Ok(())
}

fn validate_token(token: &str) -> Result<(), BuildError> {
    if token.trim().is_empty() {
        return Err(BuildError::InvalidConfig("token must not be empty".into()));
    }
    Ok(())
}

fn validate_endpoint(config: &LogglyConfig) -> Result<(), BuildError> {
    if config.endpoint_host.trim().is_empty() {
        return Err(BuildError::InvalidConfig(
            "endpoint host must not be empty".into(),
        ));
    }
    if config.tags.is_empty() {
        return Err(BuildError::InvalidConfig(
            "at least one tag is required".into(),
        ));
    }
    if config.tags.iter().any(|tag| tag.trim().is_empty()) {
        return Err(BuildError::InvalidConfig("tags must not be empty".into()));
    }
    Ok(())
}
