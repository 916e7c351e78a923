//! Configuration consumed by [`LogglyLogger`](crate::LogglyLogger).
//!
//! [`LogglyBuilder`](crate::LogglyBuilder) validates and assembles these
//! values; `LogglyConfig` can also be filled in directly and passed to
//! [`LogglyLogger::with_config`](crate::LogglyLogger::with_config).

use std::sync::Arc;
use std::time::Duration;

use crate::{
    diagnostics::DiagnosticSink,
    endpoint::{DEFAULT_ENDPOINT_HOST, DEFAULT_TAG},
    rate_limited_warner::DEFAULT_WARN_INTERVAL,
    retry::RetryPolicy,
    transport::Transport,
};

/// Default capacity of the submission and retry queues.
pub const DEFAULT_CAPACITY: usize = 32;
/// Default number of send worker threads.
pub const DEFAULT_WORKERS: usize = 8;
/// Default TCP connect timeout for the built-in transport.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default whole-request timeout for the built-in transport.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Default time `stop()` waits for outstanding requests.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// What `log` does when the submission queue is full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Hand the payload to a background forwarder that enqueues it once
    /// space frees up. The caller never blocks and nothing is lost.
    #[default]
    Defer,
    /// Drop the payload and emit a rate-limited warning.
    Drop,
}

/// Complete logger configuration.
#[derive(Clone)]
pub struct LogglyConfig {
    /// Customer token embedded in the endpoint path.
    pub token: String,
    /// Scheme and host of the ingestion endpoint.
    pub endpoint_host: String,
    /// Tags attached to every event.
    pub tags: Vec<String>,
    /// Capacity of the submission and retry queues.
    pub capacity: usize,
    /// Size of the send worker pool.
    pub workers: usize,
    /// Cap on concurrent HTTP requests across both paths; `None` leaves
    /// only the pool size as a limit.
    pub max_in_flight: Option<usize>,
    /// Retry behaviour for the asynchronous path.
    pub retry: RetryPolicy,
    /// Behaviour when the submission queue is full.
    pub overflow: OverflowPolicy,
    /// How long `stop()` waits for outstanding requests; `None` waits
    /// indefinitely.
    pub shutdown_timeout: Option<Duration>,
    /// Connect timeout for the built-in transport.
    pub connect_timeout: Duration,
    /// Whole-request timeout for the built-in transport.
    pub request_timeout: Duration,
    /// Interval between coalesced overflow warnings.
    pub warn_interval: Duration,
    /// Custom transport; the ureq transport is used when `None`.
    pub transport: Option<Arc<dyn Transport>>,
    /// Custom diagnostic sink; [`LogSink`](crate::LogSink) is used when `None`.
    pub sink: Option<Arc<dyn DiagnosticSink>>,
}

impl LogglyConfig {
    /// Default configuration for `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            endpoint_host: DEFAULT_ENDPOINT_HOST.to_owned(),
            tags: vec![DEFAULT_TAG.to_owned()],
            capacity: DEFAULT_CAPACITY,
            workers: DEFAULT_WORKERS,
            max_in_flight: None,
            retry: RetryPolicy::default(),
            overflow: OverflowPolicy::default(),
            shutdown_timeout: Some(DEFAULT_SHUTDOWN_TIMEOUT),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            warn_interval: DEFAULT_WARN_INTERVAL,
            transport: None,
            sink: None,
        }
    }
}

impl std::fmt::Debug for LogglyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogglyConfig")
            .field("endpoint_host", &self.endpoint_host)
            .field("tags", &self.tags)
            .field("capacity", &self.capacity)
            .field("workers", &self.workers)
            .field("max_in_flight", &self.max_in_flight)
            .field("retry", &self.retry)
            .field("overflow", &self.overflow)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("custom_transport", &self.transport.is_some())
            .field("custom_sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}
