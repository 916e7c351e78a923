//! Asynchronous log shipping to the Loggly bulk HTTP endpoint.
//!
//! [`LogglyLogger::log`] serialises an event and returns immediately; a
//! background dispatcher hands it to a bounded pool of send threads and
//! retries failures after a fixed delay until the retry limit is reached.
//! [`LogglyLogger::log_sync`] sends on the calling thread and reports the
//! outcome directly.
//!
//! ```no_run
//! use loggly_shipper::{LogglyLogger, with_timestamp};
//! use serde_json::json;
//!
//! let logger = LogglyLogger::new("customer-token")?;
//! logger.log(&with_timestamp(json!({ "msg": "service started" })));
//! logger.stop()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod builder;
mod config;
mod diagnostics;
mod endpoint;
mod error;
mod limiter;
mod logger;
mod rate_limited_warner;
mod request;
mod retry;
mod sender;
mod stats;
mod timestamp;
mod transport;
mod worker;

#[cfg(test)]
mod test_utils;

pub use builder::LogglyBuilder;
pub use config::{
    DEFAULT_CAPACITY, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SHUTDOWN_TIMEOUT,
    DEFAULT_WORKERS, LogglyConfig, OverflowPolicy,
};
#[cfg(feature = "tracing")]
pub use diagnostics::TracingSink;
pub use diagnostics::{DiagnosticSink, LogSink};
pub use endpoint::{CONTENT_TYPE, DEFAULT_ENDPOINT_HOST, DEFAULT_TAG, bulk_endpoint};
pub use error::{BuildError, SendError, ShutdownError, TransportError};
pub use logger::{LogglyLogger, ShutdownReport};
pub use retry::{DEFAULT_RETRY_DELAY, DEFAULT_RETRY_LIMIT, RetryDecision, RetryPolicy};
pub use stats::LoggerStats;
pub use timestamp::{TIMESTAMP_FORMAT, TIMESTAMP_KEY, format_timestamp, timestamp, with_timestamp};
pub use transport::{HttpResponse, Transport, UreqTransport};
