//! Error taxonomy shared by the sender, the builder and the shutdown path.
//!
//! Only the synchronous path surfaces [`SendError`] to callers. The
//! asynchronous path reports the same failures through the diagnostic sink
//! and never returns them.

use std::io;

use thiserror::Error;

/// Outcome of a single failed delivery attempt.
#[derive(Debug, Error)]
pub enum SendError {
    /// The payload could not be encoded as JSON. Never retried.
    #[error("loggly encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
    /// Connection, DNS, TLS or timeout failure reported by the transport.
    #[error("loggly transport error: {0}")]
    Transport(#[from] TransportError),
    /// The endpoint answered with a non-2xx status.
    #[error("loggly returned http status {code}{}", body_suffix(.body))]
    Status { code: u16, body: Option<String> },
}

impl SendError {
    /// Whether the failed request may succeed if attempted again.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Encoding(_))
    }

    /// HTTP status code carried by a [`SendError::Status`].
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

fn body_suffix(body: &Option<String>) -> String {
    body.as_deref()
        .map(|body| format!(": {body}"))
        .unwrap_or_default()
}

/// Transport-level failure: the request never produced an HTTP response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Errors that may occur while building a logger.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Invalid user supplied configuration.
    #[error("invalid logger configuration: {0}")]
    InvalidConfig(String),
    /// The default HTTP transport could not be initialised.
    #[error("failed to initialise transport: {0}")]
    Transport(#[from] TransportError),
    /// A background thread could not be spawned.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Errors reported by [`LogglyLogger::stop`](crate::LogglyLogger::stop).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownError {
    /// The logger was already stopped by an earlier call.
    #[error("loggly logger is already stopped")]
    AlreadyStopped,
}
