//! Delivery counters shared by the facade and the background threads.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Events counted over the lifetime of a logger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Event {
    Submitted,
    Delivered,
    FailedAttempt,
    Retried,
    DroppedEncoding,
    DroppedRetryLimit,
    DroppedStopped,
    DroppedOverflow,
}

#[derive(Debug, Default)]
pub(crate) struct Stats {
    submitted: AtomicU64,
    delivered: AtomicU64,
    failed_attempts: AtomicU64,
    retried: AtomicU64,
    dropped_encoding: AtomicU64,
    dropped_retry_limit: AtomicU64,
    dropped_stopped: AtomicU64,
    dropped_overflow: AtomicU64,
}

impl Stats {
    pub(crate) fn record(&self, event: Event) {
        let counter = match event {
            Event::Submitted => &self.submitted,
            Event::Delivered => &self.delivered,
            Event::FailedAttempt => &self.failed_attempts,
            Event::Retried => &self.retried,
            Event::DroppedEncoding => &self.dropped_encoding,
            Event::DroppedRetryLimit => &self.dropped_retry_limit,
            Event::DroppedStopped => &self.dropped_stopped,
            Event::DroppedOverflow => &self.dropped_overflow,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> LoggerStats {
        let read = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        LoggerStats {
            submitted: read(&self.submitted),
            delivered: read(&self.delivered),
            failed_attempts: read(&self.failed_attempts),
            retried: read(&self.retried),
            dropped_encoding: read(&self.dropped_encoding),
            dropped_retry_limit: read(&self.dropped_retry_limit),
            dropped_stopped: read(&self.dropped_stopped),
            dropped_overflow: read(&self.dropped_overflow),
        }
    }
}

/// Point-in-time copy of the logger's counters.
///
/// Counts cover the asynchronous path only; `log_sync` reports its outcome
/// directly to the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LoggerStats {
    /// Payloads accepted by `log` while the logger was running.
    pub submitted: u64,
    /// Requests the endpoint acknowledged with a 2xx status.
    pub delivered: u64,
    /// Individual send attempts that failed with a retryable error.
    pub failed_attempts: u64,
    /// Requests resubmitted after the retry delay.
    pub retried: u64,
    /// Payloads that could not be encoded.
    pub dropped_encoding: u64,
    /// Requests abandoned after exhausting the retry limit.
    pub dropped_retry_limit: u64,
    /// Payloads rejected because the logger was stopped.
    pub dropped_stopped: u64,
    /// Payloads rejected because the submission queue was full.
    pub dropped_overflow: u64,
}
