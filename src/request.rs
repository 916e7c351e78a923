//! Units of asynchronous work and the accounting that tracks them.
//!
//! Every accepted payload becomes a [`LogRequest`] holding an
//! [`OutstandingGuard`]. The guard travels with the request through the
//! queues, the send pool and the retry scheduler, and releases its slot when
//! the request is dropped for any reason. `stop()` waits on that count to
//! reach zero.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// An encoded payload awaiting delivery plus the number of failed attempts
/// so far.
///
/// The body is encoded once at submission, so every attempt sends exactly
/// the bytes `log_sync` would have sent for the same payload.
#[derive(Debug)]
pub(crate) struct LogRequest {
    body: Vec<u8>,
    attempts: u32,
    _guard: OutstandingGuard,
}

impl LogRequest {
    pub(crate) fn new(body: Vec<u8>, guard: OutstandingGuard) -> Self {
        Self {
            body,
            attempts: 0,
            _guard: guard,
        }
    }

    pub(crate) fn body(&self) -> &[u8] {
        &self.body
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Carry the request forward into its next attempt.
    pub(crate) fn into_retry(mut self) -> Self {
        self.attempts = self.attempts.saturating_add(1);
        self
    }
}

#[cfg(test)]
impl LogRequest {
    pub(crate) fn from_json(payload: serde_json::Value, guard: OutstandingGuard) -> Self {
        Self::new(serde_json::to_vec(&payload).expect("JSON value encodes"), guard)
    }

    pub(crate) fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("body is JSON")
    }
}

#[derive(Debug, Default)]
struct Counter {
    count: Mutex<usize>,
    idle: Condvar,
}

/// Count of requests accepted but not yet delivered or dropped.
#[derive(Clone, Debug, Default)]
pub(crate) struct Outstanding {
    inner: Arc<Counter>,
}

impl Outstanding {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Reserve a slot; it is released when the guard drops.
    pub(crate) fn guard(&self) -> OutstandingGuard {
        *self.inner.count.lock() += 1;
        OutstandingGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    pub(crate) fn count(&self) -> usize {
        *self.inner.count.lock()
    }

    /// Block until no requests are outstanding.
    ///
    /// Returns `false` if `timeout` elapsed first. `None`, or a timeout too
    /// large to represent as a deadline, waits indefinitely.
    pub(crate) fn wait_idle(&self, timeout: Option<Duration>) -> bool {
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let mut count = self.inner.count.lock();
        while *count > 0 {
            match deadline {
                None => self.inner.idle.wait(&mut count),
                Some(deadline) => {
                    if self.inner.idle.wait_until(&mut count, deadline).timed_out() {
                        return *count == 0;
                    }
                }
            }
        }
        true
    }
}

#[derive(Debug)]
pub(crate) struct OutstandingGuard {
    inner: Arc<Counter>,
}

impl Drop for OutstandingGuard {
    fn drop(&mut self) {
        let mut count = self.inner.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.inner.idle.notify_all();
        }
    }
}
