//! Failure path: retry policy and the delay scheduler.
//!
//! A failed request is either dropped, once it has used up its retry budget,
//! or parked for a fixed delay and then resubmitted with its attempt count
//! incremented. Parked requests live in a timer heap owned by one thread, so
//! any number of retries can wait concurrently without blocking the
//! dispatcher or each other.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    diagnostics::Diagnostics,
    request::LogRequest,
    stats::{Event, Stats},
};

/// Number of retries after the initial attempt.
pub const DEFAULT_RETRY_LIMIT: u32 = 3;
/// Fixed wait before a failed request is resubmitted.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// How failed asynchronous requests are retried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt; a request is attempted at
    /// most `limit + 1` times.
    pub limit: u32,
    /// Wait before each resubmission.
    pub delay: Duration,
    /// Optional random extra wait in `0..=jitter` added to `delay`.
    pub jitter: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            limit: DEFAULT_RETRY_LIMIT,
            delay: DEFAULT_RETRY_DELAY,
            jitter: None,
        }
    }
}

/// What to do with a request that just failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Park the request and resubmit it after the retry delay.
    Retry,
    /// The retry limit is exhausted; discard the request.
    Drop,
}

impl RetryPolicy {
    /// Decide based on the number of attempts that already failed before
    /// the one being reported.
    pub fn decide(&self, prior_attempts: u32) -> RetryDecision {
        if prior_attempts >= self.limit {
            RetryDecision::Drop
        } else {
            RetryDecision::Retry
        }
    }

    fn next_delay(&self, rng: &mut impl Rng) -> Duration {
        match self.jitter {
            None => self.delay,
            Some(jitter) => {
                let max_ms = u64::try_from(jitter.as_millis()).unwrap_or(u64::MAX);
                self.delay
                    .saturating_add(Duration::from_millis(rng.gen_range(0..=max_ms)))
            }
        }
    }
}

/// A request waiting out its retry delay. `due` is `None` when the delay
/// cannot be represented as an `Instant`; such requests stay parked until
/// the scheduler shuts down.
struct Parked {
    due: Option<Instant>,
    seq: u64,
    request: LogRequest,
}

impl Parked {
    fn key(&self) -> (bool, Option<Instant>, u64) {
        (self.due.is_none(), self.due, self.seq)
    }
}

impl PartialEq for Parked {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Parked {}

impl PartialOrd for Parked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Parked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Spawn the scheduler thread.
///
/// `failed` carries requests handed over by the dispatcher; due requests go
/// back out on `resubmit`. The thread exits once `failed` disconnects,
/// abandoning whatever is still parked.
pub(crate) fn spawn_scheduler(
    policy: RetryPolicy,
    failed: Receiver<LogRequest>,
    resubmit: Sender<LogRequest>,
    stats: Arc<Stats>,
    diagnostics: Diagnostics,
) -> io::Result<JoinHandle<()>> {
    let scheduler = RetryScheduler {
        policy,
        resubmit,
        stats,
        diagnostics,
        parked: BinaryHeap::new(),
        seq: 0,
        rng: StdRng::from_entropy(),
    };
    thread::Builder::new()
        .name("loggly-retry".into())
        .spawn(move || scheduler.run(failed))
}

struct RetryScheduler {
    policy: RetryPolicy,
    resubmit: Sender<LogRequest>,
    stats: Arc<Stats>,
    diagnostics: Diagnostics,
    parked: BinaryHeap<Reverse<Parked>>,
    seq: u64,
    rng: StdRng,
}

impl RetryScheduler {
    fn run(mut self, failed: Receiver<LogRequest>) {
        loop {
            let next_due = self.parked.peek().and_then(|Reverse(next)| next.due);
            let received = match next_due {
                Some(due) => failed.recv_deadline(due),
                None => failed.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok(request) => self.handle_failure(request),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            self.resubmit_due(Instant::now());
        }
        self.abandon_parked();
    }

    fn handle_failure(&mut self, request: LogRequest) {
        match self.policy.decide(request.attempts()) {
            RetryDecision::Drop => {
                self.stats.record(Event::DroppedRetryLimit);
                self.diagnostics.warn(&format!(
                    "loggly logger dropping request with too many retries: {}",
                    self.policy.limit
                ));
            }
            RetryDecision::Retry => {
                let due = Instant::now().checked_add(self.policy.next_delay(&mut self.rng));
                self.seq += 1;
                self.parked.push(Reverse(Parked {
                    due,
                    seq: self.seq,
                    request,
                }));
            }
        }
    }

    fn resubmit_due(&mut self, now: Instant) {
        while self
            .parked
            .peek()
            .is_some_and(|Reverse(next)| next.due.is_some_and(|due| due <= now))
        {
            let Some(Reverse(parked)) = self.parked.pop() else {
                break;
            };
            let request = parked.request.into_retry();
            self.stats.record(Event::Retried);
            self.diagnostics.info(&format!(
                "loggly logger resending failed request (retry {})",
                request.attempts()
            ));
            if self.resubmit.send(request).is_err() {
                self.diagnostics.warn(
                    "loggly logger dropping retried request: async sender loop has stopped",
                );
            }
        }
    }

    fn abandon_parked(&mut self) {
        let count = self.parked.len();
        if count > 0 {
            self.diagnostics
                .warn(&format!("loggly logger abandoning {count} scheduled retries"));
            self.parked.clear();
        }
    }
}
