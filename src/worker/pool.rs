//! Bounded pool of send threads.
//!
//! Each worker takes one request at a time from the job channel and performs
//! a single delivery attempt. Failures go back to the dispatcher through the
//! retry queue. The pool size caps how many sends run at once, however many
//! requests are failing.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender as ChannelSender};

use crate::{
    diagnostics::Diagnostics,
    request::LogRequest,
    sender::Sender,
    stats::{Event, Stats},
};

/// Handles to the running send threads.
pub(crate) struct SendPool {
    handles: Vec<JoinHandle<()>>,
}

impl SendPool {
    /// Spawn `size` workers consuming `jobs` until it disconnects.
    pub(crate) fn spawn(
        size: usize,
        jobs: Receiver<LogRequest>,
        retries: ChannelSender<LogRequest>,
        sender: Arc<Sender>,
        stats: Arc<Stats>,
        diagnostics: Diagnostics,
    ) -> io::Result<Self> {
        let handles = (0..size)
            .map(|index| {
                let worker = SendWorker {
                    jobs: jobs.clone(),
                    retries: retries.clone(),
                    sender: Arc::clone(&sender),
                    stats: Arc::clone(&stats),
                    diagnostics: diagnostics.clone(),
                };
                thread::Builder::new()
                    .name(format!("loggly-send-{index}"))
                    .spawn(move || worker.run())
            })
            .collect::<io::Result<Vec<_>>>()?;
        Ok(Self { handles })
    }

    /// Wait for every worker to exit.
    pub(crate) fn join(self, diagnostics: &Diagnostics) {
        for handle in self.handles {
            if handle.join().is_err() {
                diagnostics.warn("loggly logger send worker panicked");
            }
        }
    }
}

struct SendWorker {
    jobs: Receiver<LogRequest>,
    retries: ChannelSender<LogRequest>,
    sender: Arc<Sender>,
    stats: Arc<Stats>,
    diagnostics: Diagnostics,
}

impl SendWorker {
    fn run(self) {
        for request in self.jobs.iter() {
            self.attempt(request);
        }
    }

    fn attempt(&self, request: LogRequest) {
        match self.sender.send_encoded(request.body()) {
            Ok(()) => self.stats.record(Event::Delivered),
            Err(_) => {
                self.stats.record(Event::FailedAttempt);
                if self.retries.send(request).is_err() {
                    self.diagnostics.warn(
                        "loggly logger dropping failed request: async sender loop has stopped",
                    );
                }
            }
        }
    }
}
