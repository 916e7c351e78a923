//! The dispatch loop.
//!
//! One thread multiplexes three sources: new submissions, failed requests on
//! the retry queue, and the stop signal. Submissions are handed to the send
//! pool and failures to the retry scheduler; the loop itself performs no
//! network I/O and never waits on a single request.
//!
//! When every pool worker is busy the loop holds one submission back and
//! stops reading the submission queue until a worker frees up, so the
//! queue's capacity bounds the number of pending requests. It keeps draining
//! the retry queue meanwhile, which means workers reporting a failure never
//! wait on the loop.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Select, Sender, TrySendError};

use crate::{diagnostics::Diagnostics, request::LogRequest};

/// Channels and state owned by the dispatch loop.
pub(crate) struct Dispatcher {
    pub(crate) submissions: Receiver<LogRequest>,
    pub(crate) retries: Receiver<LogRequest>,
    pub(crate) stop: Receiver<()>,
    pub(crate) jobs: Sender<LogRequest>,
    pub(crate) scheduler: Sender<LogRequest>,
    pub(crate) running: Arc<AtomicBool>,
    pub(crate) diagnostics: Diagnostics,
}

enum Step {
    Continue,
    Exit,
}

impl Dispatcher {
    pub(crate) fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("loggly-dispatch".into())
            .spawn(move || self.run())
    }

    fn run(self) {
        self.diagnostics
            .info("loggly logger starting async sender loop");
        let mut held: Option<LogRequest> = None;
        loop {
            let step = match held.take() {
                Some(request) => self.wait_for_worker(request, &mut held),
                None => self.wait_for_submission(&mut held),
            };
            if let Step::Exit = step {
                break;
            }
        }
        self.running.store(false, Ordering::Release);
        self.diagnostics
            .info("loggly logger stopped async sender loop");
    }

    fn wait_for_submission(&self, held: &mut Option<LogRequest>) -> Step {
        let mut select = Select::new();
        let stop = select.recv(&self.stop);
        let retry = select.recv(&self.retries);
        let submit = select.recv(&self.submissions);
        let op = select.select();
        match op.index() {
            i if i == stop => {
                let _ = op.recv(&self.stop);
                Step::Exit
            }
            i if i == retry => self.on_retry(op.recv(&self.retries).ok()),
            i if i == submit => match op.recv(&self.submissions) {
                Ok(request) => self.dispatch(request, held),
                Err(_) => Step::Exit,
            },
            _ => unreachable!("unregistered select index"),
        }
    }

    fn wait_for_worker(&self, request: LogRequest, held: &mut Option<LogRequest>) -> Step {
        let mut select = Select::new();
        let stop = select.recv(&self.stop);
        let retry = select.recv(&self.retries);
        let job = select.send(&self.jobs);
        let op = select.select();
        match op.index() {
            i if i == stop => {
                let _ = op.recv(&self.stop);
                Step::Exit
            }
            i if i == retry => {
                *held = Some(request);
                self.on_retry(op.recv(&self.retries).ok())
            }
            i if i == job => match op.send(&self.jobs, request) {
                Ok(()) => Step::Continue,
                Err(_) => Step::Exit,
            },
            _ => unreachable!("unregistered select index"),
        }
    }

    fn dispatch(&self, request: LogRequest, held: &mut Option<LogRequest>) -> Step {
        match self.jobs.try_send(request) {
            Ok(()) => Step::Continue,
            Err(TrySendError::Full(request)) => {
                *held = Some(request);
                Step::Continue
            }
            Err(TrySendError::Disconnected(_)) => {
                self.diagnostics
                    .warn("loggly logger send pool is gone; stopping async sender loop");
                Step::Exit
            }
        }
    }

    fn on_retry(&self, request: Option<LogRequest>) -> Step {
        let Some(request) = request else {
            return Step::Exit;
        };
        if self.scheduler.send(request).is_err() {
            self.diagnostics
                .warn("loggly logger retry scheduler is gone; dropping failed request");
        }
        Step::Continue
    }
}
