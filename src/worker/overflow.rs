//! Deferred enqueue for submissions that found the queue full.
//!
//! `log` must never block its caller. When the submission queue is full the
//! request is parked on an unbounded channel and this thread performs the
//! blocking enqueue on the caller's behalf.

use std::io;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, select, unbounded};

use crate::{diagnostics::Diagnostics, request::LogRequest};

pub(crate) struct OverflowForwarder {
    tx: Sender<LogRequest>,
    shutdown_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl OverflowForwarder {
    pub(crate) fn spawn(
        submissions: Sender<LogRequest>,
        diagnostics: Diagnostics,
    ) -> io::Result<Self> {
        let (tx, rx) = unbounded();
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(0);
        let handle = thread::Builder::new()
            .name("loggly-overflow".into())
            .spawn(move || forward_loop(rx, shutdown_rx, submissions, diagnostics))?;
        Ok(Self {
            tx,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Hand `request` to the forwarder without blocking.
    ///
    /// Returns the request if the forwarder has already exited.
    pub(crate) fn defer(&self, request: LogRequest) -> Result<(), LogRequest> {
        self.tx.send(request).map_err(|err| err.into_inner())
    }

    /// Stop the forwarder and wait for it to exit.
    pub(crate) fn close(&mut self, diagnostics: &Diagnostics) {
        self.shutdown_tx.take();
        let Some(handle) = self.handle.take() else {
            return;
        };
        if handle.join().is_err() {
            diagnostics.warn("loggly logger overflow forwarder panicked");
        }
    }
}

fn forward_loop(
    rx: Receiver<LogRequest>,
    shutdown_rx: Receiver<()>,
    submissions: Sender<LogRequest>,
    diagnostics: Diagnostics,
) {
    loop {
        select! {
            recv(rx) -> request => match request {
                Ok(request) => forward(&submissions, request, &diagnostics),
                Err(_) => break,
            },
            recv(shutdown_rx) -> _ => {
                while let Ok(request) = rx.try_recv() {
                    forward(&submissions, request, &diagnostics);
                }
                break;
            }
        }
    }
}

fn forward(submissions: &Sender<LogRequest>, request: LogRequest, diagnostics: &Diagnostics) {
    if submissions.send(request).is_err() {
        diagnostics.warn("loggly logger dropping deferred request: async sender loop has stopped");
    }
}
