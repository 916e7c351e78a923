//! Background threads driving the asynchronous path.
//!
//! ```text
//! log() -> submissions -> dispatcher -> jobs -> send pool
//!              ^                ^                   |
//!              |                +---- retries <-----+ (on failure)
//!              |                |
//!              +-- scheduler <--+ (after the retry delay)
//! ```
//!
//! [`Runtime`] owns every thread handle and the stop channel, and tears them
//! down in dependency order.

mod dispatcher;
mod overflow;
mod pool;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::thread::JoinHandle;

use crossbeam_channel::{Sender as ChannelSender, bounded, unbounded};

use crate::{
    config::{LogglyConfig, OverflowPolicy},
    diagnostics::Diagnostics,
    error::BuildError,
    request::LogRequest,
    retry::spawn_scheduler,
    sender::Sender,
    stats::Stats,
};

use dispatcher::Dispatcher;
pub(crate) use overflow::OverflowForwarder;
use pool::SendPool;

/// Running background machinery of one logger.
pub(crate) struct Runtime {
    stop_tx: ChannelSender<()>,
    dispatcher: JoinHandle<()>,
    scheduler: JoinHandle<()>,
    pool: SendPool,
    diagnostics: Diagnostics,
}

/// Handles the facade keeps for submitting work.
pub(crate) struct Intake {
    pub(crate) submissions: ChannelSender<LogRequest>,
    pub(crate) overflow: Option<OverflowForwarder>,
}

impl Runtime {
    /// Allocate the queues and start the pool, scheduler, dispatcher and
    /// (for [`OverflowPolicy::Defer`]) the overflow forwarder.
    pub(crate) fn start(
        config: &LogglyConfig,
        sender: Arc<Sender>,
        running: Arc<AtomicBool>,
        stats: Arc<Stats>,
        diagnostics: Diagnostics,
    ) -> Result<(Self, Intake), BuildError> {
        let (submit_tx, submit_rx) = bounded(config.capacity);
        let (retry_tx, retry_rx) = bounded(config.capacity);
        let (jobs_tx, jobs_rx) = bounded(config.workers);
        let (schedule_tx, schedule_rx) = unbounded();
        let (stop_tx, stop_rx) = bounded(1);

        let pool = SendPool::spawn(
            config.workers,
            jobs_rx,
            retry_tx,
            sender,
            Arc::clone(&stats),
            diagnostics.clone(),
        )?;
        let scheduler = spawn_scheduler(
            config.retry.clone(),
            schedule_rx,
            submit_tx.clone(),
            stats,
            diagnostics.clone(),
        )?;
        let overflow = match config.overflow {
            OverflowPolicy::Defer => Some(OverflowForwarder::spawn(
                submit_tx.clone(),
                diagnostics.clone(),
            )?),
            OverflowPolicy::Drop => None,
        };
        let dispatcher = Dispatcher {
            submissions: submit_rx,
            retries: retry_rx,
            stop: stop_rx,
            jobs: jobs_tx,
            scheduler: schedule_tx,
            running,
            diagnostics: diagnostics.clone(),
        }
        .spawn()?;

        let runtime = Self {
            stop_tx,
            dispatcher,
            scheduler,
            pool,
            diagnostics,
        };
        let intake = Intake {
            submissions: submit_tx,
            overflow,
        };
        Ok((runtime, intake))
    }

    /// Stop the dispatcher and release the remaining threads.
    ///
    /// Send workers are only joined when `drained`; after a timed-out drain
    /// they may still be inside a request and are left to finish on their
    /// own.
    pub(crate) fn shutdown(self, overflow: Option<&mut OverflowForwarder>, drained: bool) {
        let _ = self.stop_tx.send(());
        if self.dispatcher.join().is_err() {
            self.diagnostics
                .warn("loggly logger async sender loop panicked");
        }
        if let Some(overflow) = overflow {
            overflow.close(&self.diagnostics);
        }
        if self.scheduler.join().is_err() {
            self.diagnostics.warn("loggly logger retry scheduler panicked");
        }
        if drained {
            self.pool.join(&self.diagnostics);
        }
    }
}
