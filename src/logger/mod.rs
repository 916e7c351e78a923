//! Public logger handle.
//!
//! [`LogglyLogger`] owns the endpoint address, the shared transport and the
//! background runtime. `log` queues a payload and returns immediately,
//! `log_sync` sends on the calling thread, and `stop` drains outstanding
//! work before tearing the runtime down.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Sender as ChannelSender, TrySendError};
use parking_lot::Mutex;
use serde::Serialize;

use crate::{
    builder::{LogglyBuilder, validate},
    config::{LogglyConfig, OverflowPolicy},
    diagnostics::{Diagnostics, LogSink},
    endpoint::bulk_endpoint,
    error::{BuildError, SendError, ShutdownError},
    limiter::InFlightLimiter,
    rate_limited_warner::RateLimitedWarner,
    request::{LogRequest, Outstanding},
    sender::Sender,
    stats::{Event, LoggerStats, Stats},
    transport::{Transport, UreqTransport},
    worker::{Intake, OverflowForwarder, Runtime},
};

/// Result of [`LogglyLogger::stop`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Requests still queued, in flight or awaiting a retry when the
    /// shutdown timeout expired. Zero after a complete drain.
    pub abandoned: usize,
    /// Whether the shutdown timeout expired before the drain completed.
    pub timed_out: bool,
}

/// Asynchronous client for the Loggly bulk endpoint.
///
/// The handle is `Send + Sync`; share it behind an `Arc` to log from many
/// threads.
pub struct LogglyLogger {
    sender: Arc<Sender>,
    submissions: ChannelSender<LogRequest>,
    overflow: Mutex<Option<OverflowForwarder>>,
    overflow_policy: OverflowPolicy,
    overflow_warner: RateLimitedWarner,
    runtime: Mutex<Option<Runtime>>,
    running: Arc<AtomicBool>,
    outstanding: Outstanding,
    stats: Arc<Stats>,
    diagnostics: Diagnostics,
    shutdown_timeout: Option<Duration>,
}

impl LogglyLogger {
    /// Start a logger for `token` with default settings.
    pub fn new(token: impl Into<String>) -> Result<Self, BuildError> {
        LogglyBuilder::new(token).build()
    }

    /// Start building a customised logger.
    pub fn builder(token: impl Into<String>) -> LogglyBuilder {
        LogglyBuilder::new(token)
    }

    /// Start a logger from a complete configuration.
    pub fn with_config(config: LogglyConfig) -> Result<Self, BuildError> {
        validate(&config)?;
        let diagnostics = Diagnostics::new(config.sink.clone().unwrap_or_else(|| Arc::new(LogSink)));
        let transport: Arc<dyn Transport> = match &config.transport {
            Some(transport) => Arc::clone(transport),
            None => Arc::new(UreqTransport::new(
                config.connect_timeout,
                config.request_timeout,
            )?),
        };
        let endpoint = bulk_endpoint(&config.endpoint_host, &config.token, &config.tags);
        let limiter = config.max_in_flight.map(InFlightLimiter::new);
        let sender = Arc::new(Sender::new(
            endpoint,
            transport,
            limiter,
            diagnostics.clone(),
        ));

        let running = Arc::new(AtomicBool::new(true));
        let stats = Arc::new(Stats::default());
        let (runtime, Intake {
            submissions,
            overflow,
        }) = Runtime::start(
            &config,
            Arc::clone(&sender),
            Arc::clone(&running),
            Arc::clone(&stats),
            diagnostics.clone(),
        )?;

        Ok(Self {
            sender,
            submissions,
            overflow: Mutex::new(overflow),
            overflow_policy: config.overflow,
            overflow_warner: RateLimitedWarner::new(config.warn_interval),
            runtime: Mutex::new(Some(runtime)),
            running,
            outstanding: Outstanding::new(),
            stats,
            diagnostics,
            shutdown_timeout: config.shutdown_timeout,
        })
    }

    /// Bulk endpoint address every request is sent to.
    pub fn endpoint(&self) -> &str {
        self.sender.endpoint()
    }

    /// Whether the logger still accepts asynchronous submissions.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Snapshot of the asynchronous delivery counters.
    pub fn stats(&self) -> LoggerStats {
        self.stats.snapshot()
    }

    /// Queue `payload` for delivery without blocking.
    ///
    /// The payload is encoded here, exactly as [`log_sync`](Self::log_sync)
    /// encodes it, and the same bytes are sent on every attempt. Failures are
    /// never reported to the caller; they are written to the diagnostic
    /// sink. After [`stop`](Self::stop) the payload is dropped with a
    /// warning.
    pub fn log<T: Serialize + ?Sized>(&self, payload: &T) {
        // The slot is reserved before `running` is read; `stop` clears the
        // flag before it counts outstanding requests.
        let guard = self.outstanding.guard();
        if !self.running.load(Ordering::SeqCst) {
            drop(guard);
            self.drop_stopped();
            return;
        }
        let body = match serde_json::to_vec(payload) {
            Ok(body) => body,
            Err(err) => {
                self.stats.record(Event::DroppedEncoding);
                self.diagnostics
                    .error(&SendError::Encoding(err).to_string());
                return;
            }
        };
        self.stats.record(Event::Submitted);
        self.enqueue(LogRequest::new(body, guard));
    }

    fn drop_stopped(&self) {
        self.stats.record(Event::DroppedStopped);
        self.diagnostics
            .warn("loggly logger async sender loop is not running; dropping payload");
    }

    fn enqueue(&self, request: LogRequest) {
        let request = match self.submissions.try_send(request) {
            Ok(()) => return,
            Err(TrySendError::Full(request)) => request,
            Err(TrySendError::Disconnected(_)) => {
                self.drop_stopped();
                return;
            }
        };
        match self.overflow_policy {
            OverflowPolicy::Defer => self.defer(request),
            OverflowPolicy::Drop => self.drop_overflow(),
        }
    }

    fn defer(&self, request: LogRequest) {
        let deferred = match self.overflow.lock().as_ref() {
            Some(forwarder) => forwarder.defer(request).is_ok(),
            None => false,
        };
        if !deferred {
            self.drop_stopped();
        }
    }

    fn drop_overflow(&self) {
        self.stats.record(Event::DroppedOverflow);
        self.overflow_warner.record_drop();
        self.overflow_warner.warn_if_due(|count| {
            self.diagnostics
                .warn(&format!("loggly logger queue full; dropped {count} payloads"));
        });
    }

    /// Send `payload` on the calling thread, bypassing the queues.
    ///
    /// Makes exactly one attempt and returns its outcome. Works after
    /// [`stop`](Self::stop) as well, since no background thread is involved.
    pub fn log_sync<T: Serialize + ?Sized>(&self, payload: &T) -> Result<(), SendError> {
        self.sender.send(payload)
    }

    /// Stop accepting submissions, drain outstanding requests and shut the
    /// background threads down.
    ///
    /// Waits up to the configured shutdown timeout for queued, in-flight and
    /// retrying requests to finish. Whatever remains afterwards is abandoned
    /// and counted in the report.
    pub fn stop(&self) -> Result<ShutdownReport, ShutdownError> {
        let Some(runtime) = self.runtime.lock().take() else {
            return Err(ShutdownError::AlreadyStopped);
        };
        self.diagnostics
            .info("loggly logger stopping async sender loop...");
        self.running.store(false, Ordering::SeqCst);

        let drained = self.outstanding.wait_idle(self.shutdown_timeout);
        let abandoned = if drained { 0 } else { self.outstanding.count() };
        if !drained {
            self.diagnostics.warn(&format!(
                "loggly logger abandoning {abandoned} outstanding requests after {:?}",
                self.shutdown_timeout.unwrap_or_default()
            ));
        }

        let mut overflow = self.overflow.lock().take();
        runtime.shutdown(overflow.as_mut(), drained);
        self.overflow_warner.flush(|count| {
            self.diagnostics
                .warn(&format!("loggly logger queue full; dropped {count} payloads"));
        });

        Ok(ShutdownReport {
            abandoned,
            timed_out: !drained,
        })
    }
}

impl Drop for LogglyLogger {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

impl std::fmt::Debug for LogglyLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogglyLogger")
            .field("sender", &self.sender)
            .field("running", &self.is_running())
            .field("outstanding", &self.outstanding.count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "logger_tests.rs"]
mod tests;
