//! Sinks for human-readable diagnostic lines.
//!
//! The shipping engine never surfaces asynchronous failures to callers; it
//! reports them here instead. The default sink forwards to the `log` crate so
//! the host application's logger decides where the lines end up.

use std::sync::Arc;

use log::Level;

/// Destination for diagnostic messages emitted by the logger.
pub trait DiagnosticSink: Send + Sync {
    /// Record one diagnostic line.
    fn emit(&self, level: Level, message: &str);
}

/// Sink forwarding diagnostics to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&self, level: Level, message: &str) {
        log::log!(target: "loggly_shipper", level, "{message}");
    }
}

/// Sink forwarding diagnostics to `tracing` events.
#[cfg(feature = "tracing")]
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

#[cfg(feature = "tracing")]
impl DiagnosticSink for TracingSink {
    fn emit(&self, level: Level, message: &str) {
        match level {
            Level::Error => tracing::error!(target: "loggly_shipper", "{message}"),
            Level::Warn => tracing::warn!(target: "loggly_shipper", "{message}"),
            Level::Info => tracing::info!(target: "loggly_shipper", "{message}"),
            Level::Debug => tracing::debug!(target: "loggly_shipper", "{message}"),
            Level::Trace => tracing::trace!(target: "loggly_shipper", "{message}"),
        }
    }
}

/// Cheap cloneable handle shared by every component that reports.
#[derive(Clone)]
pub(crate) struct Diagnostics {
    sink: Arc<dyn DiagnosticSink>,
}

impl Diagnostics {
    pub(crate) fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { sink }
    }

    pub(crate) fn info(&self, message: &str) {
        self.sink.emit(Level::Info, message);
    }

    pub(crate) fn warn(&self, message: &str) {
        self.sink.emit(Level::Warn, message);
    }

    pub(crate) fn error(&self, message: &str) {
        self.sink.emit(Level::Error, message);
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(Arc::new(LogSink))
    }
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics").finish_non_exhaustive()
    }
}
