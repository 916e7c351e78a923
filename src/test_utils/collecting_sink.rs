//! A diagnostic sink that accumulates lines in memory for assertions.

use log::Level;
use parking_lot::Mutex;

use crate::diagnostics::DiagnosticSink;

/// Sink that stores every diagnostic it receives for later inspection.
#[derive(Debug, Default)]
pub struct CollectingSink {
    lines: Mutex<Vec<(Level, String)>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all lines received so far.
    pub fn messages(&self) -> Vec<(Level, String)> {
        self.lines.lock().clone()
    }

    /// Lines whose text contains `needle`.
    pub fn matching(&self, needle: &str) -> Vec<(Level, String)> {
        self.lines
            .lock()
            .iter()
            .filter(|(_, line)| line.contains(needle))
            .cloned()
            .collect()
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&self, level: Level, message: &str) {
        self.lines.lock().push((level, message.to_owned()));
    }
}
