//! Diagnostic sink trait and implementations.

use super::DiagnosticLine;
use tracing::{debug, info, Level};

/// Receives the lines emitted by `log()` steps.
///
/// Sinks must not fail; a sink that cannot deliver a line drops it.
#[cfg_attr(test, mockall::automock)]
pub trait DiagnosticSink: Send + Sync {
    /// Emits one diagnostic line.
    fn emit(&self, line: &DiagnosticLine);
}

/// A sink that discards every line.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl DiagnosticSink for NoOpSink {
    fn emit(&self, _line: &DiagnosticLine) {}
}

/// A sink that forwards lines to `tracing`.
///
/// This is the default sink.
#[derive(Debug, Clone)]
pub struct TracingSink {
    level: Level,
}

impl Default for TracingSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl TracingSink {
    /// Creates a sink logging at `level`.
    #[must_use]
    pub const fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level sink.
    #[must_use]
    pub const fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    /// Creates an info-level sink.
    #[must_use]
    pub const fn info() -> Self {
        Self::new(Level::INFO)
    }
}

impl DiagnosticSink for TracingSink {
    fn emit(&self, line: &DiagnosticLine) {
        if self.level == Level::DEBUG {
            debug!(
                target: "stepchain::diagnostics",
                pipeline = %line.pipeline,
                step = ?line.step,
                "{}", line
            );
        } else {
            info!(
                target: "stepchain::diagnostics",
                pipeline = %line.pipeline,
                step = ?line.step,
                "{}", line
            );
        }
    }
}

/// A sink that keeps every line, for tests.
#[derive(Debug, Default)]
pub struct CollectingSink {
    lines: parking_lot::RwLock<Vec<DiagnosticLine>>,
}

impl CollectingSink {
    /// Creates an empty collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected lines.
    #[must_use]
    pub fn lines(&self) -> Vec<DiagnosticLine> {
        self.lines.read().clone()
    }

    /// Returns the collected lines rendered as text.
    #[must_use]
    pub fn rendered(&self) -> Vec<String> {
        self.lines.read().iter().map(ToString::to_string).collect()
    }

    /// Returns the number of collected lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.read().len()
    }

    /// Returns true if nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.read().is_empty()
    }

    /// Clears all collected lines.
    pub fn clear(&self) {
        self.lines.write().clear();
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&self, line: &DiagnosticLine) {
        self.lines.write().push(line.clone());
    }
}
