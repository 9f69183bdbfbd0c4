//! The diagnostic line emitted by `log()`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Label used when `log()` runs before any step has been applied.
pub const INITIAL_MARKER: &str = "INITIAL";

/// Which pipeline variant emitted a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineKind {
    /// `SyncPipeline`.
    Sync,
    /// `AsyncPipeline`.
    Async,
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync => write!(f, "SyncPipeline"),
            Self::Async => write!(f, "AsyncPipeline"),
        }
    }
}

/// One `log()` observation of a pipeline value.
///
/// Renders as `"<label> -> <value>"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticLine {
    /// Emitting pipeline variant.
    pub pipeline: PipelineKind,
    /// Last recorded step, `None` before the first step.
    pub step: Option<String>,
    /// Caller message, or the generated default label.
    pub label: String,
    /// The value, rendered with `{:?}`.
    pub value: String,
}

impl DiagnosticLine {
    /// Builds a line for `value`.
    ///
    /// A `message` replaces the default label entirely.
    #[must_use]
    pub fn new<T: fmt::Debug + ?Sized>(
        pipeline: PipelineKind,
        step: Option<&str>,
        message: Option<&str>,
        value: &T,
    ) -> Self {
        let label = message.map_or_else(|| Self::default_label(pipeline, step), str::to_owned);
        Self {
            pipeline,
            step: step.map(str::to_owned),
            label,
            value: format!("{value:?}"),
        }
    }

    /// The label used when no message is supplied.
    #[must_use]
    pub fn default_label(pipeline: PipelineKind, step: Option<&str>) -> String {
        format!("[{pipeline}] {}", step.unwrap_or(INITIAL_MARKER))
    }
}

impl fmt::Display for DiagnosticLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.label, self.value)
    }
}
