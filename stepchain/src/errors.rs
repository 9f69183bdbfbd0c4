//! Error types for stepchain pipelines.
//!
//! A failing step never escapes the pipeline on its own. It is captured as a
//! [`PipelineError`] and surfaced by `result()`, either unchanged or wrapped in
//! a [`HistoryAwareError`] that records which steps ran before the failure.

use crate::history::StepHistory;
use crate::trace::{format_execution_chain, TRACE_SEPARATOR};
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Boxed error accepted from step functions and handlers.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Error shared between pipeline instances.
pub type SharedError = Arc<dyn Error + Send + Sync + 'static>;

/// The failure carried by a pipeline in the failure state.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// The error produced by a step or recovery handler, unchanged.
    #[error(transparent)]
    Step(SharedError),

    /// A step error decorated with the execution history.
    #[error(transparent)]
    Decorated(#[from] HistoryAwareError),
}

impl PipelineError {
    /// Wraps an error without history.
    ///
    /// A `PipelineError` passed back in (for example the result of a nested
    /// pipeline) is unboxed rather than nested.
    #[must_use]
    pub fn new(error: impl Into<BoxError>) -> Self {
        let boxed: BoxError = error.into();
        match boxed.downcast::<Self>() {
            Ok(inner) => *inner,
            Err(other) => Self::Step(Arc::from(other)),
        }
    }

    /// Wraps an error together with the history recorded up to the failure.
    ///
    /// An already decorated error (from a nested pipeline) is re-decorated
    /// around its original, so the outer history replaces the inner one.
    #[must_use]
    pub fn decorate(error: impl Into<BoxError>, history: &StepHistory) -> Self {
        let original = match Self::new(error) {
            Self::Step(inner) => inner,
            Self::Decorated(inner) => inner.original,
        };
        Self::Decorated(HistoryAwareError::from_shared(original, history.to_vec()))
    }

    /// Returns the error originally produced by the step.
    #[must_use]
    pub fn original(&self) -> &(dyn Error + Send + Sync + 'static) {
        match self {
            Self::Step(error) => &**error,
            Self::Decorated(error) => error.original(),
        }
    }

    /// Looks up the original error by type.
    ///
    /// Works the same whether or not the error was decorated, so custom
    /// fields on a step's error type stay reachable.
    #[must_use]
    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.original().downcast_ref::<E>()
    }

    /// Returns true if the original error is of type `E`.
    #[must_use]
    pub fn is<E: Error + 'static>(&self) -> bool {
        self.downcast_ref::<E>().is_some()
    }

    /// Returns true if the error carries execution history.
    #[must_use]
    pub const fn is_decorated(&self) -> bool {
        matches!(self, Self::Decorated(_))
    }

    /// Returns the history-aware wrapper, if any.
    #[must_use]
    pub const fn as_history_aware(&self) -> Option<&HistoryAwareError> {
        match self {
            Self::Decorated(error) => Some(error),
            Self::Step(_) => None,
        }
    }

    /// Returns the recorded step labels, if the error was decorated.
    #[must_use]
    pub fn history(&self) -> Option<&[String]> {
        self.as_history_aware().map(HistoryAwareError::history)
    }

    /// Returns the label of the step that failed, if known.
    #[must_use]
    pub fn failed_step(&self) -> Option<&str> {
        self.as_history_aware().and_then(HistoryAwareError::failed_step)
    }
}

/// An error decorated with the steps executed before it occurred.
///
/// Displays as a numbered execution chain followed by the original error's
/// report. The original error remains available through [`original`],
/// [`PipelineError::downcast_ref`] and [`Error::source`].
///
/// [`original`]: HistoryAwareError::original
#[derive(Clone)]
pub struct HistoryAwareError {
    original: SharedError,
    history: Arc<[String]>,
    chain: Option<String>,
}

impl HistoryAwareError {
    /// Creates a history-aware error from an error and a step history.
    #[must_use]
    pub fn new(original: impl Into<BoxError>, history: Vec<String>) -> Self {
        let boxed: BoxError = original.into();
        Self::from_shared(Arc::from(boxed), history)
    }

    pub(crate) fn from_shared(original: SharedError, history: Vec<String>) -> Self {
        // An error with no report text gets no chain either.
        let chain = if original.to_string().is_empty() {
            None
        } else {
            Some(format_execution_chain(&history))
        };
        Self {
            original,
            history: history.into(),
            chain,
        }
    }

    /// Returns the wrapped error.
    #[must_use]
    pub fn original(&self) -> &(dyn Error + Send + Sync + 'static) {
        &*self.original
    }

    /// Returns the step labels recorded up to and including the failing step.
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Returns the label of the failing step.
    #[must_use]
    pub fn failed_step(&self) -> Option<&str> {
        self.history.last().map(String::as_str)
    }

    /// Returns the formatted execution chain, or `None` when it was omitted.
    #[must_use]
    pub fn trace(&self) -> Option<&str> {
        self.chain.as_deref()
    }
}

impl fmt::Display for HistoryAwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.chain {
            Some(chain) => write!(
                f,
                "{chain}\n{TRACE_SEPARATOR}\n{}",
                error_report(self.original())
            ),
            None => fmt::Display::fmt(&*self.original, f),
        }
    }
}

impl fmt::Debug for HistoryAwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryAwareError")
            .field("original", &self.original)
            .field("history", &self.history)
            .finish()
    }
}

impl Error for HistoryAwareError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.original())
    }
}

/// Renders an error and its chain of sources, one `Caused by:` line each.
///
/// Returns an empty string for errors whose own message is empty.
#[must_use]
pub fn error_report(error: &(dyn Error + 'static)) -> String {
    let message = error.to_string();
    if message.is_empty() {
        return message;
    }

    let mut report = message;
    let mut source = error.source();
    while let Some(cause) = source {
        report.push_str("\nCaused by: ");
        report.push_str(&cause.to_string());
        source = cause.source();
    }
    report
}

/// Error raised when a pipeline result was not ready in time.
#[derive(Debug, Clone, Error)]
#[error("Pipeline did not finish within {limit:?} (last scheduled step: {})", .last_step.as_deref().unwrap_or("none"))]
pub struct PipelineTimeout {
    limit: Duration,
    last_step: Option<String>,
}

impl PipelineTimeout {
    /// Creates a timeout error for a pipeline whose history is `history`.
    #[must_use]
    pub fn new(limit: Duration, history: &StepHistory) -> Self {
        Self {
            limit,
            last_step: history.last().map(ToString::to_string),
        }
    }

    /// Returns the time limit that was exceeded.
    #[must_use]
    pub const fn limit(&self) -> Duration {
        self.limit
    }

    /// Returns the last step scheduled before the deadline, if any.
    #[must_use]
    pub fn last_step(&self) -> Option<&str> {
        self.last_step.as_deref()
    }
}

/// Error raised when a pipeline configuration cannot be parsed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration document was not valid.
    #[error("Invalid pipeline configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
