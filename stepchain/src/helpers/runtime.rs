//! Runtime helpers for awaiting pipeline results.
//!
//! Pipelines have no timeout or cancellation of their own. These helpers
//! race the deferred result against a tokio timer instead.

use crate::errors::{PipelineError, PipelineTimeout};
use crate::history::StepHistory;
use crate::pipeline::AsyncPipeline;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

/// Outcome of awaiting a pipeline result under a deadline.
#[derive(Debug)]
pub enum TimedResult<T> {
    /// The pipeline finished in the success state.
    Completed(T),
    /// The pipeline finished in the failure state.
    Failed(PipelineError),
    /// The deadline passed first.
    TimedOut(PipelineTimeout),
}

impl<T> TimedResult<T> {
    /// Returns true if the pipeline completed.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Returns true if the pipeline failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Returns true if the deadline passed first.
    #[must_use]
    pub const fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut(_))
    }

    /// Returns the value if the pipeline completed.
    #[must_use]
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Failed(_) | Self::TimedOut(_) => None,
        }
    }

    /// Folds the outcome back into a pipeline result.
    ///
    /// # Errors
    ///
    /// Returns the pipeline's failure, or the timeout wrapped as a raw
    /// [`PipelineError`].
    pub fn into_result(self) -> Result<T, PipelineError> {
        match self {
            Self::Completed(value) => Ok(value),
            Self::Failed(error) => Err(error),
            Self::TimedOut(elapsed) => Err(PipelineError::new(elapsed)),
        }
    }
}

/// Awaits a deferred pipeline result, giving up after `limit`.
///
/// `history` only labels the timeout. Must be awaited inside a tokio runtime
/// with the time driver enabled.
pub async fn run_with_timeout<T, F>(
    limit: Duration,
    history: &StepHistory,
    future: F,
) -> TimedResult<T>
where
    F: Future<Output = Result<T, PipelineError>>,
{
    match timeout(limit, future).await {
        Ok(Ok(value)) => TimedResult::Completed(value),
        Ok(Err(error)) => TimedResult::Failed(error),
        Err(_) => {
            let elapsed = PipelineTimeout::new(limit, history);
            tracing::warn!(
                limit = ?limit,
                last_step = elapsed.last_step().unwrap_or_default(),
                "Pipeline result timed out"
            );
            TimedResult::TimedOut(elapsed)
        }
    }
}

/// Awaits a pipeline's result, giving up after `limit`.
///
/// On timeout the pipeline future is dropped; steps already running are not
/// interrupted beyond that.
pub async fn result_within<T: Send + 'static>(
    pipeline: AsyncPipeline<T>,
    limit: Duration,
) -> TimedResult<T> {
    let history = pipeline.history().clone();
    run_with_timeout(limit, &history, pipeline.result()).await
}
