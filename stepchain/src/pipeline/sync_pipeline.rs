//! Synchronous pipeline.

use super::async_pipeline::AsyncPipeline;
use super::state::PipelineState;
use super::step::{capture_failure, label_of};
use crate::config::PipelineConfig;
use crate::errors::{BoxError, PipelineError};
use crate::history::StepHistory;
use crate::observability::{DiagnosticLine, PipelineKind};
use std::convert::Infallible;
use std::fmt::Debug;

/// A pipeline whose steps run immediately, in the calling thread.
///
/// Each chaining call consumes the pipeline and returns a new one. Once a
/// step fails, later steps are recorded in the history but not invoked until
/// a [`catch`](Self::catch) or [`recover`](Self::recover) supplies a
/// replacement value.
///
/// ```
/// use stepchain::SyncPipeline;
///
/// fn add_three(x: i32) -> i32 { x + 3 }
/// fn double(x: i32) -> i32 { x * 2 }
///
/// let value = SyncPipeline::create(5).map(add_three).map(double).result().unwrap();
/// assert_eq!(value, 16);
/// ```
#[derive(Debug, Clone)]
pub struct SyncPipeline<T> {
    state: PipelineState<T>,
    history: StepHistory,
    config: PipelineConfig,
}

impl<T> SyncPipeline<T> {
    /// Creates a pipeline holding `value`, with the default configuration.
    #[must_use]
    pub fn create(value: T) -> Self {
        Self::with_config(value, PipelineConfig::default())
    }

    /// Creates a pipeline holding `value`.
    #[must_use]
    pub fn with_config(value: T, config: PipelineConfig) -> Self {
        Self {
            state: PipelineState::Success(value),
            history: StepHistory::new(),
            config,
        }
    }

    /// Creates a pipeline from an existing result.
    ///
    /// An `Err` starts the pipeline in the failure state, undecorated.
    #[must_use]
    pub fn from_result<E: Into<BoxError>>(result: Result<T, E>) -> Self {
        Self::from_result_with_config(result, PipelineConfig::default())
    }

    /// Creates a pipeline from an existing result with an explicit configuration.
    #[must_use]
    pub fn from_result_with_config<E: Into<BoxError>>(
        result: Result<T, E>,
        config: PipelineConfig,
    ) -> Self {
        let state = match result {
            Ok(value) => PipelineState::Success(value),
            Err(error) => PipelineState::Failure(PipelineError::new(error)),
        };
        Self {
            state,
            history: StepHistory::new(),
            config,
        }
    }

    /// Applies a fallible step.
    #[must_use]
    pub fn next<U, E, F>(self, step: F) -> SyncPipeline<U>
    where
        F: FnOnce(T) -> Result<U, E>,
        E: Into<BoxError>,
    {
        let label = label_of(&step);
        self.apply(label, |value| step(value).map_err(Into::<BoxError>::into))
    }

    /// Applies a fallible step under an explicit label.
    #[must_use]
    pub fn next_as<U, E, F>(self, label: impl Into<String>, step: F) -> SyncPipeline<U>
    where
        F: FnOnce(T) -> Result<U, E>,
        E: Into<BoxError>,
    {
        self.apply(label.into(), |value| step(value).map_err(Into::<BoxError>::into))
    }

    /// Applies a fallible step that takes extra arguments.
    #[must_use]
    pub fn next_with<A, U, E, F>(self, step: F, args: A) -> SyncPipeline<U>
    where
        F: FnOnce(T, A) -> Result<U, E>,
        E: Into<BoxError>,
    {
        let label = label_of(&step);
        self.apply(label, |value| {
            step(value, args).map_err(Into::<BoxError>::into)
        })
    }

    /// Applies an infallible step.
    #[must_use]
    pub fn map<U, F>(self, step: F) -> SyncPipeline<U>
    where
        F: FnOnce(T) -> U,
    {
        let label = label_of(&step);
        self.apply(label, |value| Ok(step(value)))
    }

    /// Applies an infallible step under an explicit label.
    #[must_use]
    pub fn map_as<U, F>(self, label: impl Into<String>, step: F) -> SyncPipeline<U>
    where
        F: FnOnce(T) -> U,
    {
        self.apply(label.into(), |value| Ok(step(value)))
    }

    /// Applies an infallible step that takes extra arguments.
    #[must_use]
    pub fn map_with<A, U, F>(self, step: F, args: A) -> SyncPipeline<U>
    where
        F: FnOnce(T, A) -> U,
    {
        let label = label_of(&step);
        self.apply(label, |value| Ok(step(value, args)))
    }

    fn apply<U, S>(self, label: String, step: S) -> SyncPipeline<U>
    where
        S: FnOnce(T) -> Result<U, BoxError>,
    {
        let Self {
            state,
            history,
            config,
        } = self;
        let history = history.push(label.as_str());

        let state = match state {
            PipelineState::Success(value) => match step(value) {
                Ok(next) => PipelineState::Success(next),
                Err(error) => {
                    PipelineState::Failure(capture_failure(error, &label, &history, &config))
                }
            },
            PipelineState::Failure(error) => {
                tracing::trace!(step = %label, "Skipping step, pipeline already failed");
                PipelineState::Failure(error)
            }
        };

        SyncPipeline {
            state,
            history,
            config,
        }
    }

    /// Handles a failure with a fallible handler.
    ///
    /// On success the handler is not called. On failure the handler's `Ok`
    /// value resumes the pipeline and its `Err` replaces the failure as-is.
    /// History is kept across recovery.
    #[must_use]
    pub fn catch<E, H>(self, handler: H) -> Self
    where
        H: FnOnce(PipelineError) -> Result<T, E>,
        E: Into<BoxError>,
    {
        let Self {
            state,
            history,
            config,
        } = self;

        let state = match state {
            PipelineState::Success(value) => PipelineState::Success(value),
            PipelineState::Failure(error) => match handler(error) {
                Ok(value) => {
                    tracing::debug!(steps = history.len(), "Pipeline recovered");
                    PipelineState::Success(value)
                }
                Err(error) => PipelineState::Failure(PipelineError::new(error)),
            },
        };

        Self {
            state,
            history,
            config,
        }
    }

    /// Handles a failure with a handler that always produces a value.
    #[must_use]
    pub fn recover<H>(self, handler: H) -> Self
    where
        H: FnOnce(PipelineError) -> T,
    {
        self.catch(|error| Ok::<T, Infallible>(handler(error)))
    }

    /// Returns the final value.
    ///
    /// # Errors
    ///
    /// Returns the failure if the pipeline ended in the failure state.
    pub fn result(self) -> Result<T, PipelineError> {
        self.state.into_result()
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> &PipelineState<T> {
        &self.state
    }

    /// Returns the recorded step history.
    #[must_use]
    pub const fn history(&self) -> &StepHistory {
        &self.history
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns true if no unrecovered failure is held.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.state.is_success()
    }

    /// Returns true if an unrecovered failure is held.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        self.state.is_failure()
    }
}

impl<T: Debug> SyncPipeline<T> {
    /// Emits a diagnostic line for the current value.
    ///
    /// Does nothing in the failure state. Never changes state or history.
    #[must_use]
    pub fn log(self) -> Self {
        self.emit_line(None);
        self
    }

    /// Emits a diagnostic line labelled with `message`.
    #[must_use]
    pub fn log_as(self, message: impl AsRef<str>) -> Self {
        self.emit_line(Some(message.as_ref()));
        self
    }

    fn emit_line(&self, message: Option<&str>) {
        if let PipelineState::Success(value) = &self.state {
            let line = DiagnosticLine::new(PipelineKind::Sync, self.history.last(), message, value);
            self.config.sink().emit(&line);
        }
    }
}

impl<T: Send + 'static> SyncPipeline<T> {
    /// Continues this pipeline as an [`AsyncPipeline`].
    ///
    /// State, history and configuration carry over.
    #[must_use]
    pub fn into_async(self) -> AsyncPipeline<T> {
        AsyncPipeline::from_parts(self.state.into_result(), self.history, self.config)
    }
}
