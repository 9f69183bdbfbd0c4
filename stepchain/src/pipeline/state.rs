//! Pipeline success/failure state.

use crate::errors::PipelineError;

/// The state of a pipeline: exactly one of a value or a failure.
#[derive(Debug, Clone)]
pub enum PipelineState<T> {
    /// Every step so far succeeded.
    Success(T),
    /// A step failed and no recovery has run since.
    Failure(PipelineError),
}

impl<T> PipelineState<T> {
    /// Returns true if the pipeline holds a value.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns true if the pipeline holds a failure.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Returns the value, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    /// Returns the failure, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&PipelineError> {
        match self {
            Self::Success(_) => None,
            Self::Failure(error) => Some(error),
        }
    }

    /// Converts into a `Result`.
    ///
    /// # Errors
    ///
    /// Returns the carried failure.
    pub fn into_result(self) -> Result<T, PipelineError> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(error) => Err(error),
        }
    }
}

impl<T> From<Result<T, PipelineError>> for PipelineState<T> {
    fn from(result: Result<T, PipelineError>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(error) => Self::Failure(error),
        }
    }
}

impl<T> From<PipelineState<T>> for Result<T, PipelineError> {
    fn from(state: PipelineState<T>) -> Self {
        state.into_result()
    }
}
