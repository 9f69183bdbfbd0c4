//! Step spies for testing.

use parking_lot::Mutex;
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;

/// Error returned by steps built with [`StepSpy::failing`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SpyFailure {
    /// The failure message.
    pub message: String,
}

#[derive(Debug, Default)]
struct SpyState {
    call_count: Mutex<usize>,
    inputs: Mutex<Vec<String>>,
}

/// Records how often, and with what, the steps it builds are called.
///
/// Clones share their records, so a clone can be moved into a step while
/// the original is kept for assertions.
#[derive(Debug, Clone, Default)]
pub struct StepSpy {
    state: Arc<SpyState>,
}

impl StepSpy {
    /// Creates a new spy with no recorded calls.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one call with `input`.
    pub fn record<T: Debug>(&self, input: &T) {
        *self.state.call_count.lock() += 1;
        self.state.inputs.lock().push(format!("{input:?}"));
    }

    /// Returns the number of recorded calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.state.call_count.lock()
    }

    /// Returns the recorded inputs, rendered with `{:?}`.
    #[must_use]
    pub fn recorded_inputs(&self) -> Vec<String> {
        self.state.inputs.lock().clone()
    }

    /// Resets call tracking.
    pub fn reset(&self) {
        *self.state.call_count.lock() = 0;
        self.state.inputs.lock().clear();
    }

    /// Builds a step that records its input and returns it unchanged.
    pub fn passthrough<T: Debug + 'static>(&self) -> impl FnOnce(T) -> T + Send + 'static {
        let spy = self.clone();
        move |value| {
            spy.record(&value);
            value
        }
    }

    /// Builds a step that records its input and fails with `message`.
    pub fn failing<T: Debug + 'static>(
        &self,
        message: impl Into<String>,
    ) -> impl FnOnce(T) -> Result<T, SpyFailure> + Send + 'static {
        let spy = self.clone();
        let message = message.into();
        move |value| {
            spy.record(&value);
            Err(SpyFailure { message })
        }
    }
}
