//! Test assertions for pipeline failures and histories.

use super::StepSpy;
use crate::errors::PipelineError;
use crate::history::StepHistory;

/// Asserts that the error is decorated and that `step` is the failure point.
pub fn assert_failed_at(error: &PipelineError, step: &str) {
    assert!(
        error.is_decorated(),
        "Expected a history-aware error, got: {error}"
    );
    assert_eq!(
        error.failed_step(),
        Some(step),
        "Expected failure at step '{}', history: {:?}",
        step,
        error.history()
    );
}

/// Asserts that the history matches `expected`, in order.
pub fn assert_history(history: &StepHistory, expected: &[&str]) {
    let actual = history.to_vec();
    assert_eq!(
        actual, expected,
        "Expected history {expected:?}, got {actual:?}"
    );
}

/// Asserts that the error's display text contains `fragment`.
pub fn assert_trace_contains(error: &PipelineError, fragment: &str) {
    let display = error.to_string();
    assert!(
        display.contains(fragment),
        "Expected error text to contain '{fragment}', got:\n{display}"
    );
}

/// Asserts that no step built by `spy` was called.
pub fn assert_not_called(spy: &StepSpy) {
    assert_eq!(
        spy.call_count(),
        0,
        "Expected no calls, got inputs: {:?}",
        spy.recorded_inputs()
    );
}
