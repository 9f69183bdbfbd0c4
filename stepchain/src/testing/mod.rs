//! Testing utilities for stepchain pipelines.
//!
//! This module provides:
//! - Call-counting step spies
//! - Assertions for failures and histories
//! - Tracing setup for tests

mod assertions;
mod mocks;

pub use assertions::{assert_failed_at, assert_history, assert_not_called, assert_trace_contains};
pub use mocks::{SpyFailure, StepSpy};

use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Installs a test-friendly tracing subscriber once per process.
///
/// Honors `RUST_LOG`, falling back to `stepchain=debug`.
pub fn init_test_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("stepchain=debug"));
        // Another subscriber may already be installed by the test harness.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
