//! # Stepchain
//!
//! Compose sequences of step functions into a readable, linear pipeline.
//!
//! Stepchain provides:
//!
//! - **`SyncPipeline`**: runs each step immediately; a failing step puts the
//!   pipeline into a failure state that skips later steps until recovered
//! - **`AsyncPipeline`**: chains steps as continuations on a deferred value,
//!   with the same skip-until-recovered semantics
//! - **`HistoryAwareError`**: wraps a step's error with the ordered list of
//!   steps that ran before it, rendered as a readable execution chain
//!
//! ## Quick Start
//!
//! ```rust
//! use stepchain::prelude::*;
//!
//! fn parse(input: &str) -> Result<i32, std::num::ParseIntError> {
//!     input.trim().parse()
//! }
//!
//! fn double(x: i32) -> i32 {
//!     x * 2
//! }
//!
//! let value = SyncPipeline::create(" 21 ")
//!     .next(parse)
//!     .map(double)
//!     .log()
//!     .result()?;
//! assert_eq!(value, 42);
//!
//! let error = SyncPipeline::create("forty-two").next(parse).map(double).result().unwrap_err();
//! assert_eq!(error.failed_step(), Some("parse"));
//! # Ok::<(), PipelineError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod errors;
pub mod helpers;
pub mod history;
pub mod observability;
pub mod pipeline;
pub mod testing;
pub mod trace;

pub use config::PipelineConfig;
pub use errors::{BoxError, HistoryAwareError, PipelineError};
pub use history::StepHistory;
pub use pipeline::{AsyncPipeline, PipelineState, SyncPipeline};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::PipelineConfig;
    pub use crate::errors::{
        BoxError, ConfigError, HistoryAwareError, PipelineError, PipelineTimeout,
    };
    pub use crate::history::StepHistory;
    pub use crate::observability::{
        CollectingSink, DiagnosticLine, DiagnosticSink, NoOpSink, PipelineKind, TracingSink,
    };
    pub use crate::pipeline::{
        step_label, AsyncPipeline, PipelineState, SyncPipeline, ANONYMOUS_STEP,
    };
    pub use crate::trace::format_execution_chain;
}
