//! Sync and async step pipelines.
//!
//! This module provides:
//! - `SyncPipeline`, which runs each step as soon as it is chained
//! - `AsyncPipeline`, which chains steps as continuations on a deferred value
//! - the shared success/failure state and step labelling

mod async_pipeline;
mod state;
mod step;
mod sync_pipeline;


pub use async_pipeline::AsyncPipeline;
pub use state::PipelineState;
pub use step::{step_label, ANONYMOUS_STEP};
pub use sync_pipeline::SyncPipeline;
