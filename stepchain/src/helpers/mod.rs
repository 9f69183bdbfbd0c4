//! Helpers that plug into pipelines as ordinary steps or wrap their results.

pub mod runtime;
pub mod sequence;

pub use runtime::{result_within, run_with_timeout, TimedResult};
pub use sequence::{
    dedup_items, filter_items, find_item, flat_map_items, fold_items, map_items, sort_items,
    sum_items, take_items, try_map_items,
};
