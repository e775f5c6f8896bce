//! Target aggregation
//!
//! Folds a night's time-ordered exposures into per-target summaries:
//! first/last exposure time, frame count, total exposure, filter and
//! observer sets.

mod aggregator;
mod types;

pub use aggregator::{aggregate, aggregate_contiguous, aggregate_with, round_exposure};
pub use types::{GroupingPolicy, TargetAggregate};
