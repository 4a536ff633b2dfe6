//! Market snapshot aggregation.
//!
//! This module is organized into focused submodules:
//!
//! - [`bucket`] - Bedroom bucket parsing and display
//! - [`period`] - Calendar-month period windows
//! - [`aggregator`] - Pure per-bucket statistics
//! - [`recompute`] - Bulk recomputation against the database

pub mod aggregator;
pub mod bucket;
pub mod period;
pub mod recompute;

pub use aggregator::{aggregate_entity, AggregationParams, BucketAggregate};
pub use bucket::BedroomBucket;
pub use period::Period;
pub use recompute::{recompute_all, EntityScope, SnapshotBatchResult};
