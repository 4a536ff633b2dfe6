pub mod config;
pub mod cron;
pub mod db;
pub mod http;
pub mod report;
pub mod snapshot;

pub use config::Settings;
pub use cron::{CronScheduler, CronSettings};
pub use db::Database;
pub use snapshot::{recompute_all, EntityScope, Period, SnapshotBatchResult};
