//! Job to recompute building snapshots for the current period.
//!
//! Also closes out the previous month on the first run after a month
//! rollover, so the final figures of a period reflect every listing that
//! arrived before the boundary.

use anyhow::Result;
use chrono::Utc;
use log::info;

use crate::config::MarketSettings;
use crate::db::Database;
use crate::snapshot::{recompute_all, AggregationParams, EntityScope, Period};

const JOB_NAME: &str = "building_snapshots";

pub async fn run(db: &Database, market: &MarketSettings) -> Result<()> {
    info!("Starting building_snapshots job...");

    let start = std::time::Instant::now();
    let now = Utc::now();
    let period = Period::month_of(now.date_naive());
    let params = AggregationParams::from(market);

    // First run after a month rollover: close out the previous period
    let last_run = db.postgres.get_cron_checkpoint(JOB_NAME).await?;
    if last_run.map_or(true, |t| t.date_naive() < period.start) {
        let previous = period.previous();
        let closed = recompute_all(db, params, EntityScope::Buildings, previous).await?;
        info!(
            "Closed out period {} ({} snapshots)",
            previous, closed.snapshots_written
        );
    }

    let result = recompute_all(db, params, EntityScope::Buildings, period).await?;

    db.postgres.set_cron_checkpoint(JOB_NAME, now).await?;

    info!(
        "Completed building_snapshots job in {:?} ({} buildings, {} snapshots, {} records skipped)",
        start.elapsed(),
        result.buildings_processed,
        result.snapshots_written,
        result.records_skipped
    );
    Ok(())
}
