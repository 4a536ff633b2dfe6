//! Job to recompute area snapshots for the current period.
//!
//! Mirrors the building job: closes out the previous month on the first run
//! after a rollover, then recomputes the current month.

use anyhow::Result;
use chrono::Utc;
use log::info;

use crate::config::MarketSettings;
use crate::db::Database;
use crate::snapshot::{recompute_all, AggregationParams, EntityScope, Period};

const JOB_NAME: &str = "area_snapshots";

pub async fn run(db: &Database, market: &MarketSettings) -> Result<()> {
    info!("Starting area_snapshots job...");

    let start = std::time::Instant::now();
    let now = Utc::now();
    let period = Period::month_of(now.date_naive());
    let params = AggregationParams::from(market);

    let last_run = db.postgres.get_cron_checkpoint(JOB_NAME).await?;
    if last_run.map_or(true, |t| t.date_naive() < period.start) {
        let previous = period.previous();
        let closed = recompute_all(db, params, EntityScope::Areas, previous).await?;
        info!(
            "Closed out period {} ({} snapshots)",
            previous, closed.snapshots_written
        );
    }

    let result = recompute_all(db, params, EntityScope::Areas, period).await?;

    db.postgres.set_cron_checkpoint(JOB_NAME, now).await?;

    info!(
        "Completed area_snapshots job in {:?} ({} areas, {} snapshots, {} records skipped)",
        start.elapsed(),
        result.areas_processed,
        result.snapshots_written,
        result.records_skipped
    );
    Ok(())
}
