//! Cron scheduler for periodic background tasks.
//!
//! Runs jobs like:
//! - Recomputing building snapshots for the current period
//! - Recomputing area snapshots for the current period

use std::sync::Arc;

use anyhow::Result;
use log::{error, info};
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;

use crate::config::MarketSettings;
use crate::db::Database;

use super::jobs;

/// Cron scheduler that manages periodic background jobs.
pub struct CronScheduler {
    db: Arc<Database>,
    market: Arc<MarketSettings>,
    settings: Arc<CronSettings>,
}

/// Configuration for cron job intervals
#[derive(Debug, Clone)]
pub struct CronSettings {
    /// Interval for recomputing building snapshots - default 1 hour
    pub building_snapshot_interval_secs: u64,
    /// Interval for recomputing area snapshots - default 1 hour
    pub area_snapshot_interval_secs: u64,
}

impl Default for CronSettings {
    fn default() -> Self {
        Self {
            building_snapshot_interval_secs: 3600, // 1 hour
            area_snapshot_interval_secs: 3600,     // 1 hour
        }
    }
}

impl CronScheduler {
    pub fn new(db: Arc<Database>, market: Arc<MarketSettings>, settings: CronSettings) -> Self {
        Self {
            db,
            market,
            settings: Arc::new(settings),
        }
    }

    /// Starts the cron scheduler and runs until cancellation.
    pub async fn run(&self, cancellation_token: CancellationToken) -> Result<()> {
        let mut scheduler = JobScheduler::new().await?;

        // Register all jobs
        self.register_building_snapshots_job(&scheduler).await?;
        self.register_area_snapshots_job(&scheduler).await?;

        // Start the scheduler
        scheduler.start().await?;
        info!("Cron scheduler started with {} jobs", 2);

        // Wait for cancellation
        cancellation_token.cancelled().await;
        info!("Cron scheduler shutting down...");

        scheduler.shutdown().await?;
        Ok(())
    }

    async fn register_building_snapshots_job(&self, scheduler: &JobScheduler) -> Result<()> {
        let db = self.db.clone();
        let market = self.market.clone();
        let interval = self.settings.building_snapshot_interval_secs;

        let job = Job::new_repeated_async(
            std::time::Duration::from_secs(interval),
            move |_uuid, _lock| {
                let db = db.clone();
                let market = market.clone();
                Box::pin(async move {
                    if let Err(e) = jobs::building_snapshots::run(&db, &market).await {
                        error!("Failed to recompute building snapshots: {:#}", e);
                    }
                })
            },
        )?;

        scheduler.add(job).await?;
        info!("Registered building_snapshots job (every {}s)", interval);
        Ok(())
    }

    async fn register_area_snapshots_job(&self, scheduler: &JobScheduler) -> Result<()> {
        let db = self.db.clone();
        let market = self.market.clone();
        let interval = self.settings.area_snapshot_interval_secs;

        let job = Job::new_repeated_async(
            std::time::Duration::from_secs(interval),
            move |_uuid, _lock| {
                let db = db.clone();
                let market = market.clone();
                Box::pin(async move {
                    if let Err(e) = jobs::area_snapshots::run(&db, &market).await {
                        error!("Failed to recompute area snapshots: {:#}", e);
                    }
                })
            },
        )?;

        scheduler.add(job).await?;
        info!("Registered area_snapshots job (every {}s)", interval);
        Ok(())
    }
}
