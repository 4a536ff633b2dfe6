//! Bulk snapshot recomputation.
//!
//! `recompute_all` is the one entry point every driver shares: the cron jobs,
//! the admin HTTP trigger and ad-hoc tooling all call it with a scope and a
//! period.

use anyhow::{Context, Result};
use log::info;

use crate::db::Database;
use crate::snapshot::aggregator::{aggregate_entity, AggregationParams};
use crate::snapshot::Period;

/// Which snapshot families a recomputation run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityScope {
    Buildings,
    Areas,
    All,
}

impl EntityScope {
    fn includes_buildings(&self) -> bool {
        matches!(self, EntityScope::Buildings | EntityScope::All)
    }

    fn includes_areas(&self) -> bool {
        matches!(self, EntityScope::Areas | EntityScope::All)
    }
}

/// Outcome of one recomputation run.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct SnapshotBatchResult {
    pub buildings_processed: usize,
    pub areas_processed: usize,
    pub snapshots_written: usize,
    pub records_skipped: usize,
}

/// Recompute snapshots for every entity in scope for one period.
///
/// Idempotent: unchanged input produces identical rows (upsert by
/// (entity, bedrooms, period_start)). Malformed records are skipped inside
/// the aggregator and only counted here; an entity fetch or snapshot write
/// failure aborts the whole batch and surfaces to the caller.
///
/// Not designed for overlapping runs on the same period; the last writer
/// wins on the persisted row.
pub async fn recompute_all(
    db: &Database,
    params: AggregationParams,
    scope: EntityScope,
    period: Period,
) -> Result<SnapshotBatchResult> {
    let start = std::time::Instant::now();
    let mut result = SnapshotBatchResult::default();

    if scope.includes_buildings() {
        let buildings = db
            .postgres
            .get_buildings()
            .await
            .context("Failed to load buildings for snapshot recomputation")?;

        for building in &buildings {
            let listings = db
                .postgres
                .get_building_listings(building.id, period.start, period.end)
                .await
                .with_context(|| {
                    format!("Failed to load listings for building {}", building.id)
                })?;

            let aggregate =
                aggregate_entity(building.id, &listings, building.units_total, period, params);

            result.records_skipped += aggregate.skipped;
            result.snapshots_written += aggregate.snapshots.len();

            db.postgres
                .set_building_snapshots(&aggregate.snapshots)
                .await
                .with_context(|| {
                    format!("Failed to write snapshots for building {}", building.id)
                })?;
        }

        result.buildings_processed = buildings.len();
    }

    if scope.includes_areas() {
        let areas = db
            .postgres
            .get_areas()
            .await
            .context("Failed to load areas for snapshot recomputation")?;

        for area in &areas {
            let listings = db
                .postgres
                .get_area_listings(area.id, period.start, period.end)
                .await
                .with_context(|| format!("Failed to load listings for area {}", area.id))?;

            // Unit counts only make sense per building
            let aggregate = aggregate_entity(area.id, &listings, None, period, params);

            result.records_skipped += aggregate.skipped;
            result.snapshots_written += aggregate.snapshots.len();

            db.postgres
                .set_area_snapshots(&aggregate.snapshots)
                .await
                .with_context(|| format!("Failed to write snapshots for area {}", area.id))?;
        }

        result.areas_processed = areas.len();
    }

    info!(
        "Recomputed {} snapshots for period {} ({} buildings, {} areas, {} records skipped) in {:?}",
        result.snapshots_written,
        period,
        result.buildings_processed,
        result.areas_processed,
        result.records_skipped,
        start.elapsed()
    );

    Ok(result)
}
