use chrono::{DateTime, NaiveDate, Utc};
use log::error;

use crate::db::models::{Area, Building, Listing, ListingKind, MarketSnapshot};
use crate::db::postgres::PostgresClient;

/// Sanitize a string for PostgreSQL by removing null bytes (0x00)
/// which are invalid in UTF-8 text columns. Scraped listing fields
/// occasionally carry them.
fn sanitize_string(s: &str) -> String {
    s.replace('\0', "")
}

/// Snapshot tables share one shape; building and area snapshots only differ
/// in which entity the id column points at.
#[derive(Debug, Clone, Copy)]
enum SnapshotTable {
    Building,
    Area,
}

impl SnapshotTable {
    fn name(&self) -> &'static str {
        match self {
            SnapshotTable::Building => "market.building_snapshots",
            SnapshotTable::Area => "market.area_snapshots",
        }
    }
}

impl PostgresClient {
    // ==================== AREAS ====================

    /// Get all areas from the database
    pub async fn get_areas(&self) -> anyhow::Result<Vec<Area>> {
        let client = self.pool.get().await?;
        let query = "SELECT id, name, updated_at FROM market.areas ORDER BY id";

        let rows = client.query(query, &[]).await?;
        Ok(rows.iter().map(row_to_area).collect())
    }

    /// Get a single area by id
    pub async fn get_area(&self, id: i64) -> anyhow::Result<Option<Area>> {
        let client = self.pool.get().await?;
        let query = "SELECT id, name, updated_at FROM market.areas WHERE id = $1";

        let row = client.query_opt(query, &[&id]).await?;
        Ok(row.as_ref().map(row_to_area))
    }

    // ==================== BUILDINGS ====================

    /// Get all buildings from the database
    pub async fn get_buildings(&self) -> anyhow::Result<Vec<Building>> {
        let client = self.pool.get().await?;
        let query = r#"
            SELECT id, name, area_id, units_total, updated_at
            FROM market.buildings
            ORDER BY id
        "#;

        let rows = client.query(query, &[]).await?;
        Ok(rows.iter().map(row_to_building).collect())
    }

    /// Get a single building by id
    pub async fn get_building(&self, id: i64) -> anyhow::Result<Option<Building>> {
        let client = self.pool.get().await?;
        let query = r#"
            SELECT id, name, area_id, units_total, updated_at
            FROM market.buildings
            WHERE id = $1
        "#;

        let row = client.query_opt(query, &[&id]).await?;
        Ok(row.as_ref().map(row_to_building))
    }

    // ==================== LISTINGS ====================

    /// Get raw listings for one building within a period window [start, end)
    pub async fn get_building_listings(
        &self,
        building_id: i64,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> anyhow::Result<Vec<Listing>> {
        let client = self.pool.get().await?;
        let query = r#"
            SELECT source_id, building_id, kind, price, bedrooms, area_sqm,
                   listed_at, delisted_at
            FROM market.listings
            WHERE building_id = $1
              AND listed_at < $3
              AND (delisted_at IS NULL OR delisted_at >= $2)
        "#;

        let rows = client
            .query(query, &[&building_id, &period_start, &period_end])
            .await?;
        Ok(rows.iter().filter_map(row_to_listing).collect())
    }

    /// Get raw listings for all buildings of one area within a period window
    pub async fn get_area_listings(
        &self,
        area_id: i64,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> anyhow::Result<Vec<Listing>> {
        let client = self.pool.get().await?;
        let query = r#"
            SELECT l.source_id, l.building_id, l.kind, l.price, l.bedrooms, l.area_sqm,
                   l.listed_at, l.delisted_at
            FROM market.listings l
            JOIN market.buildings b ON b.id = l.building_id
            WHERE b.area_id = $1
              AND l.listed_at < $3
              AND (l.delisted_at IS NULL OR l.delisted_at >= $2)
        "#;

        let rows = client
            .query(query, &[&area_id, &period_start, &period_end])
            .await?;
        Ok(rows.iter().filter_map(row_to_listing).collect())
    }

    /// Batch insert/update raw listings (multi-row VALUES, chunked).
    /// Upserts by upstream source_id so re-imports are harmless.
    pub async fn set_listings(&self, listings: &[Listing]) -> anyhow::Result<()> {
        if listings.is_empty() {
            return Ok(());
        }

        const COLS_PER_ROW: usize = 8;
        const BATCH_SIZE: usize = 1000;

        let client = self.pool.get().await?;

        for chunk in listings.chunks(BATCH_SIZE) {
            // Build VALUES placeholders: ($1,...,$8), ($9,...,$16), ...
            let values_clauses: Vec<String> = chunk
                .iter()
                .enumerate()
                .map(|(i, _)| {
                    let start = i * COLS_PER_ROW + 1;
                    let placeholders: Vec<String> = (start..start + COLS_PER_ROW)
                        .map(|n| format!("${}", n))
                        .collect();
                    format!("({})", placeholders.join(", "))
                })
                .collect();

            let query = format!(
                r#"
                INSERT INTO market.listings (
                    source_id, building_id, kind, price, bedrooms, area_sqm,
                    listed_at, delisted_at
                ) VALUES {}
                ON CONFLICT (source_id) DO UPDATE SET
                    building_id = EXCLUDED.building_id,
                    kind = EXCLUDED.kind,
                    price = EXCLUDED.price,
                    bedrooms = EXCLUDED.bedrooms,
                    area_sqm = EXCLUDED.area_sqm,
                    listed_at = EXCLUDED.listed_at,
                    delisted_at = EXCLUDED.delisted_at
                "#,
                values_clauses.join(", ")
            );

            // Sanitized strings must outlive the params array
            let mut sanitized: Vec<(String, Option<String>)> = Vec::with_capacity(chunk.len());
            for listing in chunk {
                sanitized.push((
                    sanitize_string(&listing.source_id),
                    listing.bedrooms.as_deref().map(sanitize_string),
                ));
            }

            let mut params: Vec<&(dyn tokio_postgres::types::ToSql + Sync)> =
                Vec::with_capacity(chunk.len() * COLS_PER_ROW);

            for (i, listing) in chunk.iter().enumerate() {
                params.push(&sanitized[i].0);
                params.push(&listing.building_id);
                params.push(match listing.kind {
                    ListingKind::Sale => &"sale",
                    ListingKind::Rent => &"rent",
                });
                params.push(&listing.price);
                params.push(&sanitized[i].1);
                params.push(&listing.area_sqm);
                params.push(&listing.listed_at);
                params.push(&listing.delisted_at);
            }

            client.execute(&query, &params).await.map_err(|e| {
                error!("Failed to batch insert {} listings: {:?}", chunk.len(), e);
                e
            })?;
        }

        Ok(())
    }

    // ==================== SNAPSHOTS ====================

    /// Batch upsert building snapshots, one row per
    /// (building, bedrooms, period_start)
    pub async fn set_building_snapshots(
        &self,
        snapshots: &[MarketSnapshot],
    ) -> anyhow::Result<()> {
        self.set_snapshots(SnapshotTable::Building, snapshots).await
    }

    /// Batch upsert area snapshots, one row per (area, bedrooms, period_start)
    pub async fn set_area_snapshots(&self, snapshots: &[MarketSnapshot]) -> anyhow::Result<()> {
        self.set_snapshots(SnapshotTable::Area, snapshots).await
    }

    async fn set_snapshots(
        &self,
        table: SnapshotTable,
        snapshots: &[MarketSnapshot],
    ) -> anyhow::Result<()> {
        if snapshots.is_empty() {
            return Ok(());
        }

        const COLS_PER_ROW: usize = 21;
        const BATCH_SIZE: usize = 300; // Smaller batches due to large number of columns

        let client = self.pool.get().await?;

        for chunk in snapshots.chunks(BATCH_SIZE) {
            let values_clauses: Vec<String> = chunk
                .iter()
                .enumerate()
                .map(|(i, _)| {
                    let start = i * COLS_PER_ROW + 1;
                    let placeholders: Vec<String> = (start..start + COLS_PER_ROW)
                        .map(|n| format!("${}", n))
                        .collect();
                    format!("({})", placeholders.join(", "))
                })
                .collect();

            let query = format!(
                r#"
                INSERT INTO {} (
                    entity_id, bedrooms, period_start, period_end,
                    sale_count, rent_count,
                    avg_sale_price, median_sale_price, min_sale_price, max_sale_price,
                    avg_rent_price, median_rent_price, min_rent_price, max_rent_price,
                    avg_sale_exposure_days, avg_rent_exposure_days,
                    sale_ads_per_unit, rent_ads_per_unit,
                    sale_liquidity, rent_liquidity, roi
                ) VALUES {}
                ON CONFLICT (entity_id, bedrooms, period_start) DO UPDATE SET
                    period_end = EXCLUDED.period_end,
                    sale_count = EXCLUDED.sale_count,
                    rent_count = EXCLUDED.rent_count,
                    avg_sale_price = EXCLUDED.avg_sale_price,
                    median_sale_price = EXCLUDED.median_sale_price,
                    min_sale_price = EXCLUDED.min_sale_price,
                    max_sale_price = EXCLUDED.max_sale_price,
                    avg_rent_price = EXCLUDED.avg_rent_price,
                    median_rent_price = EXCLUDED.median_rent_price,
                    min_rent_price = EXCLUDED.min_rent_price,
                    max_rent_price = EXCLUDED.max_rent_price,
                    avg_sale_exposure_days = EXCLUDED.avg_sale_exposure_days,
                    avg_rent_exposure_days = EXCLUDED.avg_rent_exposure_days,
                    sale_ads_per_unit = EXCLUDED.sale_ads_per_unit,
                    rent_ads_per_unit = EXCLUDED.rent_ads_per_unit,
                    sale_liquidity = EXCLUDED.sale_liquidity,
                    rent_liquidity = EXCLUDED.rent_liquidity,
                    roi = EXCLUDED.roi
                "#,
                table.name(),
                values_clauses.join(", ")
            );

            let mut params: Vec<&(dyn tokio_postgres::types::ToSql + Sync)> =
                Vec::with_capacity(chunk.len() * COLS_PER_ROW);

            for snapshot in chunk {
                params.push(&snapshot.entity_id);
                params.push(&snapshot.bedrooms);
                params.push(&snapshot.period_start);
                params.push(&snapshot.period_end);
                params.push(&snapshot.sale_count);
                params.push(&snapshot.rent_count);
                params.push(&snapshot.avg_sale_price);
                params.push(&snapshot.median_sale_price);
                params.push(&snapshot.min_sale_price);
                params.push(&snapshot.max_sale_price);
                params.push(&snapshot.avg_rent_price);
                params.push(&snapshot.median_rent_price);
                params.push(&snapshot.min_rent_price);
                params.push(&snapshot.max_rent_price);
                params.push(&snapshot.avg_sale_exposure_days);
                params.push(&snapshot.avg_rent_exposure_days);
                params.push(&snapshot.sale_ads_per_unit);
                params.push(&snapshot.rent_ads_per_unit);
                params.push(&snapshot.sale_liquidity);
                params.push(&snapshot.rent_liquidity);
                params.push(&snapshot.roi);
            }

            client.execute(&query, &params).await.map_err(|e| {
                error!(
                    "Failed to batch insert {} snapshots into {}: {:?}",
                    chunk.len(),
                    table.name(),
                    e
                );
                e
            })?;
        }

        Ok(())
    }

    /// Get all building snapshots for one building and period
    pub async fn get_building_snapshots(
        &self,
        building_id: i64,
        period_start: NaiveDate,
    ) -> anyhow::Result<Vec<MarketSnapshot>> {
        self.get_snapshots(SnapshotTable::Building, building_id, period_start)
            .await
    }

    /// Get all area snapshots for one area and period
    pub async fn get_area_snapshots(
        &self,
        area_id: i64,
        period_start: NaiveDate,
    ) -> anyhow::Result<Vec<MarketSnapshot>> {
        self.get_snapshots(SnapshotTable::Area, area_id, period_start)
            .await
    }

    async fn get_snapshots(
        &self,
        table: SnapshotTable,
        entity_id: i64,
        period_start: NaiveDate,
    ) -> anyhow::Result<Vec<MarketSnapshot>> {
        let client = self.pool.get().await?;
        let query = format!(
            r#"
            SELECT entity_id, bedrooms, period_start, period_end,
                   sale_count, rent_count,
                   avg_sale_price, median_sale_price, min_sale_price, max_sale_price,
                   avg_rent_price, median_rent_price, min_rent_price, max_rent_price,
                   avg_sale_exposure_days, avg_rent_exposure_days,
                   sale_ads_per_unit, rent_ads_per_unit,
                   sale_liquidity, rent_liquidity, roi
            FROM {}
            WHERE entity_id = $1 AND period_start = $2
            ORDER BY bedrooms
            "#,
            table.name()
        );

        let rows = client.query(&query, &[&entity_id, &period_start]).await?;
        Ok(rows.iter().map(row_to_snapshot).collect())
    }

    // ==================== CRON CHECKPOINTS ====================

    /// Get last run timestamp for a cron job
    pub async fn get_cron_checkpoint(
        &self,
        job_name: &str,
    ) -> anyhow::Result<Option<DateTime<Utc>>> {
        let client = self.pool.get().await?;
        let query = "SELECT last_run_at FROM market.cron_checkpoints WHERE job_name = $1";

        let row = client.query_opt(query, &[&job_name]).await?;
        Ok(row.and_then(|r| r.get::<_, Option<DateTime<Utc>>>("last_run_at")))
    }

    /// Set last run timestamp for a cron job
    pub async fn set_cron_checkpoint(
        &self,
        job_name: &str,
        last_run_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let client = self.pool.get().await?;
        let query = r#"
            INSERT INTO market.cron_checkpoints (job_name, last_run_at, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (job_name) DO UPDATE SET
                last_run_at = EXCLUDED.last_run_at,
                updated_at = NOW()
        "#;

        client
            .execute(query, &[&job_name, &last_run_at])
            .await
            .map_err(|e| {
                error!(
                    "Failed to update checkpoint for cron job {}: {:?}",
                    job_name, e
                );
                e
            })?;

        Ok(())
    }
}

// ==================== HELPER FUNCTIONS ====================

fn row_to_area(row: &tokio_postgres::Row) -> Area {
    Area {
        id: row.get("id"),
        name: row.get("name"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_building(row: &tokio_postgres::Row) -> Building {
    Building {
        id: row.get("id"),
        name: row.get("name"),
        area_id: row.get("area_id"),
        units_total: row.get("units_total"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_listing(row: &tokio_postgres::Row) -> Option<Listing> {
    let kind_str: String = row.get("kind");
    let kind = match ListingKind::parse(&kind_str) {
        Some(k) => k,
        None => {
            // Should not happen with the CHECK constraint, but a bad row
            // must not abort a whole batch
            error!("Listing with unknown kind '{}' skipped", kind_str);
            return None;
        },
    };

    Some(Listing {
        source_id: row.get("source_id"),
        building_id: row.get("building_id"),
        kind,
        price: row.get("price"),
        bedrooms: row.get("bedrooms"),
        area_sqm: row.get("area_sqm"),
        listed_at: row.get("listed_at"),
        delisted_at: row.get("delisted_at"),
    })
}

fn row_to_snapshot(row: &tokio_postgres::Row) -> MarketSnapshot {
    MarketSnapshot {
        entity_id: row.get("entity_id"),
        bedrooms: row.get("bedrooms"),
        period_start: row.get("period_start"),
        period_end: row.get("period_end"),
        sale_count: row.get("sale_count"),
        rent_count: row.get("rent_count"),
        avg_sale_price: row.get("avg_sale_price"),
        median_sale_price: row.get("median_sale_price"),
        min_sale_price: row.get("min_sale_price"),
        max_sale_price: row.get("max_sale_price"),
        avg_rent_price: row.get("avg_rent_price"),
        median_rent_price: row.get("median_rent_price"),
        min_rent_price: row.get("min_rent_price"),
        max_rent_price: row.get("max_rent_price"),
        avg_sale_exposure_days: row.get("avg_sale_exposure_days"),
        avg_rent_exposure_days: row.get("avg_rent_exposure_days"),
        sale_ads_per_unit: row.get("sale_ads_per_unit"),
        rent_ads_per_unit: row.get("rent_ads_per_unit"),
        sale_liquidity: row.get("sale_liquidity"),
        rent_liquidity: row.get("rent_liquidity"),
        roi: row.get("roi"),
    }
}
