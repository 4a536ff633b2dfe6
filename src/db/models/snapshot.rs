use chrono::NaiveDate;
use serde::Serialize;

/// Aggregated market statistics for one entity (building or area), one
/// bedroom bucket and one period window.
///
/// Population: recomputed in bulk by `snapshot::recompute_all`, either from a
/// cron job or the admin trigger. One row per (entity, bedrooms,
/// period_start); recomputation replaces the row, it is never mutated
/// incrementally.
///
/// The row carries no wall-clock field on purpose: recomputing from unchanged
/// input must produce an identical row.
///
/// Query patterns:
///   - "Sale price history for building X, 1 B/R, last 12 months"
///   - "Current-vs-previous period change for area Y"
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSnapshot {
    // Identifiers
    pub entity_id: i64,
    pub bedrooms: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,

    // Counts of records with a usable price
    pub sale_count: i64,
    pub rent_count: i64,

    // Sale price statistics (null when sale_count = 0)
    pub avg_sale_price: Option<f64>,
    pub median_sale_price: Option<f64>,
    pub min_sale_price: Option<f64>,
    pub max_sale_price: Option<f64>,

    // Rent statistics (annual contract value, null when rent_count = 0)
    pub avg_rent_price: Option<f64>,
    pub median_rent_price: Option<f64>,
    pub min_rent_price: Option<f64>,
    pub max_rent_price: Option<f64>,

    // Market exposure
    pub avg_sale_exposure_days: Option<f64>,
    pub avg_rent_exposure_days: Option<f64>,

    // Derived ratios
    pub sale_ads_per_unit: Option<f64>,
    pub rent_ads_per_unit: Option<f64>,
    pub sale_liquidity: Option<f64>,
    pub rent_liquidity: Option<f64>,
    pub roi: Option<f64>,
}
