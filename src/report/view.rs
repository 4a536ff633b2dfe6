use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::db::models::MarketSnapshot;
use crate::report::format::{percent_change_display, roi_display};
use crate::snapshot::Period;

/// One bedroom bucket row of a rendered report: raw statistics from the
/// current snapshot plus formatted period-over-period fields.
#[derive(Debug, Clone, Serialize)]
pub struct BucketReport {
    pub bedrooms: String,
    pub sale_count: i64,
    pub rent_count: i64,
    pub avg_sale_price: Option<f64>,
    pub median_sale_price: Option<f64>,
    pub min_sale_price: Option<f64>,
    pub max_sale_price: Option<f64>,
    pub avg_rent_price: Option<f64>,
    pub median_rent_price: Option<f64>,
    pub avg_sale_exposure_days: Option<f64>,
    pub avg_rent_exposure_days: Option<f64>,
    pub sale_ads_per_unit: Option<f64>,
    pub rent_ads_per_unit: Option<f64>,
    pub sale_liquidity: Option<f64>,
    pub rent_liquidity: Option<f64>,
    pub roi: String,
    pub avg_sale_price_change: String,
    pub median_sale_price_change: String,
    pub avg_rent_price_change: String,
    pub roi_change: String,
}

/// Rendered report for one entity and period.
#[derive(Debug, Clone, Serialize)]
pub struct EntityReport {
    pub entity_id: i64,
    pub name: String,
    pub period: String,
    pub buckets: Vec<BucketReport>,
}

impl EntityReport {
    /// Join the current period's snapshots with the previous period's.
    ///
    /// A bucket with no previous snapshot renders sentinels in every change
    /// column; the raw statistics are always taken from the current row.
    pub fn build(
        entity_id: i64,
        name: String,
        period: Period,
        current: Vec<MarketSnapshot>,
        previous: Vec<MarketSnapshot>,
    ) -> Self {
        let previous_by_bucket: FxHashMap<&str, &MarketSnapshot> = previous
            .iter()
            .map(|s| (s.bedrooms.as_str(), s))
            .collect();

        let buckets = current
            .iter()
            .map(|snap| {
                let prev = previous_by_bucket.get(snap.bedrooms.as_str()).copied();
                bucket_report(snap, prev)
            })
            .collect();

        EntityReport {
            entity_id,
            name,
            period: period.to_string(),
            buckets,
        }
    }
}

fn bucket_report(snap: &MarketSnapshot, prev: Option<&MarketSnapshot>) -> BucketReport {
    let change = |current: Option<f64>, field: fn(&MarketSnapshot) -> Option<f64>| {
        percent_change_display(current, prev.and_then(field))
    };

    BucketReport {
        bedrooms: snap.bedrooms.clone(),
        sale_count: snap.sale_count,
        rent_count: snap.rent_count,
        avg_sale_price: snap.avg_sale_price,
        median_sale_price: snap.median_sale_price,
        min_sale_price: snap.min_sale_price,
        max_sale_price: snap.max_sale_price,
        avg_rent_price: snap.avg_rent_price,
        median_rent_price: snap.median_rent_price,
        avg_sale_exposure_days: snap.avg_sale_exposure_days,
        avg_rent_exposure_days: snap.avg_rent_exposure_days,
        sale_ads_per_unit: snap.sale_ads_per_unit,
        rent_ads_per_unit: snap.rent_ads_per_unit,
        sale_liquidity: snap.sale_liquidity,
        rent_liquidity: snap.rent_liquidity,
        roi: roi_display(snap.roi),
        avg_sale_price_change: change(snap.avg_sale_price, |s| s.avg_sale_price),
        median_sale_price_change: change(snap.median_sale_price, |s| s.median_sale_price),
        avg_rent_price_change: change(snap.avg_rent_price, |s| s.avg_rent_price),
        roi_change: change(snap.roi, |s| s.roi),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::format::SENTINEL;
    use chrono::NaiveDate;

    fn snapshot(bedrooms: &str, avg_sale: Option<f64>, roi: Option<f64>) -> MarketSnapshot {
        MarketSnapshot {
            entity_id: 1,
            bedrooms: bedrooms.to_string(),
            period_start: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            sale_count: 3,
            rent_count: 0,
            avg_sale_price: avg_sale,
            median_sale_price: avg_sale,
            min_sale_price: avg_sale,
            max_sale_price: avg_sale,
            avg_rent_price: None,
            median_rent_price: None,
            min_rent_price: None,
            max_rent_price: None,
            avg_sale_exposure_days: None,
            avg_rent_exposure_days: None,
            sale_ads_per_unit: None,
            rent_ads_per_unit: None,
            sale_liquidity: None,
            rent_liquidity: None,
            roi,
        }
    }

    #[test]
    fn joins_current_with_previous_by_bucket() {
        let period = Period::parse("2026-08").unwrap();
        let report = EntityReport::build(
            1,
            "Marina Heights".to_string(),
            period,
            vec![snapshot("1 B/R", Some(120.0), Some(0.07))],
            vec![snapshot("1 B/R", Some(100.0), Some(0.07))],
        );

        assert_eq!(report.period, "2026-08");
        assert_eq!(report.buckets.len(), 1);
        assert_eq!(report.buckets[0].avg_sale_price_change, "+20.0%");
        assert_eq!(report.buckets[0].roi, "0.070");
    }

    #[test]
    fn missing_previous_bucket_renders_sentinels() {
        let period = Period::parse("2026-08").unwrap();
        let report = EntityReport::build(
            1,
            "Marina Heights".to_string(),
            period,
            vec![snapshot("2 B/R", Some(120.0), None)],
            vec![],
        );

        let row = &report.buckets[0];
        assert_eq!(row.avg_sale_price_change, SENTINEL);
        assert_eq!(row.roi, SENTINEL);
        assert_eq!(row.roi_change, SENTINEL);
    }
}
