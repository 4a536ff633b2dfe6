//! Pure per-bucket statistics over raw listings.
//!
//! Everything here is deterministic: no clocks, no I/O. Given the same
//! listings the same snapshots come out, which is what makes bulk
//! recomputation idempotent.

use log::warn;
use rustc_hash::FxHashMap;

use crate::config::MarketSettings;
use crate::db::models::{Listing, ListingKind, MarketSnapshot};
use crate::snapshot::{BedroomBucket, Period};

/// Domain policy parameters for the liquidity and ROI formulas.
///
/// Must stay stable across recomputation runs so period-over-period
/// comparisons remain valid.
#[derive(Debug, Clone, Copy)]
pub struct AggregationParams {
    /// Exposure window the liquidity rate is normalized to, in days.
    pub liquidity_window_days: f64,
    /// Rent contract values per year (1.0 when rents are quoted annually).
    pub rent_periods_per_year: f64,
}

impl From<&MarketSettings> for AggregationParams {
    fn from(s: &MarketSettings) -> Self {
        Self {
            liquidity_window_days: s.liquidity_window_days,
            rent_periods_per_year: s.rent_periods_per_year,
        }
    }
}

/// Descriptive statistics over the usable prices of one bucket/kind.
#[derive(Debug, Clone, Copy, Default)]
struct PriceStats {
    count: i64,
    avg: Option<f64>,
    median: Option<f64>,
    min: Option<f64>,
    max: Option<f64>,
}

fn price_stats(mut prices: Vec<f64>) -> PriceStats {
    if prices.is_empty() {
        return PriceStats::default();
    }

    prices.sort_by(|a, b| a.total_cmp(b));
    let n = prices.len();
    let sum: f64 = prices.iter().sum();
    let median = if n % 2 == 1 {
        prices[n / 2]
    } else {
        (prices[n / 2 - 1] + prices[n / 2]) / 2.0
    };

    PriceStats {
        count: n as i64,
        avg: Some(sum / n as f64),
        median: Some(median),
        min: Some(prices[0]),
        max: Some(prices[n - 1]),
    }
}

/// Per-kind accumulator for one bedroom bucket.
#[derive(Debug, Default)]
struct KindRecords {
    prices: Vec<f64>,
    exposure_days: Vec<f64>,
}

impl KindRecords {
    fn total_exposure(&self) -> f64 {
        self.exposure_days.iter().sum()
    }

    fn avg_exposure(&self) -> Option<f64> {
        if self.exposure_days.is_empty() {
            None
        } else {
            Some(self.total_exposure() / self.exposure_days.len() as f64)
        }
    }
}

/// Result of aggregating one entity's listings for one period.
#[derive(Debug)]
pub struct BucketAggregate {
    pub snapshots: Vec<MarketSnapshot>,
    /// Records skipped because they could not be bucketed or carried no
    /// usable price.
    pub skipped: usize,
}

/// A price is usable when it is a finite positive number; scraped data
/// carries zeros and absurd placeholders often enough to matter.
fn usable_price(price: Option<f64>) -> Option<f64> {
    price.filter(|p| p.is_finite() && *p > 0.0)
}

/// Aggregate one entity's listings into one snapshot per bedroom bucket.
///
/// The bucket set is whatever buckets appear in the input; a bucket whose
/// records all lack a usable price still yields a row with zero counts and
/// null statistics, so report consumers can render "no data" uniformly.
/// A malformed record (unparseable bedroom field, missing or unusable
/// price) is skipped, logged and counted, never fatal.
pub fn aggregate_entity(
    entity_id: i64,
    listings: &[Listing],
    units_total: Option<i32>,
    period: Period,
    params: AggregationParams,
) -> BucketAggregate {
    let mut buckets: FxHashMap<BedroomBucket, (KindRecords, KindRecords)> = FxHashMap::default();
    let mut skipped = 0usize;

    for listing in listings {
        let bucket = match listing.bedrooms.as_deref().and_then(BedroomBucket::parse) {
            Some(b) => b,
            None => {
                warn!(
                    "Skipping listing {} for entity {}: unusable bedroom field {:?}",
                    listing.source_id, entity_id, listing.bedrooms
                );
                skipped += 1;
                continue;
            },
        };

        let entry = buckets.entry(bucket).or_default();
        let records = match listing.kind {
            ListingKind::Sale => &mut entry.0,
            ListingKind::Rent => &mut entry.1,
        };

        match usable_price(listing.price) {
            Some(price) => {
                records.prices.push(price);
                if let Some(days) = listing.exposure_days(period.start, period.end) {
                    records.exposure_days.push(days);
                }
            },
            None => {
                // The bucket row is still emitted; only the record is lost
                warn!(
                    "Skipping listing {} for entity {}: unusable price {:?}",
                    listing.source_id, entity_id, listing.price
                );
                skipped += 1;
            },
        }
    }

    // Deterministic output order
    let mut keys: Vec<BedroomBucket> = buckets.keys().copied().collect();
    keys.sort();

    let snapshots = keys
        .into_iter()
        .map(|bucket| {
            let (sale, rent) = buckets.remove(&bucket).unwrap_or_default();
            bucket_snapshot(entity_id, bucket, sale, rent, units_total, period, params)
        })
        .collect();

    BucketAggregate { snapshots, skipped }
}

fn bucket_snapshot(
    entity_id: i64,
    bucket: BedroomBucket,
    sale: KindRecords,
    rent: KindRecords,
    units_total: Option<i32>,
    period: Period,
    params: AggregationParams,
) -> MarketSnapshot {
    // Exposure figures first; price_stats consumes the vectors
    let sale_total_exposure = sale.total_exposure();
    let rent_total_exposure = rent.total_exposure();
    let avg_sale_exposure_days = sale.avg_exposure();
    let avg_rent_exposure_days = rent.avg_exposure();

    let sale_stats = price_stats(sale.prices);
    let rent_stats = price_stats(rent.prices);

    // liquidity = ads turned over per exposure window
    let liquidity = |total_exposure: f64, count: i64| {
        if total_exposure > 0.0 {
            Some(count as f64 * params.liquidity_window_days / total_exposure)
        } else {
            None
        }
    };

    // Gross annual rent yield against the same bucket's sale prices
    let roi = match (rent_stats.avg, sale_stats.avg) {
        (Some(rent_avg), Some(sale_avg)) if sale_avg > 0.0 => {
            Some(rent_avg * params.rent_periods_per_year / sale_avg)
        },
        _ => None,
    };

    let ads_per_unit = |count: i64| match units_total {
        Some(units) if units > 0 => Some(count as f64 / units as f64),
        _ => None,
    };

    MarketSnapshot {
        entity_id,
        bedrooms: bucket.to_string(),
        period_start: period.start,
        period_end: period.end,
        sale_count: sale_stats.count,
        rent_count: rent_stats.count,
        avg_sale_price: sale_stats.avg,
        median_sale_price: sale_stats.median,
        min_sale_price: sale_stats.min,
        max_sale_price: sale_stats.max,
        avg_rent_price: rent_stats.avg,
        median_rent_price: rent_stats.median,
        min_rent_price: rent_stats.min,
        max_rent_price: rent_stats.max,
        avg_sale_exposure_days,
        avg_rent_exposure_days,
        sale_ads_per_unit: ads_per_unit(sale_stats.count),
        rent_ads_per_unit: ads_per_unit(rent_stats.count),
        sale_liquidity: liquidity(sale_total_exposure, sale_stats.count),
        rent_liquidity: liquidity(rent_total_exposure, rent_stats.count),
        roi,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const PARAMS: AggregationParams = AggregationParams {
        liquidity_window_days: 30.0,
        rent_periods_per_year: 1.0,
    };

    fn period() -> Period {
        Period::parse("2026-08").unwrap()
    }

    fn listing(
        source_id: &str,
        kind: ListingKind,
        price: Option<f64>,
        bedrooms: Option<&str>,
    ) -> Listing {
        Listing {
            source_id: source_id.to_string(),
            building_id: 1,
            kind,
            price,
            bedrooms: bedrooms.map(|s| s.to_string()),
            area_sqm: None,
            listed_at: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            delisted_at: Some(NaiveDate::from_ymd_opt(2026, 8, 16).unwrap()),
        }
    }

    #[test]
    fn median_of_odd_and_even_counts() {
        let odd = price_stats(vec![3.0, 1.0, 2.0]);
        assert_eq!(odd.median, Some(2.0));

        let even = price_stats(vec![4.0, 1.0, 2.0, 3.0]);
        assert_eq!(even.median, Some(2.5));
    }

    #[test]
    fn empty_prices_give_null_stats() {
        let stats = price_stats(vec![]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.avg, None);
        assert_eq!(stats.median, None);
        assert_eq!(stats.min, None);
        assert_eq!(stats.max, None);
    }

    #[test]
    fn bucket_without_usable_prices_still_emits_row() {
        let listings = vec![
            listing("a", ListingKind::Sale, None, Some("1 B/R")),
            listing("b", ListingKind::Sale, Some(0.0), Some("1 B/R")),
        ];
        let result = aggregate_entity(1, &listings, None, period(), PARAMS);

        assert_eq!(result.snapshots.len(), 1);
        let row = &result.snapshots[0];
        assert_eq!(row.bedrooms, "1 B/R");
        assert_eq!(row.sale_count, 0);
        assert_eq!(row.avg_sale_price, None);
        assert_eq!(row.median_sale_price, None);
    }

    #[test]
    fn unusable_price_records_counted_as_skipped() {
        let listings = vec![
            listing("a", ListingKind::Sale, None, Some("1 B/R")),
            listing("b", ListingKind::Sale, Some(0.0), Some("1 B/R")),
            listing("c", ListingKind::Sale, Some(f64::NAN), Some("1 B/R")),
            listing("d", ListingKind::Sale, Some(1_000_000.0), Some("1 B/R")),
            listing("e", ListingKind::Rent, Some(70_000.0), None),
        ];
        let result = aggregate_entity(1, &listings, None, period(), PARAMS);

        // a, b, c (price) + e (bedrooms)
        assert_eq!(result.skipped, 4);
        assert_eq!(result.snapshots.len(), 1);
        assert_eq!(result.snapshots[0].sale_count, 1);
    }

    #[test]
    fn malformed_bedrooms_skipped_not_fatal() {
        let listings = vec![
            listing("a", ListingKind::Sale, Some(1_000_000.0), Some("1 B/R")),
            listing("b", ListingKind::Sale, Some(2_000_000.0), None),
            listing("c", ListingKind::Sale, Some(3_000_000.0), Some("penthouse")),
        ];
        let result = aggregate_entity(1, &listings, None, period(), PARAMS);

        assert_eq!(result.skipped, 2);
        assert_eq!(result.snapshots.len(), 1);
        assert_eq!(result.snapshots[0].sale_count, 1);
    }

    #[test]
    fn stats_computed_per_bucket_and_kind() {
        let listings = vec![
            listing("a", ListingKind::Sale, Some(1_000_000.0), Some("1 B/R")),
            listing("b", ListingKind::Sale, Some(1_200_000.0), Some("1 B/R")),
            listing("c", ListingKind::Rent, Some(80_000.0), Some("1 B/R")),
            listing("d", ListingKind::Sale, Some(2_500_000.0), Some("2 B/R")),
        ];
        let result = aggregate_entity(1, &listings, Some(100), period(), PARAMS);

        assert_eq!(result.snapshots.len(), 2);
        let one_br = &result.snapshots[0];
        assert_eq!(one_br.bedrooms, "1 B/R");
        assert_eq!(one_br.sale_count, 2);
        assert_eq!(one_br.rent_count, 1);
        assert_eq!(one_br.avg_sale_price, Some(1_100_000.0));
        assert_eq!(one_br.min_sale_price, Some(1_000_000.0));
        assert_eq!(one_br.max_sale_price, Some(1_200_000.0));
        assert_eq!(one_br.sale_ads_per_unit, Some(0.02));
        // ROI = annual rent avg / sale avg
        assert_eq!(one_br.roi, Some(80_000.0 / 1_100_000.0));

        let two_br = &result.snapshots[1];
        assert_eq!(two_br.bedrooms, "2 B/R");
        assert_eq!(two_br.roi, None);
    }

    #[test]
    fn liquidity_normalized_to_window() {
        // Two ads, 15 days exposure each: 2 * 30 / 30 = 2 per window
        let listings = vec![
            listing("a", ListingKind::Sale, Some(1_000_000.0), Some("1 B/R")),
            listing("b", ListingKind::Sale, Some(1_100_000.0), Some("1 B/R")),
        ];
        let result = aggregate_entity(1, &listings, None, period(), PARAMS);
        assert_eq!(result.snapshots[0].sale_liquidity, Some(2.0));
        assert_eq!(result.snapshots[0].avg_sale_exposure_days, Some(15.0));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let listings = vec![
            listing("a", ListingKind::Sale, Some(1_000_000.0), Some("Studio")),
            listing("b", ListingKind::Rent, Some(55_000.0), Some("Studio")),
            listing("c", ListingKind::Sale, Some(900_000.0), Some("1 B/R")),
            listing("d", ListingKind::Sale, None, Some("bad")),
        ];
        let first = aggregate_entity(7, &listings, Some(50), period(), PARAMS);
        let second = aggregate_entity(7, &listings, Some(50), period(), PARAMS);

        assert_eq!(first.snapshots, second.snapshots);
        assert_eq!(first.skipped, second.skipped);
    }
}
