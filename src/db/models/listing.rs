use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Whether a listing offers the unit for sale or for rent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    Sale,
    Rent,
}

impl ListingKind {
    /// Parse the text form stored in the listings table.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sale" => Some(ListingKind::Sale),
            "rent" => Some(ListingKind::Rent),
            _ => None,
        }
    }
}

/// Raw sale/rent listing as produced by the import pipeline.
///
/// Read-only input to the snapshot aggregator. `price` and `bedrooms` may be
/// missing or garbage upstream; the aggregator skips what it cannot use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    /// Upstream identifier, unique per source record.
    pub source_id: String,
    pub building_id: i64,
    pub kind: ListingKind,
    /// Asking price (sale) or annual contract value (rent).
    pub price: Option<f64>,
    /// Raw bedroom field as scraped ("Studio", "2", "3 B/R", ...).
    pub bedrooms: Option<String>,
    pub area_sqm: Option<f64>,
    pub listed_at: NaiveDate,
    /// Date the ad disappeared from the market, when observed.
    pub delisted_at: Option<NaiveDate>,
}

impl Listing {
    /// Days the ad was exposed on the market within the given window.
    ///
    /// Exposure is clamped to the window so one stale ad cannot dominate a
    /// period's liquidity figure. Returns `None` when the ad was listed after
    /// the window ends.
    pub fn exposure_days(&self, window_start: NaiveDate, window_end: NaiveDate) -> Option<f64> {
        if self.listed_at >= window_end {
            return None;
        }
        let start = self.listed_at.max(window_start);
        let end = match self.delisted_at {
            Some(d) => d.min(window_end),
            None => window_end,
        };
        if end <= start {
            return None;
        }
        Some((end - start).num_days() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn listing(listed: NaiveDate, delisted: Option<NaiveDate>) -> Listing {
        Listing {
            source_id: "x".into(),
            building_id: 1,
            kind: ListingKind::Sale,
            price: Some(1.0),
            bedrooms: Some("1".into()),
            area_sqm: None,
            listed_at: listed,
            delisted_at: delisted,
        }
    }

    #[test]
    fn exposure_clamped_to_window() {
        let l = listing(date(2026, 5, 1), None);
        let days = l
            .exposure_days(date(2026, 6, 1), date(2026, 7, 1))
            .unwrap();
        assert_eq!(days, 30.0);
    }

    #[test]
    fn exposure_uses_delisted_date() {
        let l = listing(date(2026, 6, 10), Some(date(2026, 6, 20)));
        let days = l
            .exposure_days(date(2026, 6, 1), date(2026, 7, 1))
            .unwrap();
        assert_eq!(days, 10.0);
    }

    #[test]
    fn exposure_none_when_listed_after_window() {
        let l = listing(date(2026, 7, 5), None);
        assert!(l.exposure_days(date(2026, 6, 1), date(2026, 7, 1)).is_none());
    }
}
