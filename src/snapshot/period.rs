use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open calendar-month window `[start, end)`.
///
/// Snapshots are keyed by `start`; `end` is the first day of the following
/// month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    /// The calendar month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        let start = NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
            .unwrap_or(date);
        Self {
            start,
            end: next_month(start),
        }
    }

    /// The calendar month immediately before this one.
    pub fn previous(&self) -> Self {
        let prev_end = self.start;
        let start = if self.start.month() == 1 {
            NaiveDate::from_ymd_opt(self.start.year() - 1, 12, 1)
        } else {
            NaiveDate::from_ymd_opt(self.start.year(), self.start.month() - 1, 1)
        }
        .unwrap_or(self.start);
        Self {
            start,
            end: prev_end,
        }
    }

    /// Parse a "YYYY-MM" period label.
    pub fn parse(label: &str) -> Option<Self> {
        let (year, month) = label.split_once('-')?;
        let year: i32 = year.parse().ok()?;
        let month: u32 = month.parse().ok()?;
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        Some(Self {
            start,
            end: next_month(start),
        })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start.format("%Y-%m"))
    }
}

fn next_month(start: NaiveDate) -> NaiveDate {
    if start.month() == 12 {
        NaiveDate::from_ymd_opt(start.year() + 1, 1, 1).unwrap_or(start)
    } else {
        NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1).unwrap_or(start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_of_mid_month_date() {
        let p = Period::month_of(NaiveDate::from_ymd_opt(2026, 8, 23).unwrap());
        assert_eq!(p.start, NaiveDate::from_ymd_opt(2026, 8, 1).unwrap());
        assert_eq!(p.end, NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());
    }

    #[test]
    fn december_rolls_into_january() {
        let p = Period::month_of(NaiveDate::from_ymd_opt(2025, 12, 15).unwrap());
        assert_eq!(p.end, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }

    #[test]
    fn previous_crosses_year_boundary() {
        let p = Period::parse("2026-01").unwrap();
        let prev = p.previous();
        assert_eq!(prev.start, NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(prev.end, p.start);
    }

    #[test]
    fn parse_rejects_bad_labels() {
        assert!(Period::parse("2026-13").is_none());
        assert!(Period::parse("garbage").is_none());
        assert!(Period::parse("2026").is_none());
    }

    #[test]
    fn display_round_trips() {
        let p = Period::parse("2026-08").unwrap();
        assert_eq!(p.to_string(), "2026-08");
    }
}
