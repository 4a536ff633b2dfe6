use chrono::{DateTime, Utc};
use serde::Serialize;

/// A building whose listings are aggregated into market snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct Building {
    pub id: i64,
    pub name: String,
    pub area_id: i64,
    /// Total residential units, when known. Feeds the ads-per-unit ratio.
    pub units_total: Option<i32>,
    pub updated_at: DateTime<Utc>,
}
