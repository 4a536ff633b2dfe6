use chrono::{DateTime, Utc};
use serde::Serialize;

/// A named market area (community/district) grouping buildings.
#[derive(Debug, Clone, Serialize)]
pub struct Area {
    pub id: i64,
    pub name: String,
    pub updated_at: DateTime<Utc>,
}
