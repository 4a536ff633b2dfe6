//! HTTP report API.
//!
//! Read-only report endpoints plus admin triggers for recomputation and
//! listing ingest. Report responses are cached for a fixed TTL.

pub mod error;
pub mod handlers;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::db::Database;

pub use routes::routes;

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppContext {
    pub db: Arc<Database>,
    pub settings: Arc<Settings>,
    /// Rendered report payloads keyed by "{kind}:{entity}:{period}".
    pub report_cache: moka::future::Cache<String, serde_json::Value>,
}

impl AppContext {
    pub fn new(db: Arc<Database>, settings: Arc<Settings>) -> Self {
        let report_cache = moka::future::Cache::builder()
            .time_to_live(Duration::from_secs(settings.http.report_cache_ttl_secs))
            .max_capacity(10_000)
            .build();

        Self {
            db,
            settings,
            report_cache,
        }
    }
}
