use std::sync::Arc;

use crate::config::Settings;

pub mod models;
pub mod postgres;

pub use postgres::PostgresClient;

/// Database handle for the service.
///
/// PostgreSQL holds everything: area/building metadata, raw listings and the
/// aggregated snapshot tables.
#[derive(Clone)]
pub struct Database {
    pub postgres: Arc<PostgresClient>,
}

impl Database {
    pub async fn new(settings: Arc<Settings>) -> anyhow::Result<Self> {
        let postgres = PostgresClient::new(settings.postgres.clone()).await?;

        // Apply schema before anything reads or writes
        postgres.migrate().await?;

        Ok(Self {
            postgres: Arc::new(postgres),
        })
    }
}
