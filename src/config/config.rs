use config::{Config, ConfigError, File};
use serde::Deserialize;

/// PostgreSQL database connection configuration.
///
/// Used for storing:
/// - Area and building metadata
/// - Raw sale/rent listings
/// - Aggregated market snapshots
/// - Cron checkpoints
#[derive(Debug, Deserialize, Clone)]
pub struct PostgresSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

fn default_pool_size() -> usize {
    16
}

/// HTTP report API configuration.
///
/// API keys map to roles: keys in `admin_api_keys` get the admin role,
/// keys in `paid_api_keys` get the paid role, everything else is a visitor.
#[derive(Debug, Deserialize, Clone)]
pub struct HttpSettings {
    #[serde(default = "default_http_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
    /// How long rendered reports stay in the response cache.
    #[serde(default = "default_report_cache_ttl_secs")]
    pub report_cache_ttl_secs: u64,
    #[serde(default)]
    pub admin_api_keys: Vec<String>,
    #[serde(default)]
    pub paid_api_keys: Vec<String>,
}

fn default_http_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    3030
}

fn default_report_cache_ttl_secs() -> u64 {
    3600 // 1 hour
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            port: default_http_port(),
            report_cache_ttl_secs: default_report_cache_ttl_secs(),
            admin_api_keys: vec![],
            paid_api_keys: vec![],
        }
    }
}

/// Domain policy parameters for snapshot aggregation.
///
/// These feed the liquidity and ROI formulas. They must stay stable across
/// recomputation runs or period-over-period comparisons become meaningless,
/// so they live in config rather than code.
#[derive(Debug, Deserialize, Clone)]
pub struct MarketSettings {
    /// Exposure window the liquidity rate is normalized to, in days.
    /// liquidity = count * window / total exposure days.
    #[serde(default = "default_liquidity_window_days")]
    pub liquidity_window_days: f64,
    /// How many rent contract values make up one year of rent.
    /// Listings quote annual contract value, so the default is 1.
    #[serde(default = "default_rent_periods_per_year")]
    pub rent_periods_per_year: f64,
}

fn default_liquidity_window_days() -> f64 {
    30.0
}

fn default_rent_periods_per_year() -> f64 {
    1.0
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self {
            liquidity_window_days: default_liquidity_window_days(),
            rent_periods_per_year: default_rent_periods_per_year(),
        }
    }
}

/// Root application configuration.
///
/// Loaded from `config.yaml` at startup.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub postgres: PostgresSettings,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub market: MarketSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config"))
            .build()?;

        let settings: Settings = s.try_deserialize()?;

        Ok(settings)
    }
}
