mod config;

pub use config::{HttpSettings, MarketSettings, PostgresSettings, Settings};
