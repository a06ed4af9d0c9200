//! Shared domain types and configuration for evedict.
//!
//! Everything here is plain data: articles and market events as fetched from
//! upstream feeds, the forecast entity produced by the generation pipeline,
//! and the environment-driven [`AppConfig`].

pub mod app_config;
pub mod article;
pub mod category;
pub mod config;
pub mod forecast;
pub mod market;

use thiserror::Error;

pub use app_config::{AppConfig, CandidatePolicy, Environment};
pub use article::{Article, REMOVED_SENTINEL};
pub use category::{ForecastCategory, NewsCategory};
pub use config::{load_app_config, load_app_config_from_env};
pub use forecast::{Forecast, Outcome, RelatedForecast, Source};
pub use market::{EventMarket, EventTag, MarketEvent, MarketSnapshot, PricedOutcome};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    /// A JSON-encoded market field could not be decoded.
    #[error("invalid market field {field}: {reason}")]
    InvalidMarketField { field: &'static str, reason: String },
}
