use std::path::PathBuf;

use crate::app_config::{AppConfig, CandidatePolicy, Environment};
use crate::ConfigError;

const DEFAULT_NEWS_API_URL: &str = "https://newsapi.org/v2";
const DEFAULT_POLYMARKET_API_URL: &str = "https://gamma-api.polymarket.com";
const DEFAULT_REPLICATE_MODEL_URL: &str =
    "https://api.replicate.com/v1/models/meta/meta-llama-3-70b-instruct/predictions";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_positive_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        match raw.parse::<usize>() {
            Ok(0) => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be at least 1".to_string(),
            }),
            Ok(v) => Ok(v),
            Err(e) => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            }),
        }
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("EVEDICT_ENV", "development"))?;
    let log_level = or_default("EVEDICT_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("EVEDICT_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("EVEDICT_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("EVEDICT_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let news_api_key = optional("NEWS_API_KEY");
    let news_api_url = or_default("NEWS_API_URL", DEFAULT_NEWS_API_URL);
    let polymarket_api_url = or_default("POLYMARKET_API_URL", DEFAULT_POLYMARKET_API_URL);
    let replicate_api_key = optional("REPLICATE_API_KEY");
    let replicate_model_url = or_default("REPLICATE_MODEL_URL", DEFAULT_REPLICATE_MODEL_URL);

    let http_timeout_secs = parse_u64("EVEDICT_HTTP_TIMEOUT_SECS", "30")?;
    let poll_interval_ms = parse_u64("EVEDICT_POLL_INTERVAL_MS", "2000")?;
    let max_poll_attempts = parse_u32("EVEDICT_MAX_POLL_ATTEMPTS", "150")?;
    if max_poll_attempts == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "EVEDICT_MAX_POLL_ATTEMPTS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let max_output_tokens = parse_u32("EVEDICT_MAX_OUTPUT_TOKENS", "1024")?;
    let min_selected = parse_positive_usize("EVEDICT_MIN_SELECTED", "2")?;
    let related_limit = parse_positive_usize("EVEDICT_RELATED_LIMIT", "4")?;
    let related_limit = i64::try_from(related_limit).map_err(|e| ConfigError::InvalidEnvVar {
        var: "EVEDICT_RELATED_LIMIT".to_string(),
        reason: e.to_string(),
    })?;
    let candidate_policy = parse_candidate_policy(&or_default("EVEDICT_CANDIDATE_POLICY", "abort"))?;
    let prompts_path = optional("EVEDICT_PROMPTS_PATH").map(PathBuf::from);

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        news_api_key,
        news_api_url,
        polymarket_api_url,
        replicate_api_key,
        replicate_model_url,
        http_timeout_secs,
        poll_interval_ms,
        max_poll_attempts,
        max_output_tokens,
        min_selected,
        related_limit,
        candidate_policy,
        prompts_path,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "EVEDICT_ENV".to_string(),
            reason: format!("expected development, test or production, got '{other}'"),
        }),
    }
}

fn parse_candidate_policy(s: &str) -> Result<CandidatePolicy, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "abort" => Ok(CandidatePolicy::Abort),
        "skip" => Ok(CandidatePolicy::Skip),
        other => Err(ConfigError::InvalidEnvVar {
            var: "EVEDICT_CANDIDATE_POLICY".to_string(),
            reason: format!("expected abort or skip, got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
