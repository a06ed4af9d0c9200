//! Postgres persistence for forecasts.
//!
//! Writes are batch-atomic: [`save_forecasts`] stores every forecast of a
//! run, with its outcomes, sources, tags and market snapshot, in a single
//! transaction. Reads rebuild full [`evedict_core::Forecast`] values and
//! compute related forecasts on demand.

pub mod forecasts;
mod pool;

use std::collections::HashSet;

use sqlx::PgPool;
use thiserror::Error;

pub use forecasts::{
    approve_forecast, exists_approved_by_image_url, get_forecast, get_related_forecasts,
    list_forecasts, rank_related, save_forecasts, ForecastFilter, ForecastRow, MarketRow,
    OutcomeRow, RelatedForecastRow, SourceRow,
};
pub use pool::{connect_pool, PoolConfig};

// Resolves to <workspace-root>/migrations/ from this crate's manifest.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    /// A forecast violates an invariant required for storage.
    #[error("invalid forecast: {0}")]
    InvalidForecast(String),
    /// A stored value could not be mapped back into a domain type.
    #[error("invalid stored data: {0}")]
    InvalidData(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply pending migrations and return how many were pending.
///
/// # Errors
///
/// Returns [`DbError::Migration`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, DbError> {
    // Absent on a fresh database.
    let applied: HashSet<i64> =
        sqlx::query_scalar::<_, i64>("SELECT version FROM _sqlx_migrations WHERE success")
            .fetch_all(pool)
            .await
            .map(|versions| versions.into_iter().collect())
            .unwrap_or_default();

    let pending = MIGRATOR
        .iter()
        .filter(|m| !m.migration_type.is_down_migration() && !applied.contains(&m.version))
        .count();

    MIGRATOR.run(pool).await?;
    tracing::info!(pending, "migrations up to date");
    Ok(pending)
}

/// Round-trip a trivial query to prove the pool can reach the database.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}
