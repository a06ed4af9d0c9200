//! Persistence capability used by the orchestrator.

use async_trait::async_trait;
use evedict_core::{Forecast, ForecastCategory, RelatedForecast};
use evedict_db::DbError;
use sqlx::PgPool;
use uuid::Uuid;

#[async_trait]
pub trait ForecastStore: Send + Sync {
    /// Whether an approved forecast already uses `image_url`.
    async fn exists_approved_by_image_url(&self, image_url: &str) -> Result<bool, DbError>;

    /// Store every forecast or none of them. Returns ids in input order.
    async fn save_forecasts(&self, forecasts: &[Forecast]) -> Result<Vec<Uuid>, DbError>;

    async fn related_forecasts(
        &self,
        id: Uuid,
        tags: &[String],
        category: ForecastCategory,
        limit: i64,
    ) -> Result<Vec<RelatedForecast>, DbError>;
}

/// [`ForecastStore`] over a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgForecastStore {
    pool: PgPool,
}

impl PgForecastStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ForecastStore for PgForecastStore {
    async fn exists_approved_by_image_url(&self, image_url: &str) -> Result<bool, DbError> {
        evedict_db::exists_approved_by_image_url(&self.pool, image_url).await
    }

    async fn save_forecasts(&self, forecasts: &[Forecast]) -> Result<Vec<Uuid>, DbError> {
        evedict_db::save_forecasts(&self.pool, forecasts).await
    }

    async fn related_forecasts(
        &self,
        id: Uuid,
        tags: &[String],
        category: ForecastCategory,
        limit: i64,
    ) -> Result<Vec<RelatedForecast>, DbError> {
        evedict_db::get_related_forecasts(&self.pool, id, tags, category, limit).await
    }
}
