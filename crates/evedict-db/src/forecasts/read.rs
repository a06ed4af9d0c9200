use evedict_core::{Forecast, MarketSnapshot, Outcome, Source};
use sqlx::PgPool;
use uuid::Uuid;

use super::types::{parse_category, ForecastFilter, ForecastRow, MarketRow, OutcomeRow, SourceRow};
use crate::DbError;

/// Returns `true` if an approved forecast already uses `image_url`.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn exists_approved_by_image_url(pool: &PgPool, image_url: &str) -> Result<bool, DbError> {
    Ok(sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM forecasts WHERE image_url = $1 AND is_approved)",
    )
    .bind(image_url)
    .fetch_one(pool)
    .await?)
}

/// List forecast rows, newest first.
///
/// # Errors
///
/// Returns [`DbError`] on database query failure.
pub async fn list_forecasts(pool: &PgPool, filter: &ForecastFilter) -> Result<Vec<ForecastRow>, DbError> {
    Ok(sqlx::query_as::<_, ForecastRow>(
        "SELECT id, headline, summary, image_url, category, captured_at, is_approved, created_at \
         FROM forecasts \
         WHERE ($1::TEXT IS NULL OR category = $1) \
           AND ($2::BOOLEAN IS NULL OR is_approved = $2) \
         ORDER BY captured_at DESC, id \
         LIMIT $3 OFFSET $4",
    )
    .bind(filter.category.map(|c| c.as_str()))
    .bind(filter.approved)
    .bind(filter.page_size())
    .bind(filter.page_offset())
    .fetch_all(pool)
    .await?)
}

/// Load a full forecast with its outcomes, sources, tags and market snapshot.
///
/// `related` is left empty; see [`crate::get_related_forecasts`].
///
/// # Errors
///
/// Returns [`DbError::InvalidData`] if the stored category is unknown, or
/// [`DbError::Sqlx`] on query failure.
pub async fn get_forecast(pool: &PgPool, id: Uuid) -> Result<Option<Forecast>, DbError> {
    let Some(row) = sqlx::query_as::<_, ForecastRow>(
        "SELECT id, headline, summary, image_url, category, captured_at, is_approved, created_at \
         FROM forecasts WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    else {
        return Ok(None);
    };

    let outcomes = sqlx::query_as::<_, OutcomeRow>(
        "SELECT forecast_id, position, content, confidence_level \
         FROM outcomes WHERE forecast_id = $1 ORDER BY position",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let sources = sqlx::query_as::<_, SourceRow>(
        "SELECT forecast_id, position, name, title, url, image_url \
         FROM sources WHERE forecast_id = $1 ORDER BY position",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let tags = sqlx::query_scalar::<_, String>(
        "SELECT t.name FROM tags t \
         JOIN forecast_tags ft ON ft.tag_id = t.id \
         WHERE ft.forecast_id = $1 \
         ORDER BY t.name",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let market = sqlx::query_as::<_, MarketRow>(
        "SELECT m.external_id, m.question, m.outcomes, m.outcome_prices, m.volume, m.image_url \
         FROM markets m \
         JOIN forecast_markets fm ON fm.market_id = m.id \
         WHERE fm.forecast_id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(Some(Forecast {
        id: Some(row.id),
        category: parse_category(&row.category)?,
        headline: row.headline,
        summary: row.summary,
        outcomes: outcomes.into_iter().map(Outcome::from).collect(),
        image_url: row.image_url,
        tags,
        sources: sources.into_iter().map(Source::from).collect(),
        market: market.map(MarketSnapshot::from),
        captured_at: row.captured_at,
        approved: row.is_approved,
        related: Vec::new(),
    }))
}
