use evedict_core::{Forecast, MarketSnapshot};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::DbError;

/// Persist a batch of forecasts atomically.
///
/// Every forecast row, together with its outcomes, sources, tags and market
/// snapshot, is written inside one transaction: either the whole batch is
/// stored or nothing is. Forecasts without an id get a fresh one. Returns
/// the ids in input order.
///
/// # Errors
///
/// Returns [`DbError::InvalidForecast`] if any forecast has no sources, or
/// [`DbError::Sqlx`] on query failure (the transaction is rolled back).
pub async fn save_forecasts(pool: &PgPool, forecasts: &[Forecast]) -> Result<Vec<Uuid>, DbError> {
    if let Some(bad) = forecasts.iter().find(|f| f.sources.is_empty()) {
        return Err(DbError::InvalidForecast(format!(
            "forecast '{}' has no sources",
            bad.headline
        )));
    }

    let mut tx = pool.begin().await?;
    let mut ids = Vec::with_capacity(forecasts.len());
    for forecast in forecasts {
        ids.push(insert_forecast(&mut tx, forecast).await?);
    }
    tx.commit().await?;

    Ok(ids)
}

/// Mark a forecast as approved.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no forecast has `id`, or [`DbError::Sqlx`]
/// on query failure.
pub async fn approve_forecast(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE forecasts SET is_approved = TRUE, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

async fn insert_forecast(
    tx: &mut Transaction<'_, Postgres>,
    forecast: &Forecast,
) -> Result<Uuid, DbError> {
    let id = forecast.id.unwrap_or_else(Uuid::new_v4);

    sqlx::query(
        "INSERT INTO forecasts (id, headline, summary, image_url, category, captured_at, is_approved) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(id)
    .bind(&forecast.headline)
    .bind(&forecast.summary)
    .bind(forecast.image_url.as_deref())
    .bind(forecast.category.as_str())
    .bind(forecast.captured_at)
    .bind(forecast.approved)
    .execute(&mut **tx)
    .await?;

    for (position, outcome) in forecast.outcomes.iter().enumerate() {
        sqlx::query(
            "INSERT INTO outcomes (id, forecast_id, position, content, confidence_level) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(position_i32(position))
        .bind(&outcome.content)
        .bind(outcome.confidence_level)
        .execute(&mut **tx)
        .await?;
    }

    for (position, source) in forecast.sources.iter().enumerate() {
        sqlx::query(
            "INSERT INTO sources (id, forecast_id, position, name, title, url, image_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(position_i32(position))
        .bind(&source.name)
        .bind(&source.title)
        .bind(&source.url)
        .bind(source.image_url.as_deref())
        .execute(&mut **tx)
        .await?;
    }

    for tag in &forecast.tags {
        let tag_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO tags (id, name) VALUES ($1, $2) \
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
             RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(tag)
        .fetch_one(&mut **tx)
        .await?;

        sqlx::query(
            "INSERT INTO forecast_tags (forecast_id, tag_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(tag_id)
        .execute(&mut **tx)
        .await?;
    }

    if let Some(market) = &forecast.market {
        let market_id = upsert_market(tx, market).await?;
        sqlx::query("INSERT INTO forecast_markets (forecast_id, market_id) VALUES ($1, $2)")
            .bind(id)
            .bind(market_id)
            .execute(&mut **tx)
            .await?;
    }

    Ok(id)
}

/// Insert or refresh a market snapshot keyed by its external id.
async fn upsert_market(
    tx: &mut Transaction<'_, Postgres>,
    market: &MarketSnapshot,
) -> Result<Uuid, DbError> {
    Ok(sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO markets (id, external_id, question, outcomes, outcome_prices, volume, image_url) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (external_id) DO UPDATE SET \
           question       = EXCLUDED.question, \
           outcomes       = EXCLUDED.outcomes, \
           outcome_prices = EXCLUDED.outcome_prices, \
           volume         = EXCLUDED.volume, \
           image_url      = EXCLUDED.image_url, \
           updated_at     = NOW() \
         RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(&market.external_id)
    .bind(&market.question)
    .bind(&market.outcomes)
    .bind(&market.outcome_prices)
    .bind(&market.volume)
    .bind(market.image_url.as_deref())
    .fetch_one(&mut **tx)
    .await?)
}

fn position_i32(position: usize) -> i32 {
    i32::try_from(position).unwrap_or(i32::MAX)
}
