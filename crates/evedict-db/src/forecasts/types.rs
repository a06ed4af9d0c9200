use chrono::{DateTime, Utc};
use evedict_core::{
    ForecastCategory, MarketSnapshot, Outcome, RelatedForecast, Source,
};
use uuid::Uuid;

use crate::DbError;

const MAX_PAGE_SIZE: i64 = 100;
const DEFAULT_PAGE_SIZE: i64 = 20;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `forecasts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ForecastRow {
    pub id: Uuid,
    pub headline: String,
    pub summary: String,
    pub image_url: Option<String>,
    pub category: String,
    pub captured_at: DateTime<Utc>,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

/// A row from the `outcomes` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OutcomeRow {
    pub forecast_id: Uuid,
    pub position: i32,
    pub content: String,
    pub confidence_level: i32,
}

/// A row from the `sources` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SourceRow {
    pub forecast_id: Uuid,
    pub position: i32,
    pub name: String,
    pub title: String,
    pub url: String,
    pub image_url: Option<String>,
}

/// A row from the `markets` table, joined through `forecast_markets`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MarketRow {
    pub external_id: String,
    pub question: String,
    pub outcomes: String,
    pub outcome_prices: String,
    pub volume: String,
    pub image_url: Option<String>,
}

/// A forecast returned by the related-content query, flagged with how it
/// matched.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RelatedForecastRow {
    pub id: Uuid,
    pub headline: String,
    pub summary: String,
    pub image_url: Option<String>,
    pub category: String,
    pub captured_at: DateTime<Utc>,
    pub matched_by_tag: bool,
}

/// Filters for [`crate::list_forecasts`].
#[derive(Debug, Clone, Default)]
pub struct ForecastFilter {
    pub category: Option<ForecastCategory>,
    pub approved: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ForecastFilter {
    /// Page size clamped to `1..=100`, defaulting to 20.
    #[must_use]
    pub fn page_size(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    #[must_use]
    pub fn page_offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

// ---------------------------------------------------------------------------
// Row -> domain conversions
// ---------------------------------------------------------------------------

pub(crate) fn parse_category(raw: &str) -> Result<ForecastCategory, DbError> {
    raw.parse::<ForecastCategory>()
        .map_err(|e| DbError::InvalidData(e.to_string()))
}

impl From<OutcomeRow> for Outcome {
    fn from(row: OutcomeRow) -> Self {
        Outcome {
            content: row.content,
            confidence_level: row.confidence_level,
        }
    }
}

impl From<SourceRow> for Source {
    fn from(row: SourceRow) -> Self {
        Source {
            name: row.name,
            title: row.title,
            url: row.url,
            image_url: row.image_url,
        }
    }
}

impl From<MarketRow> for MarketSnapshot {
    fn from(row: MarketRow) -> Self {
        MarketSnapshot {
            external_id: row.external_id,
            question: row.question,
            outcomes: row.outcomes,
            outcome_prices: row.outcome_prices,
            volume: row.volume,
            image_url: row.image_url,
        }
    }
}

impl TryFrom<RelatedForecastRow> for RelatedForecast {
    type Error = DbError;

    fn try_from(row: RelatedForecastRow) -> Result<Self, Self::Error> {
        Ok(RelatedForecast {
            category: parse_category(&row.category)?,
            id: row.id,
            headline: row.headline,
            summary: row.summary,
            image_url: row.image_url,
            captured_at: row.captured_at,
            matched_by_tag: row.matched_by_tag,
        })
    }
}
