use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::article::Article;
use crate::category::ForecastCategory;
use crate::market::MarketSnapshot;

/// One possible resolution of a forecast with the model's confidence in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub content: String,
    /// Opaque 0-100 score; not range-checked.
    pub confidence_level: i32,
}

/// An article cited by a forecast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Publisher name.
    pub name: String,
    pub title: String,
    pub url: String,
    pub image_url: Option<String>,
}

impl From<&Article> for Source {
    fn from(article: &Article) -> Self {
        Self {
            name: article.publisher.clone(),
            title: article.title.clone(),
            url: article.url.clone(),
            image_url: article.image_url.clone(),
        }
    }
}

/// A generated forecast.
///
/// `id` is `None` until the forecast has been persisted. The first entry of
/// `sources` is always the article that triggered generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub id: Option<Uuid>,
    pub headline: String,
    pub summary: String,
    pub outcomes: Vec<Outcome>,
    pub category: ForecastCategory,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
    pub sources: Vec<Source>,
    pub market: Option<MarketSnapshot>,
    pub captured_at: DateTime<Utc>,
    pub approved: bool,
    /// Computed on read; never stored with the forecast.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<RelatedForecast>,
}

impl Forecast {
    #[must_use]
    pub fn main_source(&self) -> Option<&Source> {
        self.sources.first()
    }
}

/// A stored forecast surfaced next to another one through shared tags or
/// category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedForecast {
    pub id: Uuid,
    pub headline: String,
    pub summary: String,
    pub image_url: Option<String>,
    pub category: ForecastCategory,
    pub captured_at: DateTime<Utc>,
    pub matched_by_tag: bool,
}
