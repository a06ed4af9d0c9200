//! Wire types for the NewsAPI v2 endpoints.

use chrono::{DateTime, Utc};
use evedict_core::Article;
use serde::Deserialize;

/// Envelope shared by `/top-headlines` and `/everything`.
///
/// On failure NewsAPI answers `{"status": "error", "code": ..., "message": ...}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlesResponse {
    pub status: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub articles: Vec<NewsArticle>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsSource {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    #[serde(default)]
    pub source: NewsSource,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub url_to_image: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
}

impl NewsArticle {
    /// Converts to the domain [`Article`], or `None` when the entry has no URL.
    #[must_use]
    pub fn into_article(self, language: &str) -> Option<Article> {
        let url = self.url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())?;
        let published_at = self
            .published_at
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc));

        Some(Article {
            title: self.title.unwrap_or_default().trim().to_string(),
            description: self.description.unwrap_or_default().trim().to_string(),
            url,
            publisher: self.source.name.unwrap_or_default(),
            image_url: self.url_to_image.filter(|u| !u.trim().is_empty()),
            language: Some(language.to_string()),
            published_at,
        })
    }
}
