//! HTTP client for the NewsAPI v2 REST API.
//!
//! Two endpoints are used: `/top-headlines` to seed a generation run with a
//! category's current headlines, and `/everything` to gather related
//! coverage by keyword.

pub mod types;

use evedict_core::{Article, NewsCategory};
use reqwest::{Client, Url};

use crate::error::FeedError;
use crate::http::{build_client, endpoint, get_text, parse_base_url};
use types::ArticlesResponse;

pub const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";
const LANGUAGE: &str = "en";
/// Page size for keyword searches.
const RELATED_PAGE_SIZE: &str = "10";

/// Client for NewsAPI.
///
/// Use [`NewsApiClient::new`] for production or
/// [`NewsApiClient::with_base_url`] to point at a mock server in tests.
pub struct NewsApiClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl NewsApiClient {
    /// Creates a new client pointed at the production NewsAPI.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, FeedError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Http`] if the HTTP client cannot be built, or
    /// [`FeedError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, FeedError> {
        Ok(Self {
            client: build_client(timeout_secs)?,
            api_key: api_key.to_owned(),
            base_url: parse_base_url(base_url)?,
        })
    }

    /// Fetches the current top headlines for `category`.
    ///
    /// # Errors
    ///
    /// - [`FeedError::Api`] if NewsAPI returns an error envelope.
    /// - [`FeedError::Http`] / [`FeedError::UnexpectedStatus`] on transport failure.
    /// - [`FeedError::Deserialize`] if the body does not match the expected shape.
    pub async fn fetch_top_headlines(
        &self,
        category: NewsCategory,
    ) -> Result<Vec<Article>, FeedError> {
        let url = endpoint(
            &self.base_url,
            "top-headlines",
            &[
                ("category", category.as_str()),
                ("language", LANGUAGE),
                ("apiKey", &self.api_key),
            ],
        )?;
        let articles = self
            .request_articles(&url, &format!("top-headlines(category={category})"))
            .await?;

        tracing::debug!(%category, count = articles.len(), "fetched top headlines");
        Ok(articles)
    }

    /// Searches recent coverage matching all `keywords`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::EmptyKeywords`] without issuing a request when
    /// `keywords` has no non-blank entry; otherwise as
    /// [`NewsApiClient::fetch_top_headlines`].
    pub async fn fetch_by_keywords(&self, keywords: &[String]) -> Result<Vec<Article>, FeedError> {
        let terms: Vec<&str> = keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect();
        if terms.is_empty() {
            return Err(FeedError::EmptyKeywords);
        }
        let query = terms.join(" ");

        let url = endpoint(
            &self.base_url,
            "everything",
            &[
                ("q", &query),
                ("pageSize", RELATED_PAGE_SIZE),
                ("sortBy", "publishedAt"),
                ("language", LANGUAGE),
                ("apiKey", &self.api_key),
            ],
        )?;
        let articles = self
            .request_articles(&url, &format!("everything(q={query})"))
            .await?;

        tracing::debug!(query = %query, count = articles.len(), "fetched related articles");
        Ok(articles)
    }

    async fn request_articles(&self, url: &Url, context: &str) -> Result<Vec<Article>, FeedError> {
        let (status, body) = get_text(&self.client, url).await?;

        let envelope: ArticlesResponse = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !(200..300).contains(&status) => {
                return Err(FeedError::UnexpectedStatus {
                    status,
                    context: context.to_string(),
                })
            }
            Err(source) => {
                return Err(FeedError::Deserialize {
                    context: context.to_string(),
                    source,
                })
            }
        };

        if envelope.status != "ok" {
            return Err(FeedError::Api {
                code: envelope.code.unwrap_or_else(|| status.to_string()),
                message: envelope
                    .message
                    .unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        let total = envelope.articles.len();
        let articles: Vec<Article> = envelope
            .articles
            .into_iter()
            .filter_map(|a| a.into_article(LANGUAGE))
            .collect();
        if articles.len() < total {
            tracing::debug!(
                context,
                dropped = total - articles.len(),
                "dropped articles without a URL"
            );
        }

        Ok(articles)
    }
}
