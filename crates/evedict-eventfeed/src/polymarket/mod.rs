//! HTTP client for the Polymarket Gamma API.

pub mod types;

use chrono::{DateTime, Duration, Utc};
use evedict_core::MarketEvent;
use reqwest::{Client, Url};

use crate::error::FeedError;
use crate::http::{build_client, endpoint, get_text, parse_base_url};
use types::GammaEvent;

pub const DEFAULT_BASE_URL: &str = "https://gamma-api.polymarket.com";

/// Only events that started within this window are considered.
const EVENT_LOOKBACK_DAYS: i64 = 7;
/// Minimum aggregate trading volume for an event to be listed.
const MIN_EVENT_VOLUME: &str = "5000";

pub struct PolymarketClient {
    client: Client,
    base_url: Url,
}

impl PolymarketClient {
    /// # Errors
    ///
    /// Returns [`FeedError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(timeout_secs: u64) -> Result<Self, FeedError> {
        Self::with_base_url(timeout_secs, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`FeedError::Http`] if the HTTP client cannot be built, or
    /// [`FeedError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(timeout_secs: u64, base_url: &str) -> Result<Self, FeedError> {
        Ok(Self {
            client: build_client(timeout_secs)?,
            base_url: parse_base_url(base_url)?,
        })
    }

    /// Fetches open, sufficiently traded events that started during the last
    /// week.
    ///
    /// # Errors
    ///
    /// See [`PolymarketClient::fetch_events_since`].
    pub async fn fetch_top_events(&self) -> Result<Vec<MarketEvent>, FeedError> {
        self.fetch_events_since(Utc::now() - Duration::days(EVENT_LOOKBACK_DAYS))
            .await
    }

    /// Fetches open events with at least the minimum volume whose start date
    /// is on or after `since`.
    ///
    /// # Errors
    ///
    /// - [`FeedError::Http`] / [`FeedError::UnexpectedStatus`] on transport failure.
    /// - [`FeedError::Deserialize`] if the body is not an array of events.
    pub async fn fetch_events_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<MarketEvent>, FeedError> {
        let start_date_min = since.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let url = endpoint(
            &self.base_url,
            "events",
            &[
                ("start_date_min", &start_date_min),
                ("volume_min", MIN_EVENT_VOLUME),
                ("closed", "false"),
            ],
        )?;
        let context = format!("events(start_date_min={start_date_min})");

        let (status, body) = get_text(&self.client, &url).await?;
        if !(200..300).contains(&status) {
            return Err(FeedError::UnexpectedStatus { status, context });
        }

        let events: Vec<GammaEvent> =
            serde_json::from_str(&body).map_err(|source| FeedError::Deserialize { context, source })?;

        tracing::debug!(count = events.len(), %start_date_min, "fetched market events");
        Ok(events.into_iter().map(MarketEvent::from).collect())
    }
}
