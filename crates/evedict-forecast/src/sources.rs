//! Capability traits over the article and market feeds.

use async_trait::async_trait;
use evedict_core::{Article, MarketEvent, NewsCategory};
use evedict_eventfeed::{FeedError, NewsApiClient, PolymarketClient};

#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_top_headlines(&self, category: NewsCategory) -> Result<Vec<Article>, FeedError>;

    async fn fetch_by_keywords(&self, keywords: &[String]) -> Result<Vec<Article>, FeedError>;
}

#[async_trait]
pub trait MarketSource: Send + Sync {
    async fn fetch_top_events(&self) -> Result<Vec<MarketEvent>, FeedError>;
}

#[async_trait]
impl ContentSource for NewsApiClient {
    async fn fetch_top_headlines(&self, category: NewsCategory) -> Result<Vec<Article>, FeedError> {
        NewsApiClient::fetch_top_headlines(self, category).await
    }

    async fn fetch_by_keywords(&self, keywords: &[String]) -> Result<Vec<Article>, FeedError> {
        NewsApiClient::fetch_by_keywords(self, keywords).await
    }
}

#[async_trait]
impl MarketSource for PolymarketClient {
    async fn fetch_top_events(&self) -> Result<Vec<MarketEvent>, FeedError> {
        PolymarketClient::fetch_top_events(self).await
    }
}
