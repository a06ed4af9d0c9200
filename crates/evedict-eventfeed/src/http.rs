use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::FeedError;

const USER_AGENT: &str = "evedict/0.1 (forecast-generation)";

pub(crate) fn build_client(timeout_secs: u64) -> Result<Client, FeedError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(USER_AGENT)
        .build()?)
}

/// Parses `base_url`, forcing exactly one trailing slash so that
/// [`Url::join`] appends endpoint paths instead of replacing the last segment.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, FeedError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| FeedError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn endpoint(base: &Url, path: &str, params: &[(&str, &str)]) -> Result<Url, FeedError> {
    let mut url = base.join(path).map_err(|e| FeedError::InvalidBaseUrl {
        url: base.to_string(),
        reason: e.to_string(),
    })?;
    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in params {
            pairs.append_pair(k, v);
        }
    }
    Ok(url)
}

/// Sends a GET request and returns the status code with the raw body.
///
/// Status handling is left to the caller because some APIs put a useful
/// error envelope in non-2xx bodies.
pub(crate) async fn get_text(client: &Client, url: &Url) -> Result<(u16, String), FeedError> {
    let response = client.get(url.clone()).send().await?;
    let status = response.status().as_u16();
    let body = response.text().await?;
    Ok((status, body))
}
