use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title NewsAPI substitutes for articles that were pulled by the publisher.
pub const REMOVED_SENTINEL: &str = "[Removed]";

/// A news article as returned by the content source.
///
/// Articles are never persisted on their own; they only survive as
/// [`crate::Source`] entries on a forecast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub description: String,
    /// Canonical article URL.
    pub url: String,
    /// Publisher display name, e.g. `"Reuters"`.
    pub publisher: String,
    pub image_url: Option<String>,
    /// Language tag the feed was queried with (e.g. `"en"`).
    pub language: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl Article {
    /// Returns `true` if the publisher has withdrawn this article.
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.title.trim() == REMOVED_SENTINEL
    }

    /// The key used to detect already-approved content: the image URL, when
    /// one is present and non-blank.
    #[must_use]
    pub fn dedup_key(&self) -> Option<&str> {
        self.image_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}
