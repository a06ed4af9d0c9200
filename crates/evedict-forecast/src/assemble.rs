//! Turning a synthesized draft into a complete [`Forecast`].

use std::collections::HashSet;

use chrono::Utc;
use evedict_core::{Article, Forecast, ForecastCategory, MarketSnapshot, Source};

use crate::parse::ForecastDraft;

/// Build the source list for a forecast.
///
/// The main article always comes first. Related articles follow in order,
/// minus withdrawn articles and any URL already listed (including the main
/// article's).
#[must_use]
pub fn build_sources(main: &Article, related: &[Article]) -> Vec<Source> {
    let mut seen: HashSet<&str> = HashSet::from([main.url.as_str()]);
    let mut sources = vec![Source::from(main)];
    for article in related {
        if article.is_removed() || !seen.insert(article.url.as_str()) {
            continue;
        }
        sources.push(Source::from(article));
    }
    sources
}

/// Trim tags, drop blanks, and drop case-insensitive repeats keeping the
/// first spelling.
#[must_use]
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
        .collect()
}

/// Attach metadata to a draft. The forecast is unsaved and unapproved.
#[must_use]
pub fn assemble_forecast(
    draft: ForecastDraft,
    main: &Article,
    related: &[Article],
    tags: Vec<String>,
    category: ForecastCategory,
    market: Option<MarketSnapshot>,
) -> Forecast {
    Forecast {
        id: None,
        headline: draft.headline,
        summary: draft.summary,
        outcomes: draft.outcomes,
        category,
        image_url: main.dedup_key().map(str::to_string),
        tags,
        sources: build_sources(main, related),
        market,
        captured_at: Utc::now(),
        approved: false,
        related: Vec::new(),
    }
}
