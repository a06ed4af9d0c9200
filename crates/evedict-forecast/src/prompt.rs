//! Stage-specific prompt templates and rendering.
//!
//! Templates use `{name}` placeholders. Rendering is a single pass: values
//! are inserted verbatim and never re-scanned, and braces that do not name a
//! known placeholder (the JSON examples embedded in the templates) are left
//! untouched.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::LazyLock;

use evedict_core::{Article, MarketEvent};
use regex::{Captures, Regex};
use serde::Deserialize;

use crate::error::ForecastError;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("valid regex"));

const SELECT_ARTICLES: &str = r#"You are an editor for a forecasting publication.
Below is a numbered list of today's headlines. Pick the {count} stories whose
developments are most worth forecasting over the coming weeks. Prefer stories
with a clear open question and measurable outcomes. Avoid near-duplicates.

{articles}

Respond with JSON only, in the form {"selected": [0, 3]}, listing exactly
{count} indices from the list above."#;

const SELECT_MARKETS: &str = r#"You are an editor for a forecasting publication.
Below is a numbered list of prediction-market events. Pick the {count} events
with the broadest public interest and the most newsworthy open question.

{events}

Respond with JSON only, in the form {"selected": [1, 4]}, listing exactly
{count} indices from the list above."#;

const SELECT_ARTICLE_FOR_EVENT: &str = r#"A prediction market asks about the following event:

{event}

Below is a numbered list of recent news articles. Pick the single article
that best explains the current state of this event.

{articles}

Respond with JSON only, in the form {"selected": 2}."#;

const EXTRACT_KEYWORDS: &str = r"Extract exactly two search keywords that would find further coverage of
the following news story. Use short proper nouns or noun phrases.

Title: {title}
Description: {description}

Respond with the two keywords separated by a comma and nothing else.";

const FORECAST: &str = r#"You are an analyst writing a short forecast.

Main story:
{main_article}

Related coverage:
{related_articles}

Write a forecast about how the main story is likely to develop. Respond with
JSON only, using this shape:
{"headline": "...", "summary": "...", "outcomes": [{"content": "...", "confidenceLevel": 60}]}
Give two to four mutually exclusive outcomes. confidenceLevel is an integer
from 0 to 100."#;

const MARKET_FORECAST: &str = r#"You are an analyst writing a short forecast anchored to a prediction market.

Market:
{event}

Main story:
{main_article}

Related coverage:
{related_articles}

Write a forecast about how the market question is likely to resolve, taking
the current market prices into account. Respond with JSON only, using this
shape:
{"headline": "...", "summary": "...", "outcomes": [{"content": "...", "confidenceLevel": 60}]}
Give two to four mutually exclusive outcomes. confidenceLevel is an integer
from 0 to 100."#;

/// Raw template text for every prompt the pipeline renders.
///
/// Every key is optional when loading from YAML; missing keys keep their
/// built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PromptTemplates {
    pub select_articles: String,
    pub select_markets: String,
    pub select_article_for_event: String,
    pub extract_keywords: String,
    pub forecast: String,
    pub market_forecast: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            select_articles: SELECT_ARTICLES.to_string(),
            select_markets: SELECT_MARKETS.to_string(),
            select_article_for_event: SELECT_ARTICLE_FOR_EVENT.to_string(),
            extract_keywords: EXTRACT_KEYWORDS.to_string(),
            forecast: FORECAST.to_string(),
            market_forecast: MARKET_FORECAST.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Parse template overrides from YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::Prompt`] if the document is not valid YAML or
    /// names an unknown template.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ForecastError> {
        serde_yaml::from_str(yaml)
            .map_err(|e| ForecastError::Prompt(format!("invalid prompt templates: {e}")))
    }

    /// Read template overrides from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::Prompt`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ForecastError> {
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            ForecastError::Prompt(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&yaml)
    }
}

/// Renders prompts for each pipeline stage.
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    templates: PromptTemplates,
}

impl PromptBuilder {
    #[must_use]
    pub fn new(templates: PromptTemplates) -> Self {
        Self { templates }
    }

    #[must_use]
    pub fn article_selection(&self, articles: &[Article], count: usize) -> String {
        render(
            &self.templates.select_articles,
            &[
                ("articles", article_list(articles)),
                ("count", count.to_string()),
            ],
        )
    }

    #[must_use]
    pub fn market_selection(&self, events: &[MarketEvent], count: usize) -> String {
        render(
            &self.templates.select_markets,
            &[("events", event_list(events)), ("count", count.to_string())],
        )
    }

    #[must_use]
    pub fn event_article_selection(&self, event: &MarketEvent, articles: &[Article]) -> String {
        render(
            &self.templates.select_article_for_event,
            &[
                ("event", event_detail(event)),
                ("articles", article_list(articles)),
            ],
        )
    }

    #[must_use]
    pub fn keyword_extraction(&self, article: &Article) -> String {
        render(
            &self.templates.extract_keywords,
            &[
                ("title", article.title.trim().to_string()),
                ("description", article.description.trim().to_string()),
            ],
        )
    }

    /// Forecast synthesis prompt for the news path.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::Prompt`] if the main article has no title or
    /// description.
    pub fn forecast(&self, main: &Article, related: &[Article]) -> Result<String, ForecastError> {
        require_main_article(main)?;
        Ok(render(
            &self.templates.forecast,
            &[
                ("main_article", article_detail(main)),
                ("related_articles", article_list(related)),
            ],
        ))
    }

    /// Forecast synthesis prompt for the market path, with the event as
    /// extra context.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::Prompt`] if the main article has no title or
    /// description.
    pub fn market_forecast(
        &self,
        main: &Article,
        related: &[Article],
        event: &MarketEvent,
    ) -> Result<String, ForecastError> {
        require_main_article(main)?;
        Ok(render(
            &self.templates.market_forecast,
            &[
                ("event", event_detail(event)),
                ("main_article", article_detail(main)),
                ("related_articles", article_list(related)),
            ],
        ))
    }
}

fn require_main_article(article: &Article) -> Result<(), ForecastError> {
    if article.title.trim().is_empty() || article.description.trim().is_empty() {
        return Err(ForecastError::Prompt(format!(
            "main article {} is missing title or description",
            article.url
        )));
    }
    Ok(())
}

fn render(template: &str, values: &[(&str, String)]) -> String {
    let values: HashMap<&str, &str> = values.iter().map(|(k, v)| (*k, v.as_str())).collect();
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            values
                .get(&caps[1])
                .map_or_else(|| caps[0].to_string(), |v| (*v).to_string())
        })
        .into_owned()
}

fn article_list(articles: &[Article]) -> String {
    if articles.is_empty() {
        return "(none)".to_string();
    }
    let mut out = String::new();
    for (i, article) in articles.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(
            out,
            "[{i}] {}: {} ({})",
            article.title.trim(),
            article.description.trim(),
            article.publisher.trim()
        );
    }
    out
}

fn article_detail(article: &Article) -> String {
    format!(
        "{}\n{}\nPublisher: {}",
        article.title.trim(),
        article.description.trim(),
        article.publisher.trim()
    )
}

fn event_list(events: &[MarketEvent]) -> String {
    let mut out = String::new();
    for (i, event) in events.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(
            out,
            "[{i}] {}: {} (volume {:.0})",
            event.title.trim(),
            event.description.trim(),
            event.volume
        );
    }
    out
}

fn event_detail(event: &MarketEvent) -> String {
    let mut out = format!("{}\n{}", event.title.trim(), event.description.trim());
    if let Some(snapshot) = event.snapshot() {
        let _ = write!(out, "\nQuestion: {}", snapshot.question.trim());
        if let Ok(priced) = snapshot.priced_outcomes() {
            let prices: Vec<String> = priced
                .iter()
                .map(|p| format!("{} at {}", p.label, p.price))
                .collect();
            let _ = write!(out, "\nCurrent prices: {}", prices.join(", "));
        }
    }
    out
}
