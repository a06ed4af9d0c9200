//! Parsers that turn raw generation output into typed stage results.
//!
//! Model output is untrusted: it may wrap JSON in Markdown fences or
//! surrounding prose. Every failure keeps the raw text so a bad response
//! can be diagnosed without re-running the generation job.

use std::collections::HashSet;
use std::sync::LazyLock;

use evedict_core::Outcome;
use regex::Regex;
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ForecastError;

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z]*\s*(.*?)```").expect("valid regex"));

/// Number of keywords the keyword-extraction stage must produce.
pub const KEYWORD_COUNT: usize = 2;

/// Headline, summary and outcomes as synthesized by the model, before the
/// orchestrator attaches tags, sources and metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastDraft {
    pub headline: String,
    pub summary: String,
    pub outcomes: Vec<Outcome>,
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SelectionWire {
    selected: Value,
}

#[derive(Deserialize)]
struct DraftWire {
    #[serde(default)]
    headline: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    outcomes: Vec<OutcomeWire>,
}

#[derive(Deserialize)]
struct OutcomeWire {
    #[serde(default)]
    content: String,
    #[serde(
        default,
        rename = "confidenceLevel",
        alias = "confidence_level",
        deserialize_with = "lenient_confidence"
    )]
    confidence_level: i32,
}

// ---------------------------------------------------------------------------
// Parsers
// ---------------------------------------------------------------------------

/// Strip a Markdown code fence, if present, and surrounding whitespace.
fn strip_fences(raw: &str) -> &str {
    CODE_FENCE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map_or(raw, |m| m.as_str())
        .trim()
}

/// The first complete JSON object in `raw` after fence stripping.
///
/// Each `{` is tried in turn and exactly one value is read from it, so prose
/// before or after the object (braces included) is ignored.
#[must_use]
pub fn extract_json_object(raw: &str) -> Option<Value> {
    let body = strip_fences(raw);
    body.match_indices('{').find_map(|(start, _)| {
        match serde_json::Deserializer::from_str(&body[start..])
            .into_iter::<Value>()
            .next()
        {
            Some(Ok(value @ Value::Object(_))) => Some(value),
            _ => None,
        }
    })
}

/// Parse `{"selected": [..]}` into distinct indices, in first-seen order.
///
/// # Errors
///
/// Returns [`ForecastError::InvalidSelection`] if no object with a
/// `selected` array is found, an entry is not a non-negative integer, or
/// fewer than `min` distinct indices remain.
pub fn parse_selection(raw: &str, min: usize) -> Result<Vec<usize>, ForecastError> {
    let invalid = |reason: String| ForecastError::InvalidSelection {
        reason,
        raw: raw.to_string(),
    };

    let wire = selection_wire(raw).map_err(&invalid)?;
    let Value::Array(entries) = wire.selected else {
        return Err(invalid("`selected` is not an array".to_string()));
    };

    let mut indices = Vec::with_capacity(entries.len());
    for entry in &entries {
        let index =
            as_index(entry).ok_or_else(|| invalid(format!("`{entry}` is not a valid index")))?;
        if !indices.contains(&index) {
            indices.push(index);
        }
    }

    if indices.len() < min {
        return Err(invalid(format!(
            "selected {} indices, at least {min} required",
            indices.len()
        )));
    }
    Ok(indices)
}

/// Parse a single index from `{"selected": n}` or a bare integer.
///
/// # Errors
///
/// Returns [`ForecastError::InvalidSelection`] if neither shape is found.
pub fn parse_single_index(raw: &str) -> Result<usize, ForecastError> {
    let invalid = |reason: String| ForecastError::InvalidSelection {
        reason,
        raw: raw.to_string(),
    };

    if let Ok(index) = strip_fences(raw).parse::<usize>() {
        return Ok(index);
    }

    let wire = selection_wire(raw).map_err(&invalid)?;
    let index = match &wire.selected {
        Value::Array(entries) if entries.len() == 1 => as_index(&entries[0]),
        other => as_index(other),
    };
    index.ok_or_else(|| invalid(format!("`{}` is not a single valid index", wire.selected)))
}

/// Parse a comma-separated keyword list.
///
/// Entries are trimmed and stripped of surrounding quotes; empty entries are
/// dropped.
///
/// # Errors
///
/// Returns [`ForecastError::Parse`] unless exactly [`KEYWORD_COUNT`]
/// keywords remain, or if two of them differ only in case.
pub fn parse_keywords(raw: &str) -> Result<Vec<String>, ForecastError> {
    let keywords: Vec<String> = strip_fences(raw)
        .split(',')
        .map(|k| k.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect();

    if keywords.len() != KEYWORD_COUNT {
        return Err(ForecastError::Parse {
            kind: "keywords",
            reason: format!(
                "expected {KEYWORD_COUNT} keywords, found {}",
                keywords.len()
            ),
            raw: raw.to_string(),
        });
    }

    let distinct: HashSet<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
    if distinct.len() != keywords.len() {
        return Err(ForecastError::Parse {
            kind: "keywords",
            reason: "keywords repeat the same term".to_string(),
            raw: raw.to_string(),
        });
    }
    Ok(keywords)
}

/// Parse a synthesized forecast.
///
/// # Errors
///
/// Returns [`ForecastError::Parse`] if no JSON object is found, it does not
/// match the forecast shape, or the headline, summary or outcomes are empty.
pub fn parse_forecast(raw: &str) -> Result<ForecastDraft, ForecastError> {
    let parse_err = |reason: String| ForecastError::Parse {
        kind: "forecast",
        reason,
        raw: raw.to_string(),
    };

    let object =
        extract_json_object(raw).ok_or_else(|| parse_err("no JSON object found".to_string()))?;
    let wire: DraftWire = serde_json::from_value(object).map_err(|e| parse_err(e.to_string()))?;

    let headline = wire.headline.trim().to_string();
    let summary = wire.summary.trim().to_string();
    if headline.is_empty() || summary.is_empty() {
        return Err(parse_err("headline and summary are required".to_string()));
    }

    let outcomes: Vec<Outcome> = wire
        .outcomes
        .into_iter()
        .filter(|o| !o.content.trim().is_empty())
        .map(|o| Outcome {
            content: o.content.trim().to_string(),
            confidence_level: o.confidence_level,
        })
        .collect();
    if outcomes.is_empty() {
        return Err(parse_err("at least one outcome is required".to_string()));
    }

    Ok(ForecastDraft {
        headline,
        summary,
        outcomes,
    })
}

fn selection_wire(raw: &str) -> Result<SelectionWire, String> {
    let object = extract_json_object(raw).ok_or_else(|| "no JSON object found".to_string())?;
    serde_json::from_value(object)
        .map_err(|e| format!("missing or malformed `selected` field: {e}"))
}

fn as_index(value: &Value) -> Option<usize> {
    value.as_u64().and_then(|n| usize::try_from(n).ok())
}

/// Accept integers, floats (rounded) and numeric strings such as `"70"` or
/// `"70%"`.
fn lenient_confidence<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let number = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };

    number
        .filter(|n| n.is_finite() && (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(n))
        .map(|n| {
            #[allow(clippy::cast_possible_truncation)]
            let rounded = n.round() as i32;
            rounded
        })
        .ok_or_else(|| de::Error::custom(format!("invalid confidence level {value}")))
}
