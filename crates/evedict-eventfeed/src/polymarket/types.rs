//! Wire types for the Polymarket Gamma `/events` endpoint.

use chrono::{DateTime, Utc};
use evedict_core::{EventMarket, EventTag, MarketEvent};
use serde::Deserialize;

use crate::de::{f64_lenient, json_array_string, string_or_number};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GammaEvent {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "f64_lenient")]
    pub volume: f64,
    #[serde(default)]
    pub tags: Vec<GammaTag>,
    #[serde(default)]
    pub markets: Vec<GammaMarket>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GammaTag {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GammaMarket {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "json_array_string")]
    pub outcomes: String,
    #[serde(default, deserialize_with = "json_array_string")]
    pub outcome_prices: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub volume: String,
    #[serde(default)]
    pub volume_num: Option<f64>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub closed: bool,
}

impl From<GammaEvent> for MarketEvent {
    fn from(event: GammaEvent) -> Self {
        let start_date = event
            .start_date
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc));

        MarketEvent {
            id: event.id,
            title: event.title,
            description: event.description,
            start_date,
            image_url: event.image.filter(|u| !u.trim().is_empty()),
            volume: event.volume,
            tags: event
                .tags
                .into_iter()
                .map(|t| EventTag {
                    id: t.id,
                    label: t.label,
                })
                .collect(),
            markets: event.markets.into_iter().map(EventMarket::from).collect(),
        }
    }
}

impl From<GammaMarket> for EventMarket {
    fn from(market: GammaMarket) -> Self {
        // Older payloads leave `volume` empty and only fill `volumeNum`.
        let volume = if market.volume.is_empty() {
            market.volume_num.map(|v| v.to_string()).unwrap_or_default()
        } else {
            market.volume
        };

        EventMarket {
            id: market.id,
            question: market.question,
            description: market.description,
            outcomes: market.outcomes,
            outcome_prices: market.outcome_prices,
            volume,
            active: market.active,
            closed: market.closed,
        }
    }
}
