//! Prediction-market events and the pricing snapshot attached to forecasts.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// A market event listing: one question area with one or more nested markets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketEvent {
    pub id: String,
    pub title: String,
    pub description: String,
    pub start_date: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    /// Aggregate trading volume across all nested markets.
    pub volume: f64,
    pub tags: Vec<EventTag>,
    pub markets: Vec<EventMarket>,
}

impl MarketEvent {
    /// An SMP event carries exactly one nested market.
    #[must_use]
    pub fn is_single_market(&self) -> bool {
        self.markets.len() == 1
    }

    #[must_use]
    pub fn tag_labels(&self) -> Vec<String> {
        self.tags
            .iter()
            .map(|t| t.label.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect()
    }

    /// Pricing snapshot of the first nested market, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<MarketSnapshot> {
        self.markets
            .first()
            .map(|market| MarketSnapshot::from_event_market(self, market))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTag {
    pub id: String,
    pub label: String,
}

/// A single tradable market nested under a [`MarketEvent`].
///
/// `outcomes` and `outcome_prices` are kept exactly as the market API encodes
/// them: JSON arrays serialized into strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMarket {
    pub id: String,
    pub question: String,
    pub description: String,
    pub outcomes: String,
    pub outcome_prices: String,
    pub volume: String,
    pub active: bool,
    pub closed: bool,
}

/// Market pricing captured onto a forecast at generation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Identifier of the market on the upstream exchange.
    pub external_id: String,
    pub question: String,
    /// JSON-encoded array of outcome labels, e.g. `["Yes","No"]`.
    pub outcomes: String,
    /// JSON-encoded array of prices, e.g. `["0.115","0.885"]`.
    pub outcome_prices: String,
    pub volume: String,
    pub image_url: Option<String>,
}

/// An outcome label paired with its market price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedOutcome {
    pub label: String,
    pub price: Decimal,
}

impl MarketSnapshot {
    #[must_use]
    pub fn from_event_market(event: &MarketEvent, market: &EventMarket) -> Self {
        Self {
            external_id: market.id.clone(),
            question: market.question.clone(),
            outcomes: market.outcomes.clone(),
            outcome_prices: market.outcome_prices.clone(),
            volume: market.volume.clone(),
            image_url: event.image_url.clone(),
        }
    }

    /// Decode the outcome labels.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidMarketField`] if `outcomes` is not a JSON
    /// array of strings.
    pub fn outcome_labels(&self) -> Result<Vec<String>, CoreError> {
        serde_json::from_str(&self.outcomes).map_err(|e| CoreError::InvalidMarketField {
            field: "outcomes",
            reason: e.to_string(),
        })
    }

    /// Decode the outcome prices. Prices may be encoded as strings or numbers.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidMarketField`] if `outcome_prices` is not a
    /// JSON array or an element is not a decimal.
    pub fn prices(&self) -> Result<Vec<Decimal>, CoreError> {
        let raw: Vec<serde_json::Value> =
            serde_json::from_str(&self.outcome_prices).map_err(|e| {
                CoreError::InvalidMarketField {
                    field: "outcome_prices",
                    reason: e.to_string(),
                }
            })?;

        raw.iter().map(parse_price).collect()
    }

    /// Zip labels with prices.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidMarketField`] if either field fails to
    /// decode or the two arrays differ in length.
    pub fn priced_outcomes(&self) -> Result<Vec<PricedOutcome>, CoreError> {
        let labels = self.outcome_labels()?;
        let prices = self.prices()?;
        if labels.len() != prices.len() {
            return Err(CoreError::InvalidMarketField {
                field: "outcome_prices",
                reason: format!(
                    "{} prices for {} outcomes",
                    prices.len(),
                    labels.len()
                ),
            });
        }

        Ok(labels
            .into_iter()
            .zip(prices)
            .map(|(label, price)| PricedOutcome { label, price })
            .collect())
    }
}

fn parse_price(value: &serde_json::Value) -> Result<Decimal, CoreError> {
    let text = match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        other => {
            return Err(CoreError::InvalidMarketField {
                field: "outcome_prices",
                reason: format!("unexpected price value: {other}"),
            })
        }
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| CoreError::InvalidMarketField {
            field: "outcome_prices",
            reason: format!("'{text}': {e}"),
        })
}
