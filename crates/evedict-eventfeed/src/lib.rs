//! Upstream feed clients: NewsAPI for articles and the Polymarket Gamma API
//! for prediction-market events.
//!
//! Both clients are thin I/O wrappers that map wire payloads into
//! [`evedict_core`] domain types.

pub mod error;
pub mod newsapi;
pub mod polymarket;

mod de;
mod http;

pub use error::FeedError;
pub use newsapi::NewsApiClient;
pub use polymarket::PolymarketClient;
