//! Database operations for `forecasts` and the tables hanging off it
//! (`outcomes`, `sources`, `forecast_tags`, `forecast_markets`).

mod read;
mod related;
mod types;
mod write;

pub use read::{exists_approved_by_image_url, get_forecast, list_forecasts};
pub use related::{get_related_forecasts, rank_related};
pub use types::{ForecastFilter, ForecastRow, MarketRow, OutcomeRow, RelatedForecastRow, SourceRow};
pub use write::{approve_forecast, save_forecasts};
