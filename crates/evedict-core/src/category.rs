//! News feed categories and the coarser categories forecasts are filed under.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Top-headline categories supported by the news feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsCategory {
    Business,
    Entertainment,
    General,
    Health,
    Science,
    Sports,
    Technology,
}

impl NewsCategory {
    pub const ALL: [NewsCategory; 7] = [
        NewsCategory::Business,
        NewsCategory::Entertainment,
        NewsCategory::General,
        NewsCategory::Health,
        NewsCategory::Science,
        NewsCategory::Sports,
        NewsCategory::Technology,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NewsCategory::Business => "business",
            NewsCategory::Entertainment => "entertainment",
            NewsCategory::General => "general",
            NewsCategory::Health => "health",
            NewsCategory::Science => "science",
            NewsCategory::Sports => "sports",
            NewsCategory::Technology => "technology",
        }
    }
}

impl fmt::Display for NewsCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NewsCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        NewsCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| CoreError::UnknownCategory(s.to_string()))
    }
}

/// Category a forecast is stored and browsed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForecastCategory {
    Politics,
    Economy,
    Technology,
    Culture,
}

impl ForecastCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ForecastCategory::Politics => "Politics",
            ForecastCategory::Economy => "Economy",
            ForecastCategory::Technology => "Technology",
            ForecastCategory::Culture => "Culture",
        }
    }

    /// Derive a category from market tag labels.
    ///
    /// The first label that maps to a known category wins; events with no
    /// recognizable label are filed under [`ForecastCategory::Politics`].
    #[must_use]
    pub fn from_tag_labels<S: AsRef<str>>(labels: &[S]) -> Self {
        labels
            .iter()
            .find_map(|label| match label.as_ref().trim().to_ascii_lowercase().as_str() {
                "politics" | "elections" | "geopolitics" | "world" => {
                    Some(ForecastCategory::Politics)
                }
                "economy" | "business" | "finance" | "crypto" | "stocks" | "economics" => {
                    Some(ForecastCategory::Economy)
                }
                "tech" | "technology" | "ai" | "science" => Some(ForecastCategory::Technology),
                "culture" | "pop culture" | "sports" | "entertainment" | "music" | "movies" => {
                    Some(ForecastCategory::Culture)
                }
                _ => None,
            })
            .unwrap_or(ForecastCategory::Politics)
    }
}

impl From<NewsCategory> for ForecastCategory {
    fn from(category: NewsCategory) -> Self {
        match category {
            NewsCategory::Business => ForecastCategory::Economy,
            NewsCategory::Technology | NewsCategory::Science => ForecastCategory::Technology,
            NewsCategory::Entertainment | NewsCategory::Sports => ForecastCategory::Culture,
            NewsCategory::General | NewsCategory::Health => ForecastCategory::Politics,
        }
    }
}

impl fmt::Display for ForecastCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ForecastCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "politics" => Ok(ForecastCategory::Politics),
            "economy" => Ok(ForecastCategory::Economy),
            "technology" => Ok(ForecastCategory::Technology),
            "culture" => Ok(ForecastCategory::Culture),
            _ => Err(CoreError::UnknownCategory(s.to_string())),
        }
    }
}
