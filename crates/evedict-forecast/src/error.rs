use evedict_db::DbError;
use evedict_eventfeed::FeedError;
use evedict_replicate::GenerationError;
use thiserror::Error;

/// Pipeline step an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FetchHeadlines,
    SelectArticles,
    DuplicateCheck,
    ExtractKeywords,
    FetchRelated,
    Synthesize,
    FetchEvents,
    SelectMarkets,
    SelectArticle,
    Persist,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Stage::FetchHeadlines => "fetching headlines",
            Stage::SelectArticles => "selecting articles",
            Stage::DuplicateCheck => "checking for duplicates",
            Stage::ExtractKeywords => "extracting keywords",
            Stage::FetchRelated => "fetching related articles",
            Stage::Synthesize => "synthesizing forecast",
            Stage::FetchEvents => "fetching market events",
            Stage::SelectMarkets => "selecting markets",
            Stage::SelectArticle => "selecting article for event",
            Stage::Persist => "persisting forecasts",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum ForecastError {
    /// Transport or API failure from a content or market feed.
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),

    /// The generation job failed, timed out, or could not be reached.
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    /// A selection stage returned too few, malformed, or out-of-range indices.
    #[error("invalid selection: {reason}")]
    InvalidSelection { reason: String, raw: String },

    /// Model output could not be parsed. `raw` holds the offending text.
    #[error("could not parse {kind} output: {reason}; raw output: {raw}")]
    Parse {
        kind: &'static str,
        reason: String,
        raw: String,
    },

    #[error("prompt error: {0}")]
    Prompt(String),

    #[error("store error: {0}")]
    Store(#[from] DbError),

    #[error("run cancelled")]
    Cancelled,

    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<ForecastError>,
    },
}

impl ForecastError {
    /// Wrap `self` with the stage it was raised in.
    ///
    /// Cancellation and errors that already carry a stage pass through
    /// unchanged.
    #[must_use]
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            ForecastError::Cancelled | ForecastError::Stage { .. } => self,
            other => ForecastError::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            ForecastError::Cancelled => true,
            ForecastError::Stage { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// The stage this error was raised in, if known.
    #[must_use]
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ForecastError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Raw model output attached to a parse or selection failure.
    #[must_use]
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            ForecastError::InvalidSelection { raw, .. } | ForecastError::Parse { raw, .. } => {
                Some(raw)
            }
            ForecastError::Stage { source, .. } => source.raw_output(),
            _ => None,
        }
    }
}
