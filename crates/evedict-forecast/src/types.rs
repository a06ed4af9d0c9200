use evedict_core::{AppConfig, CandidatePolicy, Forecast};
use serde::Serialize;

const DEFAULT_MIN_SELECTED: usize = 2;

/// Tunables for a [`crate::ForecastOrchestrator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Minimum number of candidates a selection stage must return.
    pub min_selected: usize,
    pub candidate_policy: CandidatePolicy,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            min_selected: DEFAULT_MIN_SELECTED,
            candidate_policy: CandidatePolicy::default(),
        }
    }
}

impl From<&AppConfig> for OrchestratorSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            min_selected: config.min_selected,
            candidate_policy: config.candidate_policy,
        }
    }
}

/// Output of one generation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ForecastBatch {
    pub forecasts: Vec<Forecast>,
    /// Candidates that were selected but produced no forecast.
    pub skipped: Vec<SkippedCandidate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedCandidate {
    /// Index of the candidate in the list the selection stage chose from.
    pub position: usize,
    /// Article or event title.
    pub label: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// An approved forecast already uses this image.
    Duplicate { image_url: String },
    /// The keyword search for a market event found nothing to cite.
    NoRelatedArticles,
    /// A later stage failed and the run was configured to continue.
    Failed {
        stage: Option<String>,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn skipped_candidate_serializes_flat() {
        let skipped = SkippedCandidate {
            position: 3,
            label: "Fed holds".to_string(),
            reason: SkipReason::Duplicate {
                image_url: "https://img.example/1.jpg".to_string(),
            },
        };

        assert_eq!(
            serde_json::to_value(&skipped).unwrap(),
            json!({
                "position": 3,
                "label": "Fed holds",
                "reason": "duplicate",
                "image_url": "https://img.example/1.jpg"
            })
        );
    }

    #[test]
    fn default_settings_match_pipeline_defaults() {
        let settings = OrchestratorSettings::default();
        assert_eq!(settings.min_selected, 2);
        assert_eq!(settings.candidate_policy, CandidatePolicy::Abort);
    }
}
