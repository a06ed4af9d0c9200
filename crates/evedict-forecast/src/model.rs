//! The generation capability the orchestrator depends on.

use async_trait::async_trait;
use evedict_replicate::{GenerationError, ReplicateClient};

use crate::error::ForecastError;
use crate::parse::{parse_forecast, parse_keywords, parse_selection, parse_single_index, ForecastDraft};

/// Longest slice of raw model output written to the log.
const LOGGED_OUTPUT_CHARS: usize = 500;

/// The four decisions the pipeline delegates to a language model.
#[async_trait]
pub trait ForecastModel: Send + Sync {
    /// Pick at least `min` distinct candidate indices.
    async fn select_indices(&self, prompt: &str, min: usize) -> Result<Vec<usize>, ForecastError>;

    /// Pick exactly one candidate index.
    async fn select_index(&self, prompt: &str) -> Result<usize, ForecastError>;

    /// Produce exactly two search keywords.
    async fn extract_keywords(&self, prompt: &str) -> Result<Vec<String>, ForecastError>;

    async fn synthesize_forecast(&self, prompt: &str) -> Result<ForecastDraft, ForecastError>;
}

/// Anything that turns a prompt into raw text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, GenerationError>;
}

#[async_trait]
impl TextGenerator for ReplicateClient {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, GenerationError> {
        ReplicateClient::generate(self, prompt, max_tokens).await
    }
}

/// [`ForecastModel`] backed by a raw text generator plus the output parsers.
pub struct JobModel<G> {
    generator: G,
    max_tokens: u32,
}

impl<G: TextGenerator> JobModel<G> {
    #[must_use]
    pub fn new(generator: G, max_tokens: u32) -> Self {
        Self {
            generator,
            max_tokens,
        }
    }

    async fn run<T>(
        &self,
        kind: &'static str,
        prompt: &str,
        parse: impl FnOnce(&str) -> Result<T, ForecastError>,
    ) -> Result<T, ForecastError> {
        let raw = self.generator.generate(prompt, self.max_tokens).await?;
        parse(&raw).inspect_err(|e| {
            tracing::warn!(
                kind,
                error = %short_reason(e),
                raw = truncate(&raw, LOGGED_OUTPUT_CHARS),
                "malformed generation output"
            );
        })
    }
}

#[async_trait]
impl<G: TextGenerator> ForecastModel for JobModel<G> {
    async fn select_indices(&self, prompt: &str, min: usize) -> Result<Vec<usize>, ForecastError> {
        self.run("selection", prompt, |raw| parse_selection(raw, min))
            .await
    }

    async fn select_index(&self, prompt: &str) -> Result<usize, ForecastError> {
        self.run("single selection", prompt, parse_single_index).await
    }

    async fn extract_keywords(&self, prompt: &str) -> Result<Vec<String>, ForecastError> {
        self.run("keywords", prompt, parse_keywords).await
    }

    async fn synthesize_forecast(&self, prompt: &str) -> Result<ForecastDraft, ForecastError> {
        self.run("forecast", prompt, parse_forecast).await
    }
}

fn short_reason(err: &ForecastError) -> &str {
    match err {
        ForecastError::InvalidSelection { reason, .. } | ForecastError::Parse { reason, .. } => {
            reason
        }
        _ => "unparseable output",
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    text.char_indices()
        .nth(max_chars)
        .map_or(text, |(end, _)| &text[..end])
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct CannedGenerator {
        output: Mutex<Option<Result<String, GenerationError>>>,
        seen: Mutex<Vec<(String, u32)>>,
    }

    impl CannedGenerator {
        fn new(output: Result<String, GenerationError>) -> Self {
            Self {
                output: Mutex::new(Some(output)),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, GenerationError> {
            self.seen
                .lock()
                .unwrap()
                .push((prompt.to_string(), max_tokens));
            self.output
                .lock()
                .unwrap()
                .take()
                .expect("generator called more than once")
        }
    }

    #[tokio::test]
    async fn select_indices_passes_prompt_and_budget() {
        let model = JobModel::new(
            CannedGenerator::new(Ok("```json\n{\"selected\": [1, 1, 3]}\n```".to_string())),
            512,
        );

        let indices = model.select_indices("pick two", 2).await.unwrap();

        assert_eq!(indices, vec![1, 3]);
        let seen = model.generator.seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[("pick two".to_string(), 512)]);
    }

    #[tokio::test]
    async fn generation_failure_surfaces_unchanged() {
        let model = JobModel::new(
            CannedGenerator::new(Err(GenerationError::Failed {
                job_id: "abc".to_string(),
                reason: "CUDA out of memory".to_string(),
            })),
            512,
        );

        let err = model.extract_keywords("keywords please").await.unwrap_err();

        assert!(matches!(
            err,
            ForecastError::Generation(GenerationError::Failed { .. })
        ));
    }

    #[tokio::test]
    async fn malformed_forecast_keeps_raw_output() {
        let model = JobModel::new(CannedGenerator::new(Ok("not json".to_string())), 512);

        let err = model.synthesize_forecast("forecast").await.unwrap_err();

        assert_eq!(err.raw_output(), Some("not json"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("short", 500), "short");
    }
}
