//! The forecast generation pipeline.
//!
//! A run is strictly sequential: one candidate's duplicate check,
//! generation, and assembly finish before the next candidate starts. Every
//! outbound call is raced against the run's [`CancelSignal`].

mod market;
mod news;

#[cfg(test)]
mod tests;

use std::future::Future;
use std::sync::Arc;

use evedict_core::{Article, CandidatePolicy, Forecast};

use crate::cancel::CancelSignal;
use crate::error::{ForecastError, Stage};
use crate::model::ForecastModel;
use crate::prompt::PromptBuilder;
use crate::sources::{ContentSource, MarketSource};
use crate::store::ForecastStore;
use crate::types::{ForecastBatch, OrchestratorSettings, SkipReason, SkippedCandidate};

/// Drives forecast generation over injected collaborators.
pub struct ForecastOrchestrator {
    content: Arc<dyn ContentSource>,
    markets: Arc<dyn MarketSource>,
    model: Arc<dyn ForecastModel>,
    store: Arc<dyn ForecastStore>,
    prompts: PromptBuilder,
    settings: OrchestratorSettings,
}

/// What became of one selected candidate.
enum CandidateOutcome {
    Built(Box<Forecast>),
    Skipped(SkipReason),
}

impl ForecastOrchestrator {
    #[must_use]
    pub fn new(
        content: Arc<dyn ContentSource>,
        markets: Arc<dyn MarketSource>,
        model: Arc<dyn ForecastModel>,
        store: Arc<dyn ForecastStore>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            content,
            markets,
            model,
            store,
            prompts: PromptBuilder::default(),
            settings,
        }
    }

    /// Replace the built-in prompt templates.
    #[must_use]
    pub fn with_prompts(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    #[must_use]
    pub fn settings(&self) -> OrchestratorSettings {
        self.settings
    }

    /// Save every forecast in `batch` in one transaction and record the
    /// assigned ids on the forecasts.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::Stage`] wrapping the store error; nothing is
    /// saved in that case.
    pub async fn persist(&self, batch: &mut ForecastBatch) -> Result<(), ForecastError> {
        if batch.forecasts.is_empty() {
            return Ok(());
        }

        let ids = self
            .store
            .save_forecasts(&batch.forecasts)
            .await
            .map_err(|e| ForecastError::from(e).in_stage(Stage::Persist))?;
        for (forecast, id) in batch.forecasts.iter_mut().zip(ids) {
            forecast.id = Some(id);
        }

        tracing::info!(saved = batch.forecasts.len(), "persisted forecast batch");
        Ok(())
    }

    /// `Some` if an approved forecast already uses the article's image.
    /// Articles without an image are never duplicates.
    async fn duplicate_of(
        &self,
        article: &Article,
        cancel: &CancelSignal,
    ) -> Result<Option<SkipReason>, ForecastError> {
        let Some(image_url) = article.dedup_key() else {
            return Ok(None);
        };

        let exists = guard(
            cancel,
            Stage::DuplicateCheck,
            self.store.exists_approved_by_image_url(image_url),
        )
        .await?;
        if !exists {
            return Ok(None);
        }

        tracing::info!(image_url, title = %article.title, "already forecast, skipping candidate");
        Ok(Some(SkipReason::Duplicate {
            image_url: image_url.to_string(),
        }))
    }

    /// Apply the candidate policy to a failed candidate.
    ///
    /// Returns the error when the run must abort; otherwise records it in
    /// the batch's skip list.
    fn record_failure(
        &self,
        batch: &mut ForecastBatch,
        position: usize,
        label: &str,
        err: ForecastError,
    ) -> Result<(), ForecastError> {
        if err.is_cancelled() || self.settings.candidate_policy == CandidatePolicy::Abort {
            return Err(err);
        }

        tracing::warn!(position, label, error = %err, "candidate failed, continuing");
        batch.skipped.push(SkippedCandidate {
            position,
            label: label.to_string(),
            reason: SkipReason::Failed {
                stage: err.stage().map(|s| s.to_string()),
                message: err.to_string(),
            },
        });
        Ok(())
    }

    fn collect(
        &self,
        batch: &mut ForecastBatch,
        position: usize,
        label: &str,
        outcome: Result<CandidateOutcome, ForecastError>,
    ) -> Result<(), ForecastError> {
        match outcome {
            Ok(CandidateOutcome::Built(forecast)) => {
                batch.forecasts.push(*forecast);
                Ok(())
            }
            Ok(CandidateOutcome::Skipped(reason)) => {
                batch.skipped.push(SkippedCandidate {
                    position,
                    label: label.to_string(),
                    reason,
                });
                Ok(())
            }
            Err(err) => self.record_failure(batch, position, label, err),
        }
    }
}

/// Run `fut` unless `cancel` fires first. Errors are tagged with `stage`.
async fn guard<T, E, F>(cancel: &CancelSignal, stage: Stage, fut: F) -> Result<T, ForecastError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<ForecastError>,
{
    if cancel.is_cancelled() {
        return Err(ForecastError::Cancelled);
    }

    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ForecastError::Cancelled),
        result = fut => result.map_err(|e| e.into().in_stage(stage)),
    }
}

/// Check that a selection stage stayed within its candidate list.
fn ensure_in_range(selection: &[usize], len: usize, stage: Stage) -> Result<(), ForecastError> {
    match selection.iter().find(|&&index| index >= len) {
        Some(bad) => Err(ForecastError::InvalidSelection {
            reason: format!("index {bad} is out of range for {len} candidates"),
            raw: format!("{selection:?}"),
        }
        .in_stage(stage)),
        None => Ok(()),
    }
}

/// Fail early when there are fewer candidates than a selection must return.
fn ensure_enough(available: usize, min: usize, stage: Stage) -> Result<(), ForecastError> {
    if available < min {
        return Err(ForecastError::InvalidSelection {
            reason: format!("only {available} candidates available, at least {min} required"),
            raw: String::new(),
        }
        .in_stage(stage));
    }
    Ok(())
}
