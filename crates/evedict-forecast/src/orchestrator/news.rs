use evedict_core::{Article, NewsCategory};

use super::{ensure_enough, ensure_in_range, guard, CandidateOutcome, ForecastOrchestrator};
use crate::assemble::{assemble_forecast, normalize_tags};
use crate::cancel::CancelSignal;
use crate::error::{ForecastError, Stage};
use crate::types::ForecastBatch;

impl ForecastOrchestrator {
    /// Generate forecasts from the top headlines in `category`.
    ///
    /// Headline fetch and article selection failures abort the run. Articles
    /// whose image already backs an approved forecast are skipped. Failures
    /// in later per-article stages follow the configured candidate policy.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::Cancelled`] if `cancel` fires, or the first
    /// fatal error wrapped with its [`Stage`].
    pub async fn generate_forecasts(
        &self,
        category: NewsCategory,
        cancel: &CancelSignal,
    ) -> Result<ForecastBatch, ForecastError> {
        tracing::info!(%category, policy = %self.settings.candidate_policy, "starting news forecast run");

        let headlines = guard(
            cancel,
            Stage::FetchHeadlines,
            self.content.fetch_top_headlines(category),
        )
        .await?;

        let min = self.settings.min_selected;
        ensure_enough(headlines.len(), min, Stage::SelectArticles)?;
        let prompt = self.prompts.article_selection(&headlines, min);
        let selection = guard(
            cancel,
            Stage::SelectArticles,
            self.model.select_indices(&prompt, min),
        )
        .await?;
        ensure_in_range(&selection, headlines.len(), Stage::SelectArticles)?;
        tracing::info!(%category, headlines = headlines.len(), candidates = selection.len(), "articles selected");

        let mut batch = ForecastBatch::default();
        for index in selection {
            if cancel.is_cancelled() {
                return Err(ForecastError::Cancelled);
            }
            let article = &headlines[index];
            let outcome = self.news_candidate(article, category, cancel).await;
            self.collect(&mut batch, index, &article.title, outcome)?;
        }

        tracing::info!(
            %category,
            forecasts = batch.forecasts.len(),
            skipped = batch.skipped.len(),
            "news forecast run finished"
        );
        Ok(batch)
    }

    async fn news_candidate(
        &self,
        article: &Article,
        category: NewsCategory,
        cancel: &CancelSignal,
    ) -> Result<CandidateOutcome, ForecastError> {
        if let Some(reason) = self.duplicate_of(article, cancel).await? {
            return Ok(CandidateOutcome::Skipped(reason));
        }

        let prompt = self.prompts.keyword_extraction(article);
        let keywords = guard(
            cancel,
            Stage::ExtractKeywords,
            self.model.extract_keywords(&prompt),
        )
        .await?;

        let related = guard(
            cancel,
            Stage::FetchRelated,
            self.content.fetch_by_keywords(&keywords),
        )
        .await?;
        tracing::debug!(title = %article.title, ?keywords, related = related.len(), "fetched related coverage");

        let prompt = self
            .prompts
            .forecast(article, &related)
            .map_err(|e| e.in_stage(Stage::Synthesize))?;
        let draft = guard(
            cancel,
            Stage::Synthesize,
            self.model.synthesize_forecast(&prompt),
        )
        .await?;

        Ok(CandidateOutcome::Built(Box::new(assemble_forecast(
            draft,
            article,
            &related,
            normalize_tags(&keywords),
            category.into(),
            None,
        ))))
    }
}
