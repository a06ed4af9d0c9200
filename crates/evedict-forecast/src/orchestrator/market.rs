use evedict_core::{ForecastCategory, MarketEvent};

use super::{ensure_enough, ensure_in_range, guard, CandidateOutcome, ForecastOrchestrator};
use crate::assemble::{assemble_forecast, normalize_tags};
use crate::cancel::CancelSignal;
use crate::error::{ForecastError, Stage};
use crate::types::{ForecastBatch, SkipReason};

impl ForecastOrchestrator {
    /// Generate forecasts anchored to prediction-market events.
    ///
    /// Only events with exactly one nested market are considered. For each
    /// selected event the model picks the best matching article from a
    /// keyword search on the event's tags, and the forecast carries the
    /// market's pricing snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::Cancelled`] if `cancel` fires, or the first
    /// fatal error wrapped with its [`Stage`].
    pub async fn generate_poly_forecasts(
        &self,
        cancel: &CancelSignal,
    ) -> Result<ForecastBatch, ForecastError> {
        tracing::info!(policy = %self.settings.candidate_policy, "starting market forecast run");

        let events = guard(cancel, Stage::FetchEvents, self.markets.fetch_top_events()).await?;
        let fetched = events.len();
        let events: Vec<MarketEvent> = events
            .into_iter()
            .filter(MarketEvent::is_single_market)
            .collect();

        let min = self.settings.min_selected;
        ensure_enough(events.len(), min, Stage::SelectMarkets)?;
        let prompt = self.prompts.market_selection(&events, min);
        let selection = guard(
            cancel,
            Stage::SelectMarkets,
            self.model.select_indices(&prompt, min),
        )
        .await?;
        ensure_in_range(&selection, events.len(), Stage::SelectMarkets)?;
        tracing::info!(fetched, single_market = events.len(), candidates = selection.len(), "market events selected");

        let mut batch = ForecastBatch::default();
        for index in selection {
            if cancel.is_cancelled() {
                return Err(ForecastError::Cancelled);
            }
            let event = &events[index];
            let outcome = self.market_candidate(event, cancel).await;
            self.collect(&mut batch, index, &event.title, outcome)?;
        }

        tracing::info!(
            forecasts = batch.forecasts.len(),
            skipped = batch.skipped.len(),
            "market forecast run finished"
        );
        Ok(batch)
    }

    async fn market_candidate(
        &self,
        event: &MarketEvent,
        cancel: &CancelSignal,
    ) -> Result<CandidateOutcome, ForecastError> {
        let labels = event.tag_labels();
        let mut keywords = normalize_tags(&labels);
        if keywords.is_empty() {
            keywords = normalize_tags([event.title.as_str()]);
        }

        let related = guard(
            cancel,
            Stage::FetchRelated,
            self.content.fetch_by_keywords(&keywords),
        )
        .await?;
        if related.is_empty() {
            tracing::warn!(event_id = %event.id, title = %event.title, ?keywords, "no articles for market event, skipping");
            return Ok(CandidateOutcome::Skipped(SkipReason::NoRelatedArticles));
        }

        let prompt = self.prompts.event_article_selection(event, &related);
        let chosen = guard(
            cancel,
            Stage::SelectArticle,
            self.model.select_index(&prompt),
        )
        .await?;
        ensure_in_range(&[chosen], related.len(), Stage::SelectArticle)?;
        let main = &related[chosen];

        if let Some(reason) = self.duplicate_of(main, cancel).await? {
            return Ok(CandidateOutcome::Skipped(reason));
        }

        let prompt = self
            .prompts
            .market_forecast(main, &related, event)
            .map_err(|e| e.in_stage(Stage::Synthesize))?;
        let draft = guard(
            cancel,
            Stage::Synthesize,
            self.model.synthesize_forecast(&prompt),
        )
        .await?;

        Ok(CandidateOutcome::Built(Box::new(assemble_forecast(
            draft,
            main,
            &related,
            keywords,
            ForecastCategory::from_tag_labels(&labels),
            event.snapshot(),
        ))))
    }
}
