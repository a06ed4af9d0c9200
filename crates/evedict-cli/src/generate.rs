//! `generate` and `generate-poly` command handlers.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use evedict_core::{AppConfig, Forecast, NewsCategory};
use evedict_eventfeed::{NewsApiClient, PolymarketClient};
use evedict_forecast::{
    cancel_pair, CancelHandle, ForecastBatch, ForecastOrchestrator, JobModel,
    OrchestratorSettings, PgForecastStore, PromptBuilder, PromptTemplates, SkippedCandidate,
};
use evedict_replicate::{PollPolicy, ReplicateClient};
use serde::Serialize;
use uuid::Uuid;

/// Printed after every generation run.
#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    persisted: bool,
    forecasts: Vec<ForecastLine<'a>>,
    skipped: &'a [SkippedCandidate],
}

#[derive(Debug, Serialize)]
struct ForecastLine<'a> {
    id: Option<Uuid>,
    headline: &'a str,
    category: &'static str,
    tags: &'a [String],
    sources: usize,
    market: Option<&'a str>,
}

impl<'a> RunSummary<'a> {
    fn new(batch: &'a ForecastBatch, persisted: bool) -> Self {
        Self {
            persisted,
            forecasts: batch.forecasts.iter().map(ForecastLine::from).collect(),
            skipped: &batch.skipped,
        }
    }
}

impl<'a> From<&'a Forecast> for ForecastLine<'a> {
    fn from(forecast: &'a Forecast) -> Self {
        Self {
            id: forecast.id,
            headline: &forecast.headline,
            category: forecast.category.as_str(),
            tags: &forecast.tags,
            sources: forecast.sources.len(),
            market: forecast.market.as_ref().map(|m| m.question.as_str()),
        }
    }
}

/// Wire the orchestrator from configuration.
///
/// # Errors
///
/// Returns an error if an API key is missing, a client cannot be built, or
/// the prompt template file cannot be loaded.
pub(crate) fn build_orchestrator(
    pool: &sqlx::PgPool,
    config: &AppConfig,
) -> anyhow::Result<ForecastOrchestrator> {
    let news_key = config
        .news_api_key
        .as_deref()
        .context("NEWS_API_KEY is not set; cannot generate forecasts")?;
    let replicate_key = config
        .replicate_api_key
        .as_deref()
        .context("REPLICATE_API_KEY is not set; cannot generate forecasts")?;

    let news = NewsApiClient::with_base_url(news_key, config.http_timeout_secs, &config.news_api_url)
        .context("failed to build NewsAPI client")?;
    let markets = PolymarketClient::with_base_url(config.http_timeout_secs, &config.polymarket_api_url)
        .context("failed to build Polymarket client")?;
    let replicate = ReplicateClient::new(
        replicate_key,
        &config.replicate_model_url,
        config.http_timeout_secs,
    )
    .context("failed to build Replicate client")?
    .with_poll_policy(PollPolicy {
        interval: Duration::from_millis(config.poll_interval_ms),
        max_attempts: config.max_poll_attempts,
    });

    let templates = match &config.prompts_path {
        Some(path) => PromptTemplates::load(path)
            .with_context(|| format!("failed to load prompts from {}", path.display()))?,
        None => PromptTemplates::default(),
    };

    Ok(ForecastOrchestrator::new(
        Arc::new(news),
        Arc::new(markets),
        Arc::new(JobModel::new(replicate, config.max_output_tokens)),
        Arc::new(PgForecastStore::new(pool.clone())),
        OrchestratorSettings::from(config),
    )
    .with_prompts(PromptBuilder::new(templates)))
}

/// Run the news-driven path for `category`.
///
/// # Errors
///
/// Returns an error if the orchestrator cannot be built, the run fails or is
/// cancelled, or the batch cannot be saved.
pub(crate) async fn run_generate(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    category: NewsCategory,
    dry_run: bool,
) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(pool, config)?;
    let (handle, signal) = cancel_pair();
    let watcher = tokio::spawn(cancel_on_ctrl_c(handle));

    let result = orchestrator.generate_forecasts(category, &signal).await;
    watcher.abort();
    let batch = result.with_context(|| format!("forecast run for {category} failed"))?;

    finish(&orchestrator, batch, dry_run).await
}

/// Run the market-driven path.
///
/// # Errors
///
/// Same as [`run_generate`].
pub(crate) async fn run_generate_poly(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    dry_run: bool,
) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(pool, config)?;
    let (handle, signal) = cancel_pair();
    let watcher = tokio::spawn(cancel_on_ctrl_c(handle));

    let result = orchestrator.generate_poly_forecasts(&signal).await;
    watcher.abort();
    let batch = result.context("market forecast run failed")?;

    finish(&orchestrator, batch, dry_run).await
}

async fn finish(
    orchestrator: &ForecastOrchestrator,
    mut batch: ForecastBatch,
    dry_run: bool,
) -> anyhow::Result<()> {
    if dry_run {
        tracing::info!(forecasts = batch.forecasts.len(), "dry-run: skipping persistence");
    } else {
        orchestrator.persist(&mut batch).await?;
    }

    let summary = RunSummary::new(&batch, !dry_run);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn cancel_on_ctrl_c(handle: CancelHandle) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for ctrl-c; run is not cancellable");
        return;
    }
    tracing::info!("received ctrl-c, cancelling forecast run");
    handle.cancel();
}
