use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use evedict_core::{
    Article, CandidatePolicy, EventMarket, EventTag, Forecast, ForecastCategory, MarketEvent,
    NewsCategory, RelatedForecast,
};
use evedict_db::DbError;
use evedict_eventfeed::FeedError;
use evedict_replicate::GenerationError;
use uuid::Uuid;

use super::ForecastOrchestrator;
use crate::cancel::{cancel_pair, CancelSignal};
use crate::error::{ForecastError, Stage};
use crate::model::{JobModel, TextGenerator};
use crate::sources::{ContentSource, MarketSource};
use crate::store::ForecastStore;
use crate::types::{OrchestratorSettings, SkipReason};

// ---------------------------------------------------------------------------
// Stubs
// ---------------------------------------------------------------------------

#[derive(Default)]
struct StubContent {
    headlines: Vec<Article>,
    /// Related articles keyed by the first keyword searched.
    related: HashMap<String, Vec<Article>>,
    searches: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl ContentSource for StubContent {
    async fn fetch_top_headlines(&self, _category: NewsCategory) -> Result<Vec<Article>, FeedError> {
        Ok(self.headlines.clone())
    }

    async fn fetch_by_keywords(&self, keywords: &[String]) -> Result<Vec<Article>, FeedError> {
        self.searches.lock().unwrap().push(keywords.to_vec());
        Ok(keywords
            .first()
            .and_then(|k| self.related.get(k))
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
struct StubMarkets {
    events: Vec<MarketEvent>,
}

#[async_trait]
impl MarketSource for StubMarkets {
    async fn fetch_top_events(&self) -> Result<Vec<MarketEvent>, FeedError> {
        Ok(self.events.clone())
    }
}

#[derive(Default)]
struct StubStore {
    approved_images: HashSet<String>,
    saved: Mutex<Vec<Forecast>>,
}

#[async_trait]
impl ForecastStore for StubStore {
    async fn exists_approved_by_image_url(&self, image_url: &str) -> Result<bool, DbError> {
        Ok(self.approved_images.contains(image_url))
    }

    async fn save_forecasts(&self, forecasts: &[Forecast]) -> Result<Vec<Uuid>, DbError> {
        self.saved.lock().unwrap().extend_from_slice(forecasts);
        Ok(forecasts.iter().map(|_| Uuid::new_v4()).collect())
    }

    async fn related_forecasts(
        &self,
        _id: Uuid,
        _tags: &[String],
        _category: ForecastCategory,
        _limit: i64,
    ) -> Result<Vec<RelatedForecast>, DbError> {
        Ok(Vec::new())
    }
}

enum Reply {
    Text(String),
    Timeout,
    Failed,
}

/// Replays canned model outputs in call order. A run is sequential, so the
/// script reads top to bottom in pipeline order.
struct ScriptedGenerator {
    replies: Mutex<VecDeque<Reply>>,
    hang: bool,
}

impl ScriptedGenerator {
    fn new(outputs: &[&str]) -> Self {
        Self {
            replies: Mutex::new(
                outputs
                    .iter()
                    .map(|s| Reply::Text((*s).to_string()))
                    .collect(),
            ),
            hang: false,
        }
    }

    fn hanging() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            hang: true,
        }
    }

    fn then(self, reply: Reply) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    fn remaining(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for Arc<ScriptedGenerator> {
    async fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String, GenerationError> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Timeout) => Err(GenerationError::Timeout {
                job_id: "job-timeout".to_string(),
                attempts: 150,
            }),
            Some(Reply::Failed) => Err(GenerationError::Failed {
                job_id: "job-failed".to_string(),
                reason: "model crashed".to_string(),
            }),
            None => Err(GenerationError::Failed {
                job_id: "script".to_string(),
                reason: "script exhausted".to_string(),
            }),
        }
    }
}

fn assert_generation_abort(err: &ForecastError, expected: Stage) {
    match err {
        ForecastError::Stage { stage, source } => {
            assert_eq!(*stage, expected);
            assert!(
                matches!(**source, ForecastError::Generation(_)),
                "unexpected source: {source:?}"
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn article(slug: &str) -> Article {
    Article {
        title: format!("Headline {slug}"),
        description: format!("What happened with {slug}"),
        url: format!("https://news.example.com/{slug}"),
        publisher: "Reuters".to_string(),
        image_url: Some(format!("https://img.example.com/{slug}.jpg")),
        language: Some("en".to_string()),
        published_at: None,
    }
}

fn forecast_json(headline: &str) -> String {
    format!(
        r#"{{"headline": "{headline}", "summary": "Summary for {headline}",
            "outcomes": [{{"content": "Yes", "confidenceLevel": 65}},
                         {{"content": "No", "confidenceLevel": 35}}]}}"#
    )
}

fn event(id: &str, markets: usize, tags: &[&str]) -> MarketEvent {
    MarketEvent {
        id: id.to_string(),
        title: format!("Event {id}"),
        description: format!("Resolution criteria for {id}"),
        start_date: None,
        image_url: Some(format!("https://img.example.com/event-{id}.png")),
        volume: 50_000.0,
        tags: tags
            .iter()
            .enumerate()
            .map(|(i, label)| EventTag {
                id: i.to_string(),
                label: (*label).to_string(),
            })
            .collect(),
        markets: (0..markets)
            .map(|m| EventMarket {
                id: format!("{id}-m{m}"),
                question: format!("Will {id} happen?"),
                description: String::new(),
                outcomes: r#"["Yes","No"]"#.to_string(),
                outcome_prices: r#"["0.4","0.6"]"#.to_string(),
                volume: "50000".to_string(),
                active: true,
                closed: false,
            })
            .collect(),
    }
}

struct Harness {
    orchestrator: ForecastOrchestrator,
    content: Arc<StubContent>,
    store: Arc<StubStore>,
    generator: Arc<ScriptedGenerator>,
}

fn harness(
    content: StubContent,
    markets: StubMarkets,
    store: StubStore,
    generator: ScriptedGenerator,
    policy: CandidatePolicy,
) -> Harness {
    let content = Arc::new(content);
    let store = Arc::new(store);
    let generator = Arc::new(generator);
    let orchestrator = ForecastOrchestrator::new(
        content.clone(),
        Arc::new(markets),
        Arc::new(JobModel::new(generator.clone(), 1024)),
        store.clone(),
        OrchestratorSettings {
            candidate_policy: policy,
            ..OrchestratorSettings::default()
        },
    );
    Harness {
        orchestrator,
        content,
        store,
        generator,
    }
}

fn five_headlines() -> StubContent {
    StubContent {
        headlines: ["a", "b", "c", "d", "e"].into_iter().map(article).collect(),
        related: HashMap::from([
            (
                "Federal Reserve".to_string(),
                vec![article("a"), article("fed-1"), article("fed-2")],
            ),
            ("Chips".to_string(), vec![article("chips-1")]),
        ]),
        ..StubContent::default()
    }
}

// ---------------------------------------------------------------------------
// News path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn news_run_builds_one_forecast_per_selected_article() {
    let first = forecast_json("Fed holds");
    let second = forecast_json("Export rules tighten");
    let h = harness(
        five_headlines(),
        StubMarkets::default(),
        StubStore::default(),
        ScriptedGenerator::new(&[
            r#"{"selected": [0, 2]}"#,
            "Federal Reserve, interest rates",
            &first,
            "Chips, export controls",
            &second,
        ]),
        CandidatePolicy::Abort,
    );

    let batch = h
        .orchestrator
        .generate_forecasts(NewsCategory::Business, &CancelSignal::never())
        .await
        .expect("run should succeed");

    assert_eq!(batch.forecasts.len(), 2);
    assert!(batch.skipped.is_empty());
    for forecast in &batch.forecasts {
        assert_eq!(forecast.tags.len(), 2);
        assert!(!forecast.sources.is_empty());
        assert_eq!(forecast.category, ForecastCategory::Economy);
        assert!(forecast.market.is_none());
    }

    let fed = &batch.forecasts[0];
    assert_eq!(fed.headline, "Fed holds");
    assert_eq!(fed.sources[0].url, "https://news.example.com/a");
    assert_eq!(fed.sources.len(), 3, "main article repeated in search results is dropped");
    assert_eq!(fed.image_url.as_deref(), Some("https://img.example.com/a.jpg"));
    assert_eq!(batch.forecasts[1].sources[0].url, "https://news.example.com/c");

    assert_eq!(h.generator.remaining(), 0);
    let searches = h.content.searches.lock().unwrap();
    assert_eq!(searches[0], vec!["Federal Reserve", "interest rates"]);
}

#[tokio::test]
async fn single_selected_index_fails_the_run() {
    let h = harness(
        five_headlines(),
        StubMarkets::default(),
        StubStore::default(),
        ScriptedGenerator::new(&[r#"{"selected": [3]}"#]),
        CandidatePolicy::Abort,
    );

    let err = h
        .orchestrator
        .generate_forecasts(NewsCategory::Business, &CancelSignal::never())
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::SelectArticles));
    assert_eq!(err.raw_output(), Some(r#"{"selected": [3]}"#));
    assert!(h.content.searches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn out_of_range_selection_fails_the_run() {
    let h = harness(
        five_headlines(),
        StubMarkets::default(),
        StubStore::default(),
        ScriptedGenerator::new(&[r#"{"selected": [0, 9]}"#]),
        CandidatePolicy::Skip,
    );

    let err = h
        .orchestrator
        .generate_forecasts(NewsCategory::Business, &CancelSignal::never())
        .await
        .unwrap_err();

    match err {
        ForecastError::Stage { stage, source } => {
            assert_eq!(stage, Stage::SelectArticles);
            assert!(matches!(*source, ForecastError::InvalidSelection { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn approved_image_is_skipped_and_run_continues() {
    let second = forecast_json("Chips");
    let h = harness(
        five_headlines(),
        StubMarkets::default(),
        StubStore {
            approved_images: HashSet::from(["https://img.example.com/a.jpg".to_string()]),
            ..StubStore::default()
        },
        ScriptedGenerator::new(&[r#"{"selected": [0, 2]}"#, "Chips, export controls", &second]),
        CandidatePolicy::Abort,
    );

    let batch = h
        .orchestrator
        .generate_forecasts(NewsCategory::Technology, &CancelSignal::never())
        .await
        .expect("duplicate is not an error");

    assert_eq!(batch.forecasts.len(), 1);
    assert_eq!(batch.forecasts[0].sources[0].url, "https://news.example.com/c");
    assert_eq!(batch.forecasts[0].category, ForecastCategory::Technology);
    assert_eq!(batch.skipped.len(), 1);
    assert_eq!(batch.skipped[0].position, 0);
    assert_eq!(
        batch.skipped[0].reason,
        SkipReason::Duplicate {
            image_url: "https://img.example.com/a.jpg".to_string()
        }
    );
}

#[tokio::test]
async fn article_without_image_is_never_a_duplicate() {
    let mut content = five_headlines();
    content.headlines[0].image_url = Some("  ".to_string());
    let first = forecast_json("First");
    let second = forecast_json("Second");
    let h = harness(
        content,
        StubMarkets::default(),
        StubStore {
            approved_images: HashSet::from(["  ".to_string(), String::new()]),
            ..StubStore::default()
        },
        ScriptedGenerator::new(&[
            r#"{"selected": [0, 1]}"#,
            "Federal Reserve, rates",
            &first,
            "Chips, fabs",
            &second,
        ]),
        CandidatePolicy::Abort,
    );

    let batch = h
        .orchestrator
        .generate_forecasts(NewsCategory::Business, &CancelSignal::never())
        .await
        .unwrap();

    assert_eq!(batch.forecasts.len(), 2);
    assert!(batch.forecasts[0].image_url.is_none());
}

#[tokio::test]
async fn keyword_failure_aborts_whole_run() {
    let first = forecast_json("First");
    let h = harness(
        five_headlines(),
        StubMarkets::default(),
        StubStore::default(),
        ScriptedGenerator::new(&[
            r#"{"selected": [1, 0]}"#,
            "Chips, fabs",
            &first,
            "just-one-keyword",
        ]),
        CandidatePolicy::Abort,
    );

    let err = h
        .orchestrator
        .generate_forecasts(NewsCategory::Business, &CancelSignal::never())
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::ExtractKeywords));
    assert_eq!(err.raw_output(), Some("just-one-keyword"));
    assert!(h.store.saved.lock().unwrap().is_empty());
}

#[tokio::test]
async fn case_only_duplicate_keywords_abort_the_run() {
    let h = harness(
        five_headlines(),
        StubMarkets::default(),
        StubStore::default(),
        ScriptedGenerator::new(&[r#"{"selected": [0, 2]}"#, "Fed, fed"]),
        CandidatePolicy::Abort,
    );

    let err = h
        .orchestrator
        .generate_forecasts(NewsCategory::Business, &CancelSignal::never())
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::ExtractKeywords));
    assert_eq!(err.raw_output(), Some("Fed, fed"));
    assert!(h.content.searches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn keyword_generation_timeout_aborts_news_run() {
    let h = harness(
        five_headlines(),
        StubMarkets::default(),
        StubStore::default(),
        ScriptedGenerator::new(&[r#"{"selected": [0, 2]}"#]).then(Reply::Timeout),
        CandidatePolicy::Abort,
    );

    let result = h
        .orchestrator
        .generate_forecasts(NewsCategory::Business, &CancelSignal::never())
        .await;

    let err = result.unwrap_err();
    assert_generation_abort(&err, Stage::ExtractKeywords);
    assert!(h.content.searches.lock().unwrap().is_empty());
    assert!(h.store.saved.lock().unwrap().is_empty());
}

#[tokio::test]
async fn synthesis_generation_failure_aborts_news_run() {
    let first = forecast_json("First");
    let h = harness(
        five_headlines(),
        StubMarkets::default(),
        StubStore::default(),
        ScriptedGenerator::new(&[
            r#"{"selected": [0, 2]}"#,
            "Federal Reserve, rates",
            &first,
            "Chips, fabs",
        ])
        .then(Reply::Failed),
        CandidatePolicy::Abort,
    );

    let err = h
        .orchestrator
        .generate_forecasts(NewsCategory::Business, &CancelSignal::never())
        .await
        .unwrap_err();

    assert_generation_abort(&err, Stage::Synthesize);
    assert!(h.store.saved.lock().unwrap().is_empty());
}

#[tokio::test]
async fn skip_policy_records_failure_and_continues() {
    let second = forecast_json("Second");
    let h = harness(
        five_headlines(),
        StubMarkets::default(),
        StubStore::default(),
        ScriptedGenerator::new(&[
            r#"{"selected": [0, 2]}"#,
            "just-one-keyword",
            "Chips, fabs",
            &second,
        ]),
        CandidatePolicy::Skip,
    );

    let batch = h
        .orchestrator
        .generate_forecasts(NewsCategory::Business, &CancelSignal::never())
        .await
        .expect("skip policy keeps the run alive");

    assert_eq!(batch.forecasts.len(), 1);
    assert_eq!(batch.forecasts[0].headline, "Second");
    assert_eq!(batch.skipped.len(), 1);
    assert_eq!(batch.skipped[0].label, "Headline a");
    match &batch.skipped[0].reason {
        SkipReason::Failed { stage, message } => {
            assert_eq!(stage.as_deref(), Some("extracting keywords"));
            assert!(message.contains("expected 2 keywords"));
        }
        other => panic!("unexpected reason: {other:?}"),
    }
}

#[tokio::test]
async fn synthesis_failure_under_skip_policy_keeps_earlier_forecasts() {
    let first = forecast_json("First");
    let h = harness(
        five_headlines(),
        StubMarkets::default(),
        StubStore::default(),
        ScriptedGenerator::new(&[
            r#"{"selected": [0, 2]}"#,
            "Federal Reserve, rates",
            &first,
            "Chips, fabs",
            "I'd rather not.",
        ]),
        CandidatePolicy::Skip,
    );

    let batch = h
        .orchestrator
        .generate_forecasts(NewsCategory::Business, &CancelSignal::never())
        .await
        .unwrap();

    assert_eq!(batch.forecasts.len(), 1);
    assert_eq!(batch.skipped[0].position, 2);
}

#[tokio::test]
async fn cancellation_interrupts_a_stuck_generation() {
    let h = harness(
        five_headlines(),
        StubMarkets::default(),
        StubStore::default(),
        ScriptedGenerator::hanging(),
        CandidatePolicy::Skip,
    );
    let (handle, signal) = cancel_pair();

    let (result, ()) = tokio::join!(
        h.orchestrator.generate_forecasts(NewsCategory::Business, &signal),
        async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.cancel();
        }
    );

    let err = result.unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn cancelled_signal_stops_before_any_call() {
    let h = harness(
        five_headlines(),
        StubMarkets::default(),
        StubStore::default(),
        ScriptedGenerator::new(&[r#"{"selected": [0, 1]}"#]),
        CandidatePolicy::Abort,
    );
    let (handle, signal) = cancel_pair();
    handle.cancel();

    let err = h
        .orchestrator
        .generate_forecasts(NewsCategory::Business, &signal)
        .await
        .unwrap_err();

    assert!(matches!(err, ForecastError::Cancelled));
    assert_eq!(h.generator.remaining(), 1);
}

// ---------------------------------------------------------------------------
// Market path
// ---------------------------------------------------------------------------

fn ten_events() -> Vec<MarketEvent> {
    // Single-market events sit at positions 1, 4 and 7.
    (0..10)
        .map(|i| match i {
            1 => event("fed", 1, &["Fed", "Economy"]),
            4 => event("oil", 1, &["Oil"]),
            7 => event("vote", 1, &["Elections"]),
            _ => event(&format!("multi-{i}"), 3, &["Misc"]),
        })
        .collect()
}

#[tokio::test]
async fn market_run_skips_duplicate_and_attaches_market() {
    let content = StubContent {
        related: HashMap::from([
            ("Fed".to_string(), vec![article("fed-main"), article("fed-other")]),
            ("Elections".to_string(), vec![article("vote-a"), article("vote-b")]),
        ]),
        ..StubContent::default()
    };
    let fed = forecast_json("Fed cuts in March");
    let h = harness(
        content,
        StubMarkets {
            events: ten_events(),
        },
        StubStore {
            approved_images: HashSet::from(["https://img.example.com/vote-b.jpg".to_string()]),
            ..StubStore::default()
        },
        ScriptedGenerator::new(&[
            r#"{"selected": [0, 2]}"#,
            r#"{"selected": 0}"#,
            &fed,
            "1",
        ]),
        CandidatePolicy::Abort,
    );

    let batch = h
        .orchestrator
        .generate_poly_forecasts(&CancelSignal::never())
        .await
        .expect("run should succeed");

    assert_eq!(batch.forecasts.len(), 1);
    let forecast = &batch.forecasts[0];
    assert_eq!(forecast.headline, "Fed cuts in March");
    assert_eq!(forecast.tags, vec!["Fed", "Economy"]);
    assert_eq!(forecast.category, ForecastCategory::Economy);
    assert_eq!(forecast.sources[0].url, "https://news.example.com/fed-main");
    assert_eq!(forecast.sources.len(), 2);

    let market = forecast.market.as_ref().expect("market snapshot attached");
    assert_eq!(market.external_id, "fed-m0");
    assert_eq!(market.question, "Will fed happen?");
    assert_eq!(market.image_url.as_deref(), Some("https://img.example.com/event-fed.png"));

    assert_eq!(batch.skipped.len(), 1);
    assert_eq!(batch.skipped[0].position, 2);
    assert_eq!(batch.skipped[0].label, "Event vote");
    assert!(matches!(batch.skipped[0].reason, SkipReason::Duplicate { .. }));
    assert_eq!(h.generator.remaining(), 0);
}

#[tokio::test]
async fn market_event_without_tags_searches_by_title() {
    let mut events = ten_events();
    events[4].tags.clear();
    let content = StubContent {
        related: HashMap::from([("Fed".to_string(), vec![article("fed-main")])]),
        ..StubContent::default()
    };
    let fed = forecast_json("Fed");
    let h = harness(
        content,
        StubMarkets { events },
        StubStore::default(),
        ScriptedGenerator::new(&[r#"{"selected": [1, 0]}"#, "0", &fed]),
        CandidatePolicy::Abort,
    );

    let batch = h
        .orchestrator
        .generate_poly_forecasts(&CancelSignal::never())
        .await
        .unwrap();

    assert_eq!(batch.forecasts.len(), 1);
    assert_eq!(batch.skipped[0].reason, SkipReason::NoRelatedArticles);
    let searches = h.content.searches.lock().unwrap();
    assert_eq!(searches[0], vec!["Event oil"]);
}

#[tokio::test]
async fn too_few_single_market_events_fails_before_selection() {
    let events = vec![event("only", 1, &["Fed"]), event("multi", 2, &["Fed"])];
    let h = harness(
        StubContent::default(),
        StubMarkets { events },
        StubStore::default(),
        ScriptedGenerator::new(&[]),
        CandidatePolicy::Abort,
    );

    let err = h
        .orchestrator
        .generate_poly_forecasts(&CancelSignal::never())
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::SelectMarkets));
}

#[tokio::test]
async fn out_of_range_article_choice_follows_policy() {
    let content = StubContent {
        related: HashMap::from([
            ("Fed".to_string(), vec![article("fed-main")]),
            ("Oil".to_string(), vec![article("oil-main")]),
        ]),
        ..StubContent::default()
    };
    let oil = forecast_json("Oil");
    let h = harness(
        content,
        StubMarkets {
            events: ten_events(),
        },
        StubStore::default(),
        ScriptedGenerator::new(&[r#"{"selected": [0, 1]}"#, "5", "0", &oil]),
        CandidatePolicy::Skip,
    );

    let batch = h
        .orchestrator
        .generate_poly_forecasts(&CancelSignal::never())
        .await
        .unwrap();

    assert_eq!(batch.forecasts.len(), 1);
    assert_eq!(batch.forecasts[0].headline, "Oil");
    assert!(matches!(
        &batch.skipped[0].reason,
        SkipReason::Failed { stage: Some(stage), .. } if stage == "selecting article for event"
    ));
}

#[tokio::test]
async fn article_choice_timeout_aborts_market_run() {
    let content = StubContent {
        related: HashMap::from([("Fed".to_string(), vec![article("fed-main")])]),
        ..StubContent::default()
    };
    let h = harness(
        content,
        StubMarkets {
            events: ten_events(),
        },
        StubStore::default(),
        ScriptedGenerator::new(&[r#"{"selected": [0, 1]}"#]).then(Reply::Timeout),
        CandidatePolicy::Abort,
    );

    let err = h
        .orchestrator
        .generate_poly_forecasts(&CancelSignal::never())
        .await
        .unwrap_err();

    assert_generation_abort(&err, Stage::SelectArticle);
    assert!(h.store.saved.lock().unwrap().is_empty());
}

#[tokio::test]
async fn synthesis_generation_failure_aborts_market_run() {
    let content = StubContent {
        related: HashMap::from([
            ("Fed".to_string(), vec![article("fed-main")]),
            ("Oil".to_string(), vec![article("oil-main")]),
        ]),
        ..StubContent::default()
    };
    let fed = forecast_json("Fed");
    let h = harness(
        content,
        StubMarkets {
            events: ten_events(),
        },
        StubStore::default(),
        ScriptedGenerator::new(&[r#"{"selected": [0, 1]}"#, "0", &fed, "0"]).then(Reply::Failed),
        CandidatePolicy::Abort,
    );

    let err = h
        .orchestrator
        .generate_poly_forecasts(&CancelSignal::never())
        .await
        .unwrap_err();

    assert_generation_abort(&err, Stage::Synthesize);
    assert_eq!(h.generator.remaining(), 0);
    assert!(h.store.saved.lock().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn persist_assigns_ids_in_one_call() {
    let first = forecast_json("First");
    let second = forecast_json("Second");
    let h = harness(
        five_headlines(),
        StubMarkets::default(),
        StubStore::default(),
        ScriptedGenerator::new(&[
            r#"{"selected": [0, 2]}"#,
            "Federal Reserve, rates",
            &first,
            "Chips, fabs",
            &second,
        ]),
        CandidatePolicy::Abort,
    );

    let mut batch = h
        .orchestrator
        .generate_forecasts(NewsCategory::Business, &CancelSignal::never())
        .await
        .unwrap();
    h.orchestrator.persist(&mut batch).await.unwrap();

    assert!(batch.forecasts.iter().all(|f| f.id.is_some()));
    assert_eq!(h.store.saved.lock().unwrap().len(), 2);
}
