//! Forecast generation pipeline.
//!
//! [`ForecastOrchestrator`] drives a run end to end: it selects candidate
//! articles or market events, extracts search keywords, gathers related
//! coverage, asks the generation backend to synthesize a forecast, and
//! assembles the final record. Every collaborator is injected as a trait
//! object ([`ContentSource`], [`MarketSource`], [`ForecastModel`],
//! [`ForecastStore`]), so a run can be exercised entirely with stubs.

pub mod assemble;
pub mod cancel;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod parse;
pub mod prompt;
pub mod sources;
pub mod store;
pub mod types;

pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use error::{ForecastError, Stage};
pub use model::{ForecastModel, JobModel, TextGenerator};
pub use orchestrator::ForecastOrchestrator;
pub use parse::ForecastDraft;
pub use prompt::{PromptBuilder, PromptTemplates};
pub use sources::{ContentSource, MarketSource};
pub use store::{ForecastStore, PgForecastStore};
pub use types::{ForecastBatch, OrchestratorSettings, SkipReason, SkippedCandidate};
