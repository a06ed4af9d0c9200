use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// What the generation pipeline does when a single candidate fails after
/// its duplicate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CandidatePolicy {
    /// Abort the whole run and discard forecasts assembled so far.
    #[default]
    Abort,
    /// Record the failure in the run's skip manifest and move on.
    Skip,
}

impl std::fmt::Display for CandidatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CandidatePolicy::Abort => write!(f, "abort"),
            CandidatePolicy::Skip => write!(f, "skip"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub news_api_key: Option<String>,
    pub news_api_url: String,
    pub polymarket_api_url: String,
    pub replicate_api_key: Option<String>,
    pub replicate_model_url: String,
    pub http_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    pub max_output_tokens: u32,
    pub min_selected: usize,
    pub related_limit: i64,
    pub candidate_policy: CandidatePolicy,
    pub prompts_path: Option<PathBuf>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "news_api_key",
                &self.news_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("news_api_url", &self.news_api_url)
            .field("polymarket_api_url", &self.polymarket_api_url)
            .field(
                "replicate_api_key",
                &self.replicate_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("replicate_model_url", &self.replicate_model_url)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("max_poll_attempts", &self.max_poll_attempts)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("min_selected", &self.min_selected)
            .field("related_limit", &self.related_limit)
            .field("candidate_policy", &self.candidate_policy)
            .field("prompts_path", &self.prompts_path)
            .finish()
    }
}
