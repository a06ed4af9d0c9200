use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("empty prompt provided")]
    EmptyPrompt,

    #[error("generation job {job_id} has no status URL")]
    MissingStatusUrl { job_id: String },

    /// The job reached the `failed` (or `canceled`) terminal state.
    #[error("generation job {job_id} failed: {reason}")]
    Failed { job_id: String, reason: String },

    /// The job did not reach a terminal state within the poll budget.
    #[error("generation job {job_id} did not finish after {attempts} status checks")]
    Timeout { job_id: String, attempts: u32 },

    /// The job succeeded but its output was neither a string nor a list of strings.
    #[error("generation job {job_id} returned unsupported output: {found}")]
    OutputType { job_id: String, found: String },
}
