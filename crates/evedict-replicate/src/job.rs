//! Job state and output types.

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

use crate::error::GenerationError;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_MAX_ATTEMPTS: u32 = 150;

/// Lifecycle state reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[serde(alias = "starting")]
    Queued,
    Processing,
    Succeeded,
    Failed,
    #[serde(alias = "cancelled")]
    Canceled,
    /// Any status this client does not know about; polled like `processing`.
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Canceled
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Canceled => "canceled",
            JobStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// How long to wait for a job: a fixed interval between status checks and a
/// hard cap on the number of checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Prediction payload returned by both the submit and status endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct Prediction {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub urls: PredictionUrls,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PredictionUrls {
    #[serde(default)]
    pub get: Option<String>,
    #[serde(default)]
    pub cancel: Option<String>,
}

/// A submitted generation job. Mutated only by the polling loop.
#[derive(Debug, Clone)]
pub struct JobHandle {
    pub id: String,
    pub status: JobStatus,
    pub status_url: Option<Url>,
    pub cancel_url: Option<Url>,
    /// Number of status checks performed so far.
    pub attempts: u32,
    output: Option<Value>,
    error: Option<String>,
}

impl JobHandle {
    pub(crate) fn from_prediction(prediction: Prediction) -> Result<Self, GenerationError> {
        let mut handle = Self {
            id: prediction.id.clone(),
            status: prediction.status,
            status_url: None,
            cancel_url: None,
            attempts: 0,
            output: None,
            error: None,
        };
        handle.apply(prediction)?;
        Ok(handle)
    }

    /// Folds a fresh status payload into the handle. URLs are only replaced
    /// when the payload carries them.
    pub(crate) fn apply(&mut self, prediction: Prediction) -> Result<(), GenerationError> {
        self.status = prediction.status;
        self.output = prediction.output;
        self.error = prediction.error.map(|e| match e {
            Value::String(s) => s,
            other => other.to_string(),
        });
        if let Some(get) = prediction.urls.get.as_deref() {
            self.status_url = Some(parse_url(get)?);
        }
        if let Some(cancel) = prediction.urls.cancel.as_deref() {
            self.cancel_url = Some(parse_url(cancel)?);
        }
        Ok(())
    }

    pub(crate) fn failure_reason(&self) -> String {
        match self.status {
            JobStatus::Canceled => "canceled".to_string(),
            _ => self
                .error
                .clone()
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| "no reason given".to_string()),
        }
    }

    pub(crate) fn output(&self) -> Option<&Value> {
        self.output.as_ref()
    }
}

fn parse_url(raw: &str) -> Result<Url, GenerationError> {
    Url::parse(raw).map_err(|e| GenerationError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Output of a succeeded job: either one string or an ordered list of
/// streamed fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawOutput {
    Text(String),
    Fragments(Vec<String>),
}

impl RawOutput {
    /// Classifies the provider's `output` value.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::OutputType`] for anything other than a
    /// string or an array made only of strings.
    pub fn from_value(job_id: &str, value: Option<&Value>) -> Result<Self, GenerationError> {
        let type_error = |found: String| GenerationError::OutputType {
            job_id: job_id.to_string(),
            found,
        };

        match value {
            Some(Value::String(s)) => Ok(RawOutput::Text(s.clone())),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(type_error(format!(
                        "non-string element at index {i}: {other}"
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(RawOutput::Fragments),
            Some(other) => Err(type_error(json_type_name(other).to_string())),
            None => Err(type_error("null".to_string())),
        }
    }

    /// Concatenates fragments in order with no separator and trims the result.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            RawOutput::Text(s) => s.trim().to_string(),
            RawOutput::Fragments(parts) => parts.concat().trim().to_string(),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
