//! HTTP client for Replicate predictions.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::Serialize;

use crate::error::GenerationError;
use crate::job::{JobHandle, JobStatus, PollPolicy, Prediction, RawOutput};

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    stream: bool,
    input: SubmitInput<'a>,
}

#[derive(Debug, Serialize)]
struct SubmitInput<'a> {
    prompt: &'a str,
    max_tokens: u32,
}

/// Client for a single Replicate model's predictions endpoint.
pub struct ReplicateClient {
    client: Client,
    api_key: String,
    model_url: Url,
    poll: PollPolicy,
}

impl ReplicateClient {
    /// Creates a client that submits to `model_url`, e.g.
    /// `https://api.replicate.com/v1/models/{owner}/{name}/predictions`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`GenerationError::InvalidUrl`] if
    /// `model_url` does not parse.
    pub fn new(api_key: &str, model_url: &str, timeout_secs: u64) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("evedict/0.1 (forecast-generation)")
            .build()?;
        let model_url = Url::parse(model_url).map_err(|e| GenerationError::InvalidUrl {
            url: model_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model_url,
            poll: PollPolicy::default(),
        })
    }

    #[must_use]
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    #[must_use]
    pub fn poll_policy(&self) -> PollPolicy {
        self.poll
    }

    /// Submits `prompt` and returns the job handle from the provider's first
    /// response. Does not wait for completion.
    ///
    /// # Errors
    ///
    /// - [`GenerationError::EmptyPrompt`] for a blank prompt.
    /// - [`GenerationError::Http`] on transport failure.
    /// - [`GenerationError::UnexpectedStatus`] for anything but 200/201.
    /// - [`GenerationError::Deserialize`] if the response is not a prediction.
    pub async fn submit(&self, prompt: &str, max_tokens: u32) -> Result<JobHandle, GenerationError> {
        if prompt.trim().is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }

        let body = SubmitRequest {
            stream: false,
            input: SubmitInput { prompt, max_tokens },
        };
        let response = self
            .client
            .post(self.model_url.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if status != StatusCode::OK && status != StatusCode::CREATED {
            return Err(GenerationError::UnexpectedStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        let prediction: Prediction =
            serde_json::from_str(&text).map_err(|source| GenerationError::Deserialize {
                context: "prediction submit".to_string(),
                source,
            })?;
        let handle = JobHandle::from_prediction(prediction)?;

        tracing::debug!(job_id = %handle.id, status = %handle.status, "submitted generation job");
        Ok(handle)
    }

    /// Polls `handle` until it reaches a terminal state and returns its
    /// normalized output.
    ///
    /// Each iteration sleeps for the poll interval and then re-fetches the
    /// status. When `max_attempts` status checks pass without a terminal
    /// state, a cancel request is sent (best effort) and
    /// [`GenerationError::Timeout`] is returned.
    ///
    /// Dropping the returned future stops polling.
    ///
    /// # Errors
    ///
    /// - [`GenerationError::Failed`] when the job fails or is canceled.
    /// - [`GenerationError::Timeout`] when the poll budget is exhausted.
    /// - [`GenerationError::OutputType`] when a succeeded job has unusable output.
    /// - Transport and decoding errors from the status checks.
    pub async fn await_completion(&self, mut handle: JobHandle) -> Result<String, GenerationError> {
        loop {
            match handle.status {
                JobStatus::Succeeded => {
                    let output = RawOutput::from_value(&handle.id, handle.output())?;
                    return Ok(output.into_text());
                }
                JobStatus::Failed | JobStatus::Canceled => {
                    return Err(GenerationError::Failed {
                        reason: handle.failure_reason(),
                        job_id: handle.id,
                    });
                }
                JobStatus::Queued | JobStatus::Processing | JobStatus::Unknown => {
                    if handle.attempts >= self.poll.max_attempts {
                        self.cancel_best_effort(&handle).await;
                        return Err(GenerationError::Timeout {
                            job_id: handle.id,
                            attempts: handle.attempts,
                        });
                    }

                    tokio::time::sleep(self.poll.interval).await;
                    self.refresh(&mut handle).await?;
                    tracing::debug!(
                        job_id = %handle.id,
                        attempt = handle.attempts,
                        status = %handle.status,
                        "polled generation job"
                    );
                }
            }
        }
    }

    /// Submits `prompt` and waits for the result.
    ///
    /// # Errors
    ///
    /// See [`ReplicateClient::submit`] and [`ReplicateClient::await_completion`].
    pub async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, GenerationError> {
        let handle = self.submit(prompt, max_tokens).await?;
        self.await_completion(handle).await
    }

    /// Asks the provider to cancel a running job.
    ///
    /// # Errors
    ///
    /// Returns transport errors or [`GenerationError::UnexpectedStatus`]. A
    /// handle without a cancel URL is a no-op.
    pub async fn cancel(&self, handle: &JobHandle) -> Result<(), GenerationError> {
        let Some(url) = handle.cancel_url.clone() else {
            return Ok(());
        };
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::UnexpectedStatus {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }

    async fn cancel_best_effort(&self, handle: &JobHandle) {
        if let Err(e) = self.cancel(handle).await {
            tracing::warn!(job_id = %handle.id, error = %e, "failed to cancel timed-out generation job");
        }
    }

    async fn refresh(&self, handle: &mut JobHandle) -> Result<(), GenerationError> {
        let url = handle
            .status_url
            .clone()
            .ok_or_else(|| GenerationError::MissingStatusUrl {
                job_id: handle.id.clone(),
            })?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        handle.attempts += 1;

        let status = response.status();
        let text = response.text().await?;
        if status != StatusCode::OK {
            return Err(GenerationError::UnexpectedStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        let prediction: Prediction =
            serde_json::from_str(&text).map_err(|source| GenerationError::Deserialize {
                context: format!("prediction status {}", handle.id),
                source,
            })?;
        handle.apply(prediction)
    }
}
