use thiserror::Error;

/// Errors returned by the feed clients.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream API answered with an error envelope.
    #[error("API error ({code}): {message}")]
    Api { code: String, message: String },

    /// Non-2xx response without a recognizable error envelope.
    #[error("unexpected HTTP status {status} from {context}")]
    UnexpectedStatus { status: u16, context: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// A keyword search was requested with nothing to search for.
    #[error("keyword search requires at least one keyword")]
    EmptyKeywords,
}
