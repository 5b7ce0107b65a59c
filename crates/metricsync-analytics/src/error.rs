use thiserror::Error;

/// Errors returned by the analytics API client.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API rejected our credentials. Fatal for the whole run.
    #[error("analytics API rejected credentials (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("analytics API rate limited the request (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// A successful response that carried no data rows.
    #[error("empty analytics response for {context}")]
    EmptyResponse { context: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid analytics base URL: {0}")]
    InvalidBaseUrl(String),
}

impl AnalyticsError {
    /// Authentication failures stop the whole run; nothing can proceed without
    /// valid credentials.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, AnalyticsError::Unauthorized { .. })
    }
}
