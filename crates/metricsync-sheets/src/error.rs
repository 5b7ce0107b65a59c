use thiserror::Error;

/// Errors returned by a spreadsheet destination.
#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Credentials were rejected. Fatal for the whole run.
    #[error("spreadsheet API rejected credentials (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("spreadsheet API rate limited the request (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A response was well-formed but lacked a field we rely on.
    #[error("malformed response from {context}: {reason}")]
    MalformedResponse { context: String, reason: String },

    #[error("invalid spreadsheet base URL: {0}")]
    InvalidBaseUrl(String),
}

impl SheetsError {
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, SheetsError::Unauthorized { .. })
    }
}
