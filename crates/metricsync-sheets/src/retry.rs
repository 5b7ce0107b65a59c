//! Retry classification for destination calls.
//!
//! Network failures, HTTP 429 and HTTP 5xx are retried. Everything else,
//! including rejected credentials and missing documents, fails immediately.

use std::time::Duration;

use metricsync_core::RetryPolicy;

use crate::error::SheetsError;

pub(crate) fn is_retriable(err: &SheetsError) -> bool {
    match err {
        SheetsError::Http(_) | SheetsError::RateLimited { .. } => true,
        SheetsError::UnexpectedStatus { status, .. } => *status >= 500,
        SheetsError::Unauthorized { .. }
        | SheetsError::NotFound { .. }
        | SheetsError::Deserialize { .. }
        | SheetsError::MalformedResponse { .. }
        | SheetsError::InvalidBaseUrl(_) => false,
    }
}

#[must_use]
pub fn sheets_retry_policy(max_attempts: u32, delay: Duration) -> RetryPolicy<SheetsError> {
    RetryPolicy::fixed(max_attempts, delay, is_retriable)
}
