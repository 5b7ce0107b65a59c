//! Retry classification for analytics calls.
//!
//! **Retriable:** network failures, HTTP 429, HTTP 5xx, and successful
//! responses that carried no data.
//!
//! **Not retriable:** authentication failures (fatal for the run), other 4xx
//! statuses, malformed bodies, and configuration errors.

use std::time::Duration;

use metricsync_core::RetryPolicy;

use crate::error::AnalyticsError;

pub(crate) fn is_retriable(err: &AnalyticsError) -> bool {
    match err {
        AnalyticsError::Http(_)
        | AnalyticsError::RateLimited { .. }
        | AnalyticsError::EmptyResponse { .. } => true,
        AnalyticsError::UnexpectedStatus { status, .. } => *status >= 500,
        AnalyticsError::Unauthorized { .. }
        | AnalyticsError::Deserialize { .. }
        | AnalyticsError::InvalidBaseUrl(_) => false,
    }
}

/// Fixed-delay policy for analytics calls.
#[must_use]
pub fn analytics_retry_policy(max_attempts: u32, delay: Duration) -> RetryPolicy<AnalyticsError> {
    RetryPolicy::fixed(max_attempts, delay, is_retriable)
}
