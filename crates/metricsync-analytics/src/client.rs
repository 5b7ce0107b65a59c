//! HTTP client for the analytics REST API.
//!
//! Wraps `reqwest` with bearer-token auth, status classification, and typed
//! response deserialization. Every endpoint lives under
//! `{base_url}{customer_id}/...`.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use metricsync_core::{with_retry, Profile, RetryPolicy};

use crate::error::AnalyticsError;
use crate::metadata::into_profile;
use crate::retry::analytics_retry_policy;
use crate::types::{AnalyticsPage, AnalyticsQuery, CustomerGroup, CustomerProfile, MetadataResponse};

const DEFAULT_BASE_URL: &str = "https://api.sproutsocial.com/v1/";

/// Client for the analytics REST API.
///
/// Use [`AnalyticsClient::new`] for production or
/// [`AnalyticsClient::with_base_url`] to point at a mock server in tests.
pub struct AnalyticsClient {
    client: Client,
    token: String,
    customer_id: String,
    base_url: Url,
    retry: RetryPolicy<AnalyticsError>,
}

impl AnalyticsClient {
    /// Creates a new client pointed at the production analytics API.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(token: &str, customer_id: &str, timeout_secs: u64) -> Result<Self, AnalyticsError> {
        Self::with_base_url(token, customer_id, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`AnalyticsError::InvalidBaseUrl`] if
    /// `base_url` is not a valid URL.
    pub fn with_base_url(
        token: &str,
        customer_id: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, AnalyticsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("metricsync/0.1 (social-analytics-sync)")
            .build()?;

        // Ensure exactly one trailing slash so `Url::join` appends rather than
        // replacing the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| AnalyticsError::InvalidBaseUrl(format!("'{base_url}': {e}")))?;

        Ok(Self {
            client,
            token: token.to_owned(),
            customer_id: customer_id.trim().to_owned(),
            base_url,
            retry: analytics_retry_policy(3, Duration::from_secs(10)),
        })
    }

    /// Replaces the retry policy used by metadata calls and by
    /// [`crate::AnalyticsFetcher`].
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy<AnalyticsError>) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy<AnalyticsError> {
        &self.retry
    }

    /// Lists every profile visible to the customer, with group memberships.
    ///
    /// Profiles whose id cannot be interpreted are skipped with a warning.
    ///
    /// # Errors
    ///
    /// - [`AnalyticsError::Unauthorized`] on 401/403.
    /// - [`AnalyticsError::Http`] / [`AnalyticsError::UnexpectedStatus`] after retries.
    /// - [`AnalyticsError::Deserialize`] if the response shape is unexpected.
    pub async fn profiles(&self) -> Result<Vec<Profile>, AnalyticsError> {
        let url = self.endpoint("metadata/customer")?;
        let envelope: MetadataResponse<CustomerProfile> = with_retry(
            &self.retry,
            "analytics metadata/customer",
            || self.get_json(&url),
        )
        .await?;

        Ok(envelope
            .data
            .into_iter()
            .filter_map(|raw| {
                into_profile(raw)
                    .map_err(|name| {
                        tracing::warn!(profile = %name, "skipping profile with unusable id");
                    })
                    .ok()
            })
            .collect())
    }

    /// Lists the customer's profile groups.
    ///
    /// # Errors
    ///
    /// Same as [`AnalyticsClient::profiles`].
    pub async fn groups(&self) -> Result<Vec<CustomerGroup>, AnalyticsError> {
        let url = self.endpoint("metadata/customer/groups")?;
        let envelope: MetadataResponse<CustomerGroup> = with_retry(
            &self.retry,
            "analytics metadata/customer/groups",
            || self.get_json(&url),
        )
        .await?;
        Ok(envelope.data)
    }

    /// Fetches one page of analytics for `query`. Not retried; see
    /// [`crate::AnalyticsFetcher`].
    ///
    /// # Errors
    ///
    /// - [`AnalyticsError::Unauthorized`] on 401/403.
    /// - [`AnalyticsError::RateLimited`] on 429.
    /// - [`AnalyticsError::UnexpectedStatus`] on any other non-2xx status.
    /// - [`AnalyticsError::Http`] on network failure.
    /// - [`AnalyticsError::Deserialize`] if the body does not parse.
    pub async fn analytics_page(
        &self,
        query: &AnalyticsQuery,
        page: u32,
    ) -> Result<AnalyticsPage, AnalyticsError> {
        let url = self.endpoint("analytics/profiles")?;
        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.token)
            .json(&query.body(page))
            .send()
            .await?;
        let response = Self::check_status(response, &url)?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| AnalyticsError::Deserialize {
            context: format!("analytics page {page} ({query})"),
            source: e,
        })
    }

    /// Builds `{base_url}{customer_id}/{path}`.
    fn endpoint(&self, path: &str) -> Result<Url, AnalyticsError> {
        self.base_url
            .join(&format!("{}/{path}", self.customer_id))
            .map_err(|e| AnalyticsError::InvalidBaseUrl(format!("cannot join '{path}': {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, AnalyticsError> {
        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&self.token)
            .send()
            .await?;
        let response = Self::check_status(response, url)?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| AnalyticsError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }

    /// Maps non-2xx statuses to typed errors.
    fn check_status(response: Response, url: &Url) -> Result<Response, AnalyticsError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AnalyticsError::Unauthorized {
                status: status.as_u16(),
            });
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(AnalyticsError::RateLimited { retry_after_secs });
        }
        Err(AnalyticsError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_string(),
        })
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
