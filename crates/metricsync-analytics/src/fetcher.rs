//! Chunked, paginated, retried analytics fetches.
//!
//! A window is split into sub-ranges of at most `max_days_per_request` days and
//! the profile set into chunks of at most `max_profiles_per_request` ids. Each
//! (chunk, sub-range) pair is one logical request whose pages are fetched in
//! order; every page call goes through the client's retry policy.
//!
//! Exhausted retries degrade to "no data" for that request and are logged.
//! Only fatal errors (rejected credentials) are returned to the caller;
//! [`Fetched::failed_requests`] tells callers whether the result is partial.

use metricsync_core::{canonical_profile_id, split_window, with_retry, DataPoint, TimeWindow};

use crate::client::AnalyticsClient;
use crate::error::AnalyticsError;
use crate::types::{parse_record, AnalyticsQuery};

/// Pages fetched per logical request before giving up on a cycling cursor.
pub(crate) const MAX_PAGES: u32 = 100;

/// Per-request size limits imposed by the analytics API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    pub max_profiles_per_request: usize,
    pub max_days_per_request: u32,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            max_profiles_per_request: 50,
            max_days_per_request: 31,
        }
    }
}

/// Result of one [`AnalyticsFetcher::fetch_report`] call.
#[derive(Debug, Default)]
pub struct Fetched {
    pub points: Vec<DataPoint>,
    /// Logical requests issued (profile chunk × sub-range).
    pub requests: usize,
    /// Requests that exhausted their retries on an error. A request whose
    /// only problem was an empty response is not counted.
    pub failed_requests: usize,
}

impl Fetched {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed_requests == 0
    }
}

pub struct AnalyticsFetcher {
    client: AnalyticsClient,
    limits: FetchLimits,
    metrics: Vec<String>,
}

impl AnalyticsFetcher {
    /// `metrics` is the metric selector sent with every request.
    #[must_use]
    pub fn new(client: AnalyticsClient, limits: FetchLimits, metrics: Vec<String>) -> Self {
        Self {
            client,
            limits,
            metrics,
        }
    }

    #[must_use]
    pub fn client(&self) -> &AnalyticsClient {
        &self.client
    }

    /// Fetches every data point for `profile_ids` within `window`.
    ///
    /// Results of all sub-requests are concatenated in request order.
    /// Malformed records are dropped individually with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Unauthorized`] when the API rejects the
    /// credentials. Every other failure is logged and contributes no data.
    pub async fn fetch(
        &self,
        profile_ids: &[String],
        window: &TimeWindow,
    ) -> Result<Vec<DataPoint>, AnalyticsError> {
        self.fetch_report(profile_ids, window).await.map(|f| f.points)
    }

    /// Like [`fetch`](Self::fetch), but also reports how many requests failed.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Unauthorized`] when the API rejects the
    /// credentials.
    pub async fn fetch_report(
        &self,
        profile_ids: &[String],
        window: &TimeWindow,
    ) -> Result<Fetched, AnalyticsError> {
        let mut ids: Vec<String> = Vec::with_capacity(profile_ids.len());
        for id in profile_ids.iter().map(|id| canonical_profile_id(id)) {
            if !id.is_empty() && !ids.contains(&id) {
                ids.push(id);
            }
        }

        let mut fetched = Fetched::default();
        if ids.is_empty() {
            return Ok(fetched);
        }

        for chunk in ids.chunks(self.limits.max_profiles_per_request.max(1)) {
            for range in split_window(window, self.limits.max_days_per_request) {
                let query = AnalyticsQuery {
                    profile_ids: chunk.to_vec(),
                    window: range,
                    metrics: self.metrics.clone(),
                };
                fetched.requests += 1;
                match self.fetch_query(&query).await {
                    Ok(batch) => fetched.points.extend(batch),
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(AnalyticsError::EmptyResponse { .. }) => {
                        tracing::info!(query = %query, "no analytics data after retries");
                    }
                    Err(e) => {
                        fetched.failed_requests += 1;
                        tracing::error!(
                            query = %query,
                            error = %e,
                            "analytics request failed after retries; request contributes no data"
                        );
                    }
                }
            }
        }
        Ok(fetched)
    }

    /// Fetches all pages for one logical request.
    ///
    /// An empty first page counts as a transient failure so it is retried like
    /// a network error; empty later pages simply end pagination.
    async fn fetch_query(&self, query: &AnalyticsQuery) -> Result<Vec<DataPoint>, AnalyticsError> {
        let mut points = Vec::new();
        let mut page = 1u32;
        loop {
            let current = page;
            let response = with_retry(self.client.retry_policy(), "analytics page", || async move {
                let response = self.client.analytics_page(query, current).await?;
                if current == 1 && response.data.is_empty() {
                    return Err(AnalyticsError::EmptyResponse {
                        context: query.to_string(),
                    });
                }
                Ok(response)
            })
            .await;
            let response = match response {
                Ok(response) => response,
                Err(e) => {
                    if !points.is_empty() {
                        tracing::warn!(
                            query = %query,
                            page = current,
                            discarded = points.len(),
                            error = %e,
                            "page failed; discarding points parsed from earlier pages of this request"
                        );
                    }
                    return Err(e);
                }
            };

            let total = response.data.len();
            let mut dropped = 0usize;
            for record in &response.data {
                match parse_record(record) {
                    Ok(point) => points.push(point),
                    Err(reason) => {
                        dropped += 1;
                        tracing::warn!(%reason, page = current, "discarding malformed analytics record");
                    }
                }
            }
            tracing::debug!(query = %query, page = current, total, dropped, "analytics page fetched");

            if response.data.is_empty() || !response.has_next() {
                break;
            }
            page += 1;
            if page > MAX_PAGES {
                tracing::warn!(query = %query, max_pages = MAX_PAGES, "pagination limit reached; stopping");
                break;
            }
        }
        Ok(points)
    }
}
