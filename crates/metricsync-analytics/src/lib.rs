//! Client for the social analytics source API.
//!
//! [`AnalyticsClient`] speaks the metadata and analytics endpoints;
//! [`AnalyticsFetcher`] layers chunking, pagination, and bounded retries on top
//! so callers get a flat list of [`metricsync_core::DataPoint`]s per window.

pub mod client;
pub mod error;
pub mod fetcher;
pub mod metadata;
pub mod retry;
pub mod types;

pub use client::AnalyticsClient;
pub use error::AnalyticsError;
pub use fetcher::{AnalyticsFetcher, FetchLimits, Fetched};
pub use metadata::build_groups;
pub use retry::analytics_retry_policy;
pub use types::{AnalyticsPage, AnalyticsQuery, CustomerGroup, CustomerProfile};
