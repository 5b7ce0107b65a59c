//! Routing and normalization of per-platform analytics payloads into
//! spreadsheet rows.
//!
//! [`route`] groups data points by profile and day, resolves each profile's
//! canonical [`Platform`], and hands the payload to that platform's normalizer.
//! Every platform supplies its own header, row mapping, and monthly summary.

pub mod metrics;
pub mod platforms;
pub mod router;

pub use platforms::{metric_selector, Header, Platform};
pub use router::{canonical_platform_key, route, RoutedRows};
