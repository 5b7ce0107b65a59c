//! Analytics API request/response types.
//!
//! Every response wraps its payload in `{"data": [...]}`; analytics responses
//! additionally carry `{"paging": {"current_page", "total_pages"}}`. Records are
//! kept as raw JSON here and parsed one at a time so a malformed record never
//! takes the whole batch down with it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use metricsync_core::{profile_id_from_json, DataPoint, TimeWindow};

// ---------------------------------------------------------------------------
// metadata
// ---------------------------------------------------------------------------

/// Envelope for the metadata endpoints.
#[derive(Debug, Deserialize)]
pub struct MetadataResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// A profile as returned by `metadata/customer`.
///
/// Ids arrive as numbers or strings depending on the endpoint version, so they
/// are kept as raw JSON and canonicalized on conversion.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerProfile {
    pub customer_profile_id: serde_json::Value,
    pub network_type: String,
    pub name: String,
    #[serde(default)]
    pub native_name: Option<String>,
    #[serde(default)]
    pub native_id: Option<serde_json::Value>,
    #[serde(default)]
    pub groups: Vec<serde_json::Value>,
}

/// A profile group as returned by `metadata/customer/groups`.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerGroup {
    pub group_id: serde_json::Value,
    pub name: String,
}

// ---------------------------------------------------------------------------
// analytics
// ---------------------------------------------------------------------------

/// One analytics request: a profile chunk, a date range, and a metric selector.
#[derive(Debug, Clone)]
pub struct AnalyticsQuery {
    pub profile_ids: Vec<String>,
    pub window: TimeWindow,
    pub metrics: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnalyticsRequestBody<'a> {
    pub filters: Vec<String>,
    pub metrics: &'a [String],
    pub page: u32,
}

impl AnalyticsQuery {
    pub(crate) fn body(&self, page: u32) -> AnalyticsRequestBody<'_> {
        AnalyticsRequestBody {
            filters: vec![
                format!("customer_profile_id.eq({})", self.profile_ids.join(", ")),
                format!(
                    "reporting_period.in({}...{})",
                    self.window.start.format("%Y-%m-%d"),
                    self.window.end.format("%Y-%m-%d")
                ),
            ],
            metrics: &self.metrics,
            page,
        }
    }
}

impl std::fmt::Display for AnalyticsQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} profiles, {}",
            self.profile_ids.len(),
            self.window
        )
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Paging {
    #[serde(default = "first_page")]
    pub current_page: u32,
    #[serde(default = "first_page")]
    pub total_pages: u32,
}

fn first_page() -> u32 {
    1
}

/// One page of analytics results.
#[derive(Debug, Deserialize)]
pub struct AnalyticsPage {
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

impl AnalyticsPage {
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.paging
            .is_some_and(|p| p.current_page < p.total_pages)
    }
}

/// Why a raw analytics record was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedRecord {
    NotAnObject,
    MissingDimensions,
    MissingProfileId,
    MissingReportingPeriod,
}

impl std::fmt::Display for MalformedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            MalformedRecord::NotAnObject => "record is not a JSON object",
            MalformedRecord::MissingDimensions => "record has no dimensions block",
            MalformedRecord::MissingProfileId => "record has no customer_profile_id dimension",
            MalformedRecord::MissingReportingPeriod => {
                "record has no parsable reporting_period dimension"
            }
        };
        f.write_str(reason)
    }
}

/// Parses one raw analytics record into a [`DataPoint`].
///
/// The reporting-period dimension may be keyed `reporting_period` or
/// `reporting_period.by(day)` and may carry a time suffix; only the leading
/// `YYYY-MM-DD` is used. A missing or non-object `metrics` block yields
/// `metrics: None` rather than an error.
///
/// # Errors
///
/// Returns [`MalformedRecord`] when either identifying dimension is absent.
pub fn parse_record(record: &serde_json::Value) -> Result<DataPoint, MalformedRecord> {
    let object = record.as_object().ok_or(MalformedRecord::NotAnObject)?;
    let dimensions = object
        .get("dimensions")
        .and_then(serde_json::Value::as_object)
        .ok_or(MalformedRecord::MissingDimensions)?;

    let profile_id = dimensions
        .get("customer_profile_id")
        .and_then(profile_id_from_json)
        .ok_or(MalformedRecord::MissingProfileId)?;

    let reporting_period = dimensions
        .iter()
        .find(|(k, _)| k.starts_with("reporting_period"))
        .and_then(|(_, v)| v.as_str())
        .and_then(parse_reporting_day)
        .ok_or(MalformedRecord::MissingReportingPeriod)?;

    let metrics = object
        .get("metrics")
        .and_then(serde_json::Value::as_object)
        .cloned();

    Ok(DataPoint {
        profile_id,
        reporting_period,
        metrics,
    })
}

fn parse_reporting_day(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn query_body_builds_filters() {
        let query = AnalyticsQuery {
            profile_ids: vec!["1".into(), "2".into()],
            window: TimeWindow::new(d(2024, 1, 1), d(2024, 1, 31)).unwrap(),
            metrics: vec!["impressions".into()],
        };
        let body = serde_json::to_value(query.body(2)).unwrap();
        assert_eq!(
            body,
            json!({
                "filters": [
                    "customer_profile_id.eq(1, 2)",
                    "reporting_period.in(2024-01-01...2024-01-31)"
                ],
                "metrics": ["impressions"],
                "page": 2
            })
        );
    }

    #[test]
    fn parse_record_accepts_numeric_and_timestamped_dimensions() {
        let record = json!({
            "dimensions": {
                "customer_profile_id": 123,
                "reporting_period.by(day)": "2024-01-05T00:00:00Z"
            },
            "metrics": { "impressions": 10 }
        });
        let point = parse_record(&record).unwrap();
        assert_eq!(point.profile_id, "123");
        assert_eq!(point.reporting_period, d(2024, 1, 5));
        assert_eq!(point.metrics.unwrap()["impressions"], json!(10));
    }

    #[test]
    fn parse_record_keeps_absent_metrics_as_none() {
        let record = json!({
            "dimensions": { "customer_profile_id": "9", "reporting_period": "2024-02-01" }
        });
        let point = parse_record(&record).unwrap();
        assert!(point.metrics.is_none());
    }

    #[test]
    fn parse_record_rejects_missing_dimensions() {
        assert_eq!(
            parse_record(&json!({"metrics": {}})).unwrap_err(),
            MalformedRecord::MissingDimensions
        );
        assert_eq!(
            parse_record(&json!({"dimensions": {"reporting_period.by(day)": "2024-01-01"}}))
                .unwrap_err(),
            MalformedRecord::MissingProfileId
        );
        assert_eq!(
            parse_record(&json!({"dimensions": {"customer_profile_id": 1}})).unwrap_err(),
            MalformedRecord::MissingReportingPeriod
        );
        assert_eq!(
            parse_record(&json!([1, 2])).unwrap_err(),
            MalformedRecord::NotAnObject
        );
    }

    #[test]
    fn paging_reports_next_page() {
        let page: AnalyticsPage = serde_json::from_value(json!({
            "data": [],
            "paging": { "current_page": 1, "total_pages": 3 }
        }))
        .unwrap();
        assert!(page.has_next());

        let last: AnalyticsPage = serde_json::from_value(json!({"data": []})).unwrap();
        assert!(!last.has_next());
    }
}
