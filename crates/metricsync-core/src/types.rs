//! Domain types shared across the fetch → route → write pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sparse metric-name → value mapping exactly as returned by the analytics API.
pub type MetricMap = serde_json::Map<String, serde_json::Value>;

/// A tracked social profile, sourced fresh from the analytics metadata endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub profile_id: String,
    pub name: String,
    /// Raw network type (e.g. `fb_instagram_account`), mapped to a platform by the router.
    pub network_type: String,
    pub network_id: String,
    pub group_ids: Vec<String>,
}

/// A named set of profiles that share one destination document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub group_id: String,
    pub name: String,
    pub profiles: Vec<Profile>,
}

impl Group {
    #[must_use]
    pub fn profile_ids(&self) -> Vec<String> {
        self.profiles.iter().map(|p| p.profile_id.clone()).collect()
    }
}

/// One profile's metrics for one reporting day.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    pub profile_id: String,
    pub reporting_period: NaiveDate,
    /// `None` when the record carried no metrics block at all; an empty map
    /// means every metric is zero.
    pub metrics: Option<MetricMap>,
}

/// A scalar spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
}

impl CellValue {
    /// Numeric view of the cell; text cells are parsed when possible.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Decimal(d) => Some(*d),
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Decimal(d) => write!(f, "{d}"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

/// A row aligned to a platform header. The first cell is always the date
/// (or month key for summary rows).
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub profile_id: String,
    pub cells: Vec<CellValue>,
}

impl NormalizedRow {
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Canonical form of a profile id so that `"123"`, `" 123 "` and `123` compare equal.
#[must_use]
pub fn canonical_profile_id(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.parse::<u64>() {
        Ok(n) => n.to_string(),
        Err(_) => trimmed.to_string(),
    }
}

/// Extracts a canonical profile id from a JSON string or number.
///
/// Returns `None` for nulls, empty strings, and non-scalar values.
#[must_use]
pub fn profile_id_from_json(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(canonical_profile_id(s)),
        serde_json::Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else {
                #[allow(clippy::cast_possible_truncation)]
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.is_finite())
                    .map(|f| (f as i64).to_string())
            }
        }
        _ => None,
    }
}
