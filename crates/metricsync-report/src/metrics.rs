//! Metric extraction and rounding helpers shared by every platform.

use std::collections::BTreeMap;

use metricsync_core::{CellValue, MetricMap};

/// Numeric value of a raw metric.
///
/// Numbers are used as-is, numeric strings are parsed, and composite values
/// (objects or arrays, e.g. a reactions-by-type breakdown) reduce to the sum
/// of their numeric leaves. Everything else, including non-finite numbers,
/// is zero.
#[must_use]
pub fn metric_value(value: &serde_json::Value) -> f64 {
    let raw = match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        serde_json::Value::Object(map) => map.values().map(metric_value).sum(),
        serde_json::Value::Array(items) => items.iter().map(metric_value).sum(),
        serde_json::Value::Bool(_) | serde_json::Value::Null => 0.0,
    };
    if raw.is_finite() {
        raw
    } else {
        0.0
    }
}

#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// `numerator ÷ denominator × 100`, rounded to 2 dp; zero when the
/// denominator is zero.
#[must_use]
pub fn percent(numerator: f64, denominator: f64) -> f64 {
    if denominator.abs() < f64::EPSILON {
        return 0.0;
    }
    let value = round_to(numerator / denominator * 100.0, 2);
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// `numerator ÷ denominator`, rounded to 4 dp; zero when the denominator is zero.
#[must_use]
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator.abs() < f64::EPSILON {
        return 0.0;
    }
    let value = round_to(numerator / denominator, 4);
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Whole counts become integer cells; fractional ones keep two decimals.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn count_cell(value: f64) -> CellValue {
    if value.fract().abs() < f64::EPSILON {
        CellValue::Integer(value as i64)
    } else {
        CellValue::Decimal(round_to(value, 2))
    }
}

/// Named counter values for one row (or one aggregated month).
/// Absent names read as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Counts(BTreeMap<&'static str, f64>);

impl Counts {
    pub fn from_metrics<'a>(names: impl IntoIterator<Item = &'a &'static str>, metrics: &MetricMap) -> Self {
        Self(
            names
                .into_iter()
                .map(|name| (*name, metrics.get(*name).map_or(0.0, metric_value)))
                .collect(),
        )
    }

    pub fn insert(&mut self, name: &'static str, value: f64) {
        self.0.insert(name, value);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> f64 {
        self.0.get(name).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn sum(&self, names: &[&str]) -> f64 {
        names.iter().map(|n| self.get(n)).sum()
    }
}
