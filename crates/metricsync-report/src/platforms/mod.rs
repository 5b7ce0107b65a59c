//! Per-platform normalizers.
//!
//! Each platform module declares its counter columns (raw metrics copied into
//! the row) and its derived columns (computed from those counters). Every row
//! starts with the same four identity cells:
//!
//! | Date | Profile | Profile ID | Network ID | counters… | derived… |
//!
//! Monthly summaries aggregate counters per profile (sums for flow metrics,
//! the latest day for snapshots) and recompute the derived columns.

mod facebook;
mod instagram;
mod linkedin;
mod twitter;
mod youtube;

use std::collections::BTreeMap;
use std::fmt;

use metricsync_core::{CellValue, DataPoint, MonthKey, NormalizedRow, Profile};

use crate::metrics::{count_cell, Counts};

/// Ordered column titles for one platform sheet.
pub type Header = Vec<&'static str>;

/// Leading identity columns shared by every platform.
pub const IDENTITY_COLUMNS: [&str; 4] = ["Date", "Profile", "Profile ID", "Network ID"];

/// How a counter folds across the days of a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Aggregation {
    /// Flow metric: the monthly value is the sum of daily values.
    Sum,
    /// Point-in-time metric: the monthly value is the latest day's value.
    Latest,
}

/// A raw metric copied into a row under `header`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Column {
    pub header: &'static str,
    pub metric: &'static str,
    pub aggregation: Aggregation,
}

impl Column {
    pub(crate) const fn sum(header: &'static str, metric: &'static str) -> Self {
        Self {
            header,
            metric,
            aggregation: Aggregation::Sum,
        }
    }

    pub(crate) const fn latest(header: &'static str, metric: &'static str) -> Self {
        Self {
            header,
            metric,
            aggregation: Aggregation::Latest,
        }
    }
}

/// A supported destination platform.
///
/// Variant order is the order platform sheets are written and reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Platform {
    Instagram,
    Facebook,
    Twitter,
    LinkedIn,
    YouTube,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Instagram,
        Platform::Facebook,
        Platform::Twitter,
        Platform::LinkedIn,
        Platform::YouTube,
    ];

    /// Resolves a canonical platform key (see [`crate::canonical_platform_key`]).
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "instagram" => Some(Self::Instagram),
            "facebook" => Some(Self::Facebook),
            "twitter" => Some(Self::Twitter),
            "linkedin" => Some(Self::LinkedIn),
            "youtube" => Some(Self::YouTube),
            _ => None,
        }
    }

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Instagram => "instagram",
            Self::Facebook => "facebook",
            Self::Twitter => "twitter",
            Self::LinkedIn => "linkedin",
            Self::YouTube => "youtube",
        }
    }

    /// Title of the daily sheet in the destination document.
    #[must_use]
    pub fn sheet_name(self) -> &'static str {
        match self {
            Self::Instagram => "Instagram",
            Self::Facebook => "Facebook",
            Self::Twitter => "Twitter",
            Self::LinkedIn => "LinkedIn",
            Self::YouTube => "YouTube",
        }
    }

    /// Title of the monthly summary sheet.
    #[must_use]
    pub fn summary_sheet_name(self) -> String {
        format!("{} Monthly", self.sheet_name())
    }

    fn columns(self) -> &'static [Column] {
        match self {
            Self::Instagram => instagram::COLUMNS,
            Self::Facebook => facebook::COLUMNS,
            Self::Twitter => twitter::COLUMNS,
            Self::LinkedIn => linkedin::COLUMNS,
            Self::YouTube => youtube::COLUMNS,
        }
    }

    fn derived_headers(self) -> &'static [&'static str] {
        match self {
            Self::Instagram => instagram::DERIVED,
            Self::Facebook => facebook::DERIVED,
            Self::Twitter => twitter::DERIVED,
            Self::LinkedIn => linkedin::DERIVED,
            Self::YouTube => youtube::DERIVED,
        }
    }

    fn derive(self, counts: &Counts) -> Vec<CellValue> {
        match self {
            Self::Instagram => instagram::derive(counts),
            Self::Facebook => facebook::derive(counts),
            Self::Twitter => twitter::derive(counts),
            Self::LinkedIn => linkedin::derive(counts),
            Self::YouTube => youtube::derive(counts),
        }
    }

    /// Raw metric names this platform reads.
    pub fn metric_names(self) -> impl Iterator<Item = &'static str> {
        self.columns().iter().map(|c| c.metric)
    }

    #[must_use]
    pub fn header(self) -> Header {
        IDENTITY_COLUMNS
            .iter()
            .copied()
            .chain(self.columns().iter().map(|c| c.header))
            .chain(self.derived_headers().iter().copied())
            .collect()
    }

    /// Maps one data point to a row. Returns `None` when the point carries
    /// no metrics payload.
    #[must_use]
    pub fn normalize(self, point: &DataPoint, profile: &Profile) -> Option<NormalizedRow> {
        let metrics = point.metrics.as_ref()?;
        let counts = Counts::from_metrics(self.columns().iter().map(|c| &c.metric), metrics);
        let date = point.reporting_period.format("%Y-%m-%d").to_string();
        Some(self.build_row(date, profile, &counts))
    }

    /// Aggregates a month of daily rows into one row per profile.
    ///
    /// Rows outside `month` are ignored. Output keeps the order in which each
    /// profile first appears; the date cell carries the month (`YYYY-MM`).
    #[must_use]
    pub fn summarize(self, month: MonthKey, rows: &[NormalizedRow]) -> Vec<NormalizedRow> {
        let columns = self.columns();
        let width = self.header().len();
        let mut order: Vec<&str> = Vec::new();
        let mut by_profile: BTreeMap<&str, Vec<&NormalizedRow>> = BTreeMap::new();
        for row in rows {
            let in_month = row
                .cells
                .first()
                .is_some_and(|date| month.matches_prefix(&date.to_string()));
            if !in_month || row.len() != width {
                continue;
            }
            let entry = by_profile.entry(row.profile_id.as_str()).or_default();
            if entry.is_empty() {
                order.push(row.profile_id.as_str());
            }
            entry.push(row);
        }

        order
            .into_iter()
            .filter_map(|profile_id| {
                let days = by_profile.get(profile_id)?;
                let first = days.first()?;
                let latest = days.iter().max_by_key(|r| r.cells[0].to_string())?;

                let mut counts = Counts::default();
                for (i, column) in columns.iter().enumerate() {
                    let idx = IDENTITY_COLUMNS.len() + i;
                    let value = match column.aggregation {
                        Aggregation::Sum => days.iter().filter_map(|r| r.cells[idx].as_f64()).sum(),
                        Aggregation::Latest => latest.cells[idx].as_f64().unwrap_or(0.0),
                    };
                    counts.insert(column.metric, value);
                }

                let profile = Profile {
                    profile_id: first.profile_id.clone(),
                    name: first.cells[1].to_string(),
                    network_type: self.key().to_string(),
                    network_id: first.cells[3].to_string(),
                    group_ids: Vec::new(),
                };
                Some(self.build_row(month.to_string(), &profile, &counts))
            })
            .collect()
    }

    fn build_row(self, date: String, profile: &Profile, counts: &Counts) -> NormalizedRow {
        let mut cells = vec![
            CellValue::Text(date),
            CellValue::Text(profile.name.clone()),
            CellValue::Text(profile.profile_id.clone()),
            CellValue::Text(profile.network_id.clone()),
        ];
        cells.extend(self.columns().iter().map(|c| count_cell(counts.get(c.metric))));
        cells.extend(self.derive(counts));
        NormalizedRow {
            profile_id: profile.profile_id.clone(),
            cells,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sheet_name())
    }
}

/// Union of every platform's metric names, sorted and de-duplicated.
/// Sent as the metric selector with each analytics request.
#[must_use]
pub fn metric_selector() -> Vec<String> {
    let mut names: Vec<String> = Platform::ALL
        .iter()
        .flat_map(|p| p.metric_names())
        .map(str::to_string)
        .collect();
    names.sort();
    names.dedup();
    names
}

#[cfg(test)]
#[path = "platforms_test.rs"]
mod tests;
