//! Calendar-month windows and fetch-safe range splitting.
//!
//! Month windows always span the first through last day of their month, even
//! when the last day lies in the future relative to "now". Callers that fetch
//! the current month therefore request data through month-end.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Inclusive day-granularity date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeWindow {
    /// Returns `None` when `start` is after `end`.
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Number of days covered, counting both ends.
    #[must_use]
    pub fn days(&self) -> u64 {
        self.end
            .signed_duration_since(self.start)
            .num_days()
            .unsigned_abs()
            + 1
    }

    #[must_use]
    pub fn month_key(&self) -> MonthKey {
        MonthKey::of(self.start)
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A calendar month, rendered as `YYYY-MM`. Used as the dedup key.
///
/// Stored as the first day of the month so ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey(NaiveDate);

impl MonthKey {
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self(date - Days::new(u64::from(date.day0())))
    }

    #[must_use]
    pub fn first_day(self) -> NaiveDate {
        self.0
    }

    #[must_use]
    pub fn last_day(self) -> NaiveDate {
        self.0 + Months::new(1) - Days::new(1)
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + Months::new(1))
    }

    /// Human label such as `"January 2024"`.
    #[must_use]
    pub fn label(self) -> String {
        self.0.format("%B %Y").to_string()
    }

    #[must_use]
    pub fn window(self) -> TimeWindow {
        TimeWindow {
            start: self.first_day(),
            end: self.last_day(),
        }
    }

    /// True when `date_text` (a raw spreadsheet cell) starts with this key.
    #[must_use]
    pub fn matches_prefix(self, date_text: &str) -> bool {
        date_text.trim().starts_with(&self.to_string())
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m"))
    }
}

impl std::str::FromStr for MonthKey {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d").map(Self)
    }
}

impl TryFrom<String> for MonthKey {
    type Error = chrono::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(value: MonthKey) -> Self {
        value.to_string()
    }
}

/// A month window with its key and human label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthWindow {
    pub key: MonthKey,
    pub window: TimeWindow,
    pub label: String,
}

/// The window spanning the month that contains `reference`.
#[must_use]
pub fn month_window(reference: NaiveDate) -> MonthWindow {
    let key = MonthKey::of(reference);
    MonthWindow {
        key,
        window: key.window(),
        label: key.label(),
    }
}

/// Ordered, gapless month windows from the month of `boundary` through the
/// month of `now`, inclusive. Empty when `boundary` is after `now`'s month.
#[must_use]
pub fn month_windows(boundary: NaiveDate, now: NaiveDate) -> Vec<MonthWindow> {
    let last = MonthKey::of(now);
    let mut key = MonthKey::of(boundary);
    let mut windows = Vec::new();
    while key <= last {
        windows.push(month_window(key.first_day()));
        key = key.next();
    }
    windows
}

/// Splits `window` into consecutive sub-windows of at most `max_days` days.
///
/// A `max_days` of zero is treated as one.
#[must_use]
pub fn split_window(window: &TimeWindow, max_days: u32) -> Vec<TimeWindow> {
    let span = u64::from(max_days.max(1)) - 1;
    let mut chunks = Vec::new();
    let mut start = window.start;
    loop {
        let candidate_end = start + Days::new(span);
        let end = candidate_end.min(window.end);
        chunks.push(TimeWindow { start, end });
        if end >= window.end {
            break;
        }
        start = end + Days::new(1);
    }
    chunks
}
