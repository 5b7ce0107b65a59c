//! Unit lifecycle, per-unit outcomes, and the run summary.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metricsync_core::MonthKey;
use uuid::Uuid;

/// Lifecycle of one (group, month) unit.
///
/// `Pending → CheckingDedup → {Skipped | Fetching → Routing → Writing → Done}`;
/// any network-facing phase may end in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitPhase {
    Pending,
    CheckingDedup,
    Skipped,
    Fetching,
    Routing,
    Writing,
    Done,
    Failed,
}

impl fmt::Display for UnitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitPhase::Pending => "pending",
            UnitPhase::CheckingDedup => "checking_dedup",
            UnitPhase::Skipped => "skipped",
            UnitPhase::Fetching => "fetching",
            UnitPhase::Routing => "routing",
            UnitPhase::Writing => "writing",
            UnitPhase::Done => "done",
            UnitPhase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Final outcome of one unit, rendered as the user-visible status string.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitStatus {
    Completed,
    NoData,
    AlreadySynced,
    Skipped(String),
    /// Dry run: the unit would have been fetched and written.
    WouldSync,
    Failed { elapsed: Duration, message: String },
}

impl UnitStatus {
    /// Whether the month can be recorded as present in the destination.
    #[must_use]
    pub fn is_synced(&self) -> bool {
        matches!(self, UnitStatus::Completed | UnitStatus::AlreadySynced)
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitStatus::Completed => f.write_str("Completed"),
            UnitStatus::NoData => f.write_str("No data"),
            UnitStatus::AlreadySynced => f.write_str("Already updated for this month"),
            UnitStatus::Skipped(reason) => write!(f, "Skipped: {reason}"),
            UnitStatus::WouldSync => f.write_str("Would sync (dry run)"),
            UnitStatus::Failed { elapsed, message } => {
                write!(f, "Error after {:.1}s: {message}", elapsed.as_secs_f64())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitReport {
    pub group_id: String,
    pub group_name: String,
    pub month: MonthKey,
    pub status: UnitStatus,
    pub rows_written: usize,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub units: Vec<UnitReport>,
    /// Throttle pauses inserted between units, including zero-length ones.
    pub group_pauses: usize,
    pub month_pauses: usize,
}

impl RunSummary {
    #[must_use]
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            finished_at: None,
            units: Vec::new(),
            group_pauses: 0,
            month_pauses: 0,
        }
    }

    #[must_use]
    pub fn rows_written(&self) -> usize {
        self.units.iter().map(|u| u.rows_written).sum()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.units
            .iter()
            .filter(|u| matches!(u.status, UnitStatus::Failed { .. }))
            .count()
    }

    #[must_use]
    pub fn status_of(&self, group_id: &str, month: MonthKey) -> Option<&UnitStatus> {
        self.units
            .iter()
            .find(|u| u.group_id == group_id && u.month == month)
            .map(|u| &u.status)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "run {} started {}", self.run_id, self.started_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        let name_width = self
            .units
            .iter()
            .map(|u| u.group_name.len())
            .max()
            .unwrap_or(0)
            .max(5);
        writeln!(f, "{:<name_width$}  {:<14}  {:>6}  STATUS", "GROUP", "MONTH", "ROWS")?;
        for unit in &self.units {
            writeln!(
                f,
                "{:<name_width$}  {:<14}  {:>6}  {}",
                unit.group_name,
                unit.month.label(),
                unit.rows_written,
                unit.status
            )?;
        }
        write!(
            f,
            "{} unit(s), {} row(s) written, {} failed",
            self.units.len(),
            self.rows_written(),
            self.failed()
        )
    }
}
