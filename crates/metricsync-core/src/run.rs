//! Explicit per-run context: which months are pending and for whom.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::period::{month_windows, MonthKey, MonthWindow};

/// How the set of pending months is chosen for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Re-examine every month from `since` through the current month. DedupGate
    /// still prevents duplicate appends.
    FullBackfill { since: NaiveDate },
    /// Continue after each group's last synced month, as recorded by the
    /// previous run. Groups with no record start at the configured backfill start.
    Incremental {
        last_synced: BTreeMap<String, MonthKey>,
    },
}

/// Everything a sync run needs to know about "when" it is running.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    pub today: NaiveDate,
    pub mode: RunMode,
    /// Check dedup and report, but never fetch analytics or write rows.
    pub dry_run: bool,
}

impl RunContext {
    #[must_use]
    pub fn new(today: NaiveDate, mode: RunMode) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            today,
            mode,
            dry_run: false,
        }
    }

    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Month windows still pending for `group_id`, oldest first.
    #[must_use]
    pub fn pending_windows(&self, group_id: &str, backfill_start: NaiveDate) -> Vec<MonthWindow> {
        let boundary = match &self.mode {
            RunMode::FullBackfill { since } => *since,
            RunMode::Incremental { last_synced } => last_synced
                .get(group_id)
                .map_or(backfill_start, |last| last.next().first_day()),
        };
        month_windows(boundary, self.today)
    }

    /// Whether `key` is a month that has fully ended as of `today`.
    #[must_use]
    pub fn is_closed_month(&self, key: MonthKey) -> bool {
        key.last_day() < self.today
    }
}
