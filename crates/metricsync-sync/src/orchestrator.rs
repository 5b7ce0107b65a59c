//! The top-level sync loop.
//!
//! Months run in ascending order; within a month, groups run one at a time in
//! the order given. Each (group, month) unit walks [`UnitPhase`]:
//! resolve the destination, check dedup, fetch, route, then write every
//! platform sheet concurrently. Unit errors become a failed status and the
//! loop moves on; only fatal errors end the run early.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use tracing::Instrument;

use metricsync_analytics::AnalyticsFetcher;
use metricsync_core::{AppConfig, CellValue, DestinationsFile, Group, MonthKey, MonthWindow, NormalizedRow, RunContext};
use metricsync_report::{route, Platform, RoutedRows};
use metricsync_sheets::{already_synced, ensure_sheet, Destination, SheetInfo, SheetsError};

use crate::error::SyncError;
use crate::resolve::{resolve_destination, Resolution};
use crate::state::SyncState;
use crate::status::{RunSummary, UnitPhase, UnitReport, UnitStatus};
use crate::throttle::Throttle;
use crate::watchdog::Watchdog;

/// Run-level knobs, usually taken from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub backfill_start: NaiveDate,
    pub throttle: Throttle,
    pub watchdog: Duration,
    pub write_monthly_summary: bool,
    pub drive_folder_id: Option<String>,
    /// Where state is saved after every unit; `None` keeps it in memory only.
    pub state_path: Option<PathBuf>,
}

impl SyncSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            backfill_start: config.backfill_start,
            throttle: Throttle {
                group_pause: config.group_pause(),
                month_pause: config.month_pause(),
            },
            watchdog: config.watchdog(),
            write_monthly_summary: config.write_monthly_summary,
            drive_folder_id: config.drive_folder_id.clone(),
            state_path: Some(config.state_path.clone()),
        }
    }
}

struct UnitOutcome {
    status: UnitStatus,
    rows_written: usize,
}

impl UnitOutcome {
    fn of(status: UnitStatus) -> Self {
        Self {
            status,
            rows_written: 0,
        }
    }
}

pub struct SyncOrchestrator<D> {
    fetcher: AnalyticsFetcher,
    destination: D,
    destinations: DestinationsFile,
    settings: SyncSettings,
}

impl<D: Destination> SyncOrchestrator<D> {
    #[must_use]
    pub fn new(
        fetcher: AnalyticsFetcher,
        destination: D,
        destinations: DestinationsFile,
        settings: SyncSettings,
    ) -> Self {
        Self {
            fetcher,
            destination,
            destinations,
            settings,
        }
    }

    #[must_use]
    pub fn destination(&self) -> &D {
        &self.destination
    }

    #[must_use]
    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Pending units for `groups`, keyed by month in ascending order.
    /// Within a month, groups keep their input order.
    #[must_use]
    pub fn schedule<'g>(
        &self,
        ctx: &RunContext,
        groups: &'g [Group],
    ) -> BTreeMap<MonthKey, Vec<(&'g Group, MonthWindow)>> {
        let mut schedule: BTreeMap<MonthKey, Vec<(&'g Group, MonthWindow)>> = BTreeMap::new();
        for group in groups {
            for window in ctx.pending_windows(&group.group_id, self.settings.backfill_start) {
                schedule.entry(window.key).or_default().push((group, window));
            }
        }
        schedule
    }

    /// Processes every pending unit and returns the run summary.
    ///
    /// `state` is updated in place (document ids, titles, last synced months)
    /// and saved after each unit when a state path is configured.
    ///
    /// # Errors
    ///
    /// Returns a fatal [`SyncError`] (rejected credentials) as soon as it
    /// occurs. Every other failure is reported as a unit status.
    pub async fn run(
        &self,
        ctx: &RunContext,
        groups: &[Group],
        state: &mut SyncState,
    ) -> Result<RunSummary, SyncError> {
        let span = tracing::info_span!("sync_run", run_id = %ctx.run_id, dry_run = ctx.dry_run);
        self.run_units(ctx, groups, state).instrument(span).await
    }

    async fn run_units(
        &self,
        ctx: &RunContext,
        groups: &[Group],
        state: &mut SyncState,
    ) -> Result<RunSummary, SyncError> {
        let _watchdog = Watchdog::start(ctx.run_id, self.settings.watchdog);
        let mut summary = RunSummary::new(ctx.run_id);
        let schedule = self.schedule(ctx, groups);
        let total: usize = schedule.values().map(Vec::len).sum();
        tracing::info!(groups = groups.len(), months = schedule.len(), units = total, "sync run starting");

        let mut first_unit = true;
        let mut last_touched_api = false;

        for units in schedule.values() {
            for (index, (group, window)) in units.iter().enumerate() {
                if !first_unit && last_touched_api {
                    if index == 0 {
                        self.settings.throttle.between_months().await;
                        summary.month_pauses += 1;
                    } else {
                        self.settings.throttle.between_groups().await;
                        summary.group_pauses += 1;
                    }
                }
                first_unit = false;

                let started = Instant::now();
                let mut phase = UnitPhase::Pending;
                let result = self
                    .process_unit(ctx, group, window, state, &mut phase)
                    .instrument(tracing::info_span!("unit", group = %group.group_id, month = %window.key))
                    .await;
                last_touched_api = matches!(
                    phase,
                    UnitPhase::Fetching | UnitPhase::Routing | UnitPhase::Writing | UnitPhase::Done
                );

                let outcome = match result {
                    Ok(outcome) => outcome,
                    Err(e) if e.is_fatal() => {
                        tracing::error!(
                            group = %group.group_id,
                            month = %window.key,
                            phase = %phase,
                            error = %e,
                            "fatal error; aborting run"
                        );
                        self.persist(ctx, state);
                        return Err(e);
                    }
                    Err(e) => {
                        let elapsed = started.elapsed();
                        tracing::error!(
                            group = %group.group_id,
                            month = %window.key,
                            phase = %phase,
                            error = %e,
                            "unit failed"
                        );
                        phase = UnitPhase::Failed;
                        UnitOutcome::of(UnitStatus::Failed {
                            elapsed,
                            message: e.to_string(),
                        })
                    }
                };

                if outcome.status.is_synced() && ctx.is_closed_month(window.key) && !ctx.dry_run {
                    state.record_synced(&group.group_id, window.key);
                }
                self.persist(ctx, state);

                tracing::info!(
                    group = %group.group_id,
                    month = %window.key,
                    phase = %phase,
                    rows = outcome.rows_written,
                    status = %outcome.status,
                    "unit finished"
                );
                summary.units.push(UnitReport {
                    group_id: group.group_id.clone(),
                    group_name: group.name.clone(),
                    month: window.key,
                    status: outcome.status,
                    rows_written: outcome.rows_written,
                });
            }
        }

        summary.finished_at = Some(Utc::now());
        tracing::info!(
            units = summary.units.len(),
            rows = summary.rows_written(),
            failed = summary.failed(),
            group_pauses = summary.group_pauses,
            month_pauses = summary.month_pauses,
            "sync run finished"
        );
        Ok(summary)
    }

    async fn process_unit(
        &self,
        ctx: &RunContext,
        group: &Group,
        window: &MonthWindow,
        state: &mut SyncState,
        phase: &mut UnitPhase,
    ) -> Result<UnitOutcome, SyncError> {
        let resolution = resolve_destination(
            &self.destination,
            group,
            &self.destinations,
            state,
            self.settings.drive_folder_id.as_deref(),
            ctx.dry_run,
        )
        .await?;
        let document_id = match resolution {
            Resolution::Document(id) => id,
            Resolution::WouldCreate => {
                *phase = UnitPhase::Skipped;
                return Ok(UnitOutcome::of(UnitStatus::WouldSync));
            }
            Resolution::Missing => {
                *phase = UnitPhase::Skipped;
                tracing::warn!(group = %group.group_id, "no destination document and no folder to create one in");
                return Ok(UnitOutcome::of(UnitStatus::Skipped(format!(
                    "no destination for group {}",
                    group.group_id
                ))));
            }
        };

        if group.profiles.is_empty() {
            *phase = UnitPhase::Skipped;
            return Ok(UnitOutcome::of(UnitStatus::NoData));
        }

        *phase = UnitPhase::CheckingDedup;
        let platform_sheets: Vec<&str> = Platform::ALL.iter().map(|p| p.sheet_name()).collect();
        if already_synced(&self.destination, &document_id, &platform_sheets, window.key).await? {
            *phase = UnitPhase::Skipped;
            return Ok(UnitOutcome::of(UnitStatus::AlreadySynced));
        }

        if ctx.dry_run {
            *phase = UnitPhase::Skipped;
            tracing::info!(window = %window.window, profiles = group.profiles.len(), "dry run: would fetch and write");
            return Ok(UnitOutcome::of(UnitStatus::WouldSync));
        }

        *phase = UnitPhase::Fetching;
        let fetched = self.fetcher.fetch_report(&group.profile_ids(), &window.window).await?;
        if fetched.points.is_empty() {
            *phase = UnitPhase::Done;
            return Ok(UnitOutcome::of(UnitStatus::NoData));
        }
        // Nothing is written unless every request succeeded.
        if !fetched.is_complete() {
            return Err(SyncError::IncompleteFetch {
                failed: fetched.failed_requests,
                requests: fetched.requests,
                discarded: fetched.points.len(),
            });
        }
        let points = fetched.points;

        *phase = UnitPhase::Routing;
        let routed = route(&points, &group.profiles);
        let routed_rows: usize = routed.values().map(Vec::len).sum();
        tracing::debug!(points = points.len(), rows = routed_rows, "routed data points");
        if routed_rows == 0 {
            *phase = UnitPhase::Done;
            return Ok(UnitOutcome::of(UnitStatus::NoData));
        }

        *phase = UnitPhase::Writing;
        let rows_written = self.write(&document_id, window.key, &routed).await?;

        *phase = UnitPhase::Done;
        Ok(UnitOutcome {
            status: UnitStatus::Completed,
            rows_written,
        })
    }

    /// Writes every platform's rows concurrently. Returns the number of daily
    /// rows appended.
    async fn write(
        &self,
        document_id: &str,
        month: MonthKey,
        routed: &RoutedRows,
    ) -> Result<usize, SheetsError> {
        let existing = self.destination.list_sheets(document_id).await?;
        let writes = routed
            .iter()
            .filter(|(_, rows)| !rows.is_empty())
            .map(|(platform, rows)| self.write_platform(document_id, &existing, *platform, month, rows));
        let results = join_all(writes).await;

        let mut written = 0;
        let mut failure: Option<SheetsError> = None;
        for result in results {
            match result {
                Ok(count) => written += count,
                Err(e) => {
                    let replace = failure
                        .as_ref()
                        .is_none_or(|current| e.is_fatal() && !current.is_fatal());
                    if replace {
                        failure = Some(e);
                    }
                }
            }
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(written),
        }
    }

    async fn write_platform(
        &self,
        document_id: &str,
        existing: &[SheetInfo],
        platform: Platform,
        month: MonthKey,
        rows: &[NormalizedRow],
    ) -> Result<usize, SheetsError> {
        let header = platform.header();
        let sheet = platform.sheet_name();
        let result = async {
            ensure_sheet(&self.destination, document_id, existing, sheet, &header).await?;
            let cells: Vec<Vec<CellValue>> = rows.iter().map(|r| r.cells.clone()).collect();
            self.destination.append_rows(document_id, sheet, &cells).await?;

            if self.settings.write_monthly_summary {
                let summary = platform.summarize(month, rows);
                if !summary.is_empty() {
                    let title = platform.summary_sheet_name();
                    ensure_sheet(&self.destination, document_id, existing, &title, &header).await?;
                    let cells: Vec<Vec<CellValue>> = summary.into_iter().map(|r| r.cells).collect();
                    self.destination.append_rows(document_id, &title, &cells).await?;
                }
            }
            Ok::<usize, SheetsError>(rows.len())
        }
        .await;

        match &result {
            Ok(count) => tracing::info!(%platform, rows = count, "platform rows written"),
            Err(e) => tracing::error!(%platform, error = %e, "platform write failed"),
        }
        result
    }

    fn persist(&self, ctx: &RunContext, state: &SyncState) {
        if ctx.dry_run {
            return;
        }
        if let Some(path) = &self.settings.state_path {
            if let Err(e) = state.save(path) {
                tracing::error!(error = %e, "failed to save sync state");
            }
        }
    }
}
