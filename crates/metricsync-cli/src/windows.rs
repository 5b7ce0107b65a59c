//! Offline listing of pending months per known group.

use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};
use metricsync_core::{load_destinations, AppConfig, MonthKey, MonthWindow, RunContext, RunMode};
use metricsync_sync::SyncState;

/// Groups known locally: those in the state file and the destinations file.
///
/// # Errors
///
/// Returns an error if the state or destinations file cannot be read.
pub(crate) fn print_windows(config: &AppConfig, since: Option<MonthKey>) -> anyhow::Result<()> {
    let state = SyncState::load(&config.state_path)?;
    let destinations = load_destinations(&config.destinations_path)?;

    let mut group_ids: BTreeSet<String> = state.groups.keys().cloned().collect();
    group_ids.extend(destinations.destinations.iter().map(|d| d.group_id.clone()));

    let mode = match since {
        Some(month) => RunMode::FullBackfill {
            since: month.first_day(),
        },
        None => RunMode::Incremental {
            last_synced: state.last_synced(),
        },
    };
    let ctx = RunContext::new(Utc::now().date_naive(), mode);

    if group_ids.is_empty() {
        println!("no groups known locally; a sync would start from {}", config.backfill_start);
        return Ok(());
    }
    for (group_id, windows) in pending_by_group(&ctx, &group_ids, config.backfill_start) {
        println!("{group_id}: {}", describe(&windows));
    }
    Ok(())
}

pub(crate) fn pending_by_group<'a>(
    ctx: &RunContext,
    group_ids: impl IntoIterator<Item = &'a String>,
    backfill_start: NaiveDate,
) -> Vec<(&'a str, Vec<MonthWindow>)> {
    group_ids
        .into_iter()
        .map(|id| (id.as_str(), ctx.pending_windows(id, backfill_start)))
        .collect()
}

fn describe(windows: &[MonthWindow]) -> String {
    if windows.is_empty() {
        return "up to date".to_string();
    }
    windows
        .iter()
        .map(|w| w.key.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
