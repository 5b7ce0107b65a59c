//! One-shot sync: builds the clients from config, loads groups and state,
//! and hands the run to [`SyncOrchestrator`].

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use metricsync_analytics::{analytics_retry_policy, build_groups, AnalyticsClient, AnalyticsFetcher, FetchLimits};
use metricsync_core::{load_destinations, AppConfig, Group, RunContext, RunMode};
use metricsync_report::metric_selector;
use metricsync_sheets::{sheets_retry_policy, SheetsClient};
use metricsync_sync::{RunSummary, SyncOrchestrator, SyncSettings, SyncState};

use crate::SyncArgs;

/// # Errors
///
/// Returns an error if a client cannot be built, group metadata cannot be
/// loaded, a requested group does not exist, the destinations or state file
/// is unreadable, or the run hits a fatal error.
pub(crate) async fn run_sync(config: &AppConfig, args: &SyncArgs) -> anyhow::Result<RunSummary> {
    let analytics = AnalyticsClient::with_base_url(
        &config.analytics_token,
        &config.analytics_customer_id,
        config.request_timeout_secs,
        &config.analytics_base_url,
    )?
    .with_retry_policy(analytics_retry_policy(config.max_attempts, config.retry_delay()));

    let profiles = analytics.profiles().await.context("loading customer profiles")?;
    let groups = build_groups(
        analytics.groups().await.context("loading customer groups")?,
        &profiles,
    );
    let groups = select_groups(groups, &args.groups)?;
    tracing::info!(groups = groups.len(), profiles = profiles.len(), "loaded group metadata");

    let sheets = SheetsClient::with_base_urls(
        &config.sheets_token,
        config.request_timeout_secs,
        &config.sheets_base_url,
        &config.drive_base_url,
    )?
    .with_retry_policy(sheets_retry_policy(config.max_attempts, config.retry_delay()));

    let destinations = load_destinations(&config.destinations_path)?;
    let mut state = SyncState::load(&config.state_path)?;
    let ctx = RunContext::new(Utc::now().date_naive(), run_mode(args, config.backfill_start, &state))
        .with_dry_run(args.dry_run);

    let limits = FetchLimits {
        max_profiles_per_request: config.max_profiles_per_request,
        max_days_per_request: config.max_days_per_request,
    };
    let fetcher = AnalyticsFetcher::new(analytics, limits, metric_selector());
    let orchestrator = SyncOrchestrator::new(fetcher, sheets, destinations, SyncSettings::from_config(config));

    let summary = orchestrator.run(&ctx, &groups, &mut state).await?;
    tracing::info!(
        run_id = %summary.run_id,
        units = summary.units.len(),
        rows = summary.rows_written(),
        failed = summary.failed(),
        "sync run finished"
    );
    Ok(summary)
}

pub(crate) fn run_mode(args: &SyncArgs, backfill_start: NaiveDate, state: &SyncState) -> RunMode {
    if let Some(since) = args.since {
        RunMode::FullBackfill {
            since: since.first_day(),
        }
    } else if args.full_backfill {
        RunMode::FullBackfill {
            since: backfill_start,
        }
    } else {
        RunMode::Incremental {
            last_synced: state.last_synced(),
        }
    }
}

/// Keeps only the requested groups, in metadata order. An empty request
/// keeps all of them.
pub(crate) fn select_groups(groups: Vec<Group>, requested: &[String]) -> anyhow::Result<Vec<Group>> {
    if requested.is_empty() {
        return Ok(groups);
    }
    if let Some(unknown) = requested
        .iter()
        .find(|id| !groups.iter().any(|g| &g.group_id == *id))
    {
        anyhow::bail!("group '{unknown}' not found in customer metadata");
    }
    Ok(groups
        .into_iter()
        .filter(|g| requested.contains(&g.group_id))
        .collect())
}
