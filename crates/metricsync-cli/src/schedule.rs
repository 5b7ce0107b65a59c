//! Cron-driven daemon around the one-shot sync.

use std::sync::Arc;

use metricsync_core::AppConfig;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::sync::run_sync;
use crate::SyncArgs;

/// Runs an incremental sync on `config.schedule` until ctrl-c.
///
/// A tick that fires while the previous run is still going is skipped.
///
/// # Errors
///
/// Returns an error if the cron expression is invalid or the scheduler
/// cannot start.
pub(crate) async fn run_daemon(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let mut scheduler = JobScheduler::new().await?;
    let cron = config.schedule.clone();
    let running = Arc::new(Mutex::new(()));

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let config = Arc::clone(&config);
        let running = Arc::clone(&running);

        Box::pin(async move {
            let Ok(_guard) = running.try_lock() else {
                tracing::warn!("scheduler: previous sync still running; skipping tick");
                return;
            };
            tracing::info!("scheduler: starting sync run");
            match run_sync(&config, &SyncArgs::default()).await {
                Ok(summary) => tracing::info!(
                    run_id = %summary.run_id,
                    rows = summary.rows_written(),
                    failed = summary.failed(),
                    "scheduler: sync run complete"
                ),
                Err(e) => tracing::error!(error = %format!("{e:#}"), "scheduler: sync run aborted"),
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    tracing::info!(cron = %cron, "scheduler started");

    tokio::signal::ctrl_c().await?;
    tracing::info!("received shutdown signal, stopping scheduler");
    scheduler.shutdown().await?;
    Ok(())
}
