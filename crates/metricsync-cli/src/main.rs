mod schedule;
mod sync;
mod windows;

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use metricsync_core::MonthKey;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "metricsync")]
#[command(about = "Sync social analytics into spreadsheet destinations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one sync pass over every pending (group, month)
    Sync(SyncArgs),
    /// Print pending months per group without contacting any API
    Windows {
        /// Treat every month from YYYY-MM onwards as pending
        #[arg(long)]
        since: Option<MonthKey>,
    },
    /// Run `sync` on the configured cron schedule until interrupted
    Schedule,
}

#[derive(Debug, Clone, Default, Args)]
pub(crate) struct SyncArgs {
    /// Only sync this group id (repeatable)
    #[arg(long = "group", value_name = "ID")]
    pub groups: Vec<String>,
    /// Re-run every month from the backfill start, ignoring saved progress
    #[arg(long)]
    pub full_backfill: bool,
    /// Backfill from this month (YYYY-MM); implies --full-backfill
    #[arg(long)]
    pub since: Option<MonthKey>,
    /// Resolve destinations and check dedup without fetching or writing
    #[arg(long)]
    pub dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Arc::new(metricsync_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Sync(args) => {
            let summary = sync::run_sync(&config, &args).await?;
            println!("{summary}");
        }
        Commands::Windows { since } => windows::print_windows(&config, since)?,
        Commands::Schedule => schedule::run_daemon(config).await?,
    }

    Ok(())
}
