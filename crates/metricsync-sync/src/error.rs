use std::path::PathBuf;

use metricsync_analytics::AnalyticsError;
use metricsync_sheets::SheetsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("analytics: {0}")]
    Analytics(#[from] AnalyticsError),

    #[error("destination: {0}")]
    Sheets(#[from] SheetsError),

    /// Some analytics requests for the unit failed; the points that did
    /// arrive were not written so the month stays pending.
    #[error("{failed} of {requests} analytics request(s) failed; discarded {discarded} fetched point(s)")]
    IncompleteFetch {
        failed: usize,
        requests: usize,
        discarded: usize,
    },

    #[error("failed to access sync state {}: {source}", .path.display())]
    StateIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sync state {} is not valid JSON: {source}", .path.display())]
    StateFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SyncError {
    /// True when the run cannot continue at all.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            SyncError::Analytics(e) => e.is_fatal(),
            SyncError::Sheets(e) => e.is_fatal(),
            SyncError::IncompleteFetch { .. }
            | SyncError::StateIo { .. }
            | SyncError::StateFormat { .. } => false,
        }
    }
}
