//! Wall-clock watchdog for a whole run. Logs on expiry; never interrupts.

use std::time::Duration;

use tokio::task::JoinHandle;
use uuid::Uuid;

/// Aborts its timer task when dropped, so a finished run never logs.
#[derive(Debug)]
pub struct Watchdog {
    handle: Option<JoinHandle<()>>,
}

impl Watchdog {
    /// Starts the timer. A zero `limit` disables the watchdog.
    #[must_use]
    pub fn start(run_id: Uuid, limit: Duration) -> Self {
        if limit.is_zero() {
            return Self { handle: None };
        }
        let handle = tokio::spawn(async move {
            tokio::time::sleep(limit).await;
            tracing::error!(
                %run_id,
                limit_secs = limit.as_secs(),
                "sync run exceeded its watchdog limit; still running"
            );
        });
        Self {
            handle: Some(handle),
        }
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
