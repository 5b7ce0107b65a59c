//! Cooperative pauses between units of work.
//!
//! Fixed delays that keep the run under the analytics API's rate limits.
//! A zero duration disables the pause.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    pub group_pause: Duration,
    pub month_pause: Duration,
}

impl Throttle {
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            group_pause: Duration::ZERO,
            month_pause: Duration::ZERO,
        }
    }

    pub async fn between_groups(&self) {
        Self::pause(self.group_pause, "group").await;
    }

    pub async fn between_months(&self) {
        Self::pause(self.month_pause, "month").await;
    }

    async fn pause(duration: Duration, boundary: &str) {
        if duration.is_zero() {
            return;
        }
        tracing::info!(boundary, pause_secs = duration.as_secs(), "pausing for rate limits");
        tokio::time::sleep(duration).await;
    }
}
