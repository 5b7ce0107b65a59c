use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub analytics_token: String,
    pub analytics_customer_id: String,
    pub analytics_base_url: String,
    pub sheets_token: String,
    pub sheets_base_url: String,
    pub drive_base_url: String,
    pub drive_folder_id: Option<String>,
    pub destinations_path: PathBuf,
    pub state_path: PathBuf,
    pub backfill_start: NaiveDate,
    pub request_timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
    pub group_pause_secs: u64,
    pub month_pause_secs: u64,
    pub max_profiles_per_request: usize,
    pub max_days_per_request: u32,
    pub watchdog_secs: u64,
    pub write_monthly_summary: bool,
    pub schedule: String,
}

impl AppConfig {
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    #[must_use]
    pub fn group_pause(&self) -> Duration {
        Duration::from_secs(self.group_pause_secs)
    }

    #[must_use]
    pub fn month_pause(&self) -> Duration {
        Duration::from_secs(self.month_pause_secs)
    }

    #[must_use]
    pub fn watchdog(&self) -> Duration {
        Duration::from_secs(self.watchdog_secs)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("analytics_token", &"[redacted]")
            .field("analytics_customer_id", &self.analytics_customer_id)
            .field("analytics_base_url", &self.analytics_base_url)
            .field("sheets_token", &"[redacted]")
            .field("sheets_base_url", &self.sheets_base_url)
            .field("drive_base_url", &self.drive_base_url)
            .field("drive_folder_id", &self.drive_folder_id)
            .field("destinations_path", &self.destinations_path)
            .field("state_path", &self.state_path)
            .field("backfill_start", &self.backfill_start)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("retry_delay_secs", &self.retry_delay_secs)
            .field("group_pause_secs", &self.group_pause_secs)
            .field("month_pause_secs", &self.month_pause_secs)
            .field("max_profiles_per_request", &self.max_profiles_per_request)
            .field("max_days_per_request", &self.max_days_per_request)
            .field("watchdog_secs", &self.watchdog_secs)
            .field("write_monthly_summary", &self.write_monthly_summary)
            .field("schedule", &self.schedule)
            .finish()
    }
}
