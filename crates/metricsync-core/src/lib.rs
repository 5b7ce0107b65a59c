//! Shared domain types, configuration, and time/retry primitives for metricsync.

pub mod app_config;
pub mod config;
pub mod destinations;
pub mod error;
pub mod period;
pub mod retry;
pub mod run;
pub mod types;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use destinations::{load_destinations, DestinationEntry, DestinationsFile};
pub use error::ConfigError;
pub use period::{month_window, month_windows, split_window, MonthKey, MonthWindow, TimeWindow};
pub use retry::{with_retry, RetryPolicy};
pub use run::{RunContext, RunMode};
pub use types::{
    canonical_profile_id, profile_id_from_json, CellValue, DataPoint, Group, MetricMap,
    NormalizedRow, Profile,
};
