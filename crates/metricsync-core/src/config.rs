use std::path::PathBuf;

use chrono::NaiveDate;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_date = |var: &str, default: &str| -> Result<NaiveDate, ConfigError> {
        NaiveDate::parse_from_str(&or_default(var, default), "%Y-%m-%d")
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got '{other}'"))),
        }
    };

    let analytics_token = require("METRICSYNC_ANALYTICS_TOKEN")?;
    let analytics_customer_id = require("METRICSYNC_ANALYTICS_CUSTOMER_ID")?;
    let sheets_token = require("METRICSYNC_SHEETS_TOKEN")?;

    let env = parse_environment(&or_default("METRICSYNC_ENV", "development"))?;
    let log_level = or_default("METRICSYNC_LOG_LEVEL", "info");

    let analytics_base_url = or_default(
        "METRICSYNC_ANALYTICS_BASE_URL",
        "https://api.sproutsocial.com/v1/",
    );
    let sheets_base_url = or_default(
        "METRICSYNC_SHEETS_BASE_URL",
        "https://sheets.googleapis.com/v4/",
    );
    let drive_base_url = or_default(
        "METRICSYNC_DRIVE_BASE_URL",
        "https://www.googleapis.com/drive/v3/",
    );
    let drive_folder_id = lookup("METRICSYNC_DRIVE_FOLDER_ID")
        .ok()
        .filter(|v| !v.trim().is_empty());

    let destinations_path = PathBuf::from(or_default(
        "METRICSYNC_DESTINATIONS_PATH",
        "./config/destinations.yaml",
    ));
    let state_path = PathBuf::from(or_default(
        "METRICSYNC_STATE_PATH",
        "./state/sync_state.json",
    ));
    let backfill_start = parse_date("METRICSYNC_BACKFILL_START", "2024-01-01")?;

    let request_timeout_secs = parse_u64("METRICSYNC_REQUEST_TIMEOUT_SECS", "60")?;
    let max_attempts = parse_u32("METRICSYNC_MAX_ATTEMPTS", "3")?;
    if max_attempts == 0 {
        return Err(invalid(
            "METRICSYNC_MAX_ATTEMPTS",
            "must be at least 1".to_string(),
        ));
    }
    let retry_delay_secs = parse_u64("METRICSYNC_RETRY_DELAY_SECS", "10")?;
    let group_pause_secs = parse_u64("METRICSYNC_GROUP_PAUSE_SECS", "300")?;
    let month_pause_secs = parse_u64("METRICSYNC_MONTH_PAUSE_SECS", "600")?;
    let max_profiles_per_request = parse_usize("METRICSYNC_MAX_PROFILES_PER_REQUEST", "50")?;
    let max_days_per_request = parse_u32("METRICSYNC_MAX_DAYS_PER_REQUEST", "31")?;
    if max_profiles_per_request == 0 || max_days_per_request == 0 {
        return Err(invalid(
            "METRICSYNC_MAX_PROFILES_PER_REQUEST/METRICSYNC_MAX_DAYS_PER_REQUEST",
            "request limits must be at least 1".to_string(),
        ));
    }
    let watchdog_secs = parse_u64("METRICSYNC_WATCHDOG_SECS", "14400")?;
    let write_monthly_summary = parse_bool("METRICSYNC_WRITE_MONTHLY_SUMMARY", "true")?;
    let schedule = or_default("METRICSYNC_SCHEDULE", "0 0 6 * * *");

    Ok(AppConfig {
        env,
        log_level,
        analytics_token,
        analytics_customer_id,
        analytics_base_url,
        sheets_token,
        sheets_base_url,
        drive_base_url,
        drive_folder_id,
        destinations_path,
        state_path,
        backfill_start,
        request_timeout_secs,
        max_attempts,
        retry_delay_secs,
        group_pause_secs,
        month_pause_secs,
        max_profiles_per_request,
        max_days_per_request,
        watchdog_secs,
        write_monthly_summary,
        schedule,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "METRICSYNC_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
