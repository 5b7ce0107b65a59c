use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with all required env vars populated with valid values.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("METRICSYNC_ANALYTICS_TOKEN", "analytics-token");
    m.insert("METRICSYNC_ANALYTICS_CUSTOMER_ID", "4242");
    m.insert("METRICSYNC_SHEETS_TOKEN", "sheets-token");
    m
}

#[test]
fn parse_environment_known_values() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "METRICSYNC_ENV"));
}

#[test]
fn build_app_config_fails_without_analytics_token() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "METRICSYNC_ANALYTICS_TOKEN"),
        "expected MissingEnvVar(METRICSYNC_ANALYTICS_TOKEN), got: {result:?}"
    );
}

#[test]
fn build_app_config_treats_blank_token_as_missing() {
    let mut map = full_env();
    map.insert("METRICSYNC_SHEETS_TOKEN", "   ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "METRICSYNC_SHEETS_TOKEN"),
        "expected MissingEnvVar(METRICSYNC_SHEETS_TOKEN), got: {result:?}"
    );
}

#[test]
fn build_app_config_succeeds_with_defaults() {
    let map = full_env();
    let cfg = build_app_config(lookup_from_map(&map)).expect("config should build");
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.analytics_customer_id, "4242");
    assert_eq!(cfg.analytics_base_url, "https://api.sproutsocial.com/v1/");
    assert!(cfg.drive_folder_id.is_none());
    assert_eq!(
        cfg.backfill_start,
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    );
    assert_eq!(cfg.max_attempts, 3);
    assert_eq!(cfg.retry_delay_secs, 10);
    assert_eq!(cfg.group_pause_secs, 300);
    assert_eq!(cfg.month_pause_secs, 600);
    assert_eq!(cfg.max_profiles_per_request, 50);
    assert_eq!(cfg.max_days_per_request, 31);
    assert!(cfg.write_monthly_summary);
    assert_eq!(cfg.schedule, "0 0 6 * * *");
}

#[test]
fn build_app_config_reads_overrides() {
    let mut map = full_env();
    map.insert("METRICSYNC_ENV", "production");
    map.insert("METRICSYNC_DRIVE_FOLDER_ID", "folder-1");
    map.insert("METRICSYNC_BACKFILL_START", "2023-06-01");
    map.insert("METRICSYNC_MAX_ATTEMPTS", "5");
    map.insert("METRICSYNC_WRITE_MONTHLY_SUMMARY", "false");
    let cfg = build_app_config(lookup_from_map(&map)).expect("config should build");
    assert_eq!(cfg.env, Environment::Production);
    assert_eq!(cfg.drive_folder_id.as_deref(), Some("folder-1"));
    assert_eq!(
        cfg.backfill_start,
        NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()
    );
    assert_eq!(cfg.max_attempts, 5);
    assert!(!cfg.write_monthly_summary);
}

#[test]
fn build_app_config_rejects_invalid_backfill_start() {
    let mut map = full_env();
    map.insert("METRICSYNC_BACKFILL_START", "January");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "METRICSYNC_BACKFILL_START"),
        "expected InvalidEnvVar(METRICSYNC_BACKFILL_START), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_attempts() {
    let mut map = full_env();
    map.insert("METRICSYNC_MAX_ATTEMPTS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "METRICSYNC_MAX_ATTEMPTS"),
        "expected InvalidEnvVar(METRICSYNC_MAX_ATTEMPTS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_invalid_pause() {
    let mut map = full_env();
    map.insert("METRICSYNC_GROUP_PAUSE_SECS", "five minutes");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "METRICSYNC_GROUP_PAUSE_SECS"),
        "expected InvalidEnvVar(METRICSYNC_GROUP_PAUSE_SECS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_invalid_bool() {
    let mut map = full_env();
    map.insert("METRICSYNC_WRITE_MONTHLY_SUMMARY", "maybe");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "METRICSYNC_WRITE_MONTHLY_SUMMARY"),
        "expected InvalidEnvVar(METRICSYNC_WRITE_MONTHLY_SUMMARY), got: {result:?}"
    );
}

#[test]
fn debug_output_redacts_tokens() {
    let map = full_env();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("analytics-token"));
    assert!(!rendered.contains("sheets-token"));
    assert!(rendered.contains("[redacted]"));
}
