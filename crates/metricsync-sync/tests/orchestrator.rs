//! End-to-end orchestrator tests: wiremock analytics API, in-memory destination.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use metricsync_analytics::{analytics_retry_policy, AnalyticsClient, AnalyticsFetcher, FetchLimits};
use metricsync_core::{DestinationEntry, DestinationsFile, Group, MonthKey, Profile, RunContext, RunMode};
use metricsync_report::metric_selector;
use metricsync_sheets::MemoryDestination;
use metricsync_sync::{SyncOrchestrator, SyncSettings, SyncState, Throttle, UnitStatus};

const JANUARY: &str = "2024-01-01...2024-01-31";
const FEBRUARY: &str = "2024-02-01...2024-02-29";

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn month(s: &str) -> MonthKey {
    s.parse().unwrap()
}

fn profile(id: &str, network_type: &str) -> Profile {
    Profile {
        profile_id: id.to_string(),
        name: format!("Acme {network_type}"),
        network_type: network_type.to_string(),
        network_id: format!("native-{id}"),
        group_ids: vec!["10".to_string()],
    }
}

fn acme() -> Group {
    Group {
        group_id: "10".to_string(),
        name: "Acme".to_string(),
        profiles: vec![profile("1", "twitter_profile"), profile("2", "fb_page")],
    }
}

fn mapping() -> DestinationsFile {
    DestinationsFile {
        destinations: vec![DestinationEntry {
            group_id: "10".to_string(),
            document_id: "doc-1".to_string(),
            title: None,
        }],
    }
}

fn settings(folder: Option<&str>) -> SyncSettings {
    SyncSettings {
        backfill_start: d(2024, 1, 1),
        throttle: Throttle::disabled(),
        watchdog: Duration::ZERO,
        write_monthly_summary: true,
        drive_folder_id: folder.map(str::to_string),
        state_path: None,
    }
}

fn orchestrator(
    server: &MockServer,
    destination: Arc<MemoryDestination>,
    destinations: DestinationsFile,
    settings: SyncSettings,
) -> SyncOrchestrator<Arc<MemoryDestination>> {
    orchestrator_with_limits(server, destination, destinations, settings, FetchLimits::default())
}

fn orchestrator_with_limits(
    server: &MockServer,
    destination: Arc<MemoryDestination>,
    destinations: DestinationsFile,
    settings: SyncSettings,
    limits: FetchLimits,
) -> SyncOrchestrator<Arc<MemoryDestination>> {
    let client = AnalyticsClient::with_base_url("token", "4242", 5, &server.uri())
        .expect("client construction should not fail")
        .with_retry_policy(analytics_retry_policy(3, Duration::ZERO));
    let fetcher = AnalyticsFetcher::new(client, limits, metric_selector());
    SyncOrchestrator::new(fetcher, destination, destinations, settings)
}

fn backfill(today: NaiveDate) -> RunContext {
    RunContext::new(today, RunMode::FullBackfill { since: d(2024, 1, 1) })
}

fn page(records: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "data": records,
        "paging": { "current_page": 1, "total_pages": 1 }
    }))
}

fn record(profile_id: u64, day: &str) -> serde_json::Value {
    json!({
        "dimensions": { "customer_profile_id": profile_id, "reporting_period.by(day)": day },
        "metrics": {
            "lifetime_snapshot.followers_count": 500,
            "impressions": 100,
            "likes": 10,
            "comments_count": 2,
            "shares_count": 1,
            "post_link_clicks": 3
        }
    })
}

async fn mount_month(server: &MockServer, range: &str, records: serde_json::Value, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/4242/analytics/profiles"))
        .and(body_string_contains(range))
        .respond_with(page(records))
        .expect(calls)
        .mount(server)
        .await;
}

fn memory_with_doc() -> Arc<MemoryDestination> {
    Arc::new(MemoryDestination::new().with_document("doc-1", "Acme"))
}

#[tokio::test]
async fn rerun_for_same_month_appends_nothing() {
    let server = MockServer::start().await;
    mount_month(
        &server,
        JANUARY,
        json!([record(1, "2024-01-01"), record(2, "2024-01-01"), record(1, "2024-01-02")]),
        1,
    )
    .await;

    let dest = memory_with_doc();
    let sync = orchestrator(&server, Arc::clone(&dest), mapping(), settings(None));
    let mut state = SyncState::default();

    let first = sync.run(&backfill(d(2024, 1, 20)), &[acme()], &mut state).await.unwrap();
    assert_eq!(first.status_of("10", month("2024-01")), Some(&UnitStatus::Completed));
    assert_eq!(first.rows_written(), 3);
    // header + rows
    assert_eq!(dest.rows("doc-1", "Twitter").len(), 3);
    assert_eq!(dest.rows("doc-1", "Facebook").len(), 2);
    assert_eq!(dest.rows("doc-1", "Twitter Monthly").len(), 2);
    let appends_after_first = dest.append_calls();

    let second = sync.run(&backfill(d(2024, 1, 25)), &[acme()], &mut state).await.unwrap();
    assert_eq!(
        second.status_of("10", month("2024-01")),
        Some(&UnitStatus::AlreadySynced)
    );
    assert_eq!(dest.rows("doc-1", "Twitter").len(), 3);
    assert_eq!(dest.rows("doc-1", "Facebook").len(), 2);
    assert_eq!(dest.append_calls(), appends_after_first);
}

#[tokio::test]
async fn twitter_row_carries_derived_engagement() {
    let server = MockServer::start().await;
    mount_month(&server, JANUARY, json!([record(1, "2024-01-01")]), 1).await;

    let dest = memory_with_doc();
    let sync = orchestrator(&server, Arc::clone(&dest), mapping(), settings(None));
    sync.run(&backfill(d(2024, 1, 20)), &[acme()], &mut SyncState::default())
        .await
        .unwrap();

    let rows = dest.rows("doc-1", "Twitter");
    let header: Vec<String> = rows[0].iter().map(ToString::to_string).collect();
    let engagements = header.iter().position(|h| h == "Engagements").unwrap();
    assert_eq!(rows[1][0].to_string(), "2024-01-01");
    assert_eq!(rows[1][engagements].to_string(), "16");
}

#[tokio::test]
async fn closed_months_advance_state_and_open_month_stays_pending() {
    let server = MockServer::start().await;
    mount_month(&server, JANUARY, json!([record(1, "2024-01-05")]), 1).await;
    mount_month(&server, FEBRUARY, json!([record(1, "2024-02-01")]), 1).await;

    let dest = memory_with_doc();
    let sync = orchestrator(&server, Arc::clone(&dest), mapping(), settings(None));
    let mut state = SyncState::default();

    let summary = sync.run(&backfill(d(2024, 2, 10)), &[acme()], &mut state).await.unwrap();
    let months: Vec<String> = summary.units.iter().map(|u| u.month.to_string()).collect();
    assert_eq!(months, vec!["2024-01", "2024-02"]);
    assert_eq!(state.last_synced().get("10"), Some(&month("2024-01")));

    let incremental = RunContext::new(d(2024, 2, 12), RunMode::Incremental { last_synced: state.last_synced() });
    let rerun = sync.run(&incremental, &[acme()], &mut state).await.unwrap();
    assert_eq!(rerun.units.len(), 1);
    assert_eq!(
        rerun.status_of("10", month("2024-02")),
        Some(&UnitStatus::AlreadySynced)
    );
}

#[tokio::test]
async fn exhausted_retries_report_no_data() {
    let server = MockServer::start().await;
    mount_month(&server, JANUARY, json!([]), 3).await;

    let dest = memory_with_doc();
    let sync = orchestrator(&server, Arc::clone(&dest), mapping(), settings(None));
    let mut state = SyncState::default();

    let summary = sync.run(&backfill(d(2024, 1, 20)), &[acme()], &mut state).await.unwrap();
    assert_eq!(summary.status_of("10", month("2024-01")), Some(&UnitStatus::NoData));
    assert!(dest.sheet_titles("doc-1").is_empty());
    assert!(state.last_synced().is_empty());
}

#[tokio::test]
async fn missing_destination_skips_without_fetching() {
    let server = MockServer::start().await;
    mount_month(&server, JANUARY, json!([record(1, "2024-01-01")]), 0).await;

    let dest = Arc::new(MemoryDestination::new());
    let sync = orchestrator(&server, Arc::clone(&dest), DestinationsFile::default(), settings(None));

    let summary = sync
        .run(&backfill(d(2024, 1, 20)), &[acme()], &mut SyncState::default())
        .await
        .unwrap();
    let status = summary.status_of("10", month("2024-01")).unwrap();
    assert_eq!(status.to_string(), "Skipped: no destination for group 10");
}

#[tokio::test]
async fn missing_destination_is_created_in_folder() {
    let server = MockServer::start().await;
    mount_month(&server, JANUARY, json!([record(2, "2024-01-03")]), 1).await;

    let dest = Arc::new(MemoryDestination::new());
    let sync = orchestrator(&server, Arc::clone(&dest), DestinationsFile::default(), settings(Some("folder-9")));
    let mut state = SyncState::default();

    let summary = sync.run(&backfill(d(2024, 1, 20)), &[acme()], &mut state).await.unwrap();
    assert_eq!(summary.status_of("10", month("2024-01")), Some(&UnitStatus::Completed));

    let document_id = state.group("10").and_then(|g| g.document_id.clone()).unwrap();
    assert_eq!(dest.document_folder(&document_id).as_deref(), Some("folder-9"));
    assert_eq!(dest.document_title(&document_id).as_deref(), Some("Acme Social Metrics"));
    assert_eq!(dest.rows(&document_id, "Facebook").len(), 2);
}

#[tokio::test]
async fn rejected_analytics_credentials_abort_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/4242/analytics/profiles"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let mut other = acme();
    other.group_id = "11".to_string();
    let destinations = DestinationsFile {
        destinations: vec![
            mapping().destinations[0].clone(),
            DestinationEntry {
                group_id: "11".to_string(),
                document_id: "doc-1".to_string(),
                title: None,
            },
        ],
    };

    let sync = orchestrator(&server, memory_with_doc(), destinations, settings(None));
    let err = sync
        .run(&backfill(d(2024, 1, 20)), &[acme(), other], &mut SyncState::default())
        .await
        .unwrap_err();
    assert!(err.is_fatal());
}

#[tokio::test]
async fn destination_errors_become_unit_failures() {
    let server = MockServer::start().await;
    mount_month(&server, JANUARY, json!([record(1, "2024-01-01")]), 0).await;

    let dest = memory_with_doc();
    dest.fail_with_status(Some(500));
    let sync = orchestrator(&server, Arc::clone(&dest), mapping(), settings(None));

    let summary = sync
        .run(&backfill(d(2024, 1, 20)), &[acme()], &mut SyncState::default())
        .await
        .unwrap();
    let status = summary.status_of("10", month("2024-01")).unwrap();
    assert!(matches!(status, UnitStatus::Failed { .. }));
    assert!(status.to_string().starts_with("Error after "));
    assert_eq!(summary.failed(), 1);
}

#[tokio::test]
async fn dry_run_fetches_and_writes_nothing() {
    let server = MockServer::start().await;
    mount_month(&server, JANUARY, json!([record(1, "2024-01-01")]), 0).await;

    let dest = memory_with_doc();
    let sync = orchestrator(&server, Arc::clone(&dest), mapping(), settings(None));
    let mut state = SyncState::default();

    let summary = sync
        .run(&backfill(d(2024, 1, 20)).with_dry_run(true), &[acme()], &mut state)
        .await
        .unwrap();
    assert_eq!(summary.status_of("10", month("2024-01")), Some(&UnitStatus::WouldSync));
    assert_eq!(dest.append_calls(), 0);
    assert!(state.groups.is_empty());
}

#[tokio::test]
async fn partially_fetched_month_fails_and_stays_pending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/4242/analytics/profiles"))
        .and(body_string_contains("customer_profile_id.eq(1)"))
        .respond_with(page(json!([record(1, "2024-01-01")])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/4242/analytics/profiles"))
        .and(body_string_contains("customer_profile_id.eq(2)"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dest = memory_with_doc();
    let limits = FetchLimits {
        max_profiles_per_request: 1,
        ..FetchLimits::default()
    };
    let sync = orchestrator_with_limits(&server, Arc::clone(&dest), mapping(), settings(None), limits);
    let mut state = SyncState::default();

    let summary = sync.run(&backfill(d(2024, 2, 10)), &[acme()], &mut state).await.unwrap();
    let january = summary.status_of("10", month("2024-01")).unwrap();
    assert!(matches!(january, UnitStatus::Failed { .. }));
    assert!(january.to_string().contains("1 of 2 analytics request(s) failed"));
    assert_eq!(dest.append_calls(), 0);
    assert!(state.last_synced().is_empty());

    // Nothing was written, so the next run fetches January again.
    let incremental = RunContext::new(d(2024, 2, 12), RunMode::Incremental { last_synced: state.last_synced() });
    let rerun = sync.run(&incremental, &[acme()], &mut state).await.unwrap();
    assert!(matches!(
        rerun.status_of("10", month("2024-01")),
        Some(UnitStatus::Failed { .. })
    ));
    assert!(dest.sheet_titles("doc-1").is_empty());
}

fn beta() -> Group {
    let mut profile = profile("3", "twitter_profile");
    profile.group_ids = vec!["11".to_string()];
    Group {
        group_id: "11".to_string(),
        name: "Beta".to_string(),
        profiles: vec![profile],
    }
}

fn two_group_mapping() -> DestinationsFile {
    let mut file = mapping();
    file.destinations.push(DestinationEntry {
        group_id: "11".to_string(),
        document_id: "doc-2".to_string(),
        title: None,
    });
    file
}

async fn mount_profiles(server: &MockServer, filter: &str, range: &str, records: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/4242/analytics/profiles"))
        .and(body_string_contains(filter))
        .and(body_string_contains(range))
        .respond_with(page(records))
        .mount(server)
        .await;
}

#[tokio::test]
async fn months_run_in_order_with_groups_one_at_a_time() {
    let server = MockServer::start().await;
    mount_profiles(&server, "customer_profile_id.eq(1, 2)", JANUARY, json!([record(1, "2024-01-02")])).await;
    mount_profiles(&server, "customer_profile_id.eq(3)", JANUARY, json!([record(3, "2024-01-03")])).await;
    mount_profiles(&server, "customer_profile_id.eq(1, 2)", FEBRUARY, json!([record(2, "2024-02-02")])).await;
    mount_profiles(&server, "customer_profile_id.eq(3)", FEBRUARY, json!([record(3, "2024-02-03")])).await;

    let dest = Arc::new(
        MemoryDestination::new()
            .with_document("doc-1", "Acme")
            .with_document("doc-2", "Beta"),
    );
    let sync = orchestrator(&server, Arc::clone(&dest), two_group_mapping(), settings(None));

    let summary = sync
        .run(&backfill(d(2024, 2, 10)), &[acme(), beta()], &mut SyncState::default())
        .await
        .unwrap();

    let order: Vec<(String, String)> = summary
        .units
        .iter()
        .map(|u| (u.month.to_string(), u.group_id.clone()))
        .collect();
    let expected: Vec<(String, String)> = [("2024-01", "10"), ("2024-01", "11"), ("2024-02", "10"), ("2024-02", "11")]
        .into_iter()
        .map(|(m, g)| (m.to_string(), g.to_string()))
        .collect();
    assert_eq!(order, expected);
    assert!(summary.units.iter().all(|u| u.status == UnitStatus::Completed));
    assert_eq!(dest.rows("doc-2", "Twitter").len(), 3);
    assert_eq!(summary.month_pauses, 1);
    assert_eq!(summary.group_pauses, 2);
}

#[tokio::test]
async fn pauses_are_skipped_after_units_that_never_reach_the_api() {
    let server = MockServer::start().await;
    mount_profiles(&server, "customer_profile_id.eq(1, 2)", JANUARY, json!([record(1, "2024-01-02")])).await;
    mount_profiles(&server, "customer_profile_id.eq(3)", JANUARY, json!([record(3, "2024-01-03")])).await;

    let mut unmapped = acme();
    unmapped.group_id = "12".to_string();
    unmapped.name = "Unmapped".to_string();

    let dest = Arc::new(
        MemoryDestination::new()
            .with_document("doc-1", "Acme")
            .with_document("doc-2", "Beta"),
    );
    let sync = orchestrator(&server, Arc::clone(&dest), two_group_mapping(), settings(None));

    let summary = sync
        .run(&backfill(d(2024, 1, 20)), &[acme(), unmapped, beta()], &mut SyncState::default())
        .await
        .unwrap();

    assert_eq!(summary.status_of("10", month("2024-01")), Some(&UnitStatus::Completed));
    assert!(matches!(summary.status_of("12", month("2024-01")), Some(UnitStatus::Skipped(_))));
    assert_eq!(summary.status_of("11", month("2024-01")), Some(&UnitStatus::Completed));
    // One pause before the skipped group; none after it.
    assert_eq!(summary.group_pauses, 1);
    assert_eq!(summary.month_pauses, 0);
}

#[tokio::test]
async fn schedule_starts_each_group_after_its_last_synced_month() {
    let server = MockServer::start().await;
    let sync = orchestrator(&server, memory_with_doc(), two_group_mapping(), settings(None));

    let mut state = SyncState::default();
    state.record_synced("10", month("2024-01"));
    let ctx = RunContext::new(d(2024, 3, 5), RunMode::Incremental { last_synced: state.last_synced() });
    let groups = [acme(), beta()];

    let schedule = sync.schedule(&ctx, &groups);
    let layout: Vec<(String, Vec<&str>)> = schedule
        .iter()
        .map(|(key, units)| {
            (
                key.to_string(),
                units.iter().map(|(g, _)| g.group_id.as_str()).collect(),
            )
        })
        .collect();
    assert_eq!(
        layout,
        vec![
            ("2024-01".to_string(), vec!["11"]),
            ("2024-02".to_string(), vec!["10", "11"]),
            ("2024-03".to_string(), vec!["10", "11"]),
        ]
    );
}
