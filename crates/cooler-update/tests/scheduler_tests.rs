//! Integration tests for startup and background scheduling

mod common;

use common::*;
use cooler_update::{OutcomeReason, ReconciliationScheduler, VisibilityPoller};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use wiremock::MockServer;

const SKIN_ZIP: &str = "skin.auramod.zip";
const PLUGIN_ZIP: &str = "plugin.video.netflix.zip";

const SKIN_ACTIONS: [&str; 2] = [
    "Skin.SetString(Skin.Current, skin.auramod)",
    "Skin.SetBool(HomeWidgetMovies, true)",
];

async fn serve_release(server: &MockServer, id: &str, archive: &str) {
    let release = ReleaseBuilder::new()
        .tag(TAG_V2_1_0)
        .asset(archive, &artifact_url(server, archive))
        .build();
    mock_latest_release(server, id, &release).await;
}

fn scheduler(
    host: &Arc<FakeHost>,
    components: Vec<cooler_core::ManagedComponent>,
    period: Option<Duration>,
) -> ReconciliationScheduler {
    ReconciliationScheduler::new(
        Arc::new(test_reconciler(host.clone())),
        components,
        VisibilityPoller::new(POLL_INTERVAL),
        period,
    )
}

#[tokio::test]
async fn test_startup_reports_every_component_in_order() {
    let server = MockServer::start().await;
    serve_release(&server, PLUGIN_ID, PLUGIN_ZIP).await;
    serve_release(&server, SKIN_ID, SKIN_ZIP).await;
    mock_artifact(&server, SKIN_ZIP, FAKE_ARCHIVE_CONTENT, 1).await;

    let host = Arc::new(
        FakeHost::installing(SKIN_ID, VERSION_2_1_0).with_installed(PLUGIN_ID, VERSION_2_1_0),
    );
    let scheduler = scheduler(
        &host,
        vec![
            test_component(&server, PLUGIN_ID),
            test_component(&server, SKIN_ID),
        ],
        None,
    );

    let report = scheduler.run_startup().await;

    let ids: Vec<&str> = report.outcomes.iter().map(|o| o.component_id.as_str()).collect();
    assert_eq!(ids, vec![PLUGIN_ID, SKIN_ID]);
    assert_eq!(report.outcome(PLUGIN_ID).unwrap().reason, OutcomeReason::UpToDate);
    assert_eq!(report.outcome(SKIN_ID).unwrap().reason, OutcomeReason::Updated);
    assert!(report.restart_required());
    assert_eq!(report.failures().count(), 0);
    assert!(report.finished_at >= report.started_at);
}

#[tokio::test]
async fn test_no_restart_when_nothing_changed() {
    let server = MockServer::start().await;
    serve_release(&server, SKIN_ID, SKIN_ZIP).await;
    mock_release_status(&server, PLUGIN_ID, 500).await;

    let host = Arc::new(
        FakeHost::installing(SKIN_ID, VERSION_2_1_0).with_installed(SKIN_ID, VERSION_2_1_0),
    );
    let scheduler = scheduler(
        &host,
        vec![
            test_component(&server, PLUGIN_ID),
            test_component(&server, SKIN_ID),
        ],
        None,
    );

    let report = scheduler.run_startup().await;

    assert!(!report.restart_required());
    let failed: Vec<&str> = report.failures().map(|o| o.component_id.as_str()).collect();
    assert_eq!(failed, vec![PLUGIN_ID]);
}

#[tokio::test]
async fn test_on_ready_actions_run_after_component_is_visible() {
    let server = MockServer::start().await;
    serve_release(&server, SKIN_ID, SKIN_ZIP).await;
    mock_artifact(&server, SKIN_ZIP, FAKE_ARCHIVE_CONTENT, 1).await;

    let host = Arc::new(FakeHost::installing(SKIN_ID, VERSION_2_1_0));
    let component = test_component(&server, SKIN_ID)
        .with_on_ready(SKIN_ACTIONS.iter().map(|a| a.to_string()).collect());
    let scheduler = scheduler(&host, vec![component], None);

    scheduler.run_startup().await;

    assert_eq!(host.builtins(), SKIN_ACTIONS.to_vec());
}

#[tokio::test]
async fn test_on_ready_actions_skipped_when_component_absent() {
    let server = MockServer::start().await;
    mock_release_status(&server, SKIN_ID, 500).await;

    let host = Arc::new(FakeHost::ignoring());
    let component = test_component(&server, SKIN_ID)
        .with_on_ready(SKIN_ACTIONS.iter().map(|a| a.to_string()).collect());
    let scheduler = scheduler(&host, vec![component], None);

    let report = scheduler.run_startup().await;

    assert_eq!(report.outcome(SKIN_ID).unwrap().reason, OutcomeReason::ResolveFailed);
    assert!(host.builtins().is_empty());
}

#[tokio::test]
async fn test_background_loop_reconciles_flagged_components_until_shutdown() {
    let server = MockServer::start().await;
    serve_release(&server, SKIN_ID, SKIN_ZIP).await;
    serve_release(&server, PLUGIN_ID, PLUGIN_ZIP).await;

    let host = Arc::new(
        FakeHost::installing(SKIN_ID, VERSION_2_1_0)
            .with_installed(SKIN_ID, VERSION_2_1_0)
            .with_installed(PLUGIN_ID, VERSION_2_1_0),
    );
    let scheduler = Arc::new(scheduler(
        &host,
        vec![
            test_component(&server, PLUGIN_ID),
            test_component(&server, SKIN_ID).with_background(true),
        ],
        Some(Duration::from_millis(50)),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = scheduler.clone().spawn_background(shutdown_rx);

    tokio::time::sleep(Duration::from_millis(180)).await;
    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("loop stops after shutdown")
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let skin_calls = requests
        .iter()
        .filter(|r| r.url.path() == release_path(SKIN_ID))
        .count();
    let plugin_calls = requests
        .iter()
        .filter(|r| r.url.path() == release_path(PLUGIN_ID))
        .count();

    assert!(skin_calls >= 1, "background component reconciled");
    assert_eq!(plugin_calls, 0, "non-background component left alone");
}

#[tokio::test]
async fn test_background_loop_waits_a_full_period_first() {
    let server = MockServer::start().await;
    serve_release(&server, SKIN_ID, SKIN_ZIP).await;

    let host = Arc::new(FakeHost::ignoring().with_installed(SKIN_ID, VERSION_2_1_0));
    let scheduler = Arc::new(scheduler(
        &host,
        vec![test_component(&server, SKIN_ID).with_background(true)],
        Some(Duration::from_secs(3600)),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = scheduler.clone().spawn_background(shutdown_rx);

    tokio::time::sleep(Duration::from_millis(50)).await;
    drop(shutdown_tx);
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("loop stops when the sender is dropped")
        .unwrap();

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_disabled_background_loop_returns_immediately() {
    let server = MockServer::start().await;
    let host = Arc::new(FakeHost::ignoring());
    let scheduler = scheduler(
        &host,
        vec![test_component(&server, SKIN_ID).with_background(true)],
        None,
    );

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::time::timeout(Duration::from_secs(1), scheduler.run_background(shutdown_rx))
        .await
        .expect("disabled loop returns");
}
