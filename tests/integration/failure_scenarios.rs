//! Failure classification and recovery through the full pipeline

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use server_status::{
    FailureKind, HealthState, HttpProber, Monitor, Registry, ReportBuilder, Target,
    report::ReportDetail,
    storage::{PersistenceStore, StorageError, StorageResult},
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

/// Store that refuses every write
struct ReadOnlyStore;

#[async_trait]
impl PersistenceStore for ReadOnlyStore {
    async fn load(&self) -> StorageResult<Option<Vec<Target>>> {
        Ok(None)
    }

    async fn save(&self, _targets: &[Target]) -> StorageResult<()> {
        Err(StorageError::BackendError("read-only".to_string()))
    }

    fn describe(&self) -> String {
        "read-only store".to_string()
    }
}

#[tokio::test]
async fn test_slow_agent_is_offline_with_timeout() {
    let slow = spawn_agent(
        ResponseTemplate::new(200)
            .set_body_json(create_status_json("slow", 1.0))
            .set_delay(Duration::from_millis(800)),
    )
    .await;

    let timeout = Duration::from_millis(100);
    let (monitor, _store) = create_monitor(vec![Target::new("slow", slow.uri())], timeout);

    monitor.sweep().await;

    let target = monitor.registry().list().await.remove(0);
    assert_eq!(target.health.state(), HealthState::Offline);
    let error = target.health.error().unwrap();
    assert_eq!(error.kind, FailureKind::Timeout);
    assert!(error.detail.contains("timed out"), "detail: {}", error.detail);

    let report = ReportBuilder::new(timeout).build(&[target]);
    assert_matches!(
        &report.entries[0].detail,
        Some(ReportDetail::Error(e)) if e.message == "Server did not respond within 100ms"
    );
}

#[tokio::test]
async fn test_server_error_is_offline() {
    let broken = spawn_agent(ResponseTemplate::new(500)).await;
    let (monitor, _store) = create_monitor(vec![Target::new("broken", broken.uri())], TEST_TIMEOUT);

    monitor.sweep().await;

    let target = monitor.registry().list().await.remove(0);
    assert_eq!(target.health.state(), HealthState::Offline);
    let error = target.health.error().unwrap();
    assert_eq!(error.kind, FailureKind::Other);
    assert!(error.detail.contains("500"), "detail: {}", error.detail);
}

#[tokio::test]
async fn test_refused_connection_is_offline() {
    let (monitor, _store) =
        create_monitor(vec![Target::new("gone", closed_endpoint())], TEST_TIMEOUT);

    monitor.sweep().await;

    let target = monitor.registry().list().await.remove(0);
    assert_eq!(target.health.state(), HealthState::Offline);
    assert_eq!(target.health.error().unwrap().kind, FailureKind::ConnectionRefused);
    assert!(target.health.metrics().is_none());
}

#[tokio::test]
async fn test_malformed_payload_is_online_without_metrics() {
    let odd = spawn_agent(ResponseTemplate::new(200).set_body_string("I am fine")).await;
    let (monitor, _store) = create_monitor(vec![Target::new("odd", odd.uri())], TEST_TIMEOUT);

    monitor.sweep().await;

    let target = monitor.registry().list().await.remove(0);
    assert_eq!(target.health.state(), HealthState::Online);
    assert!(target.health.error().is_none());

    let report = ReportBuilder::new(TEST_TIMEOUT).build(&[target]);
    assert_matches!(
        &report.entries[0].detail,
        Some(ReportDetail::Metrics(m)) if m.hostname.is_none() && m.cpu_usage_percent.is_none()
    );
}

#[tokio::test]
async fn test_recovery_clears_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(create_status_json("back", 5.0)))
        .mount(&mock_server)
        .await;

    let (monitor, _store) =
        create_monitor(vec![Target::new("flaky", mock_server.uri())], TEST_TIMEOUT);

    monitor.sweep().await;
    let down = monitor.registry().list().await.remove(0);
    assert_eq!(down.health.state(), HealthState::Offline);
    assert!(down.health.metrics().is_none());

    monitor.sweep().await;
    let up = monitor.registry().list().await.remove(0);
    assert_eq!(up.health.state(), HealthState::Online);
    assert!(up.health.error().is_none());
    assert_eq!(up.health.metrics().unwrap()["hostname"], "back");
}

#[tokio::test]
async fn test_one_failure_does_not_abort_sweep() {
    let first = spawn_healthy_agent("first").await;
    let last = spawn_healthy_agent("last").await;

    let (monitor, _store) = create_monitor(
        vec![
            Target::new("first", first.uri()),
            Target::new("invalid", "not a url"),
            Target::new("last", last.uri()),
        ],
        TEST_TIMEOUT,
    );

    let summary = monitor.sweep().await;

    assert_eq!(summary.checked, 3);
    let states: Vec<HealthState> = monitor
        .registry()
        .list()
        .await
        .iter()
        .map(|t| t.health.state())
        .collect();
    assert_eq!(
        states,
        vec![HealthState::Online, HealthState::Offline, HealthState::Online]
    );
}

#[tokio::test]
async fn test_persistence_failure_keeps_memory_state() {
    let web = spawn_healthy_agent("web").await;
    let registry = Arc::new(Registry::restore(Arc::new(ReadOnlyStore)).await);
    registry.add("web", &web.uri()).await.unwrap();

    let monitor = Monitor::new(registry.clone(), Arc::new(HttpProber::new(TEST_TIMEOUT).unwrap()));
    let summary = monitor.sweep().await;

    // default target on localhost plus the added one
    assert_eq!(summary.checked, 2);
    let targets = registry.list().await;
    assert_eq!(targets.len(), 2);
    assert_eq!(targets[1].health.state(), HealthState::Online);
}
