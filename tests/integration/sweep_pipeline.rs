//! End-to-end sweep tests against fake agents
//!
//! These tests verify that:
//! - A sweep probes every target and records each outcome
//! - The registry is flushed exactly once per sweep
//! - Steady online targets keep the latest payload
//! - Targets added mid-sweep wait for the next sweep

use std::time::Duration;

use server_status::{
    FailureKind, HealthState, ReportBuilder, Target,
    actors::scheduler::SchedulerHandle,
    report::ReportDetail,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

#[tokio::test]
async fn test_sweep_updates_every_target() {
    let web = spawn_healthy_agent("web-1").await;
    let db = spawn_healthy_agent("db-1").await;

    let (monitor, store) = create_monitor(
        vec![
            Target::new("web", web.uri()),
            Target::new("gone", closed_endpoint()),
            Target::new("db", db.uri()),
        ],
        TEST_TIMEOUT,
    );

    let summary = monitor.sweep().await;

    assert_eq!(summary.checked, 3);
    assert_eq!(summary.online, 2);
    assert_eq!(summary.offline, 1);
    assert_eq!(store.save_count(), 1, "one flush per sweep");

    let targets = monitor.registry().list().await;
    assert_eq!(targets[0].health.state(), HealthState::Online);
    assert_eq!(
        targets[0].health.metrics().unwrap()["hostname"],
        "web-1"
    );
    assert_eq!(
        targets[1].health.error().map(|e| e.kind),
        Some(FailureKind::ConnectionRefused)
    );
    assert_eq!(targets[2].health.state(), HealthState::Online);

    assert_eq!(store.snapshot().unwrap(), targets);
}

#[tokio::test]
async fn test_report_after_sweep() {
    let web = spawn_healthy_agent("web-1").await;
    let (monitor, _store) = create_monitor(
        vec![
            Target::new("web", web.uri()),
            Target::new("gone", closed_endpoint()),
        ],
        TEST_TIMEOUT,
    );

    monitor.sweep().await;
    let report = ReportBuilder::new(TEST_TIMEOUT).build(&monitor.registry().list().await);

    assert_eq!(report.online, 1);
    assert_eq!(report.offline, 1);
    match &report.entries[0].detail {
        Some(ReportDetail::Metrics(metrics)) => {
            assert_eq!(metrics.hostname.as_deref(), Some("web-1"));
            assert_eq!(metrics.uptime_hours, Some(2));
            assert_eq!(metrics.cpu_usage_percent, Some(12.5));
        }
        other => panic!("expected metrics, got {other:?}"),
    }
    match &report.entries[1].detail {
        Some(ReportDetail::Error(error)) => {
            assert_eq!(error.message, "Server is not accepting connections");
        }
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_steady_online_keeps_latest_payload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(create_status_json("host", 10.0)))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(create_status_json("host", 90.0)))
        .mount(&mock_server)
        .await;

    let (monitor, _store) =
        create_monitor(vec![Target::new("host", mock_server.uri())], TEST_TIMEOUT);

    monitor.sweep().await;
    let first = monitor.registry().list().await.remove(0);
    assert_eq!(first.health.state(), HealthState::Online);
    assert_eq!(first.health.metrics().unwrap()["cpu"]["usagePercentage"], 10.0);

    monitor.sweep().await;
    let second = monitor.registry().list().await.remove(0);
    assert_eq!(second.health.state(), HealthState::Online);
    assert_eq!(second.health.metrics().unwrap()["cpu"]["usagePercentage"], 90.0);
    assert!(second.health.last_checked() >= first.health.last_checked());
}

#[tokio::test]
async fn test_target_added_mid_sweep_waits_for_next_sweep() {
    let slow = spawn_agent(
        ResponseTemplate::new(200)
            .set_body_json(create_status_json("slow", 1.0))
            .set_delay(Duration::from_millis(300)),
    )
    .await;
    let fast = spawn_healthy_agent("fast").await;

    let (monitor, _store) = create_monitor(vec![Target::new("slow", slow.uri())], TEST_TIMEOUT);

    let sweeping = {
        let monitor = monitor.clone();
        tokio::spawn(async move { monitor.sweep().await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    monitor.registry().add("fast", &fast.uri()).await.unwrap();

    let summary = sweeping.await.unwrap();
    assert_eq!(summary.checked, 1);

    let targets = monitor.registry().list().await;
    assert_eq!(targets[0].health.state(), HealthState::Online);
    assert_eq!(targets[1].health.state(), HealthState::Unknown);

    monitor.sweep().await;
    assert_eq!(
        monitor.registry().list().await[1].health.state(),
        HealthState::Online
    );
}

#[tokio::test]
async fn test_scheduler_sweep_hits_agents() {
    let web = spawn_healthy_agent("web-1").await;
    let (monitor, store) = create_monitor(vec![Target::new("web", web.uri())], TEST_TIMEOUT);

    let handle = SchedulerHandle::spawn(monitor.clone(), Duration::from_secs(3600));
    let summary = handle.sweep_now().await.unwrap();

    assert_eq!(summary.online, 1);
    assert_eq!(web.received_requests().await.unwrap().len(), 1);
    assert_eq!(store.save_count(), 1);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_scheduler_runs_on_interval() {
    let web = spawn_healthy_agent("web-1").await;
    let (monitor, _store) = create_monitor(vec![Target::new("web", web.uri())], TEST_TIMEOUT);

    let handle = SchedulerHandle::spawn(monitor.clone(), Duration::from_millis(100));

    tokio::time::sleep(Duration::from_millis(450)).await;
    handle.shutdown().await.unwrap();

    let requests = web.received_requests().await.unwrap().len();
    assert!(
        (2..=5).contains(&requests),
        "expected a handful of scheduled sweeps, got {requests}"
    );
    assert_eq!(
        monitor.registry().list().await[0].health.state(),
        HealthState::Online
    );
}
