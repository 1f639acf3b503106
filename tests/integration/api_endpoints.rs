//! Command API tests driven through the router without binding a socket

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::Value;
use server_status::{
    HealthState, ReportBuilder, Target,
    api::{ApiState, router},
    commands::CommandHandler,
};
use tower::ServiceExt;

use crate::helpers::*;

fn app(targets: Vec<Target>) -> (Router, CommandHandler) {
    let (monitor, _store) = create_monitor(targets, TEST_TIMEOUT);
    let commands = CommandHandler::new(monitor, ReportBuilder::new(TEST_TIMEOUT));
    (router(ApiState::new(commands.clone())), commands)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = app(Vec::new());

    let (status, body) = send(app, get("/api/v1/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_list_servers_does_not_probe() {
    let web = spawn_healthy_agent("web").await;
    let (app, _) = app(vec![Target::new("web", web.uri())]);

    let (status, body) = send(app, get("/api/v1/servers")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["servers"][0]["name"], "web");
    assert_eq!(body["servers"][0]["status"], "unknown");
    assert!(web.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_status_sweeps_and_reports() {
    let web = spawn_healthy_agent("web").await;
    let (app, _) = app(vec![
        Target::new("web", web.uri()),
        Target::new("gone", closed_endpoint()),
    ]);

    let (status, body) = send(app, get("/api/v1/status")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["online"], 1);
    assert_eq!(body["offline"], 1);
    assert_eq!(body["entries"][0]["health"], "online");
    assert_eq!(body["entries"][0]["detail"]["type"], "metrics");
    assert_eq!(body["entries"][1]["detail"]["type"], "error");
    assert_eq!(web.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_status_discord_message() {
    let web = spawn_healthy_agent("web").await;
    let (app, _) = app(vec![Target::new("web", web.uri())]);

    let (status, body) = send(app, get("/api/v1/status/discord")).await;

    assert_eq!(status, StatusCode::OK);
    let embeds = body["embeds"].as_array().unwrap();
    assert_eq!(embeds.len(), 1);
    assert!(embeds[0]["title"].as_str().unwrap().contains("web"));
}

#[tokio::test]
async fn test_add_server_created() {
    let (app, commands) = app(Vec::new());

    let (status, body) = send(
        app,
        post_json(
            "/api/v1/servers",
            r#"{"name": "db", "url": "http://10.0.0.2:4120"}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "db");
    assert_eq!(body["url"], "http://10.0.0.2:4120");
    assert_eq!(body["status"], "unknown");

    let targets = commands.monitor().registry().list().await;
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].name, "db");
}

#[tokio::test]
async fn test_add_server_accepts_endpoint_alias() {
    let (app, commands) = app(Vec::new());

    let (status, _) = send(
        app,
        post_json(
            "/api/v1/servers",
            r#"{"name": "db", "endpoint": "http://10.0.0.2:4120"}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(commands.monitor().registry().len().await, 1);
}

#[tokio::test]
async fn test_add_server_blank_name_rejected() {
    let (app, commands) = app(vec![Target::new("web", "http://10.0.0.1:4120")]);

    let (status, body) = send(
        app,
        post_json("/api/v1/servers", r#"{"name": "  ", "url": "http://10.0.0.2:4120"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(commands.monitor().registry().len().await, 1);
}

#[tokio::test]
async fn test_add_server_missing_url_rejected() {
    let (app, commands) = app(Vec::new());

    let (status, _) = send(app, post_json("/api/v1/servers", r#"{"name": "db"}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(commands.monitor().registry().len().await, 0);
}

#[tokio::test]
async fn test_added_server_is_checked_in_background() {
    let web = spawn_healthy_agent("web").await;
    let (app, commands) = app(Vec::new());

    let body = format!(r#"{{"name": "web", "url": "{}"}}"#, web.uri());
    let (status, _) = send(app, post_json("/api/v1/servers", &body)).await;
    assert_eq!(status, StatusCode::CREATED);

    let registry = commands.monitor().registry().clone();
    let mut state = HealthState::Unknown;
    for _ in 0..50 {
        state = registry.list().await[0].health.state();
        if state != HealthState::Unknown {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    assert_eq!(state, HealthState::Online);
}
