//! HTTP command API
//!
//! Exposes the command surface over HTTP so a chat integration (or curl)
//! can drive the monitor.
//!
//! ## Endpoints
//!
//! - `GET /api/v1/health` - Health check
//! - `GET /api/v1/status` - Sweep all servers, return the report
//! - `GET /api/v1/status/discord` - Sweep all servers, return a Discord message
//! - `GET /api/v1/servers` - Last known state, no probing
//! - `POST /api/v1/servers` - Add a server (`{"name": ..., "url": ...}`)

pub mod error;
pub mod routes;
pub mod state;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;
pub use types::{AddServerRequest, HealthResponse, ServerInfo, ServersResponse};

use std::net::SocketAddr;

use axum::{
    Router,
    routing::get,
};
use tower_http::trace::TraceLayer;
use tracing::info;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "127.0.0.1:8080")
    pub bind_addr: SocketAddr,
}


/// Build the router with all routes
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/status", get(routes::status::get_status))
        .route(
            "/api/v1/status/discord",
            get(routes::status::get_status_discord),
        )
        .route(
            "/api/v1/servers",
            get(routes::servers::list_servers).post(routes::servers::add_server),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Spawn the API server
///
/// This starts an Axum HTTP server in a background task.
/// Returns the server's local address.
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind_addr);

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
