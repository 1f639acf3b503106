//! Server registry endpoints

use axum::{Json, extract::State, http::StatusCode};
use tracing::info;

use crate::api::{
    error::ApiResult,
    state::ApiState,
    types::{AddServerRequest, ServerInfo, ServersResponse},
};

/// GET /api/v1/servers
///
/// List all monitored servers with their last known state
pub async fn list_servers(State(state): State<ApiState>) -> Json<ServersResponse> {
    let targets = state.commands.monitor().registry().list().await;
    let servers: Vec<ServerInfo> = targets.iter().map(ServerInfo::from).collect();

    Json(ServersResponse {
        count: servers.len(),
        servers,
    })
}

/// POST /api/v1/servers
///
/// Register a server; blank name or url is a 400
pub async fn add_server(
    State(state): State<ApiState>,
    Json(request): Json<AddServerRequest>,
) -> ApiResult<(StatusCode, Json<ServerInfo>)> {
    let target = state
        .commands
        .add_server(&request.name, &request.url)
        .await?;

    info!("added server: {} ({})", target.name, target.endpoint);

    Ok((StatusCode::CREATED, Json(ServerInfo::from(&target))))
}
