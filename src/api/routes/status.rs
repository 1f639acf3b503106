//! Status report endpoints

use axum::{Json, extract::State};

use crate::{
    api::state::ApiState,
    discord::{self, Message},
    report::StatusReport,
};

/// GET /api/v1/status
///
/// Sweeps every server, then returns the structured report
pub async fn get_status(State(state): State<ApiState>) -> Json<StatusReport> {
    Json(state.commands.status().await)
}

/// GET /api/v1/status/discord
///
/// Same sweep, rendered as a Discord message payload
pub async fn get_status_discord(State(state): State<ApiState>) -> Json<Message> {
    let report = state.commands.status().await;
    Json(discord::status_message(&report))
}
