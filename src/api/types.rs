//! API request and response types

use serde::{Deserialize, Serialize};

use crate::registry::{HealthState, Target};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// Body of `POST /api/v1/servers`
///
/// Missing fields deserialize as empty strings so they are rejected by
/// registry validation with a 400, like blank ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddServerRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "endpoint")]
    pub url: String,
}

/// One server as listed by the API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerInfo {
    pub name: String,
    pub url: String,
    pub status: HealthState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Target> for ServerInfo {
    fn from(target: &Target) -> Self {
        Self {
            name: target.name.clone(),
            url: target.endpoint.clone(),
            status: target.health.state(),
            last_checked: target.health.last_checked().map(|at| at.to_rfc3339()),
            error: target.health.error().map(|e| e.detail.clone()),
        }
    }
}

/// Server list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServersResponse {
    pub servers: Vec<ServerInfo>,
    pub count: usize,
}
