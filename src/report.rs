//! Status report builder
//!
//! Turns a registry snapshot into presentation records. This is a pure,
//! synchronous transformation: it never probes. Callers that want fresh
//! data sweep first (see `commands::CommandHandler`).

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::monitors::probe::FailureKind;
use crate::registry::{Health, HealthState, Target};

const LAST_CHECKED_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Point-in-time report across all targets
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusReport {
    pub generated_at: DateTime<Utc>,
    pub online: usize,
    pub offline: usize,
    pub unknown: usize,
    pub entries: Vec<ReportEntry>,
}

/// Presentation record for one target
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReportEntry {
    pub name: String,
    pub endpoint: String,
    pub health: HealthState,
    /// Formatted check time, or "Never"
    pub last_checked: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<ReportDetail>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReportDetail {
    Metrics(MetricsSummary),
    Error(ErrorSummary),
}

/// The fields of an agent payload worth showing
///
/// Payloads are stored unvalidated, so every field is optional here. Numbers
/// sent as strings (e.g. `"42.50"`) are accepted.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MetricsSummary {
    pub hostname: Option<String>,
    pub platform: Option<String>,
    pub uptime_hours: Option<u64>,
    pub memory_used_percent: Option<f64>,
    pub cpu_usage_percent: Option<f64>,
}

impl MetricsSummary {
    pub fn from_payload(payload: &Value) -> Self {
        Self {
            hostname: text_at(payload, &["hostname"]),
            platform: text_at(payload, &["platform"]),
            uptime_hours: number_at(payload, &["uptime"])
                .filter(|secs| *secs >= 0.0)
                .map(|secs| (secs / 3600.0).floor() as u64),
            memory_used_percent: number_at(payload, &["memory", "usedPercentage"]),
            cpu_usage_percent: number_at(payload, &["cpu", "usagePercentage"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorSummary {
    pub kind: FailureKind,
    pub message: String,
}

fn lookup<'a>(payload: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(payload, |value, key| value.get(key))
}

fn text_at(payload: &Value, path: &[&str]) -> Option<String> {
    match lookup(payload, path)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_at(payload: &Value, path: &[&str]) -> Option<f64> {
    match lookup(payload, path)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Builds [`StatusReport`]s
#[derive(Debug, Clone, Copy)]
pub struct ReportBuilder {
    /// Used to phrase timeout errors
    request_timeout: Duration,
}

impl ReportBuilder {
    pub fn new(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }

    pub fn build(&self, targets: &[Target]) -> StatusReport {
        let entries: Vec<ReportEntry> = targets.iter().map(|t| self.entry(t)).collect();
        let count = |state: HealthState| entries.iter().filter(|e| e.health == state).count();

        StatusReport {
            generated_at: Utc::now(),
            online: count(HealthState::Online),
            offline: count(HealthState::Offline),
            unknown: count(HealthState::Unknown),
            entries,
        }
    }

    fn entry(&self, target: &Target) -> ReportEntry {
        let last_checked = target
            .health
            .last_checked()
            .map(|at| at.format(LAST_CHECKED_FORMAT).to_string())
            .unwrap_or_else(|| "Never".to_string());

        let detail = match &target.health {
            Health::Unknown => None,
            Health::Online { metrics, .. } => {
                Some(ReportDetail::Metrics(MetricsSummary::from_payload(metrics)))
            }
            Health::Offline { error, .. } => {
                let message = match error.kind {
                    FailureKind::Timeout => format!(
                        "Server did not respond within {}ms",
                        self.request_timeout.as_millis()
                    ),
                    FailureKind::ConnectionRefused => {
                        "Server is not accepting connections".to_string()
                    }
                    FailureKind::Other => error.detail.clone(),
                };
                Some(ReportDetail::Error(ErrorSummary {
                    kind: error.kind,
                    message,
                }))
            }
        };

        ReportEntry {
            name: target.name.clone(),
            endpoint: target.endpoint.clone(),
            health: target.health.state(),
            last_checked,
            detail,
        }
    }
}
