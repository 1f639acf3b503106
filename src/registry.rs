//! Target registry
//!
//! The registry owns every monitored [`Target`] and its last-known health.
//! It is shared as an `Arc<Registry>` between the scheduler, the command
//! surface and the report builder; callers only ever get cloned snapshots.
//!
//! Every mutation (`add`, `apply_result`) is applied under a single write
//! lock acquisition, so no reader ever observes a half-updated target.
//! Mutations are followed by a flush to the [`PersistenceStore`]. Flushes
//! are best-effort: failures are logged and in-memory state stays the
//! source of truth.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::monitors::probe::{CheckResult, FailureKind, ProbeFailure};
use crate::storage::PersistenceStore;

pub const DEFAULT_TARGET_NAME: &str = "Main Server";
pub const DEFAULT_TARGET_ENDPOINT: &str = "http://localhost:24444";

/// Coarse health state, as persisted and presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Unknown,
    Online,
    Offline,
}

impl HealthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Unknown => "unknown",
            HealthState::Online => "online",
            HealthState::Offline => "offline",
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last-known health of a target
///
/// Metrics and error are carried by the variant, so a target can never hold
/// both, and a check timestamp exists exactly when a check has happened.
#[derive(Debug, Clone, PartialEq)]
pub enum Health {
    /// Registered but never checked
    Unknown,

    Online {
        checked_at: DateTime<Utc>,
        metrics: Value,
    },

    Offline {
        checked_at: DateTime<Utc>,
        error: ProbeFailure,
    },
}

impl Health {
    pub fn state(&self) -> HealthState {
        match self {
            Health::Unknown => HealthState::Unknown,
            Health::Online { .. } => HealthState::Online,
            Health::Offline { .. } => HealthState::Offline,
        }
    }

    pub fn last_checked(&self) -> Option<DateTime<Utc>> {
        match self {
            Health::Unknown => None,
            Health::Online { checked_at, .. } | Health::Offline { checked_at, .. } => {
                Some(*checked_at)
            }
        }
    }

    pub fn metrics(&self) -> Option<&Value> {
        match self {
            Health::Online { metrics, .. } => Some(metrics),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ProbeFailure> {
        match self {
            Health::Offline { error, .. } => Some(error),
            _ => None,
        }
    }

    /// The state reached by applying `result` at time `now`
    ///
    /// Success always lands in `Online`, failure always in `Offline`,
    /// whatever the previous state was.
    pub fn transition(&self, result: CheckResult, now: DateTime<Utc>) -> Health {
        // wall clock may step backwards; keep last_checked non-decreasing
        let checked_at = self.last_checked().map_or(now, |previous| previous.max(now));

        match result {
            CheckResult::Success { metrics } => Health::Online {
                checked_at,
                metrics,
            },
            CheckResult::Failure(error) => Health::Offline { checked_at, error },
        }
    }
}

/// A monitored host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TargetRecord", into = "TargetRecord")]
pub struct Target {
    pub name: String,
    pub endpoint: String,
    pub health: Health,
}

impl Target {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            health: Health::Unknown,
        }
    }

    pub fn default_target() -> Self {
        Self::new(DEFAULT_TARGET_NAME, DEFAULT_TARGET_ENDPOINT)
    }
}

/// On-disk shape of a target
///
/// Field names follow the established `servers.json` layout. `errorKind`
/// is additive; documents without it are classified from the error text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TargetRecord {
    name: String,
    url: String,
    status: HealthState,
    last_checked: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_kind: Option<FailureKind>,
}

impl From<Target> for TargetRecord {
    fn from(target: Target) -> Self {
        let status = target.health.state();
        let last_checked = target.health.last_checked();
        let (data, error, error_kind) = match target.health {
            Health::Unknown => (None, None, None),
            Health::Online { metrics, .. } => (Some(metrics), None, None),
            Health::Offline { error, .. } => (None, Some(error.detail), Some(error.kind)),
        };

        TargetRecord {
            name: target.name,
            url: target.endpoint,
            status,
            last_checked,
            data,
            error,
            error_kind,
        }
    }
}

impl From<TargetRecord> for Target {
    fn from(record: TargetRecord) -> Self {
        let health = match (record.status, record.last_checked) {
            (HealthState::Online, Some(checked_at)) => Health::Online {
                checked_at,
                metrics: record.data.unwrap_or(Value::Null),
            },
            (HealthState::Offline, Some(checked_at)) => {
                let detail = record.error.unwrap_or_else(|| "unknown error".to_string());
                let kind = record
                    .error_kind
                    .unwrap_or_else(|| FailureKind::classify(&detail));
                Health::Offline {
                    checked_at,
                    error: ProbeFailure::new(kind, detail),
                }
            }
            (HealthState::Unknown, _) => Health::Unknown,
            (state, None) => {
                warn!(
                    "target '{}' is {state} without a check time, treating as unknown",
                    record.name
                );
                Health::Unknown
            }
        };

        Target {
            name: record.name,
            endpoint: record.url,
            health,
        }
    }
}

/// Rejected input to [`Registry::add`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyName,
    EmptyEndpoint,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyName => write!(f, "server name must not be empty"),
            ValidationError::EmptyEndpoint => write!(f, "server URL must not be empty"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Stable handle to a registered target (its insertion position)
///
/// Targets are never removed, so an id stays valid for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(usize);

impl TargetId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Ordered, persisted collection of targets
pub struct Registry {
    targets: RwLock<Vec<Target>>,

    store: Arc<dyn PersistenceStore>,

    /// Serializes flushes so an older snapshot never overwrites a newer one
    flush_lock: Mutex<()>,
}

impl Registry {
    /// Construct a registry around existing targets without touching the store
    pub fn new(targets: Vec<Target>, store: Arc<dyn PersistenceStore>) -> Self {
        Self {
            targets: RwLock::new(targets),
            store,
            flush_lock: Mutex::new(()),
        }
    }

    /// Restore the registry from the store
    ///
    /// An absent or empty document yields the default target, which is
    /// persisted immediately. An unreadable document is logged and left
    /// untouched on disk until the next mutation.
    #[instrument(skip(store))]
    pub async fn restore(store: Arc<dyn PersistenceStore>) -> Self {
        let location = store.describe();

        match store.load().await {
            Ok(Some(targets)) if !targets.is_empty() => {
                info!("loaded {} servers from {location}", targets.len());
                Self::new(targets, store)
            }
            Ok(_) => {
                let registry = Self::new(vec![Target::default_target()], store);
                registry.flush().await;
                info!("created new servers file at {location}");
                registry
            }
            Err(e) => {
                error!("error loading servers from {location}: {e}");
                Self::new(vec![Target::default_target()], store)
            }
        }
    }

    /// Register a new target in `Unknown` state and flush
    #[instrument(skip(self))]
    pub async fn add(&self, name: &str, endpoint: &str) -> Result<(TargetId, Target), ValidationError> {
        let name = name.trim();
        let endpoint = endpoint.trim();

        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if endpoint.is_empty() {
            return Err(ValidationError::EmptyEndpoint);
        }

        let target = Target::new(name, endpoint);
        let id = {
            let mut targets = self.targets.write().await;
            targets.push(target.clone());
            TargetId(targets.len() - 1)
        };

        debug!("added server {name} ({endpoint}) as {id}");
        self.flush().await;

        Ok((id, target))
    }

    /// Snapshot of all targets in insertion order
    pub async fn list(&self) -> Vec<Target> {
        self.targets.read().await.clone()
    }

    /// Snapshot of all targets together with their ids
    pub async fn entries(&self) -> Vec<(TargetId, Target)> {
        self.targets
            .read()
            .await
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, target)| (TargetId(index), target))
            .collect()
    }

    pub async fn get(&self, id: TargetId) -> Option<Target> {
        self.targets.read().await.get(id.0).cloned()
    }

    pub async fn len(&self) -> usize {
        self.targets.read().await.len()
    }

    /// Apply a check outcome without flushing
    ///
    /// Returns the updated target, or `None` for an unknown id.
    pub async fn record_result(&self, id: TargetId, result: CheckResult) -> Option<Target> {
        let mut targets = self.targets.write().await;
        let Some(target) = targets.get_mut(id.0) else {
            warn!("result for unknown target {id} dropped");
            return None;
        };

        let previous = target.health.state();
        target.health = target.health.transition(result, Utc::now());
        trace!(
            "{}: {previous} -> {}",
            target.name,
            target.health.state()
        );

        Some(target.clone())
    }

    /// Apply a check outcome and flush
    pub async fn apply_result(&self, id: TargetId, result: CheckResult) -> Option<Target> {
        let updated = self.record_result(id, result).await;
        if updated.is_some() {
            self.flush().await;
        }
        updated
    }

    /// Write the current collection to the store (best-effort)
    pub async fn flush(&self) {
        let _guard = self.flush_lock.lock().await;
        let snapshot = self.list().await;

        match self.store.save(&snapshot).await {
            Ok(()) => debug!(
                "saved {} servers to {}",
                snapshot.len(),
                self.store.describe()
            ),
            Err(e) => error!(
                "error saving servers to {}: {e}",
                self.store.describe()
            ),
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("store", &self.store.describe())
            .finish_non_exhaustive()
    }
}
