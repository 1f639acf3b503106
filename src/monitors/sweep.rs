//! Sweeps - probing every registered target
//!
//! [`Monitor`] ties the registry to a prober. Both the scheduled background
//! sweep and the on-demand `status` command go through [`Monitor::sweep`].
//!
//! ## Message Flow
//!
//! ```text
//! snapshot registry → probe all targets concurrently → record each result as it lands → flush once
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, instrument};

use super::probe::Prober;
use crate::registry::{HealthState, Registry, Target, TargetId};

/// Summary of one completed sweep
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SweepSummary {
    /// Number of targets probed (size of the snapshot)
    pub checked: usize,
    pub online: usize,
    pub offline: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Registry plus the prober used to check it
#[derive(Clone)]
pub struct Monitor {
    registry: Arc<Registry>,
    prober: Arc<dyn Prober>,
}

impl Monitor {
    pub fn new(registry: Arc<Registry>, prober: Arc<dyn Prober>) -> Self {
        Self { registry, prober }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Probe every target once and flush the registry a single time
    ///
    /// Targets added after the snapshot is taken are left for the next
    /// sweep. A failing target never stops the others from being checked.
    #[instrument(skip(self))]
    pub async fn sweep(&self) -> SweepSummary {
        let started_at = Utc::now();
        let entries = self.registry.entries().await;
        debug!("sweeping {} servers", entries.len());

        let checks = entries.into_iter().map(|(id, target)| async move {
            let result = self.prober.probe(&target.endpoint).await;
            self.registry.record_result(id, result).await
        });

        let updated: Vec<Target> = join_all(checks).await.into_iter().flatten().collect();

        self.registry.flush().await;

        let online = updated
            .iter()
            .filter(|target| target.health.state() == HealthState::Online)
            .count();

        let summary = SweepSummary {
            checked: updated.len(),
            online,
            offline: updated.len() - online,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            "server status check completed: {} online, {} offline",
            summary.online, summary.offline
        );

        summary
    }

    /// Probe one target and apply the result (with flush)
    #[instrument(skip(self))]
    pub async fn check(&self, id: TargetId) -> Option<Target> {
        let target = self.registry.get(id).await?;
        let result = self.prober.probe(&target.endpoint).await;
        self.registry.apply_result(id, result).await
    }
}
