//! Local metrics provider
//!
//! What a monitored host serves at `GET /status`. The `status-agent` binary
//! wraps [`HostStatus::collect`] in a rocket route; the monitor reads the
//! payload through [`crate::report::MetricsSummary`].

use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sysinfo::System;

const AGENT_PORT: &str = "PORT";
const AGENT_ADDR: &str = "AGENT_ADDR";

pub const DEFAULT_AGENT_PORT: u16 = 4120;
pub const DEFAULT_AGENT_ADDR: Ipv4Addr = Ipv4Addr::UNSPECIFIED;

/// Where the agent listens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentSettings {
    pub port: u16,
    pub addr: Ipv4Addr,
}

impl AgentSettings {
    /// Read `PORT` / `AGENT_ADDR`, falling back to defaults on absent or bad values
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            port: lookup(AGENT_PORT)
                .and_then(|port| port.trim().parse().ok())
                .unwrap_or(DEFAULT_AGENT_PORT),
            addr: lookup(AGENT_ADDR)
                .and_then(|addr| addr.trim().parse().ok())
                .unwrap_or(DEFAULT_AGENT_ADDR),
        }
    }
}

/// The `/status` payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostStatus {
    /// Always "online" when served
    pub status: String,
    pub hostname: String,
    pub platform: String,
    /// Seconds since boot
    pub uptime: u64,
    pub memory: MemoryStatus,
    pub cpu: CpuStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStatus {
    pub total: u64,
    pub free: u64,
    pub used_percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CpuStatus {
    pub model: String,
    pub cores: usize,
    pub usage_percentage: f64,
}

/// Round to two decimals
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage of `total` in use when `free` is left; 0 for an empty total
pub fn used_percentage(total: u64, free: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(total.saturating_sub(free) as f64 / total as f64 * 100.0)
}

impl HostStatus {
    /// Sample the local machine
    ///
    /// Blocks for `sysinfo::MINIMUM_CPU_UPDATE_INTERVAL` so CPU usage has two
    /// samples to compare; call from a blocking context.
    pub fn collect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_cpu_usage();

        let total = sys.total_memory();
        let free = sys.available_memory();

        let cpus = sys.cpus();
        let model = cpus
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .unwrap_or_default();

        HostStatus {
            status: "online".to_string(),
            hostname: System::host_name().unwrap_or_else(|| "unknown".to_string()),
            platform: std::env::consts::OS.to_string(),
            uptime: System::uptime(),
            memory: MemoryStatus {
                total,
                free,
                used_percentage: used_percentage(total, free),
            },
            cpu: CpuStatus {
                model,
                cores: cpus.len(),
                usage_percentage: round2(sys.global_cpu_usage() as f64),
            },
            timestamp: Utc::now(),
        }
    }
}
