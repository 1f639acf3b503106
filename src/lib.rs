pub mod actors;
pub mod agent;
#[cfg(feature = "api")]
pub mod api;
pub mod commands;
pub mod config;
pub mod discord;
pub mod monitors;
pub mod registry;
pub mod report;
pub mod storage;

pub use monitors::{CheckResult, FailureKind, HttpProber, Monitor, ProbeFailure, Prober};
pub use registry::{Health, HealthState, Registry, Target, TargetId, ValidationError};
pub use report::{ReportBuilder, StatusReport};
