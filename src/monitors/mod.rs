pub mod probe;
pub mod sweep;

pub use probe::{CheckResult, FailureKind, HttpProber, ProbeFailure, Prober};
pub use sweep::{Monitor, SweepSummary};
