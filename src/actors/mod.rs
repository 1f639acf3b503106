//! Actor-based scheduling
//!
//! Long-running background work runs as an independent async task that is
//! controlled through a cloneable handle over a Tokio channel.
//!
//! ## Actor Types
//!
//! - **SchedulerActor**: Sweeps the whole registry at a fixed interval
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: Each actor has an mpsc command channel for control messages
//! 2. **Request/Response**: oneshot channels for synchronous queries

pub mod messages;
pub mod scheduler;
