//! Message types for actor communication
//!
//! Commands are request/response messages sent to a specific actor via mpsc,
//! with a oneshot channel for the reply where one is needed.

use tokio::sync::oneshot;

use crate::monitors::SweepSummary;

/// Commands that can be sent to the SchedulerActor
#[derive(Debug)]
pub enum SchedulerCommand {
    /// Run a sweep immediately (bypassing the interval timer)
    ///
    /// Used for testing and manual refresh operations. The regular
    /// schedule is not reset.
    SweepNow {
        /// Channel to send the result back
        respond_to: oneshot::Sender<SweepSummary>,
    },

    /// Gracefully shut down the scheduler
    ///
    /// The actor will finish any in-flight sweep and then exit.
    Shutdown,
}
