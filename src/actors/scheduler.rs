//! SchedulerActor - periodic registry-wide sweeps
//!
//! Runs one sweep per interval for as long as the process lives, independent
//! of any sweep triggered by the `status` command. Unlike a bare timer it can
//! be stopped: send `Shutdown` or drop every handle.
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → Monitor::sweep → registry updated + flushed
//!     ↑
//!     └─── Commands (SweepNow, Shutdown)
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, instrument, warn};

use super::messages::SchedulerCommand;
use crate::monitors::{Monitor, SweepSummary};

/// Actor that sweeps the registry on a fixed interval
pub struct SchedulerActor {
    monitor: Monitor,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<SchedulerCommand>,

    /// Time between sweeps
    interval_duration: Duration,
}

impl SchedulerActor {
    pub fn new(
        monitor: Monitor,
        command_rx: mpsc::Receiver<SchedulerCommand>,
        interval_duration: Duration,
    ) -> Self {
        Self {
            monitor,
            command_rx,
            interval_duration,
        }
    }

    /// Run the actor's main loop
    ///
    /// The first sweep fires one full interval after start. The loop runs
    /// until a Shutdown command is received or the command channel closes.
    #[instrument(skip(self), fields(interval_ms = self.interval_duration.as_millis() as u64))]
    pub async fn run(mut self) {
        debug!("starting scheduler actor");

        let mut ticker = interval_at(
            Instant::now() + self.interval_duration,
            self.interval_duration,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.monitor.sweep().await;
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(SchedulerCommand::SweepNow { respond_to }) => {
                            debug!("received SweepNow command");
                            let summary = self.monitor.sweep().await;
                            let _ = respond_to.send(summary);
                        }

                        Some(SchedulerCommand::Shutdown) => {
                            debug!("received shutdown command");
                            break;
                        }

                        None => {
                            warn!("command channel closed, shutting down");
                            break;
                        }
                    }
                }
            }
        }

        info!("scheduler stopped");
    }
}

/// Handle for controlling a SchedulerActor
///
/// Cloneable; the actor stops once the last handle is dropped.
#[derive(Clone)]
pub struct SchedulerHandle {
    sender: mpsc::Sender<SchedulerCommand>,
}

impl SchedulerHandle {
    /// Spawn the scheduler as a tokio task and return its handle
    pub fn spawn(monitor: Monitor, interval: Duration) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);

        let actor = SchedulerActor::new(monitor, cmd_rx, interval);
        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Run a sweep right now and wait for its summary
    pub async fn sweep_now(&self) -> Result<SweepSummary> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SchedulerCommand::SweepNow { respond_to: tx })
            .await
            .context("failed to send SweepNow command")?;

        rx.await.context("failed to receive sweep summary")
    }

    /// Gracefully shut down the scheduler
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(SchedulerCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }

    /// Whether the actor has exited
    pub fn is_stopped(&self) -> bool {
        self.sender.is_closed()
    }
}
