//! API shared state

use crate::commands::CommandHandler;

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Executes `status` / `add-server` against the shared registry
    pub commands: CommandHandler,
}

impl ApiState {
    pub fn new(commands: CommandHandler) -> Self {
        Self { commands }
    }
}
