//! Application state shared across handlers.

use orchestrator::AgentHub;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Catalog, ledger, conversations and sessions.
    pub hub: AgentHub,
}

impl AppState {
    /// Create new application state.
    pub fn new(hub: AgentHub) -> Self {
        Self { hub }
    }
}
