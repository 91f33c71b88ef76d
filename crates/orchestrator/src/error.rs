//! Error types for orchestrator operations.

use brain_core::BrainError;
use database::DatabaseError;
use thiserror::Error;

use crate::model::AgentId;
use crate::permissions::{Action, Resource, Role};

/// Errors surfaced by the catalog, ledger, store and session orchestrator.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The caller sent something unusable (empty message, bad field).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The user has no active subscription to the agent.
    #[error("user {user_id} is not subscribed to agent {agent_id}")]
    NotSubscribed { user_id: String, agent_id: AgentId },

    /// An active subscription already exists.
    #[error("user {user_id} is already subscribed to agent {agent_id}")]
    AlreadySubscribed { user_id: String, agent_id: AgentId },

    /// Unknown (or inactive) record.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Reply generation failed.
    #[error("reply generator error: {0}")]
    ReplyGenerator(#[from] BrainError),

    /// A concurrent update won; re-read state and retry the operation.
    #[error("concurrent update conflict: {0}")]
    ConcurrencyConflict(String),

    /// There is no failed turn to retry, or no turn awaiting reply to cancel.
    #[error("no pending turn for user {user_id} and agent {agent_id}")]
    NoPendingTurn { user_id: String, agent_id: AgentId },

    /// The caller's role does not allow the operation.
    #[error("{role} may not {action:?} {resource:?}")]
    Forbidden {
        role: Role,
        resource: Resource,
        action: Action,
    },

    /// Storage backend failure.
    #[error("storage error: {0}")]
    Database(#[from] DatabaseError),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A stored record could not be mapped to a domain value.
    #[error("invalid stored record: {0}")]
    InvalidRecord(String),
}

impl OrchestratorError {
    pub(crate) fn agent_not_found(agent_id: AgentId) -> Self {
        OrchestratorError::NotFound {
            entity: "Agent",
            id: agent_id.to_string(),
        }
    }
}

/// Result type for orchestrator operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;
