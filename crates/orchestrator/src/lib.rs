//! Subscription and conversation core for Agent Hub.
//!
//! This crate keeps a user's subscribed agents, their chat transcripts and
//! the state of each in-flight chat turn consistent with each other.
//!
//! # Architecture
//!
//! ```text
//! caller
//!   ↓
//! ┌──────────────────────────────────────────────────────────┐
//! │                  SESSION ORCHESTRATOR                    │
//! │                                                          │
//! │  1. Ledger admits the (user, agent) pair                 │
//! │         ↓                                                │
//! │  2. Store appends the user message                       │
//! │         ↓                                                │
//! │  3. Reply generator (timeout, cancellable)               │
//! │         ↓                                                │
//! │  4. Ledger re-admits, store appends the agent message    │
//! └──────────────────────────────────────────────────────────┘
//!   ↓
//! Settled (user, agent messages) | Failed (user message kept)
//! ```
//!
//! Storage sits behind the traits in [`repository`], with an in-memory and
//! a SQLite backend.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use mock_brain::EchoBrain;
//! use orchestrator::repository::MemoryBackend;
//! use orchestrator::seed::seed_catalog;
//! use orchestrator::AgentHub;
//!
//! #[tokio::main]
//! async fn main() -> orchestrator::Result<()> {
//!     let hub = AgentHub::new(Arc::new(MemoryBackend::new()), Arc::new(EchoBrain::new()));
//!     seed_catalog(hub.catalog()).await?;
//!
//!     let agent = &hub.catalog().marketplace(None, Some("tagline")).await?[0];
//!     hub.subscribe("user-1", agent.id).await?;
//!
//!     let outcome = hub.submit("user-1", agent.id, "Write a tagline").await?;
//!     assert!(outcome.is_settled());
//!     Ok(())
//! }
//! ```

pub mod api_keys;
pub mod catalog;
pub mod config;
pub mod conversation;
pub mod error;
mod hub;
pub mod ledger;
pub mod locks;
pub mod model;
pub mod permissions;
pub mod repository;
pub mod seed;
pub mod session;
pub mod users;

pub use api_keys::ApiKeyRegistry;
pub use catalog::{AgentTestReport, Catalog};
pub use config::{BrainKind, HubConfig, StorageBackend};
pub use conversation::{format_record, ConversationStore, History};
pub use error::{OrchestratorError, Result};
pub use hub::AgentHub;
pub use ledger::{Admission, SubscriptionLedger};
pub use model::{
    Agent, AgentDraft, AgentId, AgentStatus, ApiKey, ConversationKey, HubStats, Message, Plan,
    Sender, SubscriptionRecord, User,
};
pub use permissions::{authorize, can, Action, Resource, Role};
pub use session::{FailureReason, SessionOrchestrator, TurnOutcome, TurnSnapshot, TurnState};
pub use users::UserDirectory;
