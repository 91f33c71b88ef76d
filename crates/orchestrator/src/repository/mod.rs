//! Storage interface and its backends.
//!
//! The catalog, ledger and conversation store never talk to a database
//! directly. They go through these traits, so the same business logic runs
//! against the in-memory backend (tests, demos) or the SQLite backend.
//! Backends report domain errors (`AlreadySubscribed`,
//! `ConcurrencyConflict`, ...) rather than driver errors where the meaning
//! is known.

mod memory;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::{
    Agent, AgentDraft, AgentId, AgentStatus, ApiKey, ConversationKey, HubStats, Message, Plan,
    Sender, SubscriptionRecord, User,
};
use crate::permissions::Role;

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

/// Agent catalog storage.
#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// Store a validated draft and return the new agent.
    async fn insert_agent(&self, draft: &AgentDraft, prompt_hash: &str) -> Result<Agent>;

    /// Get an agent by ID, regardless of status.
    async fn get_agent(&self, id: AgentId) -> Result<Option<Agent>>;

    /// List agents ordered by name; `active_only` hides inactive ones.
    async fn list_agents(&self, active_only: bool) -> Result<Vec<Agent>>;

    /// Change an agent's status. Fails with `NotFound` for unknown IDs.
    async fn set_agent_status(&self, id: AgentId, status: AgentStatus) -> Result<()>;
}

/// Subscription ledger storage.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Insert an active row. Fails with `AlreadySubscribed` if one exists.
    async fn insert_subscription(
        &self,
        key: &ConversationKey,
        created_at: DateTime<Utc>,
    ) -> Result<SubscriptionRecord>;

    /// The active row for a pair, if any.
    async fn active_subscription(&self, key: &ConversationKey)
        -> Result<Option<SubscriptionRecord>>;

    /// Deactivate a row if its version still matches.
    ///
    /// Fails with `ConcurrencyConflict` otherwise.
    async fn deactivate_subscription(
        &self,
        id: i64,
        expected_version: i64,
        ended_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Agents with an active subscription for the user, earliest
    /// subscription first.
    async fn subscribed_agents(&self, user_id: &str) -> Result<Vec<Agent>>;

    /// Every row for a pair, oldest first.
    async fn subscription_history(&self, key: &ConversationKey) -> Result<Vec<SubscriptionRecord>>;
}

/// Conversation log storage.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Append a message with the next sequence number.
    ///
    /// The stored timestamp is never earlier than the conversation's latest.
    async fn append_message(
        &self,
        key: &ConversationKey,
        sender: Sender,
        content: &str,
        at: DateTime<Utc>,
    ) -> Result<Message>;

    /// Up to `limit` messages with `seq > after_seq`, ascending.
    async fn message_page(
        &self,
        key: &ConversationKey,
        after_seq: i64,
        limit: usize,
    ) -> Result<Vec<Message>>;

    /// The latest `limit` messages, ascending.
    async fn recent_messages(&self, key: &ConversationKey, limit: usize) -> Result<Vec<Message>>;

    /// Number of messages in a conversation (equal to its highest `seq`).
    async fn message_count(&self, key: &ConversationKey) -> Result<i64>;
}

/// User directory storage.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Register a user if unknown; returns the stored user.
    async fn ensure_user(&self, id: &str, name: &str, email: &str) -> Result<User>;

    async fn get_user(&self, id: &str) -> Result<Option<User>>;

    async fn list_users(&self) -> Result<Vec<User>>;

    /// Fails with `NotFound` for unknown users.
    async fn update_user_access(&self, id: &str, role: Role, plan: Plan) -> Result<()>;
}

/// Provider API key storage.
#[async_trait]
pub trait ApiKeyRepository: Send + Sync {
    async fn insert_api_key(
        &self,
        name: &str,
        provider: &str,
        secret: &str,
        description: &str,
    ) -> Result<ApiKey>;

    /// Newest first.
    async fn list_api_keys(&self) -> Result<Vec<ApiKey>>;

    async fn set_api_key_active(&self, id: i64, active: bool) -> Result<()>;

    async fn delete_api_key(&self, id: i64) -> Result<()>;
}

/// Dashboard aggregates.
#[async_trait]
pub trait StatsRepository: Send + Sync {
    async fn stats(&self) -> Result<HubStats>;
}

/// A complete storage backend.
pub trait Backend:
    AgentRepository
    + SubscriptionRepository
    + MessageRepository
    + UserRepository
    + ApiKeyRepository
    + StatsRepository
{
    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Shared handle to a backend.
pub type SharedBackend = Arc<dyn Backend>;
