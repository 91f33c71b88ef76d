//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An agent persona in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Agent {
    /// Auto-incrementing ID.
    pub id: i64,
    pub name: String,
    /// Marketplace category (e.g., "Copywriting").
    pub category: String,
    pub description: String,
    /// Monthly price.
    pub price: f64,
    /// Icon reference understood by the front-end.
    pub icon: String,
    pub system_prompt: String,
    pub welcome_message: String,
    /// Example dialogues as a JSON array.
    pub examples: String,
    pub temperature: f64,
    pub max_tokens: i64,
    pub model: String,
    /// SHA-256 of the prompt configuration.
    pub prompt_hash: String,
    /// "active" or "inactive".
    pub status: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// Fields required to insert an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAgent {
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: f64,
    pub icon: String,
    pub system_prompt: String,
    pub welcome_message: String,
    pub examples: String,
    pub temperature: f64,
    pub max_tokens: i64,
    pub model: String,
    pub prompt_hash: String,
}

/// A user, identified by the identity provider's ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Identity provider subject ID
    pub id: String,
    /// Display name
    pub name: String,
    pub email: String,
    /// "user", "admin" or "superadmin"
    pub role: String,
    /// "free", "alacarte", "bundle" or "allinclusive"
    pub plan: String,
    /// Date the user first appeared (YYYY-MM-DD).
    pub join_date: String,
}

/// A row of the subscription ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    /// Auto-incrementing ID.
    pub id: i64,
    pub user_id: String,
    pub agent_id: i64,
    /// Whether the subscription is currently active.
    pub active: bool,
    /// Optimistic concurrency version.
    pub version: i64,
    pub created_at: String,
    /// When the subscription was deactivated.
    pub ended_at: Option<String>,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Message {
    /// Auto-incrementing ID.
    pub id: i64,
    pub user_id: String,
    pub agent_id: i64,
    /// Position within the (user, agent) conversation, starting at 1.
    pub seq: i64,
    /// "user" or "agent"
    pub sender: String,
    pub content: String,
    pub created_at: String,
}

/// A model-provider API key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ApiKey {
    /// Auto-incrementing ID.
    pub id: i64,
    pub name: String,
    /// Provider name (e.g., "openai").
    pub provider: String,
    pub secret: String,
    pub description: String,
    pub active: bool,
    pub created_at: String,
    pub requests_today: i64,
    pub total_requests: i64,
    pub last_used: Option<String>,
    pub monthly_cost: f64,
}

/// Aggregate counts for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminStats {
    pub users: i64,
    pub active_agents: i64,
    pub active_subscriptions: i64,
    pub messages: i64,
}
