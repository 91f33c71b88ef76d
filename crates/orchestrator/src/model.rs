//! Domain types shared by the catalog, ledger, store and orchestrator.

use std::fmt;

use brain_core::{GenerationSettings, PromptConfig};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::permissions::Role;

/// Opaque numeric agent identifier.
pub type AgentId = i64;

/// Timestamp format used for storage and export (RFC 3339, UTC, millis).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Format a timestamp the way it is stored and exported.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Identifies one conversation: a (user, agent) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationKey {
    pub user_id: String,
    pub agent_id: AgentId,
}

impl ConversationKey {
    pub fn new(user_id: impl Into<String>, agent_id: AgentId) -> Self {
        Self {
            user_id: user_id.into(),
            agent_id,
        }
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.agent_id)
    }
}

/// Whether an agent can be subscribed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Active,
    Inactive,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Active => "active",
            AgentStatus::Inactive => "inactive",
        }
    }

    /// Parse a stored status; anything other than "active" is inactive.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("active") {
            AgentStatus::Active
        } else {
            AgentStatus::Inactive
        }
    }
}

/// An agent persona in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: f64,
    pub icon: String,
    pub prompt: PromptConfig,
    pub settings: GenerationSettings,
    /// Fingerprint of `prompt`, recorded when the agent was created.
    pub prompt_hash: String,
    pub status: AgentStatus,
    pub created_at: DateTime<Utc>,
}

impl Agent {
    pub fn is_active(&self) -> bool {
        self.status == AgentStatus::Active
    }
}

/// Admin input for a new agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDraft {
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: f64,
    #[serde(default = "default_icon")]
    pub icon: String,
    pub prompt: PromptConfig,
    #[serde(default)]
    pub settings: GenerationSettings,
}

fn default_icon() -> String {
    "Bot".to_string()
}

/// One row of the subscription ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub id: i64,
    pub user_id: String,
    pub agent_id: AgentId,
    pub active: bool,
    /// Bumped on every state change; used for optimistic updates.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Agent,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Agent => "agent",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Sender::User),
            "agent" => Some(Sender::Agent),
            _ => None,
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub user_id: String,
    pub agent_id: AgentId,
    /// Position within the conversation, starting at 1.
    pub seq: i64,
    pub sender: Sender,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Billing plan. Displayed and billed, not used for access decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Alacarte,
    Bundle,
    AllInclusive,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Alacarte => "alacarte",
            Plan::Bundle => "bundle",
            Plan::AllInclusive => "allinclusive",
        }
    }

    /// Parse a plan name; unknown names fall back to `Free`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "alacarte" => Plan::Alacarte,
            "bundle" => Plan::Bundle,
            "allinclusive" => Plan::AllInclusive,
            _ => Plan::Free,
        }
    }
}

/// A user of the product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub plan: Plan,
    pub join_date: NaiveDate,
}

/// A model-provider API key. `secret` is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiKey {
    pub id: i64,
    pub name: String,
    pub provider: String,
    #[serde(skip)]
    pub secret: String,
    /// Secret with everything but the last four characters hidden.
    pub masked: String,
    pub description: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub requests_today: i64,
    pub total_requests: i64,
    pub last_used: Option<DateTime<Utc>>,
    pub monthly_cost: f64,
}

/// Mask a secret, keeping only its last four characters.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}

/// Dashboard counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HubStats {
    pub users: i64,
    pub active_agents: i64,
    pub active_subscriptions: i64,
    pub messages: i64,
}
