//! In-memory backend.
//!
//! Keeps everything behind one `RwLock`. Used by tests and by the demo
//! server when no database is configured; data is lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tokio::sync::RwLock;

use super::{
    AgentRepository, ApiKeyRepository, Backend, MessageRepository, StatsRepository,
    SubscriptionRepository, UserRepository,
};
use crate::error::{OrchestratorError, Result};
use crate::model::{
    mask_secret, Agent, AgentDraft, AgentId, AgentStatus, ApiKey, ConversationKey, HubStats,
    Message, Plan, Sender, SubscriptionRecord, User,
};
use crate::permissions::Role;

#[derive(Debug, Default)]
struct State {
    agents: IndexMap<AgentId, Agent>,
    next_agent_id: AgentId,
    subscriptions: Vec<SubscriptionRecord>,
    next_subscription_id: i64,
    conversations: HashMap<ConversationKey, Vec<Message>>,
    next_message_id: i64,
    users: IndexMap<String, User>,
    api_keys: IndexMap<i64, ApiKey>,
    next_api_key_id: i64,
}

/// Backend that keeps all data in process memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: RwLock<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

fn sorted_by_name(mut agents: Vec<Agent>) -> Vec<Agent> {
    agents.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    agents
}

#[async_trait]
impl AgentRepository for MemoryBackend {
    async fn insert_agent(&self, draft: &AgentDraft, prompt_hash: &str) -> Result<Agent> {
        let mut state = self.state.write().await;
        let id = next_id(&mut state.next_agent_id);
        let agent = Agent {
            id,
            name: draft.name.clone(),
            category: draft.category.clone(),
            description: draft.description.clone(),
            price: draft.price,
            icon: draft.icon.clone(),
            prompt: draft.prompt.clone(),
            settings: draft.settings.clone(),
            prompt_hash: prompt_hash.to_string(),
            status: AgentStatus::Active,
            created_at: Utc::now(),
        };
        state.agents.insert(id, agent.clone());
        Ok(agent)
    }

    async fn get_agent(&self, id: AgentId) -> Result<Option<Agent>> {
        Ok(self.state.read().await.agents.get(&id).cloned())
    }

    async fn list_agents(&self, active_only: bool) -> Result<Vec<Agent>> {
        let state = self.state.read().await;
        let agents = state
            .agents
            .values()
            .filter(|a| !active_only || a.is_active())
            .cloned()
            .collect();
        Ok(sorted_by_name(agents))
    }

    async fn set_agent_status(&self, id: AgentId, status: AgentStatus) -> Result<()> {
        let mut state = self.state.write().await;
        let agent = state
            .agents
            .get_mut(&id)
            .ok_or_else(|| OrchestratorError::agent_not_found(id))?;
        agent.status = status;
        Ok(())
    }
}

#[async_trait]
impl SubscriptionRepository for MemoryBackend {
    async fn insert_subscription(
        &self,
        key: &ConversationKey,
        created_at: DateTime<Utc>,
    ) -> Result<SubscriptionRecord> {
        let mut state = self.state.write().await;
        let exists = state
            .subscriptions
            .iter()
            .any(|s| s.active && s.user_id == key.user_id && s.agent_id == key.agent_id);
        if exists {
            return Err(OrchestratorError::AlreadySubscribed {
                user_id: key.user_id.clone(),
                agent_id: key.agent_id,
            });
        }

        let record = SubscriptionRecord {
            id: next_id(&mut state.next_subscription_id),
            user_id: key.user_id.clone(),
            agent_id: key.agent_id,
            active: true,
            version: 1,
            created_at,
            ended_at: None,
        };
        state.subscriptions.push(record.clone());
        Ok(record)
    }

    async fn active_subscription(
        &self,
        key: &ConversationKey,
    ) -> Result<Option<SubscriptionRecord>> {
        let state = self.state.read().await;
        Ok(state
            .subscriptions
            .iter()
            .find(|s| s.active && s.user_id == key.user_id && s.agent_id == key.agent_id)
            .cloned())
    }

    async fn deactivate_subscription(
        &self,
        id: i64,
        expected_version: i64,
        ended_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let row = state
            .subscriptions
            .iter_mut()
            .find(|s| s.id == id && s.active && s.version == expected_version)
            .ok_or_else(|| {
                OrchestratorError::ConcurrencyConflict(format!(
                    "subscription {} changed since version {}",
                    id, expected_version
                ))
            })?;
        row.active = false;
        row.version += 1;
        row.ended_at = Some(ended_at);
        Ok(())
    }

    async fn subscribed_agents(&self, user_id: &str) -> Result<Vec<Agent>> {
        let state = self.state.read().await;
        let mut rows: Vec<&SubscriptionRecord> = state
            .subscriptions
            .iter()
            .filter(|s| s.active && s.user_id == user_id)
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows
            .into_iter()
            .filter_map(|s| state.agents.get(&s.agent_id).cloned())
            .collect())
    }

    async fn subscription_history(
        &self,
        key: &ConversationKey,
    ) -> Result<Vec<SubscriptionRecord>> {
        let state = self.state.read().await;
        Ok(state
            .subscriptions
            .iter()
            .filter(|s| s.user_id == key.user_id && s.agent_id == key.agent_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MessageRepository for MemoryBackend {
    async fn append_message(
        &self,
        key: &ConversationKey,
        sender: Sender,
        content: &str,
        at: DateTime<Utc>,
    ) -> Result<Message> {
        let mut state = self.state.write().await;
        let id = next_id(&mut state.next_message_id);
        let log = state.conversations.entry(key.clone()).or_default();

        let (seq, timestamp) = match log.last() {
            Some(last) => (last.seq + 1, at.max(last.timestamp)),
            None => (1, at),
        };
        let message = Message {
            id,
            user_id: key.user_id.clone(),
            agent_id: key.agent_id,
            seq,
            sender,
            content: content.to_string(),
            timestamp,
        };
        log.push(message.clone());
        Ok(message)
    }

    async fn message_page(
        &self,
        key: &ConversationKey,
        after_seq: i64,
        limit: usize,
    ) -> Result<Vec<Message>> {
        let state = self.state.read().await;
        let Some(log) = state.conversations.get(key) else {
            return Ok(Vec::new());
        };
        // seq is dense from 1, so seq N sits at index N-1
        let start = usize::try_from(after_seq.max(0))
            .unwrap_or(usize::MAX)
            .min(log.len());
        Ok(log[start..].iter().take(limit).cloned().collect())
    }

    async fn recent_messages(&self, key: &ConversationKey, limit: usize) -> Result<Vec<Message>> {
        let state = self.state.read().await;
        let Some(log) = state.conversations.get(key) else {
            return Ok(Vec::new());
        };
        let start = log.len().saturating_sub(limit);
        Ok(log[start..].to_vec())
    }

    async fn message_count(&self, key: &ConversationKey) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state
            .conversations
            .get(key)
            .map(|log| log.len() as i64)
            .unwrap_or(0))
    }
}

#[async_trait]
impl UserRepository for MemoryBackend {
    async fn ensure_user(&self, id: &str, name: &str, email: &str) -> Result<User> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .entry(id.to_string())
            .or_insert_with(|| User {
                id: id.to_string(),
                name: name.to_string(),
                email: email.to_string(),
                role: Role::User,
                plan: Plan::Free,
                join_date: Utc::now().date_naive(),
            });
        Ok(user.clone())
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.state.read().await.users.values().cloned().collect())
    }

    async fn update_user_access(&self, id: &str, role: Role, plan: Plan) -> Result<()> {
        let mut state = self.state.write().await;
        let user = state.users.get_mut(id).ok_or_else(|| OrchestratorError::NotFound {
            entity: "User",
            id: id.to_string(),
        })?;
        user.role = role;
        user.plan = plan;
        Ok(())
    }
}

fn api_key_not_found(id: i64) -> OrchestratorError {
    OrchestratorError::NotFound {
        entity: "ApiKey",
        id: id.to_string(),
    }
}

#[async_trait]
impl ApiKeyRepository for MemoryBackend {
    async fn insert_api_key(
        &self,
        name: &str,
        provider: &str,
        secret: &str,
        description: &str,
    ) -> Result<ApiKey> {
        let mut state = self.state.write().await;
        let id = next_id(&mut state.next_api_key_id);
        let key = ApiKey {
            id,
            name: name.to_string(),
            provider: provider.to_string(),
            secret: secret.to_string(),
            masked: mask_secret(secret),
            description: description.to_string(),
            active: true,
            created_at: Utc::now(),
            requests_today: 0,
            total_requests: 0,
            last_used: None,
            monthly_cost: 0.0,
        };
        state.api_keys.insert(id, key.clone());
        Ok(key)
    }

    async fn list_api_keys(&self) -> Result<Vec<ApiKey>> {
        let state = self.state.read().await;
        Ok(state.api_keys.values().rev().cloned().collect())
    }

    async fn set_api_key_active(&self, id: i64, active: bool) -> Result<()> {
        let mut state = self.state.write().await;
        let key = state.api_keys.get_mut(&id).ok_or_else(|| api_key_not_found(id))?;
        key.active = active;
        Ok(())
    }

    async fn delete_api_key(&self, id: i64) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .api_keys
            .shift_remove(&id)
            .map(|_| ())
            .ok_or_else(|| api_key_not_found(id))
    }
}

#[async_trait]
impl StatsRepository for MemoryBackend {
    async fn stats(&self) -> Result<HubStats> {
        let state = self.state.read().await;
        Ok(HubStats {
            users: state.users.len() as i64,
            active_agents: state.agents.values().filter(|a| a.is_active()).count() as i64,
            active_subscriptions: state.subscriptions.iter().filter(|s| s.active).count() as i64,
            messages: state.conversations.values().map(|log| log.len() as i64).sum(),
        })
    }
}

impl Backend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }
}
