#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use brain_core::{Brain, ExampleDialogue, GenerationSettings, PromptConfig};
use chrono::{DateTime, Utc};
use orchestrator::repository::{
    AgentRepository, ApiKeyRepository, Backend, MemoryBackend, MessageRepository, SharedBackend,
    SqliteBackend, StatsRepository, SubscriptionRepository, UserRepository,
};
use orchestrator::{
    Agent, AgentDraft, AgentHub, AgentId, AgentStatus, ApiKey, ConversationKey, HubStats, Message,
    OrchestratorError, Plan, Result, Role, Sender, SubscriptionRecord, TurnState, User,
};

pub const USER: &str = "user-1";

pub fn draft(name: &str) -> AgentDraft {
    AgentDraft {
        name: name.to_string(),
        category: "Copywriting".to_string(),
        description: "Punchy taglines for products".to_string(),
        price: 5.0,
        icon: "Sparkles".to_string(),
        prompt: PromptConfig {
            system: "You write taglines.".to_string(),
            welcome: "What are we selling?".to_string(),
            examples: vec![ExampleDialogue {
                user: "Coffee shop".to_string(),
                agent: "Brewed for you.".to_string(),
            }],
        },
        settings: GenerationSettings::default(),
    }
}

/// Route orchestrator logs to the test writer. Set `RUST_LOG` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn memory_hub(brain: Arc<dyn Brain>) -> AgentHub {
    init_tracing();
    AgentHub::new(Arc::new(MemoryBackend::new()), brain)
}

pub async fn sqlite_hub(brain: Arc<dyn Brain>) -> AgentHub {
    init_tracing();
    let backend: SharedBackend = Arc::new(SqliteBackend::in_memory().await.unwrap());
    AgentHub::new(backend, brain)
}

/// Create an agent and subscribe `USER` to it.
pub async fn subscribed_agent(hub: &AgentHub, name: &str) -> Agent {
    let agent = hub.catalog().create(&draft(name)).await.unwrap();
    hub.subscribe(USER, agent.id).await.unwrap();
    agent
}

/// Wait until a conversation's turn reaches `state`.
pub async fn wait_for_state(hub: &AgentHub, agent_id: i64, state: TurnState) {
    for _ in 0..500 {
        if hub.turn_state(USER, agent_id).await.state == state {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("turn never reached {:?}", state);
}

/// In-memory backend whose `recent_messages` can be switched to fail.
#[derive(Default)]
pub struct FlakyBackend {
    inner: MemoryBackend,
    fail_recent: AtomicBool,
}

impl FlakyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_recent(&self, fail: bool) {
        self.fail_recent.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AgentRepository for FlakyBackend {
    async fn insert_agent(&self, draft: &AgentDraft, prompt_hash: &str) -> Result<Agent> {
        self.inner.insert_agent(draft, prompt_hash).await
    }

    async fn get_agent(&self, id: AgentId) -> Result<Option<Agent>> {
        self.inner.get_agent(id).await
    }

    async fn list_agents(&self, active_only: bool) -> Result<Vec<Agent>> {
        self.inner.list_agents(active_only).await
    }

    async fn set_agent_status(&self, id: AgentId, status: AgentStatus) -> Result<()> {
        self.inner.set_agent_status(id, status).await
    }
}

#[async_trait]
impl SubscriptionRepository for FlakyBackend {
    async fn insert_subscription(
        &self,
        key: &ConversationKey,
        created_at: DateTime<Utc>,
    ) -> Result<SubscriptionRecord> {
        self.inner.insert_subscription(key, created_at).await
    }

    async fn active_subscription(
        &self,
        key: &ConversationKey,
    ) -> Result<Option<SubscriptionRecord>> {
        self.inner.active_subscription(key).await
    }

    async fn deactivate_subscription(
        &self,
        id: i64,
        expected_version: i64,
        ended_at: DateTime<Utc>,
    ) -> Result<()> {
        self.inner
            .deactivate_subscription(id, expected_version, ended_at)
            .await
    }

    async fn subscribed_agents(&self, user_id: &str) -> Result<Vec<Agent>> {
        self.inner.subscribed_agents(user_id).await
    }

    async fn subscription_history(&self, key: &ConversationKey) -> Result<Vec<SubscriptionRecord>> {
        self.inner.subscription_history(key).await
    }
}

#[async_trait]
impl MessageRepository for FlakyBackend {
    async fn append_message(
        &self,
        key: &ConversationKey,
        sender: Sender,
        content: &str,
        at: DateTime<Utc>,
    ) -> Result<Message> {
        self.inner.append_message(key, sender, content, at).await
    }

    async fn message_page(
        &self,
        key: &ConversationKey,
        after_seq: i64,
        limit: usize,
    ) -> Result<Vec<Message>> {
        self.inner.message_page(key, after_seq, limit).await
    }

    async fn recent_messages(&self, key: &ConversationKey, limit: usize) -> Result<Vec<Message>> {
        if self.fail_recent.load(Ordering::SeqCst) {
            return Err(OrchestratorError::InvalidRecord(
                "message log unavailable".to_string(),
            ));
        }
        self.inner.recent_messages(key, limit).await
    }

    async fn message_count(&self, key: &ConversationKey) -> Result<i64> {
        self.inner.message_count(key).await
    }
}

#[async_trait]
impl UserRepository for FlakyBackend {
    async fn ensure_user(&self, id: &str, name: &str, email: &str) -> Result<User> {
        self.inner.ensure_user(id, name, email).await
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.inner.get_user(id).await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        self.inner.list_users().await
    }

    async fn update_user_access(&self, id: &str, role: Role, plan: Plan) -> Result<()> {
        self.inner.update_user_access(id, role, plan).await
    }
}

#[async_trait]
impl ApiKeyRepository for FlakyBackend {
    async fn insert_api_key(
        &self,
        name: &str,
        provider: &str,
        secret: &str,
        description: &str,
    ) -> Result<ApiKey> {
        self.inner
            .insert_api_key(name, provider, secret, description)
            .await
    }

    async fn list_api_keys(&self) -> Result<Vec<ApiKey>> {
        self.inner.list_api_keys().await
    }

    async fn set_api_key_active(&self, id: i64, active: bool) -> Result<()> {
        self.inner.set_api_key_active(id, active).await
    }

    async fn delete_api_key(&self, id: i64) -> Result<()> {
        self.inner.delete_api_key(id).await
    }
}

#[async_trait]
impl StatsRepository for FlakyBackend {
    async fn stats(&self) -> Result<HubStats> {
        self.inner.stats().await
    }
}

impl Backend for FlakyBackend {
    fn name(&self) -> &'static str {
        "flaky"
    }
}
