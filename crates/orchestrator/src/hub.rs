//! The assembled hub.

use std::sync::Arc;
use std::time::Duration;

use brain_core::Brain;
use futures::stream::BoxStream;
use tracing::info;

use crate::api_keys::ApiKeyRegistry;
use crate::catalog::Catalog;
use crate::config::HubConfig;
use crate::conversation::{ConversationStore, History};
use crate::error::Result;
use crate::ledger::SubscriptionLedger;
use crate::model::{Agent, AgentId, HubStats, SubscriptionRecord};
use crate::repository::SharedBackend;
use crate::seed::seed_catalog;
use crate::session::{
    SessionOrchestrator, TurnOutcome, TurnSnapshot, DEFAULT_HISTORY_WINDOW, DEFAULT_REPLY_TIMEOUT,
};
use crate::users::UserDirectory;

/// Catalog, ledger, conversation store and sessions over one backend.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct AgentHub {
    backend: SharedBackend,
    catalog: Catalog,
    ledger: SubscriptionLedger,
    store: ConversationStore,
    sessions: Arc<SessionOrchestrator>,
    users: UserDirectory,
    api_keys: ApiKeyRegistry,
}

impl AgentHub {
    /// Hub with the default reply timeout and history window.
    pub fn new(backend: SharedBackend, brain: Arc<dyn Brain>) -> Self {
        Self::with_limits(backend, brain, DEFAULT_REPLY_TIMEOUT, DEFAULT_HISTORY_WINDOW)
    }

    pub fn with_limits(
        backend: SharedBackend,
        brain: Arc<dyn Brain>,
        reply_timeout: Duration,
        history_window: usize,
    ) -> Self {
        let catalog = Catalog::new(backend.clone());
        let ledger = SubscriptionLedger::new(backend.clone(), catalog.clone());
        let store = ConversationStore::new(backend.clone());
        let sessions = SessionOrchestrator::new(catalog.clone(), ledger.clone(), store.clone(), brain)
            .with_reply_timeout(reply_timeout)
            .with_history_window(history_window);

        Self {
            users: UserDirectory::new(backend.clone()),
            api_keys: ApiKeyRegistry::new(backend.clone()),
            backend,
            catalog,
            ledger,
            store,
            sessions: Arc::new(sessions),
        }
    }

    /// Open storage, build the reply generator and seed the catalog as
    /// configured.
    pub async fn from_config(config: &HubConfig) -> Result<Self> {
        let backend = config.open_backend().await?;
        let brain = config.build_brain();
        let hub = Self::with_limits(
            backend,
            brain,
            config.reply_timeout,
            config.history_window,
        );

        if config.seed_catalog {
            seed_catalog(&hub.catalog).await?;
        }

        info!(
            storage = hub.backend.name(),
            brain = hub.sessions.brain_name(),
            "Agent hub ready"
        );
        Ok(hub)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &SubscriptionLedger {
        &self.ledger
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.store
    }

    pub fn sessions(&self) -> &SessionOrchestrator {
        &self.sessions
    }

    pub fn users(&self) -> &UserDirectory {
        &self.users
    }

    pub fn api_keys(&self) -> &ApiKeyRegistry {
        &self.api_keys
    }

    pub async fn subscribe(&self, user_id: &str, agent_id: AgentId) -> Result<SubscriptionRecord> {
        self.ledger.subscribe(user_id, agent_id).await
    }

    pub async fn unsubscribe(&self, user_id: &str, agent_id: AgentId) -> Result<()> {
        self.ledger.unsubscribe(user_id, agent_id).await
    }

    pub async fn is_subscribed(&self, user_id: &str, agent_id: AgentId) -> Result<bool> {
        self.ledger.is_subscribed(user_id, agent_id).await
    }

    /// The user's subscribed agents, earliest subscription first.
    pub async fn my_agents(&self, user_id: &str) -> Result<Vec<Agent>> {
        self.ledger.list_subscriptions(user_id).await
    }

    pub async fn submit(
        &self,
        user_id: &str,
        agent_id: AgentId,
        content: &str,
    ) -> Result<TurnOutcome> {
        self.sessions.submit(user_id, agent_id, content).await
    }

    pub async fn retry(&self, user_id: &str, agent_id: AgentId) -> Result<TurnOutcome> {
        self.sessions.retry(user_id, agent_id).await
    }

    pub async fn cancel(&self, user_id: &str, agent_id: AgentId) -> Result<()> {
        self.sessions.cancel(user_id, agent_id).await
    }

    pub async fn turn_state(&self, user_id: &str, agent_id: AgentId) -> TurnSnapshot {
        self.sessions.turn_state(user_id, agent_id).await
    }

    pub async fn welcome(&self, user_id: &str, agent_id: AgentId) -> Result<String> {
        self.sessions.welcome(user_id, agent_id).await
    }

    pub fn history(&self, user_id: &str, agent_id: AgentId) -> History {
        self.store.history(user_id, agent_id)
    }

    pub fn export(&self, user_id: &str, agent_id: AgentId) -> BoxStream<'static, Result<String>> {
        self.store.export(user_id, agent_id)
    }

    pub async fn stats(&self) -> Result<HubStats> {
        self.backend.stats().await
    }
}
