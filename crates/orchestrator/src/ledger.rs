//! Subscription ledger.
//!
//! The ledger is the only writer of subscription state. Every change to a
//! (user, agent) pair, and every admission of a message into that pair's
//! conversation, happens under the pair's lock, so a message can never be
//! appended after the unsubscribe that preceded it.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::error::{OrchestratorError, Result};
use crate::locks::KeyedLocks;
use crate::model::{Agent, AgentId, ConversationKey, SubscriptionRecord};
use crate::repository::SharedBackend;

/// Proof that a conversation's subscription was active when it was issued.
///
/// Holds the pair's lock until dropped, so the subscription cannot change
/// while it is alive. Only the ledger can create one.
#[derive(Debug)]
pub struct Admission {
    key: ConversationKey,
    subscription_id: i64,
    _guard: OwnedMutexGuard<()>,
}

impl Admission {
    pub fn key(&self) -> &ConversationKey {
        &self.key
    }

    pub fn subscription_id(&self) -> i64 {
        self.subscription_id
    }
}

/// Per-user record of which agents are subscribed.
#[derive(Clone)]
pub struct SubscriptionLedger {
    backend: SharedBackend,
    catalog: Catalog,
    locks: Arc<KeyedLocks<ConversationKey>>,
}

impl SubscriptionLedger {
    pub fn new(backend: SharedBackend, catalog: Catalog) -> Self {
        Self {
            backend,
            catalog,
            locks: Arc::new(KeyedLocks::new()),
        }
    }

    /// Subscribe a user to an active agent.
    ///
    /// Fails with `NotFound` for unknown or inactive agents and with
    /// `AlreadySubscribed` if the pair already has an active subscription.
    pub async fn subscribe(&self, user_id: &str, agent_id: AgentId) -> Result<SubscriptionRecord> {
        self.catalog.get_active(agent_id).await?;

        let key = ConversationKey::new(user_id, agent_id);
        let _guard = self.locks.lock(&key).await;
        let record = self.backend.insert_subscription(&key, Utc::now()).await?;

        info!(user_id, agent_id, subscription_id = record.id, "Subscribed");
        Ok(record)
    }

    /// Deactivate the pair's subscription.
    ///
    /// Conversation history is kept. Fails with `NotSubscribed` (and changes
    /// nothing) if there is no active subscription.
    pub async fn unsubscribe(&self, user_id: &str, agent_id: AgentId) -> Result<()> {
        let key = ConversationKey::new(user_id, agent_id);
        let _guard = self.locks.lock(&key).await;

        let record = self
            .backend
            .active_subscription(&key)
            .await?
            .ok_or_else(|| not_subscribed(&key))?;
        self.backend
            .deactivate_subscription(record.id, record.version, Utc::now())
            .await?;

        info!(user_id, agent_id, subscription_id = record.id, "Unsubscribed");
        Ok(())
    }

    pub async fn is_subscribed(&self, user_id: &str, agent_id: AgentId) -> Result<bool> {
        let key = ConversationKey::new(user_id, agent_id);
        Ok(self.backend.active_subscription(&key).await?.is_some())
    }

    /// Agents the user is subscribed to, earliest subscription first.
    pub async fn list_subscriptions(&self, user_id: &str) -> Result<Vec<Agent>> {
        self.backend.subscribed_agents(user_id).await
    }

    /// Every subscription row for the pair, oldest first.
    pub async fn subscription_history(
        &self,
        user_id: &str,
        agent_id: AgentId,
    ) -> Result<Vec<SubscriptionRecord>> {
        let key = ConversationKey::new(user_id, agent_id);
        self.backend.subscription_history(&key).await
    }

    /// Lock the pair and check that it is subscribed.
    ///
    /// Waits for any in-flight subscribe or unsubscribe on the pair.
    pub async fn admit(&self, user_id: &str, agent_id: AgentId) -> Result<Admission> {
        let key = ConversationKey::new(user_id, agent_id);
        let guard = self.locks.lock(&key).await;

        let record = self
            .backend
            .active_subscription(&key)
            .await?
            .ok_or_else(|| not_subscribed(&key))?;

        debug!(conversation = %key, subscription_id = record.id, "Admitted");
        Ok(Admission {
            key,
            subscription_id: record.id,
            _guard: guard,
        })
    }
}

fn not_subscribed(key: &ConversationKey) -> OrchestratorError {
    OrchestratorError::NotSubscribed {
        user_id: key.user_id.clone(),
        agent_id: key.agent_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryBackend;
    use crate::test_support::draft;
    use std::time::Duration;

    async fn setup() -> (SubscriptionLedger, Catalog) {
        let backend: SharedBackend = Arc::new(MemoryBackend::new());
        let catalog = Catalog::new(backend.clone());
        (SubscriptionLedger::new(backend, catalog.clone()), catalog)
    }

    #[tokio::test]
    async fn test_subscribe_then_unsubscribe() {
        let (ledger, catalog) = setup().await;
        let agent = catalog.create(&draft("Tagline Pro")).await.unwrap();

        ledger.subscribe("u1", agent.id).await.unwrap();
        assert!(ledger.is_subscribed("u1", agent.id).await.unwrap());
        assert!(!ledger.is_subscribed("u2", agent.id).await.unwrap());

        ledger.unsubscribe("u1", agent.id).await.unwrap();
        assert!(!ledger.is_subscribed("u1", agent.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_double_subscribe_is_rejected() {
        let (ledger, catalog) = setup().await;
        let agent = catalog.create(&draft("Tagline Pro")).await.unwrap();

        ledger.subscribe("u1", agent.id).await.unwrap();
        let again = ledger.subscribe("u1", agent.id).await;
        assert!(matches!(again, Err(OrchestratorError::AlreadySubscribed { .. })));
        assert_eq!(ledger.subscription_history("u1", agent.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_without_subscription_has_no_effect() {
        let (ledger, catalog) = setup().await;
        let agent = catalog.create(&draft("Tagline Pro")).await.unwrap();

        let result = ledger.unsubscribe("u1", agent.id).await;
        assert!(matches!(result, Err(OrchestratorError::NotSubscribed { .. })));
        assert!(ledger.subscription_history("u1", agent.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_subscribe_requires_active_agent() {
        let (ledger, catalog) = setup().await;
        let agent = catalog.create(&draft("Tagline Pro")).await.unwrap();
        catalog.deactivate(agent.id).await.unwrap();

        assert!(matches!(
            ledger.subscribe("u1", agent.id).await,
            Err(OrchestratorError::NotFound { .. })
        ));
        assert!(matches!(
            ledger.subscribe("u1", 999).await,
            Err(OrchestratorError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_resubscribe_keeps_audit_trail() {
        let (ledger, catalog) = setup().await;
        let agent = catalog.create(&draft("Tagline Pro")).await.unwrap();

        ledger.subscribe("u1", agent.id).await.unwrap();
        ledger.unsubscribe("u1", agent.id).await.unwrap();
        ledger.subscribe("u1", agent.id).await.unwrap();

        let rows = ledger.subscription_history("u1", agent.id).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(!rows[0].active && rows[0].ended_at.is_some());
        assert!(rows[1].active);
    }

    #[tokio::test]
    async fn test_list_subscriptions_in_subscription_order() {
        let (ledger, catalog) = setup().await;
        let zeta = catalog.create(&draft("Zeta Writer")).await.unwrap();
        let alpha = catalog.create(&draft("Alpha Writer")).await.unwrap();

        ledger.subscribe("u1", zeta.id).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
        ledger.subscribe("u1", alpha.id).await.unwrap();

        let names: Vec<String> = ledger
            .list_subscriptions("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["Zeta Writer", "Alpha Writer"]);
    }

    #[tokio::test]
    async fn test_unsubscribe_waits_for_admission() {
        let (ledger, catalog) = setup().await;
        let agent = catalog.create(&draft("Tagline Pro")).await.unwrap();
        ledger.subscribe("u1", agent.id).await.unwrap();

        let admission = ledger.admit("u1", agent.id).await.unwrap();
        let pending = {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.unsubscribe("u1", agent.id).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!pending.is_finished());
        assert!(ledger.is_subscribed("u1", agent.id).await.unwrap());

        drop(admission);
        pending.await.unwrap().unwrap();
        assert!(matches!(
            ledger.admit("u1", agent.id).await,
            Err(OrchestratorError::NotSubscribed { .. })
        ));
    }
}
