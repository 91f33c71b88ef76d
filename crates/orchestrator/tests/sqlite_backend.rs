//! The SQLite backend behaves like the in-memory one.

mod common;

use std::sync::Arc;

use brain_core::{BrainError, Reply};
use common::{sqlite_hub, subscribed_agent, USER};
use mock_brain::{EchoBrain, ScriptedBrain};
use orchestrator::{OrchestratorError, Plan, Role, Sender, TurnOutcome};

#[tokio::test]
async fn test_ledger_rules() {
    let hub = sqlite_hub(Arc::new(EchoBrain::new())).await;
    let agent = subscribed_agent(&hub, "Tagline Pro").await;

    assert!(hub.is_subscribed(USER, agent.id).await.unwrap());
    assert!(matches!(
        hub.subscribe(USER, agent.id).await,
        Err(OrchestratorError::AlreadySubscribed { .. })
    ));

    hub.unsubscribe(USER, agent.id).await.unwrap();
    assert!(!hub.is_subscribed(USER, agent.id).await.unwrap());
    assert!(matches!(
        hub.unsubscribe(USER, agent.id).await,
        Err(OrchestratorError::NotSubscribed { .. })
    ));

    hub.subscribe(USER, agent.id).await.unwrap();
    let rows = hub
        .ledger()
        .subscription_history(USER, agent.id)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].version, 2);
    assert!(rows[1].active);
}

#[tokio::test]
async fn test_my_agents_in_subscription_order() {
    let hub = sqlite_hub(Arc::new(EchoBrain::new())).await;
    let zeta = subscribed_agent(&hub, "Zeta Writer").await;
    let alpha = subscribed_agent(&hub, "Alpha Writer").await;

    let ids: Vec<i64> = hub
        .my_agents(USER)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(ids, vec![zeta.id, alpha.id]);
}

#[tokio::test]
async fn test_turns_and_history() {
    let brain = Arc::new(ScriptedBrain::from_outcomes([
        Ok(Reply::new("Brewed for you.")),
        Err(BrainError::Timeout),
    ]));
    let hub = sqlite_hub(brain).await;
    let agent = subscribed_agent(&hub, "Tagline Pro").await;

    assert!(hub.submit(USER, agent.id, "Coffee shop").await.unwrap().is_settled());
    let failed = hub.submit(USER, agent.id, "Bakery").await.unwrap();
    assert!(matches!(failed, TurnOutcome::Failed { .. }));

    // The queue is empty now, so the retry echoes
    let retried = hub.retry(USER, agent.id).await.unwrap();
    assert!(retried.is_settled());

    let messages = hub.history(USER, agent.id).collect().await.unwrap();
    let summary: Vec<(i64, Sender, &str)> = messages
        .iter()
        .map(|m| (m.seq, m.sender, m.content.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (1, Sender::User, "Coffee shop"),
            (2, Sender::Agent, "Brewed for you."),
            (3, Sender::User, "Bakery"),
            (4, Sender::Agent, "Bakery"),
        ]
    );
    for window in messages.windows(2) {
        assert!(window[0].timestamp <= window[1].timestamp);
    }

    let first = hub.conversations().export_bytes(USER, agent.id).await.unwrap();
    let second = hub.conversations().export_bytes(USER, agent.id).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_users_keys_and_stats() {
    let hub = sqlite_hub(Arc::new(EchoBrain::new())).await;
    let agent = subscribed_agent(&hub, "Tagline Pro").await;
    hub.users().ensure(USER, "Ada", "ada@example.com").await.unwrap();
    hub.submit(USER, agent.id, "Hello").await.unwrap();

    let updated = hub
        .users()
        .update_access(Role::SuperAdmin, USER, Role::Admin, Plan::AllInclusive)
        .await
        .unwrap();
    assert_eq!(updated.role, Role::Admin);
    assert_eq!(updated.plan, Plan::AllInclusive);

    let key = hub
        .api_keys()
        .create("Primary", "openai", "sk-live-abcd1234", "")
        .await
        .unwrap();
    assert!(key.masked.ends_with("1234"));
    hub.api_keys().set_active(key.id, false).await.unwrap();
    assert!(!hub.api_keys().list().await.unwrap()[0].active);

    let stats = hub.stats().await.unwrap();
    assert_eq!(stats.users, 1);
    assert_eq!(stats.active_agents, 1);
    assert_eq!(stats.active_subscriptions, 1);
    assert_eq!(stats.messages, 2);
}
