//! Subscription ledger operations.
//!
//! Rows are never deleted: unsubscribing deactivates the active row and
//! bumps its version, so the table doubles as an audit trail. A partial
//! unique index keeps at most one active row per (user, agent).

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Agent, Subscription};

/// Insert a new active subscription row.
///
/// Fails with `AlreadyExists` if an active row exists for the pair.
pub async fn insert_active(
    pool: &SqlitePool,
    user_id: &str,
    agent_id: i64,
    created_at: &str,
) -> Result<Subscription> {
    sqlx::query_as::<_, Subscription>(
        r#"
        INSERT INTO subscriptions (user_id, agent_id, active, version, created_at)
        VALUES (?, ?, 1, 1, ?)
        RETURNING id, user_id, agent_id, active, version, created_at, ended_at
        "#,
    )
    .bind(user_id)
    .bind(agent_id)
    .bind(created_at)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        DatabaseError::unique_or_sqlx(e, "Subscription", format!("{}/{}", user_id, agent_id))
    })
}

/// Get the active subscription row for a pair, if any.
pub async fn get_active(
    pool: &SqlitePool,
    user_id: &str,
    agent_id: i64,
) -> Result<Option<Subscription>> {
    let row = sqlx::query_as::<_, Subscription>(
        r#"
        SELECT id, user_id, agent_id, active, version, created_at, ended_at
        FROM subscriptions
        WHERE user_id = ? AND agent_id = ? AND active = 1
        "#,
    )
    .bind(user_id)
    .bind(agent_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Deactivate a subscription row if it still has the expected version.
///
/// Fails with `Conflict` when the row was changed (or deactivated) since it
/// was read.
pub async fn deactivate(
    pool: &SqlitePool,
    id: i64,
    expected_version: i64,
    ended_at: &str,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE subscriptions
        SET active = 0, version = version + 1, ended_at = ?
        WHERE id = ? AND version = ? AND active = 1
        "#,
    )
    .bind(ended_at)
    .bind(id)
    .bind(expected_version)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::Conflict {
            entity: "Subscription",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Get active subscription rows for a user, earliest first.
pub async fn list_active_for_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<Subscription>> {
    let rows = sqlx::query_as::<_, Subscription>(
        r#"
        SELECT id, user_id, agent_id, active, version, created_at, ended_at
        FROM subscriptions
        WHERE user_id = ? AND active = 1
        ORDER BY created_at, id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Get the agents a user is actively subscribed to, in subscription order.
pub async fn list_subscribed_agents(pool: &SqlitePool, user_id: &str) -> Result<Vec<Agent>> {
    let agents = sqlx::query_as::<_, Agent>(
        r#"
        SELECT a.id, a.name, a.category, a.description, a.price, a.icon, a.system_prompt,
               a.welcome_message, a.examples, a.temperature, a.max_tokens, a.model,
               a.prompt_hash, a.status, a.created_at
        FROM agents a
        INNER JOIN subscriptions s ON s.agent_id = a.id
        WHERE s.user_id = ? AND s.active = 1
        ORDER BY s.created_at, s.id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(agents)
}

/// Get every subscription row (active or not) for a pair, oldest first.
pub async fn history(pool: &SqlitePool, user_id: &str, agent_id: i64) -> Result<Vec<Subscription>> {
    let rows = sqlx::query_as::<_, Subscription>(
        r#"
        SELECT id, user_id, agent_id, active, version, created_at, ended_at
        FROM subscriptions
        WHERE user_id = ? AND agent_id = ?
        ORDER BY created_at, id
        "#,
    )
    .bind(user_id)
    .bind(agent_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Count active subscriptions.
pub async fn count_active(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM subscriptions WHERE active = 1
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::create_agent;
    use crate::test_support::{new_agent, test_db};

    const T0: &str = "2025-06-01T10:00:00.000Z";
    const T1: &str = "2025-06-01T10:00:05.000Z";

    #[tokio::test]
    async fn test_one_active_row_per_pair() {
        let db = test_db().await;
        let agent = create_agent(db.pool(), &new_agent("Tagline Pro")).await.unwrap();

        insert_active(db.pool(), "u1", agent.id, T0).await.unwrap();
        let result = insert_active(db.pool(), "u1", agent.id, T1).await;
        assert!(matches!(result, Err(DatabaseError::AlreadyExists { .. })));

        // A different user is independent
        insert_active(db.pool(), "u2", agent.id, T1).await.unwrap();
        assert_eq!(count_active(db.pool()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_soft_deactivate_keeps_audit_trail() {
        let db = test_db().await;
        let agent = create_agent(db.pool(), &new_agent("Tagline Pro")).await.unwrap();

        let row = insert_active(db.pool(), "u1", agent.id, T0).await.unwrap();
        deactivate(db.pool(), row.id, row.version, T1).await.unwrap();
        assert!(get_active(db.pool(), "u1", agent.id).await.unwrap().is_none());

        // Re-subscribing creates a new row
        insert_active(db.pool(), "u1", agent.id, T1).await.unwrap();

        let rows = history(db.pool(), "u1", agent.id).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(!rows[0].active);
        assert_eq!(rows[0].version, 2);
        assert_eq!(rows[0].ended_at.as_deref(), Some(T1));
        assert!(rows[1].active);
    }

    #[tokio::test]
    async fn test_stale_version_conflicts() {
        let db = test_db().await;
        let agent = create_agent(db.pool(), &new_agent("Tagline Pro")).await.unwrap();

        let row = insert_active(db.pool(), "u1", agent.id, T0).await.unwrap();
        deactivate(db.pool(), row.id, row.version, T1).await.unwrap();

        let result = deactivate(db.pool(), row.id, row.version, T1).await;
        assert!(matches!(result, Err(DatabaseError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_subscribed_agents_in_subscription_order() {
        let db = test_db().await;
        let alpha = create_agent(db.pool(), &new_agent("Alpha")).await.unwrap();
        let beta = create_agent(db.pool(), &new_agent("Beta")).await.unwrap();

        insert_active(db.pool(), "u1", beta.id, T0).await.unwrap();
        insert_active(db.pool(), "u1", alpha.id, T1).await.unwrap();

        let names: Vec<_> = list_subscribed_agents(db.pool(), "u1")
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["Beta", "Alpha"]);
        assert_eq!(list_active_for_user(db.pool(), "u1").await.unwrap().len(), 2);
    }
}
