//! Conversation message log.
//!
//! Messages are append-only. Each (user, agent) conversation numbers its
//! messages 1, 2, 3, ... and timestamps never go backwards within a
//! conversation, even if the caller's clock does.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::Message;

/// Append a message, assigning the next sequence number.
///
/// The stored timestamp is `max(created_at, latest timestamp in the
/// conversation)`. Sequence and timestamp are computed in the same statement
/// as the insert.
pub async fn append(
    pool: &SqlitePool,
    user_id: &str,
    agent_id: i64,
    sender: &str,
    content: &str,
    created_at: &str,
) -> Result<Message> {
    let message = sqlx::query_as::<_, Message>(
        r#"
        INSERT INTO messages (user_id, agent_id, seq, sender, content, created_at)
        SELECT ?, ?, COALESCE(MAX(seq), 0) + 1, ?, ?, MAX(?, COALESCE(MAX(created_at), ''))
        FROM messages
        WHERE user_id = ? AND agent_id = ?
        RETURNING id, user_id, agent_id, seq, sender, content, created_at
        "#,
    )
    .bind(user_id)
    .bind(agent_id)
    .bind(sender)
    .bind(content)
    .bind(created_at)
    .bind(user_id)
    .bind(agent_id)
    .fetch_one(pool)
    .await?;

    Ok(message)
}

/// Get up to `limit` messages with `seq > after_seq`, ascending.
pub async fn page(
    pool: &SqlitePool,
    user_id: &str,
    agent_id: i64,
    after_seq: i64,
    limit: i64,
) -> Result<Vec<Message>> {
    let rows = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, user_id, agent_id, seq, sender, content, created_at
        FROM messages
        WHERE user_id = ? AND agent_id = ? AND seq > ?
        ORDER BY seq
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(agent_id)
    .bind(after_seq)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Get the latest `limit` messages of a conversation, ascending.
pub async fn recent(
    pool: &SqlitePool,
    user_id: &str,
    agent_id: i64,
    limit: i64,
) -> Result<Vec<Message>> {
    let mut rows = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, user_id, agent_id, seq, sender, content, created_at
        FROM messages
        WHERE user_id = ? AND agent_id = ?
        ORDER BY seq DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(agent_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.reverse();
    Ok(rows)
}

/// Count messages in a conversation.
pub async fn count(pool: &SqlitePool, user_id: &str, agent_id: i64) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM messages WHERE user_id = ? AND agent_id = ?
        "#,
    )
    .bind(user_id)
    .bind(agent_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Count all messages.
pub async fn count_all(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM messages
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

    #[tokio::test]
    async fn test_sequence_per_conversation() {
        let db = test_db().await;
        let a = create_agent(db.pool(), &new_agent("A")).await.unwrap();
        let b = create_agent(db.pool(), &new_agent("B")).await.unwrap();
        let ts = "2025-06-01T10:00:00.000Z";

        let m1 = append(db.pool(), "u1", a.id, "user", "one", ts).await.unwrap();
        let m2 = append(db.pool(), "u1", a.id, "agent", "two", ts).await.unwrap();
        let other = append(db.pool(), "u1", b.id, "user", "x", ts).await.unwrap();

        assert_eq!((m1.seq, m2.seq), (1, 2));
        assert_eq!(other.seq, 1);
        assert_eq!(count(db.pool(), "u1", a.id).await.unwrap(), 2);
        assert_eq!(count_all(db.pool()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_timestamp_never_goes_backwards() {
        let db = test_db().await;
        let a = create_agent(db.pool(), &new_agent("A")).await.unwrap();

        append(db.pool(), "u1", a.id, "user", "late", "2025-06-01T10:00:05.000Z")
            .await
            .unwrap();
        let skewed = append(db.pool(), "u1", a.id, "agent", "early", "2025-06-01T10:00:01.000Z")
            .await
            .unwrap();

        assert_eq!(skewed.created_at, "2025-06-01T10:00:05.000Z");
        assert_eq!(skewed.seq, 2);
    }

    #[tokio::test]
    async fn test_page_and_recent() {
        let db = test_db().await;
        let a = create_agent(db.pool(), &new_agent("A")).await.unwrap();
        for i in 1..=5 {
            append(db.pool(), "u1", a.id, "user", &format!("m{}", i), "2025-06-01T10:00:00.000Z")
                .await
                .unwrap();
        }

        let first = page(db.pool(), "u1", a.id, 0, 2).await.unwrap();
        assert_eq!(first.iter().map(|m| m.seq).collect::<Vec<_>>(), vec![1, 2]);
        let rest = page(db.pool(), "u1", a.id, 2, 10).await.unwrap();
        assert_eq!(rest.iter().map(|m| m.seq).collect::<Vec<_>>(), vec![3, 4, 5]);

        let latest = recent(db.pool(), "u1", a.id, 2).await.unwrap();
        assert_eq!(
            latest.iter().map(|m| m.content.as_str()).collect::<Vec<_>>(),
            vec!["m4", "m5"]
        );
    }
}
