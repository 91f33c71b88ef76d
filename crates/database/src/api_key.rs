//! Provider API key CRUD operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::ApiKey;

/// Create a new API key record.
pub async fn create_api_key(
    pool: &SqlitePool,
    name: &str,
    provider: &str,
    secret: &str,
    description: &str,
) -> Result<ApiKey> {
    let key = sqlx::query_as::<_, ApiKey>(
        r#"
        INSERT INTO api_keys (name, provider, secret, description)
        VALUES (?, ?, ?, ?)
        RETURNING id, name, provider, secret, description, active, created_at,
                  requests_today, total_requests, last_used, monthly_cost
        "#,
    )
    .bind(name)
    .bind(provider)
    .bind(secret)
    .bind(description)
    .fetch_one(pool)
    .await?;

    Ok(key)
}

/// List API keys, newest first.
pub async fn list_api_keys(pool: &SqlitePool) -> Result<Vec<ApiKey>> {
    let keys = sqlx::query_as::<_, ApiKey>(
        r#"
        SELECT id, name, provider, secret, description, active, created_at,
               requests_today, total_requests, last_used, monthly_cost
        FROM api_keys
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(keys)
}

/// Enable or disable an API key.
pub async fn set_active(pool: &SqlitePool, id: i64, active: bool) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE api_keys
        SET active = ?
        WHERE id = ?
        "#,
    )
    .bind(active)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "ApiKey",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Delete an API key.
pub async fn delete_api_key(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM api_keys
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "ApiKey",
            id: id.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_db;

    #[tokio::test]
    async fn test_api_key_lifecycle() {
        let db = test_db().await;

        let key = create_api_key(db.pool(), "Primary", "openai", "sk-test-123456", "main key")
            .await
            .unwrap();
        assert!(key.active);
        assert_eq!(key.total_requests, 0);
        assert!(key.last_used.is_none());

        set_active(db.pool(), key.id, false).await.unwrap();
        let keys = list_api_keys(db.pool()).await.unwrap();
        assert_eq!(keys.len(), 1);
        assert!(!keys[0].active);

        delete_api_key(db.pool(), key.id).await.unwrap();
        assert!(list_api_keys(db.pool()).await.unwrap().is_empty());

        let result = delete_api_key(db.pool(), key.id).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }
}
