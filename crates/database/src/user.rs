//! User CRUD operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::User;

/// Create a new user.
pub async fn create_user(pool: &SqlitePool, user: &User) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, role, plan, join_date)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.role)
    .bind(&user.plan)
    .bind(&user.join_date)
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::unique_or_sqlx(e, "User", user.id.clone()))?;

    Ok(())
}

/// Register a user the first time they are seen.
///
/// New users get role "user" and plan "free". Existing users are returned
/// unchanged.
pub async fn ensure_user(pool: &SqlitePool, id: &str, name: &str, email: &str) -> Result<User> {
    sqlx::query(
        r#"
        INSERT INTO users (id, name, email)
        VALUES (?, ?, ?)
        ON CONFLICT(id) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(email)
    .execute(pool)
    .await?;

    get_user(pool, id).await
}

/// Get a user by ID.
pub async fn get_user(pool: &SqlitePool, id: &str) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, role, plan, join_date
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "User",
        id: id.to_string(),
    })
}

/// Update a user's role and plan.
pub async fn update_access(pool: &SqlitePool, id: &str, role: &str, plan: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET role = ?, plan = ?
        WHERE id = ?
        "#,
    )
    .bind(role)
    .bind(plan)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "User",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// List all users.
pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, role, plan, join_date
        FROM users
        ORDER BY name, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// Count total users.
pub async fn count_users(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM users
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Count users grouped by plan.
pub async fn count_users_by_plan(pool: &SqlitePool) -> Result<Vec<(String, i64)>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT plan, COUNT(*) as count
        FROM users
        GROUP BY plan
        ORDER BY count DESC, plan
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
