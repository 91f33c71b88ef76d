//! Aggregate counts for the admin dashboard.

use sqlx::SqlitePool;

use crate::models::AdminStats;
use crate::{message, subscription, user, Result};

/// Count active agents.
pub async fn count_active_agents(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM agents WHERE status = 'active'
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Collect dashboard counts.
pub async fn admin_stats(pool: &SqlitePool) -> Result<AdminStats> {
    Ok(AdminStats {
        users: user::count_users(pool).await?,
        active_agents: count_active_agents(pool).await?,
        active_subscriptions: subscription::count_active(pool).await?,
        messages: message::count_all(pool).await?,
    })
}
