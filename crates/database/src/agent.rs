//! Agent catalog CRUD operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Agent, NewAgent};

const AGENT_COLUMNS: &str = "id, name, category, description, price, icon, system_prompt, \
     welcome_message, examples, temperature, max_tokens, model, prompt_hash, status, created_at";

/// Insert a new agent and return the stored row.
pub async fn create_agent(pool: &SqlitePool, agent: &NewAgent) -> Result<Agent> {
    let sql = format!(
        r#"
        INSERT INTO agents (name, category, description, price, icon, system_prompt,
            welcome_message, examples, temperature, max_tokens, model, prompt_hash)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {AGENT_COLUMNS}
        "#
    );

    let created = sqlx::query_as::<_, Agent>(&sql)
        .bind(&agent.name)
        .bind(&agent.category)
        .bind(&agent.description)
        .bind(agent.price)
        .bind(&agent.icon)
        .bind(&agent.system_prompt)
        .bind(&agent.welcome_message)
        .bind(&agent.examples)
        .bind(agent.temperature)
        .bind(agent.max_tokens)
        .bind(&agent.model)
        .bind(&agent.prompt_hash)
        .fetch_one(pool)
        .await?;

    Ok(created)
}

/// Get an agent by ID, regardless of status.
pub async fn get_agent(pool: &SqlitePool, id: i64) -> Result<Agent> {
    let sql = format!("SELECT {AGENT_COLUMNS} FROM agents WHERE id = ?");

    sqlx::query_as::<_, Agent>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Agent",
            id: id.to_string(),
        })
}

/// List active agents ordered by name.
pub async fn list_active_agents(pool: &SqlitePool) -> Result<Vec<Agent>> {
    let sql = format!(
        "SELECT {AGENT_COLUMNS} FROM agents WHERE status = 'active' ORDER BY name, id"
    );

    let agents = sqlx::query_as::<_, Agent>(&sql).fetch_all(pool).await?;

    Ok(agents)
}

/// List every agent, including inactive ones.
pub async fn list_agents(pool: &SqlitePool) -> Result<Vec<Agent>> {
    let sql = format!("SELECT {AGENT_COLUMNS} FROM agents ORDER BY name, id");

    let agents = sqlx::query_as::<_, Agent>(&sql).fetch_all(pool).await?;

    Ok(agents)
}

/// Set an agent's status ("active" or "inactive").
pub async fn set_agent_status(pool: &SqlitePool, id: i64, status: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE agents
        SET status = ?
        WHERE id = ?
        "#,
    )
    .bind(status)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Agent",
            id: id.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{new_agent, test_db};

    #[tokio::test]
    async fn test_create_and_get() {
        let db = test_db().await;
        let created = create_agent(db.pool(), &new_agent("Tagline Pro"))
            .await
            .unwrap();

        assert!(created.id > 0);
        assert_eq!(created.status, "active");

        let fetched = get_agent(db.pool(), created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_list_active_sorted_by_name() {
        let db = test_db().await;
        let zeta = create_agent(db.pool(), &new_agent("Zeta")).await.unwrap();
        create_agent(db.pool(), &new_agent("Alpha")).await.unwrap();
        set_agent_status(db.pool(), zeta.id, "inactive").await.unwrap();
        create_agent(db.pool(), &new_agent("Beta")).await.unwrap();

        let names: Vec<_> = list_active_agents(db.pool())
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);
        assert_eq!(list_agents(db.pool()).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_agent() {
        let db = test_db().await;
        let result = get_agent(db.pool(), 42).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));

        let result = set_agent_status(db.pool(), 42, "inactive").await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }
}
