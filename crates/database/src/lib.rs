//! SQLite persistence layer for Agent Hub.
//!
//! This crate provides async database operations for the agent catalog,
//! users, the subscription ledger, conversation messages and provider API
//! keys using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{subscription, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:agent_hub.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let agents = subscription::list_subscribed_agents(db.pool(), "user-1").await?;
//!     println!("{} agents", agents.len());
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod api_key;
pub mod error;
pub mod message;
pub mod models;
pub mod stats;
pub mod subscription;
pub mod user;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use models::{AdminStats, Agent, ApiKey, Message, NewAgent, Subscription, User};
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    /// Set high enough to handle concurrent chat turns.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// let db = database::Database::connect("sqlite:data/agent_hub.db?mode=rwc").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Open a migrated, private in-memory database.
    ///
    /// Every SQLite `:memory:` connection is its own database, so the pool
    /// is pinned to one connection that is never recycled.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn test_user_crud() {
        let db = test_db().await;

        // Create
        let user = User {
            id: "test-uuid-123".to_string(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            role: "user".to_string(),
            plan: "free".to_string(),
            join_date: "2025-06-01".to_string(),
        };
        user::create_user(db.pool(), &user).await.unwrap();

        // Read
        let fetched = user::get_user(db.pool(), &user.id).await.unwrap();
        assert_eq!(fetched.name, "Alice");

        // Update
        user::update_access(db.pool(), &user.id, "admin", "bundle")
            .await
            .unwrap();
        let fetched = user::get_user(db.pool(), &user.id).await.unwrap();
        assert_eq!(fetched.role, "admin");
        assert_eq!(fetched.plan, "bundle");

        // List
        let users = user::list_users(db.pool()).await.unwrap();
        assert_eq!(users.len(), 1);

        // Duplicate
        let result = user::create_user(db.pool(), &user).await;
        assert!(matches!(result, Err(DatabaseError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_admin_stats() {
        let db = test_db().await;
        let agent = agent::create_agent(db.pool(), &new_agent("Tagline Pro"))
            .await
            .unwrap();
        subscription::insert_active(db.pool(), "u1", agent.id, "2025-06-01T00:00:00.000Z")
            .await
            .unwrap();
        message::append(
            db.pool(),
            "u1",
            agent.id,
            "user",
            "hello",
            "2025-06-01T00:00:01.000Z",
        )
        .await
        .unwrap();

        let stats = stats::admin_stats(db.pool()).await.unwrap();
        assert_eq!(stats.active_agents, 1);
        assert_eq!(stats.active_subscriptions, 1);
        assert_eq!(stats.messages, 1);
        assert_eq!(stats.users, 0);
    }
}
