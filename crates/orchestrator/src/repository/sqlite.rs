//! SQLite backend built on the `database` crate.

use async_trait::async_trait;
use brain_core::{ExampleDialogue, GenerationSettings, PromptConfig};
use chrono::{DateTime, NaiveDate, Utc};
use database::{agent, api_key, message, stats, subscription, user, Database, DatabaseError};

use super::{
    AgentRepository, ApiKeyRepository, Backend, MessageRepository, StatsRepository,
    SubscriptionRepository, UserRepository,
};
use crate::error::{OrchestratorError, Result};
use crate::model::{
    format_timestamp, mask_secret, Agent, AgentDraft, AgentId, AgentStatus, ApiKey,
    ConversationKey, HubStats, Message, Plan, Sender, SubscriptionRecord, User,
};
use crate::permissions::Role;

/// Backend that persists to SQLite.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    db: Database,
}

impl SqliteBackend {
    /// Wrap an already migrated database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Connect to `url` and run migrations.
    pub async fn connect(url: &str) -> Result<Self> {
        let db = Database::connect(url).await?;
        db.migrate().await?;
        Ok(Self::new(db))
    }

    /// Private in-memory database, mostly for tests.
    pub async fn in_memory() -> Result<Self> {
        Ok(Self::new(Database::connect_in_memory().await?))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

/// Translate storage errors that have a domain meaning.
fn storage_error(err: DatabaseError) -> OrchestratorError {
    match err {
        DatabaseError::NotFound { entity, id } => OrchestratorError::NotFound { entity, id },
        DatabaseError::Conflict { entity, id } => {
            OrchestratorError::ConcurrencyConflict(format!("{} {} changed", entity, id))
        }
        other => OrchestratorError::Database(other),
    }
}

/// `Ok(None)` for missing rows.
fn optional<T>(result: database::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(DatabaseError::NotFound { .. }) => Ok(None),
        Err(err) => Err(storage_error(err)),
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| OrchestratorError::InvalidRecord(format!("timestamp {:?}: {}", value, e)))
}

fn agent_from_row(row: database::Agent) -> Result<Agent> {
    let examples: Vec<ExampleDialogue> = serde_json::from_str(&row.examples).map_err(|e| {
        OrchestratorError::InvalidRecord(format!("agent {} examples: {}", row.id, e))
    })?;

    Ok(Agent {
        id: row.id,
        name: row.name,
        category: row.category,
        description: row.description,
        price: row.price,
        icon: row.icon,
        prompt: PromptConfig {
            system: row.system_prompt,
            welcome: row.welcome_message,
            examples,
        },
        settings: GenerationSettings {
            temperature: row.temperature as f32,
            max_tokens: u32::try_from(row.max_tokens).unwrap_or(u32::MAX),
            model: row.model,
        },
        prompt_hash: row.prompt_hash,
        status: AgentStatus::parse(&row.status),
        created_at: parse_timestamp(&row.created_at)?,
    })
}

fn subscription_from_row(row: database::Subscription) -> Result<SubscriptionRecord> {
    Ok(SubscriptionRecord {
        id: row.id,
        user_id: row.user_id,
        agent_id: row.agent_id,
        active: row.active,
        version: row.version,
        created_at: parse_timestamp(&row.created_at)?,
        ended_at: row.ended_at.as_deref().map(parse_timestamp).transpose()?,
    })
}

fn message_from_row(row: database::Message) -> Result<Message> {
    let sender = Sender::parse(&row.sender).ok_or_else(|| {
        OrchestratorError::InvalidRecord(format!("message {} sender {:?}", row.id, row.sender))
    })?;

    Ok(Message {
        id: row.id,
        user_id: row.user_id,
        agent_id: row.agent_id,
        seq: row.seq,
        sender,
        content: row.content,
        timestamp: parse_timestamp(&row.created_at)?,
    })
}

fn user_from_row(row: database::User) -> Result<User> {
    let join_date = NaiveDate::parse_from_str(&row.join_date, "%Y-%m-%d").map_err(|e| {
        OrchestratorError::InvalidRecord(format!("user {} join date: {}", row.id, e))
    })?;

    Ok(User {
        id: row.id,
        name: row.name,
        email: row.email,
        role: Role::parse(&row.role),
        plan: Plan::parse(&row.plan),
        join_date,
    })
}

fn api_key_from_row(row: database::ApiKey) -> Result<ApiKey> {
    Ok(ApiKey {
        id: row.id,
        masked: mask_secret(&row.secret),
        name: row.name,
        provider: row.provider,
        secret: row.secret,
        description: row.description,
        active: row.active,
        created_at: parse_timestamp(&row.created_at)?,
        requests_today: row.requests_today,
        total_requests: row.total_requests,
        last_used: row.last_used.as_deref().map(parse_timestamp).transpose()?,
        monthly_cost: row.monthly_cost,
    })
}

fn limit(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl AgentRepository for SqliteBackend {
    async fn insert_agent(&self, draft: &AgentDraft, prompt_hash: &str) -> Result<Agent> {
        let examples = serde_json::to_string(&draft.prompt.examples)
            .map_err(|e| OrchestratorError::InvalidInput(format!("examples: {}", e)))?;
        let new_agent = database::NewAgent {
            name: draft.name.clone(),
            category: draft.category.clone(),
            description: draft.description.clone(),
            price: draft.price,
            icon: draft.icon.clone(),
            system_prompt: draft.prompt.system.clone(),
            welcome_message: draft.prompt.welcome.clone(),
            examples,
            temperature: f64::from(draft.settings.temperature),
            max_tokens: i64::from(draft.settings.max_tokens),
            model: draft.settings.model.clone(),
            prompt_hash: prompt_hash.to_string(),
        };

        let row = agent::create_agent(self.db.pool(), &new_agent)
            .await
            .map_err(storage_error)?;
        agent_from_row(row)
    }

    async fn get_agent(&self, id: AgentId) -> Result<Option<Agent>> {
        optional(agent::get_agent(self.db.pool(), id).await)?
            .map(agent_from_row)
            .transpose()
    }

    async fn list_agents(&self, active_only: bool) -> Result<Vec<Agent>> {
        let rows = if active_only {
            agent::list_active_agents(self.db.pool()).await
        } else {
            agent::list_agents(self.db.pool()).await
        }
        .map_err(storage_error)?;
        rows.into_iter().map(agent_from_row).collect()
    }

    async fn set_agent_status(&self, id: AgentId, status: AgentStatus) -> Result<()> {
        agent::set_agent_status(self.db.pool(), id, status.as_str())
            .await
            .map_err(storage_error)
    }
}

#[async_trait]
impl SubscriptionRepository for SqliteBackend {
    async fn insert_subscription(
        &self,
        key: &ConversationKey,
        created_at: DateTime<Utc>,
    ) -> Result<SubscriptionRecord> {
        let result = subscription::insert_active(
            self.db.pool(),
            &key.user_id,
            key.agent_id,
            &format_timestamp(&created_at),
        )
        .await;

        match result {
            Ok(row) => subscription_from_row(row),
            Err(DatabaseError::AlreadyExists { .. }) => Err(OrchestratorError::AlreadySubscribed {
                user_id: key.user_id.clone(),
                agent_id: key.agent_id,
            }),
            Err(err) => Err(storage_error(err)),
        }
    }

    async fn active_subscription(
        &self,
        key: &ConversationKey,
    ) -> Result<Option<SubscriptionRecord>> {
        subscription::get_active(self.db.pool(), &key.user_id, key.agent_id)
            .await
            .map_err(storage_error)?
            .map(subscription_from_row)
            .transpose()
    }

    async fn deactivate_subscription(
        &self,
        id: i64,
        expected_version: i64,
        ended_at: DateTime<Utc>,
    ) -> Result<()> {
        subscription::deactivate(
            self.db.pool(),
            id,
            expected_version,
            &format_timestamp(&ended_at),
        )
        .await
        .map_err(storage_error)
    }

    async fn subscribed_agents(&self, user_id: &str) -> Result<Vec<Agent>> {
        subscription::list_subscribed_agents(self.db.pool(), user_id)
            .await
            .map_err(storage_error)?
            .into_iter()
            .map(agent_from_row)
            .collect()
    }

    async fn subscription_history(
        &self,
        key: &ConversationKey,
    ) -> Result<Vec<SubscriptionRecord>> {
        subscription::history(self.db.pool(), &key.user_id, key.agent_id)
            .await
            .map_err(storage_error)?
            .into_iter()
            .map(subscription_from_row)
            .collect()
    }
}

#[async_trait]
impl MessageRepository for SqliteBackend {
    async fn append_message(
        &self,
        key: &ConversationKey,
        sender: Sender,
        content: &str,
        at: DateTime<Utc>,
    ) -> Result<Message> {
        let row = message::append(
            self.db.pool(),
            &key.user_id,
            key.agent_id,
            sender.as_str(),
            content,
            &format_timestamp(&at),
        )
        .await
        .map_err(storage_error)?;
        message_from_row(row)
    }

    async fn message_page(
        &self,
        key: &ConversationKey,
        after_seq: i64,
        page_size: usize,
    ) -> Result<Vec<Message>> {
        message::page(
            self.db.pool(),
            &key.user_id,
            key.agent_id,
            after_seq,
            limit(page_size),
        )
        .await
        .map_err(storage_error)?
        .into_iter()
        .map(message_from_row)
        .collect()
    }

    async fn recent_messages(&self, key: &ConversationKey, count: usize) -> Result<Vec<Message>> {
        message::recent(self.db.pool(), &key.user_id, key.agent_id, limit(count))
            .await
            .map_err(storage_error)?
            .into_iter()
            .map(message_from_row)
            .collect()
    }

    async fn message_count(&self, key: &ConversationKey) -> Result<i64> {
        message::count(self.db.pool(), &key.user_id, key.agent_id)
            .await
            .map_err(storage_error)
    }
}

#[async_trait]
impl UserRepository for SqliteBackend {
    async fn ensure_user(&self, id: &str, name: &str, email: &str) -> Result<User> {
        let row = user::ensure_user(self.db.pool(), id, name, email)
            .await
            .map_err(storage_error)?;
        user_from_row(row)
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        optional(user::get_user(self.db.pool(), id).await)?
            .map(user_from_row)
            .transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        user::list_users(self.db.pool())
            .await
            .map_err(storage_error)?
            .into_iter()
            .map(user_from_row)
            .collect()
    }

    async fn update_user_access(&self, id: &str, role: Role, plan: Plan) -> Result<()> {
        user::update_access(self.db.pool(), id, role.as_str(), plan.as_str())
            .await
            .map_err(storage_error)
    }
}

#[async_trait]
impl ApiKeyRepository for SqliteBackend {
    async fn insert_api_key(
        &self,
        name: &str,
        provider: &str,
        secret: &str,
        description: &str,
    ) -> Result<ApiKey> {
        let row = api_key::create_api_key(self.db.pool(), name, provider, secret, description)
            .await
            .map_err(storage_error)?;
        api_key_from_row(row)
    }

    async fn list_api_keys(&self) -> Result<Vec<ApiKey>> {
        api_key::list_api_keys(self.db.pool())
            .await
            .map_err(storage_error)?
            .into_iter()
            .map(api_key_from_row)
            .collect()
    }

    async fn set_api_key_active(&self, id: i64, active: bool) -> Result<()> {
        api_key::set_active(self.db.pool(), id, active)
            .await
            .map_err(storage_error)
    }

    async fn delete_api_key(&self, id: i64) -> Result<()> {
        api_key::delete_api_key(self.db.pool(), id)
            .await
            .map_err(storage_error)
    }
}

#[async_trait]
impl StatsRepository for SqliteBackend {
    async fn stats(&self) -> Result<HubStats> {
        let counts = stats::admin_stats(self.db.pool())
            .await
            .map_err(storage_error)?;
        Ok(HubStats {
            users: counts.users,
            active_agents: counts.active_agents,
            active_subscriptions: counts.active_subscriptions,
            messages: counts.messages,
        })
    }
}

impl Backend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }
}
