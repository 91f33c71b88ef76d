//! Agent catalog: marketplace listing, lookup and admin workflows.

use database::validation::{
    validate_agent_name, validate_max_tokens, validate_model_length, validate_price,
    validate_required, validate_temperature,
};
use serde::Serialize;
use tracing::info;

use crate::error::{OrchestratorError, Result};
use crate::model::{Agent, AgentDraft, AgentId, AgentStatus};
use crate::repository::SharedBackend;

/// Category value that disables category filtering.
pub const ALL_CATEGORIES: &str = "All";

/// Greeting used when an agent has no welcome message.
pub const DEFAULT_GREETING: &str = "How can I help you today?";

/// Result of an agent dry-run from the admin console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentTestReport {
    pub success: bool,
    pub issues: Vec<String>,
    /// What the agent would say when a conversation opens.
    pub sample_response: Option<String>,
}

/// Read-mostly view of the agent catalog.
#[derive(Clone)]
pub struct Catalog {
    backend: SharedBackend,
}

impl Catalog {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }

    /// Active agents ordered by name, optionally filtered.
    ///
    /// `category` matches exactly (case-insensitive) unless it is empty or
    /// [`ALL_CATEGORIES`]. `query` matches anywhere in the name or
    /// description.
    pub async fn marketplace(
        &self,
        category: Option<&str>,
        query: Option<&str>,
    ) -> Result<Vec<Agent>> {
        let category = category
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case(ALL_CATEGORIES));
        let query = query
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());

        let agents = self.backend.list_agents(true).await?;
        Ok(agents
            .into_iter()
            .filter(|agent| category.map_or(true, |c| agent.category.eq_ignore_ascii_case(c)))
            .filter(|agent| {
                query.as_deref().map_or(true, |q| {
                    agent.name.to_lowercase().contains(q)
                        || agent.description.to_lowercase().contains(q)
                })
            })
            .collect())
    }

    /// Every agent, including inactive ones.
    pub async fn all(&self) -> Result<Vec<Agent>> {
        self.backend.list_agents(false).await
    }

    /// Look up an agent regardless of status.
    pub async fn get(&self, id: AgentId) -> Result<Agent> {
        self.backend
            .get_agent(id)
            .await?
            .ok_or_else(|| OrchestratorError::agent_not_found(id))
    }

    /// Look up an agent that can be subscribed to.
    ///
    /// Inactive agents are reported as `NotFound`.
    pub async fn get_active(&self, id: AgentId) -> Result<Agent> {
        let agent = self.get(id).await?;
        if !agent.is_active() {
            return Err(OrchestratorError::agent_not_found(id));
        }
        Ok(agent)
    }

    /// Validate and store a new agent.
    pub async fn create(&self, draft: &AgentDraft) -> Result<Agent> {
        let issues = validate_draft(draft);
        if !issues.is_empty() {
            return Err(OrchestratorError::InvalidInput(issues.join("; ")));
        }

        let agent = self
            .backend
            .insert_agent(draft, &draft.prompt.fingerprint())
            .await?;
        info!(agent_id = agent.id, name = %agent.name, "Created agent");
        Ok(agent)
    }

    /// Dry-run a draft without storing it.
    pub fn test_agent(&self, draft: &AgentDraft) -> AgentTestReport {
        let issues = validate_draft(draft);
        if !issues.is_empty() {
            return AgentTestReport {
                success: false,
                issues,
                sample_response: None,
            };
        }

        AgentTestReport {
            success: true,
            issues,
            sample_response: Some(sample_greeting(&draft.name, &draft.prompt.welcome)),
        }
    }

    /// Take an agent off the marketplace.
    ///
    /// Existing subscriptions and conversations are left untouched.
    pub async fn deactivate(&self, id: AgentId) -> Result<()> {
        self.backend
            .set_agent_status(id, AgentStatus::Inactive)
            .await?;
        info!(agent_id = id, "Deactivated agent");
        Ok(())
    }

    /// Put an agent back on the marketplace.
    pub async fn activate(&self, id: AgentId) -> Result<()> {
        self.backend.set_agent_status(id, AgentStatus::Active).await
    }
}

/// Greeting shown when a conversation opens.
pub fn sample_greeting(name: &str, welcome: &str) -> String {
    let welcome = welcome.trim();
    let welcome = if welcome.is_empty() {
        DEFAULT_GREETING
    } else {
        welcome
    };
    format!("Hello! I'm {}. {}", name.trim(), welcome)
}

/// Collect every problem with a draft, in form order.
pub fn validate_draft(draft: &AgentDraft) -> Vec<String> {
    let checks = [
        validate_agent_name(&draft.name),
        validate_required("Category", &draft.category),
        validate_required("Description", &draft.description),
        validate_price(draft.price),
        validate_required("System prompt", &draft.prompt.system),
        validate_temperature(f64::from(draft.settings.temperature)),
        validate_max_tokens(i64::from(draft.settings.max_tokens)),
        validate_model_length(&draft.settings.model),
    ];

    checks
        .into_iter()
        .filter_map(|check| check.err())
        .map(|err| err.to_string())
        .collect()
}
