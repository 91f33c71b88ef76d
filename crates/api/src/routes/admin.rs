//! Admin console routes: agents, users, stats and provider API keys.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use orchestrator::{
    Action, Agent, AgentDraft, AgentId, AgentTestReport, ApiKey, HubStats, Plan, Resource, Role,
    User,
};
use serde::Deserialize;
use tracing::info;

use crate::error::Result;
use crate::identity::CurrentUser;
use crate::state::AppState;

/// Create an agent.
pub async fn create_agent(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(draft): Json<AgentDraft>,
) -> Result<(StatusCode, Json<Agent>)> {
    user.require(Resource::Agents, Action::Update)?;
    let agent = state.hub.catalog().create(&draft).await?;
    info!(admin = %user.id, agent_id = agent.id, "Agent created via admin console");
    Ok((StatusCode::CREATED, Json(agent)))
}

/// Dry-run an agent definition.
pub async fn test_agent(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(draft): Json<AgentDraft>,
) -> Result<Json<AgentTestReport>> {
    user.require(Resource::Agents, Action::Update)?;
    Ok(Json(state.hub.catalog().test_agent(&draft)))
}

/// Deactivate an agent.
pub async fn delete_agent(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(agent_id): Path<AgentId>,
) -> Result<StatusCode> {
    user.require(Resource::Agents, Action::Delete)?;
    state.hub.catalog().deactivate(agent_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_users(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<User>>> {
    Ok(Json(state.hub.users().list(user.role).await?))
}

/// New role and plan for a user.
#[derive(Debug, Deserialize)]
pub struct UpdateUser {
    pub role: Role,
    pub plan: Plan,
}

pub async fn update_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<String>,
    Json(update): Json<UpdateUser>,
) -> Result<Json<User>> {
    let updated = state
        .hub
        .users()
        .update_access(user.role, &user_id, update.role, update.plan)
        .await?;
    Ok(Json(updated))
}

pub async fn stats(State(state): State<AppState>, user: CurrentUser) -> Result<Json<HubStats>> {
    user.require(Resource::Analytics, Action::Read)?;
    Ok(Json(state.hub.stats().await?))
}

/// List provider keys; secrets are masked.
pub async fn list_api_keys(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<ApiKey>>> {
    user.require(Resource::System, Action::Manage)?;
    Ok(Json(state.hub.api_keys().list().await?))
}

/// New provider key.
#[derive(Debug, Deserialize)]
pub struct NewApiKey {
    pub name: String,
    pub provider: String,
    pub key: String,
    #[serde(default)]
    pub description: String,
}

pub async fn create_api_key(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<NewApiKey>,
) -> Result<(StatusCode, Json<ApiKey>)> {
    user.require(Resource::System, Action::Manage)?;
    let key = state
        .hub
        .api_keys()
        .create(&body.name, &body.provider, &body.key, &body.description)
        .await?;
    Ok((StatusCode::CREATED, Json(key)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateApiKey {
    pub active: bool,
}

pub async fn update_api_key(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(key_id): Path<i64>,
    Json(body): Json<UpdateApiKey>,
) -> Result<StatusCode> {
    user.require(Resource::System, Action::Manage)?;
    state.hub.api_keys().set_active(key_id, body.active).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_api_key(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(key_id): Path<i64>,
) -> Result<StatusCode> {
    user.require(Resource::System, Action::Manage)?;
    state.hub.api_keys().delete(key_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
