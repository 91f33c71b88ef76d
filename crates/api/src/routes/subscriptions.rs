//! "My agents" and subscription routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use orchestrator::{Action, Agent, AgentId, Resource, SubscriptionRecord};
use tracing::info;

use crate::error::Result;
use crate::identity::CurrentUser;
use crate::state::AppState;

/// The caller's subscribed agents, earliest subscription first.
pub async fn my_agents(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Agent>>> {
    user.require(Resource::Agents, Action::Read)?;
    Ok(Json(state.hub.my_agents(&user.id).await?))
}

/// Subscribe to an agent.
pub async fn subscribe(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(agent_id): Path<AgentId>,
) -> Result<(StatusCode, Json<SubscriptionRecord>)> {
    user.require(Resource::Agents, Action::Read)?;
    let record = state.hub.subscribe(&user.id, agent_id).await?;
    info!(user_id = %user.id, agent_id, "Subscription created via API");
    Ok((StatusCode::CREATED, Json(record)))
}

/// Unsubscribe from an agent. The conversation is kept.
pub async fn unsubscribe(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(agent_id): Path<AgentId>,
) -> Result<StatusCode> {
    user.require(Resource::Agents, Action::Read)?;
    state.hub.unsubscribe(&user.id, agent_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
