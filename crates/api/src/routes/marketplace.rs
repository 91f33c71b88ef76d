//! Marketplace routes.

use axum::extract::{Path, Query, State};
use axum::Json;
use orchestrator::{Action, Agent, AgentId, Resource};
use serde::Deserialize;

use crate::error::Result;
use crate::identity::CurrentUser;
use crate::state::AppState;

/// Marketplace filters.
#[derive(Debug, Default, Deserialize)]
pub struct MarketplaceQuery {
    pub category: Option<String>,
    pub q: Option<String>,
}

/// List active agents, optionally filtered by category and search text.
pub async fn list_agents(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<MarketplaceQuery>,
) -> Result<Json<Vec<Agent>>> {
    user.require(Resource::Agents, Action::Read)?;
    let agents = state
        .hub
        .catalog()
        .marketplace(query.category.as_deref(), query.q.as_deref())
        .await?;
    Ok(Json(agents))
}

/// Get one agent. Admins can see inactive agents too.
pub async fn get_agent(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(agent_id): Path<AgentId>,
) -> Result<Json<Agent>> {
    user.require(Resource::Agents, Action::Read)?;
    let catalog = state.hub.catalog();
    let agent = if user.role.is_admin() {
        catalog.get(agent_id).await?
    } else {
        catalog.get_active(agent_id).await?
    };
    Ok(Json(agent))
}
