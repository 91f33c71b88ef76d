//! Chat routes: messages, retry, cancel, turn state and export.

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use orchestrator::{
    Action, AgentId, FailureReason, Message, OrchestratorError, Resource, TurnOutcome,
    TurnSnapshot,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::identity::CurrentUser;
use crate::state::AppState;

/// Options for listing messages.
#[derive(Debug, Default, Deserialize)]
pub struct MessagesQuery {
    /// Only return the latest `limit` messages.
    pub limit: Option<usize>,
}

/// A conversation as shown when it is opened.
#[derive(Debug, Serialize)]
pub struct Conversation {
    /// Greeting, present while subscribed.
    pub welcome: Option<String>,
    pub messages: Vec<Message>,
}

/// Body of a new chat message.
#[derive(Debug, Deserialize)]
pub struct SendMessage {
    pub content: String,
}

/// Outcome of a turn, with an error message when it failed.
#[derive(Debug, Serialize)]
pub struct TurnResponse {
    #[serde(flatten)]
    pub outcome: TurnOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IntoResponse for TurnResponse {
    fn into_response(self) -> Response {
        let status = match &self.outcome {
            TurnOutcome::Settled { .. } => StatusCode::CREATED,
            TurnOutcome::Failed {
                reason: FailureReason::Generator { .. },
                ..
            } => StatusCode::BAD_GATEWAY,
            TurnOutcome::Failed { .. } => StatusCode::OK,
        };
        (status, Json(self)).into_response()
    }
}

impl From<TurnOutcome> for TurnResponse {
    fn from(outcome: TurnOutcome) -> Self {
        let error = match &outcome {
            TurnOutcome::Settled { .. } => None,
            TurnOutcome::Failed { reason, .. } => Some(match reason {
                FailureReason::Generator { detail, .. } => detail.clone(),
                FailureReason::Cancelled => "reply cancelled".to_string(),
                FailureReason::Unsubscribed => "subscription ended".to_string(),
                FailureReason::Storage { detail } => detail.clone(),
            }),
        };
        Self { outcome, error }
    }
}

/// Open a conversation: welcome message plus history.
pub async fn list_messages(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(agent_id): Path<AgentId>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Conversation>> {
    user.require(Resource::Chat, Action::Read)?;
    state.hub.catalog().get(agent_id).await?;

    let welcome = match state.hub.welcome(&user.id, agent_id).await {
        Ok(welcome) => Some(welcome),
        Err(OrchestratorError::NotSubscribed { .. }) => None,
        Err(err) => return Err(err.into()),
    };
    let messages = match query.limit {
        Some(limit) => {
            state
                .hub
                .conversations()
                .recent(&user.id, agent_id, limit)
                .await?
        }
        None => state.hub.history(&user.id, agent_id).collect().await?,
    };

    Ok(Json(Conversation { welcome, messages }))
}

/// Send a message and wait for the agent's reply.
pub async fn send_message(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(agent_id): Path<AgentId>,
    Json(body): Json<SendMessage>,
) -> Result<TurnResponse> {
    user.require(Resource::Chat, Action::Create)?;
    let outcome = state.hub.submit(&user.id, agent_id, &body.content).await?;
    Ok(outcome.into())
}

/// Regenerate the reply for the last failed turn.
pub async fn retry(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(agent_id): Path<AgentId>,
) -> Result<TurnResponse> {
    user.require(Resource::Chat, Action::Create)?;
    let outcome = state.hub.retry(&user.id, agent_id).await?;
    Ok(outcome.into())
}

/// Cancel the reply being generated.
pub async fn cancel(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(agent_id): Path<AgentId>,
) -> Result<StatusCode> {
    user.require(Resource::Chat, Action::Create)?;
    state.hub.cancel(&user.id, agent_id).await?;
    Ok(StatusCode::ACCEPTED)
}

/// Current turn state.
pub async fn turn_state(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(agent_id): Path<AgentId>,
) -> Result<Json<TurnSnapshot>> {
    user.require(Resource::Chat, Action::Read)?;
    Ok(Json(state.hub.turn_state(&user.id, agent_id).await))
}

/// Download the conversation as plain text.
pub async fn export(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(agent_id): Path<AgentId>,
) -> Result<Response> {
    user.require(Resource::Chat, Action::Read)?;
    let agent = state.hub.catalog().get(agent_id).await?;

    let slug: String = agent
        .name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let filename = format!("chat-{}.txt", slug);
    let body = Body::from_stream(state.hub.export(&user.id, agent_id));

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response())
}
