//! Error types for the HTTP API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use orchestrator::OrchestratorError;
use thiserror::Error;

/// Errors returned by handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Error from the hub.
    #[error(transparent)]
    Hub(#[from] OrchestratorError),

    /// Identity headers missing or malformed.
    #[error("Missing or invalid identity headers")]
    Unauthorized,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Hub(err) => match err {
                OrchestratorError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                OrchestratorError::NotSubscribed { .. } | OrchestratorError::Forbidden { .. } => {
                    StatusCode::FORBIDDEN
                }
                OrchestratorError::NotFound { .. } => StatusCode::NOT_FOUND,
                OrchestratorError::AlreadySubscribed { .. }
                | OrchestratorError::ConcurrencyConflict(_)
                | OrchestratorError::NoPendingTurn { .. } => StatusCode::CONFLICT,
                OrchestratorError::ReplyGenerator(_) => StatusCode::BAD_GATEWAY,
                OrchestratorError::Database(_)
                | OrchestratorError::Configuration(_)
                | OrchestratorError::InvalidRecord(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!(status = status.as_u16(), "Request rejected: {}", self);
        }

        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
