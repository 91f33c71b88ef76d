//! Route handlers for the HTTP API.

pub mod admin;
pub mod chat;
pub mod health;
pub mod marketplace;
pub mod subscriptions;

use axum::routing::{delete, get, patch, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Marketplace
        .route("/api/marketplace", get(marketplace::list_agents))
        .route("/api/agents/:id", get(marketplace::get_agent))
        // Subscriptions
        .route("/api/me/agents", get(subscriptions::my_agents))
        .route(
            "/api/me/agents/:id/subscription",
            post(subscriptions::subscribe).delete(subscriptions::unsubscribe),
        )
        // Chat
        .route(
            "/api/chat/:agent_id/messages",
            get(chat::list_messages).post(chat::send_message),
        )
        .route("/api/chat/:agent_id/retry", post(chat::retry))
        .route("/api/chat/:agent_id/cancel", post(chat::cancel))
        .route("/api/chat/:agent_id/state", get(chat::turn_state))
        .route("/api/chat/:agent_id/export", get(chat::export))
        // Admin console
        .route("/api/admin/agents", post(admin::create_agent))
        .route("/api/admin/agents/test", post(admin::test_agent))
        .route("/api/admin/agents/:id", delete(admin::delete_agent))
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/:id", patch(admin::update_user))
        .route("/api/admin/stats", get(admin::stats))
        .route(
            "/api/admin/api-keys",
            get(admin::list_api_keys).post(admin::create_api_key),
        )
        .route(
            "/api/admin/api-keys/:id",
            patch(admin::update_api_key).delete(admin::delete_api_key),
        )
}
