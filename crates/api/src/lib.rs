//! HTTP API for Agent Hub.
//!
//! Exposes the marketplace, subscriptions, chat and the admin console over
//! JSON. Identity comes from gateway headers, see [`identity`].

pub mod config;
pub mod error;
pub mod identity;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::ApiError;
pub use state::AppState;

/// The complete application with state attached.
pub fn app(state: AppState) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
