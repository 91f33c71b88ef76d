//! Agent Hub API server.

use api::{AppState, Config};
use orchestrator::AgentHub;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, storage = ?config.hub.storage, "Starting Agent Hub API");

    // Open storage, build the reply generator, seed the catalog
    let hub = AgentHub::from_config(&config.hub).await?;

    let app = api::app(AppState::new(hub));

    info!(addr = %config.addr, "Agent Hub API listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
