//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

use orchestrator::{HubConfig, OrchestratorError};

/// API server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// Storage, reply generator and session settings.
    pub hub: HubConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `API_ADDR` | Server bind address | `127.0.0.1:8790` |
    ///
    /// Hub variables are documented on [`HubConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("API_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8790".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let hub = HubConfig::from_env()?;

        Ok(Self { addr, hub })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid API_ADDR format")]
    InvalidAddr,

    #[error(transparent)]
    Hub(#[from] OrchestratorError),
}
