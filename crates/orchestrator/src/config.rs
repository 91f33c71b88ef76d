//! Hub configuration loaded from environment variables.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use brain_core::Brain;
use mock_brain::{CannedBrain, DelayedBrain, EchoBrain};

use crate::error::{OrchestratorError, Result};
use crate::repository::{MemoryBackend, SharedBackend, SqliteBackend};
use crate::session::{DEFAULT_HISTORY_WINDOW, DEFAULT_REPLY_TIMEOUT};

/// Default SQLite URL.
pub const DEFAULT_SQLITE_PATH: &str = "sqlite:agent_hub.db?mode=rwc";

/// Default simulated reply latency, matching the product's typing delay.
pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(1200);

/// Where hub data lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Sqlite { url: String },
}

/// Which reply generator answers chats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrainKind {
    /// The product's canned responses.
    Canned,
    /// Repeats the user's message.
    Echo,
}

/// Configuration for [`crate::AgentHub`].
#[derive(Debug, Clone)]
pub struct HubConfig {
    pub storage: StorageBackend,
    pub brain: BrainKind,
    /// Artificial latency added before each reply.
    pub reply_delay: Duration,
    /// Upper bound on one reply generation.
    pub reply_timeout: Duration,
    /// Earlier messages sent to the generator with each turn.
    pub history_window: usize,
    /// Insert demo agents when the catalog is empty.
    pub seed_catalog: bool,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::Memory,
            brain: BrainKind::Canned,
            reply_delay: DEFAULT_REPLY_DELAY,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
            history_window: DEFAULT_HISTORY_WINDOW,
            seed_catalog: true,
        }
    }
}

impl HubConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `STORAGE_BACKEND` | `memory` or `sqlite` | `memory` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:agent_hub.db?mode=rwc` |
    /// | `REPLY_BRAIN` | `canned` or `echo` | `canned` |
    /// | `REPLY_DELAY_MS` | Simulated reply latency | `1200` |
    /// | `REPLY_TIMEOUT_SECS` | Reply generation timeout | `30` |
    /// | `HISTORY_WINDOW` | Messages of context per turn | `20` |
    /// | `SEED_CATALOG` | Seed demo agents into an empty catalog | `true` |
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let storage = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "memory".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" => StorageBackend::Memory,
            "sqlite" => StorageBackend::Sqlite {
                url: env::var("SQLITE_PATH").unwrap_or_else(|_| DEFAULT_SQLITE_PATH.to_string()),
            },
            other => {
                return Err(OrchestratorError::Configuration(format!(
                    "unknown STORAGE_BACKEND: {}",
                    other
                )))
            }
        };

        let brain = match env::var("REPLY_BRAIN")
            .unwrap_or_else(|_| "canned".to_string())
            .to_lowercase()
            .as_str()
        {
            "canned" => BrainKind::Canned,
            "echo" => BrainKind::Echo,
            other => {
                return Err(OrchestratorError::Configuration(format!(
                    "unknown REPLY_BRAIN: {}",
                    other
                )))
            }
        };

        let reply_delay = env::var("REPLY_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.reply_delay);

        let reply_timeout = env::var("REPLY_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.reply_timeout);

        let history_window = env::var("HISTORY_WINDOW")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.history_window);

        let seed_catalog = env::var("SEED_CATALOG")
            .ok()
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(defaults.seed_catalog);

        Ok(Self {
            storage,
            brain,
            reply_delay,
            reply_timeout,
            history_window,
            seed_catalog,
        })
    }

    /// Open the configured storage backend.
    pub async fn open_backend(&self) -> Result<SharedBackend> {
        match &self.storage {
            StorageBackend::Memory => Ok(Arc::new(MemoryBackend::new())),
            StorageBackend::Sqlite { url } => Ok(Arc::new(SqliteBackend::connect(url).await?)),
        }
    }

    /// Build the configured reply generator.
    pub fn build_brain(&self) -> Arc<dyn Brain> {
        match (self.brain, self.reply_delay.is_zero()) {
            (BrainKind::Canned, true) => Arc::new(CannedBrain::new()),
            (BrainKind::Canned, false) => {
                Arc::new(DelayedBrain::new(CannedBrain::new(), self.reply_delay))
            }
            (BrainKind::Echo, true) => Arc::new(EchoBrain::new()),
            (BrainKind::Echo, false) => {
                Arc::new(DelayedBrain::new(EchoBrain::new(), self.reply_delay))
            }
        }
    }
}
