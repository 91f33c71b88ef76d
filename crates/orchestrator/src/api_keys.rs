//! Provider API key registry for the admin console.

use database::validation::validate_required;
use tracing::info;

use crate::error::{OrchestratorError, Result};
use crate::model::ApiKey;
use crate::repository::SharedBackend;

/// Stored provider keys. Secrets only leave through [`ApiKey::secret`],
/// which is never serialized.
#[derive(Clone)]
pub struct ApiKeyRegistry {
    backend: SharedBackend,
}

impl ApiKeyRegistry {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }

    pub async fn create(
        &self,
        name: &str,
        provider: &str,
        secret: &str,
        description: &str,
    ) -> Result<ApiKey> {
        for (field, value) in [("Name", name), ("Provider", provider), ("Key", secret)] {
            validate_required(field, value)
                .map_err(|e| OrchestratorError::InvalidInput(e.to_string()))?;
        }

        let key = self
            .backend
            .insert_api_key(name.trim(), provider.trim(), secret.trim(), description)
            .await?;
        info!(key_id = key.id, provider = %key.provider, "Added API key");
        Ok(key)
    }

    /// Newest first.
    pub async fn list(&self) -> Result<Vec<ApiKey>> {
        self.backend.list_api_keys().await
    }

    pub async fn set_active(&self, id: i64, active: bool) -> Result<()> {
        self.backend.set_api_key_active(id, active).await?;
        info!(key_id = id, active, "Toggled API key");
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.backend.delete_api_key(id).await?;
        info!(key_id = id, "Deleted API key");
        Ok(())
    }
}
