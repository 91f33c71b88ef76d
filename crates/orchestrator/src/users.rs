//! User directory and access management.

use database::validation::validate_email;
use tracing::info;

use crate::error::{OrchestratorError, Result};
use crate::model::{Plan, User};
use crate::permissions::{authorize, Action, Resource, Role};
use crate::repository::SharedBackend;

/// Users as known to the hub.
#[derive(Clone)]
pub struct UserDirectory {
    backend: SharedBackend,
}

impl UserDirectory {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }

    /// Register a user on first sight (role `user`, plan `free`).
    ///
    /// Returns the stored user; name and email of known users are not
    /// overwritten. An empty email is allowed, a malformed one is not.
    pub async fn ensure(&self, id: &str, name: &str, email: &str) -> Result<User> {
        if id.trim().is_empty() {
            return Err(OrchestratorError::InvalidInput(
                "user id must not be empty".to_string(),
            ));
        }
        if !email.trim().is_empty() {
            validate_email(email).map_err(|e| OrchestratorError::InvalidInput(e.to_string()))?;
        }
        self.backend.ensure_user(id, name, email).await
    }

    pub async fn get(&self, id: &str) -> Result<User> {
        self.backend
            .get_user(id)
            .await?
            .ok_or_else(|| OrchestratorError::NotFound {
                entity: "User",
                id: id.to_string(),
            })
    }

    pub async fn list(&self, actor: Role) -> Result<Vec<User>> {
        authorize(actor, Resource::Users, Action::Read)?;
        self.backend.list_users().await
    }

    /// Change a user's role and plan.
    ///
    /// Admins may change plans and plain roles; granting or revoking an
    /// admin role requires a superadmin.
    pub async fn update_access(
        &self,
        actor: Role,
        user_id: &str,
        role: Role,
        plan: Plan,
    ) -> Result<User> {
        authorize(actor, Resource::Users, Action::Update)?;

        let current = self.get(user_id).await?;
        let touches_admin = role.is_admin() || current.role.is_admin();
        if touches_admin && role != current.role && actor != Role::SuperAdmin {
            return Err(OrchestratorError::Forbidden {
                role: actor,
                resource: Resource::Users,
                action: Action::Manage,
            });
        }

        self.backend.update_user_access(user_id, role, plan).await?;
        info!(user_id, role = %role, plan = plan.as_str(), "Updated user access");
        self.get(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryBackend;
    use std::sync::Arc;

    fn directory() -> UserDirectory {
        UserDirectory::new(Arc::new(MemoryBackend::new()))
    }

    #[tokio::test]
    async fn test_ensure_registers_once() {
        let users = directory();
        let first = users.ensure("u1", "Ada", "ada@example.com").await.unwrap();
        assert_eq!(first.role, Role::User);
        assert_eq!(first.plan, Plan::Free);

        let again = users.ensure("u1", "Other", "other@example.com").await.unwrap();
        assert_eq!(again.name, "Ada");
    }

    #[tokio::test]
    async fn test_ensure_rejects_malformed_email() {
        let users = directory();

        let result = users.ensure("u1", "Ada", "ada-at-example.com").await;
        assert!(matches!(
            result,
            Err(OrchestratorError::InvalidInput(msg)) if msg.starts_with("Invalid email")
        ));
        assert!(matches!(
            users.get("u1").await,
            Err(OrchestratorError::NotFound { .. })
        ));

        let anonymous = users.ensure("u2", "Bo", "").await.unwrap();
        assert_eq!(anonymous.email, "");
    }

    #[tokio::test]
    async fn test_admin_changes_plan_but_not_roles() {
        let users = directory();
        users.ensure("u1", "Ada", "ada@example.com").await.unwrap();

        let updated = users
            .update_access(Role::Admin, "u1", Role::User, Plan::Bundle)
            .await
            .unwrap();
        assert_eq!(updated.plan, Plan::Bundle);

        let promote = users
            .update_access(Role::Admin, "u1", Role::Admin, Plan::Bundle)
            .await;
        assert!(matches!(promote, Err(OrchestratorError::Forbidden { .. })));

        let promoted = users
            .update_access(Role::SuperAdmin, "u1", Role::Admin, Plan::Bundle)
            .await
            .unwrap();
        assert_eq!(promoted.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_plain_user_cannot_manage_users() {
        let users = directory();
        users.ensure("u1", "Ada", "ada@example.com").await.unwrap();

        assert!(matches!(
            users.list(Role::User).await,
            Err(OrchestratorError::Forbidden { .. })
        ));
        assert!(matches!(
            users.update_access(Role::Admin, "ghost", Role::User, Plan::Free).await,
            Err(OrchestratorError::NotFound { .. })
        ));
    }
}
