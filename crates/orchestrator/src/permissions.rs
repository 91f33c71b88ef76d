//! Role-based capability checks.
//!
//! The identity provider supplies a role with every call; this module decides
//! what that role may do. The table matches the product's role permissions:
//! users chat and browse agents, admins manage agents and users, superadmins
//! additionally manage the system (API keys) and user accounts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::OrchestratorError;

/// A user's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::SuperAdmin => "superadmin",
        }
    }

    /// Parse a role name case-insensitively; unknown roles are plain users.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "superadmin" => Role::SuperAdmin,
            _ => Role::User,
        }
    }

    /// Whether the role sees the admin console.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something a capability applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Agents,
    Chat,
    Profile,
    Users,
    Analytics,
    System,
}

/// An operation on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    Manage,
}

/// Whether `role` may perform `action` on `resource`.
pub fn can(role: Role, resource: Resource, action: Action) -> bool {
    use Action::*;
    use Resource::*;

    match (role, resource, action) {
        (_, Agents, Read | Create) => true,
        (_, Chat, Read | Create) => true,
        (_, Profile, Update) => true,

        (Role::Admin | Role::SuperAdmin, Agents, Update | Delete) => true,
        (Role::Admin | Role::SuperAdmin, Users, Read | Update) => true,
        (Role::Admin | Role::SuperAdmin, Analytics, Read) => true,

        (Role::SuperAdmin, Users, Create | Delete) => true,
        (Role::SuperAdmin, System, Manage) => true,

        _ => false,
    }
}

/// Like [`can`], but returns `Forbidden` on denial.
pub fn authorize(role: Role, resource: Resource, action: Action) -> Result<(), OrchestratorError> {
    if can(role, resource, action) {
        Ok(())
    } else {
        Err(OrchestratorError::Forbidden {
            role,
            resource,
            action,
        })
    }
}
