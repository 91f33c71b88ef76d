//! Caller identity.
//!
//! Authentication happens upstream. The gateway forwards the authenticated
//! user in `x-user-id` and `x-user-role` (plus optional `x-user-name` and
//! `x-user-email`), and this service trusts those headers.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use orchestrator::{authorize, Action, Resource, Role};

use crate::error::{ApiError, Result};
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// The authenticated caller.
///
/// `role` always comes from the `x-user-role` header. The role stored in the
/// user directory (set through the admin console) is informational and is
/// not consulted for authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub role: Role,
}

impl CurrentUser {
    /// Fail with `Forbidden` unless the caller's role allows the action.
    pub fn require(&self, resource: Resource, action: Action) -> Result<()> {
        authorize(self.role, resource, action)?;
        Ok(())
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let id = header(&parts.headers, USER_ID_HEADER).ok_or(ApiError::Unauthorized)?;
        let role = header(&parts.headers, USER_ROLE_HEADER)
            .map(Role::parse)
            .unwrap_or(Role::User);
        let name = header(&parts.headers, USER_NAME_HEADER).unwrap_or(id);
        let email = header(&parts.headers, USER_EMAIL_HEADER).unwrap_or("");

        state.hub.users().ensure(id, name, email).await?;

        Ok(CurrentUser {
            id: id.to_string(),
            role,
        })
    }
}
