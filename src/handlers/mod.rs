//! Request handlers, grouped by surface: `public` (no session), `auth`
//! (credential endpoints), `onboarding`, `church` and `people` (tenant
//! scoped). Tenant-scoped handlers receive their [`TenantBinding`] as an
//! extractor; the gate middleware put it in request extensions.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;

use crate::error::ApiError;
use crate::session::{Principal, TenantBinding};
use crate::types::Role;

pub mod auth;
pub mod church;
pub mod onboarding;
pub mod people;
pub mod public;

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Principal>()
            .cloned()
            .unwrap_or(Principal::Anonymous))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for TenantBinding
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(binding) = parts.extensions.get::<TenantBinding>() {
            return Ok(*binding);
        }
        match parts.extensions.get::<Principal>() {
            Some(Principal::Authenticated { .. }) => Err(ApiError::forbidden(
                "This account is not linked to a church yet",
            )),
            _ => Err(ApiError::unauthorized("Sign in required")),
        }
    }
}

/// Role floor for privileged tenant actions.
pub fn require_role(binding: &TenantBinding, floor: Role) -> Result<(), ApiError> {
    if binding.role >= floor {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "Your role does not allow this action",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn binding_with(role: Role) -> TenantBinding {
        TenantBinding {
            church_id: Uuid::new_v4(),
            profile_id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn role_floor_admits_equal_and_above() {
        assert!(require_role(&binding_with(Role::Pastor), Role::Pastor).is_ok());
        assert!(require_role(&binding_with(Role::Master), Role::Pastor).is_ok());
        assert!(require_role(&binding_with(Role::Elder), Role::Pastor).is_err());
        assert!(require_role(&binding_with(Role::Member), Role::TeamMember).is_err());
        assert!(require_role(&binding_with(Role::TeamMember), Role::TeamMember).is_ok());
    }
}
