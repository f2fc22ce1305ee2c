//! The onboarding surface: a status probe for the flow itself and the
//! submission endpoint that runs the provisioner.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::{generate_jwt, Claims};
use crate::error::ApiError;
use crate::response::{ApiResponse, ApiResult};
use crate::session::Principal;
use crate::tenancy::{provision, OnboardingRequest};
use crate::types::Role;

/// GET /onboarding. The gate only admits authenticated principals with
/// no tenant bound, so this just echoes what the flow needs.
pub async fn status(principal: Principal) -> ApiResult<Value> {
    match principal {
        Principal::Authenticated { email, .. } => Ok(ApiResponse::success(json!({
            "needs_onboarding": true,
            "email": email,
        }))),
        Principal::Anonymous => Err(ApiError::unauthorized("Sign in required")),
    }
}

/// POST /api/onboarding. On success the response carries a fresh token
/// with the new binding baked in, so the client does not keep using the
/// pre-onboarding one.
pub async fn submit(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<OnboardingRequest>,
) -> ApiResult<Value> {
    request.validate()?;
    let outcome = provision(state.store.as_ref(), &principal, request).await?;

    let Principal::Authenticated { user_id, email, .. } = principal else {
        return Err(ApiError::unauthorized("Sign in required"));
    };
    let claims = Claims::new(user_id, email).with_binding(
        outcome.church_id,
        outcome.profile_id,
        Role::Master,
    );
    let token = generate_jwt(&claims)?;

    Ok(ApiResponse::created(json!({
        "church_id": outcome.church_id,
        "slug": outcome.slug,
        "token": token,
    })))
}
