//! Credential endpoints. Registration creates the authentication identity
//! only; the tenant and profile come later through onboarding. Login
//! embeds the current binding in the token as an advisory claim; the
//! session resolver re-checks the profile row on every request.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::app::AppState;
use crate::auth::{generate_jwt, hash_password, verify_password, Claims};
use crate::error::ApiError;
use crate::response::{ApiResponse, ApiResult};
use crate::session::Principal;
use crate::store::{IdentityStore, NewUser};
use crate::types::ProfileStatus;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn check_credentials(email: &str, password: &str) -> Result<String, ApiError> {
    let email = email.trim().to_lowercase();
    let mut field_errors = HashMap::new();
    if !email.contains('@') {
        field_errors.insert("email".to_string(), "must be an email address".to_string());
    }
    if password.len() < 6 {
        field_errors.insert(
            "password".to_string(),
            "must be at least 6 characters".to_string(),
        );
    }
    if field_errors.is_empty() {
        Ok(email)
    } else {
        Err(ApiError::validation_error(
            "Please review the highlighted fields",
            Some(field_errors),
        ))
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<Value> {
    let email = check_credentials(&request.email, &request.password)?;
    let password_hash = hash_password(&request.password)?;
    let user = state
        .store
        .create_user(NewUser { email, password_hash })
        .await?;

    let token = generate_jwt(&Claims::new(user.id, user.email.clone()))?;
    tracing::info!(user_id = %user.id, "registered new account");
    Ok(ApiResponse::created(json!({
        "token": token,
        "user": { "id": user.id, "email": user.email },
    })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Value> {
    let email = request.email.trim().to_lowercase();
    let invalid = || ApiError::unauthorized("Invalid email or password");

    let user = state
        .store
        .user_by_email(&email)
        .await?
        .ok_or_else(invalid)?;
    if !verify_password(&user.password_hash, &request.password) {
        return Err(invalid());
    }

    // Advisory binding claim for clients; authorization always re-reads
    // the profile row.
    let mut claims = Claims::new(user.id, user.email.clone());
    let profile = state.store.profile_by_user(user.id).await?;
    let onboarded = match &profile {
        Some(profile) if profile.status == ProfileStatus::Active => {
            claims = claims.with_binding(profile.church_id, profile.id, profile.role);
            true
        }
        Some(_) => true,
        None => false,
    };

    let token = generate_jwt(&claims)?;
    Ok(ApiResponse::success(json!({
        "token": token,
        "user": { "id": user.id, "email": user.email },
        "onboarded": onboarded,
    })))
}

pub async fn whoami(principal: Principal) -> ApiResult<Value> {
    let body = match &principal {
        Principal::Anonymous => json!({ "authenticated": false }),
        Principal::Authenticated {
            user_id,
            email,
            binding,
        } => json!({
            "authenticated": true,
            "user_id": user_id,
            "email": email,
            "binding": binding.as_ref().map(|b| json!({
                "church_id": b.church_id,
                "profile_id": b.profile_id,
                "role": b.role,
            })),
        }),
    };
    Ok(ApiResponse::success(body))
}
