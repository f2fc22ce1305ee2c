//! Tenant-scoped church endpoints. Every query is keyed by the binding's
//! church id; the handlers never accept a church id from the client.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::require_role;
use crate::response::{ApiResponse, ApiResult};
use crate::session::{Principal, TenantBinding};
use crate::store::{ChurchUpdate, IdentityStore, NewAuditLog, TenantStore};
use crate::types::{Ministry, Role};

/// GET /dashboard, the tenant home behind the gate.
pub async fn tenant_home(
    State(state): State<AppState>,
    principal: Principal,
    binding: TenantBinding,
) -> ApiResult<Value> {
    let church = state
        .store
        .church_by_id(binding.church_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Church not found"))?;
    let user_id = principal
        .user_id()
        .ok_or_else(|| ApiError::unauthorized("Sign in required"))?;
    let profile = state
        .store
        .profile_by_user(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;
    Ok(ApiResponse::success(json!({
        "church": church,
        "profile": profile,
    })))
}

pub async fn get_church(
    State(state): State<AppState>,
    binding: TenantBinding,
) -> ApiResult<Value> {
    let church = state
        .store
        .church_by_id(binding.church_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Church not found"))?;
    let settings = state.store.settings_by_church(binding.church_id).await?;
    Ok(ApiResponse::success(json!({
        "church": church,
        "settings": settings,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChurchRequest {
    pub name: Option<String>,
    pub system_name: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

pub async fn update_church(
    State(state): State<AppState>,
    principal: Principal,
    binding: TenantBinding,
    Json(request): Json<UpdateChurchRequest>,
) -> ApiResult<Value> {
    require_role(&binding, Role::Pastor)?;

    let mut field_errors = HashMap::new();
    if request.primary_color.as_deref().is_some_and(|c| !is_hex_color(c)) {
        field_errors.insert("primaryColor".to_string(), "must be a #rrggbb color".to_string());
    }
    if request.secondary_color.as_deref().is_some_and(|c| !is_hex_color(c)) {
        field_errors.insert("secondaryColor".to_string(), "must be a #rrggbb color".to_string());
    }
    if request.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        field_errors.insert("name".to_string(), "name cannot be blank".to_string());
    }
    if !field_errors.is_empty() {
        return Err(ApiError::validation_error(
            "Please review the highlighted fields",
            Some(field_errors),
        ));
    }

    let before = state
        .store
        .church_by_id(binding.church_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Church not found"))?;

    let updated = state
        .store
        .update_church(
            binding.church_id,
            ChurchUpdate {
                name: request.name,
                system_name: request.system_name,
                primary_color: request.primary_color,
                secondary_color: request.secondary_color,
                address: request.address,
                city: request.city,
                state: request.state,
                country: request.country,
                phone: request.phone,
                email: request.email,
                is_active: request.is_active,
            },
        )
        .await?;

    state
        .store
        .append_audit(NewAuditLog {
            church_id: binding.church_id,
            user_id: principal.user_id(),
            action: "church_updated".to_string(),
            table_name: "churches".to_string(),
            record_id: binding.church_id,
            old_data: serde_json::to_value(&before).ok(),
            new_data: serde_json::to_value(&updated).ok(),
        })
        .await?;

    Ok(ApiResponse::success(json!({ "church": updated })))
}

pub async fn list_ministries(
    State(state): State<AppState>,
    binding: TenantBinding,
) -> ApiResult<Vec<Ministry>> {
    let ministries = state.store.ministries_by_church(binding.church_id).await?;
    Ok(ApiResponse::success(ministries))
}
