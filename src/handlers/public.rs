//! Routes that never consult the session: the landing banner, the health
//! probe and the per-church public visitor intake.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::response::{ApiResponse, ApiResult};
use crate::store::{NewVisitor, PeopleStore, Store, TenantStore};
use crate::types::{Church, ChurchSettings, Visitor};

pub async fn root() -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "service": "flock-api",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    state
        .store
        .ping()
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "health probe failed");
            ApiError::service_unavailable("Storage unreachable")
        })?;
    Ok(ApiResponse::success(json!({ "status": "ok" })))
}

/// Loads the church behind `/visit/:slug` and checks it accepts public
/// visit registrations. Inactive and unknown slugs look identical to
/// callers.
async fn intake_church(
    state: &AppState,
    slug: &str,
) -> Result<(Church, ChurchSettings), ApiError> {
    let church = state
        .store
        .church_by_slug(slug)
        .await?
        .filter(|c| c.is_active)
        .ok_or_else(|| ApiError::not_found("Church not found"))?;
    let settings = state
        .store
        .settings_by_church(church.id)
        .await?
        .ok_or_else(|| {
            tracing::error!(church_id = %church.id, "church has no settings row");
            ApiError::internal_server_error("An error occurred while processing your request")
        })?;
    if !settings.enable_visitor_form {
        return Err(ApiError::forbidden(
            "This church does not accept online visit registrations",
        ));
    }
    Ok((church, settings))
}

pub async fn visit_info(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Value> {
    let (church, _) = intake_church(&state, &slug).await?;
    Ok(ApiResponse::success(json!({
        "church": {
            "name": church.name,
            "system_name": church.system_name,
            "primary_color": church.primary_color,
            "secondary_color": church.secondary_color,
            "city": church.city,
            "state": church.state,
        }
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRequest {
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

pub async fn register_visit(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(request): Json<VisitRequest>,
) -> ApiResult<Visitor> {
    let (church, _) = intake_church(&state, &slug).await?;
    if request.full_name.trim().is_empty() {
        return Err(ApiError::validation_error(
            "Please tell us your name",
            None,
        ));
    }
    let visitor = state
        .store
        .create_visitor(
            church.id,
            NewVisitor {
                full_name: request.full_name.trim().to_string(),
                phone: request.phone.filter(|p| !p.trim().is_empty()),
                email: request.email.filter(|e| !e.trim().is_empty()),
                first_visit_date: Utc::now().date_naive(),
            },
        )
        .await?;
    tracing::info!(church_id = %church.id, visitor_id = %visitor.id, "public visit registered");
    Ok(ApiResponse::created(visitor))
}
