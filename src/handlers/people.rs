//! Tenant-scoped member and visitor endpoints, including the append-only
//! follow-up log.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::require_role;
use crate::response::{ApiResponse, ApiResult};
use crate::session::TenantBinding;
use crate::store::{NewMember, NewVisitor, PeopleStore};
use crate::types::{FollowUpNote, Member, MemberStatus, Role, Visitor, VisitorStatus};

pub async fn list_members(
    State(state): State<AppState>,
    binding: TenantBinding,
) -> ApiResult<Vec<Member>> {
    let members = state.store.members_by_church(binding.church_id).await?;
    Ok(ApiResponse::success(members))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemberRequest {
    pub full_name: String,
    pub status: MemberStatus,
    pub phone: Option<String>,
    pub email: Option<String>,
}

pub async fn create_member(
    State(state): State<AppState>,
    binding: TenantBinding,
    Json(request): Json<CreateMemberRequest>,
) -> ApiResult<Member> {
    if request.full_name.trim().is_empty() {
        return Err(ApiError::validation_error("Name is required", None));
    }
    let member = state
        .store
        .create_member(
            binding.church_id,
            NewMember {
                full_name: request.full_name.trim().to_string(),
                status: request.status,
                phone: request.phone.filter(|p| !p.trim().is_empty()),
                email: request.email.filter(|e| !e.trim().is_empty()),
            },
        )
        .await?;
    Ok(ApiResponse::created(member))
}

pub async fn list_visitors(
    State(state): State<AppState>,
    binding: TenantBinding,
) -> ApiResult<Vec<Visitor>> {
    let visitors = state.store.visitors_by_church(binding.church_id).await?;
    Ok(ApiResponse::success(visitors))
}

pub async fn get_visitor(
    State(state): State<AppState>,
    binding: TenantBinding,
    Path(visitor_id): Path<Uuid>,
) -> ApiResult<Visitor> {
    let visitor = state
        .store
        .visitor_by_id(binding.church_id, visitor_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Visitor not found"))?;
    Ok(ApiResponse::success(visitor))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVisitorRequest {
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub first_visit_date: Option<NaiveDate>,
}

pub async fn create_visitor(
    State(state): State<AppState>,
    binding: TenantBinding,
    Json(request): Json<CreateVisitorRequest>,
) -> ApiResult<Visitor> {
    if request.full_name.trim().is_empty() {
        return Err(ApiError::validation_error("Name is required", None));
    }
    let visitor = state
        .store
        .create_visitor(
            binding.church_id,
            NewVisitor {
                full_name: request.full_name.trim().to_string(),
                phone: request.phone.filter(|p| !p.trim().is_empty()),
                email: request.email.filter(|e| !e.trim().is_empty()),
                first_visit_date: request
                    .first_visit_date
                    .unwrap_or_else(|| Utc::now().date_naive()),
            },
        )
        .await?;
    Ok(ApiResponse::created(visitor))
}

#[derive(Debug, Deserialize)]
pub struct AddNoteRequest {
    pub note: String,
}

/// POST /api/visitors/:id/notes. Appends to the follow-up log; the first
/// append moves a `new` visitor into `in_follow_up`, later appends leave
/// the status alone.
pub async fn add_follow_up_note(
    State(state): State<AppState>,
    binding: TenantBinding,
    Path(visitor_id): Path<Uuid>,
    Json(request): Json<AddNoteRequest>,
) -> ApiResult<Visitor> {
    require_role(&binding, Role::TeamMember)?;
    if request.note.trim().is_empty() {
        return Err(ApiError::validation_error("Note cannot be empty", None));
    }
    let visitor = state
        .store
        .append_follow_up_note(
            binding.church_id,
            visitor_id,
            FollowUpNote {
                date: Utc::now(),
                note: request.note.trim().to_string(),
                author_id: binding.profile_id,
            },
        )
        .await?;
    Ok(ApiResponse::success(visitor))
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: VisitorStatus,
}

pub async fn set_visitor_status(
    State(state): State<AppState>,
    binding: TenantBinding,
    Path(visitor_id): Path<Uuid>,
    Json(request): Json<SetStatusRequest>,
) -> ApiResult<Visitor> {
    require_role(&binding, Role::TeamMember)?;
    let visitor = state
        .store
        .set_visitor_status(binding.church_id, visitor_id, request.status)
        .await?;
    Ok(ApiResponse::success(visitor))
}
