//! Storage behind traits so the HTTP layer never sees a concrete backend.
//!
//! Two implementations: `PgStore` (Postgres, provisioning as one
//! transaction) and `MemoryStore` (mutex-guarded maps, provisioning as a
//! compensated sequence of writes). Uniqueness invariants (slug, one
//! profile per identity, email) are the backend's job; callers treat the
//! dedicated error variants as verdicts, not surprises.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::types::{
    Church, ChurchSettings, FollowUpNote, Member, MemberStatus, Ministry, MinistryModules,
    MinistryType, Profile, ProfileStatus, Role, User, Visitor, VisitorStatus,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("slug is already in use")]
    SlugTaken,
    #[error("identity already has a profile")]
    ProfileExists,
    #[error("email is already registered")]
    EmailTaken,
    #[error("storage timed out")]
    Timeout,
    #[error("storage backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewChurch {
    pub name: String,
    pub slug: String,
    pub system_name: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SettingsSeed {
    pub timezone: String,
    pub language: String,
    pub enable_visitor_form: bool,
    pub enable_pathfinders: bool,
    pub enable_adventurers: bool,
    pub enable_treasury: bool,
    pub enable_communication: bool,
}

#[derive(Debug, Clone)]
pub struct MinistrySeed {
    pub name: String,
    pub ministry_type: MinistryType,
    pub modules: MinistryModules,
}

#[derive(Debug, Clone)]
pub struct NewProfile {
    pub user_id: Uuid,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub status: ProfileStatus,
    pub is_verified: bool,
}

/// Everything one onboarding submission writes. Backends persist this
/// all-or-nothing: either the whole graph lands or none of it remains
/// visible afterwards.
#[derive(Debug, Clone)]
pub struct ChurchGraph {
    pub church: NewChurch,
    pub settings: SettingsSeed,
    pub ministries: Vec<MinistrySeed>,
    pub profile: NewProfile,
}

#[derive(Debug, Clone, Copy)]
pub struct Provisioned {
    pub church_id: Uuid,
    pub profile_id: Uuid,
}

/// Partial church update; `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct ChurchUpdate {
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

#[derive(Debug, Clone)]
pub struct NewMember {
    pub full_name: String,
    pub status: MemberStatus,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewVisitor {
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub first_visit_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub church_id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub table_name: String,
    pub record_id: Uuid,
    pub old_data: Option<serde_json::Value>,
    pub new_data: Option<serde_json::Value>,
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn user_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn profile_by_user(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError>;
}

#[async_trait]
pub trait TenantStore: Send + Sync {
    async fn slug_in_use(&self, slug: &str) -> Result<bool, StoreError>;

    /// Persists the whole onboarding graph. Returns `SlugTaken` or
    /// `ProfileExists` when a uniqueness invariant loses a race; those are
    /// ordinary outcomes for callers, not backend failures.
    async fn create_church_graph(&self, graph: ChurchGraph) -> Result<Provisioned, StoreError>;

    async fn church_by_id(&self, church_id: Uuid) -> Result<Option<Church>, StoreError>;
    async fn church_by_slug(&self, slug: &str) -> Result<Option<Church>, StoreError>;
    async fn settings_by_church(&self, church_id: Uuid)
        -> Result<Option<ChurchSettings>, StoreError>;
    async fn update_church(
        &self,
        church_id: Uuid,
        update: ChurchUpdate,
    ) -> Result<Church, StoreError>;
    async fn ministries_by_church(&self, church_id: Uuid) -> Result<Vec<Ministry>, StoreError>;
    async fn append_audit(&self, entry: NewAuditLog) -> Result<(), StoreError>;
}

#[async_trait]
pub trait PeopleStore: Send + Sync {
    async fn members_by_church(&self, church_id: Uuid) -> Result<Vec<Member>, StoreError>;
    async fn create_member(
        &self,
        church_id: Uuid,
        member: NewMember,
    ) -> Result<Member, StoreError>;

    async fn visitors_by_church(&self, church_id: Uuid) -> Result<Vec<Visitor>, StoreError>;
    async fn visitor_by_id(
        &self,
        church_id: Uuid,
        visitor_id: Uuid,
    ) -> Result<Option<Visitor>, StoreError>;
    async fn create_visitor(
        &self,
        church_id: Uuid,
        visitor: NewVisitor,
    ) -> Result<Visitor, StoreError>;

    /// Appends one note to the visitor's follow-up log. Prior notes are
    /// never touched; a `new` visitor moves to `in_follow_up`, any other
    /// status stays as it is.
    async fn append_follow_up_note(
        &self,
        church_id: Uuid,
        visitor_id: Uuid,
        note: FollowUpNote,
    ) -> Result<Visitor, StoreError>;

    async fn set_visitor_status(
        &self,
        church_id: Uuid,
        visitor_id: Uuid,
        status: VisitorStatus,
    ) -> Result<Visitor, StoreError>;
}

#[async_trait]
pub trait Store: IdentityStore + TenantStore + PeopleStore {
    /// Liveness probe for the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}
