/// Domain types shared across the codebase: the tenant (church) graph,
/// the identity/profile binding, and the tenant-scoped people records.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Privilege levels, declared in ascending order so the derived `Ord`
/// makes `Role::Master` the greatest. Authorization checks compare roles,
/// never strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Public,
    Member,
    Parent,
    TeamMember,
    MinistryLeader,
    Elder,
    Pastor,
    Master,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Public => "public",
            Role::Member => "member",
            Role::Parent => "parent",
            Role::TeamMember => "team_member",
            Role::MinistryLeader => "ministry_leader",
            Role::Elder => "elder",
            Role::Pastor => "pastor",
            Role::Master => "master",
        }
    }
}

/// A role string that does not name a known privilege level. Rejecting it
/// outright keeps authorization exhaustive: an unrecognized value can
/// never slip through as some default privilege.
#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Role::Public),
            "member" => Ok(Role::Member),
            "parent" => Ok(Role::Parent),
            "team_member" => Ok(Role::TeamMember),
            "ministry_leader" => Ok(Role::MinistryLeader),
            "elder" => Ok(Role::Elder),
            "pastor" => Ok(Role::Pastor),
            "master" => Ok(Role::Master),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileStatus {
    Active,
    Inactive,
    Pending,
}

impl ProfileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileStatus::Active => "active",
            ProfileStatus::Inactive => "inactive",
            ProfileStatus::Pending => "pending",
        }
    }
}

impl FromStr for ProfileStatus {
    type Err = UnknownEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProfileStatus::Active),
            "inactive" => Ok(ProfileStatus::Inactive),
            "pending" => Ok(ProfileStatus::Pending),
            other => Err(UnknownEnumValue::new("profile status", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Baptized,
    AwaitingTransfer,
    Visitor,
    RegularAttendee,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Baptized => "baptized",
            MemberStatus::AwaitingTransfer => "awaiting_transfer",
            MemberStatus::Visitor => "visitor",
            MemberStatus::RegularAttendee => "regular_attendee",
        }
    }
}

impl FromStr for MemberStatus {
    type Err = UnknownEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "baptized" => Ok(MemberStatus::Baptized),
            "awaiting_transfer" => Ok(MemberStatus::AwaitingTransfer),
            "visitor" => Ok(MemberStatus::Visitor),
            "regular_attendee" => Ok(MemberStatus::RegularAttendee),
            other => Err(UnknownEnumValue::new("member status", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitorStatus {
    New,
    InFollowUp,
    Integrated,
    Inactive,
}

impl VisitorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitorStatus::New => "new",
            VisitorStatus::InFollowUp => "in_follow_up",
            VisitorStatus::Integrated => "integrated",
            VisitorStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for VisitorStatus {
    type Err = UnknownEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(VisitorStatus::New),
            "in_follow_up" => Ok(VisitorStatus::InFollowUp),
            "integrated" => Ok(VisitorStatus::Integrated),
            "inactive" => Ok(VisitorStatus::Inactive),
            other => Err(UnknownEnumValue::new("visitor status", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinistryType {
    Music,
    Media,
    Sound,
    Broadcast,
    Reception,
    Asa,
    Womens,
    Mens,
    Youth,
    Pathfinders,
    Adventurers,
    Secretariat,
    Treasury,
    Eldership,
    Programming,
    Custom,
}

impl MinistryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MinistryType::Music => "music",
            MinistryType::Media => "media",
            MinistryType::Sound => "sound",
            MinistryType::Broadcast => "broadcast",
            MinistryType::Reception => "reception",
            MinistryType::Asa => "asa",
            MinistryType::Womens => "womens",
            MinistryType::Mens => "mens",
            MinistryType::Youth => "youth",
            MinistryType::Pathfinders => "pathfinders",
            MinistryType::Adventurers => "adventurers",
            MinistryType::Secretariat => "secretariat",
            MinistryType::Treasury => "treasury",
            MinistryType::Eldership => "eldership",
            MinistryType::Programming => "programming",
            MinistryType::Custom => "custom",
        }
    }
}

impl FromStr for MinistryType {
    type Err = UnknownEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "music" => Ok(MinistryType::Music),
            "media" => Ok(MinistryType::Media),
            "sound" => Ok(MinistryType::Sound),
            "broadcast" => Ok(MinistryType::Broadcast),
            "reception" => Ok(MinistryType::Reception),
            "asa" => Ok(MinistryType::Asa),
            "womens" => Ok(MinistryType::Womens),
            "mens" => Ok(MinistryType::Mens),
            "youth" => Ok(MinistryType::Youth),
            "pathfinders" => Ok(MinistryType::Pathfinders),
            "adventurers" => Ok(MinistryType::Adventurers),
            "secretariat" => Ok(MinistryType::Secretariat),
            "treasury" => Ok(MinistryType::Treasury),
            "eldership" => Ok(MinistryType::Eldership),
            "programming" => Ok(MinistryType::Programming),
            "custom" => Ok(MinistryType::Custom),
            other => Err(UnknownEnumValue::new("ministry type", other)),
        }
    }
}

/// A stored enum column holding a value this build does not recognize.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownEnumValue {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownEnumValue {
    fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}

/// Per-ministry capability toggles. Fixed shape on purpose: a missing or
/// extra key is a deserialization error, not a silent gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MinistryModules {
    pub agenda: bool,
    pub scale: bool,
    pub documents: bool,
    pub reports: bool,
    pub notifications: bool,
}

/// Authentication identity. Provisioning never creates these; the register
/// endpoint does.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// One tenant. `slug` is globally unique and normalized; see `crate::slug`.
#[derive(Debug, Clone, Serialize)]
pub struct Church {
    pub id: Uuid,
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
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One-to-one with `Church`.
#[derive(Debug, Clone, Serialize)]
pub struct ChurchSettings {
    pub id: Uuid,
    pub church_id: Uuid,
    pub timezone: String,
    pub language: String,
    pub enable_visitor_form: bool,
    pub enable_pathfinders: bool,
    pub enable_adventurers: bool,
    pub enable_treasury: bool,
    pub enable_communication: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Ministry {
    pub id: Uuid,
    pub church_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub ministry_type: MinistryType,
    pub is_active: bool,
    pub modules: MinistryModules,
    pub created_at: DateTime<Utc>,
}

/// Binding between one identity and one church. At most one per identity.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub church_id: Uuid,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub status: ProfileStatus,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Member {
    pub id: Uuid,
    pub church_id: Uuid,
    pub full_name: String,
    pub status: MemberStatus,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One entry in a visitor's append-only follow-up log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpNote {
    pub date: DateTime<Utc>,
    pub note: String,
    pub author_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct Visitor {
    pub id: Uuid,
    pub church_id: Uuid,
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub first_visit_date: NaiveDate,
    pub status: VisitorStatus,
    pub follow_up_notes: Vec<FollowUpNote>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditLog {
    pub id: Uuid,
    pub church_id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub table_name: String,
    pub record_id: Uuid,
    pub old_data: Option<serde_json::Value>,
    pub new_data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
