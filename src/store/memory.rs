//! In-memory backend. Backs the integration tests and local demos; no
//! transactions, so provisioning compensates by hand: every row written
//! for a church is removed again if a later step of the graph fails.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::types::{
    AuditLog, Church, ChurchSettings, FollowUpNote, Member, Ministry, Profile, User, Visitor,
    VisitorStatus,
};

use super::{
    ChurchGraph, ChurchUpdate, IdentityStore, NewAuditLog, NewMember, NewUser, NewVisitor,
    PeopleStore, Provisioned, Store, StoreError, TenantStore,
};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    churches: HashMap<Uuid, Church>,
    settings: HashMap<Uuid, ChurchSettings>,
    ministries: Vec<Ministry>,
    profiles: HashMap<Uuid, Profile>,
    members: Vec<Member>,
    visitors: Vec<Visitor>,
    audit: Vec<AuditLog>,
}

impl State {
    fn remove_church_graph(&mut self, church_id: Uuid) {
        self.churches.remove(&church_id);
        self.settings.remove(&church_id);
        self.ministries.retain(|m| m.church_id != church_id);
    }
}

pub struct MemoryStore {
    state: Mutex<State>,
    fail_profile_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            fail_profile_writes: AtomicBool::new(false),
        }
    }

    /// Makes the next profile insert inside `create_church_graph` fail,
    /// which is how tests drive the compensation path.
    pub fn set_fail_profile_writes(&self, fail: bool) {
        self.fail_profile_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn church_count(&self) -> usize {
        self.state.lock().await.churches.len()
    }

    pub async fn audit_entries(&self) -> Vec<AuditLog> {
        self.state.lock().await.audit.clone()
    }

    /// Seeds a profile directly, bypassing provisioning. Tests use this to
    /// stage non-master roles and non-active statuses.
    pub async fn insert_profile(&self, profile: Profile) {
        self.state.lock().await.profiles.insert(profile.id, profile);
    }

    pub async fn set_visitor_form_enabled(&self, church_id: Uuid, enabled: bool) {
        let mut state = self.state.lock().await;
        if let Some(settings) = state.settings.get_mut(&church_id) {
            settings.enable_visitor_form = enabled;
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut state = self.state.lock().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::EmailTaken);
        }
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn user_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.state.lock().await.users.get(&user_id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn profile_by_user(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.profiles.values().find(|p| p.user_id == user_id).cloned())
    }
}

#[async_trait]
impl TenantStore for MemoryStore {
    async fn slug_in_use(&self, slug: &str) -> Result<bool, StoreError> {
        let state = self.state.lock().await;
        Ok(state.churches.values().any(|c| c.slug == slug))
    }

    async fn create_church_graph(&self, graph: ChurchGraph) -> Result<Provisioned, StoreError> {
        let mut state = self.state.lock().await;

        if state.churches.values().any(|c| c.slug == graph.church.slug) {
            return Err(StoreError::SlugTaken);
        }

        let now = Utc::now();
        let church_id = Uuid::new_v4();
        state.churches.insert(
            church_id,
            Church {
                id: church_id,
                name: graph.church.name.clone(),
                slug: graph.church.slug.clone(),
                system_name: graph.church.system_name,
                primary_color: graph.church.primary_color,
                secondary_color: graph.church.secondary_color,
                address: graph.church.address,
                city: graph.church.city,
                state: graph.church.state,
                country: graph.church.country,
                phone: graph.church.phone,
                email: graph.church.email,
                is_active: true,
                created_at: now,
                updated_at: now,
            },
        );
        state.settings.insert(
            church_id,
            ChurchSettings {
                id: Uuid::new_v4(),
                church_id,
                timezone: graph.settings.timezone,
                language: graph.settings.language,
                enable_visitor_form: graph.settings.enable_visitor_form,
                enable_pathfinders: graph.settings.enable_pathfinders,
                enable_adventurers: graph.settings.enable_adventurers,
                enable_treasury: graph.settings.enable_treasury,
                enable_communication: graph.settings.enable_communication,
            },
        );
        for ministry in &graph.ministries {
            state.ministries.push(Ministry {
                id: Uuid::new_v4(),
                church_id,
                name: ministry.name.clone(),
                ministry_type: ministry.ministry_type,
                is_active: true,
                modules: ministry.modules,
                created_at: now,
            });
        }

        // The profile write is the last step, mirroring the backend where
        // it can still fail after everything else for the church exists.
        let profile_conflict = state
            .profiles
            .values()
            .any(|p| p.user_id == graph.profile.user_id);
        if profile_conflict {
            state.remove_church_graph(church_id);
            return Err(StoreError::ProfileExists);
        }
        if self.fail_profile_writes.load(Ordering::SeqCst) {
            state.remove_church_graph(church_id);
            return Err(StoreError::Backend("injected profile write failure".into()));
        }

        let profile_id = Uuid::new_v4();
        state.profiles.insert(
            profile_id,
            Profile {
                id: profile_id,
                user_id: graph.profile.user_id,
                church_id,
                full_name: graph.profile.full_name.clone(),
                phone: graph.profile.phone.clone(),
                role: graph.profile.role,
                status: graph.profile.status,
                is_verified: graph.profile.is_verified,
                created_at: now,
            },
        );

        state.audit.push(AuditLog {
            id: Uuid::new_v4(),
            church_id,
            user_id: Some(graph.profile.user_id),
            action: "onboarding_completed".to_string(),
            table_name: "churches".to_string(),
            record_id: church_id,
            old_data: None,
            new_data: Some(serde_json::json!({
                "slug": graph.church.slug,
                "name": graph.church.name,
            })),
            created_at: now,
        });

        Ok(Provisioned { church_id, profile_id })
    }

    async fn church_by_id(&self, church_id: Uuid) -> Result<Option<Church>, StoreError> {
        Ok(self.state.lock().await.churches.get(&church_id).cloned())
    }

    async fn church_by_slug(&self, slug: &str) -> Result<Option<Church>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.churches.values().find(|c| c.slug == slug).cloned())
    }

    async fn settings_by_church(
        &self,
        church_id: Uuid,
    ) -> Result<Option<ChurchSettings>, StoreError> {
        Ok(self.state.lock().await.settings.get(&church_id).cloned())
    }

    async fn update_church(
        &self,
        church_id: Uuid,
        update: ChurchUpdate,
    ) -> Result<Church, StoreError> {
        let mut state = self.state.lock().await;
        let church = state
            .churches
            .get_mut(&church_id)
            .ok_or(StoreError::NotFound)?;
        if let Some(name) = update.name {
            church.name = name;
        }
        if let Some(system_name) = update.system_name {
            church.system_name = system_name;
        }
        if let Some(primary_color) = update.primary_color {
            church.primary_color = primary_color;
        }
        if let Some(secondary_color) = update.secondary_color {
            church.secondary_color = secondary_color;
        }
        if let Some(address) = update.address {
            church.address = Some(address);
        }
        if let Some(city) = update.city {
            church.city = Some(city);
        }
        if let Some(st) = update.state {
            church.state = Some(st);
        }
        if let Some(country) = update.country {
            church.country = country;
        }
        if let Some(phone) = update.phone {
            church.phone = Some(phone);
        }
        if let Some(email) = update.email {
            church.email = Some(email);
        }
        if let Some(is_active) = update.is_active {
            church.is_active = is_active;
        }
        church.updated_at = Utc::now();
        Ok(church.clone())
    }

    async fn ministries_by_church(&self, church_id: Uuid) -> Result<Vec<Ministry>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .ministries
            .iter()
            .filter(|m| m.church_id == church_id)
            .cloned()
            .collect())
    }

    async fn append_audit(&self, entry: NewAuditLog) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.audit.push(AuditLog {
            id: Uuid::new_v4(),
            church_id: entry.church_id,
            user_id: entry.user_id,
            action: entry.action,
            table_name: entry.table_name,
            record_id: entry.record_id,
            old_data: entry.old_data,
            new_data: entry.new_data,
            created_at: Utc::now(),
        });
        Ok(())
    }
}

#[async_trait]
impl PeopleStore for MemoryStore {
    async fn members_by_church(&self, church_id: Uuid) -> Result<Vec<Member>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .members
            .iter()
            .filter(|m| m.church_id == church_id)
            .cloned()
            .collect())
    }

    async fn create_member(
        &self,
        church_id: Uuid,
        member: NewMember,
    ) -> Result<Member, StoreError> {
        let mut state = self.state.lock().await;
        let created = Member {
            id: Uuid::new_v4(),
            church_id,
            full_name: member.full_name,
            status: member.status,
            phone: member.phone,
            email: member.email,
            created_at: Utc::now(),
        };
        state.members.push(created.clone());
        Ok(created)
    }

    async fn visitors_by_church(&self, church_id: Uuid) -> Result<Vec<Visitor>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .visitors
            .iter()
            .filter(|v| v.church_id == church_id)
            .cloned()
            .collect())
    }

    async fn visitor_by_id(
        &self,
        church_id: Uuid,
        visitor_id: Uuid,
    ) -> Result<Option<Visitor>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .visitors
            .iter()
            .find(|v| v.church_id == church_id && v.id == visitor_id)
            .cloned())
    }

    async fn create_visitor(
        &self,
        church_id: Uuid,
        visitor: NewVisitor,
    ) -> Result<Visitor, StoreError> {
        let mut state = self.state.lock().await;
        let created = Visitor {
            id: Uuid::new_v4(),
            church_id,
            full_name: visitor.full_name,
            phone: visitor.phone,
            email: visitor.email,
            first_visit_date: visitor.first_visit_date,
            status: VisitorStatus::New,
            follow_up_notes: Vec::new(),
            created_at: Utc::now(),
        };
        state.visitors.push(created.clone());
        Ok(created)
    }

    async fn append_follow_up_note(
        &self,
        church_id: Uuid,
        visitor_id: Uuid,
        note: FollowUpNote,
    ) -> Result<Visitor, StoreError> {
        let mut state = self.state.lock().await;
        let visitor = state
            .visitors
            .iter_mut()
            .find(|v| v.church_id == church_id && v.id == visitor_id)
            .ok_or(StoreError::NotFound)?;
        visitor.follow_up_notes.push(note);
        if visitor.status == VisitorStatus::New {
            visitor.status = VisitorStatus::InFollowUp;
        }
        Ok(visitor.clone())
    }

    async fn set_visitor_status(
        &self,
        church_id: Uuid,
        visitor_id: Uuid,
        status: VisitorStatus,
    ) -> Result<Visitor, StoreError> {
        let mut state = self.state.lock().await;
        let visitor = state
            .visitors
            .iter_mut()
            .find(|v| v.church_id == church_id && v.id == visitor_id)
            .ok_or(StoreError::NotFound)?;
        visitor.status = status;
        Ok(visitor.clone())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
