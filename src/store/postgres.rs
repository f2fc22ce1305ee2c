use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::time::Duration;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::types::{
    Church, ChurchSettings, FollowUpNote, Member, Ministry, Profile, User, Visitor, VisitorStatus,
};

use super::{
    ChurchGraph, ChurchUpdate, IdentityStore, NewAuditLog, NewMember, NewUser, NewVisitor,
    PeopleStore, Provisioned, Store, StoreError, TenantStore,
};

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => return StoreError::NotFound,
            sqlx::Error::PoolTimedOut => return StoreError::Timeout,
            sqlx::Error::Database(db) => {
                // Unique-constraint violations are verdicts on invariants
                // the schema owns, surfaced by name.
                match db.constraint() {
                    Some("churches_slug_key") => return StoreError::SlugTaken,
                    Some("profiles_user_id_key") => return StoreError::ProfileExists,
                    Some("users_email_key") => return StoreError::EmailTaken,
                    _ => {}
                }
            }
            _ => {}
        }
        StoreError::Backend(err.to_string())
    }
}

fn decode_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(e.to_string())
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(cfg: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(cfg.max_connections)
            .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs))
            .connect(&cfg.url)
            .await?;
        Ok(Self { pool })
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
    })
}

fn church_from_row(row: &PgRow) -> Result<Church, StoreError> {
    Ok(Church {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        system_name: row.try_get("system_name")?,
        primary_color: row.try_get("primary_color")?,
        secondary_color: row.try_get("secondary_color")?,
        address: row.try_get("address")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        country: row.try_get("country")?,
        phone: row.try_get("phone")?,
        email: row.try_get("email")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn settings_from_row(row: &PgRow) -> Result<ChurchSettings, StoreError> {
    Ok(ChurchSettings {
        id: row.try_get("id")?,
        church_id: row.try_get("church_id")?,
        timezone: row.try_get("timezone")?,
        language: row.try_get("language")?,
        enable_visitor_form: row.try_get("enable_visitor_form")?,
        enable_pathfinders: row.try_get("enable_pathfinders")?,
        enable_adventurers: row.try_get("enable_adventurers")?,
        enable_treasury: row.try_get("enable_treasury")?,
        enable_communication: row.try_get("enable_communication")?,
    })
}

fn ministry_from_row(row: &PgRow) -> Result<Ministry, StoreError> {
    let ministry_type: String = row.try_get("type")?;
    let modules: serde_json::Value = row.try_get("modules")?;
    Ok(Ministry {
        id: row.try_get("id")?,
        church_id: row.try_get("church_id")?,
        name: row.try_get("name")?,
        ministry_type: ministry_type.parse().map_err(decode_err)?,
        is_active: row.try_get("is_active")?,
        modules: serde_json::from_value(modules).map_err(decode_err)?,
        created_at: row.try_get("created_at")?,
    })
}

fn profile_from_row(row: &PgRow) -> Result<Profile, StoreError> {
    let role: String = row.try_get("role")?;
    let status: String = row.try_get("status")?;
    Ok(Profile {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        church_id: row.try_get("church_id")?,
        full_name: row.try_get("full_name")?,
        phone: row.try_get("phone")?,
        role: role.parse().map_err(decode_err)?,
        status: status.parse().map_err(decode_err)?,
        is_verified: row.try_get("is_verified")?,
        created_at: row.try_get("created_at")?,
    })
}

fn member_from_row(row: &PgRow) -> Result<Member, StoreError> {
    let status: String = row.try_get("status")?;
    Ok(Member {
        id: row.try_get("id")?,
        church_id: row.try_get("church_id")?,
        full_name: row.try_get("full_name")?,
        status: status.parse().map_err(decode_err)?,
        phone: row.try_get("phone")?,
        email: row.try_get("email")?,
        created_at: row.try_get("created_at")?,
    })
}

fn visitor_from_row(row: &PgRow) -> Result<Visitor, StoreError> {
    let status: String = row.try_get("status")?;
    let notes: serde_json::Value = row.try_get("follow_up_notes")?;
    Ok(Visitor {
        id: row.try_get("id")?,
        church_id: row.try_get("church_id")?,
        full_name: row.try_get("full_name")?,
        phone: row.try_get("phone")?,
        email: row.try_get("email")?,
        first_visit_date: row.try_get("first_visit_date")?,
        status: status.parse().map_err(decode_err)?,
        follow_up_notes: serde_json::from_value(notes).map_err(decode_err)?,
        created_at: row.try_get("created_at")?,
    })
}

const CHURCH_COLUMNS: &str = "id, name, slug, system_name, primary_color, secondary_color, \
     address, city, state, country, phone, email, is_active, created_at, updated_at";

const VISITOR_COLUMNS: &str =
    "id, church_id, full_name, phone, email, first_visit_date, status, follow_up_notes, created_at";

#[async_trait]
impl IdentityStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) \
             RETURNING id, email, password_hash, created_at",
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await?;
        user_from_row(&row)
    }

    async fn user_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT id, email, password_hash, created_at FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row =
            sqlx::query("SELECT id, email, password_hash, created_at FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn profile_by_user(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
        let row = sqlx::query(
            "SELECT id, user_id, church_id, full_name, phone, role, status, is_verified, created_at \
             FROM profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(profile_from_row).transpose()
    }
}

#[async_trait]
impl TenantStore for PgStore {
    async fn slug_in_use(&self, slug: &str) -> Result<bool, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM churches WHERE slug = $1")
            .bind(slug)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn create_church_graph(&self, graph: ChurchGraph) -> Result<Provisioned, StoreError> {
        // One transaction for the whole graph: a failure anywhere rolls the
        // church back, so no half-created tenant ever holds a slug.
        let mut tx = self.pool.begin().await?;

        let church_id: Uuid = sqlx::query_scalar(
            "INSERT INTO churches \
                 (name, slug, system_name, primary_color, secondary_color, \
                  address, city, state, country, phone, email, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, true) \
             RETURNING id",
        )
        .bind(&graph.church.name)
        .bind(&graph.church.slug)
        .bind(&graph.church.system_name)
        .bind(&graph.church.primary_color)
        .bind(&graph.church.secondary_color)
        .bind(&graph.church.address)
        .bind(&graph.church.city)
        .bind(&graph.church.state)
        .bind(&graph.church.country)
        .bind(&graph.church.phone)
        .bind(&graph.church.email)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO church_settings \
                 (church_id, timezone, language, enable_visitor_form, enable_pathfinders, \
                  enable_adventurers, enable_treasury, enable_communication) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(church_id)
        .bind(&graph.settings.timezone)
        .bind(&graph.settings.language)
        .bind(graph.settings.enable_visitor_form)
        .bind(graph.settings.enable_pathfinders)
        .bind(graph.settings.enable_adventurers)
        .bind(graph.settings.enable_treasury)
        .bind(graph.settings.enable_communication)
        .execute(&mut *tx)
        .await?;

        for ministry in &graph.ministries {
            let modules = serde_json::to_value(ministry.modules).map_err(decode_err)?;
            sqlx::query(
                "INSERT INTO ministries (church_id, name, type, is_active, modules) \
                 VALUES ($1, $2, $3, true, $4)",
            )
            .bind(church_id)
            .bind(&ministry.name)
            .bind(ministry.ministry_type.as_str())
            .bind(modules)
            .execute(&mut *tx)
            .await?;
        }

        let profile_id: Uuid = sqlx::query_scalar(
            "INSERT INTO profiles (user_id, church_id, full_name, phone, role, status, is_verified) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id",
        )
        .bind(graph.profile.user_id)
        .bind(church_id)
        .bind(&graph.profile.full_name)
        .bind(&graph.profile.phone)
        .bind(graph.profile.role.as_str())
        .bind(graph.profile.status.as_str())
        .bind(graph.profile.is_verified)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO audit_logs (church_id, user_id, action, table_name, record_id, new_data) \
             VALUES ($1, $2, 'onboarding_completed', 'churches', $3, $4)",
        )
        .bind(church_id)
        .bind(graph.profile.user_id)
        .bind(church_id)
        .bind(serde_json::json!({ "slug": graph.church.slug, "name": graph.church.name }))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Provisioned { church_id, profile_id })
    }

    async fn church_by_id(&self, church_id: Uuid) -> Result<Option<Church>, StoreError> {
        let row =
            sqlx::query(&format!("SELECT {CHURCH_COLUMNS} FROM churches WHERE id = $1"))
                .bind(church_id)
                .fetch_optional(&self.pool)
                .await?;
        row.as_ref().map(church_from_row).transpose()
    }

    async fn church_by_slug(&self, slug: &str) -> Result<Option<Church>, StoreError> {
        let row =
            sqlx::query(&format!("SELECT {CHURCH_COLUMNS} FROM churches WHERE slug = $1"))
                .bind(slug)
                .fetch_optional(&self.pool)
                .await?;
        row.as_ref().map(church_from_row).transpose()
    }

    async fn settings_by_church(
        &self,
        church_id: Uuid,
    ) -> Result<Option<ChurchSettings>, StoreError> {
        let row = sqlx::query(
            "SELECT id, church_id, timezone, language, enable_visitor_form, enable_pathfinders, \
                    enable_adventurers, enable_treasury, enable_communication \
             FROM church_settings WHERE church_id = $1",
        )
        .bind(church_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(settings_from_row).transpose()
    }

    async fn update_church(
        &self,
        church_id: Uuid,
        update: ChurchUpdate,
    ) -> Result<Church, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE churches SET \
                 name = COALESCE($2, name), \
                 system_name = COALESCE($3, system_name), \
                 primary_color = COALESCE($4, primary_color), \
                 secondary_color = COALESCE($5, secondary_color), \
                 address = COALESCE($6, address), \
                 city = COALESCE($7, city), \
                 state = COALESCE($8, state), \
                 country = COALESCE($9, country), \
                 phone = COALESCE($10, phone), \
                 email = COALESCE($11, email), \
                 is_active = COALESCE($12, is_active), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {CHURCH_COLUMNS}"
        ))
        .bind(church_id)
        .bind(&update.name)
        .bind(&update.system_name)
        .bind(&update.primary_color)
        .bind(&update.secondary_color)
        .bind(&update.address)
        .bind(&update.city)
        .bind(&update.state)
        .bind(&update.country)
        .bind(&update.phone)
        .bind(&update.email)
        .bind(update.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;
        church_from_row(&row)
    }

    async fn ministries_by_church(&self, church_id: Uuid) -> Result<Vec<Ministry>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, church_id, name, type, is_active, modules, created_at \
             FROM ministries WHERE church_id = $1 ORDER BY created_at, id",
        )
        .bind(church_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(ministry_from_row).collect()
    }

    async fn append_audit(&self, entry: NewAuditLog) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO audit_logs \
                 (church_id, user_id, action, table_name, record_id, old_data, new_data) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(entry.church_id)
        .bind(entry.user_id)
        .bind(&entry.action)
        .bind(&entry.table_name)
        .bind(entry.record_id)
        .bind(&entry.old_data)
        .bind(&entry.new_data)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl PeopleStore for PgStore {
    async fn members_by_church(&self, church_id: Uuid) -> Result<Vec<Member>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, church_id, full_name, status, phone, email, created_at \
             FROM members WHERE church_id = $1 ORDER BY created_at, id",
        )
        .bind(church_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(member_from_row).collect()
    }

    async fn create_member(
        &self,
        church_id: Uuid,
        member: NewMember,
    ) -> Result<Member, StoreError> {
        let row = sqlx::query(
            "INSERT INTO members (church_id, full_name, status, phone, email) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, church_id, full_name, status, phone, email, created_at",
        )
        .bind(church_id)
        .bind(&member.full_name)
        .bind(member.status.as_str())
        .bind(&member.phone)
        .bind(&member.email)
        .fetch_one(&self.pool)
        .await?;
        member_from_row(&row)
    }

    async fn visitors_by_church(&self, church_id: Uuid) -> Result<Vec<Visitor>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {VISITOR_COLUMNS} FROM visitors WHERE church_id = $1 ORDER BY created_at, id"
        ))
        .bind(church_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(visitor_from_row).collect()
    }

    async fn visitor_by_id(
        &self,
        church_id: Uuid,
        visitor_id: Uuid,
    ) -> Result<Option<Visitor>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {VISITOR_COLUMNS} FROM visitors WHERE church_id = $1 AND id = $2"
        ))
        .bind(church_id)
        .bind(visitor_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(visitor_from_row).transpose()
    }

    async fn create_visitor(
        &self,
        church_id: Uuid,
        visitor: NewVisitor,
    ) -> Result<Visitor, StoreError> {
        let row = sqlx::query(&format!(
            "INSERT INTO visitors (church_id, full_name, phone, email, first_visit_date) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {VISITOR_COLUMNS}"
        ))
        .bind(church_id)
        .bind(&visitor.full_name)
        .bind(&visitor.phone)
        .bind(&visitor.email)
        .bind(visitor.first_visit_date)
        .fetch_one(&self.pool)
        .await?;
        visitor_from_row(&row)
    }

    async fn append_follow_up_note(
        &self,
        church_id: Uuid,
        visitor_id: Uuid,
        note: FollowUpNote,
    ) -> Result<Visitor, StoreError> {
        let appended = serde_json::to_value(vec![&note]).map_err(decode_err)?;
        // Single statement so the append and the first-note status
        // transition cannot diverge under concurrent appends.
        let row = sqlx::query(&format!(
            "UPDATE visitors SET \
                 follow_up_notes = follow_up_notes || $3::jsonb, \
                 status = CASE WHEN status = 'new' THEN 'in_follow_up' ELSE status END, \
                 updated_at = now() \
             WHERE church_id = $1 AND id = $2 \
             RETURNING {VISITOR_COLUMNS}"
        ))
        .bind(church_id)
        .bind(visitor_id)
        .bind(appended)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;
        visitor_from_row(&row)
    }

    async fn set_visitor_status(
        &self,
        church_id: Uuid,
        visitor_id: Uuid,
        status: VisitorStatus,
    ) -> Result<Visitor, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE visitors SET status = $3, updated_at = now() \
             WHERE church_id = $1 AND id = $2 \
             RETURNING {VISITOR_COLUMNS}"
        ))
        .bind(church_id)
        .bind(visitor_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;
        visitor_from_row(&row)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
