//! The one-time tenant provisioning workflow: guards first, then the
//! all-or-nothing creation of church, settings, starter ministries and
//! the founding profile.

use crate::session::Principal;
use crate::slug;
use crate::store::{ChurchGraph, NewChurch, NewProfile, Store, StoreError};
use crate::types::{ProfileStatus, Role};
use uuid::Uuid;

use super::{default_ministries, settings_for_country, OnboardingRequest};

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("you must be signed in to create a church")]
    Unauthenticated,
    #[error("this account already administers a church")]
    AlreadyOnboarded,
    #[error("the church name does not produce a usable web address")]
    InvalidSlug,
    #[error("that web address is already taken, choose another")]
    SlugTaken,
    #[error("the church could not be created, please try again")]
    Storage(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct ProvisionOutcome {
    pub church_id: Uuid,
    pub profile_id: Uuid,
    pub slug: String,
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Guards run in order and short-circuit: authentication, then the
/// one-profile-per-identity rule, then slug validity and availability.
/// The store call at the end is the authoritative arbiter for races;
/// its uniqueness verdicts map back onto the same error set.
pub async fn provision(
    store: &dyn Store,
    principal: &Principal,
    request: OnboardingRequest,
) -> Result<ProvisionOutcome, ProvisionError> {
    let Some(user_id) = principal.user_id() else {
        return Err(ProvisionError::Unauthenticated);
    };

    if store.profile_by_user(user_id).await?.is_some() {
        return Err(ProvisionError::AlreadyOnboarded);
    }

    let slug = slug::normalize(&request.church.slug);
    if slug.is_empty() {
        return Err(ProvisionError::InvalidSlug);
    }
    if store.slug_in_use(&slug).await? {
        return Err(ProvisionError::SlugTaken);
    }

    let graph = ChurchGraph {
        church: NewChurch {
            name: request.church.name.trim().to_string(),
            slug: slug.clone(),
            system_name: request.theme.system_name.trim().to_string(),
            primary_color: request.theme.primary_color,
            secondary_color: request.theme.secondary_color,
            address: clean(request.church.address),
            city: clean(request.church.city),
            state: clean(request.church.state),
            country: request.church.country.trim().to_string(),
            phone: clean(request.church.phone),
            email: clean(request.church.email),
        },
        settings: settings_for_country(request.church.country.trim()),
        ministries: default_ministries(),
        profile: NewProfile {
            user_id,
            full_name: request.admin.full_name.trim().to_string(),
            phone: clean(request.admin.phone),
            role: Role::Master,
            status: ProfileStatus::Active,
            is_verified: true,
        },
    };

    let provisioned = store.create_church_graph(graph).await.map_err(|err| match err {
        StoreError::SlugTaken => ProvisionError::SlugTaken,
        StoreError::ProfileExists => ProvisionError::AlreadyOnboarded,
        other => ProvisionError::Storage(other),
    })?;

    tracing::info!(
        church_id = %provisioned.church_id,
        slug = %slug,
        "provisioned new church"
    );

    Ok(ProvisionOutcome {
        church_id: provisioned.church_id,
        profile_id: provisioned.profile_id,
        slug,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{IdentityStore, MemoryStore, NewUser, TenantStore};
    use crate::tenancy::{AdminFields, ChurchFields, ThemeFields};

    fn request(name: &str, slug: &str, country: &str) -> OnboardingRequest {
        OnboardingRequest {
            church: ChurchFields {
                name: name.to_string(),
                slug: slug.to_string(),
                address: Some("12 Hill St".to_string()),
                city: Some("Orlando".to_string()),
                state: Some("FL".to_string()),
                country: country.to_string(),
                phone: None,
                email: Some("office@example.org".to_string()),
            },
            theme: ThemeFields {
                system_name: name.to_string(),
                primary_color: "#204080".to_string(),
                secondary_color: "#9060c0".to_string(),
            },
            admin: AdminFields {
                full_name: "Alice Founder".to_string(),
                phone: None,
            },
        }
    }

    async fn signed_in(store: &MemoryStore, email: &str) -> Principal {
        let user = store
            .create_user(NewUser {
                email: email.to_string(),
                password_hash: "x".to_string(),
            })
            .await
            .unwrap();
        Principal::Authenticated {
            user_id: user.id,
            email: user.email,
            binding: None,
        }
    }

    #[tokio::test]
    async fn anonymous_callers_fail_before_any_other_guard() {
        let store = MemoryStore::new();
        // The slug is also invalid; authentication must be reported first.
        let err = provision(&store, &Principal::Anonymous, request("X", "!!!", "BR"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Unauthenticated));
        assert_eq!(store.church_count().await, 0);
    }

    #[tokio::test]
    async fn an_existing_profile_wins_over_a_bad_slug() {
        let store = MemoryStore::new();
        let principal = signed_in(&store, "founder@example.com").await;
        provision(&store, &principal, request("First", "first", "BR"))
            .await
            .unwrap();

        let err = provision(&store, &principal, request("Second", "!!!", "BR"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::AlreadyOnboarded));
        assert_eq!(store.church_count().await, 1);
    }

    #[tokio::test]
    async fn degenerate_slugs_are_invalid() {
        let store = MemoryStore::new();
        let principal = signed_in(&store, "a@example.com").await;
        for slug in ["", "   ", "!!!", "---", "§§§"] {
            let err = provision(&store, &principal, request("Church", slug, "BR"))
                .await
                .unwrap_err();
            assert!(matches!(err, ProvisionError::InvalidSlug), "slug {slug:?}");
        }
    }

    #[tokio::test]
    async fn a_taken_slug_is_reported_before_writing_anything() {
        let store = MemoryStore::new();
        let first = signed_in(&store, "a@example.com").await;
        provision(&store, &first, request("Central", "central", "BR"))
            .await
            .unwrap();

        let second = signed_in(&store, "b@example.com").await;
        // Different display name, same slug after normalization.
        let err = provision(&store, &second, request("Other", "Central!", "BR"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::SlugTaken));
        assert_eq!(store.church_count().await, 1);
    }

    #[tokio::test]
    async fn success_builds_the_whole_graph_with_fixed_defaults() {
        let store = MemoryStore::new();
        let principal = signed_in(&store, "founder@example.com").await;

        let outcome = provision(
            &store,
            &principal,
            request("Igreja Adventista – Órlando Central!", "Igreja Adventista – Órlando Central!", "US"),
        )
        .await
        .unwrap();
        assert_eq!(outcome.slug, "igreja-adventista-orlando-central");

        let church = store
            .church_by_id(outcome.church_id)
            .await
            .unwrap()
            .unwrap();
        assert!(church.is_active);
        assert_eq!(church.slug, outcome.slug);

        let settings = store
            .settings_by_church(outcome.church_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(settings.timezone, "America/New_York");

        let ministries = store.ministries_by_church(outcome.church_id).await.unwrap();
        assert_eq!(ministries.len(), 9);

        let profile = store
            .profile_by_user(principal.user_id().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.id, outcome.profile_id);
        assert_eq!(profile.role, Role::Master);
        assert_eq!(profile.status, ProfileStatus::Active);
        assert!(profile.is_verified);
    }

    #[tokio::test]
    async fn provisioning_is_not_repeatable_per_identity() {
        let store = MemoryStore::new();
        let principal = signed_in(&store, "once@example.com").await;
        provision(&store, &principal, request("Once", "once", "BR"))
            .await
            .unwrap();

        let err = provision(&store, &principal, request("Twice", "twice", "BR"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::AlreadyOnboarded));
        assert_eq!(store.church_count().await, 1);
        assert!(!store.slug_in_use("twice").await.unwrap());
    }

    #[tokio::test]
    async fn a_stale_unbound_claim_does_not_bypass_the_row_check() {
        let store = MemoryStore::new();
        let principal = signed_in(&store, "stale@example.com").await;
        provision(&store, &principal, request("Mine", "mine", "BR"))
            .await
            .unwrap();

        // Same identity presenting a principal minted before onboarding,
        // with no binding attached.
        let stale = Principal::Authenticated {
            user_id: principal.user_id().unwrap(),
            email: "stale@example.com".to_string(),
            binding: None,
        };
        let err = provision(&store, &stale, request("Again", "again", "BR"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::AlreadyOnboarded));
    }
}
