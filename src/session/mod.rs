//! Session resolution: turns a bearer token or session cookie into a
//! [`Principal`]. Resolution never fails the request; anything that cannot
//! be proven (bad token, missing user, storage trouble, a profile that is
//! not active) resolves to [`Principal::Anonymous`].

use axum::http::{header, HeaderMap};
use uuid::Uuid;

use crate::auth::decode_jwt;
use crate::store::Store;
use crate::types::{ProfileStatus, Role};

pub const SESSION_COOKIE: &str = "flock_session";

/// A tenant membership proven by a profile row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantBinding {
    pub church_id: Uuid,
    pub profile_id: Uuid,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Anonymous,
    Authenticated {
        user_id: Uuid,
        email: String,
        binding: Option<TenantBinding>,
    },
}

impl Principal {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Principal::Authenticated { .. })
    }

    pub fn binding(&self) -> Option<&TenantBinding> {
        match self {
            Principal::Authenticated { binding, .. } => binding.as_ref(),
            Principal::Anonymous => None,
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Principal::Authenticated { user_id, .. } => Some(*user_id),
            Principal::Anonymous => None,
        }
    }
}

/// Pulls the session token from the request: `Authorization: Bearer` wins,
/// then the session cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        if let Ok(value) = value.to_str() {
            if let Some(token) = value.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        pair.trim()
            .strip_prefix(SESSION_COOKIE)?
            .strip_prefix('=')
            .map(|token| token.to_string())
    })
}

/// Resolves a token against the store. The profile row is authoritative
/// for tenant binding; claims only carry identity. A claim that disagrees
/// with the row is logged and ignored.
pub async fn resolve(store: &dyn Store, token: Option<&str>) -> Principal {
    let Some(token) = token else {
        return Principal::Anonymous;
    };
    let claims = match decode_jwt(token) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::debug!(error = %err, "rejected session token");
            return Principal::Anonymous;
        }
    };

    let profile = match store.profile_by_user(claims.sub).await {
        Ok(profile) => profile,
        Err(err) => {
            tracing::warn!(error = %err, "session lookup failed; treating request as anonymous");
            return Principal::Anonymous;
        }
    };

    match profile {
        Some(profile) => {
            if profile.status != ProfileStatus::Active {
                tracing::debug!(
                    profile_id = %profile.id,
                    status = profile.status.as_str(),
                    "profile not active; treating request as anonymous"
                );
                return Principal::Anonymous;
            }
            if claims.church_id.is_some_and(|id| id != profile.church_id)
                || claims.role.is_some_and(|role| role != profile.role)
            {
                tracing::warn!(
                    user_id = %claims.sub,
                    "session claims disagree with profile row; row wins"
                );
            }
            Principal::Authenticated {
                user_id: claims.sub,
                email: claims.email,
                binding: Some(TenantBinding {
                    church_id: profile.church_id,
                    profile_id: profile.id,
                    role: profile.role,
                }),
            }
        }
        None => match store.user_by_id(claims.sub).await {
            Ok(Some(_)) => Principal::Authenticated {
                user_id: claims.sub,
                email: claims.email,
                binding: None,
            },
            Ok(None) => {
                tracing::debug!(user_id = %claims.sub, "token for unknown user");
                Principal::Anonymous
            }
            Err(err) => {
                tracing::warn!(error = %err, "session lookup failed; treating request as anonymous");
                Principal::Anonymous
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{generate_jwt, Claims};
    use crate::store::{IdentityStore, MemoryStore, NewUser};
    use crate::types::Profile;
    use chrono::Utc;

    async fn seeded_user(store: &MemoryStore, email: &str) -> Uuid {
        store
            .create_user(NewUser {
                email: email.to_string(),
                password_hash: "x".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    fn profile_for(user_id: Uuid, role: Role, status: ProfileStatus) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            user_id,
            church_id: Uuid::new_v4(),
            full_name: "Someone".to_string(),
            phone: None,
            role,
            status,
            is_verified: true,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn missing_or_garbage_tokens_resolve_anonymous() {
        let store = MemoryStore::new();
        assert_eq!(resolve(&store, None).await, Principal::Anonymous);
        assert_eq!(
            resolve(&store, Some("not-a-jwt")).await,
            Principal::Anonymous
        );
    }

    #[tokio::test]
    async fn token_for_deleted_user_resolves_anonymous() {
        let store = MemoryStore::new();
        let claims = Claims::new(Uuid::new_v4(), "ghost@example.com".to_string());
        let token = generate_jwt(&claims).unwrap();
        assert_eq!(resolve(&store, Some(&token)).await, Principal::Anonymous);
    }

    #[tokio::test]
    async fn user_without_profile_is_authenticated_but_unbound() {
        let store = MemoryStore::new();
        let user_id = seeded_user(&store, "new@example.com").await;
        let token = generate_jwt(&Claims::new(user_id, "new@example.com".to_string())).unwrap();

        let principal = resolve(&store, Some(&token)).await;
        assert!(principal.is_authenticated());
        assert!(principal.binding().is_none());
    }

    #[tokio::test]
    async fn profile_row_supplies_the_binding() {
        let store = MemoryStore::new();
        let user_id = seeded_user(&store, "bound@example.com").await;
        let profile = profile_for(user_id, Role::Pastor, ProfileStatus::Active);
        let church_id = profile.church_id;
        let profile_id = profile.id;
        store.insert_profile(profile).await;

        let token = generate_jwt(&Claims::new(user_id, "bound@example.com".to_string())).unwrap();
        let principal = resolve(&store, Some(&token)).await;
        let binding = principal.binding().copied().unwrap();
        assert_eq!(binding.church_id, church_id);
        assert_eq!(binding.profile_id, profile_id);
        assert_eq!(binding.role, Role::Pastor);
    }

    #[tokio::test]
    async fn stale_claims_lose_to_the_profile_row() {
        let store = MemoryStore::new();
        let user_id = seeded_user(&store, "stale@example.com").await;
        let profile = profile_for(user_id, Role::Master, ProfileStatus::Active);
        let row_church = profile.church_id;
        store.insert_profile(profile).await;

        // Claims minted against a different church and a lower role.
        let claims = Claims::new(user_id, "stale@example.com".to_string()).with_binding(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Role::Member,
        );
        let token = generate_jwt(&claims).unwrap();

        let principal = resolve(&store, Some(&token)).await;
        let binding = principal.binding().copied().unwrap();
        assert_eq!(binding.church_id, row_church);
        assert_eq!(binding.role, Role::Master);
    }

    #[tokio::test]
    async fn non_active_profile_resolves_anonymous() {
        let store = MemoryStore::new();
        for status in [ProfileStatus::Inactive, ProfileStatus::Pending] {
            let user_id = seeded_user(&store, &format!("{}@example.com", status.as_str())).await;
            store
                .insert_profile(profile_for(user_id, Role::Member, status))
                .await;
            let token =
                generate_jwt(&Claims::new(user_id, "someone@example.com".to_string())).unwrap();
            assert_eq!(resolve(&store, Some(&token)).await, Principal::Anonymous);
        }
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer token-a".parse().unwrap());
        headers.insert(
            header::COOKIE,
            format!("theme=dark; {SESSION_COOKIE}=token-b").parse().unwrap(),
        );
        assert_eq!(token_from_headers(&headers).as_deref(), Some("token-a"));

        headers.remove(header::AUTHORIZATION);
        assert_eq!(token_from_headers(&headers).as_deref(), Some("token-b"));

        headers.remove(header::COOKIE);
        assert_eq!(token_from_headers(&headers), None);
    }
}
