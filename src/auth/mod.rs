use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, SaltString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;
use crate::types::Role;

/// Token claims. `church_id`/`profile_id`/`role` describe the tenant
/// binding as of token issue time; they are advisory. The profile row is
/// what authorization decisions trust, and a fresh token is minted when
/// onboarding changes the binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub church_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, email: String) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user_id,
            email,
            church_id: None,
            profile_id: None,
            role: None,
            exp,
            iat: now.timestamp(),
        }
    }

    pub fn with_binding(mut self, church_id: Uuid, profile_id: Uuid, role: Role) -> Self {
        self.church_id = Some(church_id);
        self.profile_id = Some(profile_id);
        self.role = Some(role);
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token generation failed: {0}")]
    TokenGeneration(String),
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("signing secret is not configured")]
    MissingSecret,
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

pub fn generate_jwt(claims: &Claims) -> Result<String, AuthError> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let header = Header::default();

    encode(&header, claims, &encoding_key).map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

pub fn decode_jwt(token: &str) -> Result<Claims, AuthError> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|_| AuthError::InvalidToken)
}

/// Hashes a password into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let phc = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?;
    Ok(phc.to_string())
}

/// Verifies a password against a stored PHC string. An unparseable stored
/// hash counts as a mismatch.
pub fn verify_password(stored_hash: &str, password: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
