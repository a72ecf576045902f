//! Bearer-token authentication.
//!
//! Passwords are digested with blake3 over a per-user random salt; tokens
//! are HS256 JWTs whose subject is the user's email. [`AuthUser`] is the
//! extractor handlers take to require a valid credential.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::entity::user;
use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// Sign a bearer token for `email`, valid for `ttl`.
pub fn issue_token(email: &str, secret: &str, ttl: Duration) -> Result<String, ApiError> {
    let claims = Claims {
        sub: email.to_string(),
        exp: (Utc::now() + ttl).timestamp(),
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Verify a bearer token and return its subject email.
pub fn verify_token(token: &str, secret: &str) -> Result<String, ApiError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized("invalid or expired token".to_string()))?;
    Ok(data.claims.sub)
}

pub fn generate_salt() -> String {
    let bytes: [u8; 16] = rand::random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

pub fn hash_password(password: &str, salt: &str) -> String {
    digest(password, salt).to_hex().to_string()
}

/// Constant-time comparison against the stored digest.
pub fn verify_password(password: &str, salt: &str, stored_hex: &str) -> bool {
    match blake3::Hash::from_hex(stored_hex) {
        Ok(stored) => digest(password, salt) == stored,
        Err(_) => false,
    }
}

fn digest(password: &str, salt: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher.finalize()
}

/// The authenticated caller, resolved from the `Authorization: Bearer`
/// header. Rejects with 401 before the handler body runs.
pub struct AuthUser(pub user::Model);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;
        let email = verify_token(token, &state.jwt_secret)?;
        let user = user::Entity::find()
            .filter(user::Column::Email.eq(&email))
            .one(&state.db)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("unknown user".to_string()))?;
        Ok(AuthUser(user))
    }
}
