//! Account registration and login. Both respond with a bearer token.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::auth;
use crate::entity::user;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

impl Token {
    fn bearer(access_token: String) -> Self {
        Token {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<Token>, ApiError> {
    if credentials.email.is_empty() || !credentials.email.contains('@') {
        return Err(ApiError::Validation("invalid email address".to_string()));
    }
    if credentials.password.is_empty() {
        return Err(ApiError::Validation("password must not be empty".to_string()));
    }
    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&credentials.email))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::BadRequest("Email already registered".to_string()));
    }

    let salt = auth::generate_salt();
    let row = user::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        email: Set(credentials.email.clone()),
        password_digest: Set(auth::hash_password(&credentials.password, &salt)),
        salt: Set(salt),
        created_at: Set(Utc::now()),
    };
    row.insert(&state.db).await?;
    log::info!("registered user {}", credentials.email);

    let token = auth::issue_token(&credentials.email, &state.jwt_secret, state.token_ttl)?;
    Ok(Json(Token::bearer(token)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<Token>, ApiError> {
    let user = user::Entity::find()
        .filter(user::Column::Email.eq(&credentials.email))
        .one(&state.db)
        .await?;
    let valid = user
        .map(|u| auth::verify_password(&credentials.password, &u.salt, &u.password_digest))
        .unwrap_or(false);
    if !valid {
        return Err(ApiError::Unauthorized(
            "Incorrect email or password".to_string(),
        ));
    }
    let token = auth::issue_token(&credentials.email, &state.jwt_secret, state.token_ttl)?;
    Ok(Json(Token::bearer(token)))
}
