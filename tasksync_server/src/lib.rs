//! # tasksync_server
//!
//! The remote endpoint of the tasksync protocol: an axum HTTP server holding
//! the authoritative multi-device task collection, one row set per user.
//!
//! Devices authenticate with a bearer token (`/auth/register`,
//! `/auth/login`), push their changed tasks in one batch (`/sync/push`,
//! applied create-or-overwrite with last-write-wins on `updated_at`), and
//! pull everything modified after their watermark (`/sync/pull`, which also
//! returns the server's clock for the next watermark).

use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Duration;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};

pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod routes;

pub use config::Config;
pub use error::ApiError;

/// Shared handler state: the database handle plus token-signing parameters.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub jwt_secret: String,
    pub token_ttl: Duration,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/sync/push", post(routes::sync::push))
        .route("/sync/pull", get(routes::sync::pull))
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "status": "online" }))
}
