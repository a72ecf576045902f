//! The push/pull sync surface.
//!
//! Push applies a batch of client records with create-or-overwrite
//! semantics: unknown ids are created under the caller, known ids are
//! overwritten only when the incoming `updated_at` is strictly newer than
//! the stored one. Ties and older writes are dropped silently; under
//! last-write-wins that is the expected non-event, not a conflict.
//!
//! Pull returns everything the caller owns that changed after `last_sync`,
//! plus the server's clock. The clock is read before the query runs so a
//! record committed between query and response can never fall into the gap
//! between two watermarks.

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use serde::Deserialize;
use tasksync::entity::{Priority, TaskStatus};
use tasksync::protocol::{format_timestamp, parse_timestamp};
use tasksync::{PullResponse, PushRequest, PushResponse, TaskRecord};

use crate::AppState;
use crate::auth::AuthUser;
use crate::entity::task;
use crate::error::ApiError;

pub async fn push(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<PushRequest>,
) -> Result<Json<PushResponse>, ApiError> {
    // Validate the whole payload before touching the store, so a malformed
    // record rejects the batch as 422 with nothing applied.
    let incoming = body
        .tasks
        .iter()
        .map(|record| validate(record, &user.id))
        .collect::<Result<Vec<_>, _>>()?;

    let txn = state.db.begin().await?;
    let mut applied = 0;
    for model in incoming {
        applied += usize::from(upsert(&txn, model).await?);
    }
    txn.commit().await?;
    log::debug!("push from {}: {} of {} applied", user.email, applied, body.tasks.len());

    Ok(Json(PushResponse {
        status: "success".to_string(),
        message: "Tasks synced".to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct PullParams {
    pub last_sync: String,
}

pub async fn pull(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<PullParams>,
) -> Result<Json<PullResponse>, ApiError> {
    let server_time = Utc::now();
    let since = parse_timestamp(&params.last_sync)
        .map_err(|err| ApiError::Validation(err.to_string()))?;

    let rows = task::Entity::find()
        .filter(task::Column::UserId.eq(&user.id))
        .filter(task::Column::UpdatedAt.gt(since))
        .order_by_asc(task::Column::UpdatedAt)
        .all(&state.db)
        .await?;
    log::debug!("pull for {}: {} task(s) since {}", user.email, rows.len(), params.last_sync);

    Ok(Json(PullResponse {
        tasks: rows.iter().map(to_record).collect(),
        server_time: format_timestamp(server_time),
    }))
}

/// Create-or-overwrite one record under last-write-wins. Returns whether
/// the row changed.
async fn upsert(db: &impl ConnectionTrait, incoming: task::Model) -> Result<bool, ApiError> {
    let existing = task::Entity::find()
        .filter(task::Column::Id.eq(&incoming.id))
        .filter(task::Column::UserId.eq(&incoming.user_id))
        .one(db)
        .await?;
    match existing {
        None => {
            task::Entity::insert(set_all(incoming)).exec(db).await?;
            Ok(true)
        }
        Some(stored) if incoming.updated_at > stored.updated_at => {
            let mut overwrite = set_all(incoming);
            overwrite.created_at = Set(stored.created_at);
            overwrite.update(db).await?;
            Ok(true)
        }
        Some(stored) => {
            log::debug!(
                "dropping stale write for task {} ({} <= {})",
                stored.id,
                incoming.updated_at,
                stored.updated_at
            );
            Ok(false)
        }
    }
}

fn set_all(model: task::Model) -> task::ActiveModel {
    task::ActiveModel {
        id: Set(model.id),
        user_id: Set(model.user_id),
        title: Set(model.title),
        description: Set(model.description),
        task_type_id: Set(model.task_type_id),
        personal_priority: Set(model.personal_priority),
        influence: Set(model.influence),
        created_at: Set(model.created_at),
        deadline: Set(model.deadline),
        final_priority: Set(model.final_priority),
        status: Set(model.status),
        updated_at: Set(model.updated_at),
    }
}

fn validate(record: &TaskRecord, user_id: &str) -> Result<task::Model, ApiError> {
    if record.id.is_empty() {
        return Err(ApiError::Validation("task id must not be empty".to_string()));
    }
    let status = TaskStatus::parse(&record.status).ok_or_else(|| {
        ApiError::Validation(format!(
            "task {}: unknown status {:?}",
            record.id, record.status
        ))
    })?;
    let final_priority = Priority::parse(&record.final_priority).ok_or_else(|| {
        ApiError::Validation(format!(
            "task {}: unknown final_priority {:?}",
            record.id, record.final_priority
        ))
    })?;
    Ok(task::Model {
        id: record.id.clone(),
        user_id: user_id.to_string(),
        title: record.title.clone(),
        description: record.description.clone().unwrap_or_default(),
        task_type_id: record.task_type_id,
        personal_priority: record.personal_priority,
        influence: record.influence,
        created_at: timestamp(&record.id, &record.created_at)?,
        deadline: match &record.deadline {
            Some(raw) => Some(timestamp(&record.id, raw)?),
            None => None,
        },
        final_priority,
        status,
        updated_at: timestamp(&record.id, &record.updated_at)?,
    })
}

fn timestamp(id: &str, raw: &str) -> Result<DateTime<Utc>, ApiError> {
    parse_timestamp(raw).map_err(|_| {
        ApiError::Validation(format!("task {id}: unparseable timestamp {raw:?}"))
    })
}

fn to_record(model: &task::Model) -> TaskRecord {
    TaskRecord {
        id: model.id.clone(),
        title: model.title.clone(),
        description: Some(model.description.clone()),
        task_type_id: model.task_type_id,
        personal_priority: model.personal_priority,
        influence: model.influence,
        status: model.status.as_str().to_string(),
        deadline: model.deadline.map(format_timestamp),
        created_at: format_timestamp(model.created_at),
        updated_at: format_timestamp(model.updated_at),
        final_priority: model.final_priority.as_str().to_string(),
    }
}
