//! Last-write-wins merge.
//!
//! When a remote record arrives, its `updated_at` is compared against the
//! local copy's. The strictly newer side wins; a tie keeps whatever is
//! already stored, so re-applying the same batch is a no-op. Both the pull
//! pass here and the remote endpoint's push handler implement the same
//! rule, which is the system's sole cross-device concurrency control.

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait};

use crate::entity::task;
use crate::error::SyncError;
use crate::protocol::TaskRecord;

/// Decide whether an incoming record should replace the stored state.
///
/// Returns `true` if there is no stored copy for this id, or if the
/// incoming `updated_at` is strictly greater. Equal timestamps keep the
/// stored copy (no field churn).
pub fn should_apply(incoming: DateTime<Utc>, stored: Option<DateTime<Utc>>) -> bool {
    match stored {
        None => true,
        Some(stored) => incoming > stored,
    }
}

/// Merge a batch of remote records into the store, returning how many were
/// inserted or overwritten.
///
/// Runs against whatever connection it is given; the caller decides the
/// transaction boundary. [`RecordStore::apply_remote`](crate::store::RecordStore::apply_remote)
/// wraps this in a single transaction so the batch commits all-or-nothing.
pub async fn apply_batch(
    db: &impl ConnectionTrait,
    records: &[TaskRecord],
) -> Result<usize, SyncError> {
    let mut merged = 0;
    for record in records {
        let incoming = record.to_model()?;
        let existing = task::Entity::find_by_id(incoming.id.clone()).one(db).await?;
        match existing {
            None => {
                // Originated remotely; inserted verbatim with the remote
                // clock, so it stays below the post-pull watermark.
                task::Entity::insert(set_all(incoming)).exec(db).await?;
                merged += 1;
            }
            Some(local) if should_apply(incoming.updated_at, Some(local.updated_at)) => {
                log::debug!(
                    "overwriting task {} (remote {} > local {})",
                    local.id,
                    incoming.updated_at,
                    local.updated_at
                );
                let mut overwrite = set_all(incoming);
                // `created_at` is immutable; keep the local value.
                overwrite.created_at = Set(local.created_at);
                overwrite.update(db).await?;
                merged += 1;
            }
            Some(local) => {
                // Expected non-event under LWW, not a conflict to report.
                log::debug!(
                    "keeping task {} (local {} >= remote {})",
                    local.id,
                    local.updated_at,
                    incoming.updated_at
                );
            }
        }
    }
    Ok(merged)
}

fn set_all(model: task::Model) -> task::ActiveModel {
    task::ActiveModel {
        id: Set(model.id),
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_no_stored_copy_always_applies() {
        assert!(should_apply(at(100), None));
    }

    #[test]
    fn test_newer_incoming_wins() {
        assert!(should_apply(at(200), Some(at(100))));
    }

    #[test]
    fn test_older_incoming_loses() {
        assert!(!should_apply(at(100), Some(at(200))));
    }

    #[test]
    fn test_tie_keeps_stored_copy() {
        assert!(!should_apply(at(100), Some(at(100))));
    }
}
