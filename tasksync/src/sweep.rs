//! Status derivation sweep.
//!
//! Runs once per process start and once per day: any task still underway
//! whose deadline has passed becomes overdue, and the current calendar
//! date's aggregate counters are recomputed. A pure projection over the
//! record store; it never talks to the remote endpoint, and participates in
//! sync only through the `updated_at` bump the transition causes.

use chrono::{NaiveDate, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, TransactionTrait,
};

use crate::entity::{daily_stats, task, TaskStatus};
use crate::error::SyncError;
use crate::store::{RecordStore, StatusCounts};

/// Transition passed-deadline tasks to overdue and refresh today's
/// counters. Returns `(overdue_count, in_progress_count)`.
///
/// Idempotent: re-running without newly passed deadlines changes nothing.
pub async fn sweep(store: &RecordStore) -> Result<(u64, u64), SyncError> {
    let db = store.connection();
    let now = Utc::now();

    let txn = db.begin().await?;
    let due = task::Entity::find()
        .filter(task::Column::Status.eq(TaskStatus::Underway))
        .filter(task::Column::Deadline.is_not_null())
        .filter(task::Column::Deadline.lt(now))
        .all(&txn)
        .await?;
    let flipped = due.len();
    for model in due {
        let mut active: task::ActiveModel = model.into();
        active.status = Set(TaskStatus::Overdue);
        active.updated_at = Set(now);
        active.update(&txn).await?;
    }
    txn.commit().await?;
    if flipped > 0 {
        log::info!("sweep: {flipped} task(s) transitioned to overdue");
    }

    let counts = store.status_counts().await?;
    record_daily(db, now.date_naive(), &counts).await?;
    Ok((counts.overdue, counts.in_progress))
}

/// Upsert the daily counter row for `date`.
async fn record_daily(
    db: &impl ConnectionTrait,
    date: NaiveDate,
    counts: &StatusCounts,
) -> Result<(), SyncError> {
    let existing = daily_stats::Entity::find_by_id(date).one(db).await?;
    match existing {
        Some(row) => {
            let mut active: daily_stats::ActiveModel = row.into();
            active.total_tasks = Set(counts.total as i32);
            active.completed_tasks = Set(counts.completed as i32);
            active.overdue_tasks = Set(counts.overdue as i32);
            active.in_progress_tasks = Set(counts.in_progress as i32);
            active.update(db).await?;
        }
        None => {
            let row = daily_stats::ActiveModel {
                date: Set(date),
                total_tasks: Set(counts.total as i32),
                completed_tasks: Set(counts.completed as i32),
                overdue_tasks: Set(counts.overdue as i32),
                in_progress_tasks: Set(counts.in_progress as i32),
            };
            row.insert(db).await?;
        }
    }
    Ok(())
}
