//! The local record store.
//!
//! Wraps a SeaORM [`DatabaseConnection`], owning schema creation, the
//! task-type seed, and every mutation the UI layer performs. All writes go
//! through one commit per logical operation, and every mutation bumps the
//! task's `updated_at` so the next sync pass picks it up.

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::SqliteQueryBuilder;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    Iterable, PaginatorTrait, QueryFilter, QueryOrder, Schema, TransactionTrait,
};
use uuid::Uuid;

use crate::entity::{daily_stats, task, task_type, Priority, TaskStatus};
use crate::error::SyncError;
use crate::merge;
use crate::protocol::TaskRecord;

/// Field set for a task being created by user action.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub task_type_id: i32,
    pub personal_priority: i32,
    pub influence: i32,
    pub deadline: Option<DateTime<Utc>>,
    pub final_priority: Priority,
}

/// Fields a UI edit may change. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub task_type_id: Option<i32>,
    pub personal_priority: Option<i32>,
    pub influence: Option<i32>,
    pub deadline: Option<DateTime<Utc>>,
    pub final_priority: Option<Priority>,
}

/// Aggregate task counts, one bucket per status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub total: u64,
    pub completed: u64,
    pub overdue: u64,
    pub in_progress: u64,
}

#[derive(Clone)]
pub struct RecordStore {
    db: DatabaseConnection,
}

impl RecordStore {
    /// Connect, create missing tables and seed the task-type list.
    pub async fn open(url: &str) -> Result<Self, SyncError> {
        let db = Database::connect(url).await?;
        let store = RecordStore { db };
        store.create_tables().await?;
        store.seed_task_types().await?;
        Ok(store)
    }

    /// The underlying connection, for callers that need raw queries.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    async fn create_tables(&self) -> Result<(), SyncError> {
        let backend = self.db.get_database_backend();
        let schema = Schema::new(backend);
        for statement in [
            schema
                .create_table_from_entity(task_type::Entity::default())
                .if_not_exists()
                .to_owned()
                .to_string(SqliteQueryBuilder),
            schema
                .create_table_from_entity(task::Entity::default())
                .if_not_exists()
                .to_owned()
                .to_string(SqliteQueryBuilder),
            schema
                .create_table_from_entity(daily_stats::Entity::default())
                .if_not_exists()
                .to_owned()
                .to_string(SqliteQueryBuilder),
        ] {
            self.db.execute_unprepared(&statement).await?;
        }
        Ok(())
    }

    async fn seed_task_types(&self) -> Result<(), SyncError> {
        let existing = task_type::Entity::find().count(&self.db).await?;
        if existing > 0 {
            return Ok(());
        }
        let rows = task_type::SEED_NAMES.iter().map(|name| task_type::ActiveModel {
            name: Set((*name).to_string()),
            ..Default::default()
        });
        task_type::Entity::insert_many(rows).exec(&self.db).await?;
        log::info!("seeded {} task types", task_type::SEED_NAMES.len());
        Ok(())
    }

    /// Create a task with a fresh id, `created_at = updated_at = now`.
    pub async fn insert_task(&self, new: NewTask) -> Result<task::Model, SyncError> {
        let now = Utc::now();
        let model = task::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            title: Set(new.title),
            description: Set(new.description),
            task_type_id: Set(new.task_type_id),
            personal_priority: Set(new.personal_priority),
            influence: Set(new.influence),
            created_at: Set(now),
            deadline: Set(new.deadline),
            final_priority: Set(new.final_priority),
            status: Set(TaskStatus::Underway),
            updated_at: Set(now),
        };
        Ok(model.insert(&self.db).await?)
    }

    /// Apply a UI edit, bumping `updated_at`.
    pub async fn update_task(&self, id: &str, edit: TaskEdit) -> Result<task::Model, SyncError> {
        let existing = self.require(id).await?;
        let mut active: task::ActiveModel = existing.into();
        if let Some(title) = edit.title {
            active.title = Set(title);
        }
        if let Some(description) = edit.description {
            active.description = Set(description);
        }
        if let Some(task_type_id) = edit.task_type_id {
            active.task_type_id = Set(task_type_id);
        }
        if let Some(personal_priority) = edit.personal_priority {
            active.personal_priority = Set(personal_priority);
        }
        if let Some(influence) = edit.influence {
            active.influence = Set(influence);
        }
        if let Some(deadline) = edit.deadline {
            active.deadline = Set(Some(deadline));
        }
        if let Some(final_priority) = edit.final_priority {
            active.final_priority = Set(final_priority);
        }
        active.updated_at = Set(Utc::now());
        Ok(active.update(&self.db).await?)
    }

    /// Terminal transition; completed tasks are never reopened.
    pub async fn complete_task(&self, id: &str) -> Result<task::Model, SyncError> {
        self.transition(id, TaskStatus::Completed).await
    }

    /// Terminal transition; cancelled tasks are never reopened.
    pub async fn cancel_task(&self, id: &str) -> Result<task::Model, SyncError> {
        self.transition(id, TaskStatus::Cancelled).await
    }

    async fn transition(&self, id: &str, to: TaskStatus) -> Result<task::Model, SyncError> {
        let existing = self.require(id).await?;
        if existing.status.is_terminal() {
            return Err(SyncError::Validation(format!(
                "task {id} is already {}",
                existing.status.as_str()
            )));
        }
        let mut active: task::ActiveModel = existing.into();
        active.status = Set(to);
        active.updated_at = Set(Utc::now());
        Ok(active.update(&self.db).await?)
    }

    pub async fn get(&self, id: &str) -> Result<Option<task::Model>, SyncError> {
        Ok(task::Entity::find_by_id(id.to_string()).one(&self.db).await?)
    }

    async fn require(&self, id: &str) -> Result<task::Model, SyncError> {
        self.get(id)
            .await?
            .ok_or_else(|| SyncError::Validation(format!("task {id} not found")))
    }

    /// Open tasks (underway or overdue), in stable id order. Input to the
    /// duplicate detector.
    pub async fn open_tasks(&self) -> Result<Vec<task::Model>, SyncError> {
        Ok(task::Entity::find()
            .filter(task::Column::Status.is_in([TaskStatus::Underway, TaskStatus::Overdue]))
            .order_by_asc(task::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Every task modified after the watermark — the push input.
    pub async fn changed_since(
        &self,
        watermark: DateTime<Utc>,
    ) -> Result<Vec<task::Model>, SyncError> {
        Ok(task::Entity::find()
            .filter(task::Column::UpdatedAt.gt(watermark))
            .order_by_asc(task::Column::UpdatedAt)
            .all(&self.db)
            .await?)
    }

    pub async fn task_count(&self) -> Result<u64, SyncError> {
        Ok(task::Entity::find().count(&self.db).await?)
    }

    /// Merge a pulled batch inside one transaction: all-or-nothing.
    ///
    /// On any failure the transaction rolls back and the error propagates,
    /// so the caller leaves the watermark untouched and the same records
    /// are re-pulled next cycle.
    pub async fn apply_remote(&self, records: &[TaskRecord]) -> Result<usize, SyncError> {
        let txn = self.db.begin().await?;
        let merged = match merge::apply_batch(&txn, records).await {
            Ok(merged) => merged,
            Err(err) => {
                txn.rollback().await?;
                return Err(err);
            }
        };
        txn.commit().await?;
        Ok(merged)
    }

    pub async fn status_counts(&self) -> Result<StatusCounts, SyncError> {
        let count_for = |status: TaskStatus| {
            task::Entity::find()
                .filter(task::Column::Status.eq(status))
                .count(&self.db)
        };
        Ok(StatusCounts {
            total: self.task_count().await?,
            completed: count_for(TaskStatus::Completed).await?,
            overdue: count_for(TaskStatus::Overdue).await?,
            in_progress: count_for(TaskStatus::Underway).await?,
        })
    }

    /// Task count per final-priority class, in enum order.
    pub async fn priority_counts(&self) -> Result<Vec<(Priority, u64)>, SyncError> {
        let mut counts = Vec::new();
        for priority in Priority::iter() {
            let count = task::Entity::find()
                .filter(task::Column::FinalPriority.eq(priority))
                .count(&self.db)
                .await?;
            counts.push((priority, count));
        }
        Ok(counts)
    }

    pub async fn task_types(&self) -> Result<Vec<task_type::Model>, SyncError> {
        Ok(task_type::Entity::find()
            .order_by_asc(task_type::Column::Id)
            .all(&self.db)
            .await?)
    }
}
