//! The Task entity — the unit of synchronization.
//!
//! `updated_at` is the sole conflict-resolution key: every mutation bumps it,
//! and the merge in [`crate::merge`] compares nothing else. Timestamps are
//! stored timezone-canonical (UTC) so they are epoch-comparable without any
//! per-comparison normalization.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    /// Client-generated UUID in textual form, stable across sync.
    /// The join key between local and remote copies of a record.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub description: String,
    pub task_type_id: i32,
    /// Client-assigned importance in [0,10].
    pub personal_priority: i32,
    /// Client-assigned impact in [0,10].
    pub influence: i32,
    pub created_at: DateTimeUtc,
    pub deadline: Option<DateTimeUtc>,
    pub final_priority: Priority,
    pub status: TaskStatus,
    /// Last-modification timestamp. Monotonically non-decreasing under any
    /// single actor's edits; recomputed on every field mutation.
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::task_type::Entity",
        from = "Column::TaskTypeId",
        to = "super::task_type::Column::Id"
    )]
    TaskType,
}

impl Related<super::task_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TaskType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Task lifecycle state.
///
/// Transitions are one-directional: `underway → overdue` is system-derived
/// (the status sweep), `* → completed/cancelled` are terminal. No code path
/// reopens a completed or cancelled task.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum TaskStatus {
    #[sea_orm(string_value = "underway")]
    Underway,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "overdue")]
    Overdue,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Underway => "underway",
            TaskStatus::Completed => "completed",
            TaskStatus::Overdue => "overdue",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "underway" => Some(TaskStatus::Underway),
            "completed" => Some(TaskStatus::Completed),
            "overdue" => Some(TaskStatus::Overdue),
            "cancelled" => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }

    /// Open tasks are the ones the duplicate detector scans.
    pub fn is_open(&self) -> bool {
        matches!(self, TaskStatus::Underway | TaskStatus::Overdue)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

/// Final priority class, either user-chosen or ML-predicted upstream.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum Priority {
    #[sea_orm(string_value = "Casual")]
    Casual,
    #[sea_orm(string_value = "Low")]
    Low,
    #[sea_orm(string_value = "Mid")]
    Mid,
    #[sea_orm(string_value = "High")]
    High,
    #[sea_orm(string_value = "Extreme")]
    Extreme,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Casual => "Casual",
            Priority::Low => "Low",
            Priority::Mid => "Mid",
            Priority::High => "High",
            Priority::Extreme => "Extreme",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Casual" => Some(Priority::Casual),
            "Low" => Some(Priority::Low),
            "Mid" => Some(Priority::Mid),
            "High" => Some(Priority::High),
            "Extreme" => Some(Priority::Extreme),
            _ => None,
        }
    }
}
