//! The authoritative task table.
//!
//! Same field set as the client's record store plus `user_id`: a record is
//! only ever visible to the user who pushed it. `updated_at` carries the
//! client-assigned clock that the push handler's last-write-wins upsert
//! compares against.

use sea_orm::entity::prelude::*;
use tasksync::entity::{Priority, TaskStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    /// Client-generated UUID, used as-is. Never regenerated server-side.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub task_type_id: i32,
    pub personal_priority: i32,
    pub influence: i32,
    pub created_at: DateTimeUtc,
    pub deadline: Option<DateTimeUtc>,
    pub final_priority: Priority,
    pub status: TaskStatus,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
