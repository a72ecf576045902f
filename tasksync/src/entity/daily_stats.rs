//! Per-day aggregate counters, recomputed by the status sweep.
//!
//! Device-local projection over the task table. Not synchronized.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "daily_stats")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub date: Date,
    pub total_tasks: i32,
    pub completed_tasks: i32,
    pub overdue_tasks: i32,
    pub in_progress_tasks: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
