//! Fixed category enumeration for tasks, seeded at store creation.

use sea_orm::entity::prelude::*;

/// Seed list, in the id order the original deployment assigned.
pub const SEED_NAMES: [&str; 11] = [
    "Other",
    "Meeting",
    "Dust Cleaning",
    "Documentation",
    "Customer Support",
    "Code Bug Fix",
    "Research",
    "Optimization",
    "Deployment",
    "Project Management",
    "Feature Development",
];

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "task_types")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::task::Entity")]
    Task,
}

impl Related<super::task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Task.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
