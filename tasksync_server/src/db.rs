//! Database bootstrap: connect, create missing tables, seed task types.

use sea_orm::sea_query::SqliteQueryBuilder;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, Schema,
};

use crate::entity::{task, task_type, user};

pub async fn connect(url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(url).await?;
    create_tables(&db).await?;
    seed_task_types(&db).await?;
    Ok(db)
}

async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    for statement in [
        schema
            .create_table_from_entity(user::Entity::default())
            .if_not_exists()
            .to_owned()
            .to_string(SqliteQueryBuilder),
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
    ] {
        db.execute_unprepared(&statement).await?;
    }
    Ok(())
}

/// The fixed category list, inserted once on first startup in the same
/// order the client seeds it, so ids agree across the wire.
async fn seed_task_types(db: &DatabaseConnection) -> Result<(), DbErr> {
    let existing = task_type::Entity::find().count(db).await?;
    if existing > 0 {
        log::debug!("task types already seeded");
        return Ok(());
    }
    let rows = task_type::SEED_NAMES.iter().map(|name| task_type::ActiveModel {
        name: Set((*name).to_string()),
        ..Default::default()
    });
    task_type::Entity::insert_many(rows).exec(db).await?;
    log::info!("seeded {} task types", task_type::SEED_NAMES.len());
    Ok(())
}
