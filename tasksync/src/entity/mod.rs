//! SeaORM entities for the local record store.

pub mod daily_stats;
pub mod task;
pub mod task_type;

pub use task::{Priority, TaskStatus};
