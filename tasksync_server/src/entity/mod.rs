//! SeaORM entities for the server-side store.
//!
//! The task table mirrors the client's field set plus an owning `user_id`;
//! the task-type enumeration is identical on both sides and reused from the
//! core crate.

pub mod task;
pub mod user;

pub use tasksync::entity::task_type;
