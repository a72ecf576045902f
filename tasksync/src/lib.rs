//! # tasksync
//!
//! Offline-first synchronization core for a personal task tracker.
//!
//! A device keeps its tasks in a local SQLite [`RecordStore`] and
//! periodically reconciles them against a remote multi-device endpoint:
//! push every record modified after the device's watermark, pull the
//! remote's changes, merge with last-write-wins keyed on `updated_at`, then
//! advance the watermark to the server's clock.
//!
//! ## Quick start
//!
//! ```ignore
//! use tasksync::{DeviceSettings, HttpRemote, RecordStore, Session, SyncEngine};
//!
//! let store = RecordStore::open("sqlite://tasks.db?mode=rwc").await?;
//! let session = Session::new("http://localhost:8000", DeviceSettings::new("settings.json"))
//!     .with_token(token);
//! let engine = SyncEngine::new(store, HttpRemote::new("http://localhost:8000")?, session);
//!
//! let outcome = engine.run().await;
//! if !outcome.success {
//!     eprintln!("{}", outcome.message);
//! }
//! ```
//!
//! ## Key types
//!
//! - [`RecordStore`] — local persistent task collection
//! - [`SyncEngine`] — push-then-pull pass orchestration
//! - [`RemoteEndpoint`] / [`HttpRemote`] — the remote seam and its HTTP client
//! - [`Session`] / [`DeviceSettings`] — credential and watermark state
//! - [`find_duplicates`](dedup::find_duplicates) — advisory near-duplicate check
//! - [`sweep`](sweep::sweep) — deadline-passed status derivation

pub mod dedup;
pub mod engine;
pub mod entity;
pub mod error;
pub mod merge;
pub mod protocol;
pub mod remote;
pub mod session;
pub mod store;
pub mod sweep;

pub use engine::{SyncEngine, SyncOutcome};
pub use entity::{Priority, TaskStatus};
pub use error::SyncError;
pub use protocol::{PullResponse, PushRequest, PushResponse, TaskRecord, DEFAULT_WATERMARK};
pub use remote::{HttpRemote, RemoteEndpoint};
pub use session::{DeviceSettings, Session};
pub use store::{NewTask, RecordStore, StatusCounts, TaskEdit};

// Re-export for downstream crates that query the store directly.
pub use sea_orm;
