//! Error taxonomy for the sync core.
//!
//! Every variant maps to a distinct caller-visible failure class. All of
//! them are caught at the engine boundary and converted into a
//! [`SyncOutcome`](crate::engine::SyncOutcome); nothing here crosses into
//! UI rendering code.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    /// Malformed payload, rejected by the remote (HTTP 422) or unparseable
    /// locally. Non-retryable; carries the field-level detail.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Expired or invalid credential, or no credential at all. The pass
    /// aborts immediately, watermark untouched; the caller should
    /// re-authenticate.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Timeout, refused connection or 5xx. Not retried inside the engine;
    /// the next scheduled cycle is the retry mechanism.
    #[error("network error: {0}")]
    Network(String),

    /// Local storage failure. During a pull merge this rolls the whole
    /// batch back and leaves the watermark unadvanced.
    #[error("storage error: {0}")]
    Storage(#[from] sea_orm::DbErr),

    /// Device settings file could not be read or written.
    #[error("settings error: {0}")]
    Settings(String),
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        // Transport-level failures only; HTTP status classification happens
        // in the remote client where the response body is still available.
        SyncError::Network(err.to_string())
    }
}
