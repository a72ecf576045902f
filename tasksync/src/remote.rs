//! The remote endpoint seam.
//!
//! [`RemoteEndpoint`] is the trait the engine talks through; [`HttpRemote`]
//! is the production implementation over the authenticated HTTP API. Tests
//! substitute a scripted in-process double.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::error::SyncError;
use crate::protocol::{PullResponse, PushRequest, PushResponse};

#[async_trait]
pub trait RemoteEndpoint: Send + Sync {
    /// Batched create-or-update of the caller's changed tasks.
    async fn push(&self, token: &str, batch: PushRequest) -> Result<PushResponse, SyncError>;

    /// Tasks modified after `last_sync`, plus the remote's current clock.
    async fn pull(&self, token: &str, last_sync: &str) -> Result<PullResponse, SyncError>;
}

#[async_trait]
impl<R: RemoteEndpoint + ?Sized> RemoteEndpoint for std::sync::Arc<R> {
    async fn push(&self, token: &str, batch: PushRequest) -> Result<PushResponse, SyncError> {
        (**self).push(token, batch).await
    }

    async fn pull(&self, token: &str, last_sync: &str) -> Result<PullResponse, SyncError> {
        (**self).pull(token, last_sync).await
    }
}

/// HTTP client for the `/sync` API.
pub struct HttpRemote {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(HttpRemote {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl RemoteEndpoint for HttpRemote {
    async fn push(&self, token: &str, batch: PushRequest) -> Result<PushResponse, SyncError> {
        let response = self
            .client
            .post(format!("{}/sync/push", self.base_url))
            .bearer_auth(token)
            .json(&batch)
            .send()
            .await?;
        let response = classify(response).await?;
        Ok(response.json::<PushResponse>().await?)
    }

    async fn pull(&self, token: &str, last_sync: &str) -> Result<PullResponse, SyncError> {
        let response = self
            .client
            .get(format!("{}/sync/pull", self.base_url))
            .query(&[("last_sync", last_sync)])
            .bearer_auth(token)
            .send()
            .await?;
        let response = classify(response).await?;
        Ok(response.json::<PullResponse>().await?)
    }
}

/// Map an HTTP status onto the error taxonomy. The body is read here, while
/// it is still available, so validation detail survives into the error.
async fn classify(response: reqwest::Response) -> Result<reqwest::Response, SyncError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SyncError::Auth(body),
        StatusCode::UNPROCESSABLE_ENTITY => SyncError::Validation(body),
        _ => SyncError::Network(format!("HTTP {status}: {body}")),
    })
}
