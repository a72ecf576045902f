//! The sync engine: serialized push-then-pull passes.
//!
//! One pass pushes every local task newer than the watermark, then pulls
//! and merges the remote's changes, then advances the watermark to the
//! server's clock. Push must fully complete before pull begins, so a device
//! never pulls back a stale view of its own unflushed writes. The watermark
//! advances only after a fully successful round-trip; any failure leaves it
//! untouched and the next scheduled cycle naturally retries.

use tokio::sync::Mutex;

use crate::error::SyncError;
use crate::protocol::{parse_timestamp, PushRequest, TaskRecord, DEFAULT_WATERMARK};
use crate::remote::RemoteEndpoint;
use crate::session::Session;
use crate::store::RecordStore;

/// What the caller (UI or scheduler) sees after a pass. No error type
/// crosses this boundary.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub success: bool,
    pub message: String,
}

/// Per-pass accounting, for the summary log line.
#[derive(Debug, Clone)]
struct SyncReport {
    pushed: usize,
    merged: usize,
    watermark: String,
}

pub struct SyncEngine<R: RemoteEndpoint> {
    store: RecordStore,
    remote: R,
    session: Session,
    // Single-slot lock: a concurrent manual trigger queues behind the pass
    // in progress instead of interleaving with it.
    pass_lock: Mutex<()>,
}

impl<R: RemoteEndpoint> SyncEngine<R> {
    pub fn new(store: RecordStore, remote: R, session: Session) -> Self {
        SyncEngine {
            store,
            remote,
            session,
            pass_lock: Mutex::new(()),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Run one full pass and report the outcome. Every error is caught
    /// here; callers branch on `success` and show `message`.
    pub async fn run(&self) -> SyncOutcome {
        let _pass = self.pass_lock.lock().await;
        match self.run_pass().await {
            Ok(report) => {
                log::info!(
                    "sync complete: pushed {}, merged {}, watermark {}",
                    report.pushed,
                    report.merged,
                    report.watermark
                );
                SyncOutcome {
                    success: true,
                    message: format!(
                        "sync complete: pushed {}, merged {}",
                        report.pushed, report.merged
                    ),
                }
            }
            Err(err) => {
                log::error!("sync failed: {err}");
                SyncOutcome {
                    success: false,
                    message: err.to_string(),
                }
            }
        }
    }

    async fn run_pass(&self) -> Result<SyncReport, SyncError> {
        let token = self.session.token()?.to_string();

        // An empty store re-pulls the full history even when a stale
        // watermark survived (a wiped or re-provisioned device).
        let watermark_raw = if self.store.task_count().await? == 0 {
            DEFAULT_WATERMARK.to_string()
        } else {
            self.session.watermark()?
        };
        let watermark = parse_timestamp(&watermark_raw)?;

        // Push pass. One batched request; nothing mutates locally.
        let changed = self.store.changed_since(watermark).await?;
        let pushed = changed.len();
        if !changed.is_empty() {
            let batch = PushRequest {
                tasks: changed.iter().map(TaskRecord::from_model).collect(),
            };
            self.remote.push(&token, batch).await?;
            log::debug!("pushed {pushed} task(s)");
        }

        // Pull pass, only after push fully succeeded.
        let response = self.remote.pull(&token, &watermark_raw).await?;
        let merged = self.store.apply_remote(&response.tasks).await?;

        // The server's clock becomes the new watermark verbatim, and only
        // now that the merge batch has committed.
        self.session.set_watermark(&response.server_time)?;

        Ok(SyncReport {
            pushed,
            merged,
            watermark: response.server_time,
        })
    }
}
