//! Shared test support: an in-process remote endpoint double with the same
//! last-write-wins semantics as the real server, plus record fixtures.

// Each test binary compiles its own copy and uses a different subset.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tasksync::protocol::{format_timestamp, parse_timestamp};
use tasksync::{
    PullResponse, PushRequest, PushResponse, RemoteEndpoint, SyncError, TaskRecord,
};

/// Failure the next request should simulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    PushNetwork,
    PullNetwork,
    Unauthorized,
}

/// Scripted remote: a HashMap table with server-side LWW applied on push,
/// watermark filtering on pull, and a controllable clock.
pub struct InMemoryRemote {
    tasks: Mutex<HashMap<String, TaskRecord>>,
    server_time: Mutex<DateTime<Utc>>,
    fault: Mutex<Option<Fault>>,
    expected_token: String,
}

impl InMemoryRemote {
    pub fn new(server_time: DateTime<Utc>, expected_token: &str) -> Self {
        InMemoryRemote {
            tasks: Mutex::new(HashMap::new()),
            server_time: Mutex::new(server_time),
            fault: Mutex::new(None),
            expected_token: expected_token.to_string(),
        }
    }

    pub fn set_time(&self, ts: DateTime<Utc>) {
        *self.server_time.lock().unwrap() = ts;
    }

    pub fn set_fault(&self, fault: Fault) {
        *self.fault.lock().unwrap() = Some(fault);
    }

    pub fn seed(&self, record: TaskRecord) {
        self.tasks.lock().unwrap().insert(record.id.clone(), record);
    }

    pub fn get(&self, id: &str) -> Option<TaskRecord> {
        self.tasks.lock().unwrap().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    fn check(&self, token: &str) -> Result<(), SyncError> {
        if token != self.expected_token {
            return Err(SyncError::Auth("invalid bearer token".to_string()));
        }
        Ok(())
    }

    /// Consume the pending fault only if it targets this phase, so a
    /// `PullNetwork` fault survives the push call and fires on pull.
    fn take_fault_if(&self, applies: impl Fn(Fault) -> bool) -> Option<Fault> {
        let mut guard = self.fault.lock().unwrap();
        match *guard {
            Some(fault) if applies(fault) => {
                *guard = None;
                Some(fault)
            }
            _ => None,
        }
    }
}

#[async_trait]
impl RemoteEndpoint for InMemoryRemote {
    async fn push(&self, token: &str, batch: PushRequest) -> Result<PushResponse, SyncError> {
        match self.take_fault_if(|f| matches!(f, Fault::PushNetwork | Fault::Unauthorized)) {
            Some(Fault::PushNetwork) => {
                return Err(SyncError::Network("connection refused".to_string()))
            }
            Some(Fault::Unauthorized) => {
                return Err(SyncError::Auth("token expired".to_string()))
            }
            _ => {}
        }
        self.check(token)?;
        let mut tasks = self.tasks.lock().unwrap();
        for incoming in batch.tasks {
            let incoming_clock = incoming.clock()?;
            let replace = match tasks.get(&incoming.id) {
                // Ties keep the existing copy; the losing write is dropped
                // silently, not reported.
                Some(existing) => incoming_clock > existing.clock()?,
                None => true,
            };
            if replace {
                tasks.insert(incoming.id.clone(), incoming);
            }
        }
        Ok(PushResponse {
            status: "success".to_string(),
            message: "Tasks synced".to_string(),
        })
    }

    async fn pull(&self, token: &str, last_sync: &str) -> Result<PullResponse, SyncError> {
        match self.take_fault_if(|f| matches!(f, Fault::PullNetwork | Fault::Unauthorized)) {
            Some(Fault::PullNetwork) => {
                return Err(SyncError::Network("connection refused".to_string()))
            }
            Some(Fault::Unauthorized) => {
                return Err(SyncError::Auth("token expired".to_string()))
            }
            _ => {}
        }
        self.check(token)?;
        let watermark = parse_timestamp(last_sync)?;
        let tasks = self
            .tasks
            .lock()
            .unwrap()
            .values()
            // Records whose clock does not parse are passed through so the
            // client-side validation path can be exercised.
            .filter(|record| record.clock().map(|ts| ts > watermark).unwrap_or(true))
            .cloned()
            .collect();
        Ok(PullResponse {
            tasks,
            server_time: format_timestamp(*self.server_time.lock().unwrap()),
        })
    }
}

pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

/// A syntactically valid wire record with the given conflict key.
pub fn record(id: &str, title: &str, updated_at: DateTime<Utc>) -> TaskRecord {
    TaskRecord {
        id: id.to_string(),
        title: title.to_string(),
        description: Some(format!("{title} description")),
        task_type_id: 1,
        personal_priority: 5,
        influence: 5,
        status: "underway".to_string(),
        deadline: Some(format_timestamp(at(2030, 1, 1, 0, 0, 0))),
        created_at: format_timestamp(at(2024, 1, 1, 0, 0, 0)),
        updated_at: format_timestamp(updated_at),
        final_priority: "Mid".to_string(),
    }
}
