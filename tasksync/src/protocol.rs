//! Wire types for the push/pull protocol.
//!
//! Timestamps travel as ISO-8601 strings and are canonicalized to UTC here,
//! at the (de)serialization boundary — never at comparison time. Remote
//! values may arrive `Z`-suffixed, offset-suffixed, or naive; naive values
//! are taken to be UTC.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::task;
use crate::entity::{Priority, TaskStatus};
use crate::error::SyncError;

/// Watermark for a device that has never pulled. Far enough in the past
/// that the first pull returns the full remote history.
pub const DEFAULT_WATERMARK: &str = "2000-01-01T00:00:00Z";

/// One task's full field set as it travels over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub task_type_id: i32,
    pub personal_priority: i32,
    pub influence: i32,
    pub status: String,
    pub deadline: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub final_priority: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushRequest {
    pub tasks: Vec<TaskRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullResponse {
    pub tasks: Vec<TaskRecord>,
    /// The remote's current wall clock, `Z`-suffixed UTC. Becomes the
    /// caller's new watermark verbatim.
    pub server_time: String,
}

/// Parse an ISO-8601 timestamp into the canonical UTC representation.
///
/// Accepts an explicit offset (`+00:00`, `Z`) or a naive value; naive
/// values are interpreted as UTC. A space date/time separator is tolerated.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, SyncError> {
    let normalized = raw.trim().replacen(' ', "T", 1);
    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| SyncError::Validation(format!("unparseable timestamp: {raw:?}")))
}

/// Format a canonical UTC timestamp for the wire (`Z`-suffixed).
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl TaskRecord {
    /// Serialize a local record's full field set for push.
    pub fn from_model(model: &task::Model) -> Self {
        TaskRecord {
            id: model.id.clone(),
            title: model.title.clone(),
            description: Some(model.description.clone()),
            task_type_id: model.task_type_id,
            personal_priority: model.personal_priority,
            influence: model.influence,
            status: model.status.as_str().to_string(),
            deadline: model.deadline.map(format_timestamp),
            created_at: format_timestamp(model.created_at),
            updated_at: format_timestamp(model.updated_at),
            final_priority: model.final_priority.as_str().to_string(),
        }
    }

    /// The record's conflict-resolution key, canonicalized.
    pub fn clock(&self) -> Result<DateTime<Utc>, SyncError> {
        parse_timestamp(&self.updated_at)
    }

    /// Validate and convert into a storable model.
    pub fn to_model(&self) -> Result<task::Model, SyncError> {
        let status = TaskStatus::parse(&self.status).ok_or_else(|| {
            SyncError::Validation(format!("task {}: unknown status {:?}", self.id, self.status))
        })?;
        let final_priority = Priority::parse(&self.final_priority).ok_or_else(|| {
            SyncError::Validation(format!(
                "task {}: unknown final_priority {:?}",
                self.id, self.final_priority
            ))
        })?;
        let deadline = match &self.deadline {
            Some(raw) => Some(parse_timestamp(raw)?),
            None => None,
        };
        Ok(task::Model {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone().unwrap_or_default(),
            task_type_id: self.task_type_id,
            personal_priority: self.personal_priority,
            influence: self.influence,
            created_at: parse_timestamp(&self.created_at)?,
            deadline,
            final_priority,
            status,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_zulu_and_offset_agree() {
        let zulu = parse_timestamp("2024-03-01T12:00:00Z").unwrap();
        let offset = parse_timestamp("2024-03-01T14:00:00+02:00").unwrap();
        assert_eq!(zulu, offset);
    }

    #[test]
    fn test_parse_naive_is_utc() {
        let naive = parse_timestamp("2024-03-01T12:00:00").unwrap();
        let zulu = parse_timestamp("2024-03-01T12:00:00Z").unwrap();
        assert_eq!(naive, zulu);
    }

    #[test]
    fn test_parse_space_separator_and_subseconds() {
        let spaced = parse_timestamp("2024-03-01 12:00:00.250000").unwrap();
        let canonical = parse_timestamp("2024-03-01T12:00:00.250Z").unwrap();
        assert_eq!(spaced, canonical);
    }

    #[test]
    fn test_parse_garbage_is_validation_error() {
        let err = parse_timestamp("next tuesday").unwrap_err();
        assert!(matches!(err, SyncError::Validation(_)));
    }

    #[test]
    fn test_format_round_trips() {
        let ts = parse_timestamp("2024-03-01T12:00:00.123456Z").unwrap();
        assert_eq!(parse_timestamp(&format_timestamp(ts)).unwrap(), ts);
    }

    #[test]
    fn test_default_watermark_parses() {
        let ts = parse_timestamp(DEFAULT_WATERMARK).unwrap();
        assert_eq!(format_timestamp(ts), "2000-01-01T00:00:00.000000Z");
    }

    #[test]
    fn test_to_model_rejects_unknown_status() {
        let mut record = sample_record();
        record.status = "paused".into();
        assert!(matches!(
            record.to_model(),
            Err(SyncError::Validation(_))
        ));
    }

    #[test]
    fn test_to_model_defaults_missing_description() {
        let mut record = sample_record();
        record.description = None;
        assert_eq!(record.to_model().unwrap().description, "");
    }

    fn sample_record() -> TaskRecord {
        TaskRecord {
            id: "11111111-2222-3333-4444-555555555555".into(),
            title: "Fix login bug".into(),
            description: Some("patch the auth flow".into()),
            task_type_id: 6,
            personal_priority: 5,
            influence: 4,
            status: "underway".into(),
            deadline: Some("2024-04-01T00:00:00Z".into()),
            created_at: "2024-03-01T09:00:00Z".into(),
            updated_at: "2024-03-01T09:00:00Z".into(),
            final_priority: "High".into(),
        }
    }
}
