//! Error records written for failed tasks.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::task::TaskId;

/// One failure observed while processing a task.
///
/// Records are append-only: they are never updated or removed once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorRecord {
    /// Task the failure belongs to ([`TaskId::UNKNOWN`] if the payload did not decode)
    #[serde(rename = "video_id")]
    pub task_id: TaskId,
    /// Short description of the failed step
    #[serde(rename = "error")]
    pub message: String,
    /// Text of the underlying error
    pub details: String,
    /// When the failure was observed
    #[serde(rename = "time")]
    pub occurred_at: DateTime<Utc>,
}

impl ErrorRecord {
    pub fn new(task_id: TaskId, message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            task_id,
            message: message.into(),
            details: details.into(),
            occurred_at: Utc::now(),
        }
    }

    /// Structured form used for log lines and the `error_data` column.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "video_id": self.task_id,
            "error": self.message,
            "details": self.details,
            "time": self.occurred_at,
        })
    }
}
