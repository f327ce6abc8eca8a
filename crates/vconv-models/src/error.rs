//! Model error types.

use thiserror::Error;

use crate::task::TaskId;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Malformed task payload: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload parsed, so the id it carried is known.
    #[error("Invalid task {video_id}: {reason}")]
    InvalidTask { video_id: TaskId, reason: String },
}

impl ModelError {
    pub fn invalid_task(video_id: TaskId, reason: impl Into<String>) -> Self {
        Self::InvalidTask {
            video_id,
            reason: reason.into(),
        }
    }

    /// Id of the offending task, if the payload got far enough to carry one.
    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            ModelError::Json(_) => None,
            ModelError::InvalidTask { video_id, .. } => Some(*video_id),
        }
    }
}
