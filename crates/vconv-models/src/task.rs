//! Upload task definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{ModelError, ModelResult};

/// File name of the transient merged upload inside the task directory.
pub const MERGED_FILE_NAME: &str = "merged.mp4";

/// Directory (inside the task directory) that receives the DASH package.
pub const DASH_DIR_NAME: &str = "mpeg-dash";

/// Manifest written by the transcoder inside [`DASH_DIR_NAME`].
pub const MANIFEST_FILE_NAME: &str = "output.mpd";

/// Identifier of an upload task, assigned by the upstream producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl TaskId {
    /// Placeholder used when a payload could not be decoded.
    pub const UNKNOWN: TaskId = TaskId(0);

    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// Producer ids start at 1.
    pub fn is_valid(&self) -> bool {
        self.0 >= 1
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TaskId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A video upload waiting to be assembled and packaged.
///
/// Wire format: `{"video_id": 1, "path": "media/uploads/1"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VideoTask {
    /// Task id, unique per upload
    pub video_id: TaskId,
    /// Directory holding the uploaded chunk files
    pub path: PathBuf,
}

impl VideoTask {
    pub fn new(video_id: impl Into<TaskId>, path: impl Into<PathBuf>) -> Self {
        Self {
            video_id: video_id.into(),
            path: path.into(),
        }
    }

    /// Decode and validate a queue payload.
    pub fn decode(payload: &[u8]) -> ModelResult<Self> {
        let task: VideoTask = serde_json::from_slice(payload)?;
        task.validate()?;
        Ok(task)
    }

    /// Check the invariants the producer is expected to uphold.
    pub fn validate(&self) -> ModelResult<()> {
        if !self.video_id.is_valid() {
            return Err(ModelError::invalid_task(
                self.video_id,
                "video_id must be a positive integer",
            ));
        }
        if self.path.as_os_str().is_empty() {
            return Err(ModelError::invalid_task(self.video_id, "path must not be empty"));
        }
        Ok(())
    }

    /// Directory holding the chunks and all outputs of this task.
    pub fn source_dir(&self) -> &Path {
        &self.path
    }

    /// Path of the merged upload.
    pub fn merged_file(&self) -> PathBuf {
        self.path.join(MERGED_FILE_NAME)
    }

    /// Directory receiving the DASH manifest and segments.
    pub fn dash_dir(&self) -> PathBuf {
        self.path.join(DASH_DIR_NAME)
    }
}
