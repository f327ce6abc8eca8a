//! Shared data models for the video converter.
//!
//! This crate provides Serde-serializable types for:
//! - Upload tasks delivered by the queue
//! - Error records persisted for failed tasks
//! - Task lifecycle states and outcomes

pub mod error;
pub mod error_record;
pub mod state;
pub mod task;

pub use error::{ModelError, ModelResult};
pub use error_record::ErrorRecord;
pub use state::{TaskOutcome, TaskState};
pub use task::{TaskId, VideoTask, DASH_DIR_NAME, MANIFEST_FILE_NAME, MERGED_FILE_NAME};
