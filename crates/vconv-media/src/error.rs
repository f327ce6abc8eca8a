//! Error types for media operations.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while assembling or packaging an upload.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg binary '{0}' not found in PATH")]
    FfmpegNotFound(String),

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        output: String,
        exit_code: Option<i32>,
    },

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to find chunks in {}: {source}", dir.display())]
    ChunkDiscovery {
        dir: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to create output file {}: {source}", path.display())]
    OutputCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write output file {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to open chunk {}: {source}", path.display())]
    ChunkOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write chunk {} to merged file: {source}", path.display())]
    ChunkAppend {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to create directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to remove {}: {source}", path.display())]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(message: impl Into<String>, output: String, exit_code: Option<i32>) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            output,
            exit_code,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// True for failures raised while reading or writing chunk data.
    pub fn is_chunk_io(&self) -> bool {
        matches!(
            self,
            MediaError::OutputCreate { .. }
                | MediaError::OutputWrite { .. }
                | MediaError::ChunkOpen { .. }
                | MediaError::ChunkAppend { .. }
        )
    }

    /// Combined process output, when the error came from a finished transcoder run.
    pub fn process_output(&self) -> Option<&str> {
        match self {
            MediaError::FfmpegFailed { output, .. } => Some(output),
            _ => None,
        }
    }
}
