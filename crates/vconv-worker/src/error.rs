//! Worker error types.

use thiserror::Error;
use vconv_media::MediaError;
use vconv_models::ModelError;
use vconv_store::StoreError;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Everything that can stop a task, by pipeline stage.
///
/// Already-processed tasks are not errors and have no variant here.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Decode failed: {0}")]
    Decode(#[source] ModelError),

    #[error("Idempotency check failed: {0}")]
    IdempotencyCheck(#[source] StoreError),

    #[error("Chunk discovery failed: {0}")]
    ChunkDiscovery(#[source] MediaError),

    #[error("Chunk merge failed: {0}")]
    ChunkIo(#[source] MediaError),

    #[error("Output directory failed: {0}")]
    OutputDir(#[source] MediaError),

    #[error("Transcode failed: {0}")]
    TranscodeExecution(#[source] MediaError),

    #[error("Cleanup failed: {0}")]
    Cleanup(#[source] MediaError),

    #[error("Mark processed failed: {0}")]
    MarkProcessed(#[source] StoreError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Classify an error raised while merging chunks.
    pub fn from_merge(err: MediaError) -> Self {
        match err {
            MediaError::ChunkDiscovery { .. } => Self::ChunkDiscovery(err),
            other => Self::ChunkIo(other),
        }
    }

    /// Classify an error raised while packaging the merged file.
    pub fn from_packaging(err: MediaError) -> Self {
        match err {
            MediaError::OutputDir { .. } => Self::OutputDir(err),
            other => Self::TranscodeExecution(other),
        }
    }

    /// Short stage name, used as a log field and metric label.
    pub fn stage(&self) -> &'static str {
        match self {
            WorkerError::Decode(_) => "decode",
            WorkerError::IdempotencyCheck(_) => "idempotency_check",
            WorkerError::ChunkDiscovery(_) => "chunk_discovery",
            WorkerError::ChunkIo(_) => "merge",
            WorkerError::OutputDir(_) => "output_dir",
            WorkerError::TranscodeExecution(_) => "transcode",
            WorkerError::Cleanup(_) => "cleanup",
            WorkerError::MarkProcessed(_) => "mark_processed",
            WorkerError::ConfigError(_) => "config",
        }
    }

    /// Operator-facing message stored in the error record.
    ///
    /// Transcoder failures carry the transcoder's combined output.
    pub fn record_message(&self) -> String {
        match self {
            WorkerError::Decode(_) => "failed to unmarshal task".to_string(),
            WorkerError::IdempotencyCheck(_) => "failed to check processed state".to_string(),
            WorkerError::ChunkDiscovery(_) => "failed to find chunks".to_string(),
            WorkerError::ChunkIo(_) => "failed to merge chunks".to_string(),
            WorkerError::OutputDir(_) => "failed to create mpeg-dash directory".to_string(),
            WorkerError::TranscodeExecution(e) => match e.process_output() {
                Some(output) => format!("failed to convert video to mpeg-dash, output: {}", output),
                None => "failed to convert video to mpeg-dash".to_string(),
            },
            WorkerError::Cleanup(_) => "failed to remove merged file".to_string(),
            WorkerError::MarkProcessed(_) => "failed to mark video as processed".to_string(),
            WorkerError::ConfigError(_) => "invalid worker configuration".to_string(),
        }
    }

    /// Text of the underlying error.
    pub fn details(&self) -> String {
        match self {
            WorkerError::Decode(e) => e.to_string(),
            WorkerError::IdempotencyCheck(e) | WorkerError::MarkProcessed(e) => e.to_string(),
            WorkerError::ChunkDiscovery(e)
            | WorkerError::ChunkIo(e)
            | WorkerError::OutputDir(e)
            | WorkerError::TranscodeExecution(e)
            | WorkerError::Cleanup(e) => e.to_string(),
            WorkerError::ConfigError(msg) => msg.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn io_err() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied")
    }

    #[test]
    fn test_merge_classification() {
        let discovery = MediaError::ChunkDiscovery {
            dir: PathBuf::from("/u/1"),
            source: io_err(),
        };
        assert!(matches!(
            WorkerError::from_merge(discovery),
            WorkerError::ChunkDiscovery(_)
        ));

        let open = MediaError::ChunkOpen {
            path: PathBuf::from("/u/1/chunk_1.chunk"),
            source: io_err(),
        };
        let err = WorkerError::from_merge(open);
        assert!(matches!(err, WorkerError::ChunkIo(_)));
        assert_eq!(err.record_message(), "failed to merge chunks");
        assert!(err.details().contains("chunk_1.chunk"));
    }

    #[test]
    fn test_packaging_classification() {
        let dir = MediaError::OutputDir {
            path: PathBuf::from("/u/1/mpeg-dash"),
            source: io_err(),
        };
        assert_eq!(WorkerError::from_packaging(dir).stage(), "output_dir");

        let timeout = MediaError::Timeout(std::time::Duration::from_secs(5));
        assert_eq!(WorkerError::from_packaging(timeout).stage(), "transcode");
    }

    #[test]
    fn test_transcode_message_embeds_output() {
        let failed = MediaError::ffmpeg_failed(
            "failed to convert video to mpeg-dash",
            "moov atom not found".to_string(),
            Some(1),
        );
        let err = WorkerError::from_packaging(failed);
        assert_eq!(
            err.record_message(),
            "failed to convert video to mpeg-dash, output: moov atom not found"
        );
    }

    #[test]
    fn test_launch_failure_message_without_output() {
        let err = WorkerError::from_packaging(MediaError::FfmpegNotFound("ffmpeg".to_string()));
        assert_eq!(err.record_message(), "failed to convert video to mpeg-dash");
        assert!(err.details().contains("not found"));
    }

    #[test]
    fn test_store_failures_keep_their_stage() {
        let check = WorkerError::IdempotencyCheck(StoreError::connection("refused"));
        assert_eq!(check.stage(), "idempotency_check");
        assert_eq!(check.record_message(), "failed to check processed state");
        assert!(check.details().contains("refused"));

        let mark = WorkerError::MarkProcessed(StoreError::injected("mark_processed"));
        assert_eq!(mark.stage(), "mark_processed");
        assert_eq!(mark.record_message(), "failed to mark video as processed");
        assert!(mark.details().contains("mark_processed"));
    }
}
