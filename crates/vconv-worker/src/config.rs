//! Worker configuration.

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;
use vconv_media::FfmpegRunner;

use crate::error::WorkerError;

/// Payload processed when no queue is attached.
pub const DEFAULT_TASK_PAYLOAD: &str = r#"{"video_id": 1, "path": "media/uploads/1"}"#;

/// Where task state is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Postgres,
    /// Process memory only; nothing survives the run
    Memory,
}

impl FromStr for StoreBackend {
    type Err = WorkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            other => Err(WorkerError::config_error(format!(
                "unknown store backend '{}'",
                other
            ))),
        }
    }
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// FFmpeg binary name or path
    pub ffmpeg_binary: String,
    /// FFmpeg `-v` level; controls how much diagnostic output is captured
    pub ffmpeg_log_level: String,
    /// Kill the transcoder after this long (no limit when unset)
    pub transcode_timeout: Option<Duration>,
    /// Fail the task when the merged file cannot be removed after packaging
    pub strict_cleanup: bool,
    /// Task payload standing in for the queue
    pub task_payload: String,
    /// Task state backend
    pub store_backend: StoreBackend,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            ffmpeg_binary: "ffmpeg".to_string(),
            ffmpeg_log_level: "error".to_string(),
            transcode_timeout: None,
            strict_cleanup: false,
            task_payload: DEFAULT_TASK_PAYLOAD.to_string(),
            store_backend: StoreBackend::Postgres,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            ffmpeg_binary: std::env::var("VCONV_FFMPEG_BIN").unwrap_or_else(|_| "ffmpeg".to_string()),
            ffmpeg_log_level: std::env::var("VCONV_FFMPEG_LOG_LEVEL")
                .unwrap_or_else(|_| "error".to_string()),
            transcode_timeout: std::env::var("VCONV_TRANSCODE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            strict_cleanup: std::env::var("VCONV_STRICT_CLEANUP")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            task_payload: std::env::var("VCONV_TASK_PAYLOAD")
                .unwrap_or_else(|_| DEFAULT_TASK_PAYLOAD.to_string()),
            store_backend: parse_store_backend(std::env::var("VCONV_STORE").ok().as_deref()),
        }
    }

    /// Set strict cleanup.
    pub fn with_strict_cleanup(mut self, strict: bool) -> Self {
        self.strict_cleanup = strict;
        self
    }

    /// Set transcode timeout.
    pub fn with_transcode_timeout(mut self, timeout: Duration) -> Self {
        self.transcode_timeout = Some(timeout);
        self
    }

    /// FFmpeg runner configured from this config.
    pub fn ffmpeg_runner(&self) -> FfmpegRunner {
        let runner = FfmpegRunner::new().with_binary(&self.ffmpeg_binary);
        match self.transcode_timeout {
            Some(timeout) => runner.with_timeout(timeout),
            None => runner,
        }
    }
}

/// Unset means the default backend; an unknown name is logged and ignored.
fn parse_store_backend(value: Option<&str>) -> StoreBackend {
    let Some(value) = value else {
        return StoreBackend::default();
    };
    match value.parse() {
        Ok(backend) => backend,
        Err(e) => {
            let fallback = StoreBackend::default();
            warn!("Ignoring VCONV_STORE: {}; using {:?}", e, fallback);
            fallback
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
