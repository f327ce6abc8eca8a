//! Structured logging for task processing.
//!
//! Provides tracing setup for the binary and a task logger that stamps
//! every event with the task id and operation.

use tracing::{info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vconv_models::TaskId;

const DEFAULT_FILTER: &str = "vconv_worker=info,vconv_media=info,vconv_store=info,sqlx=warn";

/// Initialize tracing: colored output for dev, JSON when `LOG_FORMAT=json`.
///
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Task logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct TaskLogger {
    task_id: TaskId,
    operation: String,
}

impl TaskLogger {
    /// Create a new logger for a task and operation.
    pub fn new(task_id: TaskId, operation: &str) -> Self {
        Self {
            task_id,
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            video_id = %self.task_id,
            operation = %self.operation,
            "Task started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            video_id = %self.task_id,
            operation = %self.operation,
            "{}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            video_id = %self.task_id,
            operation = %self.operation,
            "{}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            video_id = %self.task_id,
            operation = %self.operation,
            "Task completed: {}", message
        );
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span wrapping all work done for this task.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "task",
            video_id = %self.task_id,
            operation = %self.operation
        )
    }
}
