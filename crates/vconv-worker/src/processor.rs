//! Task processing: idempotency check, merge, package, bookkeeping.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, Instrument};

use vconv_media::{merge_chunks, package_dash, remove_intermediate, Transcoder};
use vconv_models::{ErrorRecord, TaskId, TaskOutcome, TaskState, VideoTask};
use vconv_store::TaskStateStore;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::TaskLogger;
use crate::metrics;

const OPERATION: &str = "video_conversion";

/// Tracks a task through its lifecycle.
#[derive(Debug)]
struct StateTracker {
    task_id: TaskId,
    state: TaskState,
}

impl StateTracker {
    fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            state: TaskState::Received,
        }
    }

    fn advance(&mut self, next: TaskState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        debug!(video_id = %self.task_id, from = %self.state, to = %next, "Task state changed");
        self.state = next;
    }
}

/// Turns one upload task into a DASH package.
///
/// [`TaskProcessor::process`] never returns an error: each failure is logged
/// and persisted as an [`ErrorRecord`] so the caller can move on to the next
/// task unconditionally.
pub struct TaskProcessor {
    config: WorkerConfig,
    store: Arc<dyn TaskStateStore>,
    transcoder: Arc<dyn Transcoder>,
}

impl TaskProcessor {
    pub fn new(
        config: WorkerConfig,
        store: Arc<dyn TaskStateStore>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        Self {
            config,
            store,
            transcoder,
        }
    }

    /// Decode a queue payload and process it.
    pub async fn process(&self, payload: &[u8]) -> TaskOutcome {
        let task = match VideoTask::decode(payload) {
            Ok(task) => task,
            Err(e) => {
                let task_id = e.task_id().unwrap_or(TaskId::UNKNOWN);
                self.record_failure(task_id, &WorkerError::Decode(e)).await;
                metrics::record_outcome(TaskOutcome::Failed);
                return TaskOutcome::Failed;
            }
        };

        self.process_task(&task).await
    }

    /// Process an already-decoded task.
    pub async fn process_task(&self, task: &VideoTask) -> TaskOutcome {
        let logger = TaskLogger::new(task.video_id, OPERATION);
        let span = logger.create_span();

        let outcome = self.run(task, &logger).instrument(span).await;
        metrics::record_outcome(outcome);
        outcome
    }

    async fn run(&self, task: &VideoTask, logger: &TaskLogger) -> TaskOutcome {
        let mut tracker = StateTracker::new(task.video_id);
        tracker.advance(TaskState::CheckingIdempotency);

        match self.store.is_processed(task.video_id).await {
            Ok(true) => {
                logger.log_warning("Video already processed");
                tracker.advance(TaskState::AlreadyDone);
                return TaskOutcome::AlreadyProcessed;
            }
            Ok(false) => {}
            Err(e) => {
                tracker.advance(TaskState::Failed);
                self.record_failure(task.video_id, &WorkerError::IdempotencyCheck(e))
                    .await;
                return TaskOutcome::Failed;
            }
        }

        logger.log_start(&task.path.display().to_string());

        match self.run_pipeline(task, logger, &mut tracker).await {
            Ok(()) => {
                tracker.advance(TaskState::Done);
                logger.log_completion("Video marked as processed");
                TaskOutcome::Completed
            }
            Err(e) => {
                tracker.advance(TaskState::Failed);
                self.record_failure(task.video_id, &e).await;
                TaskOutcome::Failed
            }
        }
    }

    async fn run_pipeline(
        &self,
        task: &VideoTask,
        logger: &TaskLogger,
        tracker: &mut StateTracker,
    ) -> WorkerResult<()> {
        let merged_file = task.merged_file();
        let dash_dir = task.dash_dir();

        tracker.advance(TaskState::Merging);
        let started = Instant::now();
        let summary = merge_chunks(task.source_dir(), &merged_file)
            .await
            .map_err(WorkerError::from_merge)?;
        metrics::record_stage("merge", started.elapsed());
        logger.log_progress(&format!(
            "Merged {} chunks ({} bytes) into {}",
            summary.chunks,
            summary.bytes,
            merged_file.display()
        ));

        tracker.advance(TaskState::Transcoding);
        let started = Instant::now();
        let manifest = package_dash(
            self.transcoder.as_ref(),
            &merged_file,
            &dash_dir,
            &self.config.ffmpeg_log_level,
        )
        .await
        .map_err(WorkerError::from_packaging)?;
        metrics::record_stage("transcode", started.elapsed());
        logger.log_progress(&format!(
            "Video converted to mpeg-dash: {}",
            manifest.display()
        ));

        tracker.advance(TaskState::Finalizing);
        if let Err(e) = remove_intermediate(&merged_file).await {
            if self.config.strict_cleanup {
                return Err(WorkerError::Cleanup(e));
            }
            logger.log_warning(&format!(
                "Package is complete but the merged file was left behind: {}",
                e
            ));
        }

        self.store
            .mark_processed(task.video_id)
            .await
            .map_err(WorkerError::MarkProcessed)?;

        Ok(())
    }

    /// Log a failure and persist it, best effort.
    async fn record_failure(&self, task_id: TaskId, err: &WorkerError) {
        let record = ErrorRecord::new(task_id, err.record_message(), err.details());

        error!(
            video_id = %task_id,
            stage = err.stage(),
            error_details = %record.to_json(),
            "processing error"
        );
        metrics::record_failure(err.stage());

        if let Err(store_err) = self.store.register_error(&record).await {
            error!(
                video_id = %task_id,
                error = %store_err,
                "failed to register error record"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_follows_happy_path() {
        let mut tracker = StateTracker::new(TaskId(1));
        for state in [
            TaskState::CheckingIdempotency,
            TaskState::Merging,
            TaskState::Transcoding,
            TaskState::Finalizing,
            TaskState::Done,
        ] {
            tracker.advance(state);
        }
        assert_eq!(tracker.state, TaskState::Done);
    }

    #[test]
    #[should_panic(expected = "illegal transition")]
    #[cfg(debug_assertions)]
    fn test_tracker_rejects_skipped_stage() {
        let mut tracker = StateTracker::new(TaskId(1));
        tracker.advance(TaskState::Transcoding);
    }
}
