//! Worker metrics.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! binary installs a recorder.

use std::time::Duration;

use metrics::{counter, histogram};
use vconv_models::TaskOutcome;

/// Metric name constants for consistency.
pub mod names {
    /// Finished tasks by outcome.
    pub const TASKS_TOTAL: &str = "vconv_tasks_total";

    /// Failed tasks by pipeline stage.
    pub const TASK_FAILURES_TOTAL: &str = "vconv_task_failures_total";

    /// Time spent in each pipeline stage, in seconds.
    pub const STAGE_SECONDS: &str = "vconv_stage_seconds";
}

/// Record the outcome of a task.
pub fn record_outcome(outcome: TaskOutcome) {
    counter!(names::TASKS_TOTAL, "outcome" => outcome.as_str()).increment(1);
}

/// Record a failure at `stage`.
pub fn record_failure(stage: &'static str) {
    counter!(names::TASK_FAILURES_TOTAL, "stage" => stage).increment(1);
}

/// Record how long `stage` took.
pub fn record_stage(stage: &'static str, elapsed: Duration) {
    histogram!(names::STAGE_SECONDS, "stage" => stage).record(elapsed.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert!(names::TASKS_TOTAL.starts_with("vconv_"));
        assert!(names::TASK_FAILURES_TOTAL.contains("failures"));
        assert!(names::STAGE_SECONDS.ends_with("_seconds"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_outcome(TaskOutcome::Completed);
        record_failure("merge");
        record_stage("transcode", Duration::from_millis(5));
    }
}
