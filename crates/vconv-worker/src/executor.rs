//! Task executor.

use tokio::sync::watch;
use tracing::info;

use vconv_models::TaskOutcome;

use crate::processor::TaskProcessor;

/// Counts of what happened to a batch of payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionSummary {
    pub completed: usize,
    pub already_processed: usize,
    pub failed: usize,
    /// Payloads never started because shutdown was requested
    pub not_started: usize,
}

impl ExecutionSummary {
    fn record(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Completed => self.completed += 1,
            TaskOutcome::AlreadyProcessed => self.already_processed += 1,
            TaskOutcome::Failed => self.failed += 1,
        }
    }
}

/// Runs tasks one at a time, in order.
///
/// Shutdown is only observed between tasks: a task that has started always
/// runs to its end.
pub struct TaskExecutor {
    processor: TaskProcessor,
    shutdown: watch::Receiver<bool>,
}

impl TaskExecutor {
    /// Create a new executor. Sending `true` on the paired sender stops it
    /// before the next task.
    pub fn new(processor: TaskProcessor, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            processor,
            shutdown,
        }
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Process every payload in order until done or shut down.
    pub async fn run<I, P>(&self, payloads: I) -> ExecutionSummary
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        let mut summary = ExecutionSummary::default();
        let mut payloads = payloads.into_iter();

        for payload in payloads.by_ref() {
            if self.shutdown_requested() {
                info!("Shutdown requested, not starting further tasks");
                summary.not_started += 1;
                break;
            }
            let outcome = self.processor.process(payload.as_ref()).await;
            summary.record(outcome);
        }
        summary.not_started += payloads.count();

        info!(
            completed = summary.completed,
            already_processed = summary.already_processed,
            failed = summary.failed,
            not_started = summary.not_started,
            "Task executor stopped"
        );
        summary
    }
}
