//! Task lifecycle.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// State of a single task inside the processor.
///
/// `Received -> CheckingIdempotency -> {AlreadyDone | Merging -> Transcoding -> Finalizing -> Done}`,
/// and any non-terminal state may move to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    #[default]
    Received,
    CheckingIdempotency,
    AlreadyDone,
    Merging,
    Transcoding,
    Finalizing,
    Done,
    Failed,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Received => "received",
            TaskState::CheckingIdempotency => "checking_idempotency",
            TaskState::AlreadyDone => "already_done",
            TaskState::Merging => "merging",
            TaskState::Transcoding => "transcoding",
            TaskState::Finalizing => "finalizing",
            TaskState::Done => "done",
            TaskState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::AlreadyDone | TaskState::Done | TaskState::Failed)
    }

    /// Whether `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == TaskState::Failed {
            return true;
        }
        matches!(
            (self, next),
            (TaskState::Received, TaskState::CheckingIdempotency)
                | (TaskState::CheckingIdempotency, TaskState::AlreadyDone)
                | (TaskState::CheckingIdempotency, TaskState::Merging)
                | (TaskState::Merging, TaskState::Transcoding)
                | (TaskState::Transcoding, TaskState::Finalizing)
                | (TaskState::Finalizing, TaskState::Done)
        )
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to a task, as reported to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskOutcome {
    /// A processed record already existed; nothing was done
    AlreadyProcessed,
    /// Merged, packaged and marked processed
    Completed,
    /// Stopped on an error; an error record was attempted
    Failed,
}

impl TaskOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskOutcome::AlreadyProcessed => "already_processed",
            TaskOutcome::Completed => "completed",
            TaskOutcome::Failed => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let path = [
            TaskState::Received,
            TaskState::CheckingIdempotency,
            TaskState::Merging,
            TaskState::Transcoding,
            TaskState::Finalizing,
            TaskState::Done,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_any_active_state_can_fail() {
        for state in [
            TaskState::Received,
            TaskState::CheckingIdempotency,
            TaskState::Merging,
            TaskState::Transcoding,
            TaskState::Finalizing,
        ] {
            assert!(state.can_transition_to(TaskState::Failed));
        }
    }

    #[test]
    fn test_terminal_states_are_final() {
        for state in [TaskState::AlreadyDone, TaskState::Done, TaskState::Failed] {
            assert!(state.is_terminal());
            assert!(!state.can_transition_to(TaskState::Failed));
            assert!(!state.can_transition_to(TaskState::Merging));
        }
    }

    #[test]
    fn test_cannot_skip_merge() {
        assert!(!TaskState::CheckingIdempotency.can_transition_to(TaskState::Transcoding));
        assert!(!TaskState::AlreadyDone.can_transition_to(TaskState::Merging));
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(TaskOutcome::AlreadyProcessed.as_str(), "already_processed");
        assert_eq!(TaskOutcome::Completed.as_str(), "completed");
        assert_eq!(TaskOutcome::Failed.as_str(), "failed");
    }
}
