//! Task state machine
//!
//! `Pending -> Running -> (Done | Failed)` is the only legal path.

use serde::{Deserialize, Serialize};

/// Possible states of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    /// Registered, body not started yet
    Pending,

    /// Body is executing
    Running,

    /// Body finished; carries its output
    Done(String),

    /// Body errored or panicked; carries a diagnostic
    Failed(String),
}

impl TaskState {
    /// Check if this is a terminal state (cannot transition further)
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Done(_) | TaskState::Failed(_))
    }

    /// Pending or running
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    pub fn is_running(&self) -> bool {
        matches!(self, TaskState::Running)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, TaskState::Pending)
    }

    /// Stored result, present only once terminal
    pub fn result(&self) -> Option<&str> {
        match self {
            TaskState::Done(output) | TaskState::Failed(output) => Some(output),
            _ => None,
        }
    }

    /// Get display name for the state
    pub fn display_name(&self) -> &'static str {
        match self {
            TaskState::Pending => "Pending",
            TaskState::Running => "Running",
            TaskState::Done(_) => "Done",
            TaskState::Failed(_) => "Failed",
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Caller-facing view of a task id, including ids the registry does not know
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    NotFound,
    Pending,
    Running,
    Done(String),
    Failed(String),
}

impl TaskStatus {
    /// Boundary status code: -1 not found, 0 in flight, 1 finished
    ///
    /// Failed tasks report 1 like the done ones; callers tell them apart
    /// through the typed status.
    pub fn code(&self) -> i32 {
        match self {
            TaskStatus::NotFound => -1,
            TaskStatus::Pending | TaskStatus::Running => 0,
            TaskStatus::Done(_) | TaskStatus::Failed(_) => 1,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done(_) | TaskStatus::Failed(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TaskStatus::Failed(_))
    }
}

impl From<&TaskState> for TaskStatus {
    fn from(state: &TaskState) -> Self {
        match state {
            TaskState::Pending => TaskStatus::Pending,
            TaskState::Running => TaskStatus::Running,
            TaskState::Done(output) => TaskStatus::Done(output.clone()),
            TaskState::Failed(error) => TaskStatus::Failed(error.clone()),
        }
    }
}

/// What a task body produced, before it is recorded in the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Done(String),
    Failed(String),
}

impl TaskOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, TaskOutcome::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!TaskState::Pending.is_terminal());
        assert!(!TaskState::Running.is_terminal());
        assert!(TaskState::Done("ok".into()).is_terminal());
        assert!(TaskState::Failed("boom".into()).is_terminal());
    }

    #[test]
    fn test_result_only_when_terminal() {
        assert_eq!(TaskState::Running.result(), None);
        assert_eq!(TaskState::Done("ok".into()).result(), Some("ok"));
        assert_eq!(TaskState::Failed("boom".into()).result(), Some("boom"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(TaskStatus::NotFound.code(), -1);
        assert_eq!(TaskStatus::Pending.code(), 0);
        assert_eq!(TaskStatus::Running.code(), 0);
        assert_eq!(TaskStatus::Done(String::new()).code(), 1);
        assert_eq!(TaskStatus::Failed("x".into()).code(), 1);
    }
}
