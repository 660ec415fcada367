//! Task definition and types

use crate::state::TaskState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Unique identifier for a task
///
/// Ids start at 1; `0` is never issued and reads as "invalid" at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(pub u64);

impl TaskId {
    pub const INVALID: TaskId = TaskId(0);

    /// Convert a boundary integer; non-positive values are never valid ids
    pub fn from_raw(raw: i64) -> Option<Self> {
        u64::try_from(raw).ok().filter(|v| *v > 0).map(TaskId)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a task runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TaskKind {
    /// Smoke-test body with no input
    Plain,

    /// Generic payload echoed back on completion
    Payload(String),

    /// Completes after the given delay
    Delayed(Duration),

    /// Inline code handed to the external executor
    Code(String),

    /// Script file handed to the external executor
    File(PathBuf),

    /// Function-call descriptor handed to the external executor
    FunctionCall(String),
}

impl TaskKind {
    pub fn label(&self) -> &'static str {
        match self {
            TaskKind::Plain => "plain",
            TaskKind::Payload(_) => "payload",
            TaskKind::Delayed(_) => "delayed",
            TaskKind::Code(_) => "code",
            TaskKind::File(_) => "file",
            TaskKind::FunctionCall(_) => "function-call",
        }
    }

    /// Kinds that delegate to the external executor
    pub fn is_code_execution(&self) -> bool {
        matches!(
            self,
            TaskKind::Code(_) | TaskKind::File(_) | TaskKind::FunctionCall(_)
        )
    }
}

/// A tracked task record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier
    pub id: TaskId,

    /// Body selector
    pub kind: TaskKind,

    /// Current state
    pub state: TaskState,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the body started executing
    pub started_at: Option<DateTime<Utc>>,

    /// When the task reached a terminal state
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new pending task
    pub fn new(id: TaskId, kind: TaskKind) -> Self {
        Self {
            id,
            kind,
            state: TaskState::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Mark task as running
    pub fn start(&mut self) {
        self.state = TaskState::Running;
        self.started_at = Some(Utc::now());
    }

    /// Mark task as done
    pub fn complete(&mut self, output: String) {
        self.state = TaskState::Done(output);
        self.completed_at = Some(Utc::now());
    }

    /// Mark task as failed
    pub fn fail(&mut self, error: String) {
        self.state = TaskState::Failed(error);
        self.completed_at = Some(Utc::now());
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Get execution duration if task has started
    pub fn duration(&self) -> Option<Duration> {
        let start = self.started_at?;
        let end = self.completed_at.unwrap_or_else(Utc::now);
        Some((end - start).to_std().unwrap_or_default())
    }
}
