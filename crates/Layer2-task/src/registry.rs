//! Task registry - the single owner of every task record
//!
//! A short `RwLock` critical section guards metadata only; task bodies never
//! run under the lock.

use crate::completion::{Completion, CompletionReceiver};
use crate::id::IdAllocator;
use crate::state::{TaskOutcome, TaskState, TaskStatus};
use crate::task::{Task, TaskId, TaskKind};
use chrono::Utc;
use offload_foundation::{Error, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Registry slot: the record plus its completion signal
#[derive(Debug)]
struct TaskEntry {
    task: Task,
    completion: Completion,
}

/// Per-state counts taken under one read lock
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCounts {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub done: usize,
    pub failed: usize,
}

/// Concurrent id -> task map
#[derive(Debug, Default)]
pub struct TaskRegistry {
    ids: IdAllocator,
    tasks: RwLock<HashMap<TaskId, TaskEntry>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id and insert a pending record
    pub fn create(&self, kind: TaskKind) -> TaskId {
        let id = self.ids.next();
        let entry = TaskEntry {
            task: Task::new(id, kind),
            completion: Completion::new(),
        };

        self.tasks.write().insert(id, entry);
        debug!("Registered task {}", id);
        id
    }

    /// `Pending -> Running`
    pub fn transition_to_running(&self, id: TaskId) -> Result<()> {
        let mut tasks = self.tasks.write();
        let entry = tasks.get_mut(&id).ok_or_else(|| Error::not_found(id))?;

        if !entry.task.state.is_pending() {
            return Err(Error::Internal(format!(
                "task {} cannot start from state {}",
                id, entry.task.state
            )));
        }

        entry.task.start();
        debug!("Task {} running", id);
        Ok(())
    }

    /// Record a terminal outcome and fire the completion signal.
    ///
    /// Only `Running -> Done | Failed` is accepted. Returns `false` when the
    /// write was dropped: the task was already removed, it never started,
    /// or it had already completed (first write wins).
    pub fn complete(&self, id: TaskId, outcome: TaskOutcome) -> bool {
        let mut tasks = self.tasks.write();
        let Some(entry) = tasks.get_mut(&id) else {
            debug!("Dropping completion for removed task {}", id);
            return false;
        };

        if entry.task.state.is_terminal() {
            warn!("Task {} completed twice; keeping the first result", id);
            return false;
        }

        if !entry.task.state.is_running() {
            warn!(
                "Task {} cannot complete from state {}",
                id, entry.task.state
            );
            return false;
        }

        if !entry.completion.fire() {
            warn!("Task {} completion signal already fired", id);
            return false;
        }

        match outcome {
            TaskOutcome::Done(output) => entry.task.complete(output),
            TaskOutcome::Failed(error) => entry.task.fail(error),
        }
        debug!("Task {} -> {}", id, entry.task.state);
        true
    }

    pub fn status(&self, id: TaskId) -> TaskStatus {
        self.tasks
            .read()
            .get(&id)
            .map(|entry| TaskStatus::from(&entry.task.state))
            .unwrap_or(TaskStatus::NotFound)
    }

    /// Stored result: `Ok(None)` while in flight, `Err(NotFound)` for unknown ids
    pub fn result(&self, id: TaskId) -> Result<Option<String>> {
        let tasks = self.tasks.read();
        let entry = tasks.get(&id).ok_or_else(|| Error::not_found(id))?;
        Ok(entry.task.state.result().map(str::to_string))
    }

    /// Copy of the record
    pub fn get(&self, id: TaskId) -> Option<Task> {
        self.tasks.read().get(&id).map(|entry| entry.task.clone())
    }

    /// Receiver for the task's completion signal
    pub fn subscribe(&self, id: TaskId) -> Option<CompletionReceiver> {
        self.tasks
            .read()
            .get(&id)
            .map(|entry| entry.completion.subscribe())
    }

    /// Delete a record in any state. A later completion write for it becomes
    /// a no-op, and waiters still holding its signal see it closed.
    pub fn remove(&self, id: TaskId) -> bool {
        match self.tasks.write().remove(&id) {
            Some(entry) => {
                if entry.task.is_active() {
                    warn!("Removed task {} while still {}", id, entry.task.state);
                }
                true
            }
            None => false,
        }
    }

    /// Remove terminal tasks that completed more than `max_age` ago
    pub fn remove_completed_older_than(&self, max_age: Duration) -> usize {
        let cutoff = Utc::now() - chrono::Duration::from_std(max_age).unwrap_or_default();
        let mut tasks = self.tasks.write();
        let before = tasks.len();

        tasks.retain(|_, entry| {
            !(entry.task.state.is_terminal()
                && entry.task.completed_at.map(|t| t < cutoff).unwrap_or(false))
        });

        before - tasks.len()
    }

    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Per-state counts from a single critical section
    pub fn snapshot(&self) -> StateCounts {
        let tasks = self.tasks.read();
        let mut counts = StateCounts {
            total: tasks.len(),
            ..StateCounts::default()
        };

        for entry in tasks.values() {
            match entry.task.state {
                TaskState::Pending => counts.pending += 1,
                TaskState::Running => counts.running += 1,
                TaskState::Done(_) => counts.done += 1,
                TaskState::Failed(_) => counts.failed += 1,
            }
        }

        counts
    }
}
