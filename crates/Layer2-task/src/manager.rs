//! Task Manager - starts, tracks and reclaims tasks
//!
//! Features:
//! - Task lifecycle management through the registry
//! - Smoke-test, delayed and code-execution task kinds
//! - Bounded waits on completion
//! - Stats snapshots and completed-task reaping

use crate::adapter::CodeAdapter;
use crate::dispatch::{Dispatcher, TaskBody};
use crate::executor::{CodeExecutor, CodeRequest, ProcessExecutor};
use crate::registry::TaskRegistry;
use crate::state::{TaskOutcome, TaskStatus};
use crate::stats::StatsSnapshot;
use crate::sweeper::TempSweeper;
use crate::task::{Task, TaskId, TaskKind};
use crate::wait::{WaitCoordinator, WaitOutcome};
use futures::FutureExt;
use offload_foundation::{Error, OffloadConfig, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Task Manager - the process-wide owner of all task state
#[derive(Clone)]
pub struct TaskManager {
    /// All tasks by ID
    registry: Arc<TaskRegistry>,

    /// Spawns task bodies
    dispatcher: Dispatcher,

    /// Completion waits
    waits: WaitCoordinator,

    /// Code / file / function-call bodies
    adapter: CodeAdapter,

    /// Scratch file owner
    sweeper: Arc<TempSweeper>,

    /// Configuration
    config: Arc<OffloadConfig>,
}

impl TaskManager {
    /// Create a manager that runs code through the configured interpreter
    pub fn new(handle: Handle, config: OffloadConfig) -> Self {
        let sweeper = Arc::new(TempSweeper::new(config.resolved_scratch_dir()));
        let executor = Arc::new(ProcessExecutor::new(
            config.interpreter.clone(),
            Arc::clone(&sweeper),
        ));
        Self::with_executor(handle, config, executor, sweeper)
    }

    /// Create with an injected executor
    pub fn with_executor(
        handle: Handle,
        config: OffloadConfig,
        executor: Arc<dyn CodeExecutor>,
        sweeper: Arc<TempSweeper>,
    ) -> Self {
        let registry = Arc::new(TaskRegistry::new());

        Self {
            dispatcher: Dispatcher::new(handle, Arc::clone(&registry)),
            waits: WaitCoordinator::new(Arc::clone(&registry)),
            adapter: CodeAdapter::new(executor),
            registry,
            sweeper,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &OffloadConfig {
        &self.config
    }

    pub fn sweeper(&self) -> &Arc<TempSweeper> {
        &self.sweeper
    }

    /// Check if the code executor can run
    pub fn executor_available(&self) -> bool {
        self.adapter.executor().is_available()
    }

    // ========== Start ==========

    /// Smoke-test task
    pub fn start_task(&self) -> TaskId {
        self.submit(TaskKind::Plain)
    }

    /// Task that echoes `payload` back once done
    pub fn start_task_with_payload(&self, payload: impl Into<String>) -> TaskId {
        self.submit(TaskKind::Payload(payload.into()))
    }

    /// Task that completes after `delay`
    pub fn start_delayed(&self, delay: Duration) -> TaskId {
        self.submit(TaskKind::Delayed(delay))
    }

    pub fn execute_code(&self, code: impl Into<String>) -> Result<TaskId> {
        let code = non_empty(code.into(), "code")?;
        Ok(self.submit(TaskKind::Code(code)))
    }

    pub fn execute_file(&self, path: impl Into<PathBuf>) -> Result<TaskId> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(Error::InvalidInput("file path must not be empty".to_string()));
        }
        Ok(self.submit(TaskKind::File(path)))
    }

    pub fn execute_function_call(&self, descriptor: impl Into<String>) -> Result<TaskId> {
        let descriptor = non_empty(descriptor.into(), "function call")?;
        Ok(self.submit(TaskKind::FunctionCall(descriptor)))
    }

    /// Register a pending task and dispatch its body
    fn submit(&self, kind: TaskKind) -> TaskId {
        let body = self.body_for(&kind);
        let label = kind.label();
        let task_id = self.registry.create(kind);

        self.dispatcher.spawn(task_id, body);
        info!("Started {} task {}", label, task_id);
        task_id
    }

    fn body_for(&self, kind: &TaskKind) -> TaskBody {
        let work = &self.config.simulated_work;
        match kind {
            TaskKind::Plain => {
                let delay = work.plain();
                async move {
                    tokio::time::sleep(delay).await;
                    TaskOutcome::Done("Task completed successfully!".to_string())
                }
                .boxed()
            }
            TaskKind::Payload(payload) => {
                let delay = work.payload();
                let payload = payload.clone();
                async move {
                    tokio::time::sleep(delay).await;
                    TaskOutcome::Done(format!("Task '{}' completed!", payload))
                }
                .boxed()
            }
            TaskKind::Delayed(delay) => {
                let delay = *delay;
                async move {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    TaskOutcome::Done(format!("Callback executed after {}ms", delay.as_millis()))
                }
                .boxed()
            }
            TaskKind::Code(code) => self.adapter.body(CodeRequest::Code(code.clone())),
            TaskKind::File(path) => self.adapter.body(CodeRequest::File(path.clone())),
            TaskKind::FunctionCall(descriptor) => self
                .adapter
                .body(CodeRequest::FunctionCall(descriptor.clone())),
        }
    }

    // ========== Query ==========

    pub fn status(&self, task_id: TaskId) -> TaskStatus {
        self.registry.status(task_id)
    }

    /// `Ok(None)` while in flight, `Err(NotFound)` for unknown ids
    pub fn result(&self, task_id: TaskId) -> Result<Option<String>> {
        self.registry.result(task_id)
    }

    /// Get a copy of the task record
    pub fn get(&self, task_id: TaskId) -> Option<Task> {
        self.registry.get(task_id)
    }

    /// Wait for a task to complete; `None` waits without bound
    pub async fn wait(&self, task_id: TaskId, timeout: Option<Duration>) -> WaitOutcome {
        self.waits.wait(task_id, timeout).await
    }

    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot::new(self.registry.snapshot(), self.dispatcher.active_workers())
    }

    pub fn active_workers(&self) -> usize {
        self.dispatcher.active_workers()
    }

    // ========== Resource Cleanup ==========

    /// Remove a task in any state; returns whether it existed
    pub fn cleanup(&self, task_id: TaskId) -> bool {
        let removed = self.registry.remove(task_id);
        debug!("Cleanup task {}: {}", task_id, removed);
        removed
    }

    /// Delete released scratch files
    pub fn cleanup_temp_files(&self) -> Result<usize> {
        self.sweeper.sweep()
    }

    /// Remove completed tasks older than `max_age`
    pub fn cleanup_completed_older_than(&self, max_age: Duration) -> usize {
        let count = self.registry.remove_completed_older_than(max_age);
        if count > 0 {
            debug!("Cleaned up {} tasks older than {:?}", count, max_age);
        }
        count
    }

    /// 주기적 정리 시작 (백그라운드 태스크)
    pub fn start_periodic_cleanup(&self, interval: Duration, max_age: Duration) -> JoinHandle<()> {
        let manager = self.clone();
        self.dispatcher.handle().spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            // first tick fires immediately
            interval_timer.tick().await;

            loop {
                interval_timer.tick().await;
                let cleaned = manager.cleanup_completed_older_than(max_age);
                if cleaned > 0 {
                    debug!("Periodic cleanup: removed {} tasks", cleaned);
                }
            }
        })
    }
}

fn non_empty(value: String, what: &str) -> Result<String> {
    if value.trim().is_empty() {
        Err(Error::InvalidInput(format!("{} must not be empty", what)))
    } else {
        Ok(value)
    }
}
