//! Boundary - the narrow synchronous call surface for a single-threaded host
//!
//! Owns the multi-threaded runtime and the [`TaskManager`], and translates
//! between the manager's typed API and plain data: `i64` ids, `-1/0/1`
//! status codes, owned strings and booleans. No call panics on bad input.
//!
//! Methods block on the owned runtime where needed, so they must be called
//! from outside any tokio runtime (the host thread).

use crate::executor::CodeExecutor;
use crate::manager::TaskManager;
use crate::sweeper::TempSweeper;
use crate::task::TaskId;
use crate::wait::WaitOutcome;
use offload_foundation::{Error, OffloadConfig, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct Boundary {
    runtime: Runtime,
    manager: TaskManager,
    initialized: Mutex<bool>,
    reaper: Mutex<Option<JoinHandle<()>>>,
}

impl Boundary {
    /// Build the runtime and a manager backed by the configured interpreter
    pub fn new(config: OffloadConfig) -> Result<Self> {
        let runtime = build_runtime(&config)?;
        let manager = TaskManager::new(runtime.handle().clone(), config);
        Ok(Self::from_parts(runtime, manager))
    }

    /// Build with an injected executor
    pub fn with_executor(
        config: OffloadConfig,
        executor: Arc<dyn CodeExecutor>,
        sweeper: Arc<TempSweeper>,
    ) -> Result<Self> {
        let runtime = build_runtime(&config)?;
        let manager =
            TaskManager::with_executor(runtime.handle().clone(), config, executor, sweeper);
        Ok(Self::from_parts(runtime, manager))
    }

    fn from_parts(runtime: Runtime, manager: TaskManager) -> Self {
        Self {
            runtime,
            manager,
            initialized: Mutex::new(false),
            reaper: Mutex::new(None),
        }
    }

    pub fn manager(&self) -> &TaskManager {
        &self.manager
    }

    // ========== Lifecycle ==========

    /// One-time setup; later calls are no-ops
    pub fn init(&self) -> Result<()> {
        let mut initialized = self.initialized.lock();
        if *initialized {
            debug!("Boundary already initialized");
            return Ok(());
        }

        self.manager.sweeper().ensure_dir()?;

        let reaper = self.manager.config().reaper;
        if reaper.enabled {
            let handle = self
                .manager
                .start_periodic_cleanup(reaper.interval(), reaper.max_age());
            *self.reaper.lock() = Some(handle);
        }

        if !self.manager.executor_available() {
            warn!(
                "Interpreter '{}' not found; code tasks will fail",
                self.manager.config().interpreter.program
            );
        }

        *initialized = true;
        info!(
            "offload initialized (scratch dir {})",
            self.manager.sweeper().dir().display()
        );
        Ok(())
    }

    /// Stop background maintenance; safe to call repeatedly
    pub fn shutdown(&self) {
        let mut initialized = self.initialized.lock();
        if let Some(reaper) = self.reaper.lock().take() {
            reaper.abort();
            debug!("Reaper stopped");
        }
        *initialized = false;
    }

    // ========== Start ==========

    pub fn start_task(&self) -> i64 {
        to_raw(self.manager.start_task())
    }

    pub fn start_task_with_payload(&self, text: &str) -> i64 {
        to_raw(self.manager.start_task_with_payload(text))
    }

    /// Negative delays complete immediately
    pub fn start_delayed(&self, delay_ms: i64) -> i64 {
        let delay = Duration::from_millis(u64::try_from(delay_ms).unwrap_or(0));
        to_raw(self.manager.start_delayed(delay))
    }

    pub fn execute_code(&self, code: &str) -> Result<i64> {
        self.manager.execute_code(code).map(to_raw)
    }

    pub fn execute_file(&self, path: &str) -> Result<i64> {
        self.manager.execute_file(path).map(to_raw)
    }

    pub fn execute_function_call(&self, descriptor: &str) -> Result<i64> {
        self.manager.execute_function_call(descriptor).map(to_raw)
    }

    // ========== Query ==========

    /// -1 not found, 0 pending or running, 1 done or failed
    pub fn status(&self, id: i64) -> i32 {
        match TaskId::from_raw(id) {
            Some(task_id) => self.manager.status(task_id).code(),
            None => -1,
        }
    }

    /// `Ok(None)` while in flight; `Err(NotFound)` for unknown or cleaned-up ids
    pub fn get_result(&self, id: i64) -> Result<Option<String>> {
        let task_id = TaskId::from_raw(id).ok_or_else(|| Error::not_found(id))?;
        self.manager.result(task_id)
    }

    /// Block until the task completes or `timeout_ms` elapses.
    ///
    /// `None` uses the configured default; zero or negative polls once.
    pub fn wait_outcome(&self, id: i64, timeout_ms: Option<i64>) -> WaitOutcome {
        let Some(task_id) = TaskId::from_raw(id) else {
            return WaitOutcome::NotFound;
        };

        let timeout = match timeout_ms {
            None => self.manager.config().default_wait_timeout(),
            Some(ms) => Duration::from_millis(u64::try_from(ms).unwrap_or(0)),
        };

        self.runtime
            .block_on(self.manager.wait(task_id, Some(timeout)))
    }

    /// `true` once completed; timeout and not-found log distinct warnings
    pub fn wait(&self, id: i64, timeout_ms: Option<i64>) -> bool {
        match self.wait_outcome(id, timeout_ms) {
            WaitOutcome::Completed => true,
            WaitOutcome::TimedOut => {
                warn!("Timeout waiting for task {}", id);
                false
            }
            WaitOutcome::NotFound => {
                warn!("Task {} not found", id);
                false
            }
        }
    }

    /// JSON stats snapshot
    pub fn get_stats(&self) -> String {
        let stats = self.manager.stats();
        stats.to_json().unwrap_or_else(|_| stats.to_string())
    }

    // ========== Cleanup ==========

    pub fn cleanup(&self, id: i64) {
        if let Some(task_id) = TaskId::from_raw(id) {
            self.manager.cleanup(task_id);
        }
    }

    /// Sweep released scratch files; returns how many were removed
    pub fn cleanup_temp_files(&self) -> Result<usize> {
        self.manager.cleanup_temp_files()
    }
}

impl Drop for Boundary {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn build_runtime(config: &OffloadConfig) -> Result<Runtime> {
    let mut builder = Builder::new_multi_thread();
    if let Some(threads) = config.worker_threads {
        builder.worker_threads(threads.max(1));
    }
    builder
        .thread_name("offload-worker")
        .enable_all()
        .build()
        .map_err(|e| Error::Internal(format!("Failed to start runtime: {}", e)))
}

fn to_raw(id: TaskId) -> i64 {
    i64::try_from(id.as_u64()).unwrap_or(i64::MAX)
}
