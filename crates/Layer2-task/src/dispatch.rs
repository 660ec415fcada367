//! Worker dispatch
//!
//! Each task body runs on its own tokio task. Panics are caught at this
//! boundary and recorded as a `Failed` outcome; they never reach the caller.

use crate::registry::TaskRegistry;
use crate::state::TaskOutcome;
use crate::task::TaskId;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A task body: runs once and yields the outcome to record
pub type TaskBody = BoxFuture<'static, TaskOutcome>;

/// Launches task bodies and reports their outcome into the registry
#[derive(Clone)]
pub struct Dispatcher {
    handle: Handle,
    registry: Arc<TaskRegistry>,
    active: Arc<AtomicUsize>,
}

impl Dispatcher {
    pub fn new(handle: Handle, registry: Arc<TaskRegistry>) -> Self {
        Self {
            handle,
            registry,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Spawn `body` for task `id`; never blocks the caller
    pub fn spawn(&self, id: TaskId, body: TaskBody) -> JoinHandle<()> {
        let registry = Arc::clone(&self.registry);
        let active = Arc::clone(&self.active);

        self.handle.spawn(async move {
            if let Err(e) = registry.transition_to_running(id) {
                // removed before it started; the body still runs, its result is dropped
                debug!("Task {} not started in registry: {}", id, e);
            }

            active.fetch_add(1, Ordering::SeqCst);
            let outcome = match AssertUnwindSafe(body).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    warn!("Task {} panicked: {}", id, message);
                    TaskOutcome::Failed(format!("panic: {}", message))
                }
            };
            active.fetch_sub(1, Ordering::SeqCst);

            let failed = outcome.is_failed();
            if registry.complete(id, outcome) {
                info!("Task {} {}", id, if failed { "failed" } else { "done" });
            }
        })
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Bodies currently executing
    pub fn active_workers(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TaskStatus;
    use crate::task::TaskKind;

    fn dispatcher() -> (Dispatcher, Arc<TaskRegistry>) {
        let registry = Arc::new(TaskRegistry::new());
        (
            Dispatcher::new(Handle::current(), Arc::clone(&registry)),
            registry,
        )
    }

    #[tokio::test]
    async fn test_body_outcome_recorded() {
        let (dispatcher, registry) = dispatcher();
        let id = registry.create(TaskKind::Plain);

        dispatcher
            .spawn(id, async { TaskOutcome::Done("hello".into()) }.boxed())
            .await
            .unwrap();

        assert_eq!(registry.status(id), TaskStatus::Done("hello".into()));
        assert_eq!(dispatcher.active_workers(), 0);
    }

    #[tokio::test]
    async fn test_panic_becomes_failed() {
        let (dispatcher, registry) = dispatcher();
        let id = registry.create(TaskKind::Plain);

        fn explode() -> TaskOutcome {
            panic!("worker exploded")
        }
        dispatcher.spawn(id, async { explode() }.boxed()).await.unwrap();

        match registry.status(id) {
            TaskStatus::Failed(msg) => assert_eq!(msg, "panic: worker exploded"),
            other => panic!("unexpected status {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_running_while_body_executes() {
        let (dispatcher, registry) = dispatcher();
        let id = registry.create(TaskKind::Plain);
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let handle = dispatcher.spawn(
            id,
            async move {
                let _ = release_rx.await;
                TaskOutcome::Done("released".into())
            }
            .boxed(),
        );

        while registry.status(id) == TaskStatus::Pending {
            tokio::task::yield_now().await;
        }
        assert_eq!(registry.status(id), TaskStatus::Running);
        assert_eq!(dispatcher.active_workers(), 1);

        release_tx.send(()).unwrap();
        handle.await.unwrap();
        assert!(registry.status(id).is_terminal());
    }

    #[tokio::test]
    async fn test_removed_task_completion_dropped() {
        let (dispatcher, registry) = dispatcher();
        let id = registry.create(TaskKind::Plain);
        registry.remove(id);

        dispatcher
            .spawn(id, async { TaskOutcome::Done("orphan".into()) }.boxed())
            .await
            .unwrap();

        assert_eq!(registry.status(id), TaskStatus::NotFound);
        assert!(registry.is_empty());
    }
}
