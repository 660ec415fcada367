//! Wait coordinator
//!
//! Bounded and unbounded waits on a task's completion signal. A timeout only
//! abandons the wait; the task keeps running.

use crate::registry::TaskRegistry;
use crate::task::TaskId;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// How a wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The task reached a terminal state
    Completed,

    /// The bound elapsed first
    TimedOut,

    /// Unknown id, or removed while waiting
    NotFound,
}

impl WaitOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, WaitOutcome::Completed)
    }
}

#[derive(Clone)]
pub struct WaitCoordinator {
    registry: Arc<TaskRegistry>,
}

impl WaitCoordinator {
    pub fn new(registry: Arc<TaskRegistry>) -> Self {
        Self { registry }
    }

    /// Wait for `id` to complete.
    ///
    /// `None` waits without bound; a zero bound polls once.
    pub async fn wait(&self, id: TaskId, timeout: Option<Duration>) -> WaitOutcome {
        let Some(mut rx) = self.registry.subscribe(id) else {
            return WaitOutcome::NotFound;
        };

        if *rx.borrow_and_update() {
            return WaitOutcome::Completed;
        }

        let signal = rx.wait_for(|fired| *fired);
        let result = match timeout {
            Some(bound) if bound.is_zero() => return WaitOutcome::TimedOut,
            Some(bound) => match tokio::time::timeout(bound, signal).await {
                Ok(result) => result.map(|_| ()),
                Err(_) => {
                    debug!("Wait on task {} timed out after {:?}", id, bound);
                    return WaitOutcome::TimedOut;
                }
            },
            None => signal.await.map(|_| ()),
        };

        match result {
            Ok(()) => WaitOutcome::Completed,
            // sender dropped: the entry was removed before completing
            Err(_) => WaitOutcome::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TaskOutcome;
    use crate::task::TaskKind;
    use std::time::Instant;

    fn setup() -> (Arc<TaskRegistry>, WaitCoordinator) {
        let registry = Arc::new(TaskRegistry::new());
        let waits = WaitCoordinator::new(Arc::clone(&registry));
        (registry, waits)
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let (_registry, waits) = setup();
        assert_eq!(
            waits.wait(TaskId(9), Some(Duration::from_millis(10))).await,
            WaitOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_zero_timeout_polls() {
        let (registry, waits) = setup();
        let id = registry.create(TaskKind::Plain);

        let start = Instant::now();
        assert_eq!(waits.wait(id, Some(Duration::ZERO)).await, WaitOutcome::TimedOut);
        assert!(start.elapsed() < Duration::from_millis(50));

        registry.transition_to_running(id).unwrap();
        registry.complete(id, TaskOutcome::Done("ok".into()));
        assert_eq!(waits.wait(id, Some(Duration::ZERO)).await, WaitOutcome::Completed);
    }

    #[tokio::test]
    async fn test_timeout_leaves_task_untouched() {
        let (registry, waits) = setup();
        let id = registry.create(TaskKind::Plain);
        registry.transition_to_running(id).unwrap();

        assert_eq!(
            waits.wait(id, Some(Duration::from_millis(20))).await,
            WaitOutcome::TimedOut
        );
        assert!(registry.status(id).code() == 0);
    }

    #[tokio::test]
    async fn test_completion_wakes_all_waiters() {
        let (registry, waits) = setup();
        let id = registry.create(TaskKind::Plain);
        registry.transition_to_running(id).unwrap();

        let waiters: Vec<_> = (0..5)
            .map(|_| {
                let waits = waits.clone();
                tokio::spawn(async move { waits.wait(id, None).await })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(10)).await;
        registry.complete(id, TaskOutcome::Failed("boom".into()));

        for waiter in waiters {
            assert_eq!(waiter.await.unwrap(), WaitOutcome::Completed);
        }
    }

    #[tokio::test]
    async fn test_removed_while_waiting() {
        let (registry, waits) = setup();
        let id = registry.create(TaskKind::Plain);

        let waiter = {
            let waits = waits.clone();
            tokio::spawn(async move { waits.wait(id, Some(Duration::from_secs(5))).await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        registry.remove(id);

        assert_eq!(waiter.await.unwrap(), WaitOutcome::NotFound);
    }
}
