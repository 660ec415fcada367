//! Non-interactive mode - run one code task and print its result

use offload_foundation::{Error, Result};
use offload_task::{Boundary, TaskId, TaskStatus, WaitOutcome};

/// What to run in one-shot mode
#[derive(Debug, Clone)]
pub enum OneShot {
    Code(String),
    File(String),
}

/// Start the task and wait for it.
///
/// Returns the task output. A failed task is `Error::TaskFailed` carrying the
/// diagnostic, an elapsed wait is `Error::Timeout`.
pub fn run_once(boundary: &Boundary, job: &OneShot, timeout_ms: Option<i64>) -> Result<String> {
    let id = match job {
        OneShot::Code(code) => boundary.execute_code(code)?,
        OneShot::File(path) => boundary.execute_file(path)?,
    };

    match boundary.wait_outcome(id, timeout_ms) {
        WaitOutcome::Completed => {}
        WaitOutcome::TimedOut => {
            return Err(Error::Timeout(format!("task {} still running", id)));
        }
        WaitOutcome::NotFound => return Err(Error::not_found(id)),
    }

    let failed = TaskId::from_raw(id)
        .map(|task_id| matches!(boundary.manager().status(task_id), TaskStatus::Failed(_)))
        .unwrap_or(true);
    let output = boundary.get_result(id)?.unwrap_or_default();

    if failed {
        Err(Error::TaskFailed(output))
    } else {
        Ok(output)
    }
}

/// Process exit code for a one-shot error: 2 timed out, 1 anything else
pub fn exit_code(error: &Error) -> i32 {
    match error {
        Error::Timeout(_) => 2,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use offload_foundation::OffloadConfig;
    use offload_task::{CodeExecutor, CodeRequest, ExecutionOutput, TempSweeper};
    use std::sync::Arc;

    /// `hang` never finishes, `die` exits non-zero, anything else echoes
    struct StubExecutor;

    #[async_trait]
    impl CodeExecutor for StubExecutor {
        async fn execute(&self, request: &CodeRequest) -> Result<ExecutionOutput> {
            match request {
                CodeRequest::Code(code) if code == "hang" => {
                    std::future::pending::<()>().await;
                    Ok(ExecutionOutput::success(""))
                }
                CodeRequest::Code(code) if code == "die" => {
                    Ok(ExecutionOutput::with_exit_code("Fatal error: die", 255))
                }
                CodeRequest::Code(code) => Ok(ExecutionOutput::success(code.clone())),
                CodeRequest::File(path) => Err(Error::NotFound(format!(
                    "file not found: {}",
                    path.display()
                ))),
                CodeRequest::FunctionCall(call) => Ok(ExecutionOutput::success(call.clone())),
            }
        }

        fn is_available(&self) -> bool {
            true
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    fn boundary(dir: &tempfile::TempDir) -> Boundary {
        let config = OffloadConfig::new()
            .worker_threads(2)
            .scratch_dir(dir.path().join("scratch"));
        let sweeper = Arc::new(TempSweeper::new(config.resolved_scratch_dir()));
        Boundary::with_executor(config, Arc::new(StubExecutor), sweeper).unwrap()
    }

    #[test]
    fn test_run_once_done() {
        let dir = tempfile::tempdir().unwrap();
        let boundary = boundary(&dir);

        let output = run_once(&boundary, &OneShot::Code("hello".into()), Some(2000)).unwrap();
        assert_eq!(output, "hello");
    }

    #[test]
    fn test_run_once_failed() {
        let dir = tempfile::tempdir().unwrap();
        let boundary = boundary(&dir);

        let err = run_once(&boundary, &OneShot::Code("die".into()), Some(2000)).unwrap_err();
        assert!(matches!(&err, Error::TaskFailed(msg) if msg.contains("Fatal error: die")));
        assert_eq!(exit_code(&err), 1);

        let err = run_once(&boundary, &OneShot::File("/missing.php".into()), Some(2000))
            .unwrap_err();
        assert!(matches!(&err, Error::TaskFailed(msg) if msg.contains("file not found")));
    }

    #[test]
    fn test_run_once_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let boundary = boundary(&dir);

        let err = run_once(&boundary, &OneShot::Code("hang".into()), Some(20)).unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn test_run_once_rejects_empty_code() {
        let dir = tempfile::tempdir().unwrap();
        let boundary = boundary(&dir);

        let err = run_once(&boundary, &OneShot::Code("  ".into()), None).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(exit_code(&err), 1);
    }
}
