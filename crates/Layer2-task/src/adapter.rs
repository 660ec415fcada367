//! Code execution adapter
//!
//! Turns code / file / function-call requests into task bodies that delegate
//! to the injected [`CodeExecutor`] and translate its result into a
//! [`TaskOutcome`]. No parsing of the code happens here.

use crate::dispatch::TaskBody;
use crate::executor::{CodeExecutor, CodeRequest, ExecutionOutput};
use crate::state::TaskOutcome;
use futures::FutureExt;
use offload_foundation::Result;
use std::sync::Arc;

#[derive(Clone)]
pub struct CodeAdapter {
    executor: Arc<dyn CodeExecutor>,
}

impl CodeAdapter {
    pub fn new(executor: Arc<dyn CodeExecutor>) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &Arc<dyn CodeExecutor> {
        &self.executor
    }

    /// Body that runs `request` on the executor
    pub fn body(&self, request: CodeRequest) -> TaskBody {
        let executor = Arc::clone(&self.executor);
        async move {
            let result = executor.execute(&request).await;
            translate(executor.name(), result)
        }
        .boxed()
    }
}

/// Executor result -> task outcome
fn translate(executor: &str, result: Result<ExecutionOutput>) -> TaskOutcome {
    match result {
        Ok(output) if output.is_success() => TaskOutcome::Done(output.output),
        Ok(output) => {
            let status = output
                .exit_code
                .map(|code| code.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            let captured = output.output.trim_end();
            if captured.is_empty() {
                TaskOutcome::Failed(format!("{} execution failed: exit status {}", executor, status))
            } else {
                TaskOutcome::Failed(format!(
                    "{} execution failed: exit status {}\n{}",
                    executor, status, captured
                ))
            }
        }
        Err(e) => TaskOutcome::Failed(e.to_string()),
    }
}
