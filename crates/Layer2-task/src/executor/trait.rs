//! Executor trait

use async_trait::async_trait;
use offload_foundation::Result;
use std::path::PathBuf;

/// A request for the external executor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeRequest {
    /// Inline code text
    Code(String),

    /// Path of a script to run
    File(PathBuf),

    /// Function-call descriptor, passed through untouched
    FunctionCall(String),
}

/// Captured output of one execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutput {
    /// Output content
    pub output: String,

    /// Exit code (if applicable)
    pub exit_code: Option<i32>,
}

impl ExecutionOutput {
    /// Create a success result
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            exit_code: Some(0),
        }
    }

    /// Create a result with specific exit code
    pub fn with_exit_code(output: impl Into<String>, exit_code: i32) -> Self {
        Self {
            output: output.into(),
            exit_code: Some(exit_code),
        }
    }

    /// No exit code counts as success
    pub fn is_success(&self) -> bool {
        matches!(self.exit_code, None | Some(0))
    }
}

/// Executor trait - implement to plug in a way of running host code
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    /// Run the request and capture its output
    async fn execute(&self, request: &CodeRequest) -> Result<ExecutionOutput>;

    /// Check if the executor is available
    fn is_available(&self) -> bool;

    /// Get executor name
    fn name(&self) -> &'static str;
}
