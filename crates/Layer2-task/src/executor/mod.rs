//! Code executors
//!
//! - `CodeExecutor` - the capability the code execution adapter depends on
//! - `ProcessExecutor` - runs an external interpreter as a child process

pub mod process;
pub mod r#trait;

pub use process::ProcessExecutor;
pub use r#trait::{CodeExecutor, CodeRequest, ExecutionOutput};
