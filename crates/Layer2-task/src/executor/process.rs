//! Process executor - runs code through an external interpreter
//!
//! Inline code and function calls are staged as scratch files owned by the
//! sweeper; file requests are passed to the interpreter as-is. Output is
//! stdout followed by stderr.

use crate::executor::{CodeExecutor, CodeRequest, ExecutionOutput};
use crate::sweeper::{ScratchFile, TempSweeper};
use async_trait::async_trait;
use offload_foundation::{Error, InterpreterConfig, Result};
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::debug;

/// Executor backed by an interpreter binary (`php` by default)
pub struct ProcessExecutor {
    config: InterpreterConfig,
    sweeper: Arc<TempSweeper>,
}

impl ProcessExecutor {
    pub fn new(config: InterpreterConfig, sweeper: Arc<TempSweeper>) -> Self {
        Self { config, sweeper }
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    async fn stage(&self, contents: &str) -> Result<ScratchFile> {
        self.sweeper
            .stage(contents, &self.config.script_extension)
            .await
    }

    async fn run_script(&self, script: &Path) -> Result<ExecutionOutput> {
        debug!("Running {} {}", self.config.program, script.display());

        let output = Command::new(&self.config.program)
            .args(&self.config.args)
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                Error::executor(
                    self.name(),
                    format!("failed to start {}: {}", self.config.program, e),
                )
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(ExecutionOutput {
            output: combined,
            // None when killed by a signal
            exit_code: output.status.code().or(Some(-1)),
        })
    }
}

#[async_trait]
impl CodeExecutor for ProcessExecutor {
    async fn execute(&self, request: &CodeRequest) -> Result<ExecutionOutput> {
        match request {
            CodeRequest::Code(code) => {
                let scratch = self.stage(code).await?;
                self.run_script(scratch.path()).await
            }
            CodeRequest::FunctionCall(descriptor) => {
                let scratch = self
                    .stage(&self.config.render_function_call(descriptor))
                    .await?;
                self.run_script(scratch.path()).await
            }
            CodeRequest::File(path) => {
                if !tokio::fs::try_exists(path).await.unwrap_or(false) {
                    return Err(Error::NotFound(format!("file not found: {}", path.display())));
                }
                self.run_script(path).await
            }
        }
    }

    fn is_available(&self) -> bool {
        which::which(&self.config.program).is_ok()
    }

    fn name(&self) -> &'static str {
        "process"
    }
}
