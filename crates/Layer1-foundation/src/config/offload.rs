//! Offload Config - 통합 설정
//!
//! Runtime sizing, default wait timeout, the interpreter used for code tasks
//! and the completed-task reaper.

use crate::storage::ConfigLayer;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// 설정 파일명
pub const OFFLOAD_CONFIG_FILE: &str = "config.json";

/// Scratch directory name under the system temp dir
const DEFAULT_SCRATCH_DIR: &str = "offload_scratch";

// ============================================================================
// Offload Config (통합)
// ============================================================================

/// offload 통합 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffloadConfig {
    /// 버전 (마이그레이션용)
    #[serde(default = "default_version")]
    pub version: u32,

    /// Fallback wait bound when the caller gives none
    #[serde(default = "default_wait_timeout_ms")]
    pub default_wait_timeout_ms: u64,

    /// Worker threads of the runtime; `None` uses one per CPU
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_threads: Option<usize>,

    /// Where staged code files are written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,

    #[serde(default)]
    pub interpreter: InterpreterConfig,

    #[serde(default)]
    pub simulated_work: SimulatedWorkConfig,

    #[serde(default)]
    pub reaper: ReaperConfig,
}

fn default_version() -> u32 {
    1
}

fn default_wait_timeout_ms() -> u64 {
    5000
}

impl Default for OffloadConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            default_wait_timeout_ms: default_wait_timeout_ms(),
            worker_threads: None,
            scratch_dir: None,
            interpreter: InterpreterConfig::default(),
            simulated_work: SimulatedWorkConfig::default(),
            reaper: ReaperConfig::default(),
        }
    }
}

impl OffloadConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// 글로벌 + 프로젝트 병합 로드
    pub fn load() -> Result<Self> {
        Self::load_layers(ConfigLayer::standard(OFFLOAD_CONFIG_FILE))
    }

    /// Load a single explicit config file, layered over defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::load_layers([ConfigLayer::file(path)])
    }

    /// Apply each present layer over the defaults, in order
    pub fn load_layers(layers: impl IntoIterator<Item = ConfigLayer>) -> Result<Self> {
        let mut config = Self::new();
        for layer in layers {
            if let Some(overlay) = layer.read::<OffloadConfig>()? {
                debug!("Applying {} config from {}", layer.scope(), layer.path().display());
                config.merge(overlay);
            }
        }
        Ok(config)
    }

    /// Overlay `other` on top of `self`; fields left at their defaults in
    /// `other` do not override.
    pub fn merge(&mut self, other: OffloadConfig) {
        if other.default_wait_timeout_ms != default_wait_timeout_ms() {
            self.default_wait_timeout_ms = other.default_wait_timeout_ms;
        }
        if other.worker_threads.is_some() {
            self.worker_threads = other.worker_threads;
        }
        if other.scratch_dir.is_some() {
            self.scratch_dir = other.scratch_dir;
        }

        self.interpreter.merge(other.interpreter);
        self.simulated_work.merge(other.simulated_work);
        self.reaper.merge(other.reaper);
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn default_wait_timeout_ms(mut self, ms: u64) -> Self {
        self.default_wait_timeout_ms = ms;
        self
    }

    pub fn worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    pub fn interpreter(mut self, interpreter: InterpreterConfig) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn simulated_work(mut self, plain_ms: u64, payload_ms: u64) -> Self {
        self.simulated_work = SimulatedWorkConfig {
            plain_ms,
            payload_ms,
        };
        self
    }

    pub fn reaper(mut self, reaper: ReaperConfig) -> Self {
        self.reaper = reaper;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn default_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.default_wait_timeout_ms)
    }

    /// Scratch directory, falling back to `<tmp>/offload_scratch`
    pub fn resolved_scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_SCRATCH_DIR))
    }
}

// ============================================================================
// Interpreter
// ============================================================================

/// External interpreter used to run code, file and function-call tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpreterConfig {
    /// Program to invoke
    #[serde(default = "default_program")]
    pub program: String,

    /// Arguments placed before the script path
    #[serde(default)]
    pub args: Vec<String>,

    /// Extension of staged scratch files
    #[serde(default = "default_script_extension")]
    pub script_extension: String,

    /// Template wrapping a function-call descriptor; `{call}` is replaced verbatim
    #[serde(default = "default_function_call_template")]
    pub function_call_template: String,
}

fn default_program() -> String {
    "php".to_string()
}

fn default_script_extension() -> String {
    "php".to_string()
}

fn default_function_call_template() -> String {
    "<?php\n{call}\n?>".to_string()
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
            script_extension: default_script_extension(),
            function_call_template: default_function_call_template(),
        }
    }
}

impl InterpreterConfig {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_script_extension(mut self, ext: impl Into<String>) -> Self {
        self.script_extension = ext.into();
        self
    }

    pub fn with_function_call_template(mut self, template: impl Into<String>) -> Self {
        self.function_call_template = template.into();
        self
    }

    /// Wrap a function-call descriptor into a runnable script
    pub fn render_function_call(&self, descriptor: &str) -> String {
        self.function_call_template.replace("{call}", descriptor)
    }

    fn merge(&mut self, other: InterpreterConfig) {
        if other.program != default_program() {
            self.program = other.program;
        }
        if !other.args.is_empty() {
            self.args = other.args;
        }
        if other.script_extension != default_script_extension() {
            self.script_extension = other.script_extension;
        }
        if other.function_call_template != default_function_call_template() {
            self.function_call_template = other.function_call_template;
        }
    }
}

// ============================================================================
// Simulated work
// ============================================================================

/// Body duration of the smoke-test task kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedWorkConfig {
    #[serde(default = "default_plain_ms")]
    pub plain_ms: u64,

    #[serde(default = "default_payload_ms")]
    pub payload_ms: u64,
}

fn default_plain_ms() -> u64 {
    100
}

fn default_payload_ms() -> u64 {
    200
}

impl Default for SimulatedWorkConfig {
    fn default() -> Self {
        Self {
            plain_ms: default_plain_ms(),
            payload_ms: default_payload_ms(),
        }
    }
}

impl SimulatedWorkConfig {
    pub fn plain(&self) -> Duration {
        Duration::from_millis(self.plain_ms)
    }

    pub fn payload(&self) -> Duration {
        Duration::from_millis(self.payload_ms)
    }

    fn merge(&mut self, other: SimulatedWorkConfig) {
        if other.plain_ms != default_plain_ms() {
            self.plain_ms = other.plain_ms;
        }
        if other.payload_ms != default_payload_ms() {
            self.payload_ms = other.payload_ms;
        }
    }
}

// ============================================================================
// Reaper
// ============================================================================

/// Periodic removal of completed tasks nobody cleaned up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReaperConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Completed tasks older than this are removed
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
}

fn default_interval_secs() -> u64 {
    60
}

fn default_max_age_secs() -> u64 {
    300
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_interval_secs(),
            max_age_secs: default_max_age_secs(),
        }
    }
}

impl ReaperConfig {
    pub fn enabled(interval: Duration, max_age: Duration) -> Self {
        Self {
            enabled: true,
            interval_secs: interval.as_secs().max(1),
            max_age_secs: max_age.as_secs(),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }

    fn merge(&mut self, other: ReaperConfig) {
        self.enabled = self.enabled || other.enabled;
        if other.interval_secs != default_interval_secs() {
            self.interval_secs = other.interval_secs;
        }
        if other.max_age_secs != default_max_age_secs() {
            self.max_age_secs = other.max_age_secs;
        }
    }
}
