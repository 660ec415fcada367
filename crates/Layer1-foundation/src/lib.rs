//! # offload-foundation
//!
//! Foundation layer for offload:
//! - Error: 공통 에러 타입 (`Error`, `Result`)
//! - Config: 통합 설정 (`OffloadConfig`, interpreter, reaper)
//! - Storage: ConfigLayer (global / project / file 설정 레이어)

pub mod config;
pub mod error;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{
    InterpreterConfig, OffloadConfig, ReaperConfig, SimulatedWorkConfig, OFFLOAD_CONFIG_FILE,
};

// ============================================================================
// Storage
// ============================================================================
pub use storage::{ConfigLayer, LayerScope};
