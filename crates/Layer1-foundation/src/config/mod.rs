//! Config - 통합 설정 관리
//!
//! - `offload.rs` - OffloadConfig 통합 설정 (runtime, interpreter, reaper)

mod offload;

pub use offload::{
    InterpreterConfig, OffloadConfig, ReaperConfig, SimulatedWorkConfig, OFFLOAD_CONFIG_FILE,
};
