//! # offload-task
//!
//! Concurrent task execution for a single-threaded host.
//! Tasks are started through a narrow synchronous boundary, run on a
//! multi-threaded runtime, and are polled, waited on and reclaimed by id.
//!
//! ## Features
//!
//! - Monotonic task ids and a concurrent registry (`Pending -> Running -> Done | Failed`)
//! - Panic-isolated worker dispatch
//! - Single-fire completion signal with broadcast waits and timeouts
//! - Code / file / function-call tasks through a pluggable `CodeExecutor`
//! - Scratch file sweeping and stats snapshots

pub mod adapter;
pub mod boundary;
pub mod completion;
pub mod dispatch;
pub mod executor;
pub mod id;
pub mod manager;
pub mod registry;
pub mod state;
pub mod stats;
pub mod sweeper;
pub mod task;
pub mod wait;

// Task system
pub use adapter::CodeAdapter;
pub use boundary::Boundary;
pub use completion::{Completion, CompletionReceiver};
pub use dispatch::{Dispatcher, TaskBody};
pub use executor::{CodeExecutor, CodeRequest, ExecutionOutput, ProcessExecutor};
pub use id::IdAllocator;
pub use manager::TaskManager;
pub use registry::{StateCounts, TaskRegistry};
pub use state::{TaskOutcome, TaskState, TaskStatus};
pub use stats::StatsSnapshot;
pub use sweeper::{ScratchFile, TempSweeper};
pub use task::{Task, TaskId, TaskKind};
pub use wait::{WaitCoordinator, WaitOutcome};
