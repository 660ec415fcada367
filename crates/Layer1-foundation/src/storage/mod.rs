//! Storage module for offload
//!
//! - `json`: layered JSON config files (global, project, explicit file)

mod json;

pub use json::{ConfigLayer, LayerScope};
