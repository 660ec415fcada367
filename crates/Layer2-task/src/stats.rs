//! Stats reporter - serialized snapshot of registry contents

use crate::registry::StateCounts;
use offload_foundation::Result;
use serde::{Deserialize, Serialize};

/// Point-in-time counts; `pending + running + done + failed == total`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub done: usize,
    pub failed: usize,
    /// Task bodies executing right now
    pub workers: usize,
}

impl StatsSnapshot {
    pub fn new(counts: StateCounts, workers: usize) -> Self {
        Self {
            total: counts.total,
            pending: counts.pending,
            running: counts.running,
            done: counts.done,
            failed: counts.failed,
            workers,
        }
    }

    /// Pending plus running
    pub fn active(&self) -> usize {
        self.pending + self.running
    }

    pub fn is_consistent(&self) -> bool {
        self.pending + self.running + self.done + self.failed == self.total
    }

    /// Compact JSON form used at the boundary
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl std::fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Total: {}, Pending: {}, Running: {}, Done: {}, Failed: {}, Workers: {}",
            self.total, self.pending, self.running, self.done, self.failed, self.workers
        )
    }
}
