//! Task id allocation

use crate::task::TaskId;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out strictly increasing task ids, starting at 1
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub fn next(&self) -> TaskId {
        TaskId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_never_zero_and_increasing() {
        let ids = IdAllocator::new();
        let first = ids.next();
        let second = ids.next();
        assert_eq!(first, TaskId(1));
        assert!(second > first);
    }

    #[test]
    fn test_concurrent_unique() {
        let ids = Arc::new(IdAllocator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || (0..500).map(|_| ids.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            let batch = handle.join().unwrap();
            // each caller observes its own ids in increasing order
            assert!(batch.windows(2).all(|w| w[0] < w[1]));
            for id in batch {
                assert!(seen.insert(id));
            }
        }
        assert_eq!(seen.len(), 4000);
        assert!(!seen.contains(&TaskId::INVALID));
    }
}
