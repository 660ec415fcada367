//! Temp resource sweeper
//!
//! Owns the scratch directory used to stage code for the external executor.
//! Every staged file has a unique name and stays "live" until its guard is
//! dropped; `sweep()` only deletes entries that are not live, so it is safe
//! to call while code tasks are in flight.

use offload_foundation::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};
use uuid::Uuid;

/// Scratch directory owner
#[derive(Debug)]
pub struct TempSweeper {
    dir: PathBuf,
    live: Mutex<HashSet<PathBuf>>,
}

impl TempSweeper {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            live: Mutex::new(HashSet::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            Error::Config(format!(
                "Failed to create scratch dir {}: {}",
                self.dir.display(),
                e
            ))
        })
    }

    /// Write `contents` to a uniquely named file that stays live until the
    /// returned guard is dropped. Runs on the async fs so a worker thread is
    /// not blocked while the file is written.
    pub async fn stage(self: &Arc<Self>, contents: &str, extension: &str) -> Result<ScratchFile> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            Error::Config(format!(
                "Failed to create scratch dir {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let name = if extension.is_empty() {
            Uuid::new_v4().simple().to_string()
        } else {
            format!("{}.{}", Uuid::new_v4().simple(), extension)
        };
        let path = self.dir.join(name);

        // registered before it exists, so a concurrent sweep never sees it as stale
        self.live.lock().insert(path.clone());
        let guard = ScratchFile {
            path: path.clone(),
            sweeper: Arc::downgrade(self),
        };

        tokio::fs::write(&path, contents).await?;
        debug!("Staged scratch file {}", path.display());
        Ok(guard)
    }

    /// Number of staged files still held by a task
    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }

    /// Delete every released artifact in the scratch directory
    pub fn sweep(&self) -> Result<usize> {
        let live = self.live.lock();

        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                drop(live);
                self.ensure_dir()?;
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if live.contains(&path) {
                continue;
            }

            let result = if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };

            match result {
                Ok(()) => removed += 1,
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }

        if removed > 0 {
            debug!("Swept {} scratch entries from {}", removed, self.dir.display());
        }
        Ok(removed)
    }

    fn release(&self, path: &Path) {
        self.live.lock().remove(path);
    }
}

/// A staged file; deleted and released when dropped
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    sweeper: Weak<TempSweeper>,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
        if let Some(sweeper) = self.sweeper.upgrade() {
            sweeper.release(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sweeper() -> (tempfile::TempDir, Arc<TempSweeper>) {
        let dir = tempfile::tempdir().unwrap();
        let sweeper = Arc::new(TempSweeper::new(dir.path().join("scratch")));
        (dir, sweeper)
    }

    #[tokio::test]
    async fn test_stage_unique_files() {
        let (_dir, sweeper) = sweeper();
        let a = sweeper.stage("echo 1;", "php").await.unwrap();
        let b = sweeper.stage("echo 1;", "php").await.unwrap();

        assert_ne!(a.path(), b.path());
        assert_eq!(std::fs::read_to_string(a.path()).unwrap(), "echo 1;");
        assert!(a.path().extension().is_some_and(|e| e == "php"));
        assert_eq!(sweeper.live_count(), 2);
    }

    #[tokio::test]
    async fn test_drop_releases_and_deletes() {
        let (_dir, sweeper) = sweeper();
        let file = sweeper.stage("x", "txt").await.unwrap();
        let path = file.path().to_path_buf();

        drop(file);
        assert!(!path.exists());
        assert_eq!(sweeper.live_count(), 0);
    }

    #[tokio::test]
    async fn test_sweep_keeps_live_files() {
        let (_dir, sweeper) = sweeper();
        sweeper.ensure_dir().unwrap();

        let stale = sweeper.dir().join("leftover.php");
        std::fs::write(&stale, "old").unwrap();
        std::fs::create_dir(sweeper.dir().join("leftover-dir")).unwrap();
        let live = sweeper.stage("new", "php").await.unwrap();

        let removed = sweeper.sweep().unwrap();

        assert_eq!(removed, 2);
        assert!(!stale.exists());
        assert!(live.path().exists());
    }

    #[test]
    fn test_sweep_missing_dir_recreates() {
        let (_dir, sweeper) = sweeper();
        assert_eq!(sweeper.sweep().unwrap(), 0);
        assert!(sweeper.dir().is_dir());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_stage_concurrent_on_one_thread() {
        let (_dir, sweeper) = sweeper();
        assert!(!sweeper.dir().exists());

        let staged = futures::future::try_join_all(
            (0..8).map(|i| {
                let sweeper = Arc::clone(&sweeper);
                async move { sweeper.stage(&format!("echo {};", i), "php").await }
            }),
        )
        .await
        .unwrap();

        assert!(sweeper.dir().is_dir());
        assert_eq!(sweeper.live_count(), 8);
        for (i, file) in staged.iter().enumerate() {
            assert_eq!(
                std::fs::read_to_string(file.path()).unwrap(),
                format!("echo {};", i)
            );
        }

        drop(staged);
        assert_eq!(sweeper.live_count(), 0);
    }
}
