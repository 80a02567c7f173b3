//! Registry of filesystem state a run must remove before exiting
//!
//! Temporary clone directories and the lock file are registered here when
//! they are created. [`Cleanup::run`] removes whatever is still registered and
//! may be called any number of times, from normal shutdown or from a signal
//! handler.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Registered {
    dirs: Vec<PathBuf>,
    files: Vec<PathBuf>,
}

/// Shared handle to the cleanup registry
#[derive(Debug, Clone, Default)]
pub struct Cleanup {
    inner: Arc<Mutex<Registered>>,
}

impl Cleanup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_dir(&self, path: &Path) {
        if let Ok(mut reg) = self.inner.lock() {
            reg.dirs.push(path.to_path_buf());
        }
    }

    pub fn register_file(&self, path: &Path) {
        if let Ok(mut reg) = self.inner.lock() {
            reg.files.push(path.to_path_buf());
        }
    }

    /// Forget a file whose owner already removed it
    pub fn forget_file(&self, path: &Path) {
        if let Ok(mut reg) = self.inner.lock() {
            reg.files.retain(|p| p != path);
        }
    }

    /// Forget a directory whose owner already removed it
    pub fn forget_dir(&self, path: &Path) {
        if let Ok(mut reg) = self.inner.lock() {
            reg.dirs.retain(|p| p != path);
        }
    }

    /// Remove everything still registered; failures are logged, never raised
    pub fn run(&self) {
        let (files, dirs) = match self.inner.lock() {
            Ok(mut reg) => (
                std::mem::take(&mut reg.files),
                std::mem::take(&mut reg.dirs),
            ),
            Err(_) => return,
        };

        for file in files {
            if let Err(e) = std::fs::remove_file(&file) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %file.display(), error = %e, "failed to remove file");
                }
            }
        }
        for dir in dirs {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %dir.display(), error = %e, "failed to remove directory");
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner
            .lock()
            .map(|reg| reg.dirs.is_empty() && reg.files.is_empty())
            .unwrap_or(true)
    }
}
