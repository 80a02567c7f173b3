//! Advisory lock serializing runs against one target directory
//!
//! The lock is a small JSON record `{pid, created_at}` created with
//! create-new semantics. A record whose process is gone is reclaimed with a
//! warning; a live holder fails the run with
//! [`ScaffoldError::ConcurrentRunDetected`].

use crate::cleanup::Cleanup;
use crate::error::{Result, ScaffoldError};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    pub pid: u32,
    /// Seconds since the Unix epoch
    pub created_at: u64,
}

impl LockRecord {
    fn current() -> Self {
        Self {
            pid: std::process::id(),
            created_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }

    fn read(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }
}

/// Whether a process id still refers to a running process
///
/// Platforms without a probe report every holder as alive.
pub fn is_process_alive(pid: u32) -> bool {
    if pid == std::process::id() {
        return true;
    }
    #[cfg(target_os = "linux")]
    {
        Path::new("/proc").join(pid.to_string()).exists()
    }
    #[cfg(all(unix, not(target_os = "linux")))]
    {
        std::process::Command::new("kill")
            .args(["-0", &pid.to_string()])
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(true)
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// Held lock; removed on drop
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
    record: LockRecord,
    cleanup: Cleanup,
}

impl LockGuard {
    /// Acquire `name` in `target`, reclaiming a stale lock once
    pub fn acquire(target: &Path, name: &str, cleanup: &Cleanup) -> Result<Self> {
        let path = target.join(name);
        let record = LockRecord::current();

        for attempt in 0..2 {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    let body = serde_json::to_vec(&record).map_err(|e| {
                        ScaffoldError::io("Failed to encode lock record", e.into())
                    })?;
                    file.write_all(&body).map_err(|e| {
                        ScaffoldError::io(format!("Failed to write {}", path.display()), e)
                    })?;
                    cleanup.register_file(&path);
                    tracing::debug!(path = %path.display(), pid = record.pid, "lock acquired");
                    return Ok(Self {
                        path,
                        record,
                        cleanup: cleanup.clone(),
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    let existing = LockRecord::read(&path);
                    if let Some(holder) = existing {
                        if is_process_alive(holder.pid) || attempt > 0 {
                            return Err(ScaffoldError::ConcurrentRunDetected {
                                pid: holder.pid,
                                path,
                            });
                        }
                        tracing::warn!(
                            path = %path.display(),
                            pid = holder.pid,
                            "reclaiming stale lock left by a process that is no longer running"
                        );
                    } else if attempt > 0 {
                        return Err(ScaffoldError::ConcurrentRunDetected { pid: 0, path });
                    } else {
                        tracing::warn!(path = %path.display(), "reclaiming unreadable lock file");
                    }
                    if let Some(current) = reclaim_stale(&path, existing)? {
                        return Err(ScaffoldError::ConcurrentRunDetected {
                            pid: current.pid,
                            path,
                        });
                    }
                }
                Err(e) => {
                    return Err(ScaffoldError::io(
                        format!("Failed to create lock {}", path.display()),
                        e,
                    ))
                }
            }
        }

        Err(ScaffoldError::ConcurrentRunDetected { pid: 0, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self) -> LockRecord {
        self.record
    }
}

/// Move a stale lock aside, then delete it only if it is still the record
/// judged stale. Returns the newer record when another run replaced it first.
fn reclaim_stale(path: &Path, expected: Option<LockRecord>) -> Result<Option<LockRecord>> {
    let mut aside = path.as_os_str().to_owned();
    aside.push(format!(".stale-{}", std::process::id()));
    let aside = PathBuf::from(aside);

    match std::fs::rename(path, &aside) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ScaffoldError::io(
                format!("Failed to reclaim stale lock {}", path.display()),
                e,
            ))
        }
    }

    let moved = LockRecord::read(&aside);
    if moved == expected {
        if let Err(e) = std::fs::remove_file(&aside) {
            tracing::warn!(path = %aside.display(), error = %e, "failed to remove stale lock");
        }
        return Ok(None);
    }

    // Another run took the lock between our read and the rename; put it back
    if let Err(e) = std::fs::hard_link(&aside, path) {
        tracing::warn!(path = %path.display(), error = %e, "failed to restore lock");
    }
    if let Err(e) = std::fs::remove_file(&aside) {
        tracing::warn!(path = %aside.display(), error = %e, "failed to remove moved lock");
    }
    Ok(Some(moved.unwrap_or(LockRecord { pid: 0, created_at: 0 })))
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        // Only remove the file if it is still ours
        if LockRecord::read(&self.path) == Some(self.record) {
            if let Err(e) = std::fs::remove_file(&self.path) {
                if e.kind() != ErrorKind::NotFound {
                    tracing::warn!(path = %self.path.display(), error = %e, "failed to release lock");
                }
            }
        }
        self.cleanup.forget_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: &str = ".layerkit.lock";

    // Above the Linux pid_max ceiling, so never a live process
    const DEAD_PID: u32 = 999_999_999;

    #[test]
    fn test_acquire_writes_record_and_drop_releases() {
        let dir = tempfile::tempdir().unwrap();
        let cleanup = Cleanup::new();
        {
            let guard = LockGuard::acquire(dir.path(), NAME, &cleanup).unwrap();
            let on_disk = LockRecord::read(guard.path()).unwrap();
            assert_eq!(on_disk.pid, std::process::id());
            assert!(!cleanup.is_empty());
        }
        assert!(!dir.path().join(NAME).exists());
        assert!(cleanup.is_empty());
    }

    #[test]
    fn test_live_holder_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cleanup = Cleanup::new();
        let _guard = LockGuard::acquire(dir.path(), NAME, &cleanup).unwrap();

        let err = LockGuard::acquire(dir.path(), NAME, &cleanup).unwrap_err();
        match err {
            ScaffoldError::ConcurrentRunDetected { pid, .. } => assert_eq!(pid, std::process::id()),
            other => panic!("unexpected error: {other}"),
        }
        assert!(dir.path().join(NAME).exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_stale_lock_is_reclaimed() {
        let dir = tempfile::tempdir().unwrap();
        let stale = LockRecord {
            pid: DEAD_PID,
            created_at: 1,
        };
        std::fs::write(dir.path().join(NAME), serde_json::to_vec(&stale).unwrap()).unwrap();

        let cleanup = Cleanup::new();
        let guard = LockGuard::acquire(dir.path(), NAME, &cleanup).unwrap();
        assert_eq!(guard.record().pid, std::process::id());
    }

    #[test]
    fn test_unreadable_lock_is_reclaimed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(NAME), "garbage").unwrap();

        let cleanup = Cleanup::new();
        assert!(LockGuard::acquire(dir.path(), NAME, &cleanup).is_ok());
    }

    #[test]
    fn test_reclaim_keeps_lock_replaced_by_another_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(NAME);
        let stale = LockRecord {
            pid: DEAD_PID,
            created_at: 1,
        };
        let fresh = LockRecord {
            pid: std::process::id(),
            created_at: 2,
        };
        // The stale record was read, but a faster run already replaced it
        std::fs::write(&path, serde_json::to_vec(&fresh).unwrap()).unwrap();

        let current = reclaim_stale(&path, Some(stale)).unwrap();
        assert_eq!(current, Some(fresh));
        assert_eq!(LockRecord::read(&path), Some(fresh));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_reclaim_removes_matching_stale_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(NAME);
        let stale = LockRecord {
            pid: DEAD_PID,
            created_at: 1,
        };
        std::fs::write(&path, serde_json::to_vec(&stale).unwrap()).unwrap();

        assert_eq!(reclaim_stale(&path, Some(stale)).unwrap(), None);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_cleanup_run_removes_held_lock() {
        let dir = tempfile::tempdir().unwrap();
        let cleanup = Cleanup::new();
        let guard = LockGuard::acquire(dir.path(), NAME, &cleanup).unwrap();
        cleanup.run();
        assert!(!dir.path().join(NAME).exists());
        drop(guard);
    }
}
