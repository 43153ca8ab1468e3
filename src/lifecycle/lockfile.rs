//! Single-instance guard backed by `~/.pawgate/lockfile`
//!
//! Ownership is an exclusive OS lock on the open file, not the file's
//! existence. The lock dies with the process, so a crash never leaves the
//! next start blocked. The PID written inside is informational only.

use std::fs::{self, File, OpenOptions, TryLockError};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// Errors acquiring the instance lock
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("another instance is already running (pid {})", owner_label(.pid))]
    AlreadyRunning {
        /// PID recorded by the owner, if it has written one yet
        pid: Option<u32>,
    },

    #[error("lockfile {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn owner_label(pid: &Option<u32>) -> String {
    pid.map_or_else(|| "unknown".to_string(), |pid| pid.to_string())
}

/// Held for the lifetime of the process; the OS lock is released on drop
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
    file: File,
}

impl InstanceLock {
    /// Lock the file at `path`, failing if another instance holds it
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        let io_err = |source| LockError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        // No truncate: the current owner's PID must survive our open
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(io_err)?;

        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => {
                return Err(LockError::AlreadyRunning {
                    pid: read_owner(path),
                });
            }
            Err(TryLockError::Error(e)) => return Err(io_err(e)),
        }

        // Anything already in the file was left by a dead owner
        file.set_len(0).map_err(io_err)?;
        file.seek(SeekFrom::Start(0)).map_err(io_err)?;
        write!(file, "{}", std::process::id()).map_err(io_err)?;
        file.flush().map_err(io_err)?;

        info!(path = %path.display(), "instance lock acquired");
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Path of the held lockfile
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        // The file stays in place; removing it would let a waiting opener
        // lock an unlinked inode while a third process creates a new one.
        if let Err(e) = self.file.set_len(0) {
            warn!(?e, path = %self.path.display(), "failed to clear lockfile");
        }
        if let Err(e) = self.file.unlock() {
            warn!(?e, path = %self.path.display(), "failed to release lockfile");
        }
    }
}

fn read_owner(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Windows locks are mandatory, so only Unix can read a held lockfile
    #[cfg(unix)]
    #[test]
    fn test_acquire_writes_pid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".pawgate").join("lockfile");

        let lock = InstanceLock::acquire(&path).unwrap();
        assert_eq!(lock.path(), path);
        assert_eq!(read_owner(&path), Some(std::process::id()));
    }

    #[test]
    fn test_second_acquire_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lockfile");

        let _first = InstanceLock::acquire(&path).unwrap();
        let err = InstanceLock::acquire(&path).unwrap_err();

        assert!(matches!(err, LockError::AlreadyRunning { .. }));
        assert!(err.to_string().contains("already running"));
    }

    #[test]
    fn test_owner_without_pid_yet_still_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lockfile");

        // Another instance has created and locked the file but not written
        // its PID yet
        let owner = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .unwrap();
        owner.try_lock().unwrap();

        let err = InstanceLock::acquire(&path).unwrap_err();
        assert!(matches!(err, LockError::AlreadyRunning { pid: None }));
        assert!(err.to_string().contains("pid unknown"));
        assert!(path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_leftover_lockfile_is_taken_over() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lockfile");
        // Crashed owner: PID on disk but no OS lock held
        fs::write(&path, "4194305").unwrap();

        let _lock = InstanceLock::acquire(&path).unwrap();
        assert_eq!(read_owner(&path), Some(std::process::id()));
    }

    #[cfg(unix)]
    #[test]
    fn test_garbage_lockfile_is_taken_over() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lockfile");
        fs::write(&path, "not a pid at all, and longer than one").unwrap();

        let _lock = InstanceLock::acquire(&path).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            std::process::id().to_string()
        );
    }

    #[test]
    fn test_drop_releases_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lockfile");

        drop(InstanceLock::acquire(&path).unwrap());

        let _again = InstanceLock::acquire(&path).unwrap();
    }
}
