//! core::ops::lock
//!
//! The per-repository command lock.
//!
//! Validation may write metadata as a side effect, so every command that
//! loads the branch graph holds this lock for its whole run. The lock file is
//! `<common_dir>/trellis/lock`, shared by all worktrees. Acquisition never
//! blocks: a second process fails immediately with
//! [`LockError::AlreadyLocked`]. The OS lock is released on drop.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

use crate::core::paths::TrellisPaths;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("repository is locked by another trellis process ({})", .0.display())]
    AlreadyLocked(PathBuf),

    #[error("failed to create lock file {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to acquire lock: {0}")]
    Acquire(#[source] io::Error),

    #[error("failed to release lock: {0}")]
    Release(#[source] io::Error),
}

/// Guard for the repository lock.
#[derive(Debug)]
pub struct RepoLock {
    path: PathBuf,
    file: Option<File>,
}

impl RepoLock {
    /// Take the lock or fail without waiting.
    pub fn acquire(paths: &TrellisPaths) -> Result<Self, LockError> {
        let dir = paths.repo_dir();
        fs::create_dir_all(&dir).map_err(|source| LockError::Create {
            path: dir.clone(),
            source,
        })?;

        let path = paths.repo_lock_path();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::Create {
                path: path.clone(),
                source,
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self {
                path,
                file: Some(file),
            }),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                Err(LockError::AlreadyLocked(path))
            }
            Err(e) => Err(LockError::Acquire(e)),
        }
    }

    /// Like [`RepoLock::acquire`], but contention yields `None`.
    pub fn try_acquire(paths: &TrellisPaths) -> Result<Option<Self>, LockError> {
        match Self::acquire(paths) {
            Ok(lock) => Ok(Some(lock)),
            Err(LockError::AlreadyLocked(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release before drop. Calling it twice is harmless.
    pub fn release(&mut self) -> Result<(), LockError> {
        match self.file.take() {
            Some(file) => file.unlock().map_err(LockError::Release),
            None => Ok(()),
        }
    }
}

impl Drop for RepoLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}
