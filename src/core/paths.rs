//! core::paths
//!
//! Where trellis keeps its per-repository files.
//!
//! Everything lives under `<common_dir>/trellis/`, the git directory shared
//! by all worktrees, so the lock and the config are the same no matter which
//! worktree a command runs in:
//!
//! - `config.toml` - repository configuration
//! - `lock` - exclusive lock held for the duration of a command
//!
//! ```
//! use trellis::core::paths::TrellisPaths;
//! use std::path::PathBuf;
//!
//! let paths = TrellisPaths::new(
//!     PathBuf::from("/repo/.git/worktrees/wt"),
//!     PathBuf::from("/repo/.git"),
//! );
//! assert_eq!(paths.repo_config_path(), PathBuf::from("/repo/.git/trellis/config.toml"));
//! assert!(paths.is_worktree());
//! ```

use std::path::PathBuf;

use crate::git::RepoInfo;

/// Storage locations for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrellisPaths {
    /// Per-worktree git directory.
    pub git_dir: PathBuf,
    /// Shared git directory.
    pub common_dir: PathBuf,
}

impl TrellisPaths {
    pub fn new(git_dir: PathBuf, common_dir: PathBuf) -> Self {
        Self {
            git_dir,
            common_dir,
        }
    }

    pub fn from_repo_info(info: &RepoInfo) -> Self {
        Self::new(info.git_dir.clone(), info.common_dir.clone())
    }

    /// `<common_dir>/trellis`
    pub fn repo_dir(&self) -> PathBuf {
        self.common_dir.join("trellis")
    }

    pub fn repo_config_path(&self) -> PathBuf {
        self.repo_dir().join("config.toml")
    }

    pub fn repo_lock_path(&self) -> PathBuf {
        self.repo_dir().join("lock")
    }

    pub fn is_worktree(&self) -> bool {
        self.git_dir != self.common_dir
    }
}
