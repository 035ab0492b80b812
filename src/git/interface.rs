//! git::interface
//!
//! `Git`, the git2-backed repository handle.
//!
//! Everything trellis needs from a repository goes through here: branch
//! enumeration, metadata refs and their blobs, ancestry queries, and the
//! in-progress-operation state. Ref mutations are compare-and-swap against
//! the value last read.
//!
//! ```ignore
//! use trellis::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! for (branch, tip) in git.branch_tips()? {
//!     println!("{branch} {}", tip.short(7));
//! }
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::ancestry::AncestryOracle;
use crate::core::types::{BranchName, Oid, RefName, TypeError, BRANCH_REF_PREFIX, METADATA_REF_PREFIX};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("not a git repository: {path}")]
    NotARepo { path: PathBuf },

    #[error("bare repository not supported")]
    BareRepo,

    #[error("ref not found: {refname}")]
    RefNotFound { refname: String },

    /// The ref moved between read and write.
    #[error("CAS failed for {refname}: expected {expected}, found {actual}")]
    CasFailed {
        refname: String,
        expected: String,
        actual: String,
    },

    #[error("object not found: {oid}")]
    ObjectNotFound { oid: String },

    #[error("invalid object id: {oid}")]
    InvalidOid { oid: String },

    #[error("invalid ref name: {message}")]
    InvalidRefName { message: String },

    #[error("blob is not valid UTF-8: {oid}")]
    InvalidUtf8 { oid: String },

    #[error("object is not a blob: {oid}")]
    NotABlob { oid: String },

    #[error("repository access error: {message}")]
    AccessError { message: String },

    #[error("git error: {message}")]
    Internal { message: String },
}

impl GitError {
    /// Categorize a git2 error, using `context` (a ref or an oid) to tell
    /// missing refs from missing objects.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound if context.starts_with("refs/") || context == "HEAD" => {
                GitError::RefNotFound {
                    refname: context.to_string(),
                }
            }
            git2::ErrorCode::NotFound => GitError::ObjectNotFound {
                oid: context.to_string(),
            },
            git2::ErrorCode::InvalidSpec => GitError::InvalidRefName {
                message: format!("{context}: {}", err.message()),
            },
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("{context} is locked: {}", err.message()),
            },
            _ => GitError::Internal {
                message: format!("{context}: {}", err.message()),
            },
        }
    }

    fn internal(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid { oid, .. } => GitError::InvalidOid { oid },
            other => GitError::InvalidRefName {
                message: other.to_string(),
            },
        }
    }
}

/// Locations of a repository on disk.
#[derive(Debug, Clone)]
pub struct RepoInfo {
    /// Per-worktree git directory.
    pub git_dir: PathBuf,
    /// Directory shared by all worktrees.
    pub common_dir: PathBuf,
    pub work_dir: PathBuf,
}

/// Operation in progress in the repository, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitState {
    Clean,
    Rebase,
    Merge,
    CherryPick,
    Revert,
    Bisect,
    ApplyMailbox,
}

impl GitState {
    pub fn is_in_progress(&self) -> bool {
        !matches!(self, GitState::Clean)
    }
}

impl std::fmt::Display for GitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            GitState::Clean => "clean",
            GitState::Rebase => "rebase",
            GitState::Merge => "merge",
            GitState::CherryPick => "cherry-pick",
            GitState::Revert => "revert",
            GitState::Bisect => "bisect",
            GitState::ApplyMailbox => "apply-mailbox",
        })
    }
}

/// A ref and the object it points at.
#[derive(Debug, Clone)]
pub struct RefEntry {
    pub name: RefName,
    pub oid: Oid,
}

/// Repository handle.
pub struct Git {
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

fn raw_oid(oid: &Oid) -> Result<git2::Oid, GitError> {
    git2::Oid::from_str(oid.as_str()).map_err(|_| GitError::InvalidOid {
        oid: oid.to_string(),
    })
}

fn typed_oid(oid: git2::Oid) -> Result<Oid, GitError> {
    Ok(Oid::new(oid.to_string())?)
}

impl Git {
    // =========================================================================
    // Opening
    // =========================================================================

    /// Open the repository containing `path`.
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;
        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }
        Ok(Self { repo })
    }

    pub fn info(&self) -> Result<RepoInfo, GitError> {
        Ok(RepoInfo {
            git_dir: self.repo.path().to_path_buf(),
            common_dir: self.repo.commondir().to_path_buf(),
            work_dir: self.repo.workdir().ok_or(GitError::BareRepo)?.to_path_buf(),
        })
    }

    // =========================================================================
    // State
    // =========================================================================

    pub fn state(&self) -> GitState {
        use git2::RepositoryState as S;
        match self.repo.state() {
            S::Clean => GitState::Clean,
            S::Rebase | S::RebaseInteractive | S::RebaseMerge => GitState::Rebase,
            S::Merge => GitState::Merge,
            S::CherryPick | S::CherryPickSequence => GitState::CherryPick,
            S::Revert | S::RevertSequence => GitState::Revert,
            S::Bisect => GitState::Bisect,
            S::ApplyMailbox | S::ApplyMailboxOrRebase => GitState::ApplyMailbox,
        }
    }

    /// The branch being rebased, if a rebase is stopped mid-way.
    ///
    /// Read from `head-name` in `rebase-merge/` or `rebase-apply/`. A rebase
    /// of a detached HEAD yields `None`.
    pub fn rebase_head_branch(&self) -> Option<BranchName> {
        let git_dir = self.repo.path();
        ["rebase-merge", "rebase-apply"]
            .iter()
            .map(|dir| git_dir.join(dir).join("head-name"))
            .find_map(|path| std::fs::read_to_string(path).ok())
            .and_then(|raw| {
                raw.trim()
                    .strip_prefix(BRANCH_REF_PREFIX)
                    .and_then(|name| BranchName::new(name).ok())
            })
    }

    /// The checked-out branch; `None` when detached or unborn.
    pub fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(e)
                if e.code() == git2::ErrorCode::UnbornBranch
                    || e.code() == git2::ErrorCode::NotFound =>
            {
                return Ok(None)
            }
            Err(e) => return Err(GitError::from_git2(e, "HEAD")),
        };
        if !head.is_branch() {
            return Ok(None);
        }
        Ok(head.shorthand().and_then(|name| BranchName::new(name).ok()))
    }

    // =========================================================================
    // Refs
    // =========================================================================

    /// Resolve a ref to the commit it (eventually) points at.
    pub fn resolve_ref(&self, refname: &str) -> Result<Oid, GitError> {
        let reference = self
            .repo
            .find_reference(refname)
            .map_err(|e| GitError::from_git2(e, refname))?;
        let commit = reference
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, refname))?;
        typed_oid(commit.id())
    }

    pub fn try_resolve_ref(&self, refname: &str) -> Result<Option<Oid>, GitError> {
        match self.resolve_ref(refname) {
            Ok(oid) => Ok(Some(oid)),
            Err(GitError::RefNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Resolve a ref to its direct target without peeling.
    ///
    /// Metadata refs point at blobs, so peeling to a commit would fail.
    pub fn try_resolve_ref_to_object(&self, refname: &str) -> Result<Option<Oid>, GitError> {
        match self.repo.find_reference(refname) {
            Ok(reference) => {
                let reference = reference
                    .resolve()
                    .map_err(|e| GitError::from_git2(e, refname))?;
                let target = reference.target().ok_or_else(|| GitError::Internal {
                    message: format!("ref {refname} has no target"),
                })?;
                Ok(Some(typed_oid(target)?))
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::from_git2(e, refname)),
        }
    }

    /// All refs under `prefix` with their direct targets.
    ///
    /// Refs whose names are not valid UTF-8 or not valid refnames are skipped.
    pub fn list_refs_by_prefix(&self, prefix: &str) -> Result<Vec<RefEntry>, GitError> {
        let refs = self
            .repo
            .references_glob(&format!("{prefix}*"))
            .map_err(GitError::internal)?;

        let mut entries = Vec::new();
        for reference in refs {
            let reference = reference.map_err(GitError::internal)?;
            let Some(name) = reference.name().and_then(|n| RefName::new(n).ok()) else {
                continue;
            };
            let Some(target) = reference.resolve().ok().and_then(|r| r.target()) else {
                continue;
            };
            entries.push(RefEntry {
                name,
                oid: typed_oid(target)?,
            });
        }
        Ok(entries)
    }

    /// Every local branch with its tip commit, sorted by name.
    pub fn branch_tips(&self) -> Result<Vec<(BranchName, Oid)>, GitError> {
        let branches = self
            .repo
            .branches(Some(git2::BranchType::Local))
            .map_err(GitError::internal)?;

        let mut tips = Vec::new();
        for branch in branches {
            let (branch, _) = branch.map_err(GitError::internal)?;
            let Some(name) = branch
                .name()
                .ok()
                .flatten()
                .and_then(|n| BranchName::new(n).ok())
            else {
                continue;
            };
            let commit = branch
                .get()
                .peel_to_commit()
                .map_err(|e| GitError::from_git2(e, RefName::for_branch(&name).as_str()))?;
            tips.push((name, typed_oid(commit.id())?));
        }
        tips.sort();
        Ok(tips)
    }

    /// Metadata refs as `(branch, blob oid)` pairs.
    pub fn list_metadata_refs(&self) -> Result<Vec<(BranchName, Oid)>, GitError> {
        Ok(self
            .list_refs_by_prefix(METADATA_REF_PREFIX)?
            .into_iter()
            .filter_map(|entry| entry.name.metadata_branch().map(|b| (b, entry.oid)))
            .collect())
    }

    fn current_target(&self, refname: &str) -> Result<Option<String>, GitError> {
        Ok(self
            .try_resolve_ref_to_object(refname)?
            .map(String::from))
    }

    /// Point `refname` at `new_oid` if it currently points at `expected_old`
    /// (`None`: the ref must not exist).
    pub fn update_ref_cas(
        &self,
        refname: &str,
        new_oid: &Oid,
        expected_old: Option<&Oid>,
        message: &str,
    ) -> Result<(), GitError> {
        let actual = self.current_target(refname)?;
        let expected = expected_old.map(Oid::as_str);
        if actual.as_deref() != expected {
            return Err(GitError::CasFailed {
                refname: refname.to_string(),
                expected: expected.unwrap_or("<none>").to_string(),
                actual: actual.unwrap_or_else(|| "<none>".to_string()),
            });
        }

        self.repo
            .reference(refname, raw_oid(new_oid)?, true, message)
            .map_err(|e| GitError::from_git2(e, refname))?;
        Ok(())
    }

    /// Delete `refname` if it currently points at `expected_old`.
    pub fn delete_ref_cas(&self, refname: &str, expected_old: &Oid) -> Result<(), GitError> {
        match self.current_target(refname)? {
            None => {
                return Err(GitError::RefNotFound {
                    refname: refname.to_string(),
                })
            }
            Some(actual) if actual != expected_old.as_str() => {
                return Err(GitError::CasFailed {
                    refname: refname.to_string(),
                    expected: expected_old.to_string(),
                    actual,
                })
            }
            Some(_) => {}
        }

        self.repo
            .find_reference(refname)
            .and_then(|mut reference| reference.delete())
            .map_err(|e| GitError::from_git2(e, refname))
    }

    // =========================================================================
    // Ancestry
    // =========================================================================

    pub fn merge_base(&self, a: &Oid, b: &Oid) -> Result<Option<Oid>, GitError> {
        match self.repo.merge_base(raw_oid(a)?, raw_oid(b)?) {
            Ok(oid) => Ok(Some(typed_oid(oid)?)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::internal(e)),
        }
    }

    /// Whether `ancestor` is reachable from `descendant` (or equal to it).
    ///
    /// A candidate ancestor missing from the object database (a rewritten
    /// commit that was garbage-collected) is not an ancestor. A missing
    /// descendant is an error.
    pub fn is_ancestor(&self, ancestor: &Oid, descendant: &Oid) -> Result<bool, GitError> {
        if ancestor == descendant {
            return Ok(true);
        }
        let ancestor_raw = raw_oid(ancestor)?;
        let descendant_raw = raw_oid(descendant)?;

        self.repo
            .find_commit(descendant_raw)
            .map_err(|e| GitError::from_git2(e, descendant.as_str()))?;
        if self.repo.find_commit(ancestor_raw).is_err() {
            return Ok(false);
        }

        self.repo
            .graph_descendant_of(descendant_raw, ancestor_raw)
            .map_err(GitError::internal)
    }

    // =========================================================================
    // Blobs
    // =========================================================================

    pub fn write_blob(&self, content: &[u8]) -> Result<Oid, GitError> {
        typed_oid(self.repo.blob(content).map_err(GitError::internal)?)
    }

    pub fn read_blob_as_string(&self, oid: &Oid) -> Result<String, GitError> {
        let blob = self
            .repo
            .find_object(raw_oid(oid)?, None)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?
            .into_blob()
            .map_err(|_| GitError::NotABlob {
                oid: oid.to_string(),
            })?;
        String::from_utf8(blob.content().to_vec()).map_err(|_| GitError::InvalidUtf8 {
            oid: oid.to_string(),
        })
    }

    // =========================================================================
    // Remotes
    // =========================================================================

    pub fn remote_url(&self, name: &str) -> Result<Option<String>, GitError> {
        match self.repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(String::from)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::internal(e)),
        }
    }

    /// Split a GitHub remote URL into `(owner, repo)`.
    ///
    /// ```
    /// use trellis::git::Git;
    ///
    /// let parsed = Git::parse_github_remote("git@github.com:acme/widgets.git");
    /// assert_eq!(parsed, Some(("acme".to_string(), "widgets".to_string())));
    /// assert_eq!(Git::parse_github_remote("https://example.com/a/b"), None);
    /// ```
    pub fn parse_github_remote(url: &str) -> Option<(String, String)> {
        let path = ["https://github.com/", "ssh://git@github.com/", "git@github.com:"]
            .iter()
            .find_map(|prefix| url.strip_prefix(prefix))?;
        let path = path.trim_end_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        match path.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Some((owner.to_string(), repo.to_string()))
            }
            _ => None,
        }
    }
}

impl AncestryOracle for Git {
    fn is_ancestor(&self, ancestor: &Oid, descendant: &Oid) -> Result<bool, GitError> {
        Git::is_ancestor(self, ancestor, descendant)
    }
}
