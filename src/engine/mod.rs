//! engine
//!
//! Builds the validated branch graph and answers questions about it.
//!
//! # Lifecycle
//!
//! ```text
//! Workspace::open -> seed::collect -> validate -> StackEngine
//! ```
//!
//! [`Workspace`] opens the repository, loads config and takes the
//! repository lock for the whole command. [`seed::collect`] snapshots
//! branches and metadata names. [`validate::validate`] classifies every
//! branch, repairing stale parent revisions as it goes. The resulting
//! [`StackEngine`] is a read-only view; the only mutation it offers is
//! [`StackEngine::upsert_pr_info`], which goes to the store and leaves the
//! snapshot untouched.
//!
//! # Example
//!
//! ```ignore
//! use trellis::engine::{Context, Workspace};
//!
//! let workspace = Workspace::open(&Context::default())?;
//! let engine = workspace.load_engine()?;
//! for child in engine.get_children(engine.trunk()) {
//!     println!("{child}");
//! }
//! ```

pub mod repair;
pub mod seed;
pub mod validate;
pub mod workspace;

pub use repair::{check_parent_revision, RepairInput, RepairKind, RepairWrite, RevisionVerdict};
pub use seed::{CacheSeed, SeedError};
pub use validate::{validate, RepairRecord, Validation, ValidateError, ValidationReport};
pub use workspace::Workspace;

use std::path::PathBuf;

use crate::core::ancestry::AncestryOracle;
use crate::core::config::ConfigError;
use crate::core::graph::{BranchGraph, ValidatedRecord, ValidationStatus};
use crate::core::metadata::{MetadataStore, PrInfo, StoreError};
use crate::core::ops::LockError;
use crate::core::types::BranchName;
use crate::git::GitError;

/// Execution context for commands.
///
/// Global settings derived from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
}

impl Context {
    /// Directory to discover the repository from.
    pub fn repo_dir(&self) -> PathBuf {
        self.cwd
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Errors from engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no trunk configured; run `trl trunk --set <branch>`")]
    TrunkNotConfigured,

    #[error("branch '{0}' is not tracked")]
    NotTracked(BranchName),

    #[error("branch '{0}' does not exist")]
    UnknownBranch(BranchName),

    #[error(transparent)]
    Seed(#[from] SeedError),

    #[error(transparent)]
    Validate(#[from] ValidateError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("git error: {0}")]
    Git(#[from] GitError),

    #[error("invalid branch name: {0}")]
    Name(#[from] crate::core::types::TypeError),
}

// =============================================================================
// StackEngine
// =============================================================================

/// The validated graph for one command, plus repository position.
#[derive(Debug)]
pub struct StackEngine {
    graph: BranchGraph,
    report: ValidationReport,
    current_branch: Option<BranchName>,
    rebase_head: Option<BranchName>,
}

impl StackEngine {
    /// Validate `seed` and wrap the result.
    pub fn load<S, O>(
        seed: &CacheSeed,
        store: &mut S,
        oracle: &O,
        current_branch: Option<BranchName>,
    ) -> Result<Self, EngineError>
    where
        S: MetadataStore + ?Sized,
        O: AncestryOracle + ?Sized,
    {
        let Validation { graph, report } = validate::validate(seed, store, oracle)?;
        Ok(Self {
            graph,
            report,
            current_branch,
            rebase_head: seed.rebase_head().cloned(),
        })
    }

    pub fn graph(&self) -> &BranchGraph {
        &self.graph
    }

    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    pub fn trunk(&self) -> &BranchName {
        self.graph.trunk()
    }

    pub fn record(&self, branch: &BranchName) -> Option<&ValidatedRecord> {
        self.graph.get(branch)
    }

    pub fn get_parent(&self, branch: &BranchName) -> Option<&BranchName> {
        self.graph.parent(branch)
    }

    pub fn get_children(&self, branch: &BranchName) -> &[BranchName] {
        self.graph.children(branch)
    }

    pub fn is_trunk(&self, branch: &BranchName) -> bool {
        self.graph.is_trunk(branch)
    }

    pub fn get_pr_info(&self, branch: &BranchName) -> Option<&PrInfo> {
        self.graph.pr_info(branch)
    }

    pub fn ancestors(&self, branch: &BranchName) -> Vec<BranchName> {
        self.graph.ancestors(branch)
    }

    pub fn descendants(&self, branch: &BranchName) -> Vec<BranchName> {
        self.graph.descendants(branch)
    }

    pub fn stack_root(&self, branch: &BranchName) -> Option<BranchName> {
        self.graph.stack_root(branch)
    }

    pub fn branches_with_status(&self, status: ValidationStatus) -> Vec<&BranchName> {
        self.graph.with_status(status)
    }

    /// Branch being rebased, when a rebase is stopped.
    pub fn rebase_head(&self) -> Option<&BranchName> {
        self.rebase_head.as_ref()
    }

    pub fn current_branch(&self) -> Option<&BranchName> {
        self.current_branch.as_ref()
    }

    /// Replace a branch's stored PR info.
    ///
    /// Only the store changes; this engine keeps reporting the PR info it
    /// was loaded with.
    pub fn upsert_pr_info<S: MetadataStore + ?Sized>(
        &self,
        store: &mut S,
        branch: &BranchName,
        pr_info: PrInfo,
    ) -> Result<(), EngineError> {
        let metadata = store
            .read(branch)?
            .ok_or_else(|| EngineError::NotTracked(branch.clone()))?;
        store.write(branch, &metadata.with_pr_info(Some(pr_info)))?;
        tracing::debug!(branch = %branch, "updated pr info");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ancestry::CommitGraph;
    use crate::core::metadata::{BranchMetadata, InMemoryMetadataStore};
    use crate::core::types::Oid;

    fn name(s: &str) -> BranchName {
        BranchName::new(s).unwrap()
    }

    fn rev(n: u32) -> Oid {
        Oid::new(format!("{n:040x}")).unwrap()
    }

    /// main(1) <- a(2) <- b(3), main(1) <- c(4); d has no metadata.
    fn engine(store: &mut InMemoryMetadataStore) -> StackEngine {
        let mut dag = CommitGraph::new();
        dag.add_commit(rev(1), &[]);
        dag.add_commit(rev(2), &[rev(1)]);
        dag.add_commit(rev(3), &[rev(2)]);
        dag.add_commit(rev(4), &[rev(1)]);
        dag.add_commit(rev(5), &[rev(1)]);

        store.insert(name("a"), BranchMetadata::default().with_parent(&name("main"), &rev(1)));
        store.insert(name("b"), BranchMetadata::default().with_parent(&name("a"), &rev(2)));
        store.insert(name("c"), BranchMetadata::default().with_parent(&name("main"), &rev(1)));

        let seed = CacheSeed::new(name("main"))
            .with_branch(name("main"), rev(1))
            .with_branch(name("c"), rev(4))
            .with_branch(name("b"), rev(3))
            .with_branch(name("a"), rev(2))
            .with_branch(name("d"), rev(5))
            .with_rebase_head(Some(name("b")));
        StackEngine::load(&seed, store, &dag, Some(name("a"))).unwrap()
    }

    #[test]
    fn relationship_queries() {
        let mut store = InMemoryMetadataStore::new();
        let engine = engine(&mut store);

        assert!(engine.is_trunk(&name("main")));
        assert_eq!(engine.get_parent(&name("b")), Some(&name("a")));
        assert_eq!(engine.get_children(&name("main")), &[name("a"), name("c")]);
        assert!(engine.get_children(&name("nope")).is_empty());
        assert_eq!(engine.ancestors(&name("b")), vec![name("a"), name("main")]);
        assert_eq!(engine.descendants(&name("a")), vec![name("b")]);
        assert_eq!(engine.stack_root(&name("b")), Some(name("a")));
        assert_eq!(
            engine.branches_with_status(ValidationStatus::BadParentName),
            vec![&name("d")]
        );
        assert_eq!(engine.current_branch(), Some(&name("a")));
        assert_eq!(engine.rebase_head(), Some(&name("b")));
    }

    #[test]
    fn upsert_pr_info_writes_store_only() {
        let mut store = InMemoryMetadataStore::new();
        let engine = engine(&mut store);
        store.reset_counters();

        let pr = PrInfo {
            number: Some(41),
            ..Default::default()
        };
        engine.upsert_pr_info(&mut store, &name("b"), pr.clone()).unwrap();

        let stored = store.read(&name("b")).unwrap().unwrap();
        assert_eq!(stored.pr_info, Some(pr));
        assert_eq!(stored.parent_branch_name.as_deref(), Some("a"));
        assert_eq!(store.writes(), 1);
        assert_eq!(engine.get_pr_info(&name("b")), None);
    }

    #[test]
    fn upsert_pr_info_requires_metadata() {
        let mut store = InMemoryMetadataStore::new();
        let engine = engine(&mut store);
        let err = engine
            .upsert_pr_info(&mut store, &name("d"), PrInfo::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::NotTracked(b) if b == name("d")));
    }
}
