//! engine::seed
//!
//! The raw repository snapshot validation starts from.
//!
//! A [`CacheSeed`] is plain data: every local branch with its tip, the names
//! that currently have metadata refs, the trunk, and the branch being
//! rebased if a rebase is stopped. [`collect`] reads it from git; tests build
//! one by hand.

use std::collections::HashMap;

use thiserror::Error;

use crate::core::types::{BranchName, Oid};
use crate::git::{Git, GitError};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("trunk branch '{0}' does not exist")]
    TrunkMissing(BranchName),

    #[error(transparent)]
    Git(#[from] GitError),
}

/// Branch names, revisions and metadata names at one point in time.
#[derive(Debug, Clone)]
pub struct CacheSeed {
    trunk: BranchName,
    branches: Vec<(BranchName, Oid)>,
    revisions: HashMap<BranchName, Oid>,
    metadata_names: Vec<BranchName>,
    rebase_head: Option<BranchName>,
}

impl CacheSeed {
    pub fn new(trunk: BranchName) -> Self {
        Self {
            trunk,
            branches: Vec::new(),
            revisions: HashMap::new(),
            metadata_names: Vec::new(),
            rebase_head: None,
        }
    }

    /// Add a branch. Re-adding a name moves its revision, keeping its position.
    pub fn with_branch(mut self, name: BranchName, revision: Oid) -> Self {
        if self.revisions.insert(name.clone(), revision.clone()).is_some() {
            if let Some(slot) = self.branches.iter_mut().find(|(n, _)| *n == name) {
                slot.1 = revision;
            }
        } else {
            self.branches.push((name, revision));
        }
        self
    }

    pub fn with_metadata_name(mut self, name: BranchName) -> Self {
        if !self.metadata_names.contains(&name) {
            self.metadata_names.push(name);
        }
        self
    }

    pub fn with_rebase_head(mut self, branch: Option<BranchName>) -> Self {
        self.rebase_head = branch;
        self
    }

    pub fn trunk(&self) -> &BranchName {
        &self.trunk
    }

    /// Branches in the order they were added.
    pub fn branches(&self) -> &[(BranchName, Oid)] {
        &self.branches
    }

    pub fn branch_names(&self) -> Vec<BranchName> {
        self.branches.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn revision(&self, branch: &BranchName) -> Option<&Oid> {
        self.revisions.get(branch)
    }

    pub fn has_branch(&self, branch: &BranchName) -> bool {
        self.revisions.contains_key(branch)
    }

    /// Names with a metadata entry, including ones whose branch is gone.
    pub fn metadata_names(&self) -> &[BranchName] {
        &self.metadata_names
    }

    pub fn rebase_head(&self) -> Option<&BranchName> {
        self.rebase_head.as_ref()
    }
}

/// Read a seed from the repository.
pub fn collect(git: &Git, trunk: &BranchName) -> Result<CacheSeed, SeedError> {
    let mut seed = CacheSeed::new(trunk.clone()).with_rebase_head(git.rebase_head_branch());
    for (name, tip) in git.branch_tips()? {
        seed = seed.with_branch(name, tip);
    }
    if !seed.has_branch(trunk) {
        return Err(SeedError::TrunkMissing(trunk.clone()));
    }
    for (name, _) in git.list_metadata_refs()? {
        seed = seed.with_metadata_name(name);
    }
    tracing::debug!(
        branches = seed.branches().len(),
        metadata = seed.metadata_names().len(),
        rebase_head = ?seed.rebase_head(),
        "collected cache seed"
    );
    Ok(seed)
}
