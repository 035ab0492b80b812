//! core::ancestry
//!
//! The ancestry oracle: the single question validation asks of history.
//!
//! [`crate::git::Git`] answers it from the object database. [`CommitGraph`]
//! answers it from an in-memory DAG, which lets the validator be exercised
//! without a repository.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::core::types::Oid;
use crate::git::GitError;

/// Answers "is `ancestor` reachable from `descendant`?".
///
/// Every commit is its own ancestor. Implementations must not mutate
/// anything; the validator may ask the same question many times.
pub trait AncestryOracle {
    fn is_ancestor(&self, ancestor: &Oid, descendant: &Oid) -> Result<bool, GitError>;
}

impl<T: AncestryOracle + ?Sized> AncestryOracle for &T {
    fn is_ancestor(&self, ancestor: &Oid, descendant: &Oid) -> Result<bool, GitError> {
        (**self).is_ancestor(ancestor, descendant)
    }
}

/// An in-memory commit DAG.
///
/// Mirrors the git oracle's edge behavior: an unknown candidate ancestor is
/// simply not an ancestor, an unknown descendant is `ObjectNotFound`.
///
/// ```
/// use trellis::core::ancestry::{AncestryOracle, CommitGraph};
/// use trellis::core::types::Oid;
///
/// let (a, b) = (Oid::new("a".repeat(40)).unwrap(), Oid::new("b".repeat(40)).unwrap());
/// let mut dag = CommitGraph::new();
/// dag.add_commit(a.clone(), &[]);
/// dag.add_commit(b.clone(), &[a.clone()]);
/// assert!(dag.is_ancestor(&a, &b).unwrap());
/// assert!(!dag.is_ancestor(&b, &a).unwrap());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommitGraph {
    parents: HashMap<Oid, Vec<Oid>>,
}

impl CommitGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a commit and its parents. Parents need not be known yet.
    pub fn add_commit(&mut self, oid: Oid, parents: &[Oid]) {
        self.parents.insert(oid, parents.to_vec());
    }

    pub fn contains(&self, oid: &Oid) -> bool {
        self.parents.contains_key(oid)
    }

    /// Drop a commit, as if it had been garbage-collected.
    pub fn forget(&mut self, oid: &Oid) {
        self.parents.remove(oid);
    }
}

impl AncestryOracle for CommitGraph {
    fn is_ancestor(&self, ancestor: &Oid, descendant: &Oid) -> Result<bool, GitError> {
        if !self.contains(descendant) {
            return Err(GitError::ObjectNotFound {
                oid: descendant.to_string(),
            });
        }
        if ancestor == descendant {
            return Ok(true);
        }

        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([descendant]);
        while let Some(current) = queue.pop_front() {
            for parent in self.parents.get(current).into_iter().flatten() {
                if parent == ancestor {
                    return Ok(true);
                }
                if seen.insert(parent) {
                    queue.push_back(parent);
                }
            }
        }
        Ok(false)
    }
}
