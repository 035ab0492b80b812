//! core::graph
//!
//! The validated branch graph.
//!
//! Every local branch gets exactly one [`ValidatedRecord`], classified by
//! how far its parent link could be trusted. The graph is a snapshot: it is
//! rebuilt by validation on every run and never updated afterwards.
//!
//! Parent links only ever point at records created earlier in the same
//! validation pass, so following them always ends (at trunk or at a branch
//! whose link was rejected).

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use serde::Serialize;

use super::metadata::PrInfo;
use super::types::{BranchName, Oid};

/// How a branch's parent link was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    /// The configured trunk.
    Trunk,
    /// Parent link confirmed, possibly after repairing the parent revision.
    Valid,
    /// Parent name missing, self-referential, or not a local branch.
    BadParentName,
    /// Parent exists but is not itself trunk or valid.
    InvalidParent,
    /// Neither the recorded nor the current parent revision is an ancestor.
    BadParentRevision,
}

impl ValidationStatus {
    /// Whether a branch with this status can anchor children.
    pub fn is_valid_parent(self) -> bool {
        matches!(self, ValidationStatus::Trunk | ValidationStatus::Valid)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValidationStatus::Trunk => "TRUNK",
            ValidationStatus::Valid => "VALID",
            ValidationStatus::BadParentName => "BAD_PARENT_NAME",
            ValidationStatus::InvalidParent => "INVALID_PARENT",
            ValidationStatus::BadParentRevision => "BAD_PARENT_REVISION",
        }
    }

    /// Short human description used in command output.
    pub fn describe(self) -> &'static str {
        match self {
            ValidationStatus::Trunk => "trunk",
            ValidationStatus::Valid => "valid",
            ValidationStatus::BadParentName => "missing or unknown parent",
            ValidationStatus::InvalidParent => "parent is invalid",
            ValidationStatus::BadParentRevision => "not based on its parent",
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One branch in the validated graph.
///
/// Which optional fields are set depends on the status; the constructors
/// are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedRecord {
    status: ValidationStatus,
    branch_revision: Oid,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_branch_name: Option<BranchName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_branch_revision: Option<Oid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pr_info: Option<PrInfo>,
    children: Vec<BranchName>,
}

impl ValidatedRecord {
    fn build(
        status: ValidationStatus,
        branch_revision: Oid,
        parent_branch_name: Option<BranchName>,
        parent_branch_revision: Option<Oid>,
        pr_info: Option<PrInfo>,
    ) -> Self {
        Self {
            status,
            branch_revision,
            parent_branch_name,
            parent_branch_revision,
            pr_info,
            children: Vec::new(),
        }
    }

    pub fn trunk(branch_revision: Oid) -> Self {
        Self::build(ValidationStatus::Trunk, branch_revision, None, None, None)
    }

    pub fn valid(
        branch_revision: Oid,
        parent: BranchName,
        parent_revision: Oid,
        pr_info: Option<PrInfo>,
    ) -> Self {
        Self::build(
            ValidationStatus::Valid,
            branch_revision,
            Some(parent),
            Some(parent_revision),
            pr_info,
        )
    }

    pub fn bad_parent_name(branch_revision: Oid, pr_info: Option<PrInfo>) -> Self {
        Self::build(ValidationStatus::BadParentName, branch_revision, None, None, pr_info)
    }

    /// `stale_parent_revision` is whatever was recorded, unverified.
    pub fn invalid_parent(
        branch_revision: Oid,
        parent: BranchName,
        stale_parent_revision: Option<Oid>,
        pr_info: Option<PrInfo>,
    ) -> Self {
        Self::build(
            ValidationStatus::InvalidParent,
            branch_revision,
            Some(parent),
            stale_parent_revision,
            pr_info,
        )
    }

    pub fn bad_parent_revision(
        branch_revision: Oid,
        parent: BranchName,
        pr_info: Option<PrInfo>,
    ) -> Self {
        Self::build(
            ValidationStatus::BadParentRevision,
            branch_revision,
            Some(parent),
            None,
            pr_info,
        )
    }

    pub fn status(&self) -> ValidationStatus {
        self.status
    }

    pub fn branch_revision(&self) -> &Oid {
        &self.branch_revision
    }

    pub fn parent_branch_name(&self) -> Option<&BranchName> {
        self.parent_branch_name.as_ref()
    }

    pub fn parent_branch_revision(&self) -> Option<&Oid> {
        self.parent_branch_revision.as_ref()
    }

    pub fn pr_info(&self) -> Option<&PrInfo> {
        self.pr_info.as_ref()
    }

    pub fn children(&self) -> &[BranchName] {
        &self.children
    }

    pub(crate) fn push_child(&mut self, child: BranchName) {
        self.children.push(child);
    }

    pub(crate) fn sort_children(&mut self) {
        self.children.sort();
    }
}

/// The validated graph: one record per local branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchGraph {
    trunk: BranchName,
    records: HashMap<BranchName, ValidatedRecord>,
}

impl BranchGraph {
    /// Assemble a graph from already-classified records.
    pub fn from_records(trunk: BranchName, records: HashMap<BranchName, ValidatedRecord>) -> Self {
        Self { trunk, records }
    }

    pub fn trunk(&self) -> &BranchName {
        &self.trunk
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, branch: &BranchName) -> Option<&ValidatedRecord> {
        self.records.get(branch)
    }

    pub fn contains(&self, branch: &BranchName) -> bool {
        self.records.contains_key(branch)
    }

    pub fn is_trunk(&self, branch: &BranchName) -> bool {
        branch == &self.trunk
    }

    pub fn status(&self, branch: &BranchName) -> Option<ValidationStatus> {
        self.get(branch).map(ValidatedRecord::status)
    }

    pub fn parent(&self, branch: &BranchName) -> Option<&BranchName> {
        self.get(branch).and_then(ValidatedRecord::parent_branch_name)
    }

    /// Children of `branch`; empty for unknown names.
    pub fn children(&self, branch: &BranchName) -> &[BranchName] {
        self.get(branch).map(ValidatedRecord::children).unwrap_or(&[])
    }

    pub fn pr_info(&self, branch: &BranchName) -> Option<&PrInfo> {
        self.get(branch).and_then(ValidatedRecord::pr_info)
    }

    /// Records sorted by branch name.
    pub fn iter(&self) -> impl Iterator<Item = (&BranchName, &ValidatedRecord)> {
        let mut entries: Vec<_> = self.records.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter()
    }

    /// Branch names with the given status, sorted.
    pub fn with_status(&self, status: ValidationStatus) -> Vec<&BranchName> {
        self.iter()
            .filter(|(_, record)| record.status() == status)
            .map(|(name, _)| name)
            .collect()
    }

    /// Parent, grandparent, ... up to the first branch without a parent.
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use trellis::core::graph::{BranchGraph, ValidatedRecord};
    /// use trellis::core::types::{BranchName, Oid};
    ///
    /// let name = |s: &str| BranchName::new(s).unwrap();
    /// let rev = Oid::new("c".repeat(40)).unwrap();
    /// let mut records = HashMap::new();
    /// records.insert(name("main"), ValidatedRecord::trunk(rev.clone()));
    /// records.insert(name("a"), ValidatedRecord::valid(rev.clone(), name("main"), rev.clone(), None));
    /// records.insert(name("b"), ValidatedRecord::valid(rev.clone(), name("a"), rev.clone(), None));
    ///
    /// let graph = BranchGraph::from_records(name("main"), records);
    /// assert_eq!(graph.ancestors(&name("b")), vec![name("a"), name("main")]);
    /// ```
    pub fn ancestors(&self, branch: &BranchName) -> Vec<BranchName> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([branch]);
        let mut current = self.parent(branch);
        while let Some(parent) = current {
            if !seen.insert(parent) {
                break;
            }
            chain.push(parent.clone());
            current = self.parent(parent);
        }
        chain
    }

    /// Every branch reachable through children links, breadth first.
    pub fn descendants(&self, branch: &BranchName) -> Vec<BranchName> {
        let mut found = Vec::new();
        let mut seen = HashSet::new();
        let mut queue: VecDeque<&BranchName> = self.children(branch).iter().collect();
        while let Some(current) = queue.pop_front() {
            if seen.insert(current) {
                found.push(current.clone());
                queue.extend(self.children(current));
            }
        }
        found
    }

    /// The branch directly on trunk that `branch` stacks on (possibly
    /// itself). `None` for trunk and for branches not connected to trunk.
    pub fn stack_root(&self, branch: &BranchName) -> Option<BranchName> {
        if self.is_trunk(branch) || !self.contains(branch) {
            return None;
        }
        let mut lineage = vec![branch.clone()];
        lineage.extend(self.ancestors(branch));
        let trunk_at = lineage.iter().position(|b| self.is_trunk(b))?;
        trunk_at.checked_sub(1).map(|i| lineage[i].clone())
    }

    /// Depth-first walk of the subtree under `root` (inclusive), with depths
    /// relative to `root`.
    pub fn walk(&self, root: &BranchName) -> Vec<(usize, BranchName)> {
        let mut out = Vec::new();
        let mut stack = vec![(0usize, root)];
        let mut seen = HashSet::new();
        while let Some((depth, current)) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            out.push((depth, current.clone()));
            for child in self.children(current).iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }
}
