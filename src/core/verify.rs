//! core::verify
//!
//! Structural checks over a completed [`BranchGraph`].
//!
//! Validation builds graphs that satisfy these by construction; the checks
//! exist so commands can assert it and tests can catch regressions. Never
//! mutates anything.

use std::collections::HashSet;

use thiserror::Error;

use super::ancestry::AncestryOracle;
use super::graph::{BranchGraph, ValidationStatus};
use super::types::BranchName;
use crate::git::GitError;

/// A broken graph invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("trunk '{0}' has no TRUNK record")]
    TrunkMissing(BranchName),

    #[error("'{0}' is marked TRUNK but is not the configured trunk")]
    ExtraTrunk(BranchName),

    #[error("trunk record carries parent fields")]
    TrunkHasParent,

    #[error("'{child}' is listed as a child of '{parent}' but names a different parent")]
    ChildMismatch { parent: BranchName, child: BranchName },

    #[error("'{branch}' is VALID but its parent revision is not an ancestor of its tip")]
    ParentRevisionNotAncestor { branch: BranchName },

    #[error("'{branch}' has status {status} but parent '{parent}' is a valid parent")]
    InvalidParentMisassigned {
        branch: BranchName,
        parent: BranchName,
        status: ValidationStatus,
    },

    #[error("'{branch}' is VALID but its parent '{parent}' is not")]
    ValidUnderInvalid { branch: BranchName, parent: BranchName },

    #[error("branch '{0}' has no record")]
    RecordMissing(BranchName),

    #[error("record '{0}' does not correspond to a branch")]
    UnexpectedRecord(BranchName),
}

/// Outcome of a verification pass.
#[derive(Debug, Default)]
pub struct VerifyResult {
    pub ok: bool,
    pub errors: Vec<VerifyError>,
}

impl VerifyResult {
    fn from_errors(errors: Vec<VerifyError>) -> Self {
        Self {
            ok: errors.is_empty(),
            errors,
        }
    }

    pub fn merge(mut self, other: VerifyResult) -> Self {
        self.errors.extend(other.errors);
        Self::from_errors(self.errors)
    }
}

/// Check the structural invariants of `graph` against the set of branches
/// it was built from.
pub fn verify_graph(graph: &BranchGraph, branches: &[BranchName]) -> VerifyResult {
    let mut errors = Vec::new();

    match graph.get(graph.trunk()) {
        Some(record) if record.status() == ValidationStatus::Trunk => {
            if record.parent_branch_name().is_some() || record.parent_branch_revision().is_some() {
                errors.push(VerifyError::TrunkHasParent);
            }
        }
        _ => errors.push(VerifyError::TrunkMissing(graph.trunk().clone())),
    }

    for (name, record) in graph.iter() {
        if record.status() == ValidationStatus::Trunk && !graph.is_trunk(name) {
            errors.push(VerifyError::ExtraTrunk(name.clone()));
        }

        for child in record.children() {
            if graph.parent(child) != Some(name) {
                errors.push(VerifyError::ChildMismatch {
                    parent: name.clone(),
                    child: child.clone(),
                });
            }
        }

        let Some(parent) = record.parent_branch_name() else {
            continue;
        };
        let parent_ok = graph
            .status(parent)
            .is_some_and(ValidationStatus::is_valid_parent);
        match record.status() {
            ValidationStatus::InvalidParent if parent_ok => {
                errors.push(VerifyError::InvalidParentMisassigned {
                    branch: name.clone(),
                    parent: parent.clone(),
                    status: record.status(),
                })
            }
            ValidationStatus::Valid if !parent_ok => errors.push(VerifyError::ValidUnderInvalid {
                branch: name.clone(),
                parent: parent.clone(),
            }),
            _ => {}
        }
    }

    let expected: HashSet<&BranchName> = branches.iter().collect();
    for branch in branches {
        if !graph.contains(branch) {
            errors.push(VerifyError::RecordMissing(branch.clone()));
        }
    }
    for (name, _) in graph.iter() {
        if !expected.contains(name) {
            errors.push(VerifyError::UnexpectedRecord(name.clone()));
        }
    }

    VerifyResult::from_errors(errors)
}

/// Check that every VALID record's parent revision is an ancestor of its tip.
pub fn verify_ancestry(
    graph: &BranchGraph,
    oracle: &impl AncestryOracle,
) -> Result<VerifyResult, GitError> {
    let mut errors = Vec::new();
    for (name, record) in graph.iter() {
        if record.status() != ValidationStatus::Valid {
            continue;
        }
        let confirmed = match record.parent_branch_revision() {
            Some(parent_rev) => oracle.is_ancestor(parent_rev, record.branch_revision())?,
            None => false,
        };
        if !confirmed {
            errors.push(VerifyError::ParentRevisionNotAncestor {
                branch: name.clone(),
            });
        }
    }
    Ok(VerifyResult::from_errors(errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ancestry::CommitGraph;
    use crate::core::graph::ValidatedRecord;
    use crate::core::types::Oid;
    use std::collections::HashMap;

    fn name(s: &str) -> BranchName {
        BranchName::new(s).unwrap()
    }

    fn rev(n: u32) -> Oid {
        Oid::new(format!("{n:040x}")).unwrap()
    }

    fn healthy() -> (BranchGraph, Vec<BranchName>) {
        let mut main = ValidatedRecord::trunk(rev(1));
        main.push_child(name("a"));
        let a = ValidatedRecord::valid(rev(2), name("main"), rev(1), None);
        let records = HashMap::from([(name("main"), main), (name("a"), a)]);
        (
            BranchGraph::from_records(name("main"), records),
            vec![name("main"), name("a")],
        )
    }

    #[test]
    fn healthy_graph_passes() {
        let (graph, branches) = healthy();
        let result = verify_graph(&graph, &branches);
        assert!(result.ok, "{:?}", result.errors);
    }

    #[test]
    fn missing_trunk_and_extra_records_are_reported() {
        let a = ValidatedRecord::bad_parent_name(rev(2), None);
        let graph = BranchGraph::from_records(name("main"), HashMap::from([(name("a"), a)]));
        let result = verify_graph(&graph, &[name("main")]);
        assert!(!result.ok);
        assert!(result.errors.contains(&VerifyError::TrunkMissing(name("main"))));
        assert!(result.errors.contains(&VerifyError::RecordMissing(name("main"))));
        assert!(result.errors.contains(&VerifyError::UnexpectedRecord(name("a"))));
    }

    #[test]
    fn child_lists_must_agree_with_parents() {
        let mut main = ValidatedRecord::trunk(rev(1));
        main.push_child(name("a"));
        let a = ValidatedRecord::bad_parent_name(rev(2), None);
        let graph = BranchGraph::from_records(
            name("main"),
            HashMap::from([(name("main"), main), (name("a"), a)]),
        );
        let result = verify_graph(&graph, &[name("main"), name("a")]);
        assert_eq!(
            result.errors,
            vec![VerifyError::ChildMismatch {
                parent: name("main"),
                child: name("a"),
            }]
        );
    }

    #[test]
    fn invalid_parent_under_valid_parent_is_flagged() {
        let mut main = ValidatedRecord::trunk(rev(1));
        main.push_child(name("a"));
        let a = ValidatedRecord::invalid_parent(rev(2), name("main"), None, None);
        let graph = BranchGraph::from_records(
            name("main"),
            HashMap::from([(name("main"), main), (name("a"), a)]),
        );
        let result = verify_graph(&graph, &[name("main"), name("a")]);
        assert!(matches!(
            result.errors.as_slice(),
            [VerifyError::InvalidParentMisassigned { .. }]
        ));
    }

    #[test]
    fn ancestry_check() {
        let (graph, _) = healthy();
        let mut dag = CommitGraph::new();
        dag.add_commit(rev(1), &[]);
        dag.add_commit(rev(2), &[rev(1)]);
        assert!(verify_ancestry(&graph, &dag).unwrap().ok);

        let mut unrelated = CommitGraph::new();
        unrelated.add_commit(rev(1), &[]);
        unrelated.add_commit(rev(2), &[]);
        let result = verify_ancestry(&graph, &unrelated).unwrap();
        assert_eq!(
            result.errors,
            vec![VerifyError::ParentRevisionNotAncestor { branch: name("a") }]
        );
    }
}
