//! engine::repair
//!
//! Parent revision checking and repair.
//!
//! A branch's recorded parent revision is the commit of the parent it was
//! built on. After the parent moves (new commits, a rebase) the record can
//! go stale. [`check_parent_revision`] decides whether the link still holds,
//! whether it can be advanced to the parent's current tip, or whether it is
//! broken. It only computes; the caller performs any write it asks for.

use crate::core::ancestry::AncestryOracle;
use crate::core::types::{BranchName, Oid};
use crate::git::GitError;

/// Inputs to a parent revision check.
#[derive(Debug, Clone, Copy)]
pub struct RepairInput<'a> {
    pub branch: &'a BranchName,
    pub branch_revision: &'a Oid,
    pub parent: &'a BranchName,
    /// The parent's tip right now.
    pub parent_revision: &'a Oid,
    /// What the metadata says the parent revision was.
    pub recorded_parent_revision: Option<&'a Oid>,
}

/// Why a stored parent revision is being rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairKind {
    /// The recorded revision was still valid and the parent's new tip is
    /// also in the branch's history.
    FastForward,
    /// The recorded revision was missing or unrelated, but the parent's
    /// current tip is in the branch's history.
    Relink,
}

impl RepairKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RepairKind::FastForward => "fast-forward",
            RepairKind::Relink => "relink",
        }
    }
}

/// A parent revision the caller should persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairWrite {
    pub kind: RepairKind,
    pub parent_branch_revision: Oid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionVerdict {
    /// The link holds at `parent_branch_revision`. `repair` is set when
    /// that differs from what is stored.
    Valid {
        parent_branch_revision: Oid,
        repair: Option<RepairWrite>,
    },
    /// No ancestry relationship could be established.
    BadParentRevision,
}

/// Classify a branch's parent revision.
///
/// 1. Recorded revision is an ancestor of the branch: valid. If the parent
///    has moved and its current tip is also an ancestor, advance to it.
/// 2. Otherwise, if the parent's current tip is an ancestor: valid, relinked
///    to the current tip.
/// 3. Otherwise the link is broken.
pub fn check_parent_revision(
    oracle: &(impl AncestryOracle + ?Sized),
    input: RepairInput<'_>,
) -> Result<RevisionVerdict, GitError> {
    let current = input.parent_revision;
    let own = input.branch_revision;

    if let Some(recorded) = input.recorded_parent_revision {
        if oracle.is_ancestor(recorded, own)? {
            if recorded != current && oracle.is_ancestor(current, own)? {
                tracing::debug!(
                    branch = %input.branch,
                    parent = %input.parent,
                    from = %recorded.short(7),
                    to = %current.short(7),
                    "validated and updated parent rev"
                );
                return Ok(RevisionVerdict::Valid {
                    parent_branch_revision: current.clone(),
                    repair: Some(RepairWrite {
                        kind: RepairKind::FastForward,
                        parent_branch_revision: current.clone(),
                    }),
                });
            }
            tracing::debug!(branch = %input.branch, parent = %input.parent, "validated");
            return Ok(RevisionVerdict::Valid {
                parent_branch_revision: recorded.clone(),
                repair: None,
            });
        }
    }

    if !oracle.is_ancestor(current, own)? {
        tracing::debug!(branch = %input.branch, parent = %input.parent, "bad parent rev");
        return Ok(RevisionVerdict::BadParentRevision);
    }

    tracing::debug!(
        branch = %input.branch,
        parent = %input.parent,
        to = %current.short(7),
        "validated and fixed parent rev"
    );
    Ok(RevisionVerdict::Valid {
        parent_branch_revision: current.clone(),
        repair: Some(RepairWrite {
            kind: RepairKind::Relink,
            parent_branch_revision: current.clone(),
        }),
    })
}
