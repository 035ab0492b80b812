//! engine::validate
//!
//! Turns a [`CacheSeed`] plus stored metadata into a [`BranchGraph`].
//!
//! # Algorithm
//!
//! 1. Delete metadata whose branch no longer exists.
//! 2. Queue every branch in seed order. Pop from the front; a branch whose
//!    parent has not been classified yet goes to the back.
//! 3. Classify: trunk, bad parent name, invalid parent (parent not valid),
//!    or run the parent revision check, writing back any repair.
//! 4. Sort every children list so output does not depend on seed order.
//!
//! Each dequeue spends one unit of an `n(n+1)/2` budget. An acyclic input
//! always fits; a metadata cycle keeps its members requeueing until the
//! budget runs out and validation fails with
//! [`ValidateError::CycleDetected`].
//!
//! Corrupt metadata documents are logged and read as empty metadata, so the
//! branch lands in `BAD_PARENT_NAME` rather than failing the whole run.

use std::collections::{HashMap, HashSet, VecDeque};

use thiserror::Error;

use super::repair::{check_parent_revision, RepairInput, RepairKind, RevisionVerdict};
use super::seed::CacheSeed;
use crate::core::ancestry::AncestryOracle;
use crate::core::graph::{BranchGraph, ValidatedRecord};
use crate::core::metadata::{BranchMetadata, MetadataStore, StoreError};
use crate::core::types::{BranchName, Oid};
use crate::git::GitError;

#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("cycle detected in branch metadata")]
    CycleDetected { unresolved: Vec<BranchName> },

    #[error("ancestry query failed: {0}")]
    Ancestry(#[from] GitError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A parent revision rewritten during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairRecord {
    pub branch: BranchName,
    pub kind: RepairKind,
    pub from: Option<Oid>,
    pub to: Oid,
}

/// Side effects and counters from one validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Metadata entries deleted because their branch is gone.
    pub pruned: Vec<BranchName>,
    pub repaired: Vec<RepairRecord>,
    /// Branches whose metadata could not be parsed.
    pub corrupt: Vec<BranchName>,
    pub dequeues: usize,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.pruned.is_empty() && self.repaired.is_empty() && self.corrupt.is_empty()
    }
}

#[derive(Debug)]
pub struct Validation {
    pub graph: BranchGraph,
    pub report: ValidationReport,
}

struct Pending {
    name: BranchName,
    revision: Oid,
    metadata: BranchMetadata,
}

/// Classify every branch in `seed`, repairing stale parent revisions in
/// `store` along the way.
pub fn validate<S, O>(
    seed: &CacheSeed,
    store: &mut S,
    oracle: &O,
) -> Result<Validation, ValidateError>
where
    S: MetadataStore + ?Sized,
    O: AncestryOracle + ?Sized,
{
    let mut report = ValidationReport::default();

    for name in seed.metadata_names() {
        if !seed.has_branch(name) {
            tracing::debug!(branch = %name, "deleting metadata for missing branch");
            store.delete(name)?;
            report.pruned.push(name.clone());
        }
    }

    let known: HashSet<&BranchName> = seed.branches().iter().map(|(name, _)| name).collect();
    let mut queue = VecDeque::with_capacity(seed.branches().len());
    for (name, revision) in seed.branches() {
        let metadata = match store.read(name) {
            Ok(metadata) => metadata.unwrap_or_default(),
            Err(StoreError::Corrupt { branch, source }) => {
                tracing::warn!(branch = %branch, error = %source, "ignoring corrupt metadata");
                report.corrupt.push(branch);
                BranchMetadata::default()
            }
            Err(e) => return Err(e.into()),
        };
        queue.push_back(Pending {
            name: name.clone(),
            revision: revision.clone(),
            metadata,
        });
    }

    let n = queue.len();
    let mut budget = n * (n + 1) / 2;
    let mut records: HashMap<BranchName, ValidatedRecord> = HashMap::with_capacity(n);

    while !queue.is_empty() {
        if budget == 0 {
            let mut unresolved: Vec<BranchName> = queue.into_iter().map(|p| p.name).collect();
            unresolved.sort();
            tracing::debug!(?unresolved, "cycle detected in branch metadata");
            return Err(ValidateError::CycleDetected { unresolved });
        }
        budget -= 1;
        report.dequeues += 1;

        let Some(pending) = queue.pop_front() else {
            break;
        };

        if &pending.name == seed.trunk() {
            tracing::debug!(branch = %pending.name, "trunk");
            records.insert(pending.name, ValidatedRecord::trunk(pending.revision));
            continue;
        }

        let pr_info = pending.metadata.pr_info.clone();
        let parent = match pending
            .metadata
            .parent_branch_name
            .as_deref()
            .and_then(|raw| BranchName::new(raw).ok())
        {
            Some(parent) if parent != pending.name && known.contains(&parent) => parent,
            _ => {
                tracing::debug!(
                    branch = %pending.name,
                    parent = ?pending.metadata.parent_branch_name,
                    "bad parent name"
                );
                records.insert(
                    pending.name,
                    ValidatedRecord::bad_parent_name(pending.revision, pr_info),
                );
                continue;
            }
        };

        let Some(parent_record) = records.get_mut(&parent) else {
            queue.push_back(pending);
            continue;
        };
        parent_record.push_child(pending.name.clone());
        let parent_status = parent_record.status();
        let parent_revision = parent_record.branch_revision().clone();
        let recorded = pending.metadata.parent_revision();

        if !parent_status.is_valid_parent() {
            tracing::debug!(branch = %pending.name, parent = %parent, %parent_status, "invalid parent");
            records.insert(
                pending.name,
                ValidatedRecord::invalid_parent(pending.revision, parent, recorded, pr_info),
            );
            continue;
        }

        let verdict = check_parent_revision(
            oracle,
            RepairInput {
                branch: &pending.name,
                branch_revision: &pending.revision,
                parent: &parent,
                parent_revision: &parent_revision,
                recorded_parent_revision: recorded.as_ref(),
            },
        )?;

        let record = match verdict {
            RevisionVerdict::Valid {
                parent_branch_revision,
                repair,
            } => {
                if let Some(repair) = repair {
                    let updated = pending
                        .metadata
                        .clone()
                        .with_parent_revision(&repair.parent_branch_revision);
                    store.write(&pending.name, &updated)?;
                    report.repaired.push(RepairRecord {
                        branch: pending.name.clone(),
                        kind: repair.kind,
                        from: recorded,
                        to: repair.parent_branch_revision,
                    });
                }
                ValidatedRecord::valid(pending.revision, parent, parent_branch_revision, pr_info)
            }
            RevisionVerdict::BadParentRevision => {
                ValidatedRecord::bad_parent_revision(pending.revision, parent, pr_info)
            }
        };
        records.insert(pending.name, record);
    }

    for record in records.values_mut() {
        record.sort_children();
    }

    tracing::debug!(
        branches = records.len(),
        dequeues = report.dequeues,
        repaired = report.repaired.len(),
        pruned = report.pruned.len(),
        "validated branch graph"
    );

    Ok(Validation {
        graph: BranchGraph::from_records(seed.trunk().clone(), records),
        report,
    })
}
