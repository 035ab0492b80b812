//! track command - Record a branch's parent

use std::collections::{HashMap, HashSet};

use anyhow::{anyhow, bail, Result};

use super::{require_known, verbosity};
use crate::core::metadata::{BranchMetadata, MetadataStore, StoreError};
use crate::core::types::{BranchName, Oid};
use crate::engine::{Context, EngineError, ValidateError, Workspace};
use crate::ui::output;

/// Track `branch` on top of `parent`.
///
/// The parent revision is the merge base of the two tips. Existing PR info
/// is kept; re-tracking moves the branch to the new parent.
///
/// When the stored metadata contains a parent cycle the graph cannot be
/// validated, so tips and ancestry come straight from the refs. That is how
/// a cycle gets broken.
pub fn track(ctx: &Context, branch: &str, parent: &str) -> Result<()> {
    let workspace = Workspace::open(ctx)?;
    let branch = BranchName::new(branch)?;
    let parent = BranchName::new(parent)?;

    if branch == workspace.trunk()? {
        bail!("cannot track trunk branch '{branch}'");
    }
    if branch == parent {
        bail!("a branch cannot be its own parent");
    }

    let (branch_tip, parent_tip) = match workspace.load_engine() {
        Ok(engine) => {
            require_known(&engine, &branch)?;
            require_known(&engine, &parent)?;
            if engine.descendants(&branch).contains(&parent) {
                bail!(cycle_error(&branch, &parent));
            }
            let (Some(branch_record), Some(parent_record)) =
                (engine.record(&branch), engine.record(&parent))
            else {
                bail!("branch records disappeared during validation");
            };
            (
                branch_record.branch_revision().clone(),
                parent_record.branch_revision().clone(),
            )
        }
        Err(EngineError::Validate(ValidateError::CycleDetected { .. })) => {
            tracing::debug!(branch = %branch, "metadata has a cycle; tracking from raw refs");
            if stacked_on(&workspace.store(), &parent, &branch)? {
                bail!(cycle_error(&branch, &parent));
            }
            let tips: HashMap<BranchName, Oid> = workspace.git().branch_tips()?.into_iter().collect();
            let tip = |name: &BranchName| {
                tips.get(name)
                    .cloned()
                    .ok_or_else(|| EngineError::UnknownBranch(name.clone()))
            };
            (tip(&branch)?, tip(&parent)?)
        }
        Err(e) => return Err(e.into()),
    };

    let base = workspace
        .git()
        .merge_base(&branch_tip, &parent_tip)?
        .ok_or_else(|| anyhow!("'{branch}' and '{parent}' have no common history"))?;

    let mut store = workspace.store();
    let existing = match store.read(&branch) {
        Ok(metadata) => metadata.unwrap_or_default(),
        Err(StoreError::Corrupt { .. }) => BranchMetadata::default(),
        Err(e) => return Err(e.into()),
    };
    let metadata = existing.with_parent(&parent, &base);
    store.write(&branch, &metadata)?;
    tracing::debug!(branch = %branch, parent = %parent, base = %base, "tracked branch");

    output::success(
        format!("Tracking '{branch}' on '{parent}' at {}", base.short(7)),
        verbosity(ctx),
    );
    Ok(())
}

fn cycle_error(branch: &BranchName, parent: &BranchName) -> String {
    format!("'{parent}' is stacked on '{branch}'; tracking would create a cycle")
}

/// Whether following stored parent names up from `start` reaches `target`.
///
/// Stops at the first branch without a readable parent or on revisiting a
/// branch, so it terminates on cyclic metadata.
fn stacked_on(
    store: &impl MetadataStore,
    start: &BranchName,
    target: &BranchName,
) -> Result<bool, StoreError> {
    let mut seen = HashSet::new();
    let mut current = start.clone();
    while seen.insert(current.clone()) {
        let next = match store.read(&current) {
            Ok(metadata) => metadata
                .and_then(|m| m.parent_branch_name)
                .and_then(|raw| BranchName::new(raw).ok()),
            Err(StoreError::Corrupt { .. }) => None,
            Err(e) => return Err(e),
        };
        match next {
            Some(next) if &next == target => return Ok(true),
            Some(next) => current = next,
            None => return Ok(false),
        }
    }
    Ok(false)
}
