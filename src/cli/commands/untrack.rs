//! untrack command - Delete a branch's metadata

use anyhow::Result;

use super::verbosity;
use crate::core::metadata::{MetadataStore, RefMetadataStore, StoreError};
use crate::core::types::BranchName;
use crate::engine::{Context, EngineError, Workspace};
use crate::ui::output;

/// Remove `branch`'s metadata. Its children stay tracked but become
/// invalid until re-parented.
///
/// Works on the raw metadata refs without validating the graph, so it can
/// break a parent cycle that validation rejects.
pub fn untrack(ctx: &Context, branch: &str) -> Result<()> {
    let workspace = Workspace::open(ctx)?;
    let branch = BranchName::new(branch)?;
    let verbosity = verbosity(ctx);

    let mut store = workspace.store();
    let tracked = match store.read(&branch) {
        Ok(metadata) => metadata.is_some(),
        Err(StoreError::Corrupt { .. }) => true,
        Err(e) => return Err(e.into()),
    };
    if !tracked {
        return Err(EngineError::NotTracked(branch).into());
    }
    store.delete(&branch)?;

    let children = recorded_children(&store, &branch)?;
    if !children.is_empty() {
        output::warn(
            format!(
                "'{branch}' still has children that now need a new parent:\n{}",
                output::format_list(&children, "  ")
            ),
            verbosity,
        );
    }
    output::success(format!("Untracked '{branch}'"), verbosity);
    Ok(())
}

/// Branches whose stored metadata names `parent`, sorted.
fn recorded_children(
    store: &RefMetadataStore<'_>,
    parent: &BranchName,
) -> Result<Vec<BranchName>, StoreError> {
    let mut children = Vec::new();
    for name in store.list()? {
        let names_parent = match store.read(&name) {
            Ok(metadata) => metadata
                .and_then(|m| m.parent_branch_name)
                .is_some_and(|raw| raw == parent.as_str()),
            Err(StoreError::Corrupt { .. }) => false,
            Err(e) => return Err(e),
        };
        if names_parent {
            children.push(name);
        }
    }
    children.sort();
    Ok(children)
}
