//! trunk command - Display or set the trunk branch

use anyhow::{bail, Result};

use super::verbosity;
use crate::core::types::{BranchName, RefName};
use crate::engine::{Context, EngineError, Workspace};
use crate::ui::output;

/// Display or set the trunk branch.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `set` - If provided, set trunk to this branch
pub fn trunk(ctx: &Context, set: Option<&str>) -> Result<()> {
    let mut workspace = Workspace::open(ctx)?;

    let Some(new_trunk) = set else {
        output::data(workspace.trunk()?);
        return Ok(());
    };

    let new_trunk = BranchName::new(new_trunk)?;
    let refname = RefName::for_branch(&new_trunk);
    if workspace.git().try_resolve_ref(refname.as_str())?.is_none() {
        bail!(EngineError::UnknownBranch(new_trunk));
    }

    let mut repo = workspace.config().repo.clone();
    repo.trunk = Some(new_trunk.to_string());
    workspace.save_repo_config(repo)?;

    output::success(format!("Trunk set to '{new_trunk}'"), verbosity(ctx));
    Ok(())
}
