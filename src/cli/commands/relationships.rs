//! parent and children commands - Simple relationship queries

use anyhow::Result;

use super::{load, require_known, target_branch};
use crate::engine::Context;
use crate::ui::output;

/// Print the parent branch name.
///
/// Outputs nothing (exit 0) for trunk and for branches without a usable
/// parent.
pub fn parent(ctx: &Context, branch: Option<&str>) -> Result<()> {
    let (_workspace, engine) = load(ctx)?;
    let branch = target_branch(&engine, branch)?;
    require_known(&engine, &branch)?;

    if let Some(parent) = engine.get_parent(&branch) {
        output::data(parent);
    }
    Ok(())
}

/// Print child branch names, one per line.
pub fn children(ctx: &Context, branch: Option<&str>) -> Result<()> {
    let (_workspace, engine) = load(ctx)?;
    let branch = target_branch(&engine, branch)?;
    require_known(&engine, &branch)?;

    for child in engine.get_children(&branch) {
        output::data(child);
    }
    Ok(())
}
