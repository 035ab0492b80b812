//! log command - Display the validated branch tree

use anyhow::Result;

use super::{load, verbosity};
use crate::core::graph::ValidationStatus;
use crate::core::types::BranchName;
use crate::engine::{Context, StackEngine};
use crate::ui::output;

/// Print the tree rooted at trunk, and with `all` every detached subtree.
pub fn log(ctx: &Context, all: bool) -> Result<()> {
    let (_workspace, engine) = load(ctx)?;
    let verbosity = verbosity(ctx);

    for line in render_tree(&engine, engine.trunk()) {
        output::data(line);
    }

    let detached = engine.branches_with_status(ValidationStatus::BadParentName);
    if detached.is_empty() {
        return Ok(());
    }

    if all {
        output::data("");
        output::data("Not connected to trunk:");
        for root in detached {
            for line in render_tree(&engine, root) {
                output::data(line);
            }
        }
    } else {
        output::print(
            format!(
                "\n{} branch(es) not connected to trunk; see `trl log --all`",
                detached.len()
            ),
            verbosity,
        );
    }
    Ok(())
}

/// One line per branch under `root`, depth first.
pub(crate) fn render_tree(engine: &StackEngine, root: &BranchName) -> Vec<String> {
    engine
        .graph()
        .walk(root)
        .into_iter()
        .map(|(depth, branch)| render_line(engine, depth, &branch))
        .collect()
}

fn render_line(engine: &StackEngine, depth: usize, branch: &BranchName) -> String {
    let cursor = if engine.current_branch() == Some(branch) {
        "* "
    } else {
        "  "
    };
    let mut line = format!("{cursor}{}{branch}", "  ".repeat(depth));

    if let Some(number) = engine.get_pr_info(branch).and_then(|pr| pr.number) {
        line.push_str(&format!(" #{number}"));
    }
    if let Some(status) = engine.record(branch).map(|r| r.status()) {
        if !status.is_valid_parent() {
            line.push_str(&format!(" ({})", status.describe()));
        }
    }
    if engine.rebase_head() == Some(branch) {
        line.push_str(" (rebasing)");
    }
    line
}
