//! validate command - Run the validator and check graph invariants

use anyhow::{bail, Result};

use super::{load, verbosity};
use crate::core::graph::ValidationStatus;
use crate::core::types::BranchName;
use crate::core::verify::{verify_ancestry, verify_graph};
use crate::engine::Context;
use crate::ui::output;

const STATUSES: [ValidationStatus; 5] = [
    ValidationStatus::Trunk,
    ValidationStatus::Valid,
    ValidationStatus::BadParentName,
    ValidationStatus::InvalidParent,
    ValidationStatus::BadParentRevision,
];

/// Validate, report what was repaired or cleaned up, then verify.
pub fn validate(ctx: &Context) -> Result<()> {
    let (workspace, engine) = load(ctx)?;
    let verbosity = verbosity(ctx);
    let report = engine.report();

    let state = workspace.git().state();
    if state.is_in_progress() {
        output::warn(
            format!("a {state} is in progress; branch tips may still move"),
            verbosity,
        );
    }

    for branch in &report.pruned {
        output::print(format!("Removed metadata for deleted branch '{branch}'"), verbosity);
    }
    for repair in &report.repaired {
        let from = repair
            .from
            .as_ref()
            .map(|oid| oid.short(7).to_string())
            .unwrap_or_else(|| "(none)".to_string());
        output::print(
            format!(
                "Updated parent revision of '{}' ({}): {} -> {}",
                repair.branch,
                repair.kind.as_str(),
                from,
                repair.to.short(7)
            ),
            verbosity,
        );
    }
    for branch in &report.corrupt {
        output::warn(format!("metadata for '{branch}' is unreadable"), verbosity);
    }

    let branches: Vec<BranchName> = workspace
        .git()
        .branch_tips()?
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    let result = verify_graph(engine.graph(), &branches)
        .merge(verify_ancestry(engine.graph(), workspace.git())?);
    if !result.ok {
        for error in &result.errors {
            output::error(error);
        }
        bail!("{} invariant violation(s) in the validated graph", result.errors.len());
    }

    let counts: Vec<String> = STATUSES
        .iter()
        .filter_map(|&status| {
            let count = engine.branches_with_status(status).len();
            (count > 0).then(|| format!("{count} {}", status.as_str()))
        })
        .collect();
    output::success(
        format!("{} branches validated: {}", engine.graph().len(), counts.join(", ")),
        verbosity,
    );
    Ok(())
}
