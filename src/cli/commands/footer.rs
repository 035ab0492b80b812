//! footer command - Render the PR dependency tree

use std::path::Path;

use anyhow::{Context as _, Result};

use super::{load, require_known, target_branch};
use crate::engine::Context;
use crate::ui::output;
use crate::ui::pr_footer::{generate_footer, merge_footer};

/// Print the footer for a branch, or `body_file` with the footer merged in.
pub fn footer(
    ctx: &Context,
    branch: Option<&str>,
    number: Option<u64>,
    body_file: Option<&Path>,
) -> Result<()> {
    let (workspace, engine) = load(ctx)?;
    let branch = target_branch(&engine, branch)?;
    require_known(&engine, &branch)?;

    let footer = generate_footer(
        &engine,
        &branch,
        number,
        workspace.config().footer_attribution(),
    )?;

    let rendered = match body_file {
        Some(path) => {
            let body = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            merge_footer(Some(&body), &footer)
        }
        None => footer,
    };
    output::data(rendered);
    Ok(())
}
