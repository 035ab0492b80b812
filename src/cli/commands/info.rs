//! info command - Show a branch's validated record

use anyhow::Result;

use super::{load, require_known, target_branch};
use crate::core::types::BranchName;
use crate::engine::{Context, StackEngine};
use crate::ui::output;

/// Print status, revisions, relationships and PR details for a branch.
pub fn info(ctx: &Context, branch: Option<&str>) -> Result<()> {
    let (_workspace, engine) = load(ctx)?;
    let branch = target_branch(&engine, branch)?;
    require_known(&engine, &branch)?;

    for line in describe(&engine, &branch) {
        output::data(line);
    }
    Ok(())
}

fn describe(engine: &StackEngine, branch: &BranchName) -> Vec<String> {
    let Some(record) = engine.record(branch) else {
        return Vec::new();
    };

    let mut lines = vec![
        format!("branch:          {branch}"),
        format!("status:          {}", record.status()),
        format!("revision:        {}", record.branch_revision()),
    ];
    if let Some(parent) = record.parent_branch_name() {
        lines.push(format!("parent:          {parent}"));
    }
    if let Some(revision) = record.parent_branch_revision() {
        lines.push(format!("parent revision: {revision}"));
    }
    if !record.children().is_empty() {
        let children: Vec<&str> = record.children().iter().map(BranchName::as_str).collect();
        lines.push(format!("children:        {}", children.join(", ")));
    }
    if let Some(pr) = record.pr_info() {
        let mut summary = pr
            .number
            .map(|n| format!("#{n}"))
            .unwrap_or_else(|| "(no number)".to_string());
        if let Some(state) = pr.state {
            summary.push_str(&format!(" {state}"));
        }
        if pr.is_draft == Some(true) {
            summary.push_str(" draft");
        }
        if let Some(title) = &pr.title {
            summary.push_str(&format!(" \"{title}\""));
        }
        lines.push(format!("pr:              {summary}"));
        if let Some(url) = &pr.url {
            lines.push(format!("pr url:          {url}"));
        }
    }
    lines
}
