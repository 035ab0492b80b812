//! pr command - Show or update a branch's PR information

use anyhow::Result;

use super::{load, require_known, target_branch, verbosity};
use crate::core::metadata::{PrInfo, PrState};
use crate::engine::Context;
use crate::ui::output;

/// Fields to change; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct PrUpdate {
    pub number: Option<u64>,
    pub url: Option<String>,
    pub base: Option<String>,
    pub state: Option<PrState>,
    pub title: Option<String>,
    pub draft: Option<bool>,
}

impl PrUpdate {
    fn is_empty(&self) -> bool {
        self.number.is_none()
            && self.url.is_none()
            && self.base.is_none()
            && self.state.is_none()
            && self.title.is_none()
            && self.draft.is_none()
    }

    fn into_pr_info(self) -> PrInfo {
        PrInfo {
            number: self.number,
            url: self.url,
            base: self.base,
            state: self.state,
            title: self.title,
            is_draft: self.draft,
            ..Default::default()
        }
    }
}

/// With no update, print the stored PR info as JSON. Otherwise merge the
/// update into it.
pub fn pr(ctx: &Context, branch: Option<&str>, update: PrUpdate) -> Result<()> {
    let (workspace, engine) = load(ctx)?;
    let branch = target_branch(&engine, branch)?;
    require_known(&engine, &branch)?;

    if update.is_empty() {
        match engine.get_pr_info(&branch) {
            Some(pr_info) => output::data(serde_json::to_string_pretty(pr_info)?),
            None => output::print(format!("'{branch}' has no PR info"), verbosity(ctx)),
        }
        return Ok(());
    }

    let merged = engine
        .get_pr_info(&branch)
        .cloned()
        .unwrap_or_default()
        .merged_with(update.into_pr_info());
    engine.upsert_pr_info(&mut workspace.store(), &branch, merged)?;

    output::success(format!("Updated PR info for '{branch}'"), verbosity(ctx));
    Ok(())
}
