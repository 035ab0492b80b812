//! repo command - Hosting repository settings

use anyhow::{anyhow, bail, Result};

use super::verbosity;
use crate::core::config::GithubRepoConfig;
use crate::engine::{Context, Workspace};
use crate::ui::output;

/// Show the hosting repository, or override it with `OWNER/NAME`.
pub fn repo_name(ctx: &Context, set: Option<&str>) -> Result<()> {
    let mut workspace = Workspace::open(ctx)?;

    let Some(spec) = set else {
        if !workspace.config().github_enabled() {
            bail!("GitHub integration is disabled for this repository");
        }
        let (owner, name) = workspace
            .github_repo()?
            .ok_or_else(|| anyhow!("hosting repository unknown; set it with `trl repo name --set OWNER/NAME`"))?;
        output::data(format!("{owner}/{name}"));
        return Ok(());
    };

    let (owner, name) = spec
        .split_once('/')
        .filter(|(owner, name)| !owner.is_empty() && !name.is_empty())
        .ok_or_else(|| anyhow!("expected OWNER/NAME, got '{spec}'"))?;

    let mut repo = workspace.config().repo.clone();
    let github = repo.github.get_or_insert_with(GithubRepoConfig::default);
    github.owner = Some(owner.to_string());
    github.name = Some(name.to_string());
    workspace.save_repo_config(repo)?;

    output::success(format!("Hosting repository set to {owner}/{name}"), verbosity(ctx));
    Ok(())
}

/// Turn off hosting integration for this repository.
pub fn disable_github(ctx: &Context) -> Result<()> {
    let mut workspace = Workspace::open(ctx)?;
    let mut repo = workspace.config().repo.clone();
    repo.github.get_or_insert_with(GithubRepoConfig::default).enabled = Some(false);
    workspace.save_repo_config(repo)?;

    output::success("GitHub integration disabled", verbosity(ctx));
    Ok(())
}
