//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Opens a [`Workspace`] (repository, config, lock)
//! 2. Loads the validated [`StackEngine`] if it needs the branch graph
//! 3. Formats and displays output
//!
//! Metadata writes go through the workspace's ref store.

mod completion;
mod footer;
mod info;
mod log_cmd;
mod pr;
mod relationships;
mod repo;
mod track;
mod trunk;
mod untrack;
mod validate;

// Re-export command functions for testing and direct invocation
pub use completion::completion;
pub use footer::footer;
pub use info::info;
pub use log_cmd::log;
pub use pr::{pr, PrUpdate};
pub use relationships::{children, parent};
pub use repo::{disable_github, repo_name};
pub use track::track;
pub use trunk::trunk;
pub use untrack::untrack;
pub use validate::validate;

use anyhow::{anyhow, Result};

use crate::cli::args::{Command, RepoAction};
use crate::core::types::BranchName;
use crate::engine::{Context, StackEngine, Workspace};
use crate::ui::output::Verbosity;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Log { all } => log_cmd::log(ctx, all),
        Command::Info { branch } => info::info(ctx, branch.as_deref()),
        Command::Parent { branch } => relationships::parent(ctx, branch.as_deref()),
        Command::Children { branch } => relationships::children(ctx, branch.as_deref()),
        Command::Trunk { set } => trunk::trunk(ctx, set.as_deref()),
        Command::Validate => validate::validate(ctx),
        Command::Track { branch, parent } => track::track(ctx, &branch, &parent),
        Command::Untrack { branch } => untrack::untrack(ctx, &branch),
        Command::Pr {
            branch,
            number,
            url,
            base,
            state,
            title,
            draft,
        } => pr::pr(
            ctx,
            branch.as_deref(),
            PrUpdate {
                number,
                url,
                base,
                state: state.map(Into::into),
                title,
                draft,
            },
        ),
        Command::Footer {
            branch,
            number,
            body_file,
        } => footer::footer(ctx, branch.as_deref(), number, body_file.as_deref()),
        Command::Repo { action } => match action {
            RepoAction::Name { set } => repo::repo_name(ctx, set.as_deref()),
            RepoAction::DisableGithub => repo::disable_github(ctx),
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}

fn verbosity(ctx: &Context) -> Verbosity {
    Verbosity::from_flags(ctx.quiet, ctx.debug)
}

/// The named branch, or the checked-out one.
fn target_branch(engine: &StackEngine, name: Option<&str>) -> Result<BranchName> {
    match name {
        Some(name) => Ok(BranchName::new(name)?),
        None => engine
            .current_branch()
            .cloned()
            .ok_or_else(|| anyhow!("not on any branch; name one explicitly")),
    }
}

/// Open the workspace and load the validated graph.
fn load(ctx: &Context) -> Result<(Workspace, StackEngine)> {
    let workspace = Workspace::open(ctx)?;
    let engine = workspace.load_engine()?;
    Ok((workspace, engine))
}

/// Fail unless `branch` is in the graph.
fn require_known(engine: &StackEngine, branch: &BranchName) -> Result<()> {
    if engine.record(branch).is_none() {
        return Err(crate::engine::EngineError::UnknownBranch(branch.clone()).into());
    }
    Ok(())
}
