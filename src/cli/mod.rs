//! cli
//!
//! Command-line interface layer for trellis.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Delegate to command handlers
//! - Render errors for the terminal
//!
//! The CLI layer is thin. Handlers open a [`crate::engine::Workspace`],
//! load the validated graph and format what they find.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use anyhow::Result;

use crate::engine::{self, EngineError, ValidateError};
use crate::ui::output;

/// Run a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = engine::Context {
        cwd: cli.cwd.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
    };
    commands::dispatch(cli.command, &ctx)
}

/// Print `err` and its causes, plus recovery steps for a metadata cycle.
pub fn report_error(err: &anyhow::Error) {
    output::error(format!("{err:#}"));

    let cycle = err.chain().find_map(|cause| {
        let validate = cause.downcast_ref::<ValidateError>().or_else(|| {
            match cause.downcast_ref::<EngineError>() {
                Some(EngineError::Validate(inner)) => Some(inner),
                _ => None,
            }
        });
        match validate {
            Some(ValidateError::CycleDetected { unresolved }) => Some(unresolved),
            _ => None,
        }
    });
    if let Some(unresolved) = cycle {
        eprintln!("branches whose parents could not be resolved:");
        eprintln!("{}", output::format_list(unresolved, "  "));
        eprintln!("repair the metadata by hand, for example:");
        eprintln!("  trl untrack <branch>");
        eprintln!("  trl track <branch> --parent <parent>");
    }
}
