//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::metadata::PrState;

/// trellis - validated stacked branches
#[derive(Parser, Debug)]
#[command(name = "trl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if trl was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Display branches as a stack tree
    #[command(
        name = "log",
        long_about = "Display the validated branch tree rooted at trunk.\n\n\
            Every branch is validated first, so parent revisions that went stale \
            after a rebase or new commits are repaired before anything is shown. \
            Branches whose parent link is broken are annotated with the reason. \
            The current branch is marked with an asterisk (*).",
        after_help = "\
WORKFLOW EXAMPLES:
    # See the stacks hanging off trunk
    trl log

    # Also list branches that are not connected to trunk
    trl log --all"
    )]
    Log {
        /// Also show branches outside the trunk tree
        #[arg(long)]
        all: bool,
    },

    /// Show the validated record for a branch
    Info {
        /// Branch to describe (defaults to current)
        branch: Option<String>,
    },

    /// Print a branch's parent
    Parent {
        /// Branch to query (defaults to current)
        branch: Option<String>,
    },

    /// Print a branch's children
    Children {
        /// Branch to query (defaults to current)
        branch: Option<String>,
    },

    /// Show or set the trunk branch
    Trunk {
        /// Make this branch the trunk
        #[arg(long, value_name = "BRANCH")]
        set: Option<String>,
    },

    /// Validate and repair branch metadata
    #[command(
        name = "validate",
        long_about = "Validate every branch against its recorded parent.\n\n\
            Deletes metadata for branches that no longer exist, advances parent \
            revisions that can be safely moved forward, and then checks the \
            resulting graph's invariants. Exits non-zero if the metadata \
            contains a parent cycle or an invariant does not hold.",
        after_help = "\
WORKFLOW EXAMPLES:
    # After a rebase outside trl
    trl validate

FIXING A CYCLE:
    trl untrack <branch>
    trl track <branch> --parent <parent>"
    )]
    Validate,

    /// Record a branch's parent
    #[command(
        name = "track",
        long_about = "Start tracking a branch on top of a parent.\n\n\
            The parent revision is recorded as the merge base of the two \
            branches. Existing PR information for the branch is kept.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Stack feature-b on feature-a
    trl track feature-b --parent feature-a

    # Re-parent onto trunk
    trl track feature-b --parent main"
    )]
    Track {
        /// Branch to track
        branch: String,

        /// Parent branch
        #[arg(long)]
        parent: String,
    },

    /// Delete a branch's metadata
    Untrack {
        /// Branch to untrack
        branch: String,
    },

    /// Show or update a branch's PR information
    #[command(
        name = "pr",
        after_help = "\
WORKFLOW EXAMPLES:
    # Show PR info for the current branch
    trl pr

    # Record a freshly opened PR
    trl pr feature-a --number 42 --url https://github.com/acme/widgets/pull/42 --state open"
    )]
    Pr {
        /// Branch (defaults to current)
        branch: Option<String>,

        #[arg(long)]
        number: Option<u64>,

        #[arg(long)]
        url: Option<String>,

        /// Base branch of the PR
        #[arg(long)]
        base: Option<String>,

        #[arg(long, value_enum)]
        state: Option<PrStateArg>,

        #[arg(long)]
        title: Option<String>,

        #[arg(long, value_name = "BOOL")]
        draft: Option<bool>,
    },

    /// Print the PR dependency tree footer for a branch
    #[command(
        name = "footer",
        long_about = "Render the PR dependency tree for a branch's stack.\n\n\
            With --body-file, the footer is merged into that PR description: an \
            existing tree is replaced, otherwise it is appended.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Footer for the current branch
    trl footer

    # The PR was just created and its number is not recorded yet
    trl footer feature-b --number 43

    # Update a description in place
    trl footer --body-file body.md > new-body.md"
    )]
    Footer {
        /// Branch (defaults to current)
        branch: Option<String>,

        /// PR number to use for the branch itself
        #[arg(long)]
        number: Option<u64>,

        /// Existing PR description to merge the footer into
        #[arg(long, value_name = "FILE")]
        body_file: Option<PathBuf>,
    },

    /// Repository hosting settings
    Repo {
        #[command(subcommand)]
        action: RepoAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
INSTALLATION:
    # Bash
    trl completion bash >> ~/.bashrc

    # Zsh
    trl completion zsh > ~/.zfunc/_trl

    # Fish
    trl completion fish > ~/.config/fish/completions/trl.fish

    # PowerShell
    trl completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum RepoAction {
    /// Show or set the hosting repository as OWNER/NAME
    Name {
        #[arg(long, value_name = "OWNER/NAME")]
        set: Option<String>,
    },
    /// Turn off hosting integration for this repository
    DisableGithub,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrStateArg {
    Open,
    Closed,
    Merged,
}

impl From<PrStateArg> for PrState {
    fn from(arg: PrStateArg) -> Self {
        match arg {
            PrStateArg::Open => PrState::Open,
            PrStateArg::Closed => PrState::Closed,
            PrStateArg::Merged => PrState::Merged,
        }
    }
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}
