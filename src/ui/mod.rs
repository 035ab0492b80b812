//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`output`] - Verbosity-aware printing
//! - [`pr_footer`] - PR dependency tree for pull request descriptions

pub mod output;
pub mod pr_footer;
