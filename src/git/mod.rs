//! git
//!
//! The only module that talks to `git2`.
//!
//! Everything else sees repositories through [`Git`] and the strong types in
//! [`crate::core::types`]. Ref mutations are compare-and-swap, and all
//! failures come back as [`GitError`].

mod interface;

pub use interface::{Git, GitError, GitState, RefEntry, RepoInfo};
