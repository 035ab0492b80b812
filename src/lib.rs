//! trellis - validated branch graphs for stacked development
//!
//! Stacked-branch tools record, for each branch, which branch it was built
//! on and at which commit. Those records go stale whenever history moves
//! underneath them. trellis reads them back into a validated graph: every
//! local branch gets a status, parent revisions that can be safely advanced
//! are repaired in place, and metadata for deleted branches is removed.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Seed collection, validation, repair and graph queries
//! - [`core`] - Domain types, metadata, config, verification
//! - [`git`] - Single interface for all Git operations
//! - [`ui`] - Output and PR footer rendering
//!
//! # Correctness Invariants
//!
//! After validation:
//!
//! 1. Exactly one record, the trunk's, has status `TRUNK`
//! 2. Every child list entry names its parent back
//! 3. A `VALID` branch's parent revision is an ancestor of its tip
//! 4. A branch under a parent that is neither trunk nor valid is `INVALID_PARENT`
//! 5. Every local branch has exactly one record

pub mod cli;
pub mod core;
pub mod engine;
pub mod git;
pub mod ui;
