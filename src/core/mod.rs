//! core
//!
//! Core domain types, schemas, and operations for trellis.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, Oid, RefName, Fingerprint
//! - [`graph`] - Validated branch graph and traversal
//! - [`ancestry`] - Commit ancestry queries
//! - [`verify`] - Invariant checks over a validated graph
//! - [`ops`] - Repository locking
//! - [`metadata`] - Branch metadata schema and storage
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Where trellis keeps per-repository files

pub mod ancestry;
pub mod config;
pub mod graph;
pub mod metadata;
pub mod ops;
pub mod paths;
pub mod types;
pub mod verify;
