//! core::metadata
//!
//! Per-branch parent links and PR details.
//!
//! - [`schema`] - the stored JSON document
//! - [`store`] - the storage interface and its git-ref implementation
//! - [`memory`] - an in-memory store

pub mod memory;
pub mod schema;
pub mod store;

pub use memory::InMemoryMetadataStore;
pub use schema::{parse_metadata, BranchMetadata, MetadataError, PrInfo, PrState, ReviewDecision};
pub use store::{MetadataStore, RefMetadataStore, StoreError};
