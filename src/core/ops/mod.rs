//! core::ops
//!
//! Process-level coordination around repository mutation.
//!
//! - [`lock`] - exclusive per-repository lock held for a whole command

pub mod lock;

pub use lock::{LockError, RepoLock};
