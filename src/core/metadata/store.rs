//! core::metadata::store
//!
//! Where branch metadata lives.
//!
//! [`MetadataStore`] is the read/write/delete interface validation needs.
//! [`RefMetadataStore`] keeps each document as a blob behind
//! `refs/branch-metadata/<branch>`; writes are compare-and-swap against the
//! blob the ref pointed at when it was last looked at, so a concurrent
//! external edit surfaces as [`StoreError::CasFailed`] instead of being lost.
//!
//! ```ignore
//! use trellis::core::metadata::{BranchMetadata, MetadataStore, RefMetadataStore};
//!
//! let git = Git::open(Path::new("."))?;
//! let mut store = RefMetadataStore::new(&git);
//! store.write(&branch, &BranchMetadata::default().with_parent(&main, &base))?;
//! ```

use thiserror::Error;

use super::schema::{parse_metadata, BranchMetadata, MetadataError};
use crate::core::types::{BranchName, Fingerprint, Oid, RefName};
use crate::git::{Git, GitError};

/// Errors from metadata storage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The stored document exists but cannot be parsed.
    #[error("corrupt metadata for '{branch}': {source}")]
    Corrupt {
        branch: BranchName,
        #[source]
        source: MetadataError,
    },

    #[error("metadata ref for '{branch}' changed concurrently: expected {expected}, found {actual}")]
    CasFailed {
        branch: BranchName,
        expected: String,
        actual: String,
    },

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Git(#[from] GitError),
}

/// Keyed storage of [`BranchMetadata`].
///
/// `write` is an upsert that replaces the whole document; `delete` of a
/// missing entry is a no-op.
pub trait MetadataStore {
    fn read(&self, branch: &BranchName) -> Result<Option<BranchMetadata>, StoreError>;

    fn write(&mut self, branch: &BranchName, metadata: &BranchMetadata) -> Result<(), StoreError>;

    fn delete(&mut self, branch: &BranchName) -> Result<(), StoreError>;
}

/// Metadata stored as JSON blobs behind `refs/branch-metadata/<branch>`.
pub struct RefMetadataStore<'a> {
    git: &'a Git,
}

impl<'a> RefMetadataStore<'a> {
    pub fn new(git: &'a Git) -> Self {
        Self { git }
    }

    fn blob_for(&self, branch: &BranchName) -> Result<Option<Oid>, StoreError> {
        Ok(self
            .git
            .try_resolve_ref_to_object(RefName::for_metadata(branch).as_str())?)
    }

    /// Branches that currently have a metadata ref.
    pub fn list(&self) -> Result<Vec<BranchName>, StoreError> {
        Ok(self
            .git
            .list_metadata_refs()?
            .into_iter()
            .map(|(branch, _)| branch)
            .collect())
    }

    /// Hash over every metadata ref and the blob it points at.
    ///
    /// Equal fingerprints before and after an operation mean it wrote nothing.
    pub fn fingerprint(&self) -> Result<Fingerprint, StoreError> {
        let refs: Vec<(RefName, Oid)> = self
            .git
            .list_metadata_refs()?
            .into_iter()
            .map(|(branch, blob)| (RefName::for_metadata(&branch), blob))
            .collect();
        Ok(Fingerprint::compute(&refs))
    }

    fn cas_error(branch: &BranchName, err: GitError) -> StoreError {
        match err {
            GitError::CasFailed {
                expected, actual, ..
            } => StoreError::CasFailed {
                branch: branch.clone(),
                expected,
                actual,
            },
            other => StoreError::Git(other),
        }
    }
}

impl MetadataStore for RefMetadataStore<'_> {
    fn read(&self, branch: &BranchName) -> Result<Option<BranchMetadata>, StoreError> {
        let Some(blob) = self.blob_for(branch)? else {
            return Ok(None);
        };
        let json = match self.git.read_blob_as_string(&blob) {
            Ok(json) => json,
            Err(e @ (GitError::InvalidUtf8 { .. } | GitError::NotABlob { .. })) => {
                return Err(StoreError::Corrupt {
                    branch: branch.clone(),
                    source: MetadataError::Unreadable(e.to_string()),
                })
            }
            Err(e) => return Err(e.into()),
        };
        parse_metadata(&json)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                branch: branch.clone(),
                source,
            })
    }

    fn write(&mut self, branch: &BranchName, metadata: &BranchMetadata) -> Result<(), StoreError> {
        let refname = RefName::for_metadata(branch);
        let previous = self.blob_for(branch)?;
        let blob = self.git.write_blob(metadata.to_json()?.as_bytes())?;
        if previous.as_ref() == Some(&blob) {
            return Ok(());
        }
        self.git
            .update_ref_cas(
                refname.as_str(),
                &blob,
                previous.as_ref(),
                &format!("trellis: update metadata for {branch}"),
            )
            .map_err(|e| Self::cas_error(branch, e))
    }

    fn delete(&mut self, branch: &BranchName) -> Result<(), StoreError> {
        let Some(previous) = self.blob_for(branch)? else {
            return Ok(());
        };
        self.git
            .delete_ref_cas(RefName::for_metadata(branch).as_str(), &previous)
            .map_err(|e| Self::cas_error(branch, e))
    }
}
