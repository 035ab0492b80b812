//! core::metadata::memory
//!
//! A [`MetadataStore`] held in a map, for exercising validation without a
//! repository. Counts mutations so callers can assert that a run wrote
//! nothing.

use std::collections::BTreeMap;

use super::schema::{parse_metadata, BranchMetadata};
use super::store::{MetadataStore, StoreError};
use crate::core::types::BranchName;

#[derive(Debug, Clone)]
enum Slot {
    Parsed(BranchMetadata),
    Raw(String),
}

/// In-memory metadata store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetadataStore {
    entries: BTreeMap<BranchName, Slot>,
    writes: usize,
    deletes: usize,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry without counting it as a write.
    pub fn insert(&mut self, branch: BranchName, metadata: BranchMetadata) {
        self.entries.insert(branch, Slot::Parsed(metadata));
    }

    /// Seed an entry whose stored text is `raw`, parsed on read.
    pub fn insert_raw(&mut self, branch: BranchName, raw: impl Into<String>) {
        self.entries.insert(branch, Slot::Raw(raw.into()));
    }

    pub fn contains(&self, branch: &BranchName) -> bool {
        self.entries.contains_key(branch)
    }

    pub fn names(&self) -> Vec<BranchName> {
        self.entries.keys().cloned().collect()
    }

    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn deletes(&self) -> usize {
        self.deletes
    }

    pub fn reset_counters(&mut self) {
        self.writes = 0;
        self.deletes = 0;
    }
}

impl MetadataStore for InMemoryMetadataStore {
    fn read(&self, branch: &BranchName) -> Result<Option<BranchMetadata>, StoreError> {
        match self.entries.get(branch) {
            None => Ok(None),
            Some(Slot::Parsed(meta)) => Ok(Some(meta.clone())),
            Some(Slot::Raw(raw)) => parse_metadata(raw).map(Some).map_err(|source| {
                StoreError::Corrupt {
                    branch: branch.clone(),
                    source,
                }
            }),
        }
    }

    fn write(&mut self, branch: &BranchName, metadata: &BranchMetadata) -> Result<(), StoreError> {
        self.writes += 1;
        self.entries
            .insert(branch.clone(), Slot::Parsed(metadata.clone()));
        Ok(())
    }

    fn delete(&mut self, branch: &BranchName) -> Result<(), StoreError> {
        if self.entries.remove(branch).is_some() {
            self.deletes += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> BranchName {
        BranchName::new(s).unwrap()
    }

    #[test]
    fn seeding_does_not_count() {
        let mut store = InMemoryMetadataStore::new();
        store.insert(name("a"), BranchMetadata::default());
        assert_eq!(store.writes(), 0);
        assert!(store.read(&name("a")).unwrap().is_some());
    }

    #[test]
    fn write_replaces_and_counts() {
        let mut store = InMemoryMetadataStore::new();
        let meta = BranchMetadata {
            parent_branch_name: Some("main".into()),
            ..Default::default()
        };
        store.write(&name("a"), &meta).unwrap();
        store.write(&name("a"), &BranchMetadata::default()).unwrap();
        assert_eq!(store.writes(), 2);
        assert_eq!(store.read(&name("a")).unwrap(), Some(BranchMetadata::default()));
    }

    #[test]
    fn delete_missing_is_a_no_op() {
        let mut store = InMemoryMetadataStore::new();
        store.delete(&name("ghost")).unwrap();
        assert_eq!(store.deletes(), 0);
    }

    #[test]
    fn raw_entries_parse_on_read() {
        let mut store = InMemoryMetadataStore::new();
        store.insert_raw(name("ok"), r#"{"parentBranchName":"main"}"#);
        store.insert_raw(name("bad"), "not json");

        let ok = store.read(&name("ok")).unwrap().unwrap();
        assert_eq!(ok.parent_branch_name.as_deref(), Some("main"));
        assert!(matches!(
            store.read(&name("bad")),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
