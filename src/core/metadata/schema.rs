//! core::metadata::schema
//!
//! The JSON document stored for each tracked branch.
//!
//! The layout is camelCase and shared with other stacked-branch tools that
//! keep metadata under `refs/branch-metadata/`, so fields are tolerant:
//! unknown keys are ignored and the parent fields are kept as raw strings.
//! Whether a parent name refers to a real branch, or a revision is a real
//! commit, is decided during validation, not during parsing.
//!
//! ```
//! use trellis::core::metadata::schema::{parse_metadata, BranchMetadata};
//! use trellis::core::types::{BranchName, Oid};
//!
//! let meta = BranchMetadata::default()
//!     .with_parent(&BranchName::new("main").unwrap(), &Oid::new("a".repeat(40)).unwrap());
//! let parsed = parse_metadata(&meta.to_json().unwrap()).unwrap();
//! assert_eq!(parsed.parent_branch_name.as_deref(), Some("main"));
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{BranchName, Oid};

/// Errors from metadata (de)serialization.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to parse metadata: {0}")]
    Parse(String),

    #[error("failed to serialize metadata: {0}")]
    Serialize(String),

    /// The ref points at something that is not a UTF-8 blob.
    #[error("unreadable metadata document: {0}")]
    Unreadable(String),
}

/// Pull request state as reported by the hosting service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrState {
    Open,
    Closed,
    Merged,
}

impl std::fmt::Display for PrState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PrState::Open => "OPEN",
            PrState::Closed => "CLOSED",
            PrState::Merged => "MERGED",
        })
    }
}

/// Review decision on a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewDecision {
    Approved,
    ReviewRequired,
    ChangesRequested,
}

/// Pull request details recorded for a branch.
///
/// Passed through untouched by validation; every field is optional because
/// the record may have been written by an older or different tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<PrState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_decision: Option<ReviewDecision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_draft: Option<bool>,
}

impl PrInfo {
    /// Fields set in `update` replace the ones here.
    pub fn merged_with(mut self, update: PrInfo) -> PrInfo {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if update.$field.is_some() { self.$field = update.$field; })*
            };
        }
        take!(number, url, base, state, title, body, review_decision, is_draft);
        self
    }
}

/// Metadata for one branch.
///
/// Writes always replace the whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_branch_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_branch_revision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_info: Option<PrInfo>,
}

impl BranchMetadata {
    pub fn with_parent(mut self, name: &BranchName, revision: &Oid) -> Self {
        self.parent_branch_name = Some(name.to_string());
        self.parent_branch_revision = Some(revision.to_string());
        self
    }

    pub fn with_parent_revision(mut self, revision: &Oid) -> Self {
        self.parent_branch_revision = Some(revision.to_string());
        self
    }

    pub fn with_pr_info(mut self, pr_info: Option<PrInfo>) -> Self {
        self.pr_info = pr_info;
        self
    }

    /// Recorded parent revision, if present and well formed.
    pub fn parent_revision(&self) -> Option<Oid> {
        self.parent_branch_revision
            .as_deref()
            .and_then(Oid::parse_lenient)
    }

    pub fn to_json(&self) -> Result<String, MetadataError> {
        serde_json::to_string(self).map_err(|e| MetadataError::Serialize(e.to_string()))
    }
}

/// Parse a metadata document.
pub fn parse_metadata(json: &str) -> Result<BranchMetadata, MetadataError> {
    serde_json::from_str(json).map_err(|e| MetadataError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_document() {
        let json = r#"{
            "parentBranchName": "main",
            "parentBranchRevision": "abc123def4567890abc123def4567890abc12345",
            "prInfo": {
                "number": 42,
                "url": "https://github.com/o/r/pull/42",
                "base": "main",
                "state": "OPEN",
                "title": "Add thing",
                "reviewDecision": "REVIEW_REQUIRED",
                "isDraft": false
            }
        }"#;

        let meta = parse_metadata(json).unwrap();
        assert_eq!(meta.parent_branch_name.as_deref(), Some("main"));
        assert!(meta.parent_revision().is_some());
        let pr = meta.pr_info.unwrap();
        assert_eq!(pr.number, Some(42));
        assert_eq!(pr.state, Some(PrState::Open));
        assert_eq!(pr.review_decision, Some(ReviewDecision::ReviewRequired));
        assert_eq!(pr.is_draft, Some(false));
    }

    #[test]
    fn empty_object_is_empty_metadata() {
        assert_eq!(parse_metadata("{}").unwrap(), BranchMetadata::default());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let meta = parse_metadata(r#"{"parentBranchName":"a","somethingNew":[1,2]}"#).unwrap();
        assert_eq!(meta.parent_branch_name.as_deref(), Some("a"));
    }

    #[test]
    fn garbage_revision_reads_as_absent() {
        let meta = parse_metadata(r#"{"parentBranchName":"a","parentBranchRevision":"nope"}"#)
            .unwrap();
        assert_eq!(meta.parent_revision(), None);
        assert_eq!(meta.parent_branch_revision.as_deref(), Some("nope"));
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(parse_metadata("{"), Err(MetadataError::Parse(_))));
        assert!(parse_metadata("[]").is_err());
    }

    #[test]
    fn serializes_camel_case_without_nulls() {
        let meta = BranchMetadata::default().with_parent(
            &BranchName::new("main").unwrap(),
            &Oid::new("b".repeat(40)).unwrap(),
        );
        let json = meta.to_json().unwrap();
        assert!(json.contains("\"parentBranchName\":\"main\""));
        assert!(json.contains("parentBranchRevision"));
        assert!(!json.contains("prInfo"));
    }

    #[test]
    fn pr_info_merge_keeps_unset_fields() {
        let base = PrInfo {
            number: Some(7),
            title: Some("old".into()),
            ..Default::default()
        };
        let merged = base.merged_with(PrInfo {
            title: Some("new".into()),
            is_draft: Some(true),
            ..Default::default()
        });
        assert_eq!(merged.number, Some(7));
        assert_eq!(merged.title.as_deref(), Some("new"));
        assert_eq!(merged.is_draft, Some(true));
    }
}
