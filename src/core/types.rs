//! core::types
//!
//! Identifier types shared by every layer.
//!
//! - [`BranchName`] - a local branch name that git would accept
//! - [`Oid`] - a commit id, used as the branch revision
//! - [`RefName`] - a full reference name (`refs/...`)
//! - [`Fingerprint`] - hash over a set of refs, used to detect changes
//!
//! All of them are validated on construction, so holding one means the
//! value is well formed.
//!
//! ```
//! use trellis::core::types::{BranchName, Oid, RefName};
//!
//! let branch = BranchName::new("stack/part-1").unwrap();
//! assert_eq!(
//!     RefName::for_metadata(&branch).as_str(),
//!     "refs/branch-metadata/stack/part-1"
//! );
//! assert!(Oid::parse_lenient("not-a-commit").is_none());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Prefix for local branch refs.
pub const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// Prefix for the per-branch metadata refs.
pub const METADATA_REF_PREFIX: &str = "refs/branch-metadata/";

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name '{name}': {reason}")]
    InvalidBranchName { name: String, reason: &'static str },

    #[error("invalid object id '{oid}': {reason}")]
    InvalidOid { oid: String, reason: &'static str },

    #[error("invalid ref name '{name}': {reason}")]
    InvalidRefName { name: String, reason: &'static str },
}

/// Characters git never allows in a refname.
const FORBIDDEN_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];

/// Checks the `git check-ref-format` rules shared by branch and ref names.
///
/// Returns the violated rule, if any.
fn refname_violation(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        return Some("must not be empty");
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Some("must not start or end with '/'");
    }
    if name.ends_with('.') {
        return Some("must not end with '.'");
    }
    if name.contains("..") {
        return Some("must not contain '..'");
    }
    if name.contains("@{") {
        return Some("must not contain '@{'");
    }
    if name.contains("//") {
        return Some("must not contain '//'");
    }
    if name.chars().any(|c| FORBIDDEN_CHARS.contains(&c)) {
        return Some("contains a forbidden character");
    }
    if name.chars().any(|c| c.is_ascii_control()) {
        return Some("must not contain control characters");
    }
    let bad_component = name
        .split('/')
        .any(|part| part.starts_with('.') || part.ends_with(".lock"));
    if bad_component {
        return Some("path components must not start with '.' or end with '.lock'");
    }
    None
}

/// A validated local branch name.
///
/// Follows git's refname rules plus the branch-only ones: not `@`, not
/// starting with `-`.
///
/// ```
/// use trellis::core::types::BranchName;
///
/// assert!(BranchName::new("feature/login").is_ok());
/// assert!(BranchName::new("-oops").is_err());
/// assert!(BranchName::new("two words").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a validated branch name.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        let reason = if name == "@" {
            Some("'@' is reserved")
        } else if name.starts_with('-') {
            Some("must not start with '-'")
        } else {
            refname_violation(&name)
        };
        match reason {
            Some(reason) => Err(TypeError::InvalidBranchName { name, reason }),
            None => Ok(Self(name)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A commit id (SHA-1 or SHA-256 hex), normalized to lowercase.
///
/// Branch revisions are compared by value only; the ancestry oracle is the
/// only thing that knows how two ids relate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a validated object id.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        let reason = if oid.len() != 40 && oid.len() != 64 {
            Some("expected 40 or 64 hex characters")
        } else if !oid.bytes().all(|b| b.is_ascii_hexdigit()) {
            Some("not hexadecimal")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(TypeError::InvalidOid { oid, reason }),
            None => Ok(Self(oid)),
        }
    }

    /// Parse an id read from untrusted storage, treating garbage as absent.
    ///
    /// ```
    /// use trellis::core::types::Oid;
    ///
    /// assert!(Oid::parse_lenient("  ").is_none());
    /// assert!(Oid::parse_lenient(&"a".repeat(40)).is_some());
    /// ```
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        Self::new(raw.trim()).ok()
    }

    /// Abbreviated form, at most `len` characters.
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated full reference name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefName(String);

impl RefName {
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        match refname_violation(&name) {
            Some(reason) => Err(TypeError::InvalidRefName { name, reason }),
            None => Ok(Self(name)),
        }
    }

    /// `refs/heads/<branch>`
    pub fn for_branch(branch: &BranchName) -> Self {
        Self(format!("{BRANCH_REF_PREFIX}{branch}"))
    }

    /// `refs/branch-metadata/<branch>`
    pub fn for_metadata(branch: &BranchName) -> Self {
        Self(format!("{METADATA_REF_PREFIX}{branch}"))
    }

    /// The branch a metadata ref belongs to, if this is one.
    pub fn metadata_branch(&self) -> Option<BranchName> {
        self.0
            .strip_prefix(METADATA_REF_PREFIX)
            .and_then(|rest| BranchName::new(rest).ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RefName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RefName> for String {
    fn from(name: RefName) -> Self {
        name.0
    }
}

impl fmt::Display for RefName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// SHA-256 over a set of `(ref, oid)` pairs, independent of their order.
///
/// Used to check that a second validation pass leaves the metadata refs
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn compute(refs: &[(RefName, Oid)]) -> Self {
        let mut sorted: Vec<&(RefName, Oid)> = refs.iter().collect();
        sorted.sort();

        let mut hasher = Sha256::new();
        for (name, oid) in sorted {
            hasher.update(name.as_str());
            hasher.update([0u8]);
            hasher.update(oid.as_str());
            hasher.update(b"\n");
        }
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
