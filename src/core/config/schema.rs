//! core::config::schema
//!
//! TOML shapes of the two config files. Unknown keys are rejected so typos
//! surface instead of being silently ignored.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::BranchName;

/// User-level settings.
///
/// ```toml
/// log_filter = "trellis=debug"
/// footer_attribution = false
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// `tracing` filter directive used when neither `--debug` nor
    /// `RUST_LOG` is given.
    pub log_filter: Option<String>,

    /// Whether generated PR footers end with an attribution line.
    pub footer_attribution: Option<bool>,
}

impl GlobalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(filter) = &self.log_filter {
            if filter.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "log_filter must not be empty".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Repository-level settings.
///
/// ```toml
/// trunk = "main"
///
/// [github]
/// owner = "acme"
/// name = "widgets"
/// enabled = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    pub trunk: Option<String>,

    /// Remote used to infer the hosting repository (default `origin`).
    pub remote: Option<String>,

    pub github: Option<GithubRepoConfig>,
}

impl RepoConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(trunk) = &self.trunk {
            BranchName::new(trunk.as_str())
                .map_err(|e| ConfigError::InvalidValue(format!("trunk: {e}")))?;
        }
        if let Some(github) = &self.github {
            github.validate()?;
        }
        Ok(())
    }
}

/// Hosting integration overrides for a repository.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GithubRepoConfig {
    pub owner: Option<String>,
    pub name: Option<String>,
    pub enabled: Option<bool>,
}

impl GithubRepoConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [("owner", &self.owner), ("name", &self.name)] {
            if let Some(value) = value {
                if value.is_empty() || value.contains('/') || value.contains(char::is_whitespace)
                {
                    return Err(ConfigError::InvalidValue(format!(
                        "github.{key} '{value}' is not a valid repository component"
                    )));
                }
            }
        }
        Ok(())
    }
}
