//! core::config
//!
//! Configuration loading.
//!
//! Two scopes, both TOML:
//!
//! - **Global** (user): the first of `$TRELLIS_CONFIG`,
//!   `$XDG_CONFIG_HOME/trellis/config.toml`, `~/.trellis/config.toml` that
//!   exists.
//! - **Repo**: `<common_dir>/trellis/config.toml`.
//!
//! Missing files mean defaults. Files that exist but do not parse or
//! validate are errors.
//!
//! ```no_run
//! use trellis::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! assert!(config.footer_attribution());
//! ```

pub mod schema;

pub use schema::{GithubRepoConfig, GlobalConfig, RepoConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::core::paths::TrellisPaths;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("failed to write config file '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Global and repo configuration, with defaults applied by the accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub global: GlobalConfig,
    pub repo: RepoConfig,
    global_path: Option<PathBuf>,
}

impl Config {
    /// Load the global config and, given repository paths, the repo config.
    pub fn load(paths: Option<&TrellisPaths>) -> Result<Self, ConfigError> {
        let global_path = global_config_candidates()
            .into_iter()
            .find(|candidate| candidate.is_file());
        let repo_path = paths.map(TrellisPaths::repo_config_path);
        Self::load_from(global_path, repo_path.as_deref())
    }

    /// Load from explicit file locations. Nonexistent files read as defaults.
    pub fn load_from(
        global_path: Option<PathBuf>,
        repo_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let global: GlobalConfig = match &global_path {
            Some(path) => read_toml(path)?.unwrap_or_default(),
            None => GlobalConfig::default(),
        };
        let repo: RepoConfig = match repo_path {
            Some(path) => read_toml(path)?.unwrap_or_default(),
            None => RepoConfig::default(),
        };
        global.validate()?;
        repo.validate()?;

        Ok(Self {
            global,
            repo,
            global_path,
        })
    }

    /// Persist repo config to `<common_dir>/trellis/config.toml`.
    pub fn write_repo(paths: &TrellisPaths, repo: &RepoConfig) -> Result<PathBuf, ConfigError> {
        repo.validate()?;
        let path = paths.repo_config_path();
        write_toml_atomic(&path, repo)?;
        Ok(path)
    }

    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn trunk(&self) -> Option<&str> {
        self.repo.trunk.as_deref()
    }

    pub fn remote(&self) -> &str {
        self.repo.remote.as_deref().unwrap_or("origin")
    }

    pub fn github_enabled(&self) -> bool {
        self.repo
            .github
            .as_ref()
            .and_then(|g| g.enabled)
            .unwrap_or(true)
    }

    pub fn github_owner_override(&self) -> Option<&str> {
        self.repo.github.as_ref().and_then(|g| g.owner.as_deref())
    }

    pub fn github_name_override(&self) -> Option<&str> {
        self.repo.github.as_ref().and_then(|g| g.name.as_deref())
    }

    pub fn footer_attribution(&self) -> bool {
        self.global.footer_attribution.unwrap_or(true)
    }

    pub fn log_filter(&self) -> Option<&str> {
        self.global.log_filter.as_deref()
    }
}

/// Global config locations, most specific first.
fn global_config_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(explicit) = std::env::var_os("TRELLIS_CONFIG") {
        candidates.push(PathBuf::from(explicit));
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        candidates.push(PathBuf::from(xdg).join("trellis").join("config.toml"));
    }
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".trellis").join("config.toml"));
    }
    candidates
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ConfigError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    toml::from_str(&contents)
        .map(Some)
        .map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Write via a sibling temp file and rename, so readers never see a
/// partially written file.
fn write_toml_atomic<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    let write_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| ConfigError::Write { path, source }
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err(path))?;
    }
    let contents =
        toml::to_string_pretty(value).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

    let temp_path = path.with_extension("toml.tmp");
    let mut file = fs::File::create(&temp_path).map_err(write_err(temp_path.as_path()))?;
    file.write_all(contents.as_bytes())
        .and_then(|()| file.sync_all())
        .map_err(write_err(temp_path.as_path()))?;
    fs::rename(&temp_path, path).map_err(write_err(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths(temp: &TempDir) -> TrellisPaths {
        TrellisPaths::new(temp.path().join(".git"), temp.path().join(".git"))
    }

    #[test]
    fn missing_files_give_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_from(
            Some(temp.path().join("nope.toml")),
            Some(&temp.path().join("also-nope.toml")),
        )
        .unwrap();

        assert_eq!(config.trunk(), None);
        assert_eq!(config.remote(), "origin");
        assert!(config.github_enabled());
        assert!(config.footer_attribution());
        assert_eq!(config.log_filter(), None);
    }

    #[test]
    fn reads_both_scopes() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("global.toml");
        fs::write(&global, "log_filter = \"trellis=trace\"\nfooter_attribution = false\n").unwrap();
        let repo = temp.path().join("repo.toml");
        fs::write(&repo, "trunk = \"develop\"\n[github]\nenabled = false\n").unwrap();

        let config = Config::load_from(Some(global.clone()), Some(&repo)).unwrap();
        assert_eq!(config.trunk(), Some("develop"));
        assert!(!config.github_enabled());
        assert!(!config.footer_attribution());
        assert_eq!(config.log_filter(), Some("trellis=trace"));
        assert_eq!(config.global_config_loaded_from(), Some(global.as_path()));
    }

    #[test]
    fn parse_errors_name_the_file() {
        let temp = TempDir::new().unwrap();
        let repo = temp.path().join("repo.toml");
        fs::write(&repo, "trunk = [").unwrap();

        let err = Config::load_from(None, Some(&repo)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("repo.toml"));
    }

    #[test]
    fn invalid_values_rejected() {
        let temp = TempDir::new().unwrap();
        let repo = temp.path().join("repo.toml");
        fs::write(&repo, "trunk = \"has space\"").unwrap();
        assert!(matches!(
            Config::load_from(None, Some(&repo)),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn write_repo_then_load() {
        let temp = TempDir::new().unwrap();
        let paths = paths(&temp);
        let repo = RepoConfig {
            trunk: Some("main".into()),
            github: Some(GithubRepoConfig {
                name: Some("widgets".into()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let written = Config::write_repo(&paths, &repo).unwrap();
        assert_eq!(written, paths.repo_config_path());
        assert!(!written.with_extension("toml.tmp").exists());

        let config = Config::load_from(None, Some(&written)).unwrap();
        assert_eq!(config.trunk(), Some("main"));
        assert_eq!(config.github_name_override(), Some("widgets"));
        assert_eq!(config.github_owner_override(), None);
    }

    #[test]
    fn write_repo_validates_first() {
        let temp = TempDir::new().unwrap();
        let repo = RepoConfig {
            trunk: Some("..".into()),
            ..Default::default()
        };
        assert!(Config::write_repo(&paths(&temp), &repo).is_err());
        assert!(!paths(&temp).repo_config_path().exists());
    }
}
