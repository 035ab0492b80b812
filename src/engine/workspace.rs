//! engine::workspace
//!
//! Everything a command needs from the repository it runs in.

use crate::core::config::{Config, RepoConfig};
use crate::core::metadata::RefMetadataStore;
use crate::core::ops::RepoLock;
use crate::core::paths::TrellisPaths;
use crate::core::types::BranchName;
use crate::git::Git;

use super::{seed, Context, EngineError, StackEngine};

/// An opened repository with its config, holding the repository lock.
///
/// The lock is released when the workspace is dropped.
#[derive(Debug)]
pub struct Workspace {
    git: Git,
    paths: TrellisPaths,
    config: Config,
    _lock: RepoLock,
}

impl Workspace {
    pub fn open(ctx: &Context) -> Result<Self, EngineError> {
        let git = Git::open(&ctx.repo_dir())?;
        let paths = TrellisPaths::from_repo_info(&git.info()?);
        let lock = RepoLock::acquire(&paths)?;
        let config = Config::load(Some(&paths))?;
        tracing::debug!(
            common_dir = %paths.common_dir.display(),
            global_config = ?config.global_config_loaded_from(),
            "opened workspace"
        );
        Ok(Self {
            git,
            paths,
            config,
            _lock: lock,
        })
    }

    pub fn git(&self) -> &Git {
        &self.git
    }

    pub fn paths(&self) -> &TrellisPaths {
        &self.paths
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> RefMetadataStore<'_> {
        RefMetadataStore::new(&self.git)
    }

    /// The configured trunk.
    pub fn trunk(&self) -> Result<BranchName, EngineError> {
        let raw = self.config.trunk().ok_or(EngineError::TrunkNotConfigured)?;
        Ok(BranchName::new(raw)?)
    }

    /// Persist repo config and reload it into this workspace.
    pub fn save_repo_config(&mut self, repo: RepoConfig) -> Result<(), EngineError> {
        Config::write_repo(&self.paths, &repo)?;
        self.config.repo = repo;
        Ok(())
    }

    /// Hosting repository as `(owner, name)`: config overrides first, then
    /// whatever the configured remote's URL says. `None` when GitHub
    /// integration is disabled.
    pub fn github_repo(&self) -> Result<Option<(String, String)>, EngineError> {
        if !self.config.github_enabled() {
            return Ok(None);
        }
        let inferred = self
            .git
            .remote_url(self.config.remote())?
            .and_then(|url| Git::parse_github_remote(&url));
        let owner = self
            .config
            .github_owner_override()
            .map(String::from)
            .or_else(|| inferred.as_ref().map(|(owner, _)| owner.clone()));
        let name = self
            .config
            .github_name_override()
            .map(String::from)
            .or_else(|| inferred.map(|(_, name)| name));
        Ok(owner.zip(name))
    }

    /// Collect, validate and wrap the branch graph.
    ///
    /// Validation writes repairs and prunes orphaned metadata through the
    /// ref store.
    pub fn load_engine(&self) -> Result<StackEngine, EngineError> {
        let trunk = self.trunk()?;
        let seed = seed::collect(&self.git, &trunk)?;
        let mut store = self.store();
        StackEngine::load(&seed, &mut store, &self.git, self.git.current_branch()?)
    }
}
