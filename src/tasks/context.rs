use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::error::{DotlinkError, LinkError, Result};
use crate::logging::Log;

/// Caller-supplied hook consulted before a destructive batch runs.
///
/// The engines never prompt on their own; the binary decides how (or
/// whether) to ask.
pub trait Confirm: Send + Sync {
    /// Return `true` to proceed with the action described by `prompt`.
    fn confirm(&self, prompt: &str) -> bool;
}

/// [`Confirm`] implementation that approves everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Immutable options for one invocation, passed to every engine.
pub struct Context {
    /// Canonical repository root.
    pub repo_root: PathBuf,
    /// Home directory used for `~/` expansion and the adoption boundary.
    pub home: PathBuf,
    /// Validated configuration.
    pub config: Config,
    /// Preview changes without touching the filesystem.
    pub dry_run: bool,
    /// Logger for all engine output.
    pub log: Arc<dyn Log>,
    /// Approval hook for destructive batches.
    pub confirm: Arc<dyn Confirm>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("repo_root", &self.repo_root)
            .field("home", &self.home)
            .field("config", &self.config)
            .field("dry_run", &self.dry_run)
            .field("log", &"<dyn Log>")
            .field("confirm", &"<dyn Confirm>")
            .finish()
    }
}

impl Context {
    /// Build a context for a real (non dry-run) invocation that approves
    /// every batch.
    ///
    /// `repo_root` must exist and is canonicalized; `home` is canonicalized
    /// when it exists so that paths under it compare equal to resolved
    /// symlink targets.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::NotFound`] if `repo_root` does not exist.
    pub fn new(repo_root: &Path, home: &Path, config: Config, log: Arc<dyn Log>) -> Result<Self> {
        let repo_root = dunce::canonicalize(repo_root)
            .map_err(|_| LinkError::NotFound(repo_root.to_path_buf()))?;
        let home = dunce::canonicalize(home).unwrap_or_else(|_| home.to_path_buf());
        Ok(Self {
            repo_root,
            home,
            config,
            dry_run: false,
            log,
            confirm: Arc::new(AutoConfirm),
        })
    }

    /// Load the configuration file at `config_path` and build a context
    /// over it.
    ///
    /// # Errors
    ///
    /// Returns [`DotlinkError::Config`] if the file cannot be loaded and
    /// [`DotlinkError::Link`] if `repo_root` does not exist.
    pub fn load(
        repo_root: &Path,
        home: &Path,
        config_path: &Path,
        log: Arc<dyn Log>,
    ) -> Result<Self, DotlinkError> {
        let config = Config::load(config_path)?;
        Ok(Self::new(repo_root, home, config, log)?)
    }

    /// Return this context with `dry_run` set.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Return this context with a different approval hook.
    #[must_use]
    pub fn with_confirm(mut self, confirm: Arc<dyn Confirm>) -> Self {
        self.confirm = confirm;
        self
    }

    /// Ask the approval hook before a destructive batch.  Dry runs never
    /// ask.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Cancelled`] when the hook declines.
    pub fn approve(&self, prompt: &str) -> Result<()> {
        if self.dry_run || self.confirm.confirm(prompt) {
            Ok(())
        } else {
            Err(LinkError::Cancelled(prompt.to_string()))
        }
    }

    /// Make a caller-supplied path absolute and resolve symlinks in its
    /// parent directories, leaving the final component untouched so a
    /// symlink passed in is inspected rather than followed.
    #[must_use]
    pub fn entry_path(&self, path: &Path) -> PathBuf {
        let path = crate::paths::expand_tilde(&path.to_string_lossy(), &self.home);
        let path = if path.is_absolute() {
            path
        } else {
            self.home.join(path)
        };
        let path = crate::paths::normalize(&path);
        match (path.parent(), path.file_name()) {
            (Some(parent), Some(name)) => dunce::canonicalize(parent)
                .map_or_else(|_| path.clone(), |p| p.join(name)),
            _ => path,
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::test_helpers::write_temp_toml;
    use crate::error::ConfigError;
    use crate::logging::BufferedLog;

    const CONFIG: &str = "[[link_mappings]]\nsource = \"home\"\ntarget = \"~/\"\n";

    #[test]
    fn load_reads_config_and_canonicalizes_root() {
        let (dir, path) = write_temp_toml(CONFIG);
        let ctx = Context::load(dir.path(), dir.path(), &path, Arc::new(BufferedLog::new())).unwrap();
        assert_eq!(ctx.repo_root, dunce::canonicalize(dir.path()).unwrap());
        assert!(ctx.config.mapping("home").is_some());
        assert!(!ctx.dry_run);
    }

    #[test]
    fn load_reports_config_errors() {
        let (dir, _path) = write_temp_toml(CONFIG);
        let err = Context::load(
            dir.path(),
            dir.path(),
            &dir.path().join("absent.toml"),
            Arc::new(BufferedLog::new()),
        )
        .unwrap_err();
        assert!(matches!(err, DotlinkError::Config(ConfigError::Io { .. })));
    }

    #[test]
    fn load_reports_missing_repository() {
        let (dir, path) = write_temp_toml(CONFIG);
        let err = Context::load(
            &dir.path().join("no-repo"),
            dir.path(),
            &path,
            Arc::new(BufferedLog::new()),
        )
        .unwrap_err();
        assert!(matches!(err, DotlinkError::Link(LinkError::NotFound(_))));
    }

    #[test]
    fn approve_respects_hook_and_dry_run() {
        #[derive(Debug)]
        struct Decline;
        impl Confirm for Decline {
            fn confirm(&self, _prompt: &str) -> bool {
                false
            }
        }

        let (dir, path) = write_temp_toml(CONFIG);
        let ctx = Context::load(dir.path(), dir.path(), &path, Arc::new(BufferedLog::new()))
            .unwrap()
            .with_confirm(Arc::new(Decline));
        assert!(matches!(ctx.approve("remove"), Err(LinkError::Cancelled(_))));
        assert!(ctx.with_dry_run(true).approve("remove").is_ok());
    }
}
