//! The link engines: planning and executing links, discovering managed
//! links, adopting files into the repository and orphaning them back out.
//!
//! Every engine takes a [`Context`] and splits its work into a read-only
//! discovery/planning pass followed by a mutation pass, so a dry run stops
//! after the first pass and reports exactly the items a real run would
//! touch.
pub mod adopt;
mod context;
pub mod links;
pub mod locator;
pub mod orphan;
pub mod validate;

use std::path::PathBuf;

pub use adopt::adopt;
pub use context::{AutoConfirm, Confirm, Context};
pub use links::{PlannedLink, create_links, prune_links, remove_links, status};
pub use locator::{ManagedLink, find_managed_links};
pub use orphan::orphan;
pub use validate::validate_symlink_creation;

/// One item of a batch that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    /// The path the item concerned.
    pub path: PathBuf,
    /// Why it failed.
    pub reason: String,
}

impl ItemFailure {
    pub(crate) fn new(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Outcome of [`create_links`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkReport {
    /// Every link the plan contained, in planning order.
    pub planned: Vec<PlannedLink>,
    /// Links newly created (or re-pointed) by this run.
    pub created: usize,
    /// Links that already pointed at the right place.
    pub already_linked: usize,
    /// Links that could not be created.
    pub failures: Vec<ItemFailure>,
}

impl LinkReport {
    /// Number of failed links.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Outcome of [`remove_links`] and [`prune_links`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalReport {
    /// Links selected for removal.
    pub selected: Vec<ManagedLink>,
    /// Links actually removed.
    pub removed: usize,
    /// Links that could not be removed.
    pub failures: Vec<ItemFailure>,
}

impl RemovalReport {
    /// Number of failed removals.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Outcome of [`adopt`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdoptReport {
    /// Files moved (or, in a dry run, to be moved) into the repository,
    /// as `source` = repository path, `target` = symlink location.
    pub adopted: Vec<PlannedLink>,
    /// Files left alone because their repository destination exists.
    pub skipped: Vec<PathBuf>,
    /// Files already linked to their repository location.
    pub already_linked: usize,
}

/// Outcome of [`orphan`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrphanReport {
    /// Link locations (or, in a dry run, those that would be) restored to
    /// real content.
    pub restored: Vec<PathBuf>,
    /// Non-fatal problems, e.g. a repository copy that could not be deleted.
    pub warnings: Vec<String>,
}

/// Shared test helpers for engine unit tests.
#[cfg(test)]
pub mod test_helpers {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use super::{Confirm, Context};
    use crate::config::{Config, Mapping};
    use crate::logging::BufferedLog;

    /// [`Confirm`] implementation that declines everything.
    #[derive(Debug)]
    pub struct Decline;

    impl Confirm for Decline {
        fn confirm(&self, _prompt: &str) -> bool {
            false
        }
    }

    /// A temporary repository and home directory.
    #[derive(Debug)]
    pub struct Sandbox {
        /// Owns both directories.
        pub dir: tempfile::TempDir,
        /// Canonical repository root.
        pub repo: PathBuf,
        /// Canonical home directory.
        pub home: PathBuf,
    }

    impl Sandbox {
        /// Create `repo/` and `home/` inside a fresh temp directory.
        #[allow(clippy::expect_used)]
        pub fn new() -> Self {
            let dir = tempfile::tempdir().expect("create temp dir");
            let root = dunce::canonicalize(dir.path()).expect("canonicalize temp dir");
            let repo = root.join("repo");
            let home = root.join("home");
            std::fs::create_dir_all(&repo).expect("create repo");
            std::fs::create_dir_all(&home).expect("create home");
            Self { dir, repo, home }
        }

        /// Write `content` to `rel` under the repository, creating parents.
        #[allow(clippy::expect_used)]
        pub fn repo_file(&self, rel: &str, content: &str) -> PathBuf {
            write_file(&self.repo.join(rel), content)
        }

        /// Write `content` to `rel` under home, creating parents.
        #[allow(clippy::expect_used)]
        pub fn home_file(&self, rel: &str, content: &str) -> PathBuf {
            write_file(&self.home.join(rel), content)
        }

        /// Build a context over this sandbox.
        #[allow(clippy::expect_used)]
        pub fn context(&self, config: Config) -> (Context, Arc<BufferedLog>) {
            let log = Arc::new(BufferedLog::new());
            let ctx = Context::new(&self.repo, &self.home, config, log.clone())
                .expect("build context");
            (ctx, log)
        }
    }

    #[allow(clippy::expect_used)]
    fn write_file(path: &Path, content: &str) -> PathBuf {
        std::fs::create_dir_all(path.parent().expect("parent")).expect("create parents");
        std::fs::write(path, content).expect("write file");
        path.to_path_buf()
    }

    /// Configuration with a single `home -> ~/` mapping.
    pub fn home_config(ignore: &[&str]) -> Config {
        Config {
            ignore_patterns: ignore.iter().map(ToString::to_string).collect(),
            link_mappings: vec![Mapping::new("home", "~/")],
        }
    }
}
