// Shared helpers for integration tests.
//
// Provides a temporary repository and home directory side by side, plus a
// fluent builder so each integration test can lay out dotfiles and a
// `dotlink.toml` without repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dotlink::config::{Config, DEFAULT_CONFIG_FILE};
use dotlink::logging::BufferedLog;
use dotlink::tasks::Context;

/// Configuration mirroring `home/` into `~/`, with editor swap files ignored.
pub const HOME_CONFIG: &str = r#"
ignore_patterns = ["*.swp"]

[[link_mappings]]
source = "home"
target = "~/"
"#;

/// An isolated repository and home directory backed by a
/// [`tempfile::TempDir`].
///
/// Both directories live under the same canonicalized temp root, so a
/// sibling such as `<root>/repo2` can be created to exercise prefix
/// confusion.
pub struct IntegrationTestContext {
    /// Owns every directory the test touches.
    pub dir: tempfile::TempDir,
    /// Canonical temp root.
    pub root: PathBuf,
    /// Repository root (`<root>/repo`).
    pub repo: PathBuf,
    /// Home directory (`<root>/home`).
    pub home: PathBuf,
}

impl IntegrationTestContext {
    /// Create empty `repo/` and `home/` directories with [`HOME_CONFIG`].
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let root = dunce::canonicalize(dir.path()).expect("canonicalize temp dir");
        let repo = root.join("repo");
        let home = root.join("home");
        std::fs::create_dir_all(&repo).expect("create repo");
        std::fs::create_dir_all(&home).expect("create home");
        std::fs::write(repo.join(DEFAULT_CONFIG_FILE), HOME_CONFIG).expect("write config");
        Self {
            dir,
            root,
            repo,
            home,
        }
    }

    /// Write `content` to `rel` under the repository.
    pub fn repo_file(&self, rel: &str, content: &str) -> PathBuf {
        write_file(&self.repo.join(rel), content)
    }

    /// Write `content` to `rel` under home.
    pub fn home_file(&self, rel: &str, content: &str) -> PathBuf {
        write_file(&self.home.join(rel), content)
    }

    /// Load `dotlink.toml` from the repository root.
    pub fn load_config(&self) -> Config {
        Config::load(&self.repo.join(DEFAULT_CONFIG_FILE)).expect("load config")
    }

    /// Build a real-run context with a fresh buffered log.
    pub fn context(&self) -> (Context, Arc<BufferedLog>) {
        let log = Arc::new(BufferedLog::new());
        let ctx = Context::new(&self.repo, &self.home, self.load_config(), log.clone())
            .expect("build context");
        (ctx, log)
    }

    /// Build a dry-run context with a fresh buffered log.
    pub fn dry_run_context(&self) -> (Context, Arc<BufferedLog>) {
        let (ctx, log) = self.context();
        (ctx.with_dry_run(true), log)
    }

    /// Path relative to the temp root, for stable snapshots.
    pub fn rel<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

fn write_file(path: &Path, content: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dirs");
    }
    std::fs::write(path, content).expect("write file");
    path.to_path_buf()
}

/// Fluent builder for [`IntegrationTestContext`].
pub struct TestContextBuilder {
    ctx: IntegrationTestContext,
}

impl TestContextBuilder {
    /// Begin building a context with the default [`HOME_CONFIG`].
    pub fn new() -> Self {
        Self {
            ctx: IntegrationTestContext::new(),
        }
    }

    /// Replace `dotlink.toml` with `content`.
    pub fn with_config(self, content: &str) -> Self {
        std::fs::write(self.ctx.repo.join(DEFAULT_CONFIG_FILE), content)
            .expect("write config");
        self
    }

    /// Add a file to the repository.
    pub fn with_repo_file(self, rel: &str, content: &str) -> Self {
        self.ctx.repo_file(rel, content);
        self
    }

    /// Add a file to the home directory.
    pub fn with_home_file(self, rel: &str, content: &str) -> Self {
        self.ctx.home_file(rel, content);
        self
    }

    /// Finish building and return the configured context.
    pub fn build(self) -> IntegrationTestContext {
        self.ctx
    }
}
