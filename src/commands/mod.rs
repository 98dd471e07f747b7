//! Command orchestration: resolve the repository, load configuration, build
//! a [`Context`] and hand off to the engines.
pub mod adopt;
pub mod link;
pub mod status;
pub mod version;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config;
use crate::logging::Logger;
use crate::tasks::{Context, ItemFailure};

/// Shared state produced by the common command setup sequence.
#[derive(Debug)]
pub struct CommandSetup {
    /// Engine context for this invocation.
    pub ctx: Context,
}

impl CommandSetup {
    /// Resolve the repository root and home directory, load and validate the
    /// configuration, and report repository-aware warnings.
    ///
    /// # Errors
    ///
    /// Returns an error if the root or home directory cannot be determined
    /// or the configuration fails to load.
    pub fn init(global: &GlobalOpts, log: &Arc<Logger>) -> Result<Self> {
        let root = resolve_root(global)?;
        let config_path = global
            .config
            .clone()
            .unwrap_or_else(|| root.join(config::DEFAULT_CONFIG_FILE));

        log.stage("Loading configuration");
        log.debug(&format!("repository: {}", root.display()));
        let home = home_dir()?;
        let ctx = Context::load(&root, &home, &config_path, log.clone())?
            .with_dry_run(global.dry_run);
        log.info(&format!(
            "loaded {} mapping(s), {} ignore pattern(s) from {}",
            ctx.config.link_mappings.len(),
            ctx.config.ignore_patterns.len(),
            config_path.display()
        ));

        let warnings = config::validation::warnings(&ctx.config, &ctx.repo_root);
        if !warnings.is_empty() {
            log.warn(&format!(
                "found {} configuration warning(s):",
                warnings.len()
            ));
            for warning in &warnings {
                log.warn(&format!("  [{}]: {}", warning.item, warning.message));
            }
        }

        Ok(Self { ctx })
    }
}

/// Determine the repository root: `--root`, then `$DOTLINK_ROOT`, then the
/// current directory when it holds a configuration file.
///
/// # Errors
///
/// Returns an error if none of the candidates applies.
pub fn resolve_root(global: &GlobalOpts) -> Result<PathBuf> {
    if let Some(ref root) = global.root {
        return Ok(root.clone());
    }

    if let Some(root) = std::env::var_os("DOTLINK_ROOT").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(root));
    }

    let cwd = std::env::current_dir().context("reading current directory")?;
    if cwd.join(config::DEFAULT_CONFIG_FILE).exists() || global.config.is_some() {
        return Ok(cwd);
    }

    anyhow::bail!(
        "cannot determine repository root. Use --root, set DOTLINK_ROOT, or run from a directory containing {}",
        config::DEFAULT_CONFIG_FILE
    );
}

/// Return the user's home directory from the environment.
///
/// # Errors
///
/// Returns an error if neither `HOME` nor `USERPROFILE` is set.
pub fn home_dir() -> Result<PathBuf> {
    let vars: &[&str] = if cfg!(target_os = "windows") {
        &["USERPROFILE", "HOME"]
    } else {
        &["HOME"]
    };
    vars.iter()
        .find_map(|v| std::env::var_os(v).filter(|s| !s.is_empty()))
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("{} environment variable is not set", vars.join(" or ")))
}

/// Make a path argument absolute against the current directory.
///
/// `~`-prefixed arguments are left for the engine to expand.
///
/// # Errors
///
/// Returns an error if the current directory cannot be read.
pub fn absolute_arg(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() || path.starts_with("~") {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("reading current directory")?;
    Ok(cwd.join(path))
}

/// Turn per-item failures into a command error after the summary has been
/// printed.
///
/// # Errors
///
/// Returns an error if `failures` is non-empty.
pub fn fail_on_items(operation: &str, failures: &[ItemFailure]) -> Result<()> {
    if failures.is_empty() {
        return Ok(());
    }
    anyhow::bail!("{operation}: {} item(s) failed", failures.len());
}
