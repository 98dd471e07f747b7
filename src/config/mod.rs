//! Configuration loading: ignore patterns and repository-to-destination
//! mappings, read from a single TOML file.
pub mod validation;

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::paths;

/// File name of the configuration document at the repository root.
pub const DEFAULT_CONFIG_FILE: &str = "dotlink.toml";

/// Resolved configuration for one invocation.
///
/// # Examples
///
/// ```
/// use dotlink::config::Config;
///
/// let config = Config::from_toml_str(
///     r#"
/// ignore_patterns = ["*.swp"]
///
/// [[link_mappings]]
/// source = "home"
/// target = "~/"
/// "#,
///     "dotlink.toml",
/// )
/// .unwrap();
/// assert_eq!(config.link_mappings.len(), 1);
/// assert!(config.mapping("home").is_some());
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Gitignore-style patterns, evaluated in declaration order.
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    /// Repository subdirectories and where they are mirrored.
    #[serde(default)]
    pub link_mappings: Vec<Mapping>,
}

/// A repository subdirectory mirrored into a destination directory.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Mapping {
    /// Directory relative to the repository root (no `..`).
    pub source: String,
    /// Absolute or `~/`-rooted destination directory.
    pub target: String,
    /// Directories (relative to `source`) linked as a single directory
    /// symlink instead of file by file.
    #[serde(default)]
    pub link_as_unit: Vec<String>,
}

impl Mapping {
    /// Build a mapping with no directory-as-unit entries.
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            link_as_unit: Vec::new(),
        }
    }

    /// The mapping's name, which is its repository-relative source.
    #[must_use]
    pub fn name(&self) -> &str {
        self.source.trim_end_matches('/')
    }

    /// Absolute path of the mapping's source directory inside `repo_root`.
    #[must_use]
    pub fn source_path(&self, repo_root: &Path) -> PathBuf {
        paths::normalize(&repo_root.join(self.name()))
    }

    /// Absolute destination directory, with `~/` expanded against `home`.
    #[must_use]
    pub fn target_path(&self, home: &Path) -> PathBuf {
        paths::normalize(&paths::expand_tilde(&self.target, home))
    }

    /// Return `true` if `relative` (relative to `source`) is linked as a unit.
    #[must_use]
    pub fn is_link_unit(&self, relative: &str) -> bool {
        let relative = crate::patterns::normalize_path(relative);
        self.link_as_unit
            .iter()
            .any(|unit| crate::patterns::normalize_path(unit) == relative)
    }
}

impl Config {
    /// Read, parse and validate the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    /// Parse and validate configuration from a TOML string.  `origin` names
    /// the document in error messages.
    ///
    /// # Errors
    ///
    /// Returns an error if `content` is not valid TOML or fails validation.
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.message().to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field against the load-time rules.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate(self)
    }

    /// Look up a mapping by name.
    #[must_use]
    pub fn mapping(&self, name: &str) -> Option<&Mapping> {
        let name = name.trim_end_matches('/');
        self.link_mappings.iter().find(|m| m.name() == name)
    }
}
