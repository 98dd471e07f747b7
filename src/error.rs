//! Domain-specific error types for the dotlink engine.
//!
//! Library code returns typed errors ([`ConfigError`], [`LinkError`]); the
//! binary converts them to [`anyhow::Error`] at the command boundary via `?`.
//!
//! # Error hierarchy
//!
//! ```text
//! DotlinkError
//! ├── Config(ConfigError): reading, parsing and validating dotlink.toml
//! └── Link(LinkError): planning, linking, adoption and orphaning
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Marker appended to every error that leaves data in a state the engine
/// could not repair on its own.
pub const MANUAL_INTERVENTION: &str = "manual intervention required";

/// Convenience alias for results produced by the link engines.
pub type Result<T, E = LinkError> = std::result::Result<T, E>;

/// Top-level error type for the dotlink engine.
#[derive(Error, Debug)]
pub enum DotlinkError {
    /// Configuration-related error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Link, adoption or orphaning error.
    #[error("Link error: {0}")]
    Link(#[from] LinkError),
}

/// Errors that arise from loading and validating the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("IO error reading config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or has the wrong shape.
    #[error("Invalid TOML in {path}: {message}")]
    Parse {
        /// Path to the offending file.
        path: String,
        /// Parser message.
        message: String,
    },

    /// A field failed load-time validation.
    #[error("Invalid value for {field}: {message}")]
    Validation {
        /// Dotted field name, e.g. `link_mappings[0].source`.
        field: String,
        /// Human-readable reason.
        message: String,
    },

    /// An ignore pattern contains glob metacharacters but does not compile.
    #[error("Invalid ignore pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The raw pattern as written in the configuration.
        pattern: String,
        /// Compiler message.
        message: String,
    },
}

/// Errors that arise while planning, creating, removing, adopting or
/// orphaning links.
#[derive(Error, Debug)]
pub enum LinkError {
    /// A path the operation needs does not exist.
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The path is already a symlink into the repository.
    #[error("{} is already adopted (links to {})", .path.display(), .target.display())]
    AlreadyAdopted {
        /// The symlink that was passed in.
        path: PathBuf,
        /// Where it resolves inside the repository.
        target: PathBuf,
    },

    /// The path cannot be expressed relative to the home directory.
    #[error("{} is outside the home directory", .0.display())]
    OutsideHome(PathBuf),

    /// No mapping with the given name is declared in the configuration.
    #[error("Mapping '{0}' is not declared in the configuration")]
    UnknownMapping(String),

    /// The computed repository destination is already occupied.
    #[error("Repository destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    /// The path is a symlink that points somewhere other than the repository.
    #[error("{} is a symlink to {} outside the repository", .path.display(), .target.display())]
    ForeignSymlink {
        /// The symlink that was passed in.
        path: PathBuf,
        /// Where it resolves.
        target: PathBuf,
    },

    /// The path is expected to be a symlink but is not.
    #[error("Not a symlink: {}", .0.display())]
    NotSymlink(PathBuf),

    /// The symlink does not resolve into the repository.
    #[error("Not managed by this repository: {}", .0.display())]
    NotManaged(PathBuf),

    /// The symlink is managed but its repository target is gone.
    #[error("Target of {} is missing: {}", .link.display(), .target.display())]
    TargetMissing {
        /// The managed symlink.
        link: PathBuf,
        /// The missing repository path.
        target: PathBuf,
    },

    /// A directory-scoped operation found nothing to act on.
    #[error("No managed links found under {}", .0.display())]
    NoManagedLinks(PathBuf),

    /// A precondition on an argument or configuration value failed.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Creating the link would make it contain itself.
    #[error("Circular reference: {} lies inside the link location {}", .repo_path.display(), .link_path.display())]
    CircularReference {
        /// What the link would point at.
        repo_path: PathBuf,
        /// Where the link would be created.
        link_path: PathBuf,
    },

    /// Source and target overlap.
    #[error("Paths overlap: {} and {}", .repo_path.display(), .link_path.display())]
    PathOverlap {
        /// What the link would point at.
        repo_path: PathBuf,
        /// Where the link would be created.
        link_path: PathBuf,
    },

    /// The caller declined the operation.
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// A filesystem call failed.
    #[error("Failed to {action} {}: {source}", .path.display())]
    Io {
        /// Short verb phrase, e.g. `"create symlink"`.
        action: String,
        /// Path the call operated on.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Data is in a state the engine could not repair.
    #[error("{message}; manual intervention required")]
    Inconsistent {
        /// What happened, including every failure involved.
        message: String,
    },

    /// One or more items of a batch failed after every item was attempted.
    #[error("{operation}: {failed} of {total} item(s) failed")]
    BatchFailed {
        /// Operation name, e.g. `"orphan"`.
        operation: String,
        /// Number of failed items.
        failed: usize,
        /// Number of attempted items.
        total: usize,
    },
}

impl LinkError {
    /// Build an [`LinkError::Io`] from an action, path and I/O error.
    pub fn io(action: &str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action: action.to_string(),
            path: path.into(),
            source,
        }
    }

    /// Return `true` if this error reports data that needs manual repair.
    #[must_use]
    pub const fn needs_manual_intervention(&self) -> bool {
        matches!(self, Self::Inconsistent { .. })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::io;

    // -----------------------------------------------------------------------
    // ConfigError
    // -----------------------------------------------------------------------

    #[test]
    fn config_error_validation_display() {
        let e = ConfigError::Validation {
            field: "link_mappings[0].source".to_string(),
            message: "must not contain '..'".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "Invalid value for link_mappings[0].source: must not contain '..'"
        );
    }

    #[test]
    fn config_error_io_has_source() {
        use std::error::Error as StdError;
        let e = ConfigError::Io {
            path: "/repo/dotlink.toml".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert!(e.source().is_some());
        assert!(e.to_string().contains("/repo/dotlink.toml"));
    }

    #[test]
    fn config_error_invalid_pattern_display() {
        let e = ConfigError::InvalidPattern {
            pattern: "[abc".to_string(),
            message: "unclosed character class".to_string(),
        };
        assert!(e.to_string().contains("[abc"));
    }

    // -----------------------------------------------------------------------
    // LinkError
    // -----------------------------------------------------------------------

    #[test]
    fn inconsistent_always_mentions_manual_intervention() {
        let e = LinkError::Inconsistent {
            message: "rollback of ~/.bashrc failed".to_string(),
        };
        assert!(e.to_string().ends_with(MANUAL_INTERVENTION));
        assert!(e.needs_manual_intervention());
    }

    #[test]
    fn io_error_display_names_action_and_path() {
        let e = LinkError::io(
            "create symlink",
            "/home/u/.bashrc",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(e.to_string().contains("create symlink"));
        assert!(e.to_string().contains("/home/u/.bashrc"));
        assert!(!e.needs_manual_intervention());
    }

    #[test]
    fn batch_failed_display() {
        let e = LinkError::BatchFailed {
            operation: "orphan".to_string(),
            failed: 2,
            total: 5,
        };
        assert_eq!(e.to_string(), "orphan: 2 of 5 item(s) failed");
    }

    #[test]
    fn not_symlink_display() {
        let e = LinkError::NotSymlink(PathBuf::from("/home/u/.vimrc"));
        assert_eq!(e.to_string(), "Not a symlink: /home/u/.vimrc");
    }

    // -----------------------------------------------------------------------
    // DotlinkError conversions
    // -----------------------------------------------------------------------

    #[test]
    fn dotlink_error_from_config_error() {
        let e: DotlinkError = ConfigError::Validation {
            field: "ignore_patterns[0]".to_string(),
            message: "must not be empty".to_string(),
        }
        .into();
        assert!(e.to_string().contains("Configuration error"));
    }

    #[test]
    fn dotlink_error_from_link_error() {
        let e: DotlinkError = LinkError::UnknownMapping("home".to_string()).into();
        assert!(e.to_string().contains("Link error"));
        assert!(e.to_string().contains("home"));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn all_error_types_are_send_sync() {
        assert_send_sync::<DotlinkError>();
        assert_send_sync::<ConfigError>();
        assert_send_sync::<LinkError>();
    }

    #[test]
    fn link_error_converts_to_anyhow() {
        let e = LinkError::NotManaged(PathBuf::from("/tmp/x"));
        let _anyhow_err: anyhow::Error = e.into();
    }
}
