//! Symlink resource.
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::error::{LinkError, Result};
use crate::paths;

/// A symlink at `target` that should point at `source`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymlinkResource {
    /// The repository file or directory the symlink points to.
    pub source: PathBuf,
    /// Where the symlink lives.
    pub target: PathBuf,
}

impl SymlinkResource {
    /// Create a new symlink resource.
    #[must_use]
    pub const fn new(source: PathBuf, target: PathBuf) -> Self {
        Self { source, target }
    }
}

impl Applicable for SymlinkResource {
    fn description(&self) -> String {
        format!("{} -> {}", self.target.display(), self.source.display())
    }

    /// Create the symlink, replacing a symlink that points elsewhere.  An
    /// entry that is not a symlink is never touched.
    fn apply(&self) -> Result<ResourceChange> {
        match self.current_state()? {
            ResourceState::Correct => Ok(ResourceChange::AlreadyCorrect),
            ResourceState::Invalid { reason } => Ok(ResourceChange::Skipped { reason }),
            ResourceState::Incorrect { .. } => {
                remove_symlink(&self.target)
                    .map_err(|e| LinkError::io("remove stale symlink", &self.target, e))?;
                create_symlink(&self.source, &self.target)
                    .map_err(|e| LinkError::io("create symlink", &self.target, e))?;
                Ok(ResourceChange::Applied)
            }
            ResourceState::Missing => {
                create_symlink(&self.source, &self.target)
                    .map_err(|e| LinkError::io("create symlink", &self.target, e))?;
                Ok(ResourceChange::Applied)
            }
        }
    }

    /// Remove the symlink at `target`, whatever it points at.
    fn remove(&self) -> Result<ResourceChange> {
        match self.target.symlink_metadata() {
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(ResourceChange::AlreadyCorrect),
            Err(e) => Err(LinkError::io("inspect", &self.target, e)),
            Ok(meta) if !meta.is_symlink() => Ok(ResourceChange::Skipped {
                reason: "not a symlink".to_string(),
            }),
            Ok(_) => {
                remove_symlink(&self.target)
                    .map_err(|e| LinkError::io("remove symlink", &self.target, e))?;
                Ok(ResourceChange::Applied)
            }
        }
    }
}

impl Resource for SymlinkResource {
    fn current_state(&self) -> Result<ResourceState> {
        if self.source.symlink_metadata().is_err() {
            return Ok(ResourceState::Invalid {
                reason: format!("source does not exist: {}", self.source.display()),
            });
        }

        let meta = match self.target.symlink_metadata() {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ResourceState::Missing),
            Err(e) => return Err(LinkError::io("inspect", &self.target, e)),
        };

        if !meta.is_symlink() {
            let kind = if meta.is_dir() { "directory" } else { "file" };
            return Ok(ResourceState::Invalid {
                reason: format!("a regular {kind} already exists at {}", self.target.display()),
            });
        }

        let existing = paths::resolve_link(&self.target)
            .map_err(|e| LinkError::io("read symlink", &self.target, e))?;
        if paths::paths_equal(&existing, &self.source) {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Incorrect {
                current: format!("points to {}", existing.display()),
            })
        }
    }
}

/// Return `true` if `path` itself is a symlink (broken or not).
#[must_use]
pub fn is_symlink(path: &Path) -> bool {
    path.symlink_metadata().is_ok_and(|m| m.is_symlink())
}

/// Create a symlink at `link` pointing to `target`.
///
/// # Errors
///
/// Returns the underlying I/O error.
pub fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link)
    }

    #[cfg(windows)]
    {
        if target.is_dir() {
            std::os::windows::fs::symlink_dir(target, link)
        } else {
            std::os::windows::fs::symlink_file(target, link)
        }
    }
}

/// Remove a symlink without touching what it points at.
///
/// On Windows, directory symlinks must be removed with `remove_dir`; the raw
/// `FILE_ATTRIBUTE_DIRECTORY` flag identifies them.
///
/// # Errors
///
/// Returns the underlying I/O error.
pub fn remove_symlink(path: &Path) -> std::io::Result<()> {
    let meta = std::fs::symlink_metadata(path)?;
    if is_dir_like(&meta) {
        std::fs::remove_dir(path)
    } else {
        std::fs::remove_file(path)
    }
}

fn is_dir_like(meta: &std::fs::Metadata) -> bool {
    #[cfg(windows)]
    {
        use std::os::windows::fs::MetadataExt;
        meta.file_attributes() & 0x10 != 0 // FILE_ATTRIBUTE_DIRECTORY
    }
    #[cfg(not(windows))]
    {
        meta.is_dir()
    }
}
