//! File-system helpers shared by the link, adoption and orphan engines.
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::symlink::create_symlink;
use crate::error::{LinkError, Result};

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns [`LinkError::Io`] if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| LinkError::io("create directory", parent, e))?;
    }
    Ok(())
}

/// Remove an existing file, symlink or directory tree at `path`.  Does
/// nothing if `path` does not exist (broken symlinks count as existing).
///
/// # Errors
///
/// Returns [`LinkError::Io`] if the path exists but cannot be removed.
pub fn remove_existing(path: &Path) -> Result<()> {
    let Ok(meta) = path.symlink_metadata() else {
        return Ok(());
    };
    let result = if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    result.map_err(|e| LinkError::io("remove", path, e))
}

/// Sibling path used to stage content before it replaces `target`.  Keeping
/// it in the same directory keeps the final rename on one filesystem.
#[must_use]
pub fn staging_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map_or_else(|| "item".to_string(), |n| n.to_string_lossy().into_owned());
    target.with_file_name(format!(".{name}.dotlink-tmp"))
}

/// Compute the lowercase hex SHA-256 digest of the file at `path`.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read.
pub fn compute_sha256(path: &Path) -> std::io::Result<String> {
    use sha2::{Digest, Sha256};
    use std::fmt::Write as _;

    let bytes = std::fs::read(path)?;
    let digest = Sha256::digest(&bytes);
    let mut hex = String::with_capacity(64);
    for b in &digest {
        write!(hex, "{b:02x}").unwrap_or(());
    }
    Ok(hex)
}

/// Confirm that `copy` holds the same bytes as `original`: sizes first, then
/// SHA-256 digests.  Directories are compared file by file.
///
/// # Errors
///
/// Returns [`LinkError::Io`] if either side cannot be read and
/// [`LinkError::Inconsistent`] on any mismatch.
pub fn verify_copy(original: &Path, copy: &Path) -> Result<()> {
    if original.is_dir() {
        for entry in WalkDir::new(original).min_depth(1).follow_links(false) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(original).to_path_buf();
                LinkError::io("read", path, e.into())
            })?;
            let rel = entry.path().strip_prefix(original).unwrap_or(entry.path());
            if entry.path_is_symlink() {
                verify_symlink(entry.path(), &copy.join(rel))?;
            } else if !entry.file_type().is_dir() {
                verify_file(entry.path(), &copy.join(rel))?;
            }
        }
        Ok(())
    } else {
        verify_file(original, copy)
    }
}

fn verify_symlink(original: &Path, copy: &Path) -> Result<()> {
    let read = |p: &Path| std::fs::read_link(p).map_err(|e| LinkError::io("read symlink", p, e));
    let (want, got) = (read(original)?, read(copy)?);
    if want != got {
        return Err(LinkError::Inconsistent {
            message: format!(
                "copy of symlink {} points to {}, expected {}",
                original.display(),
                got.display(),
                want.display()
            ),
        });
    }
    Ok(())
}

fn verify_file(original: &Path, copy: &Path) -> Result<()> {
    let size = |p: &Path| {
        std::fs::metadata(p)
            .map(|m| m.len())
            .map_err(|e| LinkError::io("read metadata of", p, e))
    };
    let (want, got) = (size(original)?, size(copy)?);
    if want != got {
        return Err(LinkError::Inconsistent {
            message: format!(
                "copy of {} is {got} bytes, expected {want}",
                original.display()
            ),
        });
    }

    let digest = |p: &Path| compute_sha256(p).map_err(|e| LinkError::io("read", p, e));
    if digest(original)? != digest(copy)? {
        return Err(LinkError::Inconsistent {
            message: format!(
                "copy of {} at {} has different content",
                original.display(),
                copy.display()
            ),
        });
    }
    Ok(())
}

/// Copy a file or directory tree from `src` to `dst`, carrying permission
/// bits across.  Symlinks inside a source tree are recreated as symlinks
/// with the same value, never followed.
///
/// # Errors
///
/// Returns [`LinkError::Io`] on the first entry that cannot be copied.
pub fn copy_path(src: &Path, dst: &Path) -> Result<()> {
    if src.is_dir() {
        copy_dir_recursive(src, dst)
    } else {
        std::fs::copy(src, dst)
            .map(|_| ())
            .map_err(|e| LinkError::io("copy", src, e))
    }
}

/// Recursively copy a directory tree.
///
/// Directory permissions are applied last, deepest first, so a read-only
/// directory is still writable while its contents are copied.
///
/// # Errors
///
/// Returns [`LinkError::Io`] if a directory cannot be created or read, or a
/// file or symlink cannot be copied.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            LinkError::io("read", path, e.into())
        })?;
        let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let dst_path = dst.join(rel);

        if entry.path_is_symlink() {
            let value = std::fs::read_link(entry.path())
                .map_err(|e| LinkError::io("read symlink", entry.path(), e))?;
            create_symlink(&value, &dst_path)
                .map_err(|e| LinkError::io("create symlink", &dst_path, e))?;
        } else if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dst_path)
                .map_err(|e| LinkError::io("create directory", &dst_path, e))?;
            dirs.push((entry.path().to_path_buf(), dst_path));
        } else {
            std::fs::copy(entry.path(), &dst_path)
                .map_err(|e| LinkError::io("copy", entry.path(), e))?;
        }
    }

    for (from, to) in dirs.iter().rev() {
        copy_permissions(from, to).map_err(|e| LinkError::io("set permissions on", to, e))?;
    }
    Ok(())
}

/// Apply the permission bits of `from` to `to`.
///
/// # Errors
///
/// Returns an I/O error if either path cannot be accessed.
pub fn copy_permissions(from: &Path, to: &Path) -> std::io::Result<()> {
    let perms = std::fs::metadata(from)?.permissions();
    std::fs::set_permissions(to, perms)
}

/// Move the file at `from` to `to`.
///
/// A plain rename is tried first.  When the two paths live on different
/// filesystems the file is copied to a staging path beside `to`, verified
/// (size and digest), renamed into place, and only then is `from` deleted.
///
/// # Errors
///
/// Returns [`LinkError::Io`] if the move fails with `from` intact, or
/// [`LinkError::Inconsistent`] if a copy was left behind that could not be
/// cleaned up.
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    match std::fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => copy_then_remove(from, to),
        Err(e) => Err(LinkError::io("move", from, e)),
    }
}

/// Cross-filesystem half of [`move_file`].
pub(crate) fn copy_then_remove(from: &Path, to: &Path) -> Result<()> {
    let staged = staging_path(to);
    if let Err(e) = copy_path(from, &staged).and_then(|()| verify_copy(from, &staged)) {
        if let Err(cleanup) = remove_existing(&staged) {
            return Err(LinkError::Inconsistent {
                message: format!(
                    "copying {} failed ({e}) and the partial copy {} could not be removed ({cleanup})",
                    from.display(),
                    staged.display()
                ),
            });
        }
        return Err(e);
    }

    if let Err(e) = std::fs::rename(&staged, to) {
        let err = LinkError::io("rename", &staged, e);
        return match remove_existing(&staged) {
            Ok(()) => Err(err),
            Err(cleanup) => Err(LinkError::Inconsistent {
                message: format!(
                    "{err}; staged copy {} could not be removed ({cleanup})",
                    staged.display()
                ),
            }),
        };
    }

    if let Err(e) = std::fs::remove_file(from) {
        let err = LinkError::io("remove original", from, e);
        return match remove_existing(to) {
            Ok(()) => Err(err),
            Err(cleanup) => Err(LinkError::Inconsistent {
                message: format!(
                    "{err}; content now exists at both {} and {} ({cleanup})",
                    from.display(),
                    to.display()
                ),
            }),
        };
    }
    Ok(())
}
