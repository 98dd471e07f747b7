//! Pre-mutation checks on a single planned symlink.
use std::path::Path;

use crate::error::{LinkError, Result};
use crate::paths;
use crate::resources::symlink::is_symlink;

/// Refuse links that would contain themselves or whose two ends overlap.
///
/// `source` is what the link points at, `target` is where it is created.
/// An existing symlink at `target` that already points at `source` passes
/// without further checks.
///
/// # Errors
///
/// Returns [`LinkError::CircularReference`] or [`LinkError::PathOverlap`].
pub fn validate_symlink_creation(source: &Path, target: &Path) -> Result<()> {
    if is_symlink(target)
        && let Ok(existing) = paths::resolve_link(target)
        && paths::paths_equal(&existing, source)
    {
        return Ok(());
    }

    check_circular(source, target)?;
    check_overlap(source, target)
}

fn check_circular(source: &Path, target: &Path) -> Result<()> {
    if paths::is_within(source, target) {
        return Err(LinkError::CircularReference {
            repo_path: source.to_path_buf(),
            link_path: target.to_path_buf(),
        });
    }
    Ok(())
}

fn check_overlap(source: &Path, target: &Path) -> Result<()> {
    if paths::paths_equal(source, target)
        || paths::is_within(source, target)
        || paths::is_within(target, source)
    {
        return Err(LinkError::PathOverlap {
            repo_path: source.to_path_buf(),
            link_path: target.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn accepts_disjoint_paths() {
        validate_symlink_creation(
            Path::new("/repo/home/.bashrc"),
            Path::new("/home/u/.bashrc"),
        )
        .unwrap();
    }

    #[test]
    fn rejects_source_inside_target() {
        let err = validate_symlink_creation(
            Path::new("/home/u/dotfiles/home/.bashrc"),
            Path::new("/home/u"),
        )
        .unwrap_err();
        assert!(matches!(err, LinkError::CircularReference { .. }));
    }

    #[test]
    fn rejects_identical_paths() {
        let err =
            validate_symlink_creation(Path::new("/repo/a"), Path::new("/repo/a/")).unwrap_err();
        assert!(matches!(err, LinkError::PathOverlap { .. }));
    }

    #[test]
    fn rejects_target_inside_source() {
        let err = validate_symlink_creation(Path::new("/repo/home"), Path::new("/repo/home/x"))
            .unwrap_err();
        assert!(matches!(err, LinkError::PathOverlap { .. }));
    }

    #[test]
    fn sibling_with_shared_prefix_is_not_overlap() {
        validate_symlink_creation(Path::new("/x/repo2/a"), Path::new("/x/repo")).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn existing_correct_link_is_benign() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source");
        std::fs::write(&source, "x").unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&source, &link).unwrap();
        validate_symlink_creation(&source, &link).unwrap();
    }
}
