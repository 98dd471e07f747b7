//! Lexical path helpers: `~/` expansion, normalization and containment.
//!
//! Nothing here touches the filesystem except [`resolve_link`], which reads a
//! single symlink.  Containment is decided by computing a relative path and
//! inspecting its first component, never by comparing path strings: `/x/repo2`
//! shares a textual prefix with `/x/repo` but is not inside it.
use std::path::{Component, Path, PathBuf};

/// Expand a leading `~` / `~/` against `home`.  Other paths are returned
/// unchanged.
#[must_use]
pub fn expand_tilde(path: &str, home: &Path) -> PathBuf {
    if path == "~" {
        return home.to_path_buf();
    }
    path.strip_prefix("~/")
        .map_or_else(|| PathBuf::from(path), |rest| home.join(rest))
}

/// Lexically normalize `path`: drop `.` components and fold `..` into the
/// preceding component.  Symlinks are not consulted.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Compute `path` relative to `base`, inserting `..` components where `path`
/// leaves `base`.  Both inputs are normalized first.
///
/// Returns `None` when the two paths do not share a root (e.g. different
/// Windows drives, or one absolute and one relative).
#[must_use]
pub fn relative_path(path: &Path, base: &Path) -> Option<PathBuf> {
    let path = normalize(path);
    let base = normalize(base);
    if path.has_root() != base.has_root() {
        return None;
    }

    let mut path_iter = path.components().peekable();
    let mut base_iter = base.components().peekable();
    while let (Some(a), Some(b)) = (path_iter.peek(), base_iter.peek()) {
        if a != b {
            break;
        }
        path_iter.next();
        base_iter.next();
    }

    if base_iter
        .peek()
        .is_some_and(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
    {
        return None;
    }

    let mut rel = PathBuf::new();
    for _ in base_iter {
        rel.push("..");
    }
    for component in path_iter {
        rel.push(component.as_os_str());
    }
    Some(rel)
}

/// Return `true` if `path` lies strictly inside `root`.
///
/// The relative path from `root` to `path` must exist, must not start with
/// `..` and must not be empty (which is what `.` normalizes to).
#[must_use]
pub fn is_within(path: &Path, root: &Path) -> bool {
    relative_path(path, root).is_some_and(|rel| {
        !matches!(
            rel.components().next(),
            None | Some(Component::ParentDir | Component::CurDir)
        )
    })
}

/// Return `true` if `path` is `root` itself or lies inside it.
#[must_use]
pub fn is_same_or_within(path: &Path, root: &Path) -> bool {
    normalize(path) == normalize(root) || is_within(path, root)
}

/// Return `true` if `path` is a safe relative path: non-empty, not absolute
/// and free of `..` components.
#[must_use]
pub fn is_safe_relative(path: &str) -> bool {
    let p = Path::new(path);
    !path.trim().is_empty()
        && !p.has_root()
        && !path.starts_with('/')
        && !path.starts_with('\\')
        && p.components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Read the symlink at `link` and return its absolute, lexically normalized
/// target.  Relative link values are resolved against the link's directory.
///
/// # Errors
///
/// Returns an error if `link` is not a symlink or cannot be read.
pub fn resolve_link(link: &Path) -> std::io::Result<PathBuf> {
    let value = std::fs::read_link(link)?;
    Ok(resolve_link_value(link, &value))
}

/// Resolve a raw link value as it would be interpreted for a symlink at
/// `link`.
#[must_use]
pub fn resolve_link_value(link: &Path, value: &Path) -> PathBuf {
    let value = strip_win_prefix(value);
    if value.is_absolute() {
        normalize(&value)
    } else {
        let dir = link.parent().unwrap_or_else(|| Path::new(""));
        normalize(&dir.join(value))
    }
}

/// Compare two paths, normalising the `\\?\` prefix that Windows
/// `read_link` prepends to extended-length paths.
#[must_use]
pub fn paths_equal(a: &Path, b: &Path) -> bool {
    normalize(&strip_win_prefix(a)) == normalize(&strip_win_prefix(b))
}

fn strip_win_prefix(p: &Path) -> PathBuf {
    let s = p.to_string_lossy();
    s.strip_prefix(r"\\?\")
        .map_or_else(|| p.to_path_buf(), PathBuf::from)
}

/// Render `path` relative to `base` when it lies inside it, otherwise the
/// full path.  Used for log messages.
#[must_use]
pub fn display_relative(path: &Path, base: &Path) -> String {
    path.strip_prefix(base).map_or_else(
        |_| path.display().to_string(),
        |rel| rel.display().to_string(),
    )
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn expand_tilde_variants() {
        let home = Path::new("/home/u");
        assert_eq!(expand_tilde("~/", home), PathBuf::from("/home/u/"));
        assert_eq!(expand_tilde("~", home), PathBuf::from("/home/u"));
        assert_eq!(
            expand_tilde("~/.config", home),
            PathBuf::from("/home/u/.config")
        );
        assert_eq!(expand_tilde("/etc/xdg", home), PathBuf::from("/etc/xdg"));
    }

    #[test]
    fn normalize_folds_dots() {
        assert_eq!(
            normalize(Path::new("/a/./b/../c")),
            PathBuf::from("/a/c")
        );
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize(Path::new("../a/b/..")), PathBuf::from("../a"));
    }

    #[test]
    fn relative_path_inside_and_outside() {
        assert_eq!(
            relative_path(Path::new("/x/repo/home/.bashrc"), Path::new("/x/repo")),
            Some(PathBuf::from("home/.bashrc"))
        );
        assert_eq!(
            relative_path(Path::new("/x/repo2/a"), Path::new("/x/repo")),
            Some(PathBuf::from("../repo2/a"))
        );
        assert_eq!(
            relative_path(Path::new("/x/repo"), Path::new("/x/repo")),
            Some(PathBuf::new())
        );
        assert_eq!(relative_path(Path::new("rel"), Path::new("/abs")), None);
    }

    #[test]
    fn is_within_rejects_textual_prefix_siblings() {
        let root = Path::new("/x/repo");
        assert!(is_within(Path::new("/x/repo/home/.bashrc"), root));
        assert!(!is_within(Path::new("/x/repo2/home/.bashrc"), root));
        assert!(!is_within(Path::new("/x/repo"), root));
        assert!(!is_within(Path::new("/x"), root));
        assert!(!is_within(Path::new("/x/repo/../other"), root));
    }

    #[test]
    fn is_same_or_within_accepts_root() {
        assert!(is_same_or_within(Path::new("/x/repo/"), Path::new("/x/repo")));
        assert!(!is_same_or_within(Path::new("/x/repository"), Path::new("/x/repo")));
    }

    #[test]
    fn safe_relative_paths() {
        assert!(is_safe_relative("home"));
        assert!(is_safe_relative("config/nvim"));
        assert!(!is_safe_relative(""));
        assert!(!is_safe_relative("/abs"));
        assert!(!is_safe_relative("../escape"));
        assert!(!is_safe_relative("a/../../b"));
    }

    #[test]
    fn resolve_relative_link_value() {
        let link = Path::new("/home/u/.config/app");
        assert_eq!(
            resolve_link_value(link, Path::new("../../dotfiles/app")),
            PathBuf::from("/home/dotfiles/app")
        );
        assert_eq!(
            resolve_link_value(link, Path::new("/repo/app")),
            PathBuf::from("/repo/app")
        );
    }

    #[cfg(unix)]
    #[test]
    fn resolve_link_reads_relative_symlink() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let link = dir.path().join("sub").join("link");
        std::os::unix::fs::symlink("../target", &link).unwrap();
        assert_eq!(resolve_link(&link).unwrap(), dir.path().join("target"));
    }

    #[test]
    fn paths_equal_with_unc_prefix() {
        let a = PathBuf::from(r"\\?\C:\Code\dotfiles\home\bashrc");
        let b = PathBuf::from(r"C:\Code\dotfiles\home\bashrc");
        assert!(paths_equal(&a, &b));
    }

    #[test]
    fn display_relative_inside_and_outside() {
        let base = Path::new("/repo");
        assert_eq!(display_relative(Path::new("/repo/home/a"), base), "home/a");
        assert_eq!(display_relative(Path::new("/other/a"), base), "/other/a");
    }
}
