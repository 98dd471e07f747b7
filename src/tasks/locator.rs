//! Discovery of symlinks that point into the repository.
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use super::Context;
use crate::config::Config;
use crate::logging::Log;
use crate::paths;

/// Directory names never descended into: OS trash and library folders.
const SKIPPED_DIRS: &[&str] = &[".Trash", ".Trashes", ".local/share/Trash", "$RECYCLE.BIN", "Library"];

/// A symlink whose resolved target lies inside the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedLink {
    /// The symlink itself.
    pub path: PathBuf,
    /// Absolute path the symlink resolves to.
    pub target: PathBuf,
    /// `true` when `target` does not exist.
    pub is_broken: bool,
    /// Name of the mapping the target belongs to, best effort.
    pub source_label: String,
}

/// Walk `root` and return every symlink that resolves into `repo_root`,
/// sorted by path.
///
/// Symlinks are never followed, the repository subtree is never entered,
/// and entries that cannot be read are skipped with a debug message.
#[must_use]
pub fn find_managed_links(
    root: &Path,
    repo_root: &Path,
    config: &Config,
    log: &dyn Log,
) -> Vec<ManagedLink> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e, repo_root));

    let mut links = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log.debug(&format!("skipping unreadable entry: {e}"));
                continue;
            }
        };
        if !entry.path_is_symlink() {
            continue;
        }
        if let Some(link) = classify(entry.path(), repo_root, config) {
            links.push(link);
        }
    }
    links
}

fn is_skipped_dir(entry: &walkdir::DirEntry, repo_root: &Path) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    SKIPPED_DIRS.iter().any(|skip| {
        if skip.contains('/') {
            entry.path().ends_with(skip)
        } else {
            name == *skip
        }
    }) || paths::is_same_or_within(entry.path(), repo_root)
}

/// Inspect a single symlink and return it as a [`ManagedLink`] if it
/// resolves into `repo_root`.
#[must_use]
pub fn classify(link: &Path, repo_root: &Path, config: &Config) -> Option<ManagedLink> {
    let resolved = paths::resolve_link(link).ok()?;
    let target = if paths::is_within(&resolved, repo_root) {
        resolved
    } else {
        let canonical = canonical_parent(&resolved)?;
        if !paths::is_within(&canonical, repo_root) {
            return None;
        }
        canonical
    };

    let is_broken = matches!(
        std::fs::metadata(&target),
        Err(e) if e.kind() == ErrorKind::NotFound
    );
    let source_label = label_for(&target, repo_root, config);
    Some(ManagedLink {
        path: link.to_path_buf(),
        target,
        is_broken,
        source_label,
    })
}

/// Canonicalize the directory part of `path` so a target reached through a
/// symlinked ancestor (e.g. `/var` vs `/private/var`) still compares equal
/// to the canonical repository root.
fn canonical_parent(path: &Path) -> Option<PathBuf> {
    let parent = dunce::canonicalize(path.parent()?).ok()?;
    Some(parent.join(path.file_name()?))
}

fn label_for(target: &Path, repo_root: &Path, config: &Config) -> String {
    let Some(rel) = paths::relative_path(target, repo_root) else {
        return "unknown".to_string();
    };

    let best = config
        .link_mappings
        .iter()
        .map(|m| m.name())
        .filter(|name| rel.starts_with(name))
        .max_by_key(|name| Path::new(name).components().count());
    if let Some(name) = best {
        return name.to_string();
    }

    match rel.components().next() {
        Some(Component::Normal(first)) => first.to_string_lossy().into_owned(),
        _ => "unknown".to_string(),
    }
}

/// Directories walked by remove/prune/status: the distinct expanded
/// targets of every mapping, with targets nested inside another target
/// dropped since the outer walk covers them.
#[must_use]
pub fn discovery_roots(ctx: &Context) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = ctx
        .config
        .link_mappings
        .iter()
        .map(|m| m.target_path(&ctx.home))
        .collect();
    roots.sort();
    roots.dedup();

    let all = roots.clone();
    roots.retain(|r| !all.iter().any(|other| paths::is_within(r, other)));
    roots
}

/// Run [`find_managed_links`] over every [`discovery_roots`] entry that
/// exists.
#[must_use]
pub fn discover(ctx: &Context) -> Vec<ManagedLink> {
    let mut links = Vec::new();
    for root in discovery_roots(ctx) {
        if !root.is_dir() {
            ctx.log
                .debug(&format!("destination does not exist: {}", root.display()));
            continue;
        }
        ctx.log.debug(&format!("scanning {}", root.display()));
        links.extend(find_managed_links(
            &root,
            &ctx.repo_root,
            &ctx.config,
            ctx.log.as_ref(),
        ));
    }
    links
}
