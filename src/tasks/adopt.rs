//! Adoption: move a file or directory from the destination tree into the
//! repository and leave symlinks behind.
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::links::PlannedLink;
use super::validate::validate_symlink_creation;
use super::{AdoptReport, Context, ItemFailure};
use crate::error::{LinkError, Result};
use crate::paths;
use crate::resources::fs::{ensure_parent_dir, move_file};
use crate::resources::symlink::create_symlink;

/// Adopt `path` into the repository under the mapping named `mapping_name`.
///
/// Preconditions are checked in order, each with its own error:
/// `path` exists ([`LinkError::NotFound`]); it is not already a symlink
/// into the repository ([`LinkError::AlreadyAdopted`]) or anywhere else
/// ([`LinkError::ForeignSymlink`]); it lies under the home directory
/// ([`LinkError::OutsideHome`]); the mapping is declared
/// ([`LinkError::UnknownMapping`]); it lies under that mapping's target
/// ([`LinkError::ValidationFailed`]); and, for a single file, the
/// repository destination is free ([`LinkError::DestinationExists`]).
///
/// A file is moved and replaced by a symlink.  A directory stays a real
/// directory: its tree is mirrored into the repository and each file inside
/// is adopted individually, skipping files whose repository copy already
/// exists.
///
/// # Errors
///
/// Returns the first failed precondition, [`LinkError::Cancelled`] if the
/// confirmation hook declines a directory adoption, the error of a failed
/// file adoption, or [`LinkError::BatchFailed`] once every file of a
/// directory has been attempted and some failed.  Failures that leave data
/// in an unknown state are [`LinkError::Inconsistent`].
pub fn adopt(ctx: &Context, path: &Path, mapping_name: &str) -> Result<AdoptReport> {
    ctx.log.stage("Adopting");
    let path = ctx.entry_path(path);

    let meta = match path.symlink_metadata() {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(LinkError::NotFound(path)),
        Err(e) => return Err(LinkError::io("inspect", &path, e)),
    };

    if meta.is_symlink() {
        let target =
            paths::resolve_link(&path).map_err(|e| LinkError::io("read symlink", &path, e))?;
        return Err(
            match super::locator::classify(&path, &ctx.repo_root, &ctx.config) {
                Some(link) => LinkError::AlreadyAdopted {
                    path,
                    target: link.target,
                },
                None => LinkError::ForeignSymlink { path, target },
            },
        );
    }

    if !paths::is_within(&path, &ctx.home) {
        return Err(LinkError::OutsideHome(path));
    }

    let mapping = ctx
        .config
        .mapping(mapping_name)
        .ok_or_else(|| LinkError::UnknownMapping(mapping_name.to_string()))?;

    let target_dir = mapping.target_path(&ctx.home);
    let rel = match paths::relative_path(&path, &target_dir) {
        Some(rel) if paths::is_within(&path, &target_dir) => rel,
        _ => {
            return Err(LinkError::ValidationFailed(format!(
                "{} is not under the target {} of mapping '{}'",
                path.display(),
                target_dir.display(),
                mapping.name()
            )));
        }
    };
    if paths::is_same_or_within(&path, &ctx.repo_root) {
        return Err(LinkError::ValidationFailed(format!(
            "{} is inside the repository",
            path.display()
        )));
    }

    let source_dir = mapping.source_path(&ctx.repo_root);
    let dest = source_dir.join(&rel);
    validate_symlink_creation(&dest, &path)?;

    if meta.is_dir() {
        return adopt_dir(ctx, &path, &dest, &source_dir);
    }

    if dest.symlink_metadata().is_ok() {
        return Err(LinkError::DestinationExists(dest));
    }

    let mut report = AdoptReport::default();
    let planned = PlannedLink {
        source: dest,
        target: path,
    };
    if ctx.dry_run {
        log_dry_run(ctx, &planned);
    } else {
        ensure_source_dir(ctx, &source_dir)?;
        adopt_file(ctx, &planned)?;
    }
    report.adopted.push(planned);
    Ok(report)
}

fn ensure_source_dir(ctx: &Context, source_dir: &Path) -> Result<()> {
    if !source_dir.is_dir() {
        ctx.log.info(&format!(
            "creating mapping directory {}",
            source_dir.display()
        ));
        std::fs::create_dir_all(source_dir)
            .map_err(|e| LinkError::io("create directory", source_dir, e))?;
    }
    Ok(())
}

fn log_dry_run(ctx: &Context, link: &PlannedLink) {
    ctx.log.dry_run(&format!(
        "would move {} -> {}",
        link.target.display(),
        link.source.display()
    ));
    ctx.log.dry_run(&format!(
        "would link {} -> {}",
        link.target.display(),
        link.source.display()
    ));
}

/// Move one file into the repository and replace it with a symlink,
/// moving it back if the symlink cannot be created.
fn adopt_file(ctx: &Context, link: &PlannedLink) -> Result<()> {
    adopt_file_with(ctx, link, create_symlink)
}

fn adopt_file_with<F>(ctx: &Context, link: &PlannedLink, make_link: F) -> Result<()>
where
    F: FnOnce(&Path, &Path) -> std::io::Result<()>,
{
    ensure_parent_dir(&link.source)?;
    move_file(&link.target, &link.source)?;

    if let Err(e) = make_link(&link.source, &link.target) {
        let err = LinkError::io("create symlink", &link.target, e);
        return match move_file(&link.source, &link.target) {
            Ok(()) => {
                ctx.log.warn(&format!(
                    "restored {} after failed adoption",
                    link.target.display()
                ));
                Err(err)
            }
            Err(rollback) => Err(LinkError::Inconsistent {
                message: format!(
                    "{err}; moving {} back to {} also failed: {rollback}",
                    link.source.display(),
                    link.target.display()
                ),
            }),
        };
    }

    ctx.log.info(&format!(
        "adopted {} -> {}",
        link.target.display(),
        paths::display_relative(&link.source, &ctx.repo_root)
    ));
    Ok(())
}

/// Work items for a directory adoption, computed before anything moves.
#[derive(Debug, Default)]
struct DirPlan {
    dirs: Vec<PathBuf>,
    files: Vec<PlannedLink>,
    skipped: Vec<PathBuf>,
    already_linked: usize,
}

fn plan_dir(ctx: &Context, dir: &Path, dest: &Path) -> DirPlan {
    let mut plan = DirPlan::default();
    if !dest.is_dir() {
        plan.dirs.push(dest.to_path_buf());
    }

    for entry in WalkDir::new(dir).min_depth(1).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                ctx.log.warn(&format!("skipping unreadable entry: {e}"));
                continue;
            }
        };
        let Ok(rel) = entry.path().strip_prefix(dir) else {
            continue;
        };
        let repo_path = dest.join(rel);

        if entry.file_type().is_dir() {
            if !repo_path.is_dir() {
                plan.dirs.push(repo_path);
            }
        } else if entry.path_is_symlink() {
            let linked = paths::resolve_link(entry.path())
                .is_ok_and(|t| paths::paths_equal(&t, &repo_path));
            if linked {
                plan.already_linked += 1;
            } else {
                ctx.log.info(&format!(
                    "skipping symlink {}",
                    entry.path().display()
                ));
                plan.skipped.push(entry.path().to_path_buf());
            }
        } else if repo_path.symlink_metadata().is_ok() {
            ctx.log.info(&format!(
                "skipping {}: {} already exists in the repository",
                entry.path().display(),
                repo_path.display()
            ));
            plan.skipped.push(entry.path().to_path_buf());
        } else {
            plan.files.push(PlannedLink {
                source: repo_path,
                target: entry.path().to_path_buf(),
            });
        }
    }
    plan
}

fn adopt_dir(ctx: &Context, dir: &Path, dest: &Path, source_dir: &Path) -> Result<AdoptReport> {
    let plan = plan_dir(ctx, dir, dest);
    let mut report = AdoptReport {
        adopted: Vec::new(),
        skipped: plan.skipped,
        already_linked: plan.already_linked,
    };

    if ctx.dry_run {
        for d in &plan.dirs {
            ctx.log.dry_run(&format!("would create {}", d.display()));
        }
        for link in &plan.files {
            log_dry_run(ctx, link);
        }
        report.adopted = plan.files;
        return Ok(report);
    }

    if plan.files.is_empty() {
        ctx.log.info(&format!("nothing to adopt in {}", dir.display()));
        return Ok(report);
    }
    ctx.approve(&format!(
        "adopt {} file(s) from {}",
        plan.files.len(),
        dir.display()
    ))?;

    ensure_source_dir(ctx, source_dir)?;
    for d in &plan.dirs {
        std::fs::create_dir_all(d).map_err(|e| LinkError::io("create directory", d, e))?;
    }

    let total = plan.files.len();
    let mut failures = Vec::new();
    for link in plan.files {
        match adopt_file(ctx, &link) {
            Ok(()) => report.adopted.push(link),
            Err(e) if e.needs_manual_intervention() => return Err(e),
            Err(e) => {
                ctx.log.error(&format!("{}: {e}", link.target.display()));
                failures.push(ItemFailure::new(&link.target, e));
            }
        }
    }

    ctx.log.info(&format!(
        "{} adopted, {} skipped, {} failed",
        report.adopted.len(),
        report.skipped.len(),
        failures.len()
    ));
    if failures.is_empty() {
        Ok(report)
    } else {
        Err(LinkError::BatchFailed {
            operation: "adopt".to_string(),
            failed: failures.len(),
            total,
        })
    }
}
