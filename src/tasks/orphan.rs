//! Orphaning: put real content back where a managed link was and drop the
//! repository copy.
use std::io::ErrorKind;
use std::path::Path;

use super::locator::{self, ManagedLink};
use super::{Context, ItemFailure, OrphanReport};
use crate::error::{LinkError, Result};
use crate::resources::fs::{copy_path, copy_permissions, remove_existing, staging_path, verify_copy};
use crate::resources::symlink::{create_symlink, remove_symlink};

/// Orphan the managed link at `path`, or every managed link below `path`
/// when it is a real directory.
///
/// # Errors
///
/// - [`LinkError::NotFound`] if `path` does not exist
/// - [`LinkError::NotSymlink`] if it is a plain file
/// - [`LinkError::NotManaged`] if it is a symlink outside the repository
/// - [`LinkError::TargetMissing`] if its repository target is gone
/// - [`LinkError::NoManagedLinks`] if a directory holds no managed links
/// - [`LinkError::Cancelled`] if the confirmation hook declines a directory
/// - [`LinkError::BatchFailed`] after a directory run in which items failed
///
/// Single-link failures are returned as-is; nothing is changed by any
/// precondition failure.
pub fn orphan(ctx: &Context, path: &Path) -> Result<OrphanReport> {
    ctx.log.stage("Orphaning");
    let path = ctx.entry_path(path);

    let meta = match path.symlink_metadata() {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(LinkError::NotFound(path)),
        Err(e) => return Err(LinkError::io("inspect", &path, e)),
    };

    let mut report = OrphanReport::default();
    if meta.is_symlink() {
        let link = locator::classify(&path, &ctx.repo_root, &ctx.config)
            .ok_or_else(|| LinkError::NotManaged(path.clone()))?;
        if link.is_broken {
            return Err(LinkError::TargetMissing {
                link: link.path,
                target: link.target,
            });
        }
        if ctx.dry_run {
            log_dry_run(ctx, &link);
        } else {
            orphan_link(ctx, &link, &mut report)?;
        }
        report.restored.push(link.path);
        return Ok(report);
    }

    if !meta.is_dir() {
        return Err(LinkError::NotSymlink(path));
    }

    let links = locator::find_managed_links(&path, &ctx.repo_root, &ctx.config, ctx.log.as_ref());
    if links.is_empty() {
        return Err(LinkError::NoManagedLinks(path));
    }

    if ctx.dry_run {
        for link in &links {
            if link.is_broken {
                ctx.log.dry_run(&format!(
                    "would fail {}: target missing",
                    link.path.display()
                ));
            } else {
                log_dry_run(ctx, link);
                report.restored.push(link.path.clone());
            }
        }
        return Ok(report);
    }

    ctx.approve(&format!(
        "orphan {} managed link(s) under {}",
        links.len(),
        path.display()
    ))?;

    let mut failures = Vec::new();
    for link in &links {
        let result = if link.is_broken {
            Err(LinkError::TargetMissing {
                link: link.path.clone(),
                target: link.target.clone(),
            })
        } else {
            orphan_link(ctx, link, &mut report)
        };
        match result {
            Ok(()) => report.restored.push(link.path.clone()),
            Err(e) => {
                ctx.log.error(&format!("{}: {e}", link.path.display()));
                failures.push(ItemFailure::new(&link.path, e));
            }
        }
    }

    ctx.log.info(&format!(
        "{} restored, {} failed",
        report.restored.len(),
        failures.len()
    ));
    if failures.is_empty() {
        Ok(report)
    } else {
        Err(LinkError::BatchFailed {
            operation: "orphan".to_string(),
            failed: failures.len(),
            total: links.len(),
        })
    }
}

fn log_dry_run(ctx: &Context, link: &ManagedLink) {
    ctx.log.dry_run(&format!(
        "would restore {} from {}",
        link.path.display(),
        link.target.display()
    ));
    ctx.log.dry_run(&format!(
        "would delete repository copy {}",
        link.target.display()
    ));
}

/// Replace one managed link with a verified copy of its target, then try
/// to delete the repository copy.
///
/// The copy is staged beside the link and verified before the link is
/// touched.  If the staged copy cannot be moved into place the original
/// symlink is restored.
fn orphan_link(ctx: &Context, link: &ManagedLink, report: &mut OrphanReport) -> Result<()> {
    let staged = staging_path(&link.path);
    remove_existing(&staged)?;

    if let Err(e) = copy_path(&link.target, &staged).and_then(|()| verify_copy(&link.target, &staged)) {
        discard_staged(ctx, &staged);
        return Err(e);
    }

    let link_value = std::fs::read_link(&link.path)
        .map_err(|e| LinkError::io("read symlink", &link.path, e))?;

    if let Err(e) = remove_symlink(&link.path) {
        discard_staged(ctx, &staged);
        return Err(LinkError::io("remove symlink", &link.path, e));
    }

    if let Err(e) = std::fs::rename(&staged, &link.path) {
        let err = LinkError::io("move restored content to", &link.path, e);
        return match create_symlink(&link_value, &link.path) {
            Ok(()) => {
                discard_staged(ctx, &staged);
                Err(err)
            }
            Err(restore) => Err(LinkError::Inconsistent {
                message: format!(
                    "{err}; recreating the symlink also failed ({restore}); restored content is at {}",
                    staged.display()
                ),
            }),
        };
    }

    if let Err(e) = copy_permissions(&link.target, &link.path) {
        let msg = format!(
            "restored {} but could not copy permissions: {e}",
            link.path.display()
        );
        ctx.log.warn(&msg);
        report.warnings.push(msg);
    }

    match remove_existing(&link.target) {
        Ok(()) => ctx.log.info(&format!("orphaned {}", link.path.display())),
        Err(e) => {
            let msg = format!(
                "restored {} but could not delete repository copy {}: {e}",
                link.path.display(),
                link.target.display()
            );
            ctx.log.warn(&msg);
            report.warnings.push(msg);
        }
    }
    Ok(())
}

fn discard_staged(ctx: &Context, staged: &Path) {
    if let Err(e) = remove_existing(staged) {
        ctx.log
            .warn(&format!("could not remove staging copy {}: {e}", staged.display()));
    }
}
