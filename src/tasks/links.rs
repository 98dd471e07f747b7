//! Link planning and execution: `create_links`, `remove_links`,
//! `prune_links` and `status`.
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::locator::{self, ManagedLink};
use super::validate::validate_symlink_creation;
use super::{Context, ItemFailure, LinkReport, RemovalReport};
use crate::error::{LinkError, Result};
use crate::patterns::IgnoreMatcher;
use crate::paths;
use crate::resources::symlink::SymlinkResource;
use crate::resources::{Applicable as _, Resource as _, ResourceChange, ResourceState};

/// A symlink to be created: `target` will point at `source`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLink {
    /// Absolute repository path the link points at.
    pub source: PathBuf,
    /// Absolute path where the link is created.
    pub target: PathBuf,
}

impl PlannedLink {
    fn resource(&self) -> SymlinkResource {
        SymlinkResource::new(self.source.clone(), self.target.clone())
    }
}

/// Walk every mapping and collect the links it calls for.
///
/// Mappings whose source directory is missing are skipped.  Files are
/// matched against the ignore patterns by their path relative to the
/// mapping's source; directories listed in `link_as_unit` become a single
/// link and are not descended into.
///
/// # Errors
///
/// Returns [`LinkError::ValidationFailed`] if the ignore patterns do not
/// compile.
pub fn plan_links(ctx: &Context) -> Result<Vec<PlannedLink>> {
    let matcher = IgnoreMatcher::new(&ctx.config.ignore_patterns)
        .map_err(|e| LinkError::ValidationFailed(e.to_string()))?;

    let mut plan = Vec::new();
    for mapping in &ctx.config.link_mappings {
        let source_dir = mapping.source_path(&ctx.repo_root);
        if !source_dir.is_dir() {
            ctx.log.debug(&format!(
                "skipping mapping '{}': {} does not exist",
                mapping.name(),
                source_dir.display()
            ));
            continue;
        }
        let target_dir = mapping.target_path(&ctx.home);

        let mut walker = WalkDir::new(&source_dir)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();
        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    ctx.log.debug(&format!("skipping unreadable entry: {e}"));
                    continue;
                }
            };
            let Ok(rel) = entry.path().strip_prefix(&source_dir) else {
                continue;
            };
            let rel_str = rel.to_string_lossy().replace('\\', "/");

            if entry.file_type().is_dir() {
                if mapping.is_link_unit(&rel_str) {
                    walker.skip_current_dir();
                    if !matcher.is_ignored(&rel_str) {
                        plan.push(PlannedLink {
                            source: entry.path().to_path_buf(),
                            target: target_dir.join(rel),
                        });
                    }
                }
                continue;
            }

            if matcher.is_ignored(&rel_str) {
                ctx.log.debug(&format!("ignored: {}/{rel_str}", mapping.name()));
                continue;
            }
            plan.push(PlannedLink {
                source: entry.path().to_path_buf(),
                target: target_dir.join(rel),
            });
        }
    }
    Ok(plan)
}

/// Plan, validate and create every link.
///
/// Validation failures abort before anything is written.  Afterwards each
/// link is handled independently: correct links are left alone, links
/// pointing elsewhere are replaced, and anything that is not a symlink is
/// reported as a failure and never overwritten.  Per-item failures are
/// returned in the report, not as an error.
///
/// # Errors
///
/// Returns an error if planning or validation fails.
pub fn create_links(ctx: &Context) -> Result<LinkReport> {
    ctx.log.stage("Creating links");
    let plan = plan_links(ctx)?;
    if plan.is_empty() {
        ctx.log.info("nothing to link");
        return Ok(LinkReport::default());
    }

    for link in &plan {
        validate_symlink_creation(&link.source, &link.target)?;
    }

    let mut report = LinkReport::default();
    if ctx.dry_run {
        for link in &plan {
            describe_planned(ctx, link);
        }
        report.planned = plan;
        return Ok(report);
    }

    let mut parents: HashSet<PathBuf> = HashSet::new();
    for link in &plan {
        if let Some(parent) = link.target.parent()
            && !parents.contains(parent)
        {
            if let Err(e) = std::fs::create_dir_all(parent) {
                record_failure(ctx, &mut report.failures, &link.target, LinkError::io("create directory", parent, e));
                continue;
            }
            parents.insert(parent.to_path_buf());
        }

        match link.resource().apply() {
            Ok(ResourceChange::Applied) => {
                ctx.log.debug(&format!("linked {}", describe(ctx, link)));
                report.created += 1;
            }
            Ok(ResourceChange::AlreadyCorrect) => report.already_linked += 1,
            Ok(ResourceChange::Skipped { reason }) => {
                record_failure(ctx, &mut report.failures, &link.target, reason);
            }
            Err(e) => record_failure(ctx, &mut report.failures, &link.target, e),
        }
    }
    report.planned = plan;

    ctx.log.info(&format!(
        "{} created, {} already linked, {} failed",
        report.created,
        report.already_linked,
        report.failed()
    ));
    Ok(report)
}

fn describe(ctx: &Context, link: &PlannedLink) -> String {
    format!(
        "{} -> {}",
        link.target.display(),
        paths::display_relative(&link.source, &ctx.repo_root)
    )
}

fn describe_planned(ctx: &Context, link: &PlannedLink) {
    let line = describe(ctx, link);
    match link.resource().current_state() {
        Ok(ResourceState::Correct) => ctx.log.dry_run(&format!("{line} (already linked)")),
        Ok(ResourceState::Missing) => ctx.log.dry_run(&format!("would link {line}")),
        Ok(ResourceState::Incorrect { current }) => {
            ctx.log
                .dry_run(&format!("would replace {line} (currently {current})"));
        }
        Ok(ResourceState::Invalid { reason }) => {
            ctx.log.dry_run(&format!("would fail {line}: {reason}"));
        }
        Err(e) => ctx.log.dry_run(&format!("would fail {line}: {e}")),
    }
}

fn record_failure(
    ctx: &Context,
    failures: &mut Vec<ItemFailure>,
    path: &Path,
    reason: impl std::fmt::Display,
) {
    ctx.log.warn(&format!("{}: {reason}", path.display()));
    failures.push(ItemFailure::new(path, reason));
}

/// Remove every managed link under the mapping targets.
///
/// The caller's [`Confirm`](super::Confirm) hook is consulted first.
///
/// # Errors
///
/// Returns [`LinkError::Cancelled`] when the hook declines.
pub fn remove_links(ctx: &Context) -> Result<RemovalReport> {
    ctx.log.stage("Removing links");
    let links = locator::discover(ctx);
    if !links.is_empty() {
        ctx.approve(&format!("remove {} managed link(s)", links.len()))?;
    }
    Ok(remove_selected(ctx, links))
}

/// Remove managed links whose repository target no longer exists.
///
/// Links whose target exists but cannot be read are kept.
///
/// # Errors
///
/// Currently infallible; the signature matches the other entry points.
pub fn prune_links(ctx: &Context) -> Result<RemovalReport> {
    ctx.log.stage("Pruning broken links");
    let broken = locator::discover(ctx)
        .into_iter()
        .filter(|l| l.is_broken)
        .collect();
    Ok(remove_selected(ctx, broken))
}

fn remove_selected(ctx: &Context, links: Vec<ManagedLink>) -> RemovalReport {
    let mut report = RemovalReport::default();
    if links.is_empty() {
        ctx.log.info("no managed links found");
        return report;
    }

    for link in &links {
        let resource = SymlinkResource::new(link.target.clone(), link.path.clone());
        let line = resource.description();
        if ctx.dry_run {
            ctx.log.dry_run(&format!("would remove {line}"));
            continue;
        }
        match resource.remove() {
            Ok(ResourceChange::Applied) => {
                ctx.log.debug(&format!("removed {line}"));
                report.removed += 1;
            }
            Ok(ResourceChange::AlreadyCorrect) => {
                ctx.log.debug(&format!("already gone: {}", link.path.display()));
            }
            Ok(ResourceChange::Skipped { reason }) => {
                record_failure(ctx, &mut report.failures, &link.path, reason);
            }
            Err(e) => record_failure(ctx, &mut report.failures, &link.path, e),
        }
    }

    if !ctx.dry_run {
        ctx.log.info(&format!(
            "{} removed, {} failed",
            report.removed,
            report.failed()
        ));
    }
    report.selected = links;
    report
}

/// Return every managed link under the mapping targets.
///
/// # Errors
///
/// Currently infallible; the signature matches the other entry points.
pub fn status(ctx: &Context) -> Result<Vec<ManagedLink>> {
    Ok(locator::discover(ctx))
}
