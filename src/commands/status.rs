//! Command: `status`.
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use super::CommandSetup;
use crate::cli::GlobalOpts;
use crate::logging::Logger;
use crate::paths;
use crate::tasks::{self, ManagedLink};

/// List every managed link.
///
/// # Errors
///
/// Returns an error if setup fails.
pub fn run(global: &GlobalOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let links = tasks::status(&setup.ctx)?;

    log.stage("Managed links");
    if links.is_empty() {
        log.info("no managed links found");
        return Ok(());
    }
    for line in format_status(&links, &setup.ctx.home, &setup.ctx.repo_root).lines() {
        log.info(line);
    }
    let broken = links.iter().filter(|l| l.is_broken).count();
    log.info(&format!("{} link(s), {broken} broken", links.len()));
    Ok(())
}

/// Render links as one line each: `~/path -> repo/path [mapping]`, with
/// broken links marked.
#[must_use]
pub fn format_status(links: &[ManagedLink], home: &Path, repo_root: &Path) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    for link in links {
        let path = paths::relative_path(&link.path, home)
            .filter(|_| paths::is_within(&link.path, home))
            .map_or_else(
                || link.path.display().to_string(),
                |rel| format!("~/{}", rel.display()),
            );
        let target = paths::display_relative(&link.target, repo_root);
        let flag = if link.is_broken { " (broken)" } else { "" };
        writeln!(out, "{path} -> {target} [{}]{flag}", link.source_label).unwrap_or(());
    }
    out
}
