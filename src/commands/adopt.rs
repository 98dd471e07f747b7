//! Commands: `adopt` and `orphan`.
use std::sync::Arc;

use anyhow::Result;

use super::{CommandSetup, absolute_arg};
use crate::cli::{AdoptOpts, GlobalOpts, OrphanOpts};
use crate::logging::Logger;
use crate::tasks;

/// Adopt a file or directory into the repository.
///
/// # Errors
///
/// Returns an error if setup fails or the adoption fails.
pub fn run(global: &GlobalOpts, opts: &AdoptOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let path = absolute_arg(&opts.path)?;
    let report = tasks::adopt(&setup.ctx, &path, &opts.mapping)?;
    if !report.skipped.is_empty() {
        log.info(&format!(
            "{} file(s) skipped; see messages above",
            report.skipped.len()
        ));
    }
    Ok(())
}

/// Orphan a managed link, or every managed link in a directory.
///
/// # Errors
///
/// Returns an error if setup fails or the orphaning fails.
pub fn orphan(global: &GlobalOpts, opts: &OrphanOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let path = absolute_arg(&opts.path)?;
    let report = tasks::orphan(&setup.ctx, &path)?;
    for warning in &report.warnings {
        log.debug(&format!("follow-up needed: {warning}"));
    }
    Ok(())
}
