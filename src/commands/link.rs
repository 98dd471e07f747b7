//! Commands: `link`, `unlink` and `prune`.
use std::sync::Arc;

use anyhow::Result;

use super::{CommandSetup, fail_on_items};
use crate::cli::GlobalOpts;
use crate::logging::Logger;
use crate::tasks;

/// Create every planned link.
///
/// # Errors
///
/// Returns an error if setup, planning or validation fails, or if any link
/// could not be created.
pub fn run(global: &GlobalOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let report = tasks::create_links(&setup.ctx)?;
    fail_on_items("link", &report.failures)
}

/// Remove every managed link.
///
/// # Errors
///
/// Returns an error if setup fails or any link could not be removed.
pub fn unlink(global: &GlobalOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let report = tasks::remove_links(&setup.ctx)?;
    fail_on_items("unlink", &report.failures)
}

/// Remove managed links whose target is gone.
///
/// # Errors
///
/// Returns an error if setup fails or any link could not be removed.
pub fn prune(global: &GlobalOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let report = tasks::prune_links(&setup.ctx)?;
    fail_on_items("prune", &report.failures)
}
