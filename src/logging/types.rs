//! The [`Log`] trait shared by every logging backend.

/// Severity of a captured log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Stage header (major section).
    Stage,
    /// Informational message.
    Info,
    /// Debug detail, hidden on the console unless verbose.
    Debug,
    /// Warning.
    Warn,
    /// Error.
    Error,
    /// Action that a dry run would perform.
    DryRun,
}

/// Abstraction over logging backends.
///
/// Both [`Logger`](super::logger::Logger) (direct output through `tracing`)
/// and [`BufferedLog`](super::buffered::BufferedLog) (in-memory capture)
/// implement this trait, so engine code logs without knowing where the
/// output goes and never touches process-wide state itself.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
}
