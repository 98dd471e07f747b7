//! In-memory log capture.
use std::sync::Mutex;

use super::types::{Level, Log};

/// A single captured log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Severity of the entry.
    pub level: Level,
    /// Message text.
    pub message: String,
}

impl LogEntry {
    /// Replay this entry through `tracing`.
    fn replay(&self) {
        let msg = &self.message;
        match self.level {
            Level::Stage => tracing::info!(target: "dotlink::stage", "{msg}"),
            Level::Info => tracing::info!("{msg}"),
            Level::Debug => tracing::debug!("{msg}"),
            Level::Warn => tracing::warn!("{msg}"),
            Level::Error => tracing::error!("{msg}"),
            Level::DryRun => tracing::info!(target: "dotlink::dry_run", "{msg}"),
        }
    }
}

/// Implement the display methods of [`Log`] by pushing an entry of the
/// matching [`Level`].
macro_rules! buffer_log_methods {
    ($($method:ident => $level:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.push(Level::$level, msg);
            }
        )+
    };
}

/// Logger that keeps every message in memory.
///
/// Used wherever output must be inspected after the fact (tests, callers
/// that render their own report); [`flush`](Self::flush) replays the
/// captured entries through `tracing` in order.
#[derive(Debug, Default)]
pub struct BufferedLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl BufferedLog {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, level: Level, msg: &str) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.push(LogEntry {
                level,
                message: msg.to_string(),
            });
        }
    }

    /// Return a copy of every captured entry.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().map_or_else(|_| Vec::new(), |g| g.clone())
    }

    /// Return the messages captured at `level`, in order.
    #[must_use]
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.level == level)
            .map(|e| e.message)
            .collect()
    }

    /// Return `true` if any entry at `level` contains `needle`.
    #[must_use]
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.messages(level).iter().any(|m| m.contains(needle))
    }

    /// Replay all captured entries through `tracing` and clear the buffer.
    pub fn flush(&self) {
        let entries = self
            .entries
            .lock()
            .map_or_else(|_| Vec::new(), |mut g| std::mem::take(&mut *g));
        for entry in &entries {
            entry.replay();
        }
    }
}

impl Log for BufferedLog {
    buffer_log_methods!(
        stage => Stage,
        info => Info,
        debug => Debug,
        warn => Warn,
        error => Error,
        dry_run => DryRun,
    );
}
