use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI entry point for the symlink mirroring engine.
#[derive(Parser, Debug)]
#[command(
    name = "dotlink",
    about = "Mirror a dotfiles repository into your home directory with symlinks",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Preview changes without applying
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Repository root (defaults to $DOTLINK_ROOT, then the current directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Configuration file (defaults to <root>/dotlink.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create symlinks for every mapped repository file
    Link,
    /// Remove every symlink that points into the repository
    Unlink,
    /// Remove symlinks whose repository target no longer exists
    Prune,
    /// List symlinks that point into the repository
    Status,
    /// Move a file or directory into the repository and link it back
    Adopt(AdoptOpts),
    /// Replace a managed symlink with a real copy and drop the repository copy
    Orphan(OrphanOpts),
    /// Print version information
    Version,
}

impl Command {
    /// Short name used for the log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::Unlink => "unlink",
            Self::Prune => "prune",
            Self::Status => "status",
            Self::Adopt(_) => "adopt",
            Self::Orphan(_) => "orphan",
            Self::Version => "version",
        }
    }
}

/// Options for the `adopt` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct AdoptOpts {
    /// File or directory to adopt
    pub path: PathBuf,

    /// Mapping (its `source` in the configuration) to adopt into
    #[arg(short, long)]
    pub mapping: String,
}

/// Options for the `orphan` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct OrphanOpts {
    /// Managed symlink, or a directory containing managed symlinks
    pub path: PathBuf,
}
