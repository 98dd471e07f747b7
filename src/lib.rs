//! Symlink-based dotfiles mirroring engine.
//!
//! Mirrors files from a version-controlled repository into a destination
//! tree (usually the home directory) with symlinks, and manages the
//! lifecycle of that mirroring: planning and creating links, removing and
//! pruning them, adopting existing files into the repository and orphaning
//! them back out.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: load and validate `dotlink.toml`
//! - **[`patterns`]**: gitignore-style ignore patterns
//! - **[`paths`]**: lexical path helpers and the containment test
//! - **[`resources`]**: idempotent `check + apply` primitives (symlinks, verified moves)
//! - **[`tasks`]**: the engines: link, unlink, prune, status, adopt, orphan
//! - **[`commands`]**: command-line orchestration over the engines
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod paths;
pub mod patterns;
pub mod resources;
pub mod tasks;
