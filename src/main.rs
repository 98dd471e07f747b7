use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use dotlink::cli;
use dotlink::commands;
use dotlink::logging::{self, Logger};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();

    if matches!(args.command, cli::Command::Version) {
        commands::version::run();
        return Ok(());
    }

    let name = args.command.name();
    logging::init_subscriber(args.verbose, name);
    let log = Arc::new(Logger::new(name));

    let result = match &args.command {
        cli::Command::Link => commands::link::run(&args.global, &log),
        cli::Command::Unlink => commands::link::unlink(&args.global, &log),
        cli::Command::Prune => commands::link::prune(&args.global, &log),
        cli::Command::Status => commands::status::run(&args.global, &log),
        cli::Command::Adopt(opts) => commands::adopt::run(&args.global, opts, &log),
        cli::Command::Orphan(opts) => commands::adopt::orphan(&args.global, opts, &log),
        cli::Command::Version => Ok(()),
    };

    log.print_summary();
    result
}
