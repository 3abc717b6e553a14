use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> miette::Result<()> {
    // Diagnostics and log output go to stderr; stdout carries only the
    // composed diagram, event list, or obligation report.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Parallel { sync, files } => commands::parallel::run(sync.as_deref(), &files),
        Commands::Events { only_common, files } => commands::events::run(only_common, &files),
        Commands::Parse => commands::parse::run(),
        Commands::Refinement {
            spec,
            implementation,
            format,
        } => commands::refinement::run(&spec, &implementation, &format),
    }
}
