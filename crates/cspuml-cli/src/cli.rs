//! CLI argument definitions: top-level `Cli` struct and `Commands` enum.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub(crate) const CLI_LONG_ABOUT: &str =
    "CSP-style composition and refinement analysis for UML state diagrams.\n\n\
    Typical flow:\n  \
    1. cspuml parallel --sync 'insert;serve' user.puml machine.puml\n  \
    2. cspuml events user.puml machine.puml\n  \
    3. cspuml refinement --spec spec.puml --impl impl.puml\n\n\
    Composition synchronises the diagrams on the shared events and emits the\n\
    reachable product; refinement emits the stable-failures proof obligations.";

#[derive(Parser)]
#[command(name = "cspuml")]
#[command(about = "CSP-style composition and refinement analysis for UML state diagrams")]
#[command(long_about = CLI_LONG_ABOUT)]
#[command(version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Compose diagrams in parallel, synchronising on shared events
    #[command(display_order = 10)]
    Parallel {
        /// Semicolon-separated list of synchronisation events
        #[arg(long, value_name = "e1;e2;…")]
        sync: Option<String>,

        /// Diagram files to compose, left to right
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// List the visible event ids of one or more diagrams
    #[command(display_order = 11)]
    Events {
        /// Only list events common to all files (requires at least 2)
        #[arg(long)]
        only_common: bool,

        /// Diagram files to inspect
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },

    /// Parse a diagram from stdin and dump a human-readable summary
    #[command(display_order = 12)]
    Parse,

    /// Generate stable-failures refinement proof obligations
    #[command(display_order = 13)]
    Refinement {
        /// Path to the specification diagram
        #[arg(long)]
        spec: PathBuf,

        /// Path to the implementation diagram
        #[arg(long = "impl")]
        implementation: PathBuf,

        /// Output format: text | json
        #[arg(long, default_value = "text")]
        format: String,
    },
}
