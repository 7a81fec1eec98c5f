//! CLI argument definitions for the Stickwork command-line interface.
//!
//! All `#[derive(Parser)]` and `#[derive(Subcommand)]` types are defined here,
//! keeping `main.rs` focused on dispatch logic.

use clap::{Parser, Subcommand};

/// Stickwork - Deterministic Drum Performance Generation
#[derive(Parser)]
#[command(name = "stickwork")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    /// Log generation decisions to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Generate a performance from a config file and print it as JSON
    Generate {
        /// Path to the generation config (JSON)
        #[arg(short, long)]
        config: String,

        /// Override the seed from the config
        #[arg(long)]
        seed: Option<u32>,

        /// Print only the bars array
        #[arg(long)]
        bars_only: bool,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Pretty-print the output JSON
        #[arg(short, long)]
        pretty: bool,
    },

    /// Generate a performance and check it against the sticking rules
    Check {
        /// Path to the generation config (JSON)
        #[arg(short, long)]
        config: String,

        /// Sticking rule ids to disable (repeatable)
        #[arg(long = "disable-rule")]
        disable_rules: Vec<String>,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// List the built-in limb presets
    Presets {
        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },
}
