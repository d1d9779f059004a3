//! CLI argument definitions for the Blockrig command-line interface.
//!
//! All `#[derive(Parser)]` and `#[derive(Subcommand)]` types are defined here,
//! keeping `main.rs` focused on dispatch logic.

use clap::{Parser, Subcommand};

/// Blockrig - Declarative Block Model Reconciliation
#[derive(Parser)]
#[command(name = "blockrig")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    /// Enable debug logging on stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Normalize a model spec and print the resolved bones and cubes
    Normalize {
        /// Path to the model spec file (JSON)
        #[arg(short, long)]
        spec: String,

        /// Maximum cube count after instance expansion
        #[arg(long)]
        max_cubes: Option<usize>,

        /// Limits profile (default, strict)
        #[arg(long, value_parser = ["default", "strict"])]
        limits: Option<String>,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,

        /// Print the full normalized model in human mode
        #[arg(long)]
        pretty: bool,
    },

    /// Plan the operations that bring a live model in line with a spec
    Plan {
        /// Path to the model spec file (JSON)
        #[arg(short, long)]
        spec: String,

        /// Path to the existing-state snapshot (JSON); empty state if omitted
        #[arg(short, long)]
        existing: Option<String>,

        /// Reconciliation mode
        #[arg(long, default_value = "merge", value_parser = ["create", "merge", "replace", "patch"])]
        mode: String,

        /// Delete existing entities absent from the spec (replace mode only)
        #[arg(long)]
        delete_orphans: bool,

        /// Limits profile (default, strict)
        #[arg(long, value_parser = ["default", "strict"])]
        limits: Option<String>,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },
}
