//! Blockrig CLI - Command-line interface for block model reconciliation
//!
//! This binary normalizes model specs and plans the create/update/delete
//! operations that reconcile them with a live model snapshot.

mod cli_args;

use clap::Parser;
use std::process::ExitCode;

use blockrig_cli::{commands, logging};
use cli_args::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Normalize {
            spec,
            max_cubes,
            limits,
            json,
            pretty,
        } => commands::normalize::run(&spec, max_cubes, limits.as_deref(), json, pretty),
        Commands::Plan {
            spec,
            existing,
            mode,
            delete_orphans,
            limits,
            json,
        } => commands::plan::run(commands::plan::PlanArgs {
            spec_path: &spec,
            existing_path: existing.as_deref(),
            mode: &mode,
            delete_orphans,
            limits: limits.as_deref(),
            json_output: json,
        }),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
