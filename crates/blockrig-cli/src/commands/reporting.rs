//! Shared helpers for human-readable command output.

use blockrig_spec::{Limits, ReconcileError, ReconcileWarning, Vec3};
use colored::Colorize;

/// Resolves the limits profile, then applies a `--max-cubes` override.
pub(super) fn resolve_limits(name: Option<&str>, max_cubes: Option<usize>) -> Result<Limits, String> {
    let limits = match name {
        Some(name) => Limits::by_name(name).ok_or_else(|| {
            format!("unknown limits profile: {} (expected default or strict)", name)
        })?,
        None => Limits::default(),
    };
    Ok(match max_cubes {
        Some(max) => limits.with_max_cubes(max),
        None => limits,
    })
}

pub(super) fn print_reconcile_error(error: &ReconcileError) {
    println!("\n{}", "Errors:".red().bold());
    let path_info = error
        .path
        .as_ref()
        .map(|p| format!(" at {}", p))
        .unwrap_or_default();
    println!(
        "  {} [{}]{}: {}",
        "x".red(),
        error.code.to_string().red(),
        path_info.dimmed(),
        error.message
    );
    if let Some(fix) = &error.fix {
        println!("    {} {}", "fix:".dimmed(), fix);
    }
}

pub(super) fn print_warnings(warnings: &[ReconcileWarning]) {
    if warnings.is_empty() {
        return;
    }
    println!("\n{}", "Warnings:".yellow().bold());
    for warning in warnings {
        let path_info = warning
            .path
            .as_ref()
            .map(|p| format!(" at {}", p))
            .unwrap_or_default();
        println!(
            "  {} [{}]{}: {}",
            "!".yellow(),
            warning.code.to_string().yellow(),
            path_info.dimmed(),
            warning.message
        );
    }
}

/// Formats a vector compactly, e.g. `[0, 24, -2.5]`.
pub(super) fn format_vec(v: Vec3) -> String {
    format!("[{}, {}, {}]", v[0], v[1], v[2])
}
