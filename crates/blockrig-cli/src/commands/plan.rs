//! Plan command implementation
//!
//! Normalizes a model spec and plans it against an existing-state snapshot.
//! The plan is printed, never applied.

use anyhow::{Context, Result};
use blockrig_spec::{
    normalize_with_limits, plan_hash, plan_state, ExistingState, Plan, PlanMode, PlanOp,
};
use colored::Colorize;
use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;
use tracing::info;

use super::json_output::{
    error_codes, input_error_to_json, reconcile_error_to_json, warning_to_json, JsonError,
    JsonWarning, PlanOutput, PlanResult,
};
use super::reporting;
use crate::input::{load_existing, load_spec, Loaded};

/// Arguments for the plan command.
#[derive(Debug, Clone, Copy)]
pub struct PlanArgs<'a> {
    /// Path to the model spec file
    pub spec_path: &'a str,
    /// Path to the existing-state snapshot; empty state when `None`
    pub existing_path: Option<&'a str>,
    /// Reconciliation mode name
    pub mode: &'a str,
    /// Delete unmatched existing entities (replace mode only)
    pub delete_orphans: bool,
    /// Optional limits profile name
    pub limits: Option<&'a str>,
    /// Whether to output machine-readable JSON diagnostics
    pub json_output: bool,
}

/// Run the plan command
///
/// # Returns
/// Exit code: 0 if a plan was produced, 1 on a reconcile error
pub fn run(args: PlanArgs<'_>) -> Result<ExitCode> {
    if args.json_output {
        run_json(&args)
    } else {
        run_human(&args)
    }
}

/// Run plan with human-readable (colored) output
fn run_human(args: &PlanArgs<'_>) -> Result<ExitCode> {
    let start = Instant::now();
    let mode: PlanMode = args.mode.parse().map_err(anyhow::Error::msg)?;
    let limits = reporting::resolve_limits(args.limits, None).map_err(anyhow::Error::msg)?;

    println!("{} {}", "Planning:".cyan().bold(), args.spec_path);
    println!(
        "{} {}{}",
        "Mode:".dimmed(),
        mode,
        if args.delete_orphans { " (delete orphans)" } else { "" }
    );

    let Loaded {
        document: spec,
        source_hash,
    } = load_spec(Path::new(args.spec_path))
        .with_context(|| format!("Failed to load spec file: {}", args.spec_path))?;
    println!("{} json ({})", "Source:".dimmed(), &source_hash[..16]);

    let existing = match args.existing_path {
        Some(path) => {
            let loaded = load_existing(Path::new(path))
                .with_context(|| format!("Failed to load existing state: {}", path))?;
            println!(
                "{} {} bone(s), {} cube(s) ({})",
                "Existing:".dimmed(),
                loaded.document.bones.len(),
                loaded.document.cubes.len(),
                &loaded.source_hash[..16]
            );
            loaded.document
        }
        None => {
            println!("{} empty", "Existing:".dimmed());
            ExistingState::default()
        }
    };

    let model = match normalize_with_limits(&spec, &limits) {
        Ok(model) => model,
        Err(error) => return Ok(report_failure(&error, start)),
    };
    reporting::print_warnings(&model.warnings);

    let plan = match plan_state(&model, &existing, mode, args.delete_orphans) {
        Ok(plan) => plan,
        Err(error) => return Ok(report_failure(&error, start)),
    };
    let hash = plan_hash(&plan)?;
    info!(ops = plan.ops.len(), mode = %mode, "planned");

    print_plan(&plan);
    let duration_ms = start.elapsed().as_millis() as u64;
    if plan.is_empty() {
        println!(
            "\n{} Live state already matches ({}ms)",
            "SUCCESS".green().bold(),
            duration_ms
        );
    } else {
        println!(
            "\n{} {} operation(s) planned ({}ms)",
            "SUCCESS".green().bold(),
            plan.summary.total,
            duration_ms
        );
    }
    println!("{} {}", "Plan hash:".dimmed(), hash);
    Ok(ExitCode::SUCCESS)
}

fn report_failure(error: &blockrig_spec::ReconcileError, start: Instant) -> ExitCode {
    reporting::print_reconcile_error(error);
    println!(
        "\n{} No plan produced ({}ms)",
        "FAILED".red().bold(),
        start.elapsed().as_millis()
    );
    ExitCode::from(1)
}

/// Run plan with machine-readable JSON output
fn run_json(args: &PlanArgs<'_>) -> Result<ExitCode> {
    let output = build_output(args);
    let json =
        serde_json::to_string_pretty(&output).expect("PlanOutput serialization should not fail");
    println!("{}", json);

    if output.success {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

/// Builds the JSON output without printing it.
pub(crate) fn build_output(args: &PlanArgs<'_>) -> PlanOutput {
    let mode: PlanMode = match args.mode.parse() {
        Ok(mode) => mode,
        Err(message) => {
            let error = JsonError::new(error_codes::UNKNOWN_MODE, message);
            return PlanOutput::failure(vec![error], vec![], None);
        }
    };
    let limits = match reporting::resolve_limits(args.limits, None) {
        Ok(limits) => limits,
        Err(message) => {
            let error = JsonError::new(error_codes::UNKNOWN_LIMITS, message);
            return PlanOutput::failure(vec![error], vec![], None);
        }
    };

    let Loaded {
        document: spec,
        source_hash,
    } = match load_spec(Path::new(args.spec_path)) {
        Ok(loaded) => loaded,
        Err(e) => {
            let error = input_error_to_json(&e, args.spec_path);
            return PlanOutput::failure(vec![error], vec![], None);
        }
    };

    let (existing, existing_hash) = match args.existing_path {
        Some(path) => match load_existing(Path::new(path)) {
            Ok(loaded) => (loaded.document, Some(loaded.source_hash)),
            Err(e) => {
                let error = input_error_to_json(&e, path);
                return PlanOutput::failure(vec![error], vec![], Some(source_hash));
            }
        },
        None => (ExistingState::default(), None),
    };

    let model = match normalize_with_limits(&spec, &limits) {
        Ok(model) => model,
        Err(e) => {
            let error = reconcile_error_to_json(&e);
            return PlanOutput::failure(vec![error], vec![], Some(source_hash));
        }
    };
    let warnings: Vec<JsonWarning> = model.warnings.iter().map(warning_to_json).collect();

    let plan = match plan_state(&model, &existing, mode, args.delete_orphans) {
        Ok(plan) => plan,
        Err(e) => {
            let error = reconcile_error_to_json(&e);
            return PlanOutput::failure(vec![error], warnings, Some(source_hash));
        }
    };
    let hash = match plan_hash(&plan) {
        Ok(hash) => hash,
        Err(e) => {
            let error = JsonError::new(error_codes::JSON_SERIALIZE, e.to_string());
            return PlanOutput::failure(vec![error], warnings, Some(source_hash));
        }
    };

    let result = PlanResult {
        mode: mode.as_str().to_string(),
        delete_orphans: args.delete_orphans,
        summary: plan.summary,
        ops: plan.ops,
        revision: plan.revision,
        existing_hash,
    };
    PlanOutput::success(result, hash, source_hash, warnings)
}

fn print_plan(plan: &Plan) {
    if plan.is_empty() {
        return;
    }
    println!("\n{}", "Operations:".bold());
    for (index, op) in plan.ops.iter().enumerate() {
        let kind = match op {
            PlanOp::CreateBone { .. } | PlanOp::CreateCube { .. } => op.kind().green(),
            PlanOp::UpdateBone { .. } | PlanOp::UpdateCube { .. } => op.kind().yellow(),
            PlanOp::DeleteBone { .. } | PlanOp::DeleteCube { .. } => op.kind().red(),
        };
        let fields = changed_fields(op);
        let detail = if fields.is_empty() {
            String::new()
        } else {
            format!(" ({})", fields.join(", "))
        };
        println!(
            "  {:>3}. {} {}{}",
            index + 1,
            kind,
            op.target_name(),
            detail.dimmed()
        );
    }

    let s = &plan.summary;
    println!(
        "\n{} bones +{} ~{} -{}, cubes +{} ~{} -{}",
        "Summary:".dimmed(),
        s.create_bone,
        s.update_bone,
        s.delete_bone,
        s.create_cube,
        s.update_cube,
        s.delete_cube
    );
    if let Some(revision) = &plan.revision {
        println!("{} {}", "Revision:".dimmed(), revision);
    }
}

/// Wire names of the attributes an update touches.
fn changed_fields(op: &PlanOp) -> Vec<String> {
    let (changes, moved, moved_name) = match op {
        PlanOp::UpdateBone {
            changes,
            parent_root,
            ..
        } => (serde_json::to_value(changes), *parent_root, "parentRoot"),
        PlanOp::UpdateCube {
            changes, bone_root, ..
        } => (serde_json::to_value(changes), *bone_root, "boneRoot"),
        _ => return Vec::new(),
    };
    let mut fields: Vec<String> = match changes {
        Ok(serde_json::Value::Object(map)) => map.keys().cloned().collect(),
        _ => Vec::new(),
    };
    if moved {
        fields.push(moved_name.to_string());
    }
    fields
}
