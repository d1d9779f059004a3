//! Normalize command implementation
//!
//! Loads a model spec, normalizes it and prints the resolved model.

use anyhow::{Context, Result};
use blockrig_spec::{model_hash, normalize_with_limits, NormalizedModel};
use colored::Colorize;
use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;
use tracing::info;

use super::json_output::{
    error_codes, input_error_to_json, reconcile_error_to_json, warning_to_json, JsonError,
    NormalizeOutput, NormalizeResult,
};
use super::reporting;
use crate::input::{load_spec, Loaded};

/// Run the normalize command
///
/// # Arguments
/// * `spec_path` - Path to the model spec file
/// * `max_cubes` - Optional cube ceiling overriding the profile's
/// * `limits_name` - Optional limits profile name (default, strict)
/// * `json_output` - Whether to output machine-readable JSON diagnostics
/// * `pretty` - Whether to print the full normalized model (human mode)
///
/// # Returns
/// Exit code: 0 if the spec normalizes, 1 otherwise
pub fn run(
    spec_path: &str,
    max_cubes: Option<usize>,
    limits_name: Option<&str>,
    json_output: bool,
    pretty: bool,
) -> Result<ExitCode> {
    if json_output {
        run_json(spec_path, max_cubes, limits_name)
    } else {
        run_human(spec_path, max_cubes, limits_name, pretty)
    }
}

/// Run normalize with human-readable (colored) output
fn run_human(
    spec_path: &str,
    max_cubes: Option<usize>,
    limits_name: Option<&str>,
    pretty: bool,
) -> Result<ExitCode> {
    let start = Instant::now();
    let limits =
        reporting::resolve_limits(limits_name, max_cubes).map_err(anyhow::Error::msg)?;

    println!("{} {}", "Normalizing:".cyan().bold(), spec_path);
    if limits_name.is_some() || max_cubes.is_some() {
        println!(
            "{} {} (max {} cubes, {} bones)",
            "Limits:".dimmed(),
            limits.name,
            limits.max_cubes,
            limits.max_bones
        );
    }

    let Loaded {
        document: spec,
        source_hash,
    } = load_spec(Path::new(spec_path))
        .with_context(|| format!("Failed to load spec file: {}", spec_path))?;
    println!("{} json ({})", "Source:".dimmed(), &source_hash[..16]);

    let result = normalize_with_limits(&spec, &limits);
    let duration_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(model) => {
            reporting::print_warnings(&model.warnings);
            print_model(&model);
            if pretty {
                println!("\n{}", serde_json::to_string_pretty(&model)?);
            }
            let hash = model_hash(&model)?;
            info!(bones = model.bones.len(), cubes = model.cubes.len(), "normalized");
            println!(
                "\n{} {} bone(s), {} cube(s) ({}ms)",
                "SUCCESS".green().bold(),
                model.bones.len(),
                model.cubes.len(),
                duration_ms
            );
            println!("{} {}", "Model hash:".dimmed(), hash);
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            reporting::print_reconcile_error(&error);
            println!(
                "\n{} Spec does not normalize ({}ms)",
                "FAILED".red().bold(),
                duration_ms
            );
            Ok(ExitCode::from(1))
        }
    }
}

/// Run normalize with machine-readable JSON output
fn run_json(spec_path: &str, max_cubes: Option<usize>, limits_name: Option<&str>) -> Result<ExitCode> {
    let output = build_output(spec_path, max_cubes, limits_name);
    let json = serde_json::to_string_pretty(&output)
        .expect("NormalizeOutput serialization should not fail");
    println!("{}", json);

    if output.success {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

/// Builds the JSON output without printing it.
pub(crate) fn build_output(
    spec_path: &str,
    max_cubes: Option<usize>,
    limits_name: Option<&str>,
) -> NormalizeOutput {
    let limits = match reporting::resolve_limits(limits_name, max_cubes) {
        Ok(limits) => limits,
        Err(message) => {
            let error = JsonError::new(error_codes::UNKNOWN_LIMITS, message);
            return NormalizeOutput::failure(vec![error], None);
        }
    };

    let Loaded {
        document: spec,
        source_hash,
    } = match load_spec(Path::new(spec_path)) {
        Ok(loaded) => loaded,
        Err(e) => {
            return NormalizeOutput::failure(vec![input_error_to_json(&e, spec_path)], None);
        }
    };

    let model = match normalize_with_limits(&spec, &limits) {
        Ok(model) => model,
        Err(e) => {
            return NormalizeOutput::failure(vec![reconcile_error_to_json(&e)], Some(source_hash));
        }
    };

    let serialized = serde_json::to_value(&model).map_err(|e| e.to_string());
    let hash = model_hash(&model).map_err(|e| e.to_string());
    let (model_json, hash) = match (serialized, hash) {
        (Ok(model_json), Ok(hash)) => (model_json, hash),
        (Err(message), _) | (_, Err(message)) => {
            let error = JsonError::new(error_codes::JSON_SERIALIZE, message);
            return NormalizeOutput::failure(vec![error], Some(source_hash));
        }
    };

    let result = NormalizeResult {
        limits: limits.name.clone(),
        max_cubes: limits.max_cubes,
        bone_count: model.bones.len(),
        cube_count: model.cubes.len(),
        model: model_json,
    };
    let warnings = model.warnings.iter().map(warning_to_json).collect();
    NormalizeOutput::success(result, hash, source_hash, warnings)
}

fn print_model(model: &NormalizedModel) {
    println!("\n{}", "Bones:".bold());
    for bone in model.bones.values() {
        let parent = bone
            .parent_id
            .as_deref()
            .map(|p| format!(" <- {}", p))
            .unwrap_or_default();
        println!(
            "  {}{} pivot {}",
            bone.id.cyan(),
            parent.dimmed(),
            reporting::format_vec(bone.pivot)
        );
    }

    if model.cubes.is_empty() {
        return;
    }
    println!("\n{}", "Cubes:".bold());
    for cube in model.cubes.values() {
        println!(
            "  {} {} {}..{}",
            cube.id.cyan(),
            format!("on {}", cube.parent_id).dimmed(),
            reporting::format_vec(cube.from),
            reporting::format_vec(cube.to)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_spec(dir: &tempfile::TempDir, filename: &str, json: &str) -> std::path::PathBuf {
        let path = dir.path().join(filename);
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn normalize_human_success() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_spec(
            &tmp,
            "model.json",
            r#"{"rigTemplate": "biped", "cubes": [{"id": "hat", "parentId": "head", "from": [-4, 32, -4], "to": [4, 34, 4]}]}"#,
        );
        let code = run(path.to_str().unwrap(), None, None, false, true).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
    }

    #[test]
    fn normalize_human_reconcile_error_exits_one() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_spec(&tmp, "model.json", r#"{"cubes": [{"id": "box"}]}"#);
        let code = run(path.to_str().unwrap(), None, None, false, false).unwrap();
        assert_eq!(code, ExitCode::from(1));
    }

    #[test]
    fn normalize_human_missing_file_is_an_error() {
        assert!(run("/nonexistent/model.json", None, None, false, false).is_err());
    }

    #[test]
    fn normalize_json_output_success() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_spec(
            &tmp,
            "model.json",
            r#"{
                "cubes": [{"id": "post", "from": [0, 0, 0], "to": [1, 4, 1]}],
                "instances": [{"type": "repeat", "sourceId": "post", "count": 3, "delta": [2, 0, 0]}]
            }"#,
        );
        let output = build_output(path.to_str().unwrap(), None, None);
        assert!(output.success);
        assert_eq!(output.model_hash.as_deref().map(str::len), Some(64));
        let result = output.result.unwrap();
        assert_eq!(result.bone_count, 1);
        assert_eq!(result.cube_count, 4);
        assert_eq!(result.model["cubes"]["post_repeat_3"]["from"][0], 6.0);
    }

    #[test]
    fn normalize_json_output_reports_reconcile_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_spec(
            &tmp,
            "model.json",
            r#"{"cubes": [{"id": "a", "from": [0, 0, 0], "to": [1, 1, 1]}, {"id": "b", "from": [0, 0, 0], "to": [1, 1, 1]}]}"#,
        );
        let output = build_output(path.to_str().unwrap(), Some(1), None);
        assert!(!output.success);
        assert_eq!(output.errors[0].code, "R013");
        assert_eq!(output.errors[0].category.as_deref(), Some("invalid_payload"));
        assert!(output.source_hash.is_some());
    }

    #[test]
    fn normalize_json_output_warnings() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_spec(
            &tmp,
            "model.json",
            r#"{"instances": [{"type": "spiral", "sourceId": "x"}]}"#,
        );
        let output = build_output(path.to_str().unwrap(), None, None);
        assert!(output.success);
        assert_eq!(output.warnings.len(), 1);
        assert_eq!(output.warnings[0].code, "W001");
    }

    #[test]
    fn normalize_json_output_failure() {
        let code = run("/nonexistent/model.json", None, None, true, false).unwrap();
        assert_eq!(code, ExitCode::from(1));

        let output = build_output("/nonexistent/model.json", None, None);
        assert_eq!(output.errors[0].code, error_codes::FILE_READ);
        assert_eq!(output.errors[0].file.as_deref(), Some("/nonexistent/model.json"));
    }

    #[test]
    fn normalize_json_unknown_limits() {
        let output = build_output("model.json", None, Some("huge"));
        assert!(!output.success);
        assert_eq!(output.errors[0].code, error_codes::UNKNOWN_LIMITS);
    }
}
