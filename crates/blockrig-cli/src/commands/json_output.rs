//! JSON output types for machine-readable CLI output.
//!
//! This module provides structured output types for the `--json` flag on
//! `normalize` and `plan`, so agents and scripts can consume results and
//! reconcile errors without scraping colored text.

use blockrig_spec::{PlanOp, PlanSummary, ReconcileError, ReconcileWarning};
use serde::{Deserialize, Serialize};

use crate::input::InputError;

/// Error codes for CLI operations.
///
/// These codes are stable and can be used for programmatic error handling.
/// Format: CLI_XXX for CLI-level errors; reconcile errors pass through their
/// own codes (R001...).
pub mod error_codes {
    /// File could not be read
    pub const FILE_READ: &str = "CLI_001";
    /// Unknown file extension
    pub const UNKNOWN_EXTENSION: &str = "CLI_002";
    /// JSON parse error
    pub const JSON_PARSE: &str = "CLI_003";
    /// Unknown limits profile
    pub const UNKNOWN_LIMITS: &str = "CLI_004";
    /// Unknown reconciliation mode
    pub const UNKNOWN_MODE: &str = "CLI_005";
    /// JSON serialization error
    pub const JSON_SERIALIZE: &str = "CLI_006";
}

/// A structured error in JSON output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonError {
    /// Stable error code (e.g., "CLI_001", "R003")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Machine category for reconcile errors (invalid_payload, invalid_state)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Path to the problematic field (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Source file path (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Suggestion for fixing the error (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl JsonError {
    /// Creates a new error with code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            category: None,
            path: None,
            file: None,
            suggestion: None,
        }
    }

    /// Sets the field path for this error.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the file path for this error.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Sets a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// A structured warning in JSON output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonWarning {
    /// Stable warning code (e.g., "W001")
    pub code: String,
    /// Human-readable warning message
    pub message: String,
    /// Path to the field the warning is about (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Converts a document loading error to a JSON error.
pub fn input_error_to_json(error: &InputError, file: &str) -> JsonError {
    let code = match error {
        InputError::FileRead { .. } => error_codes::FILE_READ,
        InputError::UnknownExtension { .. } => error_codes::UNKNOWN_EXTENSION,
        InputError::JsonParse { .. } => error_codes::JSON_PARSE,
    };
    JsonError::new(code, error.to_string()).with_file(file)
}

/// Converts a reconcile error to a JSON error, keeping its code and category.
pub fn reconcile_error_to_json(error: &ReconcileError) -> JsonError {
    let mut json = JsonError::new(error.code.code(), error.message.clone());
    json.category = Some(error.category().to_string());
    if let Some(path) = &error.path {
        json = json.with_path(path.clone());
    }
    if let Some(fix) = &error.fix {
        json = json.with_suggestion(fix.clone());
    }
    json
}

/// Converts a reconcile warning to a JSON warning.
pub fn warning_to_json(warning: &ReconcileWarning) -> JsonWarning {
    JsonWarning {
        code: warning.code.code().to_string(),
        message: warning.message.clone(),
        path: warning.path.clone(),
    }
}

/// Output of `blockrig normalize --json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeOutput {
    /// Whether normalization succeeded
    pub success: bool,
    /// Errors (empty on success)
    pub errors: Vec<JsonError>,
    /// Non-fatal warnings
    pub warnings: Vec<JsonWarning>,
    /// Normalization details (on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<NormalizeResult>,
    /// Canonical hash of the normalized model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_hash: Option<String>,
    /// BLAKE3 hash of the spec file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_hash: Option<String>,
}

/// Normalization result details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeResult {
    /// Limits profile used
    pub limits: String,
    /// Cube ceiling applied
    pub max_cubes: usize,
    /// Number of resolved bones
    pub bone_count: usize,
    /// Number of resolved cubes, instances included
    pub cube_count: usize,
    /// The normalized model
    pub model: serde_json::Value,
}

impl NormalizeOutput {
    /// Creates a successful normalize output.
    pub fn success(
        result: NormalizeResult,
        model_hash: String,
        source_hash: String,
        warnings: Vec<JsonWarning>,
    ) -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            warnings,
            result: Some(result),
            model_hash: Some(model_hash),
            source_hash: Some(source_hash),
        }
    }

    /// Creates a failed normalize output.
    pub fn failure(errors: Vec<JsonError>, source_hash: Option<String>) -> Self {
        Self {
            success: false,
            errors,
            warnings: Vec::new(),
            result: None,
            model_hash: None,
            source_hash,
        }
    }
}

/// Output of `blockrig plan --json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanOutput {
    /// Whether planning succeeded
    pub success: bool,
    /// Errors (empty on success)
    pub errors: Vec<JsonError>,
    /// Non-fatal warnings from normalization
    pub warnings: Vec<JsonWarning>,
    /// Plan details (on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<PlanResult>,
    /// Canonical hash of the operation list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_hash: Option<String>,
    /// BLAKE3 hash of the spec file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_hash: Option<String>,
}

/// Plan result details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResult {
    /// Reconciliation mode
    pub mode: String,
    /// Whether orphan deletion was requested
    pub delete_orphans: bool,
    /// Operation counts
    pub summary: PlanSummary,
    /// Ordered operations
    pub ops: Vec<PlanOp>,
    /// Revision token of the existing state, passed through
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    /// BLAKE3 hash of the existing-state file (if one was given)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_hash: Option<String>,
}

impl PlanOutput {
    /// Creates a successful plan output.
    pub fn success(
        result: PlanResult,
        plan_hash: String,
        source_hash: String,
        warnings: Vec<JsonWarning>,
    ) -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            warnings,
            result: Some(result),
            plan_hash: Some(plan_hash),
            source_hash: Some(source_hash),
        }
    }

    /// Creates a failed plan output.
    pub fn failure(
        errors: Vec<JsonError>,
        warnings: Vec<JsonWarning>,
        source_hash: Option<String>,
    ) -> Self {
        Self {
            success: false,
            errors,
            warnings,
            result: None,
            plan_hash: None,
            source_hash,
        }
    }
}
