//! Error and warning types for normalization and planning.

use thiserror::Error;

/// Error codes for reconciliation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Payload errors (R001-R014)
    /// R001: Malformed entry (no id and no name, zero count, bad policy values)
    InvalidEntry,
    /// R002: Id omitted while the id policy is `explicit`
    MissingId,
    /// R003: Duplicate id
    DuplicateId,
    /// R004: Duplicate name
    DuplicateName,
    /// R005: Cube has neither from/to nor center/size
    MissingBounds,
    /// R006: Parent references a bone that does not exist
    UnknownParent,
    /// R007: Bone hierarchy contains a cycle
    ParentCycle,
    /// R008: Anchor ids referenced but no anchors supplied
    AnchorsRequired,
    /// R009: Anchor id not found
    AnchorNotFound,
    /// R010: Anchor target bone or cube not found
    AnchorTargetNotFound,
    /// R011: Anchor resolution cycle
    AnchorCycle,
    /// R012: Instance source cube not found
    InstanceSourceNotFound,
    /// R013: Too many cubes
    CubeLimitExceeded,
    /// R014: Too many bones
    BoneLimitExceeded,

    // State errors (R015-R016)
    /// R015: Entity already exists (create mode)
    AlreadyExists,
    /// R016: Entity not found (patch mode)
    NotFound,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "R001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::InvalidEntry => "R001",
            ErrorCode::MissingId => "R002",
            ErrorCode::DuplicateId => "R003",
            ErrorCode::DuplicateName => "R004",
            ErrorCode::MissingBounds => "R005",
            ErrorCode::UnknownParent => "R006",
            ErrorCode::ParentCycle => "R007",
            ErrorCode::AnchorsRequired => "R008",
            ErrorCode::AnchorNotFound => "R009",
            ErrorCode::AnchorTargetNotFound => "R010",
            ErrorCode::AnchorCycle => "R011",
            ErrorCode::InstanceSourceNotFound => "R012",
            ErrorCode::CubeLimitExceeded => "R013",
            ErrorCode::BoneLimitExceeded => "R014",
            ErrorCode::AlreadyExists => "R015",
            ErrorCode::NotFound => "R016",
        }
    }

    /// Returns the machine category of the error.
    ///
    /// `invalid_payload` means the desired spec itself is wrong;
    /// `invalid_state` means it disagrees with the live state for the
    /// requested mode.
    pub fn category(&self) -> &'static str {
        match self {
            ErrorCode::AlreadyExists | ErrorCode::NotFound => "invalid_state",
            _ => "invalid_payload",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Warning codes for non-fatal findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCode {
    /// W001: Unknown instance directive kind, skipped
    UnknownInstanceKind,
    /// W002: Template entry replaced by a caller entry with the same id
    TemplateOverridden,
}

impl WarningCode {
    /// Returns the warning code string (e.g., "W001").
    pub fn code(&self) -> &'static str {
        match self {
            WarningCode::UnknownInstanceKind => "W001",
            WarningCode::TemplateOverridden => "W002",
        }
    }
}

impl std::fmt::Display for WarningCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A fatal reconciliation error.
///
/// Any error means no state change may occur: the caller must not apply a
/// partial plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileError {
    /// The error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// Path to the problematic field (e.g., "cubes\[1\].parentId").
    pub path: Option<String>,
    /// Remediation hint.
    pub fix: Option<String>,
}

impl ReconcileError {
    /// Creates a new error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
            fix: None,
        }
    }

    /// Creates a new error with a field path.
    pub fn with_path(code: ErrorCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
            fix: None,
        }
    }

    /// Attaches a remediation hint.
    pub fn fix(mut self, fix: impl Into<String>) -> Self {
        self.fix = Some(fix.into());
        self
    }

    /// Returns the machine category (`invalid_payload` or `invalid_state`).
    pub fn category(&self) -> &'static str {
        self.code.category()
    }
}

impl std::fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for ReconcileError {}

/// A non-fatal warning attached to a successful result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileWarning {
    /// The warning code.
    pub code: WarningCode,
    /// Human-readable warning message.
    pub message: String,
    /// Path to the field the warning is about.
    pub path: Option<String>,
}

impl ReconcileWarning {
    /// Creates a new warning with a field path.
    pub fn with_path(
        code: WarningCode,
        message: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ReconcileWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

/// Top-level error type for document handling.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Normalization or planning failed.
    #[error("reconcile failed: {0}")]
    Reconcile(#[from] ReconcileError),
}
