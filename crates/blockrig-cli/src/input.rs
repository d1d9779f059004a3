//! Document loading for model specs and existing-state snapshots.
//!
//! Both documents are JSON. Loading returns the parsed document together
//! with a BLAKE3 hash of the raw file so reports can name their inputs.

use blockrig_spec::{ExistingState, ModelSpec};
use std::path::{Path, PathBuf};

/// Recognized JSON extensions.
pub const JSON_EXTENSIONS: &[&str] = &["json"];

/// A loaded document plus source provenance.
#[derive(Debug)]
pub struct Loaded<T> {
    /// The parsed document.
    pub document: T,
    /// BLAKE3 hash of the source file content (hex string).
    pub source_hash: String,
}

/// Errors that can occur during document loading.
#[derive(Debug)]
pub enum InputError {
    /// File could not be read.
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Unknown file extension.
    UnknownExtension { extension: Option<String> },

    /// JSON parsing failed.
    JsonParse { message: String },
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::FileRead { path, source } => {
                write!(f, "failed to read file '{}': {}", path.display(), source)
            }
            InputError::UnknownExtension { extension } => match extension {
                Some(ext) => write!(f, "unknown file extension '.{}' (expected .json)", ext),
                None => write!(f, "file has no extension (expected .json)"),
            },
            InputError::JsonParse { message } => {
                write!(f, "JSON parse error: {}", message)
            }
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InputError::FileRead { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Load a model spec from a JSON file.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use blockrig_cli::input::load_spec;
///
/// let loaded = load_spec(Path::new("model.json")).unwrap();
/// println!("{} bones declared", loaded.document.bones.len());
/// ```
pub fn load_spec(path: &Path) -> Result<Loaded<ModelSpec>, InputError> {
    let (content, source_hash) = read_json_file(path)?;
    let document = ModelSpec::from_json(&content).map_err(|e| InputError::JsonParse {
        message: e.to_string(),
    })?;
    Ok(Loaded {
        document,
        source_hash,
    })
}

/// Load an existing-state snapshot from a JSON file.
pub fn load_existing(path: &Path) -> Result<Loaded<ExistingState>, InputError> {
    let (content, source_hash) = read_json_file(path)?;
    let document = ExistingState::from_json(&content).map_err(|e| InputError::JsonParse {
        message: e.to_string(),
    })?;
    Ok(Loaded {
        document,
        source_hash,
    })
}

/// Reads a `.json` file and hashes its raw content.
fn read_json_file(path: &Path) -> Result<(String, String), InputError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase());

    match extension.as_deref() {
        Some(ext) if JSON_EXTENSIONS.contains(&ext) => {}
        _ => return Err(InputError::UnknownExtension { extension }),
    }

    let content = std::fs::read_to_string(path).map_err(|e| InputError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let source_hash = blake3::hash(content.as_bytes()).to_hex().to_string();
    Ok((content, source_hash))
}
