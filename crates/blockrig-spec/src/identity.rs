//! Stable identifiers for bones and cubes the caller left without an id.
//!
//! Both derived forms start from the same path string:
//!
//! ```text
//! path = kind ":" parentId ":" label
//! ```
//!
//! where `label` is the entity's name and `parentId` is empty for an
//! unparented entity. `stable_path` turns it into a readable slug, `hash`
//! into a fixed-width BLAKE3 prefix.

use std::sync::OnceLock;

use regex::Regex;

use crate::spec::IdPolicy;

/// Number of hex characters kept from the BLAKE3 digest.
pub const HASH_ID_LEN: usize = 16;

static SLUG_SEPARATOR: OnceLock<Regex> = OnceLock::new();

fn slug_separator() -> &'static Regex {
    SLUG_SEPARATOR.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("invalid regex pattern"))
}

/// Which collection an entity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Bone,
    Cube,
}

impl EntityKind {
    /// Returns the kind as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Bone => "bone",
            EntityKind::Cube => "cube",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Builds the `kind:parentId:label` path string.
pub fn path_key(kind: EntityKind, parent_id: Option<&str>, label: &str) -> String {
    format!("{}:{}:{}", kind, parent_id.unwrap_or(""), label)
}

/// Lowercases `path` and collapses every run of other characters to `_`.
pub fn sanitize_slug(path: &str) -> String {
    let lowered = path.to_lowercase();
    slug_separator()
        .replace_all(&lowered, "_")
        .trim_matches('_')
        .to_string()
}

/// Returns the first [`HASH_ID_LEN`] hex characters of BLAKE3(`path`).
pub fn hash_id(path: &str) -> String {
    let hash = blake3::hash(path.as_bytes());
    hash.to_hex().as_str()[..HASH_ID_LEN].to_string()
}

/// Resolves the id of an entity under `policy`.
///
/// A caller-supplied, non-blank id always wins. Otherwise the id is derived
/// from the path string, except under [`IdPolicy::Explicit`], which returns
/// `None` so the caller can report the missing id.
pub fn resolve_id(
    policy: IdPolicy,
    kind: EntityKind,
    id: Option<&str>,
    parent_id: Option<&str>,
    label: &str,
) -> Option<String> {
    if let Some(id) = id.map(str::trim).filter(|id| !id.is_empty()) {
        return Some(id.to_string());
    }
    let path = path_key(kind, parent_id, label);
    match policy {
        IdPolicy::Explicit => None,
        IdPolicy::StablePath => {
            let slug = sanitize_slug(&path);
            // a label made only of symbols still needs a usable id
            if slug.is_empty() {
                Some(hash_id(&path))
            } else {
                Some(slug)
            }
        }
        IdPolicy::Hash => Some(hash_id(&path)),
    }
}
