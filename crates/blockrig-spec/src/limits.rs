//! Size limits applied during normalization.
//!
//! These stand in for the caller's limits provider. Named profiles mirror
//! how callers usually configure the engine: a roomy default and a strict
//! profile for untrusted input.

use serde::{Deserialize, Serialize};

/// Caller-configured size ceilings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Limits {
    /// Profile name.
    pub name: String,
    /// Maximum cubes after instance expansion.
    pub max_cubes: usize,
    /// Maximum bones, including template and injected root bones.
    pub max_bones: usize,
}

impl Limits {
    /// Default maximum cube count.
    pub const DEFAULT_MAX_CUBES: usize = 4096;

    /// Default maximum bone count.
    pub const DEFAULT_MAX_BONES: usize = 1024;

    /// Strict profile for untrusted input.
    pub fn strict() -> Self {
        Self {
            name: "strict".to_string(),
            max_cubes: 512,
            max_bones: 128,
        }
    }

    /// Looks up a profile by name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default()),
            "strict" => Some(Self::strict()),
            _ => None,
        }
    }

    /// Returns a copy with a different cube ceiling.
    pub fn with_max_cubes(mut self, max_cubes: usize) -> Self {
        self.max_cubes = max_cubes;
        self
    }

    /// Returns a copy with a different bone ceiling.
    pub fn with_max_bones(mut self, max_bones: usize) -> Self {
        self.max_bones = max_bones;
        self
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            max_cubes: Self::DEFAULT_MAX_CUBES,
            max_bones: Self::DEFAULT_MAX_BONES,
        }
    }
}
