//! Normalized model and live-state snapshot types.
//!
//! Normalized entities hold concrete values plus an explicit-flags record
//! telling the planner which attributes the caller actually set. Live-state
//! entities ([`BoneState`], [`CubeState`]) are the shape the external
//! applier reads and reports; create operations carry them as payload.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ReconcileWarning;
use crate::geometry::{self, Vec3, ONE, ZERO};

/// Which bone attributes were set by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoneFlags {
    pub id: bool,
    pub name: bool,
    pub parent: bool,
    pub pivot: bool,
    pub rotation: bool,
    pub scale: bool,
    pub visibility: bool,
}

/// Which cube attributes were set by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CubeFlags {
    pub id: bool,
    pub name: bool,
    pub parent: bool,
    /// from/to, center/size, or a center anchor.
    pub bounds: bool,
    /// An origin or an origin anchor.
    pub origin: bool,
    pub rotation: bool,
    pub inflate: bool,
    pub mirror: bool,
    pub visibility: bool,
    pub box_uv: bool,
    pub uv_offset: bool,
}

/// A bone after normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedBone {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub pivot: Vec3,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pivot_anchor_id: Option<String>,
    pub rotation: Vec3,
    pub scale: Vec3,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<bool>,
    pub explicit: BoneFlags,
}

impl NormalizedBone {
    /// Creates a bone with default transform and no explicit attributes.
    pub fn new(id: impl Into<String>, parent_id: Option<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            parent_id,
            pivot: ZERO,
            pivot_anchor_id: None,
            rotation: ZERO,
            scale: ONE,
            visibility: None,
            explicit: BoneFlags::default(),
        }
    }

    /// Returns the live-state shape of this bone.
    pub fn to_state(&self) -> BoneState {
        BoneState {
            id: Some(self.id.clone()),
            name: self.name.clone(),
            parent_id: self.parent_id.clone(),
            pivot: self.pivot,
            rotation: self.rotation,
            scale: self.scale,
            visibility: self.visibility,
        }
    }
}

/// A cube after normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedCube {
    pub id: String,
    pub name: String,
    /// Owning bone id; always names a bone in the same model.
    pub parent_id: String,
    pub from: Vec3,
    pub to: Vec3,
    pub origin: Vec3,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_anchor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_anchor_id: Option<String>,
    pub rotation: Vec3,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inflate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_uv: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uv_offset: Option<[f64; 2]>,
    pub explicit: CubeFlags,
}

impl NormalizedCube {
    /// Creates a cube spanning `from..to` with its origin at the box center.
    pub fn new(id: impl Into<String>, parent_id: impl Into<String>, from: Vec3, to: Vec3) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            parent_id: parent_id.into(),
            from,
            to,
            origin: geometry::center(from, to),
            origin_anchor_id: None,
            center_anchor_id: None,
            rotation: ZERO,
            inflate: None,
            mirror: None,
            visibility: None,
            box_uv: None,
            uv_offset: None,
            explicit: CubeFlags::default(),
        }
    }

    /// Geometric center of the box.
    pub fn center(&self) -> Vec3 {
        geometry::center(self.from, self.to)
    }

    /// Extent of the box.
    pub fn size(&self) -> Vec3 {
        geometry::size(self.from, self.to)
    }

    /// Returns the live-state shape of this cube.
    pub fn to_state(&self) -> CubeState {
        CubeState {
            id: Some(self.id.clone()),
            name: self.name.clone(),
            parent_id: Some(self.parent_id.clone()),
            from: self.from,
            to: self.to,
            origin: Some(self.origin),
            rotation: self.rotation,
            inflate: self.inflate,
            mirror: self.mirror,
            visibility: self.visibility,
            box_uv: self.box_uv,
            uv_offset: self.uv_offset,
        }
    }
}

/// Output of normalization: both keyed collections in insertion order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedModel {
    pub bones: IndexMap<String, NormalizedBone>,
    pub cubes: IndexMap<String, NormalizedCube>,
    /// Non-fatal findings collected along the way.
    #[serde(skip)]
    pub warnings: Vec<ReconcileWarning>,
}

impl NormalizedModel {
    /// Returns the live-state snapshot this model describes.
    ///
    /// Feeding it back to the planner as existing state yields an empty plan.
    pub fn to_state(&self) -> ExistingState {
        ExistingState {
            bones: self.bones.values().map(NormalizedBone::to_state).collect(),
            cubes: self.cubes.values().map(NormalizedCube::to_state).collect(),
            revision: None,
        }
    }
}

fn default_scale() -> Vec3 {
    ONE
}

/// A bone as it exists in live state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoneState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    /// Parent bone, referenced by id or name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub pivot: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<bool>,
}

impl BoneState {
    /// Creates a live bone with default transform.
    pub fn new(id: Option<&str>, name: impl Into<String>, parent_id: Option<&str>) -> Self {
        Self {
            id: id.map(str::to_string),
            name: name.into(),
            parent_id: parent_id.map(str::to_string),
            pivot: ZERO,
            rotation: ZERO,
            scale: ONE,
            visibility: None,
        }
    }
}

/// A cube as it exists in live state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CubeState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    /// Owning bone, referenced by id or name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub from: Vec3,
    pub to: Vec3,
    /// Missing means the box center.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Vec3>,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inflate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub box_uv: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv_offset: Option<[f64; 2]>,
}

impl CubeState {
    /// Creates a live cube spanning `from..to`.
    pub fn new(
        id: Option<&str>,
        name: impl Into<String>,
        parent_id: Option<&str>,
        from: Vec3,
        to: Vec3,
    ) -> Self {
        Self {
            id: id.map(str::to_string),
            name: name.into(),
            parent_id: parent_id.map(str::to_string),
            from,
            to,
            origin: None,
            rotation: ZERO,
            inflate: None,
            mirror: None,
            visibility: None,
            box_uv: None,
            uv_offset: None,
        }
    }

    /// The origin, defaulting to the box center.
    pub fn effective_origin(&self) -> Vec3 {
        self.origin
            .unwrap_or_else(|| geometry::center(self.from, self.to))
    }
}

/// A snapshot of live state handed in by the existing-state provider.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingState {
    #[serde(default)]
    pub bones: Vec<BoneState>,
    #[serde(default)]
    pub cubes: Vec<CubeState>,
    /// Opaque revision token, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

impl ExistingState {
    /// Parses a snapshot from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
