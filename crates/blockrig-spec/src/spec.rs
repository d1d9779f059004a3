//! Desired-model document types.
//!
//! A [`ModelSpec`] is the caller's declarative description of the model.
//! Every attribute is optional at this boundary: `None` means "not set by the
//! caller", which normalization turns into a default plus a cleared explicit
//! flag.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::geometry::{Axis, Bounds, Vec3};
use crate::template::RigTemplate;

/// Policy for deriving ids that the caller omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdPolicy {
    /// Every bone and cube must carry an id.
    Explicit,
    /// Sanitized slug of `kind:parentId:label`.
    #[default]
    StablePath,
    /// Fixed-width BLAKE3 hash of `kind:parentId:label`.
    Hash,
}

impl IdPolicy {
    /// Returns the policy name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            IdPolicy::Explicit => "explicit",
            IdPolicy::StablePath => "stable_path",
            IdPolicy::Hash => "hash",
        }
    }
}

/// Normalization policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModelPolicy {
    /// How omitted ids are derived.
    #[serde(default)]
    pub id_policy: IdPolicy,
    /// Parent used when a bone or cube omits `parentId`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_parent_id: Option<String>,
    /// Inject a `root` bone when none exists, and parent orphans to it.
    #[serde(default = "default_true")]
    pub enforce_root: bool,
    /// Grid size that every final position is snapped to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snap_grid: Option<f64>,
    /// Bounds that every final position is clamped into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
}

fn default_true() -> bool {
    true
}

impl Default for ModelPolicy {
    fn default() -> Self {
        Self {
            id_policy: IdPolicy::default(),
            default_parent_id: None,
            enforce_root: true,
            snap_grid: None,
            bounds: None,
        }
    }
}

/// A desired bone.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BoneSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pivot: Option<Vec3>,
    /// Anchor whose resolved point replaces the pivot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pivot_anchor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<bool>,
}

impl BoneSpec {
    /// Creates a bone spec with only a name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

/// A desired cube.
///
/// The box comes from `from`/`to`, or from `center`/`size` when the corners
/// are absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CubeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Owning bone id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Vec3>,
    /// Anchor whose resolved point replaces the origin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_anchor_id: Option<String>,
    /// Anchor whose resolved point becomes the box center.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_anchor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Vec3>,
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

impl CubeSpec {
    /// Creates a cube spec from two corners.
    pub fn from_to(name: impl Into<String>, from: Vec3, to: Vec3) -> Self {
        Self {
            name: Some(name.into()),
            from: Some(from),
            to: Some(to),
            ..Default::default()
        }
    }
}

/// Anchor target pointing at a bone's pivot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BoneTarget {
    pub bone_id: String,
}

/// Anchor target pointing at a cube's origin or center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CubeTarget {
    pub cube_id: String,
}

/// What an anchor points at: exactly one bone or one cube.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnchorTarget {
    /// `{"boneId": ".."}`
    Bone(BoneTarget),
    /// `{"cubeId": ".."}`
    Cube(CubeTarget),
}

impl AnchorTarget {
    /// Targets a bone pivot.
    pub fn bone(id: impl Into<String>) -> Self {
        AnchorTarget::Bone(BoneTarget { bone_id: id.into() })
    }

    /// Targets a cube origin or center.
    pub fn cube(id: impl Into<String>) -> Self {
        AnchorTarget::Cube(CubeTarget { cube_id: id.into() })
    }
}

/// A named, offsettable reference to another entity's position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AnchorSpec {
    pub id: String,
    pub target: AnchorTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<Vec3>,
}

/// Mirror a source cube across a plane normal to `axis`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MirrorInstance {
    pub source_id: String,
    pub axis: Axis,
    /// Plane position along `axis`.
    #[serde(default)]
    pub offset: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
}

/// Repeat a source cube `count` times, each step translated by `delta`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RepeatInstance {
    pub source_id: String,
    pub count: u32,
    pub delta: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_prefix: Option<String>,
}

/// Distribute `count` copies of a source cube around `center`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RadialInstance {
    pub source_id: String,
    pub count: u32,
    pub axis: Axis,
    #[serde(default)]
    pub center: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    /// Degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_angle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_prefix: Option<String>,
}

/// A recognized instance directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InstanceKind {
    Mirror(MirrorInstance),
    Repeat(RepeatInstance),
    Radial(RadialInstance),
}

impl InstanceKind {
    /// Id of the cube this directive copies.
    pub fn source_id(&self) -> &str {
        match self {
            InstanceKind::Mirror(m) => &m.source_id,
            InstanceKind::Repeat(r) => &r.source_id,
            InstanceKind::Radial(r) => &r.source_id,
        }
    }
}

/// An instance directive as it appears in the document.
///
/// Directive types this version does not know are kept as raw JSON so they
/// can be reported and skipped instead of failing the whole document.
#[derive(Debug, Clone, PartialEq)]
pub enum InstanceSpec {
    Known(InstanceKind),
    Unknown {
        kind: String,
        raw: serde_json::Value,
    },
}

const KNOWN_INSTANCE_KINDS: &[&str] = &["mirror", "repeat", "radial"];

impl<'de> Deserialize<'de> for InstanceSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        let kind = match raw.get("type").and_then(|t| t.as_str()) {
            Some(kind) => kind.to_string(),
            None => return Err(D::Error::custom("instance directive is missing 'type'")),
        };
        if KNOWN_INSTANCE_KINDS.contains(&kind.as_str()) {
            serde_json::from_value(raw)
                .map(InstanceSpec::Known)
                .map_err(D::Error::custom)
        } else {
            Ok(InstanceSpec::Unknown { kind, raw })
        }
    }
}

impl Serialize for InstanceSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            InstanceSpec::Known(kind) => kind.serialize(serializer),
            InstanceSpec::Unknown { raw, .. } => raw.serialize(serializer),
        }
    }
}

impl From<InstanceKind> for InstanceSpec {
    fn from(kind: InstanceKind) -> Self {
        InstanceSpec::Known(kind)
    }
}

/// The desired model document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModelSpec {
    /// Starter bones/cubes merged under the caller's entries.
    #[serde(default)]
    pub rig_template: RigTemplate,
    #[serde(default)]
    pub bones: Vec<BoneSpec>,
    #[serde(default)]
    pub cubes: Vec<CubeSpec>,
    #[serde(default)]
    pub anchors: Vec<AnchorSpec>,
    #[serde(default)]
    pub instances: Vec<InstanceSpec>,
    #[serde(default)]
    pub policy: ModelPolicy,
}

impl ModelSpec {
    /// Parses a spec from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parses a spec from a JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Serializes the spec to pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Returns true if any bone or cube references an anchor id.
    pub fn references_anchors(&self) -> bool {
        self.bones.iter().any(|b| b.pivot_anchor_id.is_some())
            || self
                .cubes
                .iter()
                .any(|c| c.origin_anchor_id.is_some() || c.center_anchor_id.is_some())
    }
}
