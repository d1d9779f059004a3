//! Spec normalization.
//!
//! Turns a [`ModelSpec`] into a [`NormalizedModel`]:
//!
//! 1. expand the rig template
//! 2. resolve every caller bone and cube (ids, parents, bounds, flags)
//! 3. inject the `root` bone when `enforceRoot` asks for it
//! 4. check uniqueness, parent references, parent cycles and ceilings
//! 5. resolve anchors ([`anchors`]) and expand instances ([`instances`])
//! 6. re-check the cube ceiling and cube names
//! 7. snap and clamp every final position
//!
//! The first problem found is returned; nothing is partially applied.

mod anchors;
mod instances;

#[cfg(test)]
mod tests;

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{ErrorCode, ReconcileError, ReconcileWarning, WarningCode};
use crate::geometry::{self, Vec3, ONE, ZERO};
use crate::identity::{resolve_id, EntityKind};
use crate::limits::Limits;
use crate::model::{BoneFlags, CubeFlags, NormalizedBone, NormalizedCube, NormalizedModel};
use crate::spec::{BoneSpec, CubeSpec, IdPolicy, ModelPolicy, ModelSpec};
use crate::template::{RigTemplate, ROOT_BONE_ID};

const EXPLICIT_ID_FIX: &str = "set idPolicy to stable_path/hash or supply all ids";

/// Normalizes a spec with default limits and the given cube ceiling.
///
/// # Example
/// ```
/// use blockrig_spec::{normalize, BoneSpec, ModelSpec};
///
/// let spec = ModelSpec {
///     bones: vec![BoneSpec::named("spine")],
///     ..Default::default()
/// };
/// let model = normalize(&spec, 64).unwrap();
/// // `root` is injected and `spine` is parented to it
/// assert_eq!(model.bones.len(), 2);
/// assert_eq!(model.bones["bone_root_spine"].parent_id.as_deref(), Some("root"));
/// ```
pub fn normalize(spec: &ModelSpec, max_cubes: usize) -> Result<NormalizedModel, ReconcileError> {
    normalize_with_limits(spec, &Limits::default().with_max_cubes(max_cubes))
}

/// Normalizes a spec against a full set of limits.
pub fn normalize_with_limits(
    spec: &ModelSpec,
    limits: &Limits,
) -> Result<NormalizedModel, ReconcileError> {
    validate_policy(&spec.policy)?;

    let mut warnings = Vec::new();
    let (mut bones, mut cubes) = expand_template(spec.rig_template);
    debug!(
        template = %spec.rig_template,
        bones = bones.len(),
        cubes = cubes.len(),
        "expanded rig template"
    );

    merge_caller_bones(spec, &mut bones, &mut warnings)?;
    merge_caller_cubes(spec, &mut cubes, &mut warnings)?;

    if spec.policy.enforce_root && !bones.contains_key(ROOT_BONE_ID) {
        let mut with_root = IndexMap::with_capacity(bones.len() + 1);
        with_root.insert(
            ROOT_BONE_ID.to_string(),
            NormalizedBone::new(ROOT_BONE_ID, None),
        );
        with_root.extend(bones);
        bones = with_root;
        debug!("injected root bone");
    }

    validate_bones(&bones, limits)?;
    validate_cubes(&cubes, &bones)?;
    check_cube_ceiling(cubes.len(), limits)?;

    anchors::resolve_anchors(spec, &mut bones, &mut cubes)?;

    let expansion = instances::expand_instances(&spec.instances, &mut cubes, limits.max_cubes)?;
    warnings.extend(expansion.warnings);

    check_cube_ceiling(cubes.len(), limits)?;
    validate_unique_cube_names(&cubes)?;

    apply_grid_and_bounds(&spec.policy, &mut bones, &mut cubes);

    debug!(
        bones = bones.len(),
        cubes = cubes.len(),
        generated = expansion.created,
        warnings = warnings.len(),
        "normalized model"
    );

    Ok(NormalizedModel {
        bones,
        cubes,
        warnings,
    })
}

fn validate_policy(policy: &ModelPolicy) -> Result<(), ReconcileError> {
    if let Some(grid) = policy.snap_grid {
        if !(grid.is_finite() && grid > 0.0) {
            return Err(ReconcileError::with_path(
                ErrorCode::InvalidEntry,
                format!("snapGrid must be a positive number, got {}", grid),
                "policy.snapGrid",
            ));
        }
    }
    if let Some(bounds) = policy.bounds {
        if !bounds.is_valid() {
            return Err(ReconcileError::with_path(
                ErrorCode::InvalidEntry,
                format!(
                    "bounds.min {:?} must not exceed bounds.max {:?}",
                    bounds.min, bounds.max
                ),
                "policy.bounds",
            ));
        }
    }
    Ok(())
}

type BoneMap = IndexMap<String, NormalizedBone>;
type CubeMap = IndexMap<String, NormalizedCube>;

fn expand_template(template: RigTemplate) -> (BoneMap, CubeMap) {
    let bones = template
        .bones()
        .iter()
        .map(|tb| {
            let mut bone = NormalizedBone::new(tb.id, tb.parent.map(str::to_string));
            bone.pivot = tb.pivot;
            (tb.id.to_string(), bone)
        })
        .collect();
    let cubes = template
        .cubes()
        .iter()
        .map(|tc| {
            (
                tc.id.to_string(),
                NormalizedCube::new(tc.id, tc.parent, tc.from, tc.to),
            )
        })
        .collect();
    (bones, cubes)
}

/// Effective parent for an entity that may omit `parentId`.
fn default_parent(policy: &ModelPolicy) -> Option<String> {
    policy.default_parent_id.clone().or_else(|| {
        policy
            .enforce_root
            .then(|| ROOT_BONE_ID.to_string())
    })
}

/// Resolves an entity's label and id, reporting why when it cannot.
fn resolve_identity(
    policy: IdPolicy,
    kind: EntityKind,
    id: Option<&str>,
    name: Option<&str>,
    parent_id: Option<&str>,
    path: &str,
) -> Result<(String, String), ReconcileError> {
    let name = name.filter(|n| !n.trim().is_empty());
    let label = name
        .or(id.filter(|i| !i.trim().is_empty()))
        .ok_or_else(|| {
            ReconcileError::with_path(
                ErrorCode::InvalidEntry,
                format!("{} requires an id or a name", kind),
                path,
            )
        })?;
    let id = resolve_id(policy, kind, id, parent_id, label).ok_or_else(|| {
        ReconcileError::with_path(
            ErrorCode::MissingId,
            format!(
                "{} '{}' has no id and idPolicy is explicit",
                kind, label
            ),
            format!("{}.id", path),
        )
        .fix(EXPLICIT_ID_FIX)
    })?;
    let name = name.unwrap_or(id.as_str()).to_string();
    Ok((id, name))
}

fn normalize_bone(
    spec: &BoneSpec,
    index: usize,
    policy: &ModelPolicy,
) -> Result<NormalizedBone, ReconcileError> {
    let path = format!("bones[{}]", index);
    let explicit_parent = spec.parent_id.clone();
    let parent_id = explicit_parent.clone().or_else(|| default_parent(policy));
    let (id, name) = resolve_identity(
        policy.id_policy,
        EntityKind::Bone,
        spec.id.as_deref(),
        spec.name.as_deref(),
        parent_id.as_deref(),
        &path,
    )?;
    // a defaulted parent never points a bone at itself (the root bone)
    let parent_id = match parent_id {
        Some(p) if explicit_parent.is_none() && p == id => None,
        other => other,
    };

    Ok(NormalizedBone {
        id,
        name,
        parent_id,
        pivot: spec.pivot.unwrap_or(ZERO),
        pivot_anchor_id: spec.pivot_anchor_id.clone(),
        rotation: spec.rotation.unwrap_or(ZERO),
        scale: spec.scale.unwrap_or(ONE),
        visibility: spec.visibility,
        explicit: BoneFlags {
            id: spec.id.is_some(),
            name: spec.name.is_some(),
            parent: explicit_parent.is_some(),
            pivot: spec.pivot.is_some() || spec.pivot_anchor_id.is_some(),
            rotation: spec.rotation.is_some(),
            scale: spec.scale.is_some(),
            visibility: spec.visibility.is_some(),
        },
    })
}

/// Computes a cube's corners from from/to, or from center/size.
fn cube_bounds(spec: &CubeSpec, label: &str, path: &str) -> Result<(Vec3, Vec3), ReconcileError> {
    if let (Some(from), Some(to)) = (spec.from, spec.to) {
        return Ok((from, to));
    }
    // a center anchor supplies the center later; only the size is needed now
    let center = match (spec.center, spec.center_anchor_id.is_some()) {
        (Some(center), _) => Some(center),
        (None, true) => Some(ZERO),
        (None, false) => None,
    };
    match (center, spec.size) {
        (Some(center), Some(size)) => {
            let half = geometry::scale(size, 0.5);
            Ok((geometry::subtract(center, half), geometry::add(center, half)))
        }
        _ => Err(ReconcileError::with_path(
            ErrorCode::MissingBounds,
            format!("cube '{}' needs from/to or center/size", label),
            path,
        )
        .fix("supply both from and to, or both center and size")),
    }
}

fn normalize_cube(
    spec: &CubeSpec,
    index: usize,
    policy: &ModelPolicy,
) -> Result<NormalizedCube, ReconcileError> {
    let path = format!("cubes[{}]", index);
    let parent_id = spec.parent_id.clone().or_else(|| default_parent(policy));
    let (id, name) = resolve_identity(
        policy.id_policy,
        EntityKind::Cube,
        spec.id.as_deref(),
        spec.name.as_deref(),
        parent_id.as_deref(),
        &path,
    )?;
    let parent_id = parent_id.ok_or_else(|| {
        ReconcileError::with_path(
            ErrorCode::UnknownParent,
            format!("cube '{}' has no parent bone", id),
            format!("{}.parentId", path),
        )
        .fix("set parentId, policy.defaultParentId, or enable policy.enforceRoot")
    })?;
    let (from, to) = cube_bounds(spec, &id, &path)?;

    Ok(NormalizedCube {
        origin: spec.origin.unwrap_or_else(|| geometry::center(from, to)),
        id,
        name,
        parent_id,
        from,
        to,
        origin_anchor_id: spec.origin_anchor_id.clone(),
        center_anchor_id: spec.center_anchor_id.clone(),
        rotation: spec.rotation.unwrap_or(ZERO),
        inflate: spec.inflate,
        mirror: spec.mirror,
        visibility: spec.visibility,
        box_uv: spec.box_uv,
        uv_offset: spec.uv_offset,
        explicit: CubeFlags {
            id: spec.id.is_some(),
            name: spec.name.is_some(),
            parent: spec.parent_id.is_some(),
            bounds: spec.from.is_some()
                || spec.center.is_some()
                || spec.size.is_some()
                || spec.center_anchor_id.is_some(),
            origin: spec.origin.is_some() || spec.origin_anchor_id.is_some(),
            rotation: spec.rotation.is_some(),
            inflate: spec.inflate.is_some(),
            mirror: spec.mirror.is_some(),
            visibility: spec.visibility.is_some(),
            box_uv: spec.box_uv.is_some(),
            uv_offset: spec.uv_offset.is_some(),
        },
    })
}

/// Inserts caller bones; an id already used by the template is replaced in place.
fn merge_caller_bones(
    spec: &ModelSpec,
    bones: &mut BoneMap,
    warnings: &mut Vec<ReconcileWarning>,
) -> Result<(), ReconcileError> {
    let mut seen = HashSet::new();
    for (i, bone_spec) in spec.bones.iter().enumerate() {
        let bone = normalize_bone(bone_spec, i, &spec.policy)?;
        if !seen.insert(bone.id.clone()) {
            return Err(ReconcileError::with_path(
                ErrorCode::DuplicateId,
                format!("duplicate bone id '{}'", bone.id),
                format!("bones[{}].id", i),
            ));
        }
        if bones.contains_key(&bone.id) {
            warnings.push(template_override_warning(
                EntityKind::Bone,
                &bone.id,
                format!("bones[{}]", i),
            ));
        }
        bones.insert(bone.id.clone(), bone);
    }
    Ok(())
}

fn merge_caller_cubes(
    spec: &ModelSpec,
    cubes: &mut CubeMap,
    warnings: &mut Vec<ReconcileWarning>,
) -> Result<(), ReconcileError> {
    let mut seen = HashSet::new();
    for (i, cube_spec) in spec.cubes.iter().enumerate() {
        let cube = normalize_cube(cube_spec, i, &spec.policy)?;
        if !seen.insert(cube.id.clone()) {
            return Err(ReconcileError::with_path(
                ErrorCode::DuplicateId,
                format!("duplicate cube id '{}'", cube.id),
                format!("cubes[{}].id", i),
            ));
        }
        if cubes.contains_key(&cube.id) {
            warnings.push(template_override_warning(
                EntityKind::Cube,
                &cube.id,
                format!("cubes[{}]", i),
            ));
        }
        cubes.insert(cube.id.clone(), cube);
    }
    Ok(())
}

fn template_override_warning(kind: EntityKind, id: &str, path: String) -> ReconcileWarning {
    let warning = ReconcileWarning::with_path(
        WarningCode::TemplateOverridden,
        format!("{} '{}' replaces the template entry with the same id", kind, id),
        path,
    );
    tracing::warn!(%warning, "template entry overridden");
    warning
}

/// Checks bone names, parent references, parent cycles, and the bone ceiling.
fn validate_bones(bones: &BoneMap, limits: &Limits) -> Result<(), ReconcileError> {
    if bones.len() > limits.max_bones {
        return Err(ReconcileError::new(
            ErrorCode::BoneLimitExceeded,
            format!(
                "model has {} bones, limit is {} (profile '{}')",
                bones.len(),
                limits.max_bones,
                limits.name
            ),
        ));
    }

    let mut names: HashMap<&str, &str> = HashMap::new();
    for bone in bones.values() {
        if let Some(other) = names.insert(bone.name.as_str(), bone.id.as_str()) {
            return Err(ReconcileError::new(
                ErrorCode::DuplicateName,
                format!(
                    "duplicate bone name '{}' (bones '{}' and '{}')",
                    bone.name, other, bone.id
                ),
            ));
        }
        if let Some(parent) = bone.parent_id.as_deref() {
            if !bones.contains_key(parent) {
                return Err(ReconcileError::new(
                    ErrorCode::UnknownParent,
                    format!("bone '{}' references unknown parent '{}'", bone.id, parent),
                )
                .fix("declare the parent bone or enable policy.enforceRoot"));
            }
        }
    }

    check_parent_cycles(bones)
}

/// Walks each parent chain once; a chain that reaches a bone still being
/// walked is a cycle.
fn check_parent_cycles(bones: &BoneMap) -> Result<(), ReconcileError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(bones.len());
    for id in bones.keys() {
        let mut chain = Vec::new();
        let mut current = Some(id.as_str());
        while let Some(bone) = current {
            match marks.get(bone) {
                Some(Mark::Done) => break,
                Some(Mark::Visiting) => {
                    chain.push(bone);
                    return Err(ReconcileError::new(
                        ErrorCode::ParentCycle,
                        format!("bone hierarchy cycle: {}", chain.join(" -> ")),
                    ));
                }
                None => {}
            }
            marks.insert(bone, Mark::Visiting);
            chain.push(bone);
            current = bones.get(bone).and_then(|b| b.parent_id.as_deref());
        }
        for bone in chain {
            marks.insert(bone, Mark::Done);
        }
    }
    Ok(())
}

/// Checks cube names and that every cube hangs off a known bone.
fn validate_cubes(cubes: &CubeMap, bones: &BoneMap) -> Result<(), ReconcileError> {
    validate_unique_cube_names(cubes)?;
    for cube in cubes.values() {
        if !bones.contains_key(&cube.parent_id) {
            return Err(ReconcileError::new(
                ErrorCode::UnknownParent,
                format!(
                    "cube '{}' references unknown bone '{}'",
                    cube.id, cube.parent_id
                ),
            )
            .fix("declare the bone or point parentId at an existing bone"));
        }
    }
    Ok(())
}

fn validate_unique_cube_names(cubes: &CubeMap) -> Result<(), ReconcileError> {
    let mut names: HashMap<&str, &str> = HashMap::new();
    for cube in cubes.values() {
        if let Some(other) = names.insert(cube.name.as_str(), cube.id.as_str()) {
            return Err(ReconcileError::new(
                ErrorCode::DuplicateName,
                format!(
                    "duplicate cube name '{}' (cubes '{}' and '{}')",
                    cube.name, other, cube.id
                ),
            ));
        }
    }
    Ok(())
}

fn check_cube_ceiling(count: usize, limits: &Limits) -> Result<(), ReconcileError> {
    if count > limits.max_cubes {
        return Err(cube_limit_error(count, limits.max_cubes));
    }
    Ok(())
}

pub(crate) fn cube_limit_error(count: usize, max_cubes: usize) -> ReconcileError {
    ReconcileError::new(
        ErrorCode::CubeLimitExceeded,
        format!("model has {} cubes, limit is {}", count, max_cubes),
    )
    .fix("reduce cubes or instance counts, or raise the cube limit")
}

/// Snaps, then clamps, every bone pivot and cube from/to/origin.
fn apply_grid_and_bounds(policy: &ModelPolicy, bones: &mut BoneMap, cubes: &mut CubeMap) {
    if policy.snap_grid.is_none() && policy.bounds.is_none() {
        return;
    }
    let place = |v: Vec3| {
        let v = match policy.snap_grid {
            Some(grid) => geometry::snap(v, grid),
            None => v,
        };
        match policy.bounds {
            Some(ref bounds) => geometry::clamp(v, bounds),
            None => v,
        }
    };
    for bone in bones.values_mut() {
        bone.pivot = place(bone.pivot);
    }
    for cube in cubes.values_mut() {
        cube.from = place(cube.from);
        cube.to = place(cube.to);
        cube.origin = place(cube.origin);
    }
}
