//! Entity matching and field diffing.

use std::collections::HashSet;

use crate::geometry::{approx_eq, approx_eq_scalar, Vec3};
use crate::model::{BoneState, CubeState, NormalizedBone, NormalizedCube, NormalizedModel};
use crate::template::ROOT_BONE_ID;

use super::{BoneChanges, CubeChanges};

/// Finds the unclaimed existing entity a desired one maps to: by id first,
/// then by name.
pub(super) fn match_entity<'a>(
    id: &str,
    name: &str,
    existing: impl Iterator<Item = (Option<&'a str>, &'a str)> + Clone,
    claimed: &HashSet<usize>,
) -> Option<usize> {
    let mut candidates = existing
        .clone()
        .enumerate()
        .filter(|(index, _)| !claimed.contains(index));
    if let Some((index, _)) = candidates.find(|(_, (existing_id, _))| *existing_id == Some(id)) {
        return Some(index);
    }
    existing
        .enumerate()
        .filter(|(index, _)| !claimed.contains(index))
        .find(|(_, (_, existing_name))| *existing_name == name)
        .map(|(index, _)| index)
}

/// An unmatched existing entity is an orphan when its id is not desired.
/// Id-less entities are only orphans when their name is not desired either.
pub(super) fn is_orphan(
    id: Option<&str>,
    name: &str,
    desired_ids: &HashSet<&str>,
    desired_names: &HashSet<&str>,
) -> bool {
    match id {
        Some(id) => !desired_ids.contains(id),
        None => !desired_names.contains(name),
    }
}

/// True when an existing parent reference names the desired parent bone,
/// by id or by name.
fn parent_matches(existing: Option<&str>, desired: &str, model: &NormalizedModel) -> bool {
    match existing {
        Some(parent) => {
            parent == desired
                || model
                    .bones
                    .get(desired)
                    .is_some_and(|bone| bone.name == parent)
        }
        None => false,
    }
}

fn vector_change(consider: bool, desired: Vec3, existing: Vec3) -> Option<Vec3> {
    (consider && !approx_eq(desired, existing)).then_some(desired)
}

fn flag_change(consider: bool, desired: Option<bool>, existing: bool) -> Option<bool> {
    desired.filter(|value| consider && *value != existing)
}

/// Id-less live entities keep being matched by name; they are not re-keyed.
fn id_change(consider: bool, desired: &str, existing: Option<&str>) -> Option<String> {
    existing
        .filter(|current| consider && *current != desired)
        .map(|_| desired.to_string())
}

fn name_change(consider: bool, desired: &str, existing: &str) -> Option<String> {
    (consider && desired != existing).then(|| desired.to_string())
}

/// Diffs a matched bone. Returns the changes and whether the bone moves to
/// the top level.
pub(super) fn diff_bone(
    desired: &NormalizedBone,
    existing: &BoneState,
    model: &NormalizedModel,
    all: bool,
) -> (BoneChanges, bool) {
    let explicit = &desired.explicit;
    let mut changes = BoneChanges {
        id: id_change(all || explicit.id, &desired.id, existing.id.as_deref()),
        name: name_change(all || explicit.name, &desired.name, &existing.name),
        pivot: vector_change(all || explicit.pivot, desired.pivot, existing.pivot),
        rotation: vector_change(all || explicit.rotation, desired.rotation, existing.rotation),
        scale: vector_change(all || explicit.scale, desired.scale, existing.scale),
        visibility: flag_change(
            all || explicit.visibility,
            desired.visibility,
            existing.visibility.unwrap_or(true),
        ),
        ..Default::default()
    };

    let mut parent_root = false;
    if all || explicit.parent {
        match desired.parent_id.as_deref() {
            Some(parent) => {
                if !parent_matches(existing.parent_id.as_deref(), parent, model) {
                    changes.parent_id = Some(parent.to_string());
                }
            }
            None => parent_root = existing.parent_id.is_some(),
        }
    }
    (changes, parent_root)
}

/// Diffs a matched cube. Returns the changes and whether the cube moves
/// onto the root bone.
pub(super) fn diff_cube(
    desired: &NormalizedCube,
    existing: &CubeState,
    model: &NormalizedModel,
    all: bool,
) -> (CubeChanges, bool) {
    let explicit = &desired.explicit;
    let bounds_changed = (all || explicit.bounds)
        && !(approx_eq(desired.from, existing.from) && approx_eq(desired.to, existing.to));

    let mut changes = CubeChanges {
        id: id_change(all || explicit.id, &desired.id, existing.id.as_deref()),
        name: name_change(all || explicit.name, &desired.name, &existing.name),
        from: bounds_changed.then_some(desired.from),
        to: bounds_changed.then_some(desired.to),
        // a moved box drags a defaulted origin along with it
        origin: vector_change(
            all || explicit.origin || explicit.bounds,
            desired.origin,
            existing.effective_origin(),
        ),
        rotation: vector_change(all || explicit.rotation, desired.rotation, existing.rotation),
        inflate: desired.inflate.filter(|value| {
            (all || explicit.inflate)
                && !approx_eq_scalar(*value, existing.inflate.unwrap_or(0.0))
        }),
        mirror: flag_change(
            all || explicit.mirror,
            desired.mirror,
            existing.mirror.unwrap_or(false),
        ),
        visibility: flag_change(
            all || explicit.visibility,
            desired.visibility,
            existing.visibility.unwrap_or(true),
        ),
        box_uv: flag_change(
            all || explicit.box_uv,
            desired.box_uv,
            existing.box_uv.unwrap_or(false),
        ),
        uv_offset: desired.uv_offset.filter(|value| {
            let current = existing.uv_offset.unwrap_or([0.0, 0.0]);
            (all || explicit.uv_offset)
                && !(approx_eq_scalar(value[0], current[0]) && approx_eq_scalar(value[1], current[1]))
        }),
        ..Default::default()
    };

    let mut bone_root = false;
    if (all || explicit.parent)
        && !parent_matches(existing.parent_id.as_deref(), &desired.parent_id, model)
    {
        bone_root = desired.parent_id == ROOT_BONE_ID;
        changes.parent_id = Some(desired.parent_id.clone());
    }
    (changes, bone_root)
}
