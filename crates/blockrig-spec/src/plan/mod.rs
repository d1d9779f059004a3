//! Diff planning.
//!
//! Compares a [`NormalizedModel`] with a snapshot of live state and produces
//! the ordered operations an external applier runs to make the live model
//! match. The planner never mutates either input.

mod diff;
mod sequence;


use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ErrorCode, ReconcileError};
use crate::geometry::Vec3;
use crate::identity::EntityKind;
use crate::model::{BoneState, CubeState, ExistingState, NormalizedModel};

use sequence::{PendingOp, Subject};

/// How desired entities are applied against live state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanMode {
    /// Everything is new; any existing match is an error.
    Create,
    /// Create what is missing, update caller-set fields of what exists.
    #[default]
    Merge,
    /// Like merge, but every field is compared. Orphans may be deleted.
    Replace,
    /// Update caller-set fields; any missing entity is an error.
    Patch,
}

impl PlanMode {
    /// Returns the mode name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanMode::Create => "create",
            PlanMode::Merge => "merge",
            PlanMode::Replace => "replace",
            PlanMode::Patch => "patch",
        }
    }

    /// Returns all modes.
    pub fn all() -> &'static [PlanMode] {
        &[
            PlanMode::Create,
            PlanMode::Merge,
            PlanMode::Replace,
            PlanMode::Patch,
        ]
    }

    /// True when updates compare every field, not only caller-set ones.
    pub fn diffs_all_fields(&self) -> bool {
        matches!(self, PlanMode::Replace)
    }
}

impl fmt::Display for PlanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PlanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlanMode::all()
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown mode '{}', expected one of: create, merge, replace, patch",
                    s
                )
            })
    }
}

/// Changed bone attributes. Unset fields are unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoneChanges {
    /// New id, when the bone was matched by name under a different id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pivot: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<bool>,
}

impl BoneChanges {
    /// True when nothing changed.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Changed cube attributes. Unset fields are unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CubeChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Vec3>,
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

impl CubeChanges {
    /// True when nothing changed.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// One operation for the applier.
///
/// Update and delete operations address the *existing* entity by its
/// current id (when it has one) and name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PlanOp {
    CreateBone {
        bone: BoneState,
    },
    UpdateBone {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        name: String,
        changes: BoneChanges,
        /// The bone moves to the top level (no parent).
        #[serde(rename = "parentRoot", default, skip_serializing_if = "is_false")]
        parent_root: bool,
    },
    DeleteBone {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        name: String,
    },
    CreateCube {
        cube: CubeState,
    },
    UpdateCube {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        name: String,
        changes: CubeChanges,
        /// The cube moves onto the `root` bone.
        #[serde(rename = "boneRoot", default, skip_serializing_if = "is_false")]
        bone_root: bool,
    },
    DeleteCube {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        name: String,
    },
}

impl PlanOp {
    /// Kind priority used by the sequencer.
    pub fn priority(&self) -> u8 {
        match self {
            PlanOp::CreateBone { .. } => 10,
            PlanOp::UpdateBone { .. } => 20,
            PlanOp::CreateCube { .. } => 30,
            PlanOp::UpdateCube { .. } => 40,
            PlanOp::DeleteCube { .. } => 50,
            PlanOp::DeleteBone { .. } => 60,
        }
    }

    /// Wire name of the operation.
    pub fn kind(&self) -> &'static str {
        match self {
            PlanOp::CreateBone { .. } => "create_bone",
            PlanOp::UpdateBone { .. } => "update_bone",
            PlanOp::DeleteBone { .. } => "delete_bone",
            PlanOp::CreateCube { .. } => "create_cube",
            PlanOp::UpdateCube { .. } => "update_cube",
            PlanOp::DeleteCube { .. } => "delete_cube",
        }
    }

    /// Name of the entity as the applier knows it.
    pub fn target_name(&self) -> &str {
        match self {
            PlanOp::CreateBone { bone } => &bone.name,
            PlanOp::CreateCube { cube } => &cube.name,
            PlanOp::UpdateBone { name, .. }
            | PlanOp::DeleteBone { name, .. }
            | PlanOp::UpdateCube { name, .. }
            | PlanOp::DeleteCube { name, .. } => name,
        }
    }
}

/// Operation counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub create_bone: usize,
    pub update_bone: usize,
    pub delete_bone: usize,
    pub create_cube: usize,
    pub update_cube: usize,
    pub delete_cube: usize,
    /// Bones in the desired model.
    pub bones: usize,
    /// Cubes in the desired model.
    pub cubes: usize,
    /// Total operations.
    pub total: usize,
}

impl PlanSummary {
    fn tally(ops: &[PlanOp], model: &NormalizedModel) -> Self {
        let mut summary = PlanSummary {
            bones: model.bones.len(),
            cubes: model.cubes.len(),
            total: ops.len(),
            ..Default::default()
        };
        for op in ops {
            let counter = match op {
                PlanOp::CreateBone { .. } => &mut summary.create_bone,
                PlanOp::UpdateBone { .. } => &mut summary.update_bone,
                PlanOp::DeleteBone { .. } => &mut summary.delete_bone,
                PlanOp::CreateCube { .. } => &mut summary.create_cube,
                PlanOp::UpdateCube { .. } => &mut summary.update_cube,
                PlanOp::DeleteCube { .. } => &mut summary.delete_cube,
            };
            *counter += 1;
        }
        summary
    }
}

/// An ordered plan.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub ops: Vec<PlanOp>,
    pub summary: PlanSummary,
    /// Revision token of the snapshot this plan was computed against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

impl Plan {
    /// True when live state already matches.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Plans against a live-state snapshot, carrying its revision token.
pub fn plan_state(
    model: &NormalizedModel,
    existing: &ExistingState,
    mode: PlanMode,
    delete_orphans: bool,
) -> Result<Plan, ReconcileError> {
    let mut plan = plan(model, &existing.bones, &existing.cubes, mode, delete_orphans)?;
    plan.revision = existing.revision.clone();
    Ok(plan)
}

/// Computes the ordered operations that bring live state to `model`.
///
/// Orphans (existing entities nothing desired matched) are only deleted in
/// [`PlanMode::Replace`] with `delete_orphans` set.
pub fn plan(
    model: &NormalizedModel,
    existing_bones: &[BoneState],
    existing_cubes: &[CubeState],
    mode: PlanMode,
    delete_orphans: bool,
) -> Result<Plan, ReconcileError> {
    let all = mode.diffs_all_fields();
    let mut pending = Vec::new();

    let mut claimed_bones = HashSet::new();
    for bone in model.bones.values() {
        let found = diff::match_entity(
            &bone.id,
            &bone.name,
            existing_bones.iter().map(|e| (e.id.as_deref(), e.name.as_str())),
            &claimed_bones,
        );
        check_mode(mode, EntityKind::Bone, &bone.id, found.is_some())?;
        let subject = Subject::DesiredBone(bone.id.clone());
        match found {
            None => pending.push(PendingOp::new(
                PlanOp::CreateBone {
                    bone: bone.to_state(),
                },
                subject,
            )),
            Some(index) => {
                claimed_bones.insert(index);
                let existing = &existing_bones[index];
                let (changes, parent_root) = diff::diff_bone(bone, existing, model, all);
                if !changes.is_empty() || parent_root {
                    pending.push(PendingOp::new(
                        PlanOp::UpdateBone {
                            id: existing.id.clone(),
                            name: existing.name.clone(),
                            changes,
                            parent_root,
                        },
                        subject,
                    ));
                }
            }
        }
    }

    let mut claimed_cubes = HashSet::new();
    for cube in model.cubes.values() {
        let found = diff::match_entity(
            &cube.id,
            &cube.name,
            existing_cubes.iter().map(|e| (e.id.as_deref(), e.name.as_str())),
            &claimed_cubes,
        );
        check_mode(mode, EntityKind::Cube, &cube.id, found.is_some())?;
        match found {
            None => pending.push(PendingOp::new(
                PlanOp::CreateCube {
                    cube: cube.to_state(),
                },
                Subject::Cube,
            )),
            Some(index) => {
                claimed_cubes.insert(index);
                let existing = &existing_cubes[index];
                let (changes, bone_root) = diff::diff_cube(cube, existing, model, all);
                if !changes.is_empty() {
                    pending.push(PendingOp::new(
                        PlanOp::UpdateCube {
                            id: existing.id.clone(),
                            name: existing.name.clone(),
                            changes,
                            bone_root,
                        },
                        Subject::Cube,
                    ));
                }
            }
        }
    }

    if mode == PlanMode::Replace && delete_orphans {
        let bone_ids: HashSet<&str> = model.bones.keys().map(String::as_str).collect();
        let bone_names: HashSet<&str> = model.bones.values().map(|b| b.name.as_str()).collect();
        let cube_ids: HashSet<&str> = model.cubes.keys().map(String::as_str).collect();
        let cube_names: HashSet<&str> = model.cubes.values().map(|c| c.name.as_str()).collect();

        for (index, existing) in existing_cubes.iter().enumerate() {
            if claimed_cubes.contains(&index) {
                continue;
            }
            if diff::is_orphan(existing.id.as_deref(), &existing.name, &cube_ids, &cube_names) {
                pending.push(PendingOp::new(
                    PlanOp::DeleteCube {
                        id: existing.id.clone(),
                        name: existing.name.clone(),
                    },
                    Subject::Cube,
                ));
            }
        }
        for (index, existing) in existing_bones.iter().enumerate() {
            if claimed_bones.contains(&index) {
                continue;
            }
            if diff::is_orphan(existing.id.as_deref(), &existing.name, &bone_ids, &bone_names) {
                pending.push(PendingOp::new(
                    PlanOp::DeleteBone {
                        id: existing.id.clone(),
                        name: existing.name.clone(),
                    },
                    Subject::ExistingBone(index),
                ));
            }
        }
    }

    let ops = sequence::order(pending, model, existing_bones);
    let summary = PlanSummary::tally(&ops, model);
    debug!(
        mode = %mode,
        delete_orphans,
        existing_bones = existing_bones.len(),
        existing_cubes = existing_cubes.len(),
        ops = summary.total,
        "planned reconciliation"
    );

    Ok(Plan {
        ops,
        summary,
        revision: None,
    })
}

fn check_mode(
    mode: PlanMode,
    kind: EntityKind,
    id: &str,
    matched: bool,
) -> Result<(), ReconcileError> {
    match (mode, matched) {
        (PlanMode::Create, true) => Err(ReconcileError::new(
            ErrorCode::AlreadyExists,
            format!("{} '{}' already exists", kind, id),
        )
        .fix("use merge or replace mode to update existing entities")),
        (PlanMode::Patch, false) => Err(ReconcileError::new(
            ErrorCode::NotFound,
            format!("{} '{}' not found in existing state", kind, id),
        )
        .fix("use merge mode to create missing entities")),
        _ => Ok(()),
    }
}
