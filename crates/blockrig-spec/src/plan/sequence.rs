//! Operation sequencing.
//!
//! Bone creates/updates run parent-first along the desired hierarchy, then
//! cube creates and updates, then cube deletes, then bone deletes
//! (deepest first). Within each group, emission order is kept.

use std::collections::{HashMap, HashSet};

use crate::model::{BoneState, NormalizedModel};

use super::PlanOp;

/// What an operation's position depends on.
pub(super) enum Subject {
    /// A desired bone, ranked by the desired hierarchy.
    DesiredBone(String),
    /// An existing bone, ranked by its depth in live state.
    ExistingBone(usize),
    Cube,
}

pub(super) struct PendingOp {
    op: PlanOp,
    subject: Subject,
}

impl PendingOp {
    pub(super) fn new(op: PlanOp, subject: Subject) -> Self {
        Self { op, subject }
    }
}

/// Sorts operations into applier-safe order.
pub(super) fn order(
    pending: Vec<PendingOp>,
    model: &NormalizedModel,
    existing_bones: &[BoneState],
) -> Vec<PlanOp> {
    let ranks = desired_ranks(model);
    let depths = existing_depths(existing_bones);

    let mut keyed: Vec<((u8, usize, u8), PlanOp)> = pending
        .into_iter()
        .map(|p| {
            let priority = p.op.priority();
            let key = match (&p.op, &p.subject) {
                (PlanOp::CreateBone { .. } | PlanOp::UpdateBone { .. }, Subject::DesiredBone(id)) => {
                    (0, ranks.get(id.as_str()).copied().unwrap_or(usize::MAX), priority)
                }
                (PlanOp::DeleteBone { .. }, Subject::ExistingBone(index)) => {
                    (3, usize::MAX - depths[*index], priority)
                }
                (PlanOp::DeleteCube { .. }, _) => (2, 0, priority),
                _ => (1, 0, priority),
            };
            (key, p.op)
        })
        .collect();
    // stable: ties keep emission order
    keyed.sort_by_key(|(key, _)| *key);
    keyed.into_iter().map(|(_, op)| op).collect()
}

/// Parent-first visitation order of the desired bones.
///
/// For each bone in insertion order, climbs to the nearest ranked ancestor
/// and ranks the climbed bones top-down. A climb that meets a bone already
/// on the current climb stops there, so a parent cycle cannot loop.
fn desired_ranks(model: &NormalizedModel) -> HashMap<&str, usize> {
    let mut ranks: HashMap<&str, usize> = HashMap::with_capacity(model.bones.len());
    let mut climb: Vec<&str> = Vec::new();
    let mut on_climb: HashSet<&str> = HashSet::new();
    for id in model.bones.keys() {
        let mut current = Some(id.as_str());
        while let Some(bone) = current {
            if ranks.contains_key(bone) || !on_climb.insert(bone) {
                break;
            }
            climb.push(bone);
            current = model.bones.get(bone).and_then(|b| b.parent_id.as_deref());
        }
        while let Some(bone) = climb.pop() {
            let rank = ranks.len();
            ranks.insert(bone, rank);
        }
        on_climb.clear();
    }
    ranks
}

/// Depth of each existing bone; parents are referenced by id or name.
fn existing_depths(bones: &[BoneState]) -> Vec<usize> {
    let mut by_key: HashMap<&str, usize> = HashMap::with_capacity(bones.len() * 2);
    for (index, bone) in bones.iter().enumerate() {
        by_key.entry(bone.name.as_str()).or_insert(index);
        if let Some(id) = bone.id.as_deref() {
            by_key.insert(id, index);
        }
    }

    bones
        .iter()
        .map(|bone| {
            let mut depth = 0;
            let mut current = bone;
            while let Some(&parent) = current
                .parent_id
                .as_deref()
                .and_then(|p| by_key.get(p))
            {
                depth += 1;
                // a cyclic live hierarchy is capped rather than followed
                if depth > bones.len() {
                    break;
                }
                current = &bones[parent];
            }
            depth
        })
        .collect()
}
