//! Anchor resolution.
//!
//! Anchors, bone pivots and cube placements resolve through each other:
//! an anchor's base point is a bone pivot or a cube origin/center, and that
//! bone or cube may itself be placed by another anchor. Each of the three is
//! resolved at most once (memoized by id). While one is in progress its key
//! (`anchor:<id>`, `bone:<id>`, `cube:<id>`) sits on a visitation stack;
//! meeting a key that is already on the stack is a cycle.
//!
//! Resolution walks an explicit work list instead of recursing, so a long
//! chain of anchored entities costs heap, not call stack.

use std::collections::{HashMap, HashSet};

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::error::{ErrorCode, ReconcileError};
use crate::geometry::{self, Vec3, ZERO};
use crate::model::{NormalizedBone, NormalizedCube};
use crate::spec::{AnchorSpec, AnchorTarget, ModelSpec};

/// Resolves every anchor reference in place.
///
/// Bone pivots are resolved first; cube placements only once every bone
/// succeeded. Anchors nobody references are resolved last so a dangling
/// target is still reported.
pub(crate) fn resolve_anchors(
    spec: &ModelSpec,
    bones: &mut IndexMap<String, NormalizedBone>,
    cubes: &mut IndexMap<String, NormalizedCube>,
) -> Result<(), ReconcileError> {
    let anchors = spec.anchors.as_slice();
    if anchors.is_empty() {
        if spec.references_anchors() {
            return Err(ReconcileError::with_path(
                ErrorCode::AnchorsRequired,
                "anchors required for id references",
                "anchors",
            )
            .fix("define every referenced anchor id in the anchors array"));
        }
        return Ok(());
    }

    let bone_ids: Vec<String> = bones.keys().cloned().collect();
    let cube_ids: Vec<String> = cubes.keys().cloned().collect();

    let mut resolver = AnchorResolver::new(anchors, bones, cubes)?;
    for id in bone_ids {
        resolver.resolve(Node::Bone(id))?;
    }
    for id in cube_ids {
        resolver.resolve(Node::Cube(id))?;
    }
    for anchor in anchors {
        resolver.resolve(Node::Anchor(anchor.id.clone()))?;
    }

    debug!(
        anchors = anchors.len(),
        bones = resolver.resolved_bones.len(),
        cubes = resolver.resolved_cubes.len(),
        "resolved anchors"
    );
    Ok(())
}

/// Something whose position may depend on an anchor.
#[derive(Debug, Clone)]
enum Node {
    Anchor(String),
    Bone(String),
    Cube(String),
}

struct Frame {
    node: Node,
    entered: bool,
}

enum Step {
    Done,
    Needs(Node),
}

struct AnchorResolver<'a> {
    anchors: HashMap<&'a str, (usize, &'a AnchorSpec)>,
    bones: &'a mut IndexMap<String, NormalizedBone>,
    cubes: &'a mut IndexMap<String, NormalizedCube>,
    points: HashMap<String, Vec3>,
    resolved_bones: HashSet<String>,
    resolved_cubes: HashSet<String>,
    stack: IndexSet<String>,
}

impl<'a> AnchorResolver<'a> {
    fn new(
        anchors: &'a [AnchorSpec],
        bones: &'a mut IndexMap<String, NormalizedBone>,
        cubes: &'a mut IndexMap<String, NormalizedCube>,
    ) -> Result<Self, ReconcileError> {
        let mut by_id = HashMap::with_capacity(anchors.len());
        for (i, anchor) in anchors.iter().enumerate() {
            if by_id.insert(anchor.id.as_str(), (i, anchor)).is_some() {
                return Err(ReconcileError::with_path(
                    ErrorCode::DuplicateId,
                    format!("duplicate anchor id '{}'", anchor.id),
                    format!("anchors[{}].id", i),
                ));
            }
        }
        Ok(Self {
            anchors: by_id,
            bones,
            cubes,
            points: HashMap::new(),
            resolved_bones: HashSet::new(),
            resolved_cubes: HashSet::new(),
            stack: IndexSet::new(),
        })
    }

    /// Resolves `root` and everything it depends on.
    ///
    /// A frame is revisited once each missing dependency has been resolved;
    /// only the first visit enters the visitation stack.
    fn resolve(&mut self, root: Node) -> Result<(), ReconcileError> {
        let mut work = vec![Frame {
            node: root,
            entered: false,
        }];
        while let Some(frame) = work.last_mut() {
            let first_visit = !frame.entered;
            frame.entered = true;
            let node = frame.node.clone();

            let step = match &node {
                Node::Anchor(id) => self.step_anchor(id, first_visit)?,
                Node::Bone(id) => self.step_bone(id, first_visit)?,
                Node::Cube(id) => self.step_cube(id, first_visit)?,
            };
            match step {
                Step::Done => {
                    work.pop();
                }
                Step::Needs(dependency) => work.push(Frame {
                    node: dependency,
                    entered: false,
                }),
            }
        }
        Ok(())
    }

    fn enter(&mut self, kind: &str, id: &str) -> Result<(), ReconcileError> {
        let key = format!("{}:{}", kind, id);
        if self.stack.contains(&key) {
            let mut path: Vec<&str> = self.stack.iter().map(String::as_str).collect();
            path.push(&key);
            return Err(ReconcileError::new(
                ErrorCode::AnchorCycle,
                format!(
                    "anchor cycle detected at {} '{}': {}",
                    kind,
                    id,
                    path.join(" -> ")
                ),
            )
            .fix("break the loop so no anchor depends on its own position"));
        }
        self.stack.insert(key);
        Ok(())
    }

    fn leave(&mut self) {
        self.stack.pop();
    }

    /// Computes the anchor's final point: base point plus offset.
    fn step_anchor(&mut self, id: &str, first_visit: bool) -> Result<Step, ReconcileError> {
        if self.points.contains_key(id) {
            return Ok(Step::Done);
        }
        let (index, anchor) = self.anchors.get(id).copied().ok_or_else(|| {
            ReconcileError::new(ErrorCode::AnchorNotFound, format!("unknown anchor '{}'", id))
                .fix("add the anchor to the anchors array or fix the reference")
        })?;
        if first_visit {
            self.enter("anchor", id)?;
        }

        let base = match &anchor.target {
            AnchorTarget::Bone(target) => {
                let Some(bone) = self.bones.get(&target.bone_id) else {
                    return Err(target_not_found(index, id, "bone", &target.bone_id));
                };
                if !self.resolved_bones.contains(&target.bone_id) {
                    return Ok(Step::Needs(Node::Bone(target.bone_id.clone())));
                }
                bone.pivot
            }
            AnchorTarget::Cube(target) => {
                let Some(cube) = self.cubes.get(&target.cube_id) else {
                    return Err(target_not_found(index, id, "cube", &target.cube_id));
                };
                if !self.resolved_cubes.contains(&target.cube_id) {
                    return Ok(Step::Needs(Node::Cube(target.cube_id.clone())));
                }
                cube_base_point(cube)
            }
        };
        self.leave();

        let point = geometry::add(base, anchor.offset.unwrap_or(ZERO));
        self.points.insert(id.to_string(), point);
        Ok(Step::Done)
    }

    /// Replaces the bone's pivot when it is anchored.
    fn step_bone(&mut self, id: &str, first_visit: bool) -> Result<Step, ReconcileError> {
        if self.resolved_bones.contains(id) {
            return Ok(Step::Done);
        }
        let anchor_id = match self.bones.get(id) {
            Some(bone) => bone.pivot_anchor_id.clone(),
            None => {
                return Err(ReconcileError::new(
                    ErrorCode::AnchorTargetNotFound,
                    format!("unknown bone '{}'", id),
                ))
            }
        };
        if first_visit {
            self.enter("bone", id)?;
        }

        if let Some(anchor_id) = anchor_id {
            let Some(point) = self.points.get(&anchor_id).copied() else {
                return Ok(Step::Needs(Node::Anchor(anchor_id)));
            };
            if let Some(bone) = self.bones.get_mut(id) {
                bone.pivot = point;
            }
        }
        self.leave();

        self.resolved_bones.insert(id.to_string());
        Ok(Step::Done)
    }

    /// Places the cube: re-centers it on its center anchor (keeping size)
    /// and/or moves its origin to its origin anchor.
    fn step_cube(&mut self, id: &str, first_visit: bool) -> Result<Step, ReconcileError> {
        if self.resolved_cubes.contains(id) {
            return Ok(Step::Done);
        }
        let (center_anchor, origin_anchor) = match self.cubes.get(id) {
            Some(cube) => (cube.center_anchor_id.clone(), cube.origin_anchor_id.clone()),
            None => {
                return Err(ReconcileError::new(
                    ErrorCode::AnchorTargetNotFound,
                    format!("unknown cube '{}'", id),
                ))
            }
        };
        if first_visit {
            self.enter("cube", id)?;
        }

        // the center anchor is settled before the origin anchor is looked at
        let mut center = None;
        if let Some(anchor_id) = center_anchor {
            match self.points.get(&anchor_id) {
                Some(point) => center = Some(*point),
                None => return Ok(Step::Needs(Node::Anchor(anchor_id))),
            }
        }
        let mut origin = None;
        if let Some(anchor_id) = origin_anchor {
            match self.points.get(&anchor_id) {
                Some(point) => origin = Some(*point),
                None => return Ok(Step::Needs(Node::Anchor(anchor_id))),
            }
        }

        if let Some(cube) = self.cubes.get_mut(id) {
            if let Some(point) = center {
                let half = geometry::scale(cube.size(), 0.5);
                cube.from = geometry::subtract(point, half);
                cube.to = geometry::add(point, half);
                if !cube.explicit.origin {
                    cube.origin = point;
                }
            }
            if let Some(point) = origin {
                cube.origin = point;
            }
        }
        self.leave();

        self.resolved_cubes.insert(id.to_string());
        Ok(Step::Done)
    }
}

/// A cube's anchor base point: its origin when the caller placed the origin,
/// otherwise its geometric center.
fn cube_base_point(cube: &NormalizedCube) -> Vec3 {
    if cube.explicit.origin {
        cube.origin
    } else {
        cube.center()
    }
}

fn target_not_found(index: usize, anchor_id: &str, kind: &str, target: &str) -> ReconcileError {
    ReconcileError::with_path(
        ErrorCode::AnchorTargetNotFound,
        format!(
            "anchor '{}' targets unknown {} '{}'",
            anchor_id, kind, target
        ),
        format!("anchors[{}].target", index),
    )
}
