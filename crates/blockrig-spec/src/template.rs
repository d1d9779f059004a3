//! Rig templates: predefined starter bones and cubes.

use serde::{Deserialize, Serialize};

use crate::geometry::Vec3;

/// Id of the bone injected when `enforceRoot` is set.
pub const ROOT_BONE_ID: &str = "root";

/// Predefined starter rigs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RigTemplate {
    /// No starter entries.
    #[default]
    Empty,
    /// Humanoid: body, head, two arms, two legs.
    Biped,
    /// Four-legged creature: body, head, four legs.
    Quadruped,
    /// A single full-block cube on the root bone.
    BlockEntity,
}

/// A bone contributed by a template.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateBone {
    pub id: &'static str,
    pub parent: Option<&'static str>,
    pub pivot: Vec3,
}

/// A cube contributed by a template.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateCube {
    pub id: &'static str,
    pub parent: &'static str,
    pub from: Vec3,
    pub to: Vec3,
}

const fn bone(id: &'static str, parent: Option<&'static str>, pivot: Vec3) -> TemplateBone {
    TemplateBone { id, parent, pivot }
}

const ROOT: TemplateBone = bone(ROOT_BONE_ID, None, [0.0, 0.0, 0.0]);

const BIPED_BONES: &[TemplateBone] = &[
    ROOT,
    bone("body", Some(ROOT_BONE_ID), [0.0, 24.0, 0.0]),
    bone("head", Some("body"), [0.0, 24.0, 0.0]),
    bone("right_arm", Some("body"), [-5.0, 22.0, 0.0]),
    bone("left_arm", Some("body"), [5.0, 22.0, 0.0]),
    bone("right_leg", Some(ROOT_BONE_ID), [-1.9, 12.0, 0.0]),
    bone("left_leg", Some(ROOT_BONE_ID), [1.9, 12.0, 0.0]),
];

const QUADRUPED_BONES: &[TemplateBone] = &[
    ROOT,
    bone("body", Some(ROOT_BONE_ID), [0.0, 13.0, 2.0]),
    bone("head", Some("body"), [0.0, 12.0, -6.0]),
    bone("leg_back_right", Some(ROOT_BONE_ID), [-3.0, 12.0, 7.0]),
    bone("leg_back_left", Some(ROOT_BONE_ID), [3.0, 12.0, 7.0]),
    bone("leg_front_right", Some(ROOT_BONE_ID), [-3.0, 12.0, -5.0]),
    bone("leg_front_left", Some(ROOT_BONE_ID), [3.0, 12.0, -5.0]),
];

const BLOCK_ENTITY_BONES: &[TemplateBone] = &[ROOT];

const BLOCK_ENTITY_CUBES: &[TemplateCube] = &[TemplateCube {
    id: "block",
    parent: ROOT_BONE_ID,
    from: [0.0, 0.0, 0.0],
    to: [16.0, 16.0, 16.0],
}];

impl RigTemplate {
    /// Returns the template's bones, parents before children.
    pub fn bones(&self) -> &'static [TemplateBone] {
        match self {
            RigTemplate::Empty => &[],
            RigTemplate::Biped => BIPED_BONES,
            RigTemplate::Quadruped => QUADRUPED_BONES,
            RigTemplate::BlockEntity => BLOCK_ENTITY_BONES,
        }
    }

    /// Returns the template's cubes.
    pub fn cubes(&self) -> &'static [TemplateCube] {
        match self {
            RigTemplate::BlockEntity => BLOCK_ENTITY_CUBES,
            _ => &[],
        }
    }

    /// Returns the template name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            RigTemplate::Empty => "empty",
            RigTemplate::Biped => "biped",
            RigTemplate::Quadruped => "quadruped",
            RigTemplate::BlockEntity => "block_entity",
        }
    }

    /// Returns all templates.
    pub fn all() -> &'static [RigTemplate] {
        &[
            RigTemplate::Empty,
            RigTemplate::Biped,
            RigTemplate::Quadruped,
            RigTemplate::BlockEntity,
        ]
    }
}

impl std::fmt::Display for RigTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
