//! Test fixture utilities for building specs and writing them to disk.

use std::fs;
use std::path::{Path, PathBuf};

use blockrig_spec::{
    AnchorSpec, AnchorTarget, Axis, BoneSpec, CubeSpec, ExistingState, InstanceKind,
    InstanceSpec, MirrorInstance, ModelPolicy, ModelSpec, RigTemplate, Vec3,
};
use tempfile::TempDir;

/// Fluent builder for [`ModelSpec`] values.
#[derive(Debug, Clone, Default)]
pub struct SpecBuilder {
    spec: ModelSpec,
}

impl SpecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn template(mut self, template: RigTemplate) -> Self {
        self.spec.rig_template = template;
        self
    }

    /// Adds a bone with an explicit id, optional parent and pivot.
    pub fn bone(mut self, id: &str, parent: Option<&str>, pivot: Vec3) -> Self {
        self.spec.bones.push(BoneSpec {
            id: Some(id.to_string()),
            parent_id: parent.map(str::to_string),
            pivot: Some(pivot),
            ..Default::default()
        });
        self
    }

    /// Adds a bone spec as-is.
    pub fn bone_spec(mut self, bone: BoneSpec) -> Self {
        self.spec.bones.push(bone);
        self
    }

    /// Adds a cube with an explicit id on `parent`.
    pub fn cube(mut self, id: &str, parent: &str, from: Vec3, to: Vec3) -> Self {
        self.spec.cubes.push(CubeSpec {
            id: Some(id.to_string()),
            parent_id: Some(parent.to_string()),
            from: Some(from),
            to: Some(to),
            ..Default::default()
        });
        self
    }

    /// Adds a cube spec as-is.
    pub fn cube_spec(mut self, cube: CubeSpec) -> Self {
        self.spec.cubes.push(cube);
        self
    }

    pub fn anchor(mut self, id: &str, target: AnchorTarget, offset: Vec3) -> Self {
        self.spec.anchors.push(AnchorSpec {
            id: id.to_string(),
            target,
            offset: Some(offset),
        });
        self
    }

    pub fn instance(mut self, kind: InstanceKind) -> Self {
        self.spec.instances.push(InstanceSpec::Known(kind));
        self
    }

    pub fn policy(mut self, policy: ModelPolicy) -> Self {
        self.spec.policy = policy;
        self
    }

    pub fn build(self) -> ModelSpec {
        self.spec
    }
}

/// A temp directory holding spec and live-state documents for CLI runs.
pub struct RigFixture {
    pub root: TempDir,
}

impl RigFixture {
    /// Create a new empty fixture directory.
    pub fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp dir");
        Self { root }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Write a spec as `<name>.json`.
    pub fn write_spec(&self, name: &str, spec: &ModelSpec) -> PathBuf {
        let json = spec.to_json_pretty().expect("Failed to serialize spec");
        self.write_raw(name, &json)
    }

    /// Write a live-state snapshot as `<name>.json`.
    pub fn write_existing(&self, name: &str, state: &ExistingState) -> PathBuf {
        let json = serde_json::to_string_pretty(state).expect("Failed to serialize state");
        self.write_raw(name, &json)
    }

    /// Write arbitrary JSON text as `<name>.json`.
    pub fn write_raw(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root.path().join(format!("{}.json", name));
        fs::write(&path, content).expect("Failed to write fixture file");
        path
    }
}

impl Default for RigFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A biped with a tail, a hat, and a mirrored ear pair.
pub fn critter_spec() -> ModelSpec {
    SpecBuilder::new()
        .template(RigTemplate::Biped)
        .bone("tail", Some("body"), [0.0, 12.0, 2.0])
        .bone("tail_tip", Some("tail"), [0.0, 10.0, 8.0])
        .cube("hat", "head", [-4.0, 32.0, -4.0], [4.0, 34.0, 4.0])
        .cube("ear", "head", [2.0, 32.0, 0.0], [4.0, 36.0, 1.0])
        .cube("tail_box", "tail", [-1.0, 10.0, 2.0], [1.0, 12.0, 8.0])
        .instance(InstanceKind::Mirror(MirrorInstance {
            source_id: "ear".to_string(),
            axis: Axis::X,
            offset: 0.0,
            new_id: None,
            new_name: None,
        }))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_entries() {
        let spec = SpecBuilder::new()
            .bone("a", None, [0.0, 0.0, 0.0])
            .cube("box", "a", [0.0, 0.0, 0.0], [1.0, 1.0, 1.0])
            .anchor("top", AnchorTarget::bone("a"), [0.0, 4.0, 0.0])
            .build();
        assert_eq!(spec.bones.len(), 1);
        assert_eq!(spec.cubes.len(), 1);
        assert_eq!(spec.anchors.len(), 1);
    }

    #[test]
    fn test_fixture_writes_readable_spec() {
        let fixture = RigFixture::new();
        let path = fixture.write_spec("critter", &critter_spec());
        let text = fs::read_to_string(path).unwrap();
        assert_eq!(ModelSpec::from_json(&text).unwrap(), critter_spec());
    }
}
