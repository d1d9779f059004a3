//! Blockrig Model Reconciliation Library
//!
//! This crate turns a declarative description of a block model (a tree of
//! bones carrying axis-aligned cubes) into the ordered create/update/delete
//! operations that bring a live model in line with it.
//!
//! # Overview
//!
//! Reconciliation is two pure calls:
//!
//! - [`normalize`]: expands the rig template, resolves ids, parents, anchors
//!   and instances, and validates the result into a [`NormalizedModel`]
//! - [`plan`]: diffs the normalized model against a live-state snapshot and
//!   returns a dependency-safe [`Plan`]
//!
//! Applying the plan is left to the caller.
//!
//! # Example
//!
//! ```
//! use blockrig_spec::{normalize, plan, BoneState, ModelSpec, PlanMode, PlanOp};
//!
//! let spec = ModelSpec::from_json(r#"{
//!     "bones": [{"id": "spine", "visibility": false}]
//! }"#).unwrap();
//! let model = normalize(&spec, 256).unwrap();
//!
//! let existing = vec![
//!     BoneState::new(Some("root"), "root", None),
//!     BoneState::new(Some("spine"), "spine", Some("root")),
//! ];
//! let plan = plan(&model, &existing, &[], PlanMode::Merge, false).unwrap();
//!
//! assert_eq!(plan.ops.len(), 1);
//! assert!(matches!(&plan.ops[0], PlanOp::UpdateBone { changes, .. }
//!     if changes.visibility == Some(false)));
//! ```
//!
//! # Modules
//!
//! - [`error`]: Error and warning types
//! - [`geometry`]: Vector helpers, snapping, rotation and mirroring
//! - [`hash`]: Canonical hashing of plans and models
//! - [`identity`]: Derived ids for entities without one
//! - [`limits`]: Cube and bone ceilings
//! - [`model`]: Normalized entities and live-state snapshots
//! - [`normalize`]: Spec normalization, anchor resolution, instance expansion
//! - [`plan`]: Diff planning and operation sequencing
//! - [`spec`]: The desired-model document
//! - [`template`]: Starter rigs

pub mod error;
pub mod geometry;
pub mod hash;
pub mod identity;
pub mod limits;
pub mod model;
pub mod normalize;
pub mod plan;
pub mod spec;
pub mod template;

// Re-export commonly used types at the crate root
pub use error::{DocumentError, ErrorCode, ReconcileError, ReconcileWarning, WarningCode};
pub use geometry::{Axis, Bounds, Vec3};
pub use hash::{canonical_value_hash, model_hash, plan_hash};
pub use identity::EntityKind;
pub use limits::Limits;
pub use model::{
    BoneFlags, BoneState, CubeFlags, CubeState, ExistingState, NormalizedBone, NormalizedCube,
    NormalizedModel,
};
pub use normalize::{normalize, normalize_with_limits};
pub use plan::{
    plan, plan_state, BoneChanges, CubeChanges, Plan, PlanMode, PlanOp, PlanSummary,
};
pub use spec::{
    AnchorSpec, AnchorTarget, BoneSpec, CubeSpec, IdPolicy, InstanceKind, InstanceSpec,
    MirrorInstance, ModelPolicy, ModelSpec, RadialInstance, RepeatInstance,
};
pub use template::{RigTemplate, ROOT_BONE_ID};
