//! Normalization, anchor and instance tests.

use pretty_assertions::assert_eq;

use super::*;
use crate::geometry::{approx_eq, Axis, Bounds};
use crate::spec::{
    AnchorSpec, AnchorTarget, InstanceKind, InstanceSpec, MirrorInstance, RadialInstance,
    RepeatInstance,
};

fn bone(id: &str) -> BoneSpec {
    BoneSpec {
        id: Some(id.to_string()),
        ..Default::default()
    }
}

fn cube(id: &str, from: Vec3, to: Vec3) -> CubeSpec {
    CubeSpec {
        id: Some(id.to_string()),
        from: Some(from),
        to: Some(to),
        ..Default::default()
    }
}

fn anchor(id: &str, target: AnchorTarget, offset: Option<Vec3>) -> AnchorSpec {
    AnchorSpec {
        id: id.to_string(),
        target,
        offset,
    }
}

fn run(spec: &ModelSpec) -> Result<NormalizedModel, ReconcileError> {
    normalize(spec, 256)
}

fn assert_vec(actual: Vec3, expected: Vec3) {
    assert!(
        approx_eq(actual, expected),
        "expected {:?}, got {:?}",
        expected,
        actual
    );
}

// ============================================================================
// Identity and defaults
// ============================================================================

#[test]
fn test_root_injected_first_and_orphans_parented() {
    let spec = ModelSpec {
        bones: vec![bone("spine")],
        cubes: vec![cube("box", [0.0; 3], [1.0; 3])],
        ..Default::default()
    };
    let model = run(&spec).unwrap();

    assert_eq!(
        model.bones.keys().collect::<Vec<_>>(),
        vec!["root", "spine"]
    );
    assert_eq!(model.bones["root"].parent_id, None);
    assert_eq!(model.bones["spine"].parent_id.as_deref(), Some("root"));
    assert!(!model.bones["spine"].explicit.parent);
    assert_eq!(model.cubes["box"].parent_id, "root");
    assert_eq!(model.cubes["box"].origin, [0.5, 0.5, 0.5]);
}

#[test]
fn test_explicit_root_bone_not_self_parented() {
    let spec = ModelSpec {
        bones: vec![bone("root"), bone("spine")],
        ..Default::default()
    };
    let model = run(&spec).unwrap();
    assert_eq!(model.bones.len(), 2);
    assert_eq!(model.bones["root"].parent_id, None);
}

#[test]
fn test_without_enforce_root() {
    let mut spec = ModelSpec {
        bones: vec![bone("spine")],
        ..Default::default()
    };
    spec.policy.enforce_root = false;
    let model = run(&spec).unwrap();
    assert_eq!(model.bones.len(), 1);
    assert_eq!(model.bones["spine"].parent_id, None);

    spec.cubes.push(cube("box", [0.0; 3], [1.0; 3]));
    let err = run(&spec).unwrap_err();
    assert_eq!(err.code, ErrorCode::UnknownParent);
    assert_eq!(err.path.as_deref(), Some("cubes[0].parentId"));
}

#[test]
fn test_default_parent_id() {
    let mut spec = ModelSpec {
        bones: vec![
            BoneSpec {
                parent_id: Some("root".to_string()),
                ..bone("body")
            },
            bone("arm"),
        ],
        cubes: vec![cube("torso", [0.0; 3], [1.0; 3])],
        ..Default::default()
    };
    spec.policy.default_parent_id = Some("body".to_string());
    let model = run(&spec).unwrap();

    assert_eq!(model.bones["root"].parent_id, None);
    assert_eq!(model.bones["body"].parent_id.as_deref(), Some("root"));
    assert_eq!(model.bones["arm"].parent_id.as_deref(), Some("body"));
    assert_eq!(model.cubes["torso"].parent_id, "body");
}

#[test]
fn test_stable_path_ids() {
    let spec = ModelSpec {
        bones: vec![BoneSpec::named("Left Arm")],
        cubes: vec![CubeSpec {
            parent_id: Some("bone_root_left_arm".to_string()),
            ..CubeSpec::from_to("Upper", [0.0; 3], [1.0; 3])
        }],
        ..Default::default()
    };
    let model = run(&spec).unwrap();
    let arm = &model.bones["bone_root_left_arm"];
    assert_eq!(arm.name, "Left Arm");
    assert!(arm.explicit.name);
    assert!(model.cubes.contains_key("cube_bone_root_left_arm_upper"));
}

#[test]
fn test_hash_ids() {
    let mut spec = ModelSpec {
        bones: vec![BoneSpec::named("arm")],
        ..Default::default()
    };
    spec.policy.id_policy = IdPolicy::Hash;
    let model = run(&spec).unwrap();
    let id = model.bones.keys().nth(1).unwrap();
    assert_eq!(id.len(), crate::identity::HASH_ID_LEN);
    assert_eq!(model.bones[id.as_str()].name, "arm");

    let again = run(&spec).unwrap();
    assert_eq!(model, again);
}

#[test]
fn test_explicit_policy_missing_id_has_fix_hint() {
    let mut spec = ModelSpec {
        bones: vec![bone("spine"), BoneSpec::named("tail")],
        ..Default::default()
    };
    spec.policy.id_policy = IdPolicy::Explicit;
    let err = run(&spec).unwrap_err();
    assert_eq!(err.code, ErrorCode::MissingId);
    assert_eq!(err.path.as_deref(), Some("bones[1].id"));
    assert_eq!(
        err.fix.as_deref(),
        Some("set idPolicy to stable_path/hash or supply all ids")
    );
}

#[test]
fn test_entry_without_id_or_name() {
    let spec = ModelSpec {
        bones: vec![BoneSpec::default()],
        ..Default::default()
    };
    let err = run(&spec).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidEntry);
    assert_eq!(err.path.as_deref(), Some("bones[0]"));
}

// ============================================================================
// Templates
// ============================================================================

#[test]
fn test_template_entries_are_defaulted() {
    let spec = ModelSpec {
        rig_template: RigTemplate::Biped,
        ..Default::default()
    };
    let model = run(&spec).unwrap();
    assert_eq!(model.bones.len(), 7);
    let head = &model.bones["head"];
    assert_eq!(head.parent_id.as_deref(), Some("body"));
    assert_eq!(head.pivot, [0.0, 24.0, 0.0]);
    assert_eq!(head.explicit, BoneFlags::default());
    assert!(model.warnings.is_empty());
}

#[test]
fn test_caller_entry_replaces_template_in_place() {
    let spec = ModelSpec {
        rig_template: RigTemplate::Biped,
        bones: vec![BoneSpec {
            parent_id: Some("body".to_string()),
            pivot: Some([0.0, 26.0, 0.0]),
            ..bone("head")
        }],
        ..Default::default()
    };
    let model = run(&spec).unwrap();
    assert_eq!(model.bones.get_index_of("head"), Some(2));
    assert_eq!(model.bones["head"].pivot, [0.0, 26.0, 0.0]);
    assert!(model.bones["head"].explicit.pivot);
    assert_eq!(model.warnings.len(), 1);
    assert_eq!(model.warnings[0].code, WarningCode::TemplateOverridden);
}

#[test]
fn test_block_entity_template_cube() {
    let spec = ModelSpec {
        rig_template: RigTemplate::BlockEntity,
        ..Default::default()
    };
    let model = run(&spec).unwrap();
    let block = &model.cubes["block"];
    assert_eq!(block.parent_id, "root");
    assert_eq!(block.origin, [8.0, 8.0, 8.0]);
    assert!(!block.explicit.bounds);
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_duplicate_bone_id() {
    let spec = ModelSpec {
        bones: vec![bone("arm"), bone("arm")],
        ..Default::default()
    };
    let err = run(&spec).unwrap_err();
    assert_eq!(err.code, ErrorCode::DuplicateId);
    assert!(err.message.contains("bone id 'arm'"));
    assert_eq!(err.path.as_deref(), Some("bones[1].id"));
}

#[test]
fn test_duplicate_cube_name() {
    let spec = ModelSpec {
        cubes: vec![
            CubeSpec {
                name: Some("part".to_string()),
                ..cube("a", [0.0; 3], [1.0; 3])
            },
            CubeSpec {
                name: Some("part".to_string()),
                ..cube("b", [0.0; 3], [1.0; 3])
            },
        ],
        ..Default::default()
    };
    let err = run(&spec).unwrap_err();
    assert_eq!(err.code, ErrorCode::DuplicateName);
    assert!(err.message.contains("cube name 'part'"));
}

#[test]
fn test_duplicate_name_against_template() {
    let spec = ModelSpec {
        rig_template: RigTemplate::Biped,
        bones: vec![BoneSpec {
            name: Some("head".to_string()),
            ..bone("skull")
        }],
        ..Default::default()
    };
    let err = run(&spec).unwrap_err();
    assert_eq!(err.code, ErrorCode::DuplicateName);
}

#[test]
fn test_unknown_bone_parent() {
    let spec = ModelSpec {
        bones: vec![BoneSpec {
            parent_id: Some("ghost".to_string()),
            ..bone("arm")
        }],
        ..Default::default()
    };
    let err = run(&spec).unwrap_err();
    assert_eq!(err.code, ErrorCode::UnknownParent);
    assert!(err.message.contains("'ghost'"));
}

#[test]
fn test_unknown_cube_parent() {
    let spec = ModelSpec {
        cubes: vec![CubeSpec {
            parent_id: Some("ghost".to_string()),
            ..cube("box", [0.0; 3], [1.0; 3])
        }],
        ..Default::default()
    };
    let err = run(&spec).unwrap_err();
    assert_eq!(err.code, ErrorCode::UnknownParent);
}

#[test]
fn test_parent_cycle() {
    let spec = ModelSpec {
        bones: vec![
            BoneSpec {
                parent_id: Some("b".to_string()),
                ..bone("a")
            },
            BoneSpec {
                parent_id: Some("a".to_string()),
                ..bone("b")
            },
        ],
        ..Default::default()
    };
    let err = run(&spec).unwrap_err();
    assert_eq!(err.code, ErrorCode::ParentCycle);
    assert!(err.message.contains("a -> b -> a"), "{}", err.message);
}

#[test]
fn test_missing_bounds() {
    let spec = ModelSpec {
        cubes: vec![CubeSpec {
            id: Some("half".to_string()),
            from: Some([0.0; 3]),
            size: Some([1.0; 3]),
            ..Default::default()
        }],
        ..Default::default()
    };
    let err = run(&spec).unwrap_err();
    assert_eq!(err.code, ErrorCode::MissingBounds);
    assert_eq!(err.path.as_deref(), Some("cubes[0]"));
}

#[test]
fn test_center_and_size_bounds() {
    let spec = ModelSpec {
        cubes: vec![CubeSpec {
            id: Some("box".to_string()),
            center: Some([0.0, 4.0, 0.0]),
            size: Some([2.0, 8.0, 4.0]),
            ..Default::default()
        }],
        ..Default::default()
    };
    let model = run(&spec).unwrap();
    let b = &model.cubes["box"];
    assert_eq!(b.from, [-1.0, 0.0, -2.0]);
    assert_eq!(b.to, [1.0, 8.0, 2.0]);
    assert_eq!(b.origin, [0.0, 4.0, 0.0]);
    assert!(b.explicit.bounds);
    assert!(!b.explicit.origin);
}

#[test]
fn test_cube_ceiling_before_instances() {
    let spec = ModelSpec {
        cubes: vec![
            cube("a", [0.0; 3], [1.0; 3]),
            cube("b", [0.0; 3], [1.0; 3]),
        ],
        ..Default::default()
    };
    let err = normalize(&spec, 1).unwrap_err();
    assert_eq!(err.code, ErrorCode::CubeLimitExceeded);
    assert!(normalize(&spec, 2).is_ok());
}

#[test]
fn test_bone_ceiling() {
    let spec = ModelSpec {
        rig_template: RigTemplate::Quadruped,
        ..Default::default()
    };
    let limits = Limits::default().with_max_bones(4);
    let err = normalize_with_limits(&spec, &limits).unwrap_err();
    assert_eq!(err.code, ErrorCode::BoneLimitExceeded);
}

#[test]
fn test_invalid_policy_values() {
    let mut spec = ModelSpec::default();
    spec.policy.snap_grid = Some(0.0);
    assert_eq!(run(&spec).unwrap_err().code, ErrorCode::InvalidEntry);

    let mut spec = ModelSpec::default();
    spec.policy.bounds = Some(Bounds {
        min: [1.0, 0.0, 0.0],
        max: [0.0, 1.0, 1.0],
    });
    assert_eq!(
        run(&spec).unwrap_err().path.as_deref(),
        Some("policy.bounds")
    );
}

// ============================================================================
// Anchors
// ============================================================================

#[test]
fn test_anchor_scenario_pivot_and_center() {
    let spec = ModelSpec {
        bones: vec![BoneSpec {
            pivot_anchor_id: Some("root_anchor".to_string()),
            ..bone("child")
        }],
        cubes: vec![CubeSpec {
            center_anchor_id: Some("root_anchor".to_string()),
            ..cube("box", [0.0, 0.0, 0.0], [2.0, 2.0, 2.0])
        }],
        anchors: vec![anchor(
            "root_anchor",
            AnchorTarget::bone("root"),
            Some([1.0, 2.0, 3.0]),
        )],
        ..Default::default()
    };
    let model = run(&spec).unwrap();
    assert_eq!(model.bones["child"].pivot, [1.0, 2.0, 3.0]);
    let b = &model.cubes["box"];
    assert_eq!(b.from, [0.0, 1.0, 2.0]);
    assert_eq!(b.to, [2.0, 3.0, 4.0]);
    assert_eq!(b.origin, [1.0, 2.0, 3.0]);
}

#[test]
fn test_anchors_required() {
    let spec = ModelSpec {
        bones: vec![BoneSpec {
            pivot_anchor_id: Some("missing".to_string()),
            ..bone("child")
        }],
        ..Default::default()
    };
    let err = run(&spec).unwrap_err();
    assert_eq!(err.code, ErrorCode::AnchorsRequired);
    assert_eq!(err.message, "anchors required for id references");
}

#[test]
fn test_anchor_not_found() {
    let spec = ModelSpec {
        bones: vec![BoneSpec {
            pivot_anchor_id: Some("missing".to_string()),
            ..bone("child")
        }],
        anchors: vec![anchor("other", AnchorTarget::bone("root"), None)],
        ..Default::default()
    };
    let err = run(&spec).unwrap_err();
    assert_eq!(err.code, ErrorCode::AnchorNotFound);
    assert!(err.message.contains("'missing'"));
}

#[test]
fn test_anchor_target_not_found() {
    let spec = ModelSpec {
        anchors: vec![anchor("a", AnchorTarget::cube("ghost"), None)],
        ..Default::default()
    };
    let err = run(&spec).unwrap_err();
    assert_eq!(err.code, ErrorCode::AnchorTargetNotFound);
    assert_eq!(err.path.as_deref(), Some("anchors[0].target"));
}

#[test]
fn test_duplicate_anchor_id() {
    let spec = ModelSpec {
        anchors: vec![
            anchor("a", AnchorTarget::bone("root"), None),
            anchor("a", AnchorTarget::bone("root"), None),
        ],
        ..Default::default()
    };
    assert_eq!(run(&spec).unwrap_err().code, ErrorCode::DuplicateId);
}

#[test]
fn test_anchor_cycle_through_bone() {
    let spec = ModelSpec {
        bones: vec![BoneSpec {
            pivot_anchor_id: Some("a".to_string()),
            ..bone("x")
        }],
        anchors: vec![anchor("a", AnchorTarget::bone("x"), Some([1.0, 0.0, 0.0]))],
        ..Default::default()
    };
    let err = run(&spec).unwrap_err();
    assert_eq!(err.code, ErrorCode::AnchorCycle);
    assert!(
        err.message.contains("bone:x -> anchor:a -> bone:x"),
        "{}",
        err.message
    );
}

#[test]
fn test_anchor_cycle_through_cubes() {
    let spec = ModelSpec {
        cubes: vec![
            CubeSpec {
                center_anchor_id: Some("on_b".to_string()),
                ..cube("a", [0.0; 3], [1.0; 3])
            },
            CubeSpec {
                origin_anchor_id: Some("on_a".to_string()),
                ..cube("b", [0.0; 3], [1.0; 3])
            },
        ],
        anchors: vec![
            anchor("on_a", AnchorTarget::cube("a"), None),
            anchor("on_b", AnchorTarget::cube("b"), None),
        ],
        ..Default::default()
    };
    assert_eq!(run(&spec).unwrap_err().code, ErrorCode::AnchorCycle);
}

#[test]
fn test_anchor_chain_through_bones() {
    let spec = ModelSpec {
        bones: vec![
            BoneSpec {
                pivot: Some([0.0, 10.0, 0.0]),
                ..bone("body")
            },
            BoneSpec {
                pivot_anchor_id: Some("shoulder".to_string()),
                ..bone("arm")
            },
            BoneSpec {
                pivot_anchor_id: Some("elbow".to_string()),
                ..bone("forearm")
            },
        ],
        anchors: vec![
            // declared before the anchor it depends on
            anchor("elbow", AnchorTarget::bone("arm"), Some([0.0, -4.0, 0.0])),
            anchor("shoulder", AnchorTarget::bone("body"), Some([5.0, 0.0, 0.0])),
        ],
        ..Default::default()
    };
    let model = run(&spec).unwrap();
    assert_eq!(model.bones["arm"].pivot, [5.0, 10.0, 0.0]);
    assert_eq!(model.bones["forearm"].pivot, [5.0, 6.0, 0.0]);
}

#[test]
fn test_long_cube_anchor_chain() {
    // each cube is centered one unit past the previous one; listed deepest first
    const LINKS: usize = 4000;
    let mut cubes = Vec::with_capacity(LINKS);
    let mut anchors = Vec::with_capacity(LINKS);
    for i in (1..LINKS).rev() {
        cubes.push(CubeSpec {
            id: Some(format!("c{}", i)),
            size: Some([1.0; 3]),
            center_anchor_id: Some(format!("a{}", i)),
            ..Default::default()
        });
        anchors.push(anchor(
            &format!("a{}", i),
            AnchorTarget::cube(format!("c{}", i - 1)),
            Some([1.0, 0.0, 0.0]),
        ));
    }
    cubes.push(cube("c0", [0.0; 3], [1.0; 3]));
    let spec = ModelSpec {
        cubes,
        anchors,
        ..Default::default()
    };

    let model = normalize(&spec, 4096).unwrap();
    let last = &model.cubes["c3999"];
    assert_eq!(last.from, [3999.0, 0.0, 0.0]);
    assert_eq!(last.to, [4000.0, 1.0, 1.0]);
    assert_eq!(last.origin, [3999.5, 0.5, 0.5]);
}

#[test]
fn test_long_bone_pivot_chain() {
    // parented and pivot-anchored to the previous bone, listed deepest first
    const LINKS: usize = 1000;
    let mut bones = Vec::with_capacity(LINKS);
    let mut anchors = Vec::with_capacity(LINKS);
    for i in (1..LINKS).rev() {
        bones.push(BoneSpec {
            parent_id: Some(format!("b{}", i - 1)),
            pivot_anchor_id: Some(format!("p{}", i)),
            ..bone(&format!("b{}", i))
        });
        anchors.push(anchor(
            &format!("p{}", i),
            AnchorTarget::bone(format!("b{}", i - 1)),
            Some([0.0, 1.0, 0.0]),
        ));
    }
    bones.push(bone("b0"));
    let spec = ModelSpec {
        bones,
        anchors,
        ..Default::default()
    };

    let model = normalize(&spec, 16).unwrap();
    assert_eq!(model.bones.len(), LINKS + 1);
    assert_eq!(model.bones["b999"].pivot, [0.0, 999.0, 0.0]);
}

#[test]
fn test_cube_anchor_base_point() {
    let spec = ModelSpec {
        bones: vec![
            BoneSpec {
                pivot_anchor_id: Some("on_centered".to_string()),
                ..bone("a")
            },
            BoneSpec {
                pivot_anchor_id: Some("on_origin".to_string()),
                ..bone("b")
            },
        ],
        cubes: vec![
            cube("centered", [0.0; 3], [4.0; 3]),
            CubeSpec {
                origin: Some([9.0, 9.0, 9.0]),
                ..cube("with_origin", [0.0; 3], [4.0; 3])
            },
        ],
        anchors: vec![
            anchor("on_centered", AnchorTarget::cube("centered"), None),
            anchor("on_origin", AnchorTarget::cube("with_origin"), None),
        ],
        ..Default::default()
    };
    let model = run(&spec).unwrap();
    assert_eq!(model.bones["a"].pivot, [2.0, 2.0, 2.0]);
    assert_eq!(model.bones["b"].pivot, [9.0, 9.0, 9.0]);
}

#[test]
fn test_center_and_origin_anchor_on_one_cube() {
    let spec = ModelSpec {
        bones: vec![BoneSpec {
            pivot: Some([0.0, 8.0, 0.0]),
            ..bone("hinge")
        }],
        cubes: vec![CubeSpec {
            center_anchor_id: Some("mid".to_string()),
            origin_anchor_id: Some("hinge_point".to_string()),
            ..cube("door", [0.0; 3], [2.0, 4.0, 2.0])
        }],
        anchors: vec![
            anchor("mid", AnchorTarget::bone("root"), Some([10.0, 0.0, 0.0])),
            anchor("hinge_point", AnchorTarget::bone("hinge"), None),
        ],
        ..Default::default()
    };
    let model = run(&spec).unwrap();
    let door = &model.cubes["door"];
    assert_eq!(door.from, [9.0, -2.0, -1.0]);
    assert_eq!(door.to, [11.0, 2.0, 1.0]);
    assert_eq!(door.origin, [0.0, 8.0, 0.0]);
}

// ============================================================================
// Instances
// ============================================================================

fn with_instances(cubes: Vec<CubeSpec>, instances: Vec<InstanceKind>) -> ModelSpec {
    ModelSpec {
        cubes,
        instances: instances.into_iter().map(InstanceSpec::from).collect(),
        ..Default::default()
    }
}

#[test]
fn test_mirror_instance() {
    let spec = with_instances(
        vec![CubeSpec {
            rotation: Some([10.0, 20.0, 30.0]),
            origin: Some([3.0, 0.0, 0.0]),
            ..cube("arm_l", [2.0, 0.0, 0.0], [4.0, 2.0, 2.0])
        }],
        vec![InstanceKind::Mirror(MirrorInstance {
            source_id: "arm_l".to_string(),
            axis: Axis::X,
            offset: 0.0,
            new_id: Some("arm_r".to_string()),
            new_name: None,
        })],
    );
    let model = run(&spec).unwrap();
    let arm = &model.cubes["arm_r"];
    assert_eq!(arm.name, "arm_l_mirror");
    assert_eq!(arm.from, [-4.0, 0.0, 0.0]);
    assert_eq!(arm.to, [-2.0, 2.0, 2.0]);
    assert_eq!(arm.origin, [-3.0, 0.0, 0.0]);
    assert_eq!(arm.rotation, [10.0, -20.0, -30.0]);
    assert_eq!(arm.parent_id, "root");
    // the source is untouched
    assert_eq!(model.cubes["arm_l"].from, [2.0, 0.0, 0.0]);
}

#[test]
fn test_mirror_about_offset_plane() {
    let spec = with_instances(
        vec![cube("a", [0.0, 1.0, 0.0], [1.0, 3.0, 1.0])],
        vec![InstanceKind::Mirror(MirrorInstance {
            source_id: "a".to_string(),
            axis: Axis::Y,
            offset: 4.0,
            new_id: None,
            new_name: None,
        })],
    );
    let model = run(&spec).unwrap();
    let m = &model.cubes["a_mirror"];
    assert_eq!(m.from, [0.0, 5.0, 0.0]);
    assert_eq!(m.to, [1.0, 7.0, 1.0]);
}

#[test]
fn test_repeat_instance() {
    let spec = with_instances(
        vec![cube("tooth", [0.0; 3], [1.0; 3])],
        vec![InstanceKind::Repeat(RepeatInstance {
            source_id: "tooth".to_string(),
            count: 3,
            delta: [2.0, 0.0, 0.0],
            id_prefix: None,
        })],
    );
    let model = run(&spec).unwrap();
    assert_eq!(model.cubes.len(), 4);
    assert_eq!(model.cubes["tooth_repeat_1"].from, [2.0, 0.0, 0.0]);
    assert_eq!(model.cubes["tooth_repeat_3"].to, [7.0, 1.0, 1.0]);
    assert_eq!(model.cubes["tooth_repeat_3"].origin, [6.5, 0.5, 0.5]);
    assert_eq!(model.cubes["tooth_repeat_2"].name, "tooth_repeat_2");
}

#[test]
fn test_radial_instance_with_radius() {
    let spec = with_instances(
        vec![cube("petal", [-0.5, 0.0, -0.5], [0.5, 1.0, 0.5])],
        vec![InstanceKind::Radial(RadialInstance {
            source_id: "petal".to_string(),
            count: 4,
            axis: Axis::Y,
            center: [0.0; 3],
            radius: Some(4.0),
            start_angle: None,
            id_prefix: Some("ring".to_string()),
        })],
    );
    let model = run(&spec).unwrap();
    assert_eq!(model.cubes.len(), 5);

    // source on the center: offset direction falls back to +X
    let first = &model.cubes["ring_1"];
    assert_vec(first.center(), [4.0, 0.5, 0.0]);
    assert_eq!(first.rotation, [0.0, 0.0, 0.0]);

    let second = &model.cubes["ring_2"];
    assert_vec(second.center(), [0.0, 0.5, -4.0]);
    assert_eq!(second.rotation, [0.0, 90.0, 0.0]);
    assert_vec(second.size(), [1.0, 1.0, 1.0]);

    let third = &model.cubes["ring_3"];
    assert_vec(third.center(), [-4.0, 0.5, 0.0]);
}

#[test]
fn test_radial_without_radius_on_center_stays_at_center() {
    let spec = with_instances(
        vec![cube("hub", [-1.0; 3], [1.0; 3])],
        vec![InstanceKind::Radial(RadialInstance {
            source_id: "hub".to_string(),
            count: 3,
            axis: Axis::Z,
            center: [0.0; 3],
            radius: None,
            start_angle: Some(30.0),
            id_prefix: None,
        })],
    );
    let model = run(&spec).unwrap();
    for i in 1..=3 {
        let c = &model.cubes[format!("hub_radial_{}", i).as_str()];
        assert_vec(c.center(), [0.0, 0.0, 0.0]);
    }
    assert_eq!(model.cubes["hub_radial_1"].rotation, [0.0, 0.0, 30.0]);
    assert_eq!(model.cubes["hub_radial_2"].rotation, [0.0, 0.0, 150.0]);
}

#[test]
fn test_radial_rescales_existing_offset() {
    let spec = with_instances(
        vec![cube("spoke", [1.0, 0.0, 0.0], [3.0, 2.0, 2.0])],
        vec![InstanceKind::Radial(RadialInstance {
            source_id: "spoke".to_string(),
            count: 2,
            axis: Axis::Y,
            center: [0.0; 3],
            radius: Some(4.0),
            start_angle: None,
            id_prefix: None,
        })],
    );
    let model = run(&spec).unwrap();
    // planar offset (2, _, 1) rescaled to length 4, axial y kept at 1
    let first = model.cubes["spoke_radial_1"].center();
    assert!((first[0] * first[0] + first[2] * first[2] - 16.0).abs() < 1e-6);
    assert!((first[1] - 1.0).abs() < 1e-9);
    let second = model.cubes["spoke_radial_2"].center();
    assert_vec(second, [-first[0], first[1], -first[2]]);
}

#[test]
fn test_instances_chain_on_generated_cubes() {
    let spec = with_instances(
        vec![cube("leg", [1.0, 0.0, 1.0], [2.0, 4.0, 2.0])],
        vec![
            InstanceKind::Mirror(MirrorInstance {
                source_id: "leg".to_string(),
                axis: Axis::X,
                offset: 0.0,
                new_id: None,
                new_name: None,
            }),
            InstanceKind::Mirror(MirrorInstance {
                source_id: "leg_mirror".to_string(),
                axis: Axis::Z,
                offset: 0.0,
                new_id: Some("leg_back".to_string()),
                new_name: Some("leg_back".to_string()),
            }),
        ],
    );
    let model = run(&spec).unwrap();
    assert_eq!(model.cubes["leg_back"].from, [-2.0, 0.0, -2.0]);
}

#[test]
fn test_instance_source_not_found() {
    let spec = with_instances(
        vec![],
        vec![InstanceKind::Repeat(RepeatInstance {
            source_id: "ghost".to_string(),
            count: 2,
            delta: [1.0, 0.0, 0.0],
            id_prefix: None,
        })],
    );
    let err = run(&spec).unwrap_err();
    assert_eq!(err.code, ErrorCode::InstanceSourceNotFound);
    assert!(err.message.contains("'ghost'"));
    assert_eq!(err.path.as_deref(), Some("instances[0].sourceId"));
}

#[test]
fn test_instance_duplicate_generated_id() {
    let spec = with_instances(
        vec![
            cube("a", [0.0; 3], [1.0; 3]),
            cube("a_repeat_2", [5.0; 3], [6.0; 3]),
        ],
        vec![InstanceKind::Repeat(RepeatInstance {
            source_id: "a".to_string(),
            count: 2,
            delta: [1.0, 0.0, 0.0],
            id_prefix: None,
        })],
    );
    let err = run(&spec).unwrap_err();
    assert_eq!(err.code, ErrorCode::DuplicateId);
    assert!(err.message.contains("a_repeat_2"));
}

#[test]
fn test_instance_generated_name_collision() {
    let spec = with_instances(
        vec![
            cube("a", [0.0; 3], [1.0; 3]),
            CubeSpec {
                name: Some("a_mirror".to_string()),
                ..cube("other", [0.0; 3], [1.0; 3])
            },
        ],
        vec![InstanceKind::Mirror(MirrorInstance {
            source_id: "a".to_string(),
            axis: Axis::X,
            offset: 0.0,
            new_id: Some("a_copy".to_string()),
            new_name: None,
        })],
    );
    assert_eq!(run(&spec).unwrap_err().code, ErrorCode::DuplicateName);
}

#[test]
fn test_instance_count_zero() {
    let spec = with_instances(
        vec![cube("a", [0.0; 3], [1.0; 3])],
        vec![InstanceKind::Radial(RadialInstance {
            source_id: "a".to_string(),
            count: 0,
            axis: Axis::Y,
            center: [0.0; 3],
            radius: None,
            start_angle: None,
            id_prefix: None,
        })],
    );
    assert_eq!(run(&spec).unwrap_err().code, ErrorCode::InvalidEntry);
}

#[test]
fn test_cube_ceiling_after_instances() {
    let spec = with_instances(
        vec![cube("a", [0.0; 3], [1.0; 3])],
        vec![InstanceKind::Repeat(RepeatInstance {
            source_id: "a".to_string(),
            count: 10,
            delta: [1.0, 0.0, 0.0],
            id_prefix: None,
        })],
    );
    let err = normalize(&spec, 5).unwrap_err();
    assert_eq!(err.code, ErrorCode::CubeLimitExceeded);
    assert!(normalize(&spec, 11).is_ok());
}

#[test]
fn test_unknown_instance_kind_warns() {
    let mut spec = ModelSpec::from_json(
        r#"{
            "cubes": [{"id": "rock", "from": [0, 0, 0], "to": [1, 1, 1]}],
            "instances": [{"type": "scatter", "sourceId": "rock"}]
        }"#,
    )
    .unwrap();
    let model = run(&spec).unwrap();
    assert_eq!(model.cubes.len(), 1);
    assert_eq!(model.warnings.len(), 1);
    assert_eq!(model.warnings[0].code, WarningCode::UnknownInstanceKind);
    assert_eq!(model.warnings[0].path.as_deref(), Some("instances[0]"));

    spec.instances.clear();
    assert!(run(&spec).unwrap().warnings.is_empty());
}

// ============================================================================
// Snapping and clamping
// ============================================================================

#[test]
fn test_snap_then_clamp() {
    let mut spec = ModelSpec {
        bones: vec![BoneSpec {
            pivot: Some([0.3, 20.2, -0.8]),
            ..bone("head")
        }],
        cubes: vec![cube("box", [-0.2, 0.6, 0.0], [40.0, 1.4, 1.0])],
        ..Default::default()
    };
    spec.policy.snap_grid = Some(0.5);
    spec.policy.bounds = Some(Bounds {
        min: [-16.0, 0.0, -16.0],
        max: [16.0, 16.0, 16.0],
    });
    let model = run(&spec).unwrap();
    assert_eq!(model.bones["head"].pivot, [0.5, 16.0, -1.0]);
    let b = &model.cubes["box"];
    assert_eq!(b.from, [0.0, 0.5, 0.0]);
    assert_eq!(b.to, [16.0, 1.5, 1.0]);
    assert_eq!(b.origin, [16.0, 1.0, 0.5]);
}

#[test]
fn test_snap_applies_after_anchor_resolution() {
    let mut spec = ModelSpec {
        bones: vec![BoneSpec {
            pivot_anchor_id: Some("a".to_string()),
            ..bone("child")
        }],
        anchors: vec![anchor("a", AnchorTarget::bone("root"), Some([0.26, 0.74, 1.1]))],
        ..Default::default()
    };
    spec.policy.snap_grid = Some(0.5);
    let model = run(&spec).unwrap();
    assert_eq!(model.bones["child"].pivot, [0.5, 0.5, 1.0]);
}

#[test]
fn test_normalize_is_deterministic() {
    let spec = ModelSpec {
        rig_template: RigTemplate::Quadruped,
        bones: vec![BoneSpec::named("tail"), BoneSpec::named("ear")],
        cubes: vec![CubeSpec::from_to("hoof", [0.0; 3], [1.0; 3])],
        ..Default::default()
    };
    let a = run(&spec).unwrap();
    let b = run(&spec).unwrap();
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}
