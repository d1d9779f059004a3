//! Instance expansion: mirror, repeat and radial copies of a source cube.
//!
//! Directives run in document order and may use cubes generated by earlier
//! directives as their source. Sources are never modified.

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{ErrorCode, ReconcileError, ReconcileWarning, WarningCode};
use crate::geometry::{self, Axis, Vec3, EPSILON, ZERO};
use crate::model::NormalizedCube;
use crate::spec::{InstanceKind, InstanceSpec, MirrorInstance, RadialInstance, RepeatInstance};

/// Result of an expansion pass.
#[derive(Debug, Default)]
pub(crate) struct InstanceExpansion {
    /// Number of cubes appended.
    pub created: usize,
    /// Skipped directives.
    pub warnings: Vec<ReconcileWarning>,
}

/// Appends the cubes every directive materializes.
pub(crate) fn expand_instances(
    instances: &[InstanceSpec],
    cubes: &mut IndexMap<String, NormalizedCube>,
    max_cubes: usize,
) -> Result<InstanceExpansion, ReconcileError> {
    let mut expansion = InstanceExpansion::default();

    for (i, instance) in instances.iter().enumerate() {
        let path = format!("instances[{}]", i);
        let kind = match instance {
            InstanceSpec::Known(kind) => kind,
            InstanceSpec::Unknown { kind, .. } => {
                let warning = ReconcileWarning::with_path(
                    WarningCode::UnknownInstanceKind,
                    format!("unknown instance type '{}' skipped", kind),
                    &path,
                );
                warn!(%warning, "skipping instance directive");
                expansion.warnings.push(warning);
                continue;
            }
        };

        let source = cubes.get(kind.source_id()).ok_or_else(|| {
            ReconcileError::with_path(
                ErrorCode::InstanceSourceNotFound,
                format!("instance source cube '{}' not found", kind.source_id()),
                format!("{}.sourceId", path),
            )
        })?;

        let requested = match kind {
            InstanceKind::Mirror(_) => 1,
            InstanceKind::Repeat(r) => r.count as usize,
            InstanceKind::Radial(r) => r.count as usize,
        };
        if requested == 0 {
            return Err(ReconcileError::with_path(
                ErrorCode::InvalidEntry,
                "instance count must be at least 1",
                format!("{}.count", path),
            ));
        }
        if cubes.len() + requested > max_cubes {
            return Err(super::cube_limit_error(cubes.len() + requested, max_cubes));
        }

        let generated = match kind {
            InstanceKind::Mirror(m) => vec![mirror(source, m)],
            InstanceKind::Repeat(r) => repeat(source, r),
            InstanceKind::Radial(r) => radial(source, r),
        };

        for cube in generated {
            if cubes.contains_key(&cube.id) {
                return Err(ReconcileError::with_path(
                    ErrorCode::DuplicateId,
                    format!("instance cube id '{}' already exists", cube.id),
                    &path,
                )
                .fix("set newId or idPrefix to an unused value"));
            }
            cubes.insert(cube.id.clone(), cube);
            expansion.created += 1;
        }
    }

    debug!(
        directives = instances.len(),
        created = expansion.created,
        "expanded instances"
    );
    Ok(expansion)
}

/// Copies `source` under a new identity and placement.
///
/// Geometry counts as caller-set; anchors are already baked in.
fn derive(
    source: &NormalizedCube,
    id: String,
    name: String,
    from: Vec3,
    to: Vec3,
    origin: Vec3,
    rotation: Vec3,
) -> NormalizedCube {
    let mut cube = source.clone();
    cube.id = id;
    cube.name = name;
    cube.from = from;
    cube.to = to;
    cube.origin = origin;
    cube.rotation = rotation;
    cube.origin_anchor_id = None;
    cube.center_anchor_id = None;
    cube.explicit.id = true;
    cube.explicit.name = true;
    cube.explicit.bounds = true;
    cube.explicit.origin = true;
    cube.explicit.rotation = true;
    cube
}

fn mirror(source: &NormalizedCube, m: &MirrorInstance) -> NormalizedCube {
    let axis = m.axis.index();
    let a = geometry::mirror_coordinate(source.from[axis], m.offset);
    let b = geometry::mirror_coordinate(source.to[axis], m.offset);
    let mut from = source.from;
    let mut to = source.to;
    from[axis] = a.min(b);
    to[axis] = a.max(b);
    let mut origin = source.origin;
    origin[axis] = geometry::mirror_coordinate(origin[axis], m.offset);

    let id = m
        .new_id
        .clone()
        .unwrap_or_else(|| format!("{}_mirror", source.id));
    let name = m
        .new_name
        .clone()
        .unwrap_or_else(|| format!("{}_mirror", source.name));
    derive(
        source,
        id,
        name,
        from,
        to,
        origin,
        geometry::mirror_rotation(source.rotation, m.axis),
    )
}

fn repeat(source: &NormalizedCube, r: &RepeatInstance) -> Vec<NormalizedCube> {
    let prefix = r
        .id_prefix
        .clone()
        .unwrap_or_else(|| format!("{}_repeat", source.id));
    (1..=r.count)
        .map(|step| {
            let shift = geometry::scale(r.delta, f64::from(step));
            let id = format!("{}_{}", prefix, step);
            derive(
                source,
                id.clone(),
                id,
                geometry::add(source.from, shift),
                geometry::add(source.to, shift),
                geometry::add(source.origin, shift),
                source.rotation,
            )
        })
        .collect()
}

/// Unit direction used when the source sits on the rotation center.
fn fallback_direction(axis: Axis) -> Vec3 {
    match axis {
        Axis::X => [0.0, 1.0, 0.0],
        Axis::Y | Axis::Z => [1.0, 0.0, 0.0],
    }
}

fn radial(source: &NormalizedCube, r: &RadialInstance) -> Vec<NormalizedCube> {
    let ax = r.axis.index();
    let source_center = source.center();
    let half = geometry::scale(source.size(), 0.5);
    let origin_offset = geometry::subtract(source.origin, source_center);

    // split the offset from the center into its axial and planar parts
    let mut offset = geometry::subtract(source_center, r.center);
    let axial = offset[ax];
    offset[ax] = 0.0;
    if let Some(radius) = r.radius {
        let planar = geometry::length(offset);
        offset = if planar > EPSILON {
            geometry::scale(offset, radius / planar)
        } else {
            geometry::scale(fallback_direction(r.axis), radius)
        };
    }
    offset[ax] = axial;
    let start_point = geometry::add(r.center, offset);

    let prefix = r
        .id_prefix
        .clone()
        .unwrap_or_else(|| format!("{}_radial", source.id));
    let step_angle = 360.0 / f64::from(r.count);
    let start_angle = r.start_angle.unwrap_or(0.0);

    (0..r.count)
        .map(|step| {
            let angle = start_angle + step_angle * f64::from(step);
            let center = geometry::rotate_about_axis(start_point, r.axis, r.center, angle);
            let origin = geometry::add(
                center,
                geometry::rotate_about_axis(origin_offset, r.axis, ZERO, angle),
            );
            let mut rotation = source.rotation;
            rotation[ax] += angle;
            let id = format!("{}_{}", prefix, step + 1);
            derive(
                source,
                id.clone(),
                id,
                geometry::subtract(center, half),
                geometry::add(center, half),
                origin,
                rotation,
            )
        })
        .collect()
}
