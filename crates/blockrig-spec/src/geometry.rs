//! Vector helpers shared by every normalization and planning stage.
//!
//! Vectors are plain `[f64; 3]` arrays. Rotations are Euler angles in
//! degrees, one component per axis.

use serde::{Deserialize, Serialize};

/// A 3-component vector (position, extent, Euler rotation, or scale).
pub type Vec3 = [f64; 3];

/// The zero vector.
pub const ZERO: Vec3 = [0.0, 0.0, 0.0];

/// The unit scale vector.
pub const ONE: Vec3 = [1.0, 1.0, 1.0];

/// Per-component tolerance used when comparing vectors and scalars.
pub const EPSILON: f64 = 1e-4;

/// A coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// X axis.
    X,
    /// Y axis.
    Y,
    /// Z axis.
    Z,
}

impl Axis {
    /// Returns the component index of this axis.
    pub fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Returns the axis name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

/// Axis-aligned bounds used for clamping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bounds {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Bounds {
    /// Returns true if `min <= max` on every axis.
    pub fn is_valid(&self) -> bool {
        (0..3).all(|i| self.min[i] <= self.max[i])
    }
}

pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub fn subtract(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn scale(v: Vec3, factor: f64) -> Vec3 {
    [v[0] * factor, v[1] * factor, v[2] * factor]
}

pub fn length(v: Vec3) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

/// Midpoint of a box given by two corners.
pub fn center(from: Vec3, to: Vec3) -> Vec3 {
    scale(add(from, to), 0.5)
}

/// Extent of a box given by two corners.
pub fn size(from: Vec3, to: Vec3) -> Vec3 {
    subtract(to, from)
}

/// Compares two vectors with [`EPSILON`] tolerance per component.
pub fn approx_eq(a: Vec3, b: Vec3) -> bool {
    (0..3).all(|i| (a[i] - b[i]).abs() <= EPSILON)
}

/// Compares two scalars with [`EPSILON`] tolerance.
pub fn approx_eq_scalar(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}

/// Snaps every component to the nearest multiple of `grid`.
///
/// A non-positive grid leaves the vector untouched.
pub fn snap(v: Vec3, grid: f64) -> Vec3 {
    if grid <= 0.0 {
        return v;
    }
    v.map(|c| {
        let snapped = (c / grid).round() * grid;
        // keep -0.0 out of serialized output
        if snapped == 0.0 {
            0.0
        } else {
            snapped
        }
    })
}

/// Clamps every component into `bounds`.
pub fn clamp(v: Vec3, bounds: &Bounds) -> Vec3 {
    [
        v[0].clamp(bounds.min[0], bounds.max[0]),
        v[1].clamp(bounds.min[1], bounds.max[1]),
        v[2].clamp(bounds.min[2], bounds.max[2]),
    ]
}

/// Rotates `point` about `axis` through `pivot` by `degrees` (right-hand rule).
pub fn rotate_about_axis(point: Vec3, axis: Axis, pivot: Vec3, degrees: f64) -> Vec3 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let [x, y, z] = subtract(point, pivot);
    let rotated = match axis {
        Axis::X => [x, y * cos - z * sin, y * sin + z * cos],
        Axis::Y => [x * cos + z * sin, y, -x * sin + z * cos],
        Axis::Z => [x * cos - y * sin, x * sin + y * cos, z],
    };
    add(rotated, pivot)
}

/// Reflects a single coordinate across the plane `offset`.
pub fn mirror_coordinate(value: f64, offset: f64) -> f64 {
    2.0 * offset - value
}

/// Mirrors Euler angles for a reflection across the plane normal to `axis`.
///
/// Mirroring across X negates the Y and Z components, and likewise for the
/// other axes: the component on the mirror axis is kept.
pub fn mirror_rotation(rotation: Vec3, axis: Axis) -> Vec3 {
    let keep = axis.index();
    let mut out = rotation;
    for (i, component) in out.iter_mut().enumerate() {
        if i != keep && *component != 0.0 {
            *component = -*component;
        }
    }
    out
}
