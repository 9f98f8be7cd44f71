//! Shape contract: support mapping, local AABB extents, margin, and inertia.
//!
//! Shapes are value objects restricted to the four primitives this engine
//! understands. A world deduplicates equal shapes by reference count through
//! [`ShapeRegistry`] rather than storing geometry per-body.

use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};

use crate::core::types::InertiaTensorExt;

/// Convex primitive understood by the narrow phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Box {
        half_extents: Vec3,
        margin: f32,
    },
    Sphere {
        radius: f32,
        margin: f32,
    },
    /// Apex on +Y, base disk of `radius` on -Y, symmetric about the local
    /// origin which is placed at the solid cone's centroid (`3h/4` below the
    /// apex, `h/4` above the base) so that it composes with `Transform` the
    /// same way the other primitives do.
    Cone {
        radius: f32,
        height: f32,
        margin: f32,
    },
    /// Axis along Y, centered at the local origin.
    Cylinder {
        radius: f32,
        height: f32,
        margin: f32,
    },
}

impl Shape {
    pub fn cuboid(half_extents: Vec3) -> Self {
        Shape::Box {
            half_extents,
            margin: DEFAULT_MARGIN,
        }
    }

    pub fn sphere(radius: f32) -> Self {
        Shape::Sphere {
            radius,
            margin: DEFAULT_MARGIN,
        }
    }

    pub fn cone(radius: f32, height: f32) -> Self {
        Shape::Cone {
            radius,
            height,
            margin: DEFAULT_MARGIN,
        }
    }

    pub fn cylinder(radius: f32, height: f32) -> Self {
        Shape::Cylinder {
            radius,
            height,
            margin: DEFAULT_MARGIN,
        }
    }

    pub fn margin(&self) -> f32 {
        match *self {
            Shape::Box { margin, .. }
            | Shape::Sphere { margin, .. }
            | Shape::Cone { margin, .. }
            | Shape::Cylinder { margin, .. } => margin,
        }
    }

    /// Local-space support point in direction `dir`, ignoring margin.
    pub fn support_local(&self, dir: Vec3) -> Vec3 {
        match *self {
            Shape::Box { half_extents, .. } => Vec3::new(
                half_extents.x * dir.x.signum(),
                half_extents.y * dir.y.signum(),
                half_extents.z * dir.z.signum(),
            ),
            Shape::Sphere { radius, .. } => {
                dir.normalize_or_zero() * radius
            }
            Shape::Cylinder { radius, height, .. } => {
                let lateral = radial_support(dir, radius);
                Vec3::new(lateral.x, (height * 0.5) * dir.y.signum(), lateral.z)
            }
            Shape::Cone { radius, height, .. } => {
                let (apex_y, base_y) = cone_apex_base_y(height);
                let apex = Vec3::new(0.0, apex_y, 0.0);
                let rim = radial_support(dir, radius) + Vec3::new(0.0, base_y, 0.0);
                if apex.dot(dir) >= rim.dot(dir) {
                    apex
                } else {
                    rim
                }
            }
        }
    }

    /// Local-space support point in direction `dir`, expanded by margin.
    pub fn support_with_margin(&self, dir: Vec3) -> Vec3 {
        let core = self.support_local(dir);
        let n = dir.normalize_or_zero();
        core + n * self.margin()
    }

    /// `(min, max)` local-space AABB including margin, relative to the
    /// shape's own local origin (not necessarily the AABB's center).
    pub fn local_aabb(&self) -> (Vec3, Vec3) {
        let m = self.margin();
        match *self {
            Shape::Box { half_extents, .. } => {
                let e = half_extents + Vec3::splat(m);
                (-e, e)
            }
            Shape::Sphere { radius, .. } => {
                let e = Vec3::splat(radius + m);
                (-e, e)
            }
            Shape::Cylinder { radius, height, .. } => {
                let r = radius + m;
                let hy = height * 0.5 + m;
                (Vec3::new(-r, -hy, -r), Vec3::new(r, hy, r))
            }
            Shape::Cone { radius, height, .. } => {
                let (apex_y, base_y) = cone_apex_base_y(height);
                let r = radius + m;
                (
                    Vec3::new(-r, base_y - m, -r),
                    Vec3::new(r, apex_y + m, r),
                )
            }
        }
    }

    /// Per-mass local inertia tensor about the shape's local origin.
    ///
    /// For box/sphere/cylinder the local origin is already the centroid. For
    /// the cone the local origin was chosen to be the centroid as well, so
    /// no parallel-axis correction is needed here.
    pub fn inertia_tensor(&self, mass: f32) -> Mat3 {
        match *self {
            Shape::Box { half_extents, .. } => Mat3::for_solid_box(half_extents, mass),
            Shape::Sphere { radius, .. } => Mat3::for_solid_sphere(radius, mass),
            Shape::Cylinder { radius, height, .. } => {
                let axis = (1.0 / 12.0) * mass * (3.0 * radius * radius + height * height);
                Mat3::from_diagonal(Vec3::new(axis, 0.5 * mass * radius * radius, axis))
            }
            Shape::Cone { radius, height, .. } => {
                let perp = mass * (3.0 / 20.0 * radius * radius + 3.0 / 80.0 * height * height);
                let axis = 3.0 / 10.0 * mass * radius * radius;
                Mat3::from_diagonal(Vec3::new(perp, axis, perp))
            }
        }
    }
}

/// Default collision margin applied to freshly constructed shapes; lets the
/// narrow phase report contact slightly before geometric touch (§4.5).
pub const DEFAULT_MARGIN: f32 = 0.01;

fn radial_support(dir: Vec3, radius: f32) -> Vec3 {
    let planar = Vec3::new(dir.x, 0.0, dir.z);
    let lateral = planar.normalize_or_zero();
    if lateral == Vec3::ZERO {
        Vec3::new(radius, 0.0, 0.0)
    } else {
        lateral * radius
    }
}

/// Apex/base Y-coordinates that place a cone's centroid at the local origin.
fn cone_apex_base_y(height: f32) -> (f32, f32) {
    (0.75 * height, -0.25 * height)
}

/// Ref-counted registry deduplicating shapes created with identical
/// parameters, keyed by a canonical-form hash (§9 Design Notes).
#[derive(Default)]
pub struct ShapeRegistry {
    entries: std::collections::HashMap<ShapeKey, (Shape, u32)>,
}

impl ShapeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `shape`, bumping its reference count if an identical shape
    /// is already present, and returns the canonical key to look it up by.
    pub fn acquire(&mut self, shape: Shape) -> ShapeKey {
        let key = ShapeKey::from_shape(&shape);
        self.entries
            .entry(key)
            .and_modify(|(_, count)| *count += 1)
            .or_insert((shape, 1));
        key
    }

    pub fn release(&mut self, key: ShapeKey) {
        if let Some((_, count)) = self.entries.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                self.entries.remove(&key);
            }
        }
    }

    pub fn get(&self, key: ShapeKey) -> Option<&Shape> {
        self.entries.get(&key).map(|(shape, _)| shape)
    }
}

/// Hashable canonical form of a [`Shape`]'s parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeKey(u64, [i64; 4]);

impl ShapeKey {
    const QUANT: f32 = 100_000.0;

    fn from_shape(shape: &Shape) -> Self {
        let (tag, a, b, c, d) = match *shape {
            Shape::Box { half_extents, margin } => {
                (0u64, half_extents.x, half_extents.y, half_extents.z, margin)
            }
            Shape::Sphere { radius, margin } => (1, radius, 0.0, 0.0, margin),
            Shape::Cone { radius, height, margin } => (2, radius, height, 0.0, margin),
            Shape::Cylinder { radius, height, margin } => (3, radius, height, 0.0, margin),
        };
        let q = |v: f32| (v * Self::QUANT).round() as i64;
        Self(tag, [q(a), q(b), q(c), q(d)])
    }
}
