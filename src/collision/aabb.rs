//! AABB algebra and the symmetric overlapping-pair key (§4.2).

use glam::Vec3;

use crate::utils::allocator::EntityId;

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Builds the world-space AABB of a shape's local AABB transformed by
    /// `position`/`rotation`, expanded by `fattening` on every axis (used so
    /// a body that moves within the fattened margin doesn't need a new
    /// broad-phase sweep).
    pub fn from_local(local_min: Vec3, local_max: Vec3, position: Vec3, rotation: glam::Quat, fattening: f32) -> Self {
        let center = (local_min + local_max) * 0.5;
        let half = (local_max - local_min) * 0.5;
        let rot_mat = glam::Mat3::from_quat(rotation);
        // World-space half-extent of a rotated box: sum of |row| * half, per axis.
        let world_half = Vec3::new(
            rot_mat.row(0).abs().dot(half),
            rot_mat.row(1).abs().dot(half),
            rot_mat.row(2).abs().dot(half),
        );
        let world_center = position + rotation * center;
        let pad = Vec3::splat(fattening.max(0.0));
        Self {
            min: world_center - world_half - pad,
            max: world_center + world_half + pad,
        }
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Per-axis overlap, used by the sweep-and-prune broad phase which only
    /// treats a pair as overlapping once all three axis bits are set.
    pub fn overlaps_axis(&self, other: &Aabb, axis: usize) -> bool {
        self.min[axis] <= other.max[axis] && self.max[axis] >= other.min[axis]
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// Unordered pair of body ids, canonicalized with `a.index() < b.index()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairKey {
    pub a: EntityId,
    pub b: EntityId,
}

impl PairKey {
    pub fn new(a: EntityId, b: EntityId) -> Self {
        if a.index() < b.index() {
            Self { a, b }
        } else {
            Self { a: b, b: a }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_key_is_order_insensitive() {
        let a = EntityId::new(1, 0);
        let b = EntityId::new(2, 0);
        assert_eq!(PairKey::new(a, b), PairKey::new(b, a));
    }

    #[test]
    fn overlap_requires_all_axes() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::new(2.0, 0.0, 0.0), Vec3::new(3.0, 1.0, 1.0));
        assert!(!a.overlaps(&b));
        assert!(a.overlaps_axis(&b, 1));
        assert!(!a.overlaps_axis(&b, 0));
    }
}
