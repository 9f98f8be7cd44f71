//! Sweep-and-prune broad phase over three sorted endpoint arrays (§4.4).
//!
//! Each body contributes one `min`/`max` endpoint per axis. Endpoints are
//! kept in persistent, nearly-sorted arrays; `update` moves a single body's
//! two endpoints on each axis by a local insertion ("bubble") rather than
//! re-sorting from scratch, which is what gives sweep-and-prune its
//! O(N + k) amortized behavior when bodies move coherently between steps.

use crate::{
    collision::aabb::{Aabb, PairKey},
    collision::pair_manager::{PairEvent, PairManager},
    core::rigidbody::RigidBody,
    utils::allocator::{Arena, EntityId},
};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Endpoint {
    value: f32,
    body: EntityId,
    is_min: bool,
}

/// A pair transition observed during a broad-phase step.
#[derive(Debug, Clone, Copy)]
pub struct BroadPhaseEvent {
    pub pair: PairKey,
    pub event: PairEvent,
}

/// Sweep-and-prune spatial index; owns the per-axis endpoint arrays and the
/// pair set they feed (§4.3/§4.4).
#[derive(Default)]
pub struct BroadPhase {
    axes: [Vec<Endpoint>; 3],
    pub pairs: PairManager,
}

impl BroadPhase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pair_manager(&self) -> &PairManager {
        &self.pairs
    }

    /// Registers a new body's AABB, inserting its six endpoints and sweeping
    /// them into position against the existing arrays.
    pub fn add(&mut self, body: EntityId, aabb: &Aabb) -> Vec<BroadPhaseEvent> {
        let mut events = Vec::new();
        for axis in 0..3 {
            // Push both of this body's endpoints before sweeping either, so
            // `bracket`/`axis_overlap` can already see a complete min/max
            // pair for this body while the other bodies' endpoints cross it
            // (otherwise a body already overlapping another at insertion
            // time would bubble past it with its own max still missing,
            // reading as "no overlap" and silently dropping the pair).
            let min_idx = self.axes[axis].len();
            self.axes[axis].push(Endpoint { value: aabb.min[axis], body, is_min: true });
            self.axes[axis].push(Endpoint { value: aabb.max[axis], body, is_min: false });

            self.bubble(axis, min_idx, &mut events);
            let max_idx = self.find_endpoint(axis, body, false).expect("just pushed");
            self.bubble(axis, max_idx, &mut events);
        }
        events
    }

    /// Removes a body's endpoints from all three axes and drops any pairs
    /// that mentioned it, returning `Removed` events for each.
    pub fn remove(&mut self, body: EntityId) -> Vec<BroadPhaseEvent> {
        for axis in &mut self.axes {
            axis.retain(|e| e.body != body);
        }
        self.pairs
            .remove_body(body.index())
            .into_iter()
            .map(|pair| BroadPhaseEvent { pair, event: PairEvent::Removed })
            .collect()
    }

    /// Updates a moved body's endpoints in place, re-sweeping only the two
    /// endpoints that actually changed.
    pub fn update(&mut self, body: EntityId, aabb: &Aabb) -> Vec<BroadPhaseEvent> {
        let mut events = Vec::new();
        for axis in 0..3 {
            if let Some(idx) = self.find_endpoint(axis, body, true) {
                self.axes[axis][idx].value = aabb.min[axis];
                self.bubble(axis, idx, &mut events);
            }
            if let Some(idx) = self.find_endpoint(axis, body, false) {
                self.axes[axis][idx].value = aabb.max[axis];
                self.bubble(axis, idx, &mut events);
            }
        }
        events
    }

    /// Adds or updates every body's endpoints in one pass, used once per
    /// dynamics-world step after AABBs are refreshed.
    pub fn sync(&mut self, bodies: &Arena<RigidBody>) -> Vec<BroadPhaseEvent> {
        let mut events = Vec::new();
        let tracked: std::collections::HashSet<EntityId> =
            self.axes[0].iter().map(|e| e.body).collect();

        for id in bodies.ids() {
            let Some(body) = bodies.get(id) else { continue };
            if tracked.contains(&id) {
                events.extend(self.update(id, &body.aabb));
            } else {
                events.extend(self.add(id, &body.aabb));
            }
        }
        events
    }

    fn find_endpoint(&self, axis: usize, body: EntityId, is_min: bool) -> Option<usize> {
        self.axes[axis]
            .iter()
            .position(|e| e.body == body && e.is_min == is_min)
    }

    /// Moves the endpoint at `idx` left or right until the array is locally
    /// sorted again, recording a pair event every time it crosses an
    /// endpoint belonging to a different body (§4.4).
    fn bubble(&mut self, axis: usize, mut idx: usize, events: &mut Vec<BroadPhaseEvent>) {
        while idx > 0 && self.axes[axis][idx].value < self.axes[axis][idx - 1].value {
            self.cross(axis, idx, idx - 1, events);
            self.axes[axis].swap(idx, idx - 1);
            idx -= 1;
        }
        while idx + 1 < self.axes[axis].len() && self.axes[axis][idx].value > self.axes[axis][idx + 1].value {
            self.cross(axis, idx, idx + 1, events);
            self.axes[axis].swap(idx, idx + 1);
            idx += 1;
        }
    }

    /// Two endpoints at `i`/`j` are about to swap order. If they belong to
    /// different bodies, re-derive the true axis-overlap state from the
    /// bodies' live endpoint brackets and feed it to the pair manager, which
    /// only emits an event on an actual present/absent transition.
    fn cross(&mut self, axis: usize, i: usize, j: usize, events: &mut Vec<BroadPhaseEvent>) {
        let a = self.axes[axis][i];
        let b = self.axes[axis][j];
        if a.body == b.body {
            return;
        }
        let overlaps = self.axis_overlap(axis, a.body, b.body);
        let key = PairKey::new(a.body, b.body);
        if let Some(event) = self.pairs.mark_axis(key, axis, overlaps) {
            events.push(BroadPhaseEvent { pair: key, event });
        }
    }

    fn axis_overlap(&self, axis: usize, a: EntityId, b: EntityId) -> bool {
        let Some((min_a, max_a)) = self.bracket(axis, a) else { return false };
        let Some((min_b, max_b)) = self.bracket(axis, b) else { return false };
        min_a <= max_b && min_b <= max_a
    }

    fn bracket(&self, axis: usize, body: EntityId) -> Option<(f32, f32)> {
        let mut min = None;
        let mut max = None;
        for e in &self.axes[axis] {
            if e.body != body {
                continue;
            }
            if e.is_min {
                min = Some(e.value);
            } else {
                max = Some(e.value);
            }
        }
        Some((min?, max?))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn aabb(min: Vec3, max: Vec3) -> Aabb {
        Aabb::new(min, max)
    }

    #[test]
    fn separated_bodies_produce_no_pair() {
        let mut bp = BroadPhase::new();
        let a = EntityId::new(0, 0);
        let b = EntityId::new(1, 0);
        bp.add(a, &aabb(Vec3::ZERO, Vec3::ONE));
        let events = bp.add(b, &aabb(Vec3::new(10.0, 10.0, 10.0), Vec3::new(11.0, 11.0, 11.0)));
        assert!(events.is_empty());
        assert!(bp.is_empty());
    }

    #[test]
    fn overlapping_bodies_produce_added_event() {
        let mut bp = BroadPhase::new();
        let a = EntityId::new(0, 0);
        let b = EntityId::new(1, 0);
        bp.add(a, &aabb(Vec3::ZERO, Vec3::ONE));
        let events = bp.add(b, &aabb(Vec3::splat(0.5), Vec3::splat(1.5)));
        assert!(events.iter().any(|e| matches!(e.event, PairEvent::Added)));
        assert_eq!(bp.len(), 1);
    }

    #[test]
    fn moving_apart_produces_removed_event() {
        let mut bp = BroadPhase::new();
        let a = EntityId::new(0, 0);
        let b = EntityId::new(1, 0);
        bp.add(a, &aabb(Vec3::ZERO, Vec3::ONE));
        bp.add(b, &aabb(Vec3::splat(0.5), Vec3::splat(1.5)));
        assert_eq!(bp.len(), 1);

        let events = bp.update(b, &aabb(Vec3::splat(10.0), Vec3::splat(11.0)));
        assert!(events.iter().any(|e| matches!(e.event, PairEvent::Removed)));
        assert!(bp.is_empty());
    }

    #[test]
    fn removing_a_body_drops_its_pairs() {
        let mut bp = BroadPhase::new();
        let a = EntityId::new(0, 0);
        let b = EntityId::new(1, 0);
        bp.add(a, &aabb(Vec3::ZERO, Vec3::ONE));
        bp.add(b, &aabb(Vec3::splat(0.5), Vec3::splat(1.5)));
        assert_eq!(bp.len(), 1);

        let events = bp.remove(a);
        assert!(events.iter().any(|e| matches!(e.event, PairEvent::Removed)));
        assert!(bp.is_empty());
    }

    #[test]
    fn overlap_requires_all_three_axes() {
        let mut bp = BroadPhase::new();
        let a = EntityId::new(0, 0);
        let b = EntityId::new(1, 0);
        bp.add(a, &aabb(Vec3::ZERO, Vec3::ONE));
        // Overlaps on X and Z but not Y.
        let events = bp.add(b, &aabb(Vec3::new(0.5, 5.0, 0.5), Vec3::new(1.5, 6.0, 1.5)));
        assert!(!events.iter().any(|e| matches!(e.event, PairEvent::Added)));
        assert!(bp.is_empty());
    }
}
