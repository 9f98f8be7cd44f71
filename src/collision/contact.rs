//! Contact manifold store (§4.6): persists up to four contact points per
//! overlapping pair so accumulated impulses survive from one step to the
//! next and the solver sees a stable set of anchors to iterate over.
//!
//! Manifolds are owned centrally by [`ManifoldStore`], matching §5's "weakly
//! referenced from bodies' intrusive lists": each body only stores a `head`
//! index into a shared [`ListPool`] of lightweight, `Copy` edge records, one
//! per side of the pair, so removing a body can unlink its edges without
//! touching the manifold's actual point data.

use std::collections::HashMap;

use glam::Vec3;

use crate::collision::aabb::PairKey;
use crate::collision::narrowphase::ContactPointInfo;
use crate::core::intrusive::ListPool;
use crate::core::rigidbody::RigidBody;
use crate::core::types::{MaterialPairProperties, Transform};
use crate::utils::allocator::{Arena, EntityId};

const MAX_POINTS: usize = 4;

/// One persisted contact anchor, carrying the accumulated impulses used to
/// warm-start the next solve (§4.8 step 1).
#[derive(Debug, Clone, Copy)]
pub struct ContactPoint {
    pub local_a: Vec3,
    pub local_b: Vec3,
    pub depth: f32,
    pub normal_impulse: f32,
    pub tangent_impulse: [f32; 2],
    pub rolling_impulse: f32,
    pub torsional_impulse: f32,
}

impl ContactPoint {
    fn from_info(info: &ContactPointInfo) -> Self {
        Self {
            local_a: info.local_a,
            local_b: info.local_b,
            depth: info.penetration,
            normal_impulse: 0.0,
            tangent_impulse: [0.0, 0.0],
            rolling_impulse: 0.0,
            torsional_impulse: 0.0,
        }
    }

    fn carry_impulses_from(&mut self, previous: &ContactPoint) {
        self.normal_impulse = previous.normal_impulse;
        self.tangent_impulse = previous.tangent_impulse;
        self.rolling_impulse = previous.rolling_impulse;
        self.torsional_impulse = previous.torsional_impulse;
    }
}

/// A persisted manifold for one overlapping pair: up to four points sharing
/// a single contact normal (A -> B) from the most recent narrow-phase test.
#[derive(Debug, Clone)]
pub struct ContactManifold {
    pub body_a: EntityId,
    pub body_b: EntityId,
    pub normal: Vec3,
    pub points: Vec<ContactPoint>,
    pub material: MaterialPairProperties,
}

impl ContactManifold {
    fn new(body_a: EntityId, body_b: EntityId, material: MaterialPairProperties) -> Self {
        Self {
            body_a,
            body_b,
            normal: Vec3::Y,
            points: Vec::with_capacity(MAX_POINTS),
            material,
        }
    }

    /// Applies a fresh narrow-phase result (§4.6 steps 1-3): drop stale
    /// points, merge a matching one, or insert/replace under the four-point
    /// retention heuristic.
    fn update(
        &mut self,
        info: &ContactPointInfo,
        persistence_threshold: f32,
        transform_a: Transform,
        transform_b: Transform,
    ) {
        self.normal = info.normal;

        // §4.6 step 1: a stored point is only still valid if the two bodies'
        // *current* transforms still bring its anchors close together — not
        // if it merely resembles the incoming narrow-phase point.
        self.points.retain(|p| {
            let world_a = transform_a.transform_point(p.local_a);
            let world_b = transform_b.transform_point(p.local_b);
            (world_b - world_a).length() <= persistence_threshold
        });

        if let Some(existing) = self
            .points
            .iter_mut()
            .find(|p| (p.local_a - info.local_a).length() <= persistence_threshold)
        {
            let carried = *existing;
            *existing = ContactPoint::from_info(info);
            existing.carry_impulses_from(&carried);
            return;
        }

        let incoming = ContactPoint::from_info(info);
        if self.points.len() < MAX_POINTS {
            self.points.push(incoming);
            return;
        }

        if let Some(drop_index) = select_point_to_drop(&self.points, &incoming) {
            self.points[drop_index] = incoming;
        }
    }
}

/// Chooses which of four existing points to replace with `incoming` so the
/// retained set keeps the largest spread (§3, §4.6 step 3): the point whose
/// removal maximizes the area of the quadrilateral formed by the rest, with
/// the deepest point always kept.
fn select_point_to_drop(points: &[ContactPoint], incoming: &ContactPoint) -> Option<usize> {
    let deepest = points
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.depth.partial_cmp(&b.1.depth).unwrap())
        .map(|(i, _)| i)?;

    let mut candidates: Vec<Vec3> = points.iter().map(|p| p.local_a).collect();
    candidates.push(incoming.local_a);

    let mut best_index = 0;
    let mut best_area = -1.0f32;
    for skip in 0..points.len() {
        if skip == deepest {
            continue;
        }
        let remaining: Vec<Vec3> = candidates
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != skip)
            .map(|(_, v)| *v)
            .collect();
        let area = quad_area(&remaining);
        if area > best_area {
            best_area = area;
            best_index = skip;
        }
    }
    Some(best_index)
}

/// Sum of the areas of the triangles fanned from the first point; a cheap,
/// order-independent proxy for "spread" of an arbitrary small point set.
fn quad_area(points: &[Vec3]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let origin = points[0];
    let mut area = 0.0;
    for window in points[1..].windows(2) {
        area += (window[0] - origin).cross(window[1] - origin).length() * 0.5;
    }
    area
}

/// Lightweight, `Copy` edge linking a body into a manifold's two intrusive
/// lists. Stored in a shared [`ListPool`] rather than inside the manifold
/// itself, which lets the store unlink a removed body's edges in O(degree)
/// without owning or copying the manifold's point data.
#[derive(Debug, Clone, Copy)]
struct ContactEdge {
    other: EntityId,
    pair: PairKey,
}

/// Owns every live manifold plus the intrusive edge lists that let a body's
/// `first_contact` head be walked to find its manifolds (§9 Design Notes).
#[derive(Default)]
pub struct ManifoldStore {
    manifolds: HashMap<PairKey, ContactManifold>,
    edges: ListPool<ContactEdge>,
}

impl ManifoldStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies (or creates) the manifold for `key` from a fresh narrow-phase
    /// result, linking both bodies' intrusive lists on first contact.
    pub fn update_pair(
        &mut self,
        key: PairKey,
        info: &ContactPointInfo,
        material: MaterialPairProperties,
        bodies: &mut Arena<RigidBody>,
        persistence_threshold: f32,
    ) {
        if !self.manifolds.contains_key(&key) {
            let manifold = ContactManifold::new(key.a, key.b, material);
            self.manifolds.insert(key, manifold);
            if let Some(body_a) = bodies.get_mut(key.a) {
                self.edges
                    .push_front(&mut body_a.first_contact, ContactEdge { other: key.b, pair: key });
            }
            if let Some(body_b) = bodies.get_mut(key.b) {
                self.edges
                    .push_front(&mut body_b.first_contact, ContactEdge { other: key.a, pair: key });
            }
        }

        let transform_a = bodies.get(key.a).map(|b| b.transform).unwrap_or_default();
        let transform_b = bodies.get(key.b).map(|b| b.transform).unwrap_or_default();

        let manifold = self.manifolds.get_mut(&key).expect("just inserted");
        manifold.material = material;
        manifold.update(info, persistence_threshold, transform_a, transform_b);
    }

    /// Destroys the manifold for `key` and unlinks it from both bodies'
    /// contact lists.
    pub fn remove_pair(&mut self, key: PairKey, bodies: &mut Arena<RigidBody>) {
        if self.manifolds.remove(&key).is_none() {
            return;
        }
        if let Some(body_a) = bodies.get_mut(key.a) {
            self.edges
                .remove_where(&mut body_a.first_contact, |edge| edge.pair == key);
        }
        if let Some(body_b) = bodies.get_mut(key.b) {
            self.edges
                .remove_where(&mut body_b.first_contact, |edge| edge.pair == key);
        }
    }

    /// Drops every manifold whose pair is no longer present in `active`,
    /// unlinking it from both bodies' lists (§3: "pairs ... disappear one
    /// step after AABBs cease to overlap").
    pub fn prune_stale(&mut self, active: &std::collections::HashSet<PairKey>, bodies: &mut Arena<RigidBody>) {
        let stale: Vec<PairKey> = self
            .manifolds
            .keys()
            .copied()
            .filter(|key| !active.contains(key))
            .collect();
        for key in stale {
            self.remove_pair(key, bodies);
        }
    }

    pub fn get(&self, key: PairKey) -> Option<&ContactManifold> {
        self.manifolds.get(&key)
    }

    pub fn get_mut(&mut self, key: PairKey) -> Option<&mut ContactManifold> {
        self.manifolds.get_mut(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PairKey, &ContactManifold)> {
        self.manifolds.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&PairKey, &mut ContactManifold)> {
        self.manifolds.iter_mut()
    }

    /// Other bodies sharing a manifold with `body`, via its intrusive list.
    pub fn neighbors_of(&self, _body: EntityId, head: Option<u32>) -> Vec<EntityId> {
        self.edges.iter(head).map(|edge| edge.other).collect()
    }

    /// Pair keys reachable from a body's intrusive contact-list head, used
    /// to tear down every manifold touching a body being destroyed.
    pub fn pairs_of(&self, head: Option<u32>) -> Vec<PairKey> {
        self.edges.iter(head).map(|edge| edge.pair).collect()
    }

    pub fn len(&self) -> usize {
        self.manifolds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifolds.is_empty()
    }
}
