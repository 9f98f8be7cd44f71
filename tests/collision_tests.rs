use rigid_accelerator::collision::aabb::{Aabb, PairKey};
use rigid_accelerator::collision::broadphase::BroadPhase;
use rigid_accelerator::collision::contact::ManifoldStore;
use rigid_accelerator::collision::narrowphase::NarrowPhase;
use rigid_accelerator::core::types::MaterialPairProperties;
use rigid_accelerator::{Arena, RigidBody, Shape, Transform, Vec3};

fn box_body(position: Vec3, half_extents: Vec3) -> (RigidBody, Shape) {
    let shape = Shape::cuboid(half_extents);
    let body = RigidBody::builder().position(position).build();
    (body, shape)
}

#[test]
fn narrow_phase_detects_overlapping_boxes_and_reports_positive_depth() {
    let (body_a, shape_a) = box_body(Vec3::ZERO, Vec3::splat(0.5));
    let (body_b, shape_b) = box_body(Vec3::new(0.6, 0.0, 0.0), Vec3::splat(0.5));

    let info = NarrowPhase::test(&shape_a, &body_a.transform, &shape_b, &body_b.transform)
        .expect("overlapping boxes should produce contact info");

    assert!(info.penetration > 0.0);
    assert!(info.normal.length() > 0.9);
}

#[test]
fn narrow_phase_reports_nothing_for_separated_boxes() {
    let (body_a, shape_a) = box_body(Vec3::ZERO, Vec3::splat(0.5));
    let (body_b, shape_b) = box_body(Vec3::new(5.0, 0.0, 0.0), Vec3::splat(0.5));

    assert!(NarrowPhase::test(&shape_a, &body_a.transform, &shape_b, &body_b.transform).is_none());
}

#[test]
fn manifold_store_persists_points_across_updates_and_prunes_stale_pairs() {
    let mut bodies: Arena<RigidBody> = Arena::new();
    let (body_a, shape_a) = box_body(Vec3::ZERO, Vec3::splat(0.5));
    let (body_b, shape_b) = box_body(Vec3::new(0.6, 0.0, 0.0), Vec3::splat(0.5));
    let id_a = bodies.insert(body_a);
    let id_b = bodies.insert(body_b);
    let key = PairKey::new(id_a, id_b);

    let mut store = ManifoldStore::new();
    let transform_a = bodies.get(id_a).unwrap().transform;
    let transform_b = bodies.get(id_b).unwrap().transform;
    let info = NarrowPhase::test(&shape_a, &transform_a, &shape_b, &transform_b).unwrap();

    store.update_pair(key, &info, MaterialPairProperties::default(), &mut bodies, 0.02);
    assert!(store.get(key).is_some());
    assert!(!store.get(key).unwrap().points.is_empty());

    let active = std::collections::HashSet::new();
    store.prune_stale(&active, &mut bodies);
    assert!(store.get(key).is_none(), "pair absent from the active set should be pruned");
}

#[test]
fn broad_phase_reports_pair_present_for_overlapping_aabbs() {
    let mut bodies: Arena<RigidBody> = Arena::new();
    let (mut body_a, _) = box_body(Vec3::ZERO, Vec3::splat(0.5));
    let (mut body_b, _) = box_body(Vec3::new(0.3, 0.0, 0.0), Vec3::splat(0.5));
    body_a.aabb = Aabb::new(Vec3::splat(-0.5), Vec3::splat(0.5));
    body_b.aabb = Aabb::new(Vec3::new(-0.2, -0.5, -0.5), Vec3::new(0.8, 0.5, 0.5));
    let id_a = bodies.insert(body_a);
    let id_b = bodies.insert(body_b);

    let mut broadphase = BroadPhase::new();
    broadphase.sync(&bodies);

    let present: Vec<PairKey> = broadphase.pair_manager().iter_present().collect();
    assert!(present.contains(&PairKey::new(id_a, id_b)));
}
