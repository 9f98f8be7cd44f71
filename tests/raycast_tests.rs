use rigid_accelerator::collision::queries::RaycastQuery;
use rigid_accelerator::{Shape, Transform, Vec3};
use rigid_accelerator::world::PhysicsWorld;

fn sphere_world() -> (PhysicsWorld, rigid_accelerator::EntityId, rigid_accelerator::EntityId) {
    let mut world = PhysicsWorld::new(1.0 / 60.0);
    let near = world
        .create_static_body(
            Transform { position: Vec3::new(0.0, 0.0, 4.0), ..Transform::default() },
            Some(Shape::sphere(0.5)),
        )
        .unwrap();
    let far = world
        .create_static_body(
            Transform { position: Vec3::new(0.0, 0.0, 8.0), ..Transform::default() },
            Some(Shape::sphere(0.5)),
        )
        .unwrap();
    (world, near, far)
}

#[test]
fn world_find_closest_body_returns_the_nearer_of_two_aligned_spheres() {
    let (world, near, _far) = sphere_world();
    let query = RaycastQuery::new(Vec3::ZERO, Vec3::Z);

    let hit = world.find_closest_body(&query).expect("ray should hit something");
    assert_eq!(hit.body, near);
    assert!(hit.distance < 4.0);
}

#[test]
fn world_find_furthest_body_returns_the_far_sphere() {
    let (world, _near, far) = sphere_world();
    let query = RaycastQuery::new(Vec3::ZERO, Vec3::Z);

    let hit = world.find_furthest_body(&query).expect("ray should hit something");
    assert_eq!(hit.body, far);
}

#[test]
fn world_find_intersecting_bodies_reports_both_spheres_on_a_through_ray() {
    let (world, near, far) = sphere_world();
    let query = RaycastQuery::new(Vec3::ZERO, Vec3::Z);

    let hits = world.find_intersecting_bodies(&query);
    let bodies: Vec<_> = hits.iter().map(|hit| hit.body).collect();
    assert!(bodies.contains(&near));
    assert!(bodies.contains(&far));
}

#[test]
fn world_raycast_respects_max_distance() {
    let (world, near, _far) = sphere_world();
    let query = RaycastQuery::new(Vec3::ZERO, Vec3::Z).with_max_distance(1.0);

    assert!(world.find_closest_body(&query).is_none(), "sphere at distance 4 is beyond a max_distance of 1");
    let _ = near;
}

#[test]
fn world_raycast_misses_when_offset_from_every_body() {
    let (world, ..) = sphere_world();
    let query = RaycastQuery::new(Vec3::new(5.0, 5.0, 0.0), Vec3::Z);

    assert!(world.find_closest_body(&query).is_none());
    assert!(world.find_intersecting_bodies(&query).is_empty());
}
