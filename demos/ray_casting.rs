use rigid_accelerator::{Shape, Transform, Vec3};
use rigid_accelerator::collision::queries::RaycastQuery;
use rigid_accelerator::world::PhysicsWorld;

fn main() {
    let mut world = PhysicsWorld::new(1.0 / 60.0);
    world
        .create_static_body(Transform::default(), Some(Shape::sphere(1.0)))
        .expect("sphere shape must not be null");

    let query = RaycastQuery::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z).with_max_distance(10.0);

    let hits = world.find_intersecting_bodies(&query);
    println!("Ray hits: {}", hits.len());
    if let Some(hit) = world.find_closest_body(&query) {
        println!("Closest hit at {:?}, distance {:.3}", hit.point, hit.distance);
    }
}
