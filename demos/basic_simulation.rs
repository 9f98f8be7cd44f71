use rigid_accelerator::{InertiaTensorExt, Mat3, Shape, Transform, Vec3};
use rigid_accelerator::world::PhysicsWorld;

fn main() {
    let mut world = PhysicsWorld::new(1.0 / 60.0);

    world
        .create_static_body(Transform::default(), Some(Shape::cuboid(Vec3::new(10.0, 0.5, 10.0))))
        .expect("ground shape must not be null");

    let body_id = world
        .create_rigid_body(
            Transform {
                position: Vec3::new(0.0, 1.0, 0.0),
                ..Transform::default()
            },
            1.0,
            Mat3::for_solid_sphere(0.5, 1.0),
            Some(Shape::sphere(0.5)),
        )
        .expect("sphere shape must not be null");

    world.update();

    if let Some(body) = world.body(body_id) {
        println!("Body position after one step: {:?}", body.transform.position);
    }
}
