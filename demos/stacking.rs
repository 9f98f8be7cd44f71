use rigid_accelerator::{InertiaTensorExt, Mat3, Shape, Transform, Vec3};
use rigid_accelerator::world::PhysicsWorld;

fn main() {
    let mut world = PhysicsWorld::new(1.0 / 60.0);

    world
        .create_static_body(Transform::default(), Some(Shape::cuboid(Vec3::new(10.0, 0.5, 10.0))))
        .expect("ground shape must not be null");

    let half_extents = Vec3::splat(0.5);
    for i in 0..5 {
        world
            .create_rigid_body(
                Transform {
                    position: Vec3::new(0.0, i as f32 + 0.5, 0.0),
                    ..Transform::default()
                },
                1.0,
                Mat3::for_solid_box(half_extents, 1.0),
                Some(Shape::cuboid(half_extents)),
            )
            .expect("box shape must not be null");
    }

    for _ in 0..120 {
        world.step(1.0 / 60.0);
    }

    println!("Simulated a stack of 5 boxes for 2 seconds");
}
