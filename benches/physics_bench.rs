use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rigid_accelerator::{InertiaTensorExt, Mat3, Shape, Transform, Vec3};
use rigid_accelerator::world::PhysicsWorld;

fn bench_broad_phase(c: &mut Criterion) {
    c.bench_function("broad_phase_100_bodies", |b| {
        b.iter(|| {
            let mut world = PhysicsWorld::new(1.0 / 60.0);
            let half_extents = Vec3::splat(0.5);
            for i in 0..100 {
                world
                    .create_rigid_body(
                        Transform {
                            position: Vec3::new(i as f32 * 0.1, 0.0, 0.0),
                            ..Transform::default()
                        },
                        1.0,
                        Mat3::for_solid_box(half_extents, 1.0),
                        Some(Shape::cuboid(half_extents)),
                    )
                    .unwrap();
            }
            world.step(black_box(1.0 / 60.0));
        })
    });
}

criterion_group!(benches, bench_broad_phase);
criterion_main!(benches);
