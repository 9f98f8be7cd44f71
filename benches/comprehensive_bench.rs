use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rigid_accelerator::{InertiaTensorExt, Mat3, Shape, Transform, Vec3};
use rigid_accelerator::world::PhysicsWorld;
use std::hint::black_box;

const DT: f32 = 1.0 / 60.0;

fn scattered_world(count: usize) -> PhysicsWorld {
    let mut world = PhysicsWorld::builder().time_step(DT).build();
    let half_extents = Vec3::splat(0.5);
    for i in 0..count {
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
    world
}

fn bench_broadphase_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadphase_scaling");

    for &count in &[100usize, 1_000, 5_000] {
        group.bench_with_input(BenchmarkId::new("sweep_and_prune_step", count), &count, |b, &count| {
            b.iter_batched(
                || scattered_world(count),
                |mut world| black_box(world.update()),
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_stacked_box_settling(c: &mut Criterion) {
    let mut group = c.benchmark_group("solver_scaling");

    for &height in &[5usize, 10, 20] {
        group.bench_with_input(BenchmarkId::new("box_stack_settle_step", height), &height, |b, &height| {
            b.iter_batched(
                || {
                    let mut world = PhysicsWorld::builder().time_step(DT).build();
                    world
                        .create_static_body(Transform::default(), Some(Shape::cuboid(Vec3::new(10.0, 0.5, 10.0))))
                        .unwrap();
                    let half_extents = Vec3::splat(0.5);
                    for i in 0..height {
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
                            .unwrap();
                    }
                    world
                },
                |mut world| black_box(world.update()),
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_broadphase_scaling, bench_stacked_box_settling);
criterion_main!(benches);
