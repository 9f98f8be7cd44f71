use rigid_accelerator::{Joint, RigidBody, Vec3};
use rigid_accelerator::world::PhysicsWorld;

fn make_world() -> PhysicsWorld {
    PhysicsWorld::builder().time_step(1.0 / 60.0).gravity(Vec3::new(0.0, -9.81, 0.0)).build()
}

#[test]
fn ball_socket_joint_keeps_pendulum_near_its_anchor_radius() {
    let mut world = make_world();
    let anchor = world.add_rigidbody(RigidBody::builder().is_static(true).build());
    let bob = world.add_rigidbody(RigidBody::builder().position(Vec3::new(2.0, 0.0, 0.0)).mass(1.0).build());
    world.create_joint(Joint::ball_socket(anchor, bob, Vec3::ZERO, Vec3::new(-2.0, 0.0, 0.0)));

    for _ in 0..300 {
        world.update();
    }

    let distance = world.body(bob).unwrap().transform.position.length();
    assert!((distance - 2.0).abs() < 0.3, "pendulum drifted to distance {distance}");
}

#[test]
fn ball_socket_joint_between_two_dynamic_bodies_keeps_them_apart_by_the_anchor_offset() {
    let mut world = PhysicsWorld::builder().time_step(1.0 / 120.0).gravity(Vec3::ZERO).build();
    let a = world.add_rigidbody(RigidBody::builder().position(Vec3::new(-1.0, 0.0, 0.0)).mass(1.0).build());
    let b = world.add_rigidbody(RigidBody::builder().position(Vec3::new(1.0, 0.0, 0.0)).mass(1.0).build());
    world.create_joint(Joint::ball_socket(a, b, Vec3::new(0.5, 0.0, 0.0), Vec3::new(-0.5, 0.0, 0.0)));

    world.body_mut(a).unwrap().set_velocity(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO);
    world.body_mut(b).unwrap().set_velocity(Vec3::new(0.0, 0.0, -3.0), Vec3::ZERO);

    for _ in 0..240 {
        world.update();
    }

    let anchor_a = world.body(a).unwrap().transform.position + Vec3::new(0.5, 0.0, 0.0);
    let anchor_b = world.body(b).unwrap().transform.position + Vec3::new(-0.5, 0.0, 0.0);
    assert!((anchor_a - anchor_b).length() < 0.3, "joint anchors drifted apart: {anchor_a:?} vs {anchor_b:?}");
}

#[test]
fn destroying_a_joint_removes_its_constraint() {
    let mut world = make_world();
    let anchor = world.add_rigidbody(RigidBody::builder().is_static(true).build());
    let bob = world.add_rigidbody(RigidBody::builder().position(Vec3::new(2.0, 0.0, 0.0)).mass(1.0).build());
    let joint_id = world.create_joint(Joint::ball_socket(anchor, bob, Vec3::ZERO, Vec3::new(-2.0, 0.0, 0.0)));

    world.destroy_joint(joint_id).unwrap();
    for _ in 0..30 {
        world.update();
    }

    let position = world.body(bob).unwrap().transform.position;
    assert!(position.y < -0.5, "with the joint gone the bob should fall freely under gravity, got {position:?}");
}
