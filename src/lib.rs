//! Rigid Accelerator – a 3D rigid-body physics engine.
//!
//! This crate provides a fixed-timestep [`PhysicsWorld`] built from
//! independent, swappable subsystems: sweep-and-prune broad phase
//! (`collision::broadphase`), GJK/EPA narrow phase with persisted contact
//! manifolds (`collision::narrowphase`, `collision::contact`),
//! flood-fill island construction (`dynamics::island`), and a sequential-
//! impulse (PGS) constraint solver with warm-starting (`dynamics::solver`).
//!
//! Bodies, joints, and shapes live in generational [`Arena`]s addressed by
//! [`EntityId`], so external code can hold a stable handle across frames
//! without borrowing the world.

pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod error;
pub mod utils;
pub mod world;

pub use glam::{Mat3, Mat4, Quat, Vec3};

pub use collision::{
    aabb::{Aabb, PairKey},
    broadphase::{BroadPhase, BroadPhaseEvent},
    contact::{ContactManifold, ContactPoint, ManifoldStore},
    narrowphase::{ContactPointInfo, NarrowPhase},
    queries::{Raycast, RaycastHit, RaycastQuery},
};
pub use config::{WorldConfig, WorldConfigBuilder};
pub use core::{
    joints::Joint,
    rigidbody::{RigidBody, RigidBodyBuilder},
    shapes::{Shape, ShapeKey, ShapeRegistry},
    types::{InertiaTensorExt, MassProperties, Material, MaterialPairProperties, Transform, Velocity},
};
pub use dynamics::{
    forces::{DragForce, ForceGenerator, ForceRegistry, GravityForce, SpringForce},
    integrator::Integrator,
    island::{Island, IslandManager},
    solver::{Contact, PGSSolver, SolverStepMetrics},
};
pub use error::{Error, Result};
pub use utils::allocator::{Arena, EntityId, GenerationalId};
pub use world::{PhysicsWorld, PhysicsWorldBuilder};
