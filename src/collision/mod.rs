//! Collision detection modules: AABBs, broad-phase, narrow-phase, contact
//! manifold bookkeeping, and ray-cast queries (§4.1-§4.6, §6).

pub mod aabb;
pub mod broadphase;
pub mod contact;
pub mod narrowphase;
pub mod pair_manager;
pub mod queries;

pub use aabb::{Aabb, PairKey};
pub use broadphase::{BroadPhase, BroadPhaseEvent};
pub use contact::{ContactManifold, ContactPoint, ManifoldStore};
pub use narrowphase::{ContactPointInfo, NarrowPhase};
pub use pair_manager::{PairEvent, PairManager};
pub use queries::{Raycast, RaycastHit, RaycastQuery};
