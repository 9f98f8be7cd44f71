//! Core types describing physics entities, components, and shared data.

pub mod intrusive;
pub mod joints;
pub mod rigidbody;
pub mod shapes;
pub mod types;

pub use joints::Joint;
pub use rigidbody::RigidBody;
pub use shapes::{Shape, ShapeKey, ShapeRegistry};
pub use types::{MassProperties, Material, Transform, Velocity};
