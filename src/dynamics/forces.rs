//! External force generators applied before gravity/integration each step.

use glam::Vec3;

use crate::core::rigidbody::RigidBody;
use crate::utils::allocator::{Arena, EntityId};

/// Describes an external force generator applied to rigid bodies each step.
pub trait ForceGenerator {
    fn apply(&self, body: &mut RigidBody, dt: f32);
}

/// Constant gravity force, skipped for bodies with gravity disabled (§4.9).
pub struct GravityForce {
    pub gravity: Vec3,
}

impl GravityForce {
    pub fn new(gravity: Vec3) -> Self {
        Self { gravity }
    }
}

impl ForceGenerator for GravityForce {
    fn apply(&self, body: &mut RigidBody, _dt: f32) {
        if body.is_static() || !body.gravity_enabled {
            return;
        }
        let force = self.gravity * body.mass_properties.mass;
        body.apply_force_at_center(force);
    }
}

/// Quadratic drag resisting the direction of motion.
pub struct DragForce {
    pub drag_coefficient: f32,
}

impl ForceGenerator for DragForce {
    fn apply(&self, body: &mut RigidBody, _dt: f32) {
        if body.is_static() {
            return;
        }

        let speed = body.velocity.linear.length();
        if speed < 1e-6 {
            return;
        }

        let drag = -body.velocity.linear.normalize() * speed * speed * self.drag_coefficient;
        body.apply_force_at_center(drag);
    }
}

/// Hookean spring connecting a body to a fixed world-space anchor.
pub struct SpringForce {
    pub anchor: Vec3,
    pub rest_length: f32,
    pub spring_constant: f32,
    pub damping: f32,
}

impl ForceGenerator for SpringForce {
    fn apply(&self, body: &mut RigidBody, _dt: f32) {
        if body.is_static() {
            return;
        }

        let displacement = body.transform.position - self.anchor;
        let distance = displacement.length();
        if distance < 1e-6 {
            return;
        }

        let extension = distance - self.rest_length;
        let spring_force = -self.spring_constant * extension * (displacement / distance);
        let damping_force = -self.damping * body.velocity.linear;

        body.apply_force_at_center(spring_force + damping_force);
    }
}

/// Collection of forces applied to every body (or a single body) each step.
#[derive(Default)]
pub struct ForceRegistry {
    forces: Vec<Box<dyn ForceGenerator>>,
}

impl ForceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_force<F: ForceGenerator + 'static>(&mut self, force: F) {
        self.forces.push(Box::new(force));
    }

    pub fn apply_all(&self, bodies: &mut Arena<RigidBody>, dt: f32) {
        for force in &self.forces {
            for body in bodies.iter_mut() {
                force.apply(body, dt);
            }
        }
    }

    pub fn apply_to(&self, bodies: &mut Arena<RigidBody>, id: EntityId, dt: f32) {
        if let Some(body) = bodies.get_mut(id) {
            for force in &self.forces {
                force.apply(body, dt);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rigidbody::RigidBody;

    #[test]
    fn gravity_is_skipped_for_static_and_gravity_disabled_bodies() {
        let mut bodies: Arena<RigidBody> = Arena::new();
        let static_id = bodies.insert(RigidBody::builder().is_static(true).build());
        let mut floaty = RigidBody::builder().mass(1.0).build();
        floaty.gravity_enabled = false;
        let floaty_id = bodies.insert(floaty);
        let dynamic_id = bodies.insert(RigidBody::builder().mass(1.0).build());

        let mut registry = ForceRegistry::new();
        registry.add_force(GravityForce::new(Vec3::new(0.0, -9.81, 0.0)));
        registry.apply_all(&mut bodies, 1.0 / 60.0);

        assert_eq!(bodies.get(static_id).unwrap().force, Vec3::ZERO);
        assert_eq!(bodies.get(floaty_id).unwrap().force, Vec3::ZERO);
        assert!(bodies.get(dynamic_id).unwrap().force.y < 0.0);
    }
}
