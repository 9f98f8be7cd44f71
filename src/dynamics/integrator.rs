//! Semi-implicit Euler integration (§4.9 steps 2 and 8).

use glam::{Quat, Vec3};

use crate::core::rigidbody::RigidBody;
use crate::utils::allocator::Arena;

/// Integrates velocities (gravity/forces already accumulated) and positions
/// for every non-static, non-sleeping body in the arena.
#[derive(Debug, Clone, Copy)]
pub struct Integrator {
    pub dt: f32,
}

impl Integrator {
    pub fn new(dt: f32) -> Self {
        Self { dt }
    }

    /// Applies accumulated force/torque and gravity into tentative
    /// velocities (§4.9 step 2). Gravity must already have been folded into
    /// `body.force` by the caller's [`ForceRegistry`](super::forces::ForceRegistry).
    pub fn integrate_velocity(&self, body: &mut RigidBody) {
        if !body.motion_enabled || body.is_sleeping {
            return;
        }

        body.velocity.linear += body.force * body.inverse_mass * self.dt;
        body.velocity.angular += body.inverse_inertia * body.torque * self.dt;

        body.velocity.linear *= 1.0 / (1.0 + self.dt * body.linear_damping);
        body.velocity.angular *= 1.0 / (1.0 + self.dt * body.angular_damping);
    }

    /// Integrates position and orientation from the (already-solved) velocity (§4.9 step 8).
    pub fn integrate_position(&self, body: &mut RigidBody) {
        if !body.motion_enabled || body.is_sleeping {
            return;
        }

        body.transform.position += body.velocity.linear * self.dt;

        let omega = body.velocity.angular;
        let spin = Quat::from_xyzw(omega.x, omega.y, omega.z, 0.0);
        let delta = spin * body.transform.rotation;
        let updated = body.transform.rotation + delta * (0.5 * self.dt);
        body.transform.rotation = updated.normalize();

        body.has_moved = true;
    }

    pub fn step_velocities(&self, bodies: &mut Arena<RigidBody>) {
        for body in bodies.iter_mut() {
            self.integrate_velocity(body);
        }
    }

    pub fn step_positions(&self, bodies: &mut Arena<RigidBody>) {
        for body in bodies.iter_mut() {
            self.integrate_position(body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_body_falls_under_accumulated_force() {
        let mut body = RigidBody::builder().mass(1.0).build();
        body.force = Vec3::new(0.0, -9.81, 0.0);

        let integrator = Integrator::new(1.0 / 60.0);
        integrator.integrate_velocity(&mut body);
        integrator.integrate_position(&mut body);

        assert!(body.velocity.linear.y < 0.0);
        assert!(body.transform.position.y < 0.0);
    }

    #[test]
    fn damping_reduces_speed_over_time() {
        let mut body = RigidBody::builder().mass(1.0).build();
        body.velocity.linear = Vec3::new(1.0, 0.0, 0.0);
        body.linear_damping = 0.5;

        let integrator = Integrator::new(1.0 / 60.0);
        integrator.integrate_velocity(&mut body);

        assert!(body.velocity.linear.x < 1.0);
        assert!(body.velocity.linear.x > 0.0);
    }

    #[test]
    fn static_body_does_not_move() {
        let mut body = RigidBody::builder().is_static(true).build();
        body.force = Vec3::new(0.0, -9.81, 0.0);

        let integrator = Integrator::new(1.0 / 60.0);
        integrator.integrate_velocity(&mut body);
        integrator.integrate_position(&mut body);

        assert_eq!(body.velocity.linear, Vec3::ZERO);
        assert_eq!(body.transform.position, Vec3::ZERO);
    }
}
