use crate::collision::aabb::Aabb;
use crate::core::shapes::ShapeKey;
use crate::error::{Error, Result};
use crate::utils::allocator::EntityId;

use super::types::{MassProperties, Material, Transform, Velocity};
use glam::{Mat3, Vec3};

/// Core rigid body description storing kinematic state and properties.
///
/// Mirrors the Body/RigidBody split from §3: `motion_enabled = false` gives
/// the body infinite effective mass (inverse mass/inertia pinned to zero)
/// regardless of its stored mass properties, matching a "static" body.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub id: EntityId,
    pub transform: Transform,
    pub velocity: Velocity,
    pub force: Vec3,
    pub torque: Vec3,
    pub mass_properties: MassProperties,
    pub material: Material,
    pub shape: Option<ShapeKey>,
    pub aabb: Aabb,

    pub motion_enabled: bool,
    pub collision_enabled: bool,
    pub is_sleeping: bool,
    pub has_moved: bool,
    pub gravity_enabled: bool,

    pub sleep_timer: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,

    pub inverse_mass: f32,
    pub inverse_inertia: Mat3,

    /// Head of this body's intrusive contact-manifold list.
    pub first_contact: Option<u32>,
    /// Head of this body's intrusive joint list.
    pub first_joint: Option<u32>,

    /// Transform saved at the start of the last `update()`, used by
    /// [`RigidBody::interpolated_transform`] to let a renderer fetch a
    /// smoothed pose between fixed-timestep steps (§4.9).
    pub previous_transform: Transform,
}

impl Default for RigidBody {
    fn default() -> Self {
        let mut body = Self {
            id: EntityId::default(),
            transform: Transform::default(),
            velocity: Velocity::default(),
            force: Vec3::ZERO,
            torque: Vec3::ZERO,
            mass_properties: MassProperties::default(),
            material: Material::default(),
            shape: None,
            aabb: Aabb::new(Vec3::ZERO, Vec3::ZERO),
            motion_enabled: true,
            collision_enabled: true,
            is_sleeping: false,
            has_moved: true,
            gravity_enabled: true,
            sleep_timer: 0.0,
            linear_damping: 0.02,
            angular_damping: 0.02,
            inverse_mass: 1.0,
            inverse_inertia: Mat3::IDENTITY,
            first_contact: None,
            first_joint: None,
            previous_transform: Transform::default(),
        };
        body.recompute_inverses();
        body
    }
}

impl RigidBody {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn is_static(&self) -> bool {
        !self.motion_enabled
    }

    pub fn set_velocity(&mut self, linear: Vec3, angular: Vec3) {
        self.velocity.linear = linear;
        self.velocity.angular = angular;
    }

    pub fn apply_force_at_center(&mut self, force: Vec3) {
        if !self.motion_enabled {
            return;
        }
        self.force += force;
    }

    pub fn apply_force(&mut self, force: Vec3, world_point: Vec3) {
        if !self.motion_enabled {
            return;
        }
        self.force += force;
        self.torque += (world_point - self.transform.position).cross(force);
    }

    pub fn apply_torque(&mut self, torque: Vec3) {
        if !self.motion_enabled {
            return;
        }
        self.torque += torque;
    }

    pub fn apply_impulse(&mut self, impulse: Vec3, position: Vec3) {
        if !self.motion_enabled {
            return;
        }

        self.velocity.linear += impulse * self.inverse_mass;
        let torque = (position - self.transform.position).cross(impulse);
        self.velocity.angular += self.inverse_inertia * torque;
        self.is_sleeping = false;
        self.sleep_timer = 0.0;
    }

    pub fn apply_angular_impulse(&mut self, angular_impulse: Vec3) {
        if !self.motion_enabled {
            return;
        }
        self.velocity.angular += self.inverse_inertia * angular_impulse;
        self.is_sleeping = false;
        self.sleep_timer = 0.0;
    }

    /// Clears the per-step accumulated force/torque. Called once at the end
    /// of `update()` (§9 open question (a): end-of-step only, not on wake).
    pub fn clear_accumulators(&mut self) {
        self.force = Vec3::ZERO;
        self.torque = Vec3::ZERO;
    }

    pub fn set_mass_properties(&mut self, props: MassProperties) {
        self.mass_properties = props;
        self.recompute_inverses();
    }

    pub fn set_mass(&mut self, mass: f32) {
        self.mass_properties.mass = mass;
        self.recompute_inverses();
    }

    pub fn set_inertia_tensor_local(&mut self, inertia: Mat3) {
        self.mass_properties.inertia = inertia;
        self.recompute_inverses();
    }

    pub fn enable_motion(&mut self, enabled: bool) {
        self.motion_enabled = enabled;
        self.recompute_inverses();
        if !enabled {
            self.velocity = Velocity::default();
        }
    }

    pub fn enable_collision(&mut self, enabled: bool) {
        self.collision_enabled = enabled;
    }

    pub fn enable_gravity(&mut self, enabled: bool) {
        self.gravity_enabled = enabled;
    }

    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    /// Rejects negative damping coefficients (§4.10 failure semantics).
    pub fn set_linear_damping(&mut self, damping: f32) -> Result<()> {
        if damping < 0.0 {
            return Err(Error::InvalidArgument("linear damping must be non-negative"));
        }
        self.linear_damping = damping;
        Ok(())
    }

    /// Rejects negative damping coefficients (§4.10 failure semantics).
    pub fn set_angular_damping(&mut self, damping: f32) -> Result<()> {
        if damping < 0.0 {
            return Err(Error::InvalidArgument("angular damping must be non-negative"));
        }
        self.angular_damping = damping;
        Ok(())
    }

    /// `lerp(previous_transform, transform, alpha)` for render-time smoothing (§4.9).
    pub fn interpolated_transform(&self, alpha: f32) -> Transform {
        let alpha = alpha.clamp(0.0, 1.0);
        Transform {
            position: self.previous_transform.position.lerp(self.transform.position, alpha),
            rotation: self.previous_transform.rotation.slerp(self.transform.rotation, alpha),
            scale: self.transform.scale,
        }
    }

    /// Wakes this body (and resets its sleep timer); does not touch forces,
    /// matching §9 open question (a): accumulators clear at end-of-step only.
    pub fn wake(&mut self) {
        self.is_sleeping = false;
        self.sleep_timer = 0.0;
    }

    /// Puts this body to sleep: zero velocity and cleared forces (§3 invariant).
    pub fn put_to_sleep(&mut self) {
        self.is_sleeping = true;
        self.velocity = Velocity::default();
        self.force = Vec3::ZERO;
        self.torque = Vec3::ZERO;
    }

    pub fn is_below_sleep_thresholds(&self, linear_threshold: f32, angular_threshold: f32) -> bool {
        self.velocity.linear.length_squared() < linear_threshold * linear_threshold
            && self.velocity.angular.length_squared() < angular_threshold * angular_threshold
    }

    pub fn recompute_inverses(&mut self) {
        if !self.motion_enabled {
            self.inverse_mass = 0.0;
            self.inverse_inertia = Mat3::ZERO;
            return;
        }
        self.inverse_mass = if self.mass_properties.mass.abs() < f32::EPSILON {
            0.0
        } else {
            1.0 / self.mass_properties.mass
        };
        let det = self.mass_properties.inertia.determinant();
        if det.abs() < f32::EPSILON {
            self.inverse_inertia = Mat3::ZERO;
        } else {
            self.inverse_inertia = self.mass_properties.inertia.inverse();
        }
    }

    pub fn builder() -> RigidBodyBuilder {
        RigidBodyBuilder::new()
    }
}

pub struct RigidBodyBuilder {
    body: RigidBody,
}

impl Default for RigidBodyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RigidBodyBuilder {
    pub fn new() -> Self {
        Self {
            body: RigidBody::default(),
        }
    }

    pub fn position(mut self, pos: Vec3) -> Self {
        self.body.transform.position = pos;
        self
    }

    pub fn rotation(mut self, rot: glam::Quat) -> Self {
        self.body.transform.rotation = rot;
        self
    }

    pub fn mass(mut self, mass: f32) -> Self {
        self.body.mass_properties.mass = mass;
        self.body.recompute_inverses();
        self
    }

    pub fn inertia(mut self, inertia: Mat3) -> Self {
        self.body.mass_properties.inertia = inertia;
        self.body.recompute_inverses();
        self
    }

    pub fn shape(mut self, shape: ShapeKey) -> Self {
        self.body.shape = Some(shape);
        self
    }

    pub fn material(mut self, material: Material) -> Self {
        self.body.material = material;
        self
    }

    pub fn motion_enabled(mut self, enabled: bool) -> Self {
        self.body.motion_enabled = enabled;
        self.body.recompute_inverses();
        self
    }

    pub fn is_static(mut self, is_static: bool) -> Self {
        self.motion_enabled(!is_static)
    }

    pub fn velocity(mut self, linear: Vec3, angular: Vec3) -> Self {
        self.body.set_velocity(linear, angular);
        self
    }

    pub fn build(self) -> RigidBody {
        self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_body_has_zero_inverse_mass_and_inertia() {
        let body = RigidBody::builder().mass(5.0).is_static(true).build();
        assert_eq!(body.inverse_mass, 0.0);
        assert_eq!(body.inverse_inertia, Mat3::ZERO);
        assert!(body.is_static());
    }

    #[test]
    fn dynamic_body_recomputes_inverse_mass() {
        let body = RigidBody::builder().mass(2.0).build();
        assert!((body.inverse_mass - 0.5).abs() < 1e-6);
    }

    #[test]
    fn sleeping_body_has_zero_velocity_and_forces() {
        let mut body = RigidBody::builder().build();
        body.velocity.linear = Vec3::new(1.0, 0.0, 0.0);
        body.force = Vec3::new(1.0, 1.0, 1.0);
        body.put_to_sleep();
        assert_eq!(body.velocity.linear, Vec3::ZERO);
        assert_eq!(body.force, Vec3::ZERO);
        assert!(body.is_sleeping);
    }

    #[test]
    fn interpolated_transform_lerps_between_previous_and_current() {
        let mut body = RigidBody::builder().position(Vec3::new(2.0, 0.0, 0.0)).build();
        body.previous_transform.position = Vec3::ZERO;
        let mid = body.interpolated_transform(0.5);
        assert!((mid.position.x - 1.0).abs() < 1e-6);
    }
}
