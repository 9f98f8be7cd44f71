//! Sequential-impulse / Projected Gauss-Seidel constraint solver (§4.8).
//!
//! Per island per step: warm-start, then iterate contacts and joints for
//! `velocity_iterations`, then a separate position-correction pass for
//! `position_iterations` that drives penetration toward `slop` without
//! touching real velocities.

use glam::{Mat3, Quat, Vec3};

use crate::{
    collision::aabb::PairKey,
    config::{
        DEFAULT_BAUMGARTE_BIAS, DEFAULT_PENETRATION_SLOP, DEFAULT_POSITION_ITERATIONS,
        DEFAULT_RESTITUTION_VELOCITY_THRESHOLD, DEFAULT_VELOCITY_ITERATIONS,
    },
    core::joints::Joint,
    core::rigidbody::RigidBody,
    core::types::MaterialPairProperties,
    dynamics::friction,
    utils::allocator::{Arena, EntityId},
};

/// A single solver-visible contact point, copied out of a [`ContactManifold`]
/// for the duration of one step and written back afterward so warm-start
/// impulses survive to the next frame.
#[derive(Debug, Clone)]
pub struct Contact {
    pub body_a: EntityId,
    pub body_b: EntityId,
    pub pair: PairKey,
    pub point_index: usize,
    pub local_a: Vec3,
    pub local_b: Vec3,
    pub normal: Vec3,
    pub depth: f32,
    pub accumulated_normal_impulse: f32,
    pub accumulated_tangent_impulse: [f32; 2],
    pub accumulated_rolling_impulse: f32,
    pub accumulated_torsional_impulse: f32,
    pub material: MaterialPairProperties,
}

impl Contact {
    fn world_anchor_a(&self, body_a: &RigidBody) -> Vec3 {
        body_a.transform.position + body_a.transform.rotation * self.local_a
    }

    fn world_anchor_b(&self, body_b: &RigidBody) -> Vec3 {
        body_b.transform.position + body_b.transform.rotation * self.local_b
    }
}

/// Per-step bookkeeping surfaced for logging/telemetry, not consumed by the solver itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolverStepMetrics {
    pub islands_solved: u32,
    pub contacts_solved: u32,
    pub joints_solved: u32,
    pub normal_impulse_sum: f32,
    pub tangent_impulse_sum: f32,
    pub rolling_impulse_sum: f32,
    pub torsional_impulse_sum: f32,
}

impl SolverStepMetrics {
    pub fn merge(&mut self, other: &SolverStepMetrics) {
        self.islands_solved += other.islands_solved;
        self.contacts_solved += other.contacts_solved;
        self.joints_solved += other.joints_solved;
        self.normal_impulse_sum += other.normal_impulse_sum;
        self.tangent_impulse_sum += other.tangent_impulse_sum;
        self.rolling_impulse_sum += other.rolling_impulse_sum;
        self.torsional_impulse_sum += other.torsional_impulse_sum;
    }
}

/// Projected Gauss-Seidel solver over contacts and joints (§4.8).
#[derive(Debug, Clone, Copy)]
pub struct PGSSolver {
    pub velocity_iterations: u32,
    pub position_iterations: u32,
    pub bias_factor: f32,
    pub slop: f32,
    pub restitution_threshold: f32,
}

impl Default for PGSSolver {
    fn default() -> Self {
        Self {
            velocity_iterations: DEFAULT_VELOCITY_ITERATIONS,
            position_iterations: DEFAULT_POSITION_ITERATIONS,
            bias_factor: DEFAULT_BAUMGARTE_BIAS,
            slop: DEFAULT_PENETRATION_SLOP,
            restitution_threshold: DEFAULT_RESTITUTION_VELOCITY_THRESHOLD,
        }
    }
}

impl PGSSolver {
    pub fn new(velocity_iterations: u32, position_iterations: u32) -> Self {
        Self {
            velocity_iterations: velocity_iterations.max(1),
            position_iterations: position_iterations.max(1),
            ..Self::default()
        }
    }

    /// Solves one island's contacts and joints for one fixed timestep `dt`.
    pub fn solve(
        &self,
        bodies: &mut Arena<RigidBody>,
        joints: &mut Arena<Joint>,
        joint_ids: &[EntityId],
        contacts: &mut [Contact],
        dt: f32,
    ) -> SolverStepMetrics {
        let mut metrics = SolverStepMetrics::default();

        warm_start_contacts(bodies, contacts);

        for _ in 0..self.velocity_iterations {
            for contact in contacts.iter_mut() {
                resolve_contact(bodies, contact, self.bias_factor, self.slop, self.restitution_threshold, dt);
                metrics.contacts_solved += 1;
            }
            for &joint_id in joint_ids {
                if let Some(joint) = joints.get_mut(joint_id) {
                    resolve_joint(bodies, joint, self.bias_factor, dt);
                    metrics.joints_solved += 1;
                }
            }
        }

        for _ in 0..self.position_iterations {
            for contact in contacts.iter() {
                correct_contact_position(bodies, contact, self.bias_factor, self.slop);
            }
            for &joint_id in joint_ids {
                if let Some(joint) = joints.get(joint_id) {
                    correct_joint_position(bodies, joint, self.bias_factor);
                }
            }
        }

        for contact in contacts.iter() {
            metrics.normal_impulse_sum += contact.accumulated_normal_impulse;
            metrics.tangent_impulse_sum += contact.accumulated_tangent_impulse[0].abs()
                + contact.accumulated_tangent_impulse[1].abs();
            metrics.rolling_impulse_sum += contact.accumulated_rolling_impulse.abs();
            metrics.torsional_impulse_sum += contact.accumulated_torsional_impulse.abs();
        }
        metrics.islands_solved = 1;
        metrics
    }
}

fn warm_start_contacts(bodies: &mut Arena<RigidBody>, contacts: &[Contact]) {
    for contact in contacts {
        let Some((body_a, body_b)) = bodies.get2_mut(contact.body_a, contact.body_b) else { continue };
        let anchor_a = contact.world_anchor_a(body_a);
        let anchor_b = contact.world_anchor_b(body_b);
        let (t1, t2) = friction::tangent_basis(contact.normal, body_b.velocity.linear - body_a.velocity.linear);

        let impulse = contact.normal * contact.accumulated_normal_impulse
            + t1 * contact.accumulated_tangent_impulse[0]
            + t2 * contact.accumulated_tangent_impulse[1];

        body_a.apply_impulse(-impulse, anchor_a);
        body_b.apply_impulse(impulse, anchor_b);
        if contact.accumulated_rolling_impulse.abs() > f32::EPSILON {
            body_a.apply_angular_impulse(-contact.normal * contact.accumulated_rolling_impulse);
            body_b.apply_angular_impulse(contact.normal * contact.accumulated_rolling_impulse);
        }
        if contact.accumulated_torsional_impulse.abs() > f32::EPSILON {
            body_a.apply_angular_impulse(-contact.normal * contact.accumulated_torsional_impulse);
            body_b.apply_angular_impulse(contact.normal * contact.accumulated_torsional_impulse);
        }
    }
}

/// One velocity-iteration pass over a single contact (§4.8 step 2): solves
/// the normal impulse then dispatches to [`friction::apply_friction`] for
/// the Coulomb-cone-clamped tangential/rolling/torsional rows.
fn resolve_contact(
    bodies: &mut Arena<RigidBody>,
    contact: &mut Contact,
    bias_factor: f32,
    slop: f32,
    restitution_threshold: f32,
    dt: f32,
) {
    let Some((body_a, body_b)) = bodies.get2_mut(contact.body_a, contact.body_b) else { return };
    if body_a.is_static() && body_b.is_static() {
        return;
    }

    let anchor_a = contact.world_anchor_a(body_a);
    let anchor_b = contact.world_anchor_b(body_b);
    let ra = anchor_a - body_a.transform.position;
    let rb = anchor_b - body_b.transform.position;

    let relative_velocity = (body_b.velocity.linear + body_b.velocity.angular.cross(rb))
        - (body_a.velocity.linear + body_a.velocity.angular.cross(ra));
    let vn = relative_velocity.dot(contact.normal);

    let eff_mass = normal_effective_mass(body_a, body_b, ra, rb, contact.normal);
    if eff_mass <= 0.0 {
        return;
    }

    let bias = bias_factor * (contact.depth - slop).max(0.0) / dt.max(1e-6);
    let restitution_bias = if vn < -restitution_threshold {
        -contact.material.restitution * vn
    } else {
        0.0
    };

    let lambda = (-vn + bias + restitution_bias) / eff_mass;
    let old_impulse = contact.accumulated_normal_impulse;
    contact.accumulated_normal_impulse = (old_impulse + lambda).max(0.0);
    let delta = contact.accumulated_normal_impulse - old_impulse;

    let impulse = contact.normal * delta;
    body_a.apply_impulse(-impulse, anchor_a);
    body_b.apply_impulse(impulse, anchor_b);

    friction::apply_friction(body_a, body_b, contact, anchor_a, anchor_b);
}

fn normal_effective_mass(body_a: &RigidBody, body_b: &RigidBody, ra: Vec3, rb: Vec3, normal: Vec3) -> f32 {
    let ra_x_n = ra.cross(normal);
    let rb_x_n = rb.cross(normal);
    body_a.inverse_mass
        + body_b.inverse_mass
        + (body_a.inverse_inertia * ra_x_n).dot(ra_x_n)
        + (body_b.inverse_inertia * rb_x_n).dot(rb_x_n)
}

/// Position-only correction (§4.8, no velocity change): splits the
/// penetration beyond `slop` between the two bodies by inverse-mass ratio.
fn correct_contact_position(bodies: &mut Arena<RigidBody>, contact: &Contact, bias_factor: f32, slop: f32) {
    let Some((body_a, body_b)) = bodies.get2_mut(contact.body_a, contact.body_b) else { return };
    if body_a.is_static() && body_b.is_static() {
        return;
    }
    let total_inv_mass = body_a.inverse_mass + body_b.inverse_mass;
    if total_inv_mass <= 0.0 {
        return;
    }

    let correction = (contact.depth - slop).max(0.0) * bias_factor;
    let movement = contact.normal * (correction / total_inv_mass);
    body_a.transform.position -= movement * body_a.inverse_mass;
    body_b.transform.position += movement * body_b.inverse_mass;
}

fn skew(r: Vec3) -> Mat3 {
    Mat3::from_cols(
        Vec3::new(0.0, r.z, -r.y),
        Vec3::new(-r.z, 0.0, r.x),
        Vec3::new(r.y, -r.x, 0.0),
    )
}

/// 3x3 effective mass matrix for a point-to-point constraint at world
/// offsets `ra`/`rb` from each body's center (§9 Design Notes: the
/// skew-matrix technique shared by every joint kind's anchor lock).
fn point_mass_matrix(body_a: &RigidBody, body_b: &RigidBody, ra: Vec3, rb: Vec3) -> Mat3 {
    let identity = Mat3::IDENTITY * (body_a.inverse_mass + body_b.inverse_mass);
    let ska = skew(ra);
    let skb = skew(rb);
    identity - ska * body_a.inverse_inertia * ska - skb * body_b.inverse_inertia * skb
}

fn invert_mat3(m: Mat3) -> Option<Mat3> {
    if m.determinant().abs() < 1e-9 {
        None
    } else {
        Some(m.inverse())
    }
}

fn angular_mass_matrix(body_a: &RigidBody, body_b: &RigidBody) -> Mat3 {
    body_a.inverse_inertia + body_b.inverse_inertia
}

fn world_anchor(body: &RigidBody, local_anchor: Vec3) -> Vec3 {
    body.transform.position + body.transform.rotation * local_anchor
}

fn point_constraint_velocity_solve(
    body_a: &mut RigidBody,
    body_b: &mut RigidBody,
    ra: Vec3,
    rb: Vec3,
    bias: Vec3,
) -> Vec3 {
    let k = point_mass_matrix(body_a, body_b, ra, rb);
    let Some(k_inv) = invert_mat3(k) else { return Vec3::ZERO };

    let vrel = (body_b.velocity.linear + body_b.velocity.angular.cross(rb))
        - (body_a.velocity.linear + body_a.velocity.angular.cross(ra));
    let impulse = k_inv * (-vrel + bias);

    let anchor_a = body_a.transform.position + ra;
    let anchor_b = body_b.transform.position + rb;
    body_a.apply_impulse(-impulse, anchor_a);
    body_b.apply_impulse(impulse, anchor_b);
    impulse
}

fn angular_lock_velocity_solve(body_a: &mut RigidBody, body_b: &mut RigidBody, bias: Vec3) -> Vec3 {
    let k = angular_mass_matrix(body_a, body_b);
    let Some(k_inv) = invert_mat3(k) else { return Vec3::ZERO };
    let werr = body_b.velocity.angular - body_a.velocity.angular;
    let impulse = k_inv * (-werr + bias);
    body_a.apply_angular_impulse(-impulse);
    body_b.apply_angular_impulse(impulse);
    impulse
}

/// Extracts the rotation of `relative` about `axis` (swing-twist decomposition).
fn twist_angle(relative: Quat, axis: Vec3) -> f32 {
    let axis = axis.normalize_or_zero();
    if axis == Vec3::ZERO {
        return 0.0;
    }
    let imaginary = Vec3::new(relative.x, relative.y, relative.z);
    let proj = axis * imaginary.dot(axis);
    let twist = Quat::from_xyzw(proj.x, proj.y, proj.z, relative.w).normalize();
    2.0 * twist.w.clamp(-1.0, 1.0).acos() * if imaginary.dot(axis) < 0.0 { -1.0 } else { 1.0 }
}

/// One velocity-iteration pass over a joint: point-to-point anchor lock for
/// every kind, plus the kind-specific angular lock/motor/limit rows.
fn resolve_joint(bodies: &mut Arena<RigidBody>, joint: &mut Joint, bias_factor: f32, dt: f32) {
    match joint {
        Joint::BallSocket { body_a, body_b, local_anchor_a, local_anchor_b, accumulated_impulse } => {
            let Some((a, b)) = bodies.get2_mut(*body_a, *body_b) else { return };
            let ra = a.transform.rotation * *local_anchor_a;
            let rb = b.transform.rotation * *local_anchor_b;
            let c = world_anchor(b, *local_anchor_b) - world_anchor(a, *local_anchor_a);
            let bias = c * (-bias_factor / dt.max(1e-6));
            *accumulated_impulse += point_constraint_velocity_solve(a, b, ra, rb, bias);
        }
        Joint::Fixed {
            body_a,
            body_b,
            local_anchor_a,
            local_anchor_b,
            local_frame_a,
            local_frame_b,
            accumulated_point_impulse,
            accumulated_angular_impulse,
        } => {
            let Some((a, b)) = bodies.get2_mut(*body_a, *body_b) else { return };
            let ra = a.transform.rotation * *local_anchor_a;
            let rb = b.transform.rotation * *local_anchor_b;
            let c = world_anchor(b, *local_anchor_b) - world_anchor(a, *local_anchor_a);
            let bias = c * (-bias_factor / dt.max(1e-6));
            *accumulated_point_impulse += point_constraint_velocity_solve(a, b, ra, rb, bias);

            let target_a = a.transform.rotation * *local_frame_a;
            let target_b = b.transform.rotation * *local_frame_b;
            let relative = target_b * target_a.conjugate();
            let angular_error = Vec3::new(relative.x, relative.y, relative.z) * 2.0;
            let angular_bias = angular_error * (-bias_factor / dt.max(1e-6));
            *accumulated_angular_impulse += angular_lock_velocity_solve(a, b, angular_bias);
        }
        Joint::Hinge {
            body_a,
            body_b,
            local_anchor_a,
            local_anchor_b,
            local_axis_a,
            local_axis_b,
            enable_motor,
            motor_speed,
            max_motor_torque,
            enable_limit,
            lower_angle,
            upper_angle,
            accumulated_point_impulse,
            accumulated_angular_impulse,
            accumulated_motor_impulse,
            accumulated_limit_impulse,
        } => {
            let Some((a, b)) = bodies.get2_mut(*body_a, *body_b) else { return };
            let ra = a.transform.rotation * *local_anchor_a;
            let rb = b.transform.rotation * *local_anchor_b;
            let c = world_anchor(b, *local_anchor_b) - world_anchor(a, *local_anchor_a);
            let bias = c * (-bias_factor / dt.max(1e-6));
            *accumulated_point_impulse += point_constraint_velocity_solve(a, b, ra, rb, bias);

            let axis = (a.transform.rotation * *local_axis_a).normalize_or_zero();
            if axis != Vec3::ZERO {
                let k = angular_mass_matrix(a, b);
                if let Some(k_inv) = invert_mat3(k) {
                    let werr = b.velocity.angular - a.velocity.angular;
                    let werr_perp = werr - axis * werr.dot(axis);
                    let impulse = k_inv * (-werr_perp);
                    a.apply_angular_impulse(-impulse);
                    b.apply_angular_impulse(impulse);
                    *accumulated_angular_impulse += impulse;
                }

                let eff_mass_scalar = {
                    let ia_axis = a.inverse_inertia * axis;
                    let ib_axis = b.inverse_inertia * axis;
                    let denom = ia_axis.dot(axis) + ib_axis.dot(axis);
                    if denom > 1e-9 { 1.0 / denom } else { 0.0 }
                };

                if *enable_motor && eff_mass_scalar > 0.0 {
                    let cdot = (b.velocity.angular - a.velocity.angular).dot(axis);
                    let lambda = eff_mass_scalar * (*motor_speed - cdot);
                    let max_impulse = max_motor_torque.abs() * dt;
                    let old = *accumulated_motor_impulse;
                    *accumulated_motor_impulse = (old + lambda).clamp(-max_impulse, max_impulse);
                    let delta = *accumulated_motor_impulse - old;
                    a.apply_angular_impulse(-axis * delta);
                    b.apply_angular_impulse(axis * delta);
                }

                if *enable_limit && eff_mass_scalar > 0.0 {
                    let relative = b.transform.rotation * a.transform.rotation.conjugate();
                    let angle = twist_angle(relative, axis);
                    let cdot = (b.velocity.angular - a.velocity.angular).dot(axis);
                    let (bias_limit, clamp_min, clamp_max) = if angle < *lower_angle {
                        (bias_factor * (lower_angle - angle) / dt.max(1e-6), 0.0, f32::MAX)
                    } else if angle > *upper_angle {
                        (bias_factor * (upper_angle - angle) / dt.max(1e-6), f32::MIN, 0.0)
                    } else {
                        (0.0, f32::MIN, f32::MAX)
                    };
                    let lambda = eff_mass_scalar * (bias_limit - cdot);
                    let old = *accumulated_limit_impulse;
                    *accumulated_limit_impulse = (old + lambda).clamp(clamp_min, clamp_max);
                    let delta = *accumulated_limit_impulse - old;
                    a.apply_angular_impulse(-axis * delta);
                    b.apply_angular_impulse(axis * delta);
                }
            }
        }
        Joint::Slider {
            body_a,
            body_b,
            local_anchor_a,
            local_anchor_b,
            local_axis_a,
            local_axis_b: _,
            enable_motor,
            motor_speed,
            max_motor_force,
            enable_limit,
            lower_translation,
            upper_translation,
            accumulated_perp_impulse,
            accumulated_angular_impulse,
            accumulated_motor_impulse,
            accumulated_limit_impulse,
        } => {
            let Some((a, b)) = bodies.get2_mut(*body_a, *body_b) else { return };
            let axis = (a.transform.rotation * *local_axis_a).normalize_or_zero();
            let ra = a.transform.rotation * *local_anchor_a;
            let rb = b.transform.rotation * *local_anchor_b;
            let c = world_anchor(b, *local_anchor_b) - world_anchor(a, *local_anchor_a);

            if axis != Vec3::ZERO {
                let c_perp = c - axis * c.dot(axis);
                let bias = c_perp * (-bias_factor / dt.max(1e-6));
                *accumulated_perp_impulse += point_constraint_velocity_solve(a, b, ra, rb, bias);
            } else {
                *accumulated_perp_impulse += point_constraint_velocity_solve(a, b, ra, rb, Vec3::ZERO);
            }

            let angular_bias = Vec3::ZERO;
            *accumulated_angular_impulse += angular_lock_velocity_solve(a, b, angular_bias);

            if axis != Vec3::ZERO {
                let eff_mass_scalar = {
                    let denom = a.inverse_mass + b.inverse_mass;
                    if denom > 1e-9 { 1.0 / denom } else { 0.0 }
                };

                if *enable_motor && eff_mass_scalar > 0.0 {
                    let cdot = (b.velocity.linear - a.velocity.linear).dot(axis);
                    let lambda = eff_mass_scalar * (*motor_speed - cdot);
                    let max_impulse = max_motor_force.abs() * dt;
                    let old = *accumulated_motor_impulse;
                    *accumulated_motor_impulse = (old + lambda).clamp(-max_impulse, max_impulse);
                    let delta = *accumulated_motor_impulse - old;
                    a.apply_impulse(-axis * delta, a.transform.position);
                    b.apply_impulse(axis * delta, b.transform.position);
                }

                if *enable_limit && eff_mass_scalar > 0.0 {
                    let translation = c.dot(axis);
                    let cdot = (b.velocity.linear - a.velocity.linear).dot(axis);
                    let (bias_limit, clamp_min, clamp_max) = if translation < *lower_translation {
                        (bias_factor * (lower_translation - translation) / dt.max(1e-6), 0.0, f32::MAX)
                    } else if translation > *upper_translation {
                        (bias_factor * (upper_translation - translation) / dt.max(1e-6), f32::MIN, 0.0)
                    } else {
                        (0.0, f32::MIN, f32::MAX)
                    };
                    let lambda = eff_mass_scalar * (bias_limit - cdot);
                    let old = *accumulated_limit_impulse;
                    *accumulated_limit_impulse = (old + lambda).clamp(clamp_min, clamp_max);
                    let delta = *accumulated_limit_impulse - old;
                    a.apply_impulse(-axis * delta, a.transform.position);
                    b.apply_impulse(axis * delta, b.transform.position);
                }
            }
        }
    }
}

/// Position-only correction for a joint's anchor point (mirrors the
/// contact's separate position-solver pass).
fn correct_joint_position(bodies: &mut Arena<RigidBody>, joint: &Joint, bias_factor: f32) {
    let (body_a, body_b) = joint.bodies();
    let Some((a, b)) = bodies.get2_mut(body_a, body_b) else { return };
    let total_inv_mass = a.inverse_mass + b.inverse_mass;
    if total_inv_mass <= 0.0 {
        return;
    }

    let (local_a, local_b) = match joint {
        Joint::BallSocket { local_anchor_a, local_anchor_b, .. }
        | Joint::Fixed { local_anchor_a, local_anchor_b, .. }
        | Joint::Hinge { local_anchor_a, local_anchor_b, .. }
        | Joint::Slider { local_anchor_a, local_anchor_b, .. } => (*local_anchor_a, *local_anchor_b),
    };

    let mut error = world_anchor(b, local_b) - world_anchor(a, local_a);
    if let Joint::Slider { local_axis_a, .. } = joint {
        let axis = (a.transform.rotation * *local_axis_a).normalize_or_zero();
        if axis != Vec3::ZERO {
            error -= axis * error.dot(axis);
        }
    }

    let correction = error * bias_factor;
    a.transform.position += correction * (a.inverse_mass / total_inv_mass);
    b.transform.position -= correction * (b.inverse_mass / total_inv_mass);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rigidbody::RigidBody;

    fn make_contact(a: EntityId, b: EntityId) -> Contact {
        Contact {
            body_a: a,
            body_b: b,
            pair: PairKey::new(a, b),
            point_index: 0,
            local_a: Vec3::new(0.0, -0.5, 0.0),
            local_b: Vec3::new(0.0, 0.5, 0.0),
            normal: Vec3::Y,
            depth: 0.1,
            accumulated_normal_impulse: 0.0,
            accumulated_tangent_impulse: [0.0, 0.0],
            accumulated_rolling_impulse: 0.0,
            accumulated_torsional_impulse: 0.0,
            material: MaterialPairProperties::default(),
        }
    }

    #[test]
    fn resting_contact_produces_nonnegative_normal_impulse() {
        let mut bodies: Arena<RigidBody> = Arena::new();
        let floor = bodies.insert(RigidBody::builder().is_static(true).position(Vec3::ZERO).build());
        let mut box_body = RigidBody::builder().mass(1.0).position(Vec3::new(0.0, 1.0, 0.0)).build();
        box_body.velocity.linear = Vec3::new(0.0, -1.0, 0.0);
        let box_id = bodies.insert(box_body);

        let mut contact = make_contact(floor, box_id);
        resolve_contact(&mut bodies, &mut contact, 0.2, 0.01, 1.0, 1.0 / 60.0);

        assert!(contact.accumulated_normal_impulse >= 0.0);
        assert!(bodies.get(box_id).unwrap().velocity.linear.y > -1.0);
    }

    #[test]
    fn two_static_bodies_produce_no_impulse() {
        let mut bodies: Arena<RigidBody> = Arena::new();
        let a = bodies.insert(RigidBody::builder().is_static(true).build());
        let b = bodies.insert(RigidBody::builder().is_static(true).build());
        let mut contact = make_contact(a, b);
        resolve_contact(&mut bodies, &mut contact, 0.2, 0.01, 1.0, 1.0 / 60.0);
        assert_eq!(contact.accumulated_normal_impulse, 0.0);
    }

    #[test]
    fn ball_socket_joint_pulls_bodies_toward_common_anchor() {
        let mut bodies: Arena<RigidBody> = Arena::new();
        let anchor = bodies.insert(RigidBody::builder().is_static(true).position(Vec3::ZERO).build());
        let pendulum = bodies.insert(
            RigidBody::builder()
                .mass(1.0)
                .position(Vec3::new(1.0, 0.0, 0.0))
                .build(),
        );

        let mut joint = Joint::ball_socket(anchor, pendulum, Vec3::ZERO, Vec3::new(-1.0, 0.0, 0.0));
        for _ in 0..20 {
            resolve_joint(&mut bodies, &mut joint, 0.2, 1.0 / 60.0);
        }
        let world_anchor_on_pendulum =
            bodies.get(pendulum).unwrap().transform.position + Vec3::new(-1.0, 0.0, 0.0);
        assert!(world_anchor_on_pendulum.length() < 1.0);
    }
}
