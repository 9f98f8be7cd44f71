//! Contact friction (§4.8): two tangential rows clamped to a Coulomb cone
//! around the accumulated normal impulse, plus rolling and torsional
//! resistance about the contact normal.

use glam::Vec3;

use crate::{core::rigidbody::RigidBody, dynamics::solver::Contact};

/// Builds an orthonormal tangent basis for a contact: `t1` follows the
/// tangential component of the relative velocity when it's large enough to
/// be meaningful, otherwise falls back to an arbitrary axis orthogonal to
/// `normal` (§4.8 "friction basis ... fallback orthogonal basis").
pub fn tangent_basis(normal: Vec3, relative_velocity: Vec3) -> (Vec3, Vec3) {
    let tangential = relative_velocity - normal * relative_velocity.dot(normal);
    let t1 = if tangential.length_squared() > 1e-8 {
        tangential.normalize()
    } else {
        orthogonal_to_normal(normal)
    };
    let t2 = normal.cross(t1).normalize_or_zero();
    (t1, t2)
}

fn orthogonal_to_normal(normal: Vec3) -> Vec3 {
    let mut tangent = normal.cross(Vec3::X);
    if tangent.length_squared() <= 1e-6 {
        tangent = normal.cross(Vec3::Y);
    }
    tangent.normalize_or_zero()
}

/// Applies the tangential, rolling, and torsional friction rows for one
/// contact (§4.8 step 2, the Coulomb-cone-clamped part of the velocity
/// iteration). Must run after the normal impulse for this iteration has
/// already been accumulated into `contact`.
pub fn apply_friction(
    body_a: &mut RigidBody,
    body_b: &mut RigidBody,
    contact: &mut Contact,
    anchor_a: Vec3,
    anchor_b: Vec3,
) {
    if body_a.is_static() && body_b.is_static() {
        return;
    }
    apply_tangential_friction(body_a, body_b, contact, anchor_a, anchor_b);
    apply_rolling_friction(body_a, body_b, contact);
    apply_torsional_friction(body_a, body_b, contact);
}

fn apply_tangential_friction(
    body_a: &mut RigidBody,
    body_b: &mut RigidBody,
    contact: &mut Contact,
    anchor_a: Vec3,
    anchor_b: Vec3,
) {
    let normal_impulse = contact.accumulated_normal_impulse.max(0.0);
    if normal_impulse <= f32::EPSILON {
        contact.accumulated_tangent_impulse = [0.0, 0.0];
        return;
    }

    let ra = anchor_a - body_a.transform.position;
    let rb = anchor_b - body_b.transform.position;
    let relative_velocity = (body_b.velocity.linear + body_b.velocity.angular.cross(rb))
        - (body_a.velocity.linear + body_a.velocity.angular.cross(ra));

    let (t1, t2) = tangent_basis(contact.normal, relative_velocity);
    let mu = combined_friction(contact.material.static_friction, contact.normal, t1, t2);
    let max_impulse = mu * normal_impulse;

    for (tangent, accumulated) in [(t1, 0usize), (t2, 1usize)] {
        let ra_x_t = ra.cross(tangent);
        let rb_x_t = rb.cross(tangent);
        let eff_mass = body_a.inverse_mass
            + body_b.inverse_mass
            + (body_a.inverse_inertia * ra_x_t).dot(ra_x_t)
            + (body_b.inverse_inertia * rb_x_t).dot(rb_x_t);
        if eff_mass <= f32::EPSILON {
            continue;
        }

        let vt = relative_velocity.dot(tangent);
        let lambda = -vt / eff_mass;
        let old = contact.accumulated_tangent_impulse[accumulated];
        let new = (old + lambda).clamp(-max_impulse, max_impulse);
        let delta = new - old;
        contact.accumulated_tangent_impulse[accumulated] = new;

        let impulse = tangent * delta;
        body_a.apply_impulse(-impulse, anchor_a);
        body_b.apply_impulse(impulse, anchor_b);
    }
}

fn combined_friction(static_friction: Vec3, normal: Vec3, t1: Vec3, t2: Vec3) -> f32 {
    let tangent = (t1 + t2).normalize_or_zero();
    if tangent == Vec3::ZERO {
        static_friction.abs().max_element()
    } else {
        let projected = (tangent - normal * tangent.dot(normal)).normalize_or_zero();
        static_friction.abs().dot(projected.abs()).max(0.0)
    }
}

fn apply_rolling_friction(body_a: &mut RigidBody, body_b: &mut RigidBody, contact: &mut Contact) {
    let limit = contact.material.rolling_friction.max(0.0) * contact.accumulated_normal_impulse.max(0.0);
    if limit <= f32::EPSILON {
        contact.accumulated_rolling_impulse = 0.0;
        return;
    }

    let relative_ang = body_b.velocity.angular - body_a.velocity.angular;
    let rolling = relative_ang - contact.normal * relative_ang.dot(contact.normal);
    let axis = rolling.normalize_or_zero();
    if axis == Vec3::ZERO {
        return;
    }

    let eff_mass = axis.dot(body_a.inverse_inertia * axis) + axis.dot(body_b.inverse_inertia * axis);
    if eff_mass <= f32::EPSILON {
        return;
    }

    let lambda = -relative_ang.dot(axis) / eff_mass;
    let old = contact.accumulated_rolling_impulse;
    let new = (old + lambda).clamp(-limit, limit);
    let delta = new - old;
    if delta.abs() <= 1e-10 {
        return;
    }
    contact.accumulated_rolling_impulse = new;

    body_a.apply_angular_impulse(-axis * delta);
    body_b.apply_angular_impulse(axis * delta);
}

fn apply_torsional_friction(body_a: &mut RigidBody, body_b: &mut RigidBody, contact: &mut Contact) {
    let limit = contact.material.torsional_friction.max(0.0) * contact.accumulated_normal_impulse.max(0.0);
    if limit <= f32::EPSILON {
        contact.accumulated_torsional_impulse = 0.0;
        return;
    }

    let axis = contact.normal;
    let relative_twist = (body_b.velocity.angular - body_a.velocity.angular).dot(axis);
    let eff_mass = axis.dot(body_a.inverse_inertia * axis) + axis.dot(body_b.inverse_inertia * axis);
    if eff_mass <= f32::EPSILON {
        return;
    }

    let lambda = -relative_twist / eff_mass;
    let old = contact.accumulated_torsional_impulse;
    let new = (old + lambda).clamp(-limit, limit);
    let delta = new - old;
    if delta.abs() <= 1e-10 {
        return;
    }
    contact.accumulated_torsional_impulse = new;

    body_a.apply_angular_impulse(-axis * delta);
    body_b.apply_angular_impulse(axis * delta);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::aabb::PairKey;
    use crate::core::types::MaterialPairProperties;
    use crate::utils::allocator::Arena;

    fn make_contact(a: crate::utils::allocator::EntityId, b: crate::utils::allocator::EntityId) -> Contact {
        Contact {
            body_a: a,
            body_b: b,
            pair: PairKey::new(a, b),
            point_index: 0,
            local_a: Vec3::ZERO,
            local_b: Vec3::ZERO,
            normal: Vec3::Y,
            depth: 0.0,
            accumulated_normal_impulse: 1.0,
            accumulated_tangent_impulse: [0.0, 0.0],
            accumulated_rolling_impulse: 0.0,
            accumulated_torsional_impulse: 0.0,
            material: MaterialPairProperties::default(),
        }
    }

    #[test]
    fn sliding_body_is_decelerated_by_friction() {
        let mut bodies: Arena<RigidBody> = Arena::new();
        let floor = bodies.insert(RigidBody::builder().is_static(true).build());
        let mut slider = RigidBody::builder().mass(1.0).build();
        slider.velocity.linear = Vec3::new(2.0, 0.0, 0.0);
        let slider_id = bodies.insert(slider);

        let mut contact = make_contact(floor, slider_id);
        contact.material.static_friction = Vec3::splat(0.5);
        let Some((a, b)) = bodies.get2_mut(floor, slider_id) else { panic!() };
        apply_friction(a, b, &mut contact, Vec3::ZERO, Vec3::ZERO);

        assert!(bodies.get(slider_id).unwrap().velocity.linear.x < 2.0);
    }

    #[test]
    fn zero_normal_impulse_clears_tangent_impulse() {
        let mut bodies: Arena<RigidBody> = Arena::new();
        let floor = bodies.insert(RigidBody::builder().is_static(true).build());
        let slider_id = bodies.insert(RigidBody::builder().mass(1.0).build());
        let mut contact = make_contact(floor, slider_id);
        contact.accumulated_normal_impulse = 0.0;
        contact.accumulated_tangent_impulse = [1.0, 1.0];
        let Some((a, b)) = bodies.get2_mut(floor, slider_id) else { panic!() };
        apply_friction(a, b, &mut contact, Vec3::ZERO, Vec3::ZERO);
        assert_eq!(contact.accumulated_tangent_impulse, [0.0, 0.0]);
    }
}
