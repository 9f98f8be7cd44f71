//! Joint constraints between two bodies (§3/§4.8).
//!
//! Each kind stores its own anchors/axes/limits plus the accumulated
//! (per-iteration) Lagrange multipliers needed to warm-start the next
//! solve, following the skew-matrix effective-mass style already used for
//! contacts in `dynamics::solver`.

use crate::utils::allocator::EntityId;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Joint {
    /// Locks a point on A to a point on B; free to rotate.
    BallSocket {
        body_a: EntityId,
        body_b: EntityId,
        local_anchor_a: Vec3,
        local_anchor_b: Vec3,
        #[serde(skip)]
        accumulated_impulse: Vec3,
    },
    /// Locks both the anchor points and the relative orientation.
    Fixed {
        body_a: EntityId,
        body_b: EntityId,
        local_anchor_a: Vec3,
        local_anchor_b: Vec3,
        local_frame_a: Quat,
        local_frame_b: Quat,
        #[serde(skip)]
        accumulated_point_impulse: Vec3,
        #[serde(skip)]
        accumulated_angular_impulse: Vec3,
    },
    /// Locks the anchor points and 2 rotational DOF, leaves rotation about
    /// `local_axis_*` free (optionally driven by a motor and/or clamped to
    /// an angular limit).
    Hinge {
        body_a: EntityId,
        body_b: EntityId,
        local_anchor_a: Vec3,
        local_anchor_b: Vec3,
        local_axis_a: Vec3,
        local_axis_b: Vec3,
        enable_motor: bool,
        motor_speed: f32,
        max_motor_torque: f32,
        enable_limit: bool,
        lower_angle: f32,
        upper_angle: f32,
        #[serde(skip)]
        accumulated_point_impulse: Vec3,
        #[serde(skip)]
        accumulated_angular_impulse: Vec3,
        #[serde(skip)]
        accumulated_motor_impulse: f32,
        #[serde(skip)]
        accumulated_limit_impulse: f32,
    },
    /// Locks relative orientation and 2 linear DOF perpendicular to
    /// `local_axis_*`, leaves translation along the axis free (optionally
    /// driven by a motor and/or clamped to a translation limit).
    Slider {
        body_a: EntityId,
        body_b: EntityId,
        local_anchor_a: Vec3,
        local_anchor_b: Vec3,
        local_axis_a: Vec3,
        local_axis_b: Vec3,
        enable_motor: bool,
        motor_speed: f32,
        max_motor_force: f32,
        enable_limit: bool,
        lower_translation: f32,
        upper_translation: f32,
        #[serde(skip)]
        accumulated_perp_impulse: Vec3,
        #[serde(skip)]
        accumulated_angular_impulse: Vec3,
        #[serde(skip)]
        accumulated_motor_impulse: f32,
        #[serde(skip)]
        accumulated_limit_impulse: f32,
    },
}

impl Joint {
    pub fn ball_socket(body_a: EntityId, body_b: EntityId, local_anchor_a: Vec3, local_anchor_b: Vec3) -> Self {
        Joint::BallSocket {
            body_a,
            body_b,
            local_anchor_a,
            local_anchor_b,
            accumulated_impulse: Vec3::ZERO,
        }
    }

    pub fn bodies(&self) -> (EntityId, EntityId) {
        match *self {
            Joint::BallSocket { body_a, body_b, .. }
            | Joint::Fixed { body_a, body_b, .. }
            | Joint::Hinge { body_a, body_b, .. }
            | Joint::Slider { body_a, body_b, .. } => (body_a, body_b),
        }
    }
}
