//! Additional math helpers layered on top of `glam`.

use glam::{Quat, Vec3};

/// Converts an angular velocity vector (radians/sec) into a quaternion delta over `dt`.
pub fn angular_velocity_to_quat(angular: Vec3, dt: f32) -> Quat {
    let angle = angular.length() * dt;
    if angle.abs() < 1e-6 {
        return Quat::IDENTITY;
    }
    let axis = angular.normalize();
    Quat::from_axis_angle(axis, angle)
}
