//! Global configuration constants and the [`WorldConfig`] builder (§4.9, §7b).

use glam::Vec3;

/// Default gravity vector applied in the physics world (Y-up).
pub const DEFAULT_GRAVITY: [f32; 3] = [0.0, -9.81, 0.0];

/// Default integration timestep (in seconds). The world advances by exactly
/// this amount per `update()` call, never by a variable frame delta.
pub const DEFAULT_TIME_STEP: f32 = 1.0 / 60.0;

/// Default number of velocity (sequential-impulse) iterations per step (§4.8).
pub const DEFAULT_VELOCITY_ITERATIONS: u32 = 10;

/// Default number of position-correction iterations per step (§4.8).
pub const DEFAULT_POSITION_ITERATIONS: u32 = 5;

/// Default damping applied to linear velocity.
pub const DEFAULT_LINEAR_DAMPING: f32 = 0.02;

/// Default damping applied to angular velocity.
pub const DEFAULT_ANGULAR_DAMPING: f32 = 0.02;

/// Default material restitution, used when a body's material isn't set explicitly.
pub const DEFAULT_RESTITUTION: f32 = 0.1;

/// Default material friction, used when a body's material isn't set explicitly.
pub const DEFAULT_FRICTION: f32 = 0.4;

/// Baumgarte stabilization factor (`β` in §4.8's bias velocity formula).
pub const DEFAULT_BAUMGARTE_BIAS: f32 = 0.2;

/// Penetration slop: error below this depth is not corrected, to avoid jitter.
pub const DEFAULT_PENETRATION_SLOP: f32 = 0.01;

/// Relative normal velocity below which restitution bias is not applied.
pub const DEFAULT_RESTITUTION_VELOCITY_THRESHOLD: f32 = 1.0;

/// World-space distance beyond which a persisted manifold point is dropped (§4.6).
pub const DEFAULT_PERSISTENCE_THRESHOLD: f32 = 0.02;

/// Linear speed below which a body is considered "at rest" for sleeping (§4.8).
pub const DEFAULT_SLEEP_LINEAR_THRESHOLD: f32 = 0.05;

/// Angular speed below which a body is considered "at rest" for sleeping (§4.8).
pub const DEFAULT_SLEEP_ANGULAR_THRESHOLD: f32 = 0.05;

/// Continuous time below thresholds required before an island sleeps (§4.8).
pub const DEFAULT_SLEEP_TIME: f32 = 1.0;

/// Full configuration recognized by [`crate::world::PhysicsWorld`] (§4.9).
#[derive(Debug, Clone, Copy)]
pub struct WorldConfig {
    pub gravity: Vec3,
    pub timestep: f32,
    pub velocity_iterations: u32,
    pub position_iterations: u32,
    pub is_gravity_on: bool,
    pub is_sleeping_allowed: bool,
    pub default_restitution: f32,
    pub default_friction: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::from_array(DEFAULT_GRAVITY),
            timestep: DEFAULT_TIME_STEP,
            velocity_iterations: DEFAULT_VELOCITY_ITERATIONS,
            position_iterations: DEFAULT_POSITION_ITERATIONS,
            is_gravity_on: true,
            is_sleeping_allowed: true,
            default_restitution: DEFAULT_RESTITUTION,
            default_friction: DEFAULT_FRICTION,
        }
    }
}

impl WorldConfig {
    pub fn builder() -> WorldConfigBuilder {
        WorldConfigBuilder::default()
    }
}

/// Fluent builder mirroring the donor engine's `PhysicsWorldBuilder` style.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorldConfigBuilder {
    config: WorldConfig,
}

impl WorldConfigBuilder {
    pub fn gravity(mut self, gravity: Vec3) -> Self {
        self.config.gravity = gravity;
        self
    }

    pub fn timestep(mut self, dt: f32) -> Self {
        self.config.timestep = if dt > 0.0 { dt } else { DEFAULT_TIME_STEP };
        self
    }

    pub fn velocity_iterations(mut self, iterations: u32) -> Self {
        self.config.velocity_iterations = iterations.max(1);
        self
    }

    pub fn position_iterations(mut self, iterations: u32) -> Self {
        self.config.position_iterations = iterations.max(1);
        self
    }

    pub fn gravity_enabled(mut self, enabled: bool) -> Self {
        self.config.is_gravity_on = enabled;
        self
    }

    pub fn sleeping_allowed(mut self, enabled: bool) -> Self {
        self.config.is_sleeping_allowed = enabled;
        self
    }

    pub fn default_restitution(mut self, value: f32) -> Self {
        self.config.default_restitution = value;
        self
    }

    pub fn default_friction(mut self, value: f32) -> Self {
        self.config.default_friction = value;
        self
    }

    pub fn build(self) -> WorldConfig {
        self.config
    }
}
