//! [`PhysicsWorld`]: the fixed-timestep orchestrator tying every subsystem
//! together (§4.9). One `update()` call runs, in order: apply gravity and
//! force generators, refresh moved bodies' AABBs, sweep the broad phase,
//! run the narrow phase and update persisted manifolds, build islands,
//! solve each awake island, integrate positions, clear per-step
//! accumulators, and advance the sleep policy.

use std::collections::HashSet;

use glam::{Mat3, Vec3};
use log::debug;

use crate::{
    collision::{
        aabb::{Aabb, PairKey},
        broadphase::BroadPhase,
        contact::ManifoldStore,
        narrowphase::NarrowPhase,
        queries::{Raycast, RaycastHit, RaycastQuery},
    },
    config::{
        WorldConfig, WorldConfigBuilder, DEFAULT_PERSISTENCE_THRESHOLD, DEFAULT_SLEEP_ANGULAR_THRESHOLD,
        DEFAULT_SLEEP_LINEAR_THRESHOLD, DEFAULT_SLEEP_TIME,
    },
    core::{
        joints::Joint,
        rigidbody::RigidBody,
        shapes::{Shape, ShapeRegistry},
        types::{MaterialPairProperties, Transform},
    },
    dynamics::{
        forces::{ForceGenerator, ForceRegistry, GravityForce},
        integrator::Integrator,
        island::IslandManager,
        solver::{Contact, PGSSolver, SolverStepMetrics},
    },
    error::{Error, Result},
    utils::{
        allocator::{Arena, EntityId},
        logging::{warn_if_frame_budget_exceeded, ScopedTimer},
        profiling::PhysicsProfiler,
    },
};

/// A body id space large enough that treating `Arena::len` as a conservative
/// bound (§4.10 "id overflow") never rejects a legitimate allocation in
/// practice.
const MAX_BODIES: usize = u32::MAX as usize;

/// Frame budget used by [`warn_if_frame_budget_exceeded`] to flag a step that
/// ran long enough to threaten real-time playback at the configured timestep.
const FRAME_BUDGET_MS: f32 = 16.0;

/// Central simulation container orchestrating every subsystem (§3, §4.9).
pub struct PhysicsWorld {
    pub bodies: Arena<RigidBody>,
    pub joints: Arena<Joint>,
    pub shapes: ShapeRegistry,

    broadphase: BroadPhase,
    manifolds: ManifoldStore,
    islands: IslandManager,
    solver: PGSSolver,
    integrator: Integrator,
    forces: ForceRegistry,

    config: WorldConfig,
    running: bool,
    interpolation_alpha: f32,
    accumulator: f32,

    profiler: PhysicsProfiler,
}

impl PhysicsWorld {
    /// Builds a world with the given fixed timestep and every other setting
    /// at its default (§4.9).
    pub fn new(timestep: f32) -> Self {
        Self::with_config(WorldConfig::builder().timestep(timestep).build())
    }

    pub fn with_config(config: WorldConfig) -> Self {
        Self {
            bodies: Arena::new(),
            joints: Arena::new(),
            shapes: ShapeRegistry::new(),
            broadphase: BroadPhase::new(),
            manifolds: ManifoldStore::new(),
            islands: IslandManager::new(),
            solver: PGSSolver::new(config.velocity_iterations, config.position_iterations),
            integrator: Integrator::new(config.timestep),
            forces: ForceRegistry::new(),
            config,
            running: true,
            interpolation_alpha: 1.0,
            accumulator: 0.0,
            profiler: PhysicsProfiler::default(),
        }
    }

    pub fn builder() -> PhysicsWorldBuilder {
        PhysicsWorldBuilder::default()
    }

    // ---------------------------------------------------------------
    // Body lifecycle (§6 External interfaces)
    // ---------------------------------------------------------------

    /// Low-level insert of an already-built body, bypassing shape/material
    /// validation. Used internally and by callers who build a [`RigidBody`]
    /// through its own builder.
    pub fn add_rigidbody(&mut self, body: RigidBody) -> EntityId {
        let id = self.bodies.insert(body);
        self.bodies.get_mut(id).expect("just inserted").id = id;
        id
    }

    /// Creates a dynamic rigid body. Rejects a missing shape and an id-space
    /// allocation that would exceed [`MAX_BODIES`] (§4.10).
    pub fn create_rigid_body(
        &mut self,
        transform: Transform,
        mass: f32,
        inertia_tensor: Mat3,
        shape: Option<Shape>,
    ) -> Result<EntityId> {
        let shape = shape.ok_or(Error::InvalidArgument("rigid body shape must not be null"))?;
        if self.bodies.len() >= MAX_BODIES {
            return Err(Error::InvalidState("body id space exhausted"));
        }

        let key = self.shapes.acquire(shape);
        let mut body = RigidBody::builder()
            .position(transform.position)
            .rotation(transform.rotation)
            .mass(mass)
            .inertia(inertia_tensor)
            .shape(key)
            .build();
        body.material.restitution = self.config.default_restitution;
        body.material.static_friction = self.config.default_friction;
        body.material.dynamic_friction = self.config.default_friction;
        Ok(self.add_rigidbody(body))
    }

    /// Creates a static (infinite-mass) rigid body. Rejects a missing shape
    /// the same way [`PhysicsWorld::create_rigid_body`] does.
    pub fn create_static_body(&mut self, transform: Transform, shape: Option<Shape>) -> Result<EntityId> {
        let shape = shape.ok_or(Error::InvalidArgument("static body shape must not be null"))?;
        if self.bodies.len() >= MAX_BODIES {
            return Err(Error::InvalidState("body id space exhausted"));
        }

        let key = self.shapes.acquire(shape);
        let mut body = RigidBody::builder()
            .position(transform.position)
            .rotation(transform.rotation)
            .shape(key)
            .is_static(true)
            .build();
        body.material.restitution = self.config.default_restitution;
        body.material.static_friction = self.config.default_friction;
        body.material.dynamic_friction = self.config.default_friction;
        Ok(self.add_rigidbody(body))
    }

    /// Destroys a body: unlinks every manifold and joint touching it, frees
    /// its broad-phase endpoints and shape reference, and releases its id.
    pub fn destroy_body(&mut self, id: EntityId) -> Result<()> {
        let Some(body) = self.bodies.get(id) else {
            return Err(Error::InvalidState("no such body"));
        };
        let shape_key = body.shape;
        let pairs = self.manifolds.pairs_of(body.first_contact);

        for pair in pairs {
            self.manifolds.remove_pair(pair, &mut self.bodies);
        }
        self.broadphase.remove(id);

        let touching_joints: Vec<EntityId> = self
            .joints
            .ids()
            .filter(|jid| {
                self.joints
                    .get(*jid)
                    .map(|j| {
                        let (a, b) = j.bodies();
                        a == id || b == id
                    })
                    .unwrap_or(false)
            })
            .collect();
        for jid in touching_joints {
            self.joints.remove(jid);
        }

        if let Some(key) = shape_key {
            self.shapes.release(key);
        }
        self.bodies.remove(id);
        Ok(())
    }

    pub fn body(&self, id: EntityId) -> Option<&RigidBody> {
        self.bodies.get(id)
    }

    pub fn body_mut(&mut self, id: EntityId) -> Option<&mut RigidBody> {
        self.bodies.get_mut(id)
    }

    /// The body's pose blended between its last two solved transforms, for a
    /// renderer sampling between fixed steps (§4.9).
    pub fn interpolated_transform(&self, id: EntityId) -> Option<Transform> {
        self.bodies.get(id).map(|b| b.interpolated_transform(self.interpolation_alpha))
    }

    pub fn set_interpolation_alpha(&mut self, alpha: f32) {
        self.interpolation_alpha = alpha.clamp(0.0, 1.0);
    }

    // ---------------------------------------------------------------
    // Waking external forces/impulses (§4.7: wakes the body's whole island)
    // ---------------------------------------------------------------

    pub fn apply_force_to_center(&mut self, id: EntityId, force: Vec3) {
        self.islands.wake_island_of(id, &mut self.bodies);
        if let Some(body) = self.bodies.get_mut(id) {
            body.apply_force_at_center(force);
        }
    }

    pub fn apply_force(&mut self, id: EntityId, force: Vec3, world_point: Vec3) {
        self.islands.wake_island_of(id, &mut self.bodies);
        if let Some(body) = self.bodies.get_mut(id) {
            body.apply_force(force, world_point);
        }
    }

    pub fn apply_torque(&mut self, id: EntityId, torque: Vec3) {
        self.islands.wake_island_of(id, &mut self.bodies);
        if let Some(body) = self.bodies.get_mut(id) {
            body.apply_torque(torque);
        }
    }

    pub fn apply_impulse(&mut self, id: EntityId, impulse: Vec3, world_point: Vec3) {
        self.islands.wake_island_of(id, &mut self.bodies);
        if let Some(body) = self.bodies.get_mut(id) {
            body.apply_impulse(impulse, world_point);
        }
    }

    // ---------------------------------------------------------------
    // Joints (§6 External interfaces)
    // ---------------------------------------------------------------

    pub fn create_joint(&mut self, joint: Joint) -> EntityId {
        self.joints.insert(joint)
    }

    pub fn destroy_joint(&mut self, id: EntityId) -> Result<()> {
        if self.joints.remove(id).is_none() {
            return Err(Error::InvalidState("no such joint"));
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Configuration (§4.9, §6)
    // ---------------------------------------------------------------

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.config.gravity = gravity;
    }

    pub fn set_gravity_enabled(&mut self, enabled: bool) {
        self.config.is_gravity_on = enabled;
    }

    pub fn enable_sleeping(&mut self, enabled: bool) {
        self.config.is_sleeping_allowed = enabled;
    }

    pub fn set_velocity_iterations(&mut self, iterations: u32) {
        self.solver.velocity_iterations = iterations.max(1);
    }

    pub fn velocity_iterations(&self) -> u32 {
        self.solver.velocity_iterations
    }

    pub fn set_position_iterations(&mut self, iterations: u32) {
        self.solver.position_iterations = iterations.max(1);
    }

    pub fn position_iterations(&self) -> u32 {
        self.solver.position_iterations
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn add_force_generator<F: ForceGenerator + 'static>(&mut self, generator: F) {
        self.forces.add_force(generator);
    }

    // ---------------------------------------------------------------
    // Ray casting (§6, §8 scenario 4)
    // ---------------------------------------------------------------

    pub fn find_intersecting_bodies(&self, query: &RaycastQuery) -> Vec<RaycastHit> {
        Raycast::find_intersecting(query, &self.bodies, &self.shapes)
    }

    pub fn find_closest_body(&self, query: &RaycastQuery) -> Option<RaycastHit> {
        Raycast::find_closest(query, &self.bodies, &self.shapes)
    }

    pub fn find_furthest_body(&self, query: &RaycastQuery) -> Option<RaycastHit> {
        Raycast::find_furthest(query, &self.bodies, &self.shapes)
    }

    // ---------------------------------------------------------------
    // Stepping (§4.9)
    // ---------------------------------------------------------------

    /// Advances the simulation by `dt`, running as many fixed-size
    /// `update()` steps as needed to consume the accumulated time. The world
    /// only ever advances in exact multiples of its configured timestep
    /// (§4.9: "never by a variable frame delta").
    pub fn step(&mut self, dt: f32) {
        if !self.running || dt <= 0.0 {
            return;
        }
        self.accumulator += dt;
        let timestep = self.config.timestep;
        let mut steps = 0;
        while self.accumulator >= timestep && steps < 8 {
            self.update();
            self.accumulator -= timestep;
            steps += 1;
        }
        self.interpolation_alpha = (self.accumulator / timestep).clamp(0.0, 1.0);
    }

    /// Runs exactly one fixed-timestep update (§4.9 steps 1-10).
    pub fn update(&mut self) {
        if !self.running {
            return;
        }
        let dt = self.config.timestep;
        let frame_timer = std::time::Instant::now();

        // 1. Save the previous transform for render-time interpolation.
        for body in self.bodies.iter_mut() {
            body.previous_transform = body.transform;
        }

        // 2. Apply gravity and registered forces into tentative velocities.
        {
            let _timer = ScopedTimer::new("integrate_velocities");
            if self.config.is_gravity_on {
                let gravity = GravityForce::new(self.config.gravity);
                for body in self.bodies.iter_mut() {
                    gravity.apply(body, dt);
                }
            }
            self.forces.apply_all(&mut self.bodies, dt);
            self.integrator.step_velocities(&mut self.bodies);
        }

        // 3. Refresh AABBs of bodies that moved since the last step.
        {
            let _timer = ScopedTimer::new("refresh_aabbs");
            self.refresh_aabbs();
        }

        // 4. Broad phase: sweep-and-prune over every body's current AABB.
        let broad_start = std::time::Instant::now();
        self.broadphase.sync(&self.bodies);
        let broad_phase_time = broad_start.elapsed();

        // 5. Narrow phase + manifold update for every broad-phase-present pair.
        let narrow_start = std::time::Instant::now();
        self.run_narrow_phase();
        let narrow_phase_time = narrow_start.elapsed();

        // 6. Build islands from the current contacts and joints.
        let contacts = self.flatten_contacts();
        self.islands.build_islands(&self.bodies, &contacts, &self.joints);

        // 7. Solve every awake island. Snapshotted up front so the solve/
        // write-back calls below don't need to hold a borrow of `self.islands`.
        let active_islands: Vec<(Vec<EntityId>, Vec<Contact>)> = self
            .islands
            .islands()
            .iter()
            .filter(|island| island.is_awake)
            .map(|island| (island.joints.clone(), island.contacts.clone()))
            .collect();

        let solve_start = std::time::Instant::now();
        let mut metrics = SolverStepMetrics::default();
        for (joint_ids, mut island_contacts) in active_islands {
            let island_metrics = self.solver.solve(&mut self.bodies, &mut self.joints, &joint_ids, &mut island_contacts, dt);
            metrics.merge(&island_metrics);
            metrics.islands_solved += 1;
            self.write_back_contacts(&island_contacts);
        }
        let solver_time = solve_start.elapsed();

        // 8. Integrate positions from the solved velocities.
        let integrate_start = std::time::Instant::now();
        self.integrator.step_positions(&mut self.bodies);
        let integrator_time = integrate_start.elapsed();

        // 9. Clear per-step force/torque accumulators (§9 open question (a)).
        for body in self.bodies.iter_mut() {
            body.clear_accumulators();
        }

        // 10. Advance the sleep policy.
        if self.config.is_sleeping_allowed {
            self.islands.update_sleeping(
                &mut self.bodies,
                dt,
                DEFAULT_SLEEP_LINEAR_THRESHOLD,
                DEFAULT_SLEEP_ANGULAR_THRESHOLD,
                DEFAULT_SLEEP_TIME,
            );
        }

        self.profiler.broad_phase_time = broad_phase_time;
        self.profiler.narrow_phase_time = narrow_phase_time;
        self.profiler.solver_time = solver_time;
        self.profiler.integrator_time = integrator_time;
        self.profiler.body_count = self.bodies.len();
        self.profiler.contact_count = contacts.len();
        self.profiler.active_island_count = self.islands.islands().iter().filter(|i| i.is_awake).count();
        self.profiler.total_frame_time = frame_timer.elapsed();

        debug!(
            "step: bodies={} contacts={} islands={} normal_impulse_sum={:.3}",
            self.profiler.body_count, self.profiler.contact_count, metrics.islands_solved, metrics.normal_impulse_sum
        );
        warn_if_frame_budget_exceeded(frame_timer.elapsed(), FRAME_BUDGET_MS);
    }

    fn refresh_aabbs(&mut self) {
        for body in self.bodies.iter_mut() {
            if !body.has_moved {
                continue;
            }
            let Some(key) = body.shape else { continue };
            let Some(shape) = self.shapes.get(key) else { continue };
            let (local_min, local_max) = shape.local_aabb();
            body.aabb = Aabb::from_local(local_min, local_max, body.transform.position, body.transform.rotation, 0.0);
            body.has_moved = false;
        }
    }

    fn run_narrow_phase(&mut self) {
        let present: Vec<PairKey> = self.broadphase.pair_manager().iter_present().collect();
        let mut active: HashSet<PairKey> = HashSet::new();

        for key in present {
            let Some(body_a) = self.bodies.get(key.a) else { continue };
            let Some(body_b) = self.bodies.get(key.b) else { continue };
            if !body_a.collision_enabled || !body_b.collision_enabled {
                continue;
            }
            let Some(shape_a_key) = body_a.shape else { continue };
            let Some(shape_b_key) = body_b.shape else { continue };
            let transform_a = body_a.transform;
            let transform_b = body_b.transform;
            let material_a = body_a.material;
            let material_b = body_b.material;

            let Some(shape_a) = self.shapes.get(shape_a_key).copied() else { continue };
            let Some(shape_b) = self.shapes.get(shape_b_key).copied() else { continue };

            if let Some(info) = NarrowPhase::test(&shape_a, &transform_a, &shape_b, &transform_b) {
                active.insert(key);
                let material = MaterialPairProperties::from_materials(&material_a, &material_b);
                self.manifolds.update_pair(key, &info, material, &mut self.bodies, DEFAULT_PERSISTENCE_THRESHOLD);
            }
        }

        self.manifolds.prune_stale(&active, &mut self.bodies);
    }

    /// Flattens every persisted manifold's points into the solver's flat
    /// [`Contact`] list, carrying forward each point's warm-start impulses.
    fn flatten_contacts(&self) -> Vec<Contact> {
        let mut out = Vec::new();
        for (key, manifold) in self.manifolds.iter() {
            for (index, point) in manifold.points.iter().enumerate() {
                out.push(Contact {
                    body_a: manifold.body_a,
                    body_b: manifold.body_b,
                    pair: *key,
                    point_index: index,
                    local_a: point.local_a,
                    local_b: point.local_b,
                    normal: manifold.normal,
                    depth: point.depth,
                    accumulated_normal_impulse: point.normal_impulse,
                    accumulated_tangent_impulse: point.tangent_impulse,
                    accumulated_rolling_impulse: point.rolling_impulse,
                    accumulated_torsional_impulse: point.torsional_impulse,
                    material: manifold.material,
                });
            }
        }
        out
    }

    /// Writes solved impulses back into the persisted manifold points so
    /// they warm-start the next step's solve (§4.8 step 1).
    fn write_back_contacts(&mut self, contacts: &[Contact]) {
        for contact in contacts {
            let Some(manifold) = self.manifolds.get_mut(contact.pair) else { continue };
            let Some(point) = manifold.points.get_mut(contact.point_index) else { continue };
            point.normal_impulse = contact.accumulated_normal_impulse;
            point.tangent_impulse = contact.accumulated_tangent_impulse;
            point.rolling_impulse = contact.accumulated_rolling_impulse;
            point.torsional_impulse = contact.accumulated_torsional_impulse;
        }
    }
}

/// Fluent builder mirroring the donor engine's `PhysicsWorldBuilder` style
/// (§7b), thin wrapper over [`WorldConfigBuilder`].
#[derive(Default)]
pub struct PhysicsWorldBuilder {
    config: WorldConfigBuilder,
}

impl PhysicsWorldBuilder {
    pub fn time_step(mut self, dt: f32) -> Self {
        self.config = self.config.timestep(dt);
        self
    }

    pub fn gravity(mut self, gravity: Vec3) -> Self {
        self.config = self.config.gravity(gravity);
        self
    }

    pub fn velocity_iterations(mut self, iterations: u32) -> Self {
        self.config = self.config.velocity_iterations(iterations);
        self
    }

    pub fn position_iterations(mut self, iterations: u32) -> Self {
        self.config = self.config.position_iterations(iterations);
        self
    }

    pub fn sleeping_allowed(mut self, enabled: bool) -> Self {
        self.config = self.config.sleeping_allowed(enabled);
        self
    }

    pub fn build(self) -> PhysicsWorld {
        PhysicsWorld::with_config(self.config.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bodies_fall_under_gravity() {
        let mut world = PhysicsWorld::new(1.0 / 60.0);
        let id = world.add_rigidbody(RigidBody::builder().build());
        world.update();
        assert!(world.body(id).unwrap().transform.position.y < 0.0);
    }

    #[test]
    fn static_body_creation_rejects_missing_shape() {
        let mut world = PhysicsWorld::new(1.0 / 60.0);
        let result = world.create_static_body(Transform::default(), None);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn destroying_unknown_body_is_invalid_state() {
        let mut world = PhysicsWorld::new(1.0 / 60.0);
        let bogus = EntityId::from_index(999);
        assert!(matches!(world.destroy_body(bogus), Err(Error::InvalidState(_))));
    }

    #[test]
    fn destroying_unknown_joint_is_invalid_state() {
        let mut world = PhysicsWorld::new(1.0 / 60.0);
        let bogus = EntityId::from_index(999);
        assert!(matches!(world.destroy_joint(bogus), Err(Error::InvalidState(_))));
    }

    #[test]
    fn box_on_floor_settles_without_sinking_through() {
        let mut world = PhysicsWorld::new(1.0 / 60.0);
        world
            .create_static_body(Transform::default(), Some(Shape::cuboid(Vec3::new(10.0, 0.5, 10.0))))
            .unwrap();
        let box_id = world
            .create_rigid_body(
                Transform {
                    position: Vec3::new(0.0, 2.0, 0.0),
                    ..Transform::default()
                },
                1.0,
                Mat3::IDENTITY,
                Some(Shape::cuboid(Vec3::splat(0.5))),
            )
            .unwrap();

        for _ in 0..240 {
            world.update();
        }

        let resting_y = world.body(box_id).unwrap().transform.position.y;
        assert!(resting_y > 0.4 && resting_y < 1.2);
    }

    #[test]
    fn sleeping_body_wakes_on_applied_force() {
        let mut world = PhysicsWorld::new(1.0 / 60.0);
        let id = world.add_rigidbody(RigidBody::builder().mass(1.0).build());
        world.body_mut(id).unwrap().put_to_sleep();
        assert!(world.body(id).unwrap().is_sleeping);

        world.apply_force_to_center(id, Vec3::new(0.0, 50.0, 0.0));
        assert!(!world.body(id).unwrap().is_sleeping);
    }

    #[test]
    fn ball_socket_pendulum_oscillates_about_its_anchor() {
        let mut world = PhysicsWorld::new(1.0 / 240.0);
        let anchor = world.add_rigidbody(RigidBody::builder().is_static(true).build());
        let bob = world.add_rigidbody(
            RigidBody::builder()
                .position(Vec3::new(1.0, 0.0, 0.0))
                .mass(1.0)
                .build(),
        );
        world.create_joint(Joint::ball_socket(anchor, bob, Vec3::ZERO, Vec3::new(-1.0, 0.0, 0.0)));

        for _ in 0..480 {
            world.update();
        }

        let distance_from_anchor = world.body(bob).unwrap().transform.position.length();
        assert!((distance_from_anchor - 1.0).abs() < 0.2);
    }
}
