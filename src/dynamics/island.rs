//! Island builder (§4.7): flood-fills awake dynamic bodies across their
//! contacts and joints so the solver and the sleep policy can each work one
//! connected component at a time. Static and sleeping bodies are absorbing:
//! they terminate the flood fill rather than propagating it, so two
//! separate stacks resting on the same static floor don't merge into one
//! island.

use std::collections::{HashMap, HashSet};

use crate::{
    core::joints::Joint,
    dynamics::solver::Contact,
    utils::allocator::{Arena, EntityId},
    core::rigidbody::RigidBody,
};

/// A connected component of awake bodies plus the contacts/joints between them.
pub struct Island {
    pub bodies: Vec<EntityId>,
    pub contacts: Vec<Contact>,
    pub joints: Vec<EntityId>,
    pub is_awake: bool,
}

#[derive(Default)]
pub struct IslandManager {
    islands: Vec<Island>,
}

impl IslandManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn islands(&self) -> &[Island] {
        &self.islands
    }

    /// Rebuilds islands from scratch for this step. `contacts` is the flat
    /// list the narrow phase/manifold store produced; `joints` is the
    /// world's joint arena.
    pub fn build_islands(&mut self, bodies: &Arena<RigidBody>, contacts: &[Contact], joints: &Arena<Joint>) {
        self.islands.clear();

        let mut adjacency: HashMap<EntityId, Vec<EntityId>> = HashMap::new();
        for contact in contacts {
            adjacency.entry(contact.body_a).or_default().push(contact.body_b);
            adjacency.entry(contact.body_b).or_default().push(contact.body_a);
        }
        for joint_id in joints.ids() {
            if let Some(joint) = joints.get(joint_id) {
                let (a, b) = joint.bodies();
                adjacency.entry(a).or_default().push(b);
                adjacency.entry(b).or_default().push(a);
            }
        }

        let mut visited: HashSet<EntityId> = HashSet::new();

        for body in bodies.iter() {
            if body.is_static() || body.is_sleeping || visited.contains(&body.id) {
                continue;
            }

            let mut collected = Vec::new();
            let mut stack = vec![body.id];
            while let Some(node) = stack.pop() {
                if !visited.insert(node) {
                    continue;
                }
                collected.push(node);

                let absorbing = bodies
                    .get(node)
                    .map(|b| b.is_static() || b.is_sleeping)
                    .unwrap_or(true);
                if absorbing {
                    continue;
                }

                if let Some(neighbors) = adjacency.get(&node) {
                    for &n in neighbors {
                        if !visited.contains(&n) {
                            stack.push(n);
                        }
                    }
                }
            }

            let member: HashSet<EntityId> = collected.iter().copied().collect();
            let island_contacts: Vec<Contact> = contacts
                .iter()
                .filter(|c| member.contains(&c.body_a) || member.contains(&c.body_b))
                .cloned()
                .collect();
            let island_joints: Vec<EntityId> = joints
                .ids()
                .filter(|id| {
                    joints
                        .get(*id)
                        .map(|j| {
                            let (a, b) = j.bodies();
                            member.contains(&a) || member.contains(&b)
                        })
                        .unwrap_or(false)
                })
                .collect();

            self.islands.push(Island {
                bodies: collected,
                contacts: island_contacts,
                joints: island_joints,
                is_awake: true,
            });
        }
    }

    /// Advances each awake dynamic body's sleep timer and puts an island to
    /// sleep once every member has stayed below threshold continuously for
    /// `sleep_time` seconds (§4.8 "Sleep").
    pub fn update_sleeping(
        &mut self,
        bodies: &mut Arena<RigidBody>,
        dt: f32,
        linear_threshold: f32,
        angular_threshold: f32,
        sleep_time: f32,
    ) {
        for island in &mut self.islands {
            if !island.is_awake {
                continue;
            }

            let mut should_sleep = true;
            for id in &island.bodies {
                let Some(body) = bodies.get_mut(*id) else { continue };
                if body.is_static() {
                    continue;
                }
                if body.is_below_sleep_thresholds(linear_threshold, angular_threshold) {
                    body.sleep_timer += dt;
                } else {
                    body.sleep_timer = 0.0;
                }
                if body.sleep_timer < sleep_time {
                    should_sleep = false;
                }
            }

            if should_sleep {
                island.is_awake = false;
                for id in &island.bodies {
                    if let Some(body) = bodies.get_mut(*id) {
                        if !body.is_static() {
                            body.put_to_sleep();
                        }
                    }
                }
            }
        }
    }

    /// Wakes `body` and every other body sharing its current island, used
    /// when an external force/impulse lands on a sleeping body (§4.7).
    pub fn wake_island_of(&mut self, body: EntityId, bodies: &mut Arena<RigidBody>) {
        let Some(island) = self.islands.iter_mut().find(|isl| isl.bodies.contains(&body)) else {
            if let Some(b) = bodies.get_mut(body) {
                b.wake();
            }
            return;
        };
        island.is_awake = true;
        for id in &island.bodies {
            if let Some(b) = bodies.get_mut(*id) {
                b.wake();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rigidbody::RigidBody;
    use glam::Vec3;

    /// Inserts a body into `bodies` and stamps its `id` field with the
    /// handle the arena just returned, the way `PhysicsWorld::add_rigidbody`
    /// does — required because the flood fill keys off `RigidBody::id`, not
    /// the arena slot it happens to occupy.
    fn spawn(bodies: &mut Arena<RigidBody>, body: RigidBody) -> EntityId {
        let id = bodies.insert(body);
        bodies.get_mut(id).unwrap().id = id;
        id
    }

    fn contact(a: EntityId, b: EntityId) -> Contact {
        Contact {
            body_a: a,
            body_b: b,
            pair: crate::collision::aabb::PairKey::new(a, b),
            point_index: 0,
            local_a: Vec3::ZERO,
            local_b: Vec3::ZERO,
            normal: Vec3::Y,
            depth: 0.01,
            accumulated_normal_impulse: 0.0,
            accumulated_tangent_impulse: [0.0, 0.0],
            accumulated_rolling_impulse: 0.0,
            accumulated_torsional_impulse: 0.0,
            material: Default::default(),
        }
    }

    #[test]
    fn static_floor_does_not_merge_two_separate_stacks() {
        let mut bodies: Arena<RigidBody> = Arena::new();
        let floor = spawn(&mut bodies, RigidBody::builder().is_static(true).build());
        let left = spawn(&mut bodies, RigidBody::builder().build());
        let right = spawn(&mut bodies, RigidBody::builder().build());

        let contacts = vec![contact(floor, left), contact(floor, right)];
        let joints: Arena<Joint> = Arena::new();

        let mut manager = IslandManager::new();
        manager.build_islands(&bodies, &contacts, &joints);

        assert_eq!(manager.islands().len(), 2);
    }

    #[test]
    fn sleeping_body_is_absorbing() {
        let mut bodies: Arena<RigidBody> = Arena::new();
        let mut sleeper = RigidBody::builder().build();
        sleeper.is_sleeping = true;
        let sleeper_id = spawn(&mut bodies, sleeper);
        let a = spawn(&mut bodies, RigidBody::builder().build());
        let b = spawn(&mut bodies, RigidBody::builder().build());

        let contacts = vec![contact(a, sleeper_id), contact(sleeper_id, b)];
        let joints: Arena<Joint> = Arena::new();

        let mut manager = IslandManager::new();
        manager.build_islands(&bodies, &contacts, &joints);

        assert_eq!(manager.islands().len(), 2);
    }

    #[test]
    fn island_sleeps_after_sustained_low_velocity() {
        let mut bodies: Arena<RigidBody> = Arena::new();
        let a = spawn(&mut bodies, RigidBody::builder().build());

        let mut manager = IslandManager::new();
        let joints: Arena<Joint> = Arena::new();
        manager.build_islands(&bodies, &[], &joints);

        for _ in 0..120 {
            manager.update_sleeping(&mut bodies, 1.0 / 60.0, 0.05, 0.05, 1.0);
        }
        assert!(bodies.get(a).unwrap().is_sleeping);
    }
}
