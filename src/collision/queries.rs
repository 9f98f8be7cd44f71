//! Ray casting against the current world state (§6 External interfaces,
//! §8 scenario 4). Each body carries at most one shape, looked up through
//! the world's [`ShapeRegistry`]; queries walk every collision-enabled body
//! directly rather than through a separate collider index.

use glam::Vec3;

use crate::core::rigidbody::RigidBody;
use crate::core::shapes::{Shape, ShapeRegistry};
use crate::utils::allocator::{Arena, EntityId};

/// A single ray-body intersection. `point`/`normal` are in world space; per
/// §9 open question (c), `point` is the actual world-space intersection, not
/// a pre-write local parameter.
#[derive(Debug, Clone, Copy)]
pub struct RaycastHit {
    pub body: EntityId,
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
}

/// Ray parameters: origin, (not-necessarily-normalized) direction, and a
/// maximum travel distance beyond which a hit is not reported.
#[derive(Debug, Clone, Copy)]
pub struct RaycastQuery {
    pub origin: Vec3,
    pub direction: Vec3,
    pub max_distance: f32,
}

impl RaycastQuery {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            max_distance: f32::MAX,
        }
    }

    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = max_distance;
        self
    }
}

pub struct Raycast;

impl Raycast {
    /// Every collision-enabled body the ray intersects, in no particular order.
    pub fn find_intersecting(
        query: &RaycastQuery,
        bodies: &Arena<RigidBody>,
        shapes: &ShapeRegistry,
    ) -> Vec<RaycastHit> {
        let dir = query.direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            return Vec::new();
        }

        let mut hits = Vec::new();
        for body in bodies.iter() {
            if !body.collision_enabled {
                continue;
            }
            let Some(key) = body.shape else { continue };
            let Some(shape) = shapes.get(key) else { continue };
            if let Some(hit) = ray_shape_test(query.origin, dir, query.max_distance, body, shape) {
                hits.push(hit);
            }
        }
        hits
    }

    pub fn find_closest(
        query: &RaycastQuery,
        bodies: &Arena<RigidBody>,
        shapes: &ShapeRegistry,
    ) -> Option<RaycastHit> {
        Self::find_intersecting(query, bodies, shapes)
            .into_iter()
            .min_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap())
    }

    pub fn find_furthest(
        query: &RaycastQuery,
        bodies: &Arena<RigidBody>,
        shapes: &ShapeRegistry,
    ) -> Option<RaycastHit> {
        Self::find_intersecting(query, bodies, shapes)
            .into_iter()
            .max_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap())
    }
}

fn ray_shape_test(
    origin: Vec3,
    dir: Vec3,
    max_distance: f32,
    body: &RigidBody,
    shape: &Shape,
) -> Option<RaycastHit> {
    let inv_rotation = body.transform.rotation.conjugate();
    let local_origin = inv_rotation * (origin - body.transform.position);
    let local_dir = inv_rotation * dir;

    let (t, local_normal) = match *shape {
        Shape::Sphere { radius, .. } => ray_sphere(local_origin, local_dir, radius)?,
        Shape::Box { half_extents, .. } => ray_box(local_origin, local_dir, half_extents)?,
        Shape::Cylinder { radius, height, .. } => ray_cylinder(local_origin, local_dir, radius, height)?,
        Shape::Cone { radius, height, .. } => ray_cone(local_origin, local_dir, radius, height)?,
    };

    if t < 0.0 || t > max_distance {
        return None;
    }

    let world_point = origin + dir * t;
    let world_normal = (body.transform.rotation * local_normal).normalize_or_zero();
    Some(RaycastHit {
        body: body.id,
        point: world_point,
        normal: world_normal,
        distance: t,
    })
}

fn ray_sphere(origin: Vec3, dir: Vec3, radius: f32) -> Option<(f32, Vec3)> {
    let a = dir.dot(dir);
    if a < 1e-12 {
        return None;
    }
    let b = 2.0 * origin.dot(dir);
    let c = origin.dot(origin) - radius * radius;
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let sqrt_disc = disc.sqrt();
    let t0 = (-b - sqrt_disc) / (2.0 * a);
    let t1 = (-b + sqrt_disc) / (2.0 * a);
    let t = if t0 >= 0.0 { t0 } else { t1 };
    if t < 0.0 {
        return None;
    }
    let point = origin + dir * t;
    Some((t, point.normalize_or_zero()))
}

/// Slab method against a box centered on the local origin.
fn ray_box(origin: Vec3, dir: Vec3, half_extents: Vec3) -> Option<(f32, Vec3)> {
    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;
    let mut normal = Vec3::ZERO;

    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];
        let he = half_extents[axis];

        if d.abs() < 1e-9 {
            if o < -he || o > he {
                return None;
            }
            continue;
        }

        let inv_d = 1.0 / d;
        let mut t1 = (-he - o) * inv_d;
        let mut t2 = (he - o) * inv_d;
        let mut sign = -1.0f32;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
            sign = 1.0;
        }

        if t1 > t_min {
            t_min = t1;
            normal = Vec3::ZERO;
            normal[axis] = sign;
        }
        t_max = t_max.min(t2);

        if t_min > t_max {
            return None;
        }
    }

    let t = if t_min >= 0.0 { t_min } else { t_max };
    if t < 0.0 {
        return None;
    }
    Some((t, normal))
}

/// Finite cylinder along local Y: lateral surface plus the two end caps.
fn ray_cylinder(origin: Vec3, dir: Vec3, radius: f32, height: f32) -> Option<(f32, Vec3)> {
    let half_height = height * 0.5;
    let mut best: Option<(f32, Vec3)> = None;

    let a = dir.x * dir.x + dir.z * dir.z;
    if a > 1e-12 {
        let b = 2.0 * (origin.x * dir.x + origin.z * dir.z);
        let c = origin.x * origin.x + origin.z * origin.z - radius * radius;
        let disc = b * b - 4.0 * a * c;
        if disc >= 0.0 {
            let sqrt_disc = disc.sqrt();
            for t in [(-b - sqrt_disc) / (2.0 * a), (-b + sqrt_disc) / (2.0 * a)] {
                if t < 0.0 {
                    continue;
                }
                let y = origin.y + dir.y * t;
                if y >= -half_height && y <= half_height {
                    let point = origin + dir * t;
                    let normal = Vec3::new(point.x, 0.0, point.z).normalize_or_zero();
                    best = closer(best, (t, normal));
                }
            }
        }
    }

    for cap_y in [-half_height, half_height] {
        if dir.y.abs() < 1e-9 {
            continue;
        }
        let t = (cap_y - origin.y) / dir.y;
        if t < 0.0 {
            continue;
        }
        let point = origin + dir * t;
        if point.x * point.x + point.z * point.z <= radius * radius {
            let normal = Vec3::new(0.0, cap_y.signum(), 0.0);
            best = closer(best, (t, normal));
        }
    }

    best
}

/// Cone with apex/base placed per [`Shape::Cone`]'s centroid-local origin.
fn ray_cone(origin: Vec3, dir: Vec3, radius: f32, height: f32) -> Option<(f32, Vec3)> {
    let apex_y = 0.75 * height;
    let base_y = -0.25 * height;
    let k = radius / height;
    let k2 = k * k;

    let oy_prime = apex_y - origin.y;
    let dy = dir.y;

    let a = dir.x * dir.x + dir.z * dir.z - k2 * dy * dy;
    let b = 2.0 * (origin.x * dir.x + origin.z * dir.z + k2 * oy_prime * dy);
    let c = origin.x * origin.x + origin.z * origin.z - k2 * oy_prime * oy_prime;

    let mut best: Option<(f32, Vec3)> = None;

    if a.abs() > 1e-12 {
        let disc = b * b - 4.0 * a * c;
        if disc >= 0.0 {
            let sqrt_disc = disc.sqrt();
            for t in [(-b - sqrt_disc) / (2.0 * a), (-b + sqrt_disc) / (2.0 * a)] {
                if t < 0.0 {
                    continue;
                }
                let point = origin + dir * t;
                if point.y >= base_y && point.y <= apex_y {
                    let y_prime = apex_y - point.y;
                    let normal = Vec3::new(point.x, k2 * y_prime, point.z).normalize_or_zero();
                    best = closer(best, (t, normal));
                }
            }
        }
    }

    if dir.y.abs() > 1e-9 {
        let t = (base_y - origin.y) / dir.y;
        if t >= 0.0 {
            let point = origin + dir * t;
            if point.x * point.x + point.z * point.z <= radius * radius {
                best = closer(best, (t, Vec3::new(0.0, -1.0, 0.0)));
            }
        }
    }

    best
}

fn closer(current: Option<(f32, Vec3)>, candidate: (f32, Vec3)) -> Option<(f32, Vec3)> {
    match current {
        Some(existing) if existing.0 <= candidate.0 => Some(existing),
        _ => Some(candidate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rigidbody::RigidBody;
    use glam::Quat;

    fn body_with_shape(position: Vec3, shape: Shape, registry: &mut ShapeRegistry) -> RigidBody {
        let key = registry.acquire(shape);
        RigidBody::builder().position(position).shape(key).build()
    }

    #[test]
    fn ray_hits_sphere_at_expected_point() {
        let mut shapes = ShapeRegistry::new();
        let mut bodies: Arena<RigidBody> = Arena::new();
        let body = body_with_shape(Vec3::ZERO, Shape::sphere(1.0), &mut shapes);
        bodies.insert(body);

        let query = RaycastQuery::new(Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        let hit = Raycast::find_closest(&query, &bodies, &shapes).expect("expected hit");
        assert!((hit.point.y - 1.0).abs() < 1e-3);
        assert!(hit.normal.y > 0.9);
    }

    #[test]
    fn ray_misses_sphere_when_offset() {
        let mut shapes = ShapeRegistry::new();
        let mut bodies: Arena<RigidBody> = Arena::new();
        let body = body_with_shape(Vec3::ZERO, Shape::sphere(1.0), &mut shapes);
        bodies.insert(body);

        let query = RaycastQuery::new(Vec3::new(5.0, 10.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        assert!(Raycast::find_closest(&query, &bodies, &shapes).is_none());
    }

    #[test]
    fn ray_hits_box_top_face() {
        let mut shapes = ShapeRegistry::new();
        let mut bodies: Arena<RigidBody> = Arena::new();
        let body = body_with_shape(Vec3::ZERO, Shape::cuboid(Vec3::splat(0.5)), &mut shapes);
        bodies.insert(body);

        let query = RaycastQuery::new(Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        let hit = Raycast::find_closest(&query, &bodies, &shapes).expect("expected hit");
        assert!((hit.point.y - 0.5).abs() < 1e-3);
    }

    #[test]
    fn furthest_and_closest_differ_across_two_bodies() {
        let mut shapes = ShapeRegistry::new();
        let mut bodies: Arena<RigidBody> = Arena::new();
        bodies.insert(body_with_shape(
            Vec3::new(0.0, 0.0, 0.0),
            Shape::cuboid(Vec3::new(5.0, 0.5, 5.0)),
            &mut shapes,
        ));
        bodies.insert(body_with_shape(Vec3::new(0.0, 5.0, 0.0), Shape::cuboid(Vec3::splat(0.5)), &mut shapes));

        let query = RaycastQuery::new(Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        let closest = Raycast::find_closest(&query, &bodies, &shapes).unwrap();
        let furthest = Raycast::find_furthest(&query, &bodies, &shapes).unwrap();
        assert!(closest.distance < furthest.distance);
    }

    #[test]
    fn rotated_body_reports_rotated_normal() {
        let mut shapes = ShapeRegistry::new();
        let mut bodies: Arena<RigidBody> = Arena::new();
        let key = shapes.acquire(Shape::cuboid(Vec3::splat(0.5)));
        let body = RigidBody::builder()
            .position(Vec3::ZERO)
            .rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2))
            .shape(key)
            .build();
        bodies.insert(body);

        let query = RaycastQuery::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0));
        let hit = Raycast::find_closest(&query, &bodies, &shapes).expect("expected hit");
        assert!(hit.normal.x.abs() > 0.9 || hit.normal.y.abs() > 0.9);
    }
}
