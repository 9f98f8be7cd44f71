//! Narrow phase: sphere-sphere analytic test, GJK for everything else, and
//! EPA to extract a minimum-translation-vector when GJK reports overlap
//! (§4.5). Stateless — persistence across frames is the manifold store's job.

use glam::{Quat, Vec3};

use crate::core::{shapes::Shape, types::Transform};

/// A single candidate contact produced by the narrow phase: a unit normal
/// pointing from A to B, a non-negative penetration depth, and local-space
/// anchors on each body.
#[derive(Debug, Clone, Copy)]
pub struct ContactPointInfo {
    pub normal: Vec3,
    pub penetration: f32,
    pub local_a: Vec3,
    pub local_b: Vec3,
}

const GJK_MAX_ITERATIONS: usize = 32;
const EPA_MAX_ITERATIONS: usize = 32;
const EPA_EPSILON: f32 = 1e-4;

/// Tests two shapes at the given world transforms, dispatching to the
/// analytic sphere/sphere case or GJK+EPA.
pub struct NarrowPhase;

impl NarrowPhase {
    pub fn test(
        shape_a: &Shape,
        transform_a: &Transform,
        shape_b: &Shape,
        transform_b: &Transform,
    ) -> Option<ContactPointInfo> {
        if let (Shape::Sphere { radius: ra, margin: ma }, Shape::Sphere { radius: rb, margin: mb }) =
            (shape_a, shape_b)
        {
            return sphere_sphere(
                transform_a.position,
                *ra,
                *ma,
                transform_b.position,
                *rb,
                *mb,
            );
        }

        gjk_epa(shape_a, transform_a, shape_b, transform_b)
    }
}

fn sphere_sphere(
    center_a: Vec3,
    radius_a: f32,
    margin_a: f32,
    center_b: Vec3,
    radius_b: f32,
    margin_b: f32,
) -> Option<ContactPointInfo> {
    let ra = radius_a + margin_a;
    let rb = radius_b + margin_b;
    let d = center_b - center_a;
    let dist_sq = d.length_squared();
    let radius_sum = ra + rb;
    if dist_sq > radius_sum * radius_sum {
        return None;
    }

    let dist = dist_sq.sqrt();
    let normal = if dist > 1e-6 { d / dist } else { Vec3::Y };
    let penetration = (radius_sum - dist).max(0.0);

    // Local anchors are relative to each sphere's own center, scaled back
    // from the (margin-expanded) surface to the true geometric surface.
    Some(ContactPointInfo {
        normal,
        penetration,
        local_a: normal * radius_a,
        local_b: -normal * radius_b,
    })
}

/// World-space support point with margin, in direction `dir`.
fn world_support(shape: &Shape, transform: &Transform, dir: Vec3) -> Vec3 {
    let inv_rotation = transform.rotation.conjugate();
    let local_dir = inv_rotation * dir;
    let local_point = shape.support_with_margin(local_dir);
    transform.position + transform.rotation * local_point
}

/// A point on the Minkowski difference `A - B`, carrying its witness points
/// on each shape's surface so EPA can reconstruct local contact anchors.
#[derive(Debug, Clone, Copy)]
struct SupportPoint {
    point: Vec3,
    witness_a: Vec3,
    witness_b: Vec3,
}

fn minkowski_support(
    shape_a: &Shape,
    transform_a: &Transform,
    shape_b: &Shape,
    transform_b: &Transform,
    dir: Vec3,
) -> SupportPoint {
    let witness_a = world_support(shape_a, transform_a, dir);
    let witness_b = world_support(shape_b, transform_b, -dir);
    SupportPoint {
        point: witness_a - witness_b,
        witness_a,
        witness_b,
    }
}

fn gjk_epa(
    shape_a: &Shape,
    transform_a: &Transform,
    shape_b: &Shape,
    transform_b: &Transform,
) -> Option<ContactPointInfo> {
    let initial = transform_b.position - transform_a.position;
    let mut dir = if initial.length_squared() > 1e-10 { initial.normalize() } else { Vec3::X };
    let mut simplex = vec![minkowski_support(shape_a, transform_a, shape_b, transform_b, dir)];
    dir = -simplex[0].point;

    for _ in 0..GJK_MAX_ITERATIONS {
        if dir.length_squared() < 1e-10 {
            return epa(shape_a, transform_a, shape_b, transform_b, simplex);
        }

        let candidate = minkowski_support(shape_a, transform_a, shape_b, transform_b, dir);
        if candidate.point.dot(dir) < 0.0 {
            return None;
        }

        simplex.push(candidate);
        match next_direction(&mut simplex) {
            Some(next) => dir = next,
            None => return epa(shape_a, transform_a, shape_b, transform_b, simplex),
        }
    }

    None
}

/// Reduces `simplex` toward the sub-simplex closest to the origin, returning
/// the next search direction, or `None` when the origin is enclosed.
fn next_direction(simplex: &mut Vec<SupportPoint>) -> Option<Vec3> {
    match simplex.len() {
        2 => line_case(simplex),
        3 => triangle_case(simplex),
        4 => tetrahedron_case(simplex),
        _ => unreachable!("GJK simplex size out of range"),
    }
}

fn line_case(simplex: &mut Vec<SupportPoint>) -> Option<Vec3> {
    let a = simplex[1].point;
    let b = simplex[0].point;
    let ab = b - a;
    let ao = -a;

    if ab.dot(ao) > 0.0 {
        Some(triple_cross(ab, ao, ab))
    } else {
        *simplex = vec![simplex[1]];
        Some(ao)
    }
}

fn triangle_case(simplex: &mut Vec<SupportPoint>) -> Option<Vec3> {
    let a = simplex[2].point;
    let b = simplex[1].point;
    let c = simplex[0].point;
    let ab = b - a;
    let ac = c - a;
    let ao = -a;
    let abc = ab.cross(ac);

    if triple_cross(abc, ac, ac).dot(ao) > 0.0 {
        if ac.dot(ao) > 0.0 {
            *simplex = vec![simplex[0], simplex[2]];
            Some(triple_cross(ac, ao, ac))
        } else {
            *simplex = vec![simplex[1], simplex[2]];
            line_case(simplex)
        }
    } else if triple_cross(ab, abc, ab).dot(ao) > 0.0 {
        *simplex = vec![simplex[1], simplex[2]];
        line_case(simplex)
    } else if abc.dot(ao) > 0.0 {
        Some(abc)
    } else {
        *simplex = vec![simplex[0], simplex[1], simplex[2]];
        Some(-abc)
    }
}

fn tetrahedron_case(simplex: &mut Vec<SupportPoint>) -> Option<Vec3> {
    let a = simplex[3].point;
    let b = simplex[2].point;
    let c = simplex[1].point;
    let d = simplex[0].point;
    let ao = -a;

    let abc = (b - a).cross(c - a);
    let acd = (c - a).cross(d - a);
    let adb = (d - a).cross(b - a);

    if abc.dot(ao) > 0.0 {
        *simplex = vec![simplex[1], simplex[2], simplex[3]];
        return triangle_case(simplex);
    }
    if acd.dot(ao) > 0.0 {
        *simplex = vec![simplex[0], simplex[1], simplex[3]];
        return triangle_case(simplex);
    }
    if adb.dot(ao) > 0.0 {
        *simplex = vec![simplex[0], simplex[2], simplex[3]];
        return triangle_case(simplex);
    }

    None
}

fn triple_cross(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    a.cross(b).cross(c)
}

#[derive(Debug, Clone, Copy)]
struct Face {
    indices: [usize; 3],
    normal: Vec3,
    distance: f32,
}

fn face_from(points: &[SupportPoint], i: usize, j: usize, k: usize) -> Face {
    let a = points[i].point;
    let b = points[j].point;
    let c = points[k].point;
    let raw_normal = (b - a).cross(c - a);
    let mut normal = if raw_normal.length_squared() > 1e-10 { raw_normal.normalize() } else { Vec3::Y };
    // Ensure the normal points away from the origin (outward for a polytope
    // that contains it), flipping the winding if necessary.
    if normal.dot(a) < 0.0 {
        normal = -normal;
        return Face { indices: [i, k, j], normal, distance: normal.dot(a) };
    }
    Face { indices: [i, j, k], normal, distance: normal.dot(a) }
}

/// Expanding Polytope Algorithm: grows the tetrahedron GJK left behind,
/// outward from the origin, until the closest face stops advancing, then
/// reports that face's normal/distance as the minimum translation vector.
fn epa(
    shape_a: &Shape,
    transform_a: &Transform,
    shape_b: &Shape,
    transform_b: &Transform,
    simplex: Vec<SupportPoint>,
) -> Option<ContactPointInfo> {
    let mut points = simplex;
    if points.len() < 4 {
        // Degenerate GJK termination (origin on a lower-dimensional
        // feature); fall back to a small synthetic penetration along the
        // best available direction rather than propagating a panic.
        let raw = points.last().map(|p| -p.point).unwrap_or(Vec3::Y);
        let normal = if raw.length_squared() > 1e-10 { raw.normalize() } else { Vec3::Y };
        return Some(ContactPointInfo {
            normal,
            penetration: 0.0,
            local_a: Vec3::ZERO,
            local_b: Vec3::ZERO,
        });
    }

    let mut faces = vec![
        face_from(&points, 0, 1, 2),
        face_from(&points, 0, 3, 1),
        face_from(&points, 0, 2, 3),
        face_from(&points, 1, 3, 2),
    ];

    let mut result_face = *faces
        .iter()
        .min_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap())
        .unwrap();

    for _ in 0..EPA_MAX_ITERATIONS {
        result_face = *faces
            .iter()
            .min_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap())
            .unwrap();

        let support = minkowski_support(shape_a, transform_a, shape_b, transform_b, result_face.normal);
        let support_distance = support.point.dot(result_face.normal);

        if support_distance - result_face.distance < EPA_EPSILON {
            break;
        }

        let new_index = points.len();
        points.push(support);

        // Remove faces visible from the new point, recording their
        // boundary ("horizon") edges, then fan new faces from each horizon
        // edge to the new point.
        let mut edges: Vec<(usize, usize)> = Vec::new();
        faces.retain(|face| {
            let visible = face.normal.dot(support.point - points[face.indices[0]].point) > 0.0;
            if visible {
                add_edge(&mut edges, face.indices[0], face.indices[1]);
                add_edge(&mut edges, face.indices[1], face.indices[2]);
                add_edge(&mut edges, face.indices[2], face.indices[0]);
            }
            !visible
        });

        for (i, j) in edges {
            faces.push(face_from(&points, i, j, new_index));
        }

        if faces.is_empty() {
            break;
        }
    }

    let normal = result_face.normal;
    let penetration = result_face.distance.max(0.0);

    // Barycentric-ish projection: approximate the contact anchor as the
    // closest point on the winning face to the origin, then split it
    // between the two witness sets using the face vertices' own witnesses.
    let [i, j, k] = result_face.indices;
    let (u, v, w) = barycentric_of_origin(points[i].point, points[j].point, points[k].point);

    let local_world_a = points[i].witness_a * u + points[j].witness_a * v + points[k].witness_a * w;
    let local_world_b = points[i].witness_b * u + points[j].witness_b * v + points[k].witness_b * w;

    let local_a = transform_a.rotation.conjugate() * (local_world_a - transform_a.position);
    let local_b = transform_b.rotation.conjugate() * (local_world_b - transform_b.position);

    Some(ContactPointInfo { normal, penetration, local_a, local_b })
}

fn add_edge(edges: &mut Vec<(usize, usize)>, a: usize, b: usize) {
    if let Some(pos) = edges.iter().position(|&(x, y)| x == b && y == a) {
        edges.remove(pos);
    } else {
        edges.push((a, b));
    }
}

/// Barycentric coordinates of the origin's projection onto triangle `abc`,
/// clamped to the triangle (falls back to the centroid for a degenerate
/// triangle).
fn barycentric_of_origin(a: Vec3, b: Vec3, c: Vec3) -> (f32, f32, f32) {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = -a;

    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);
    let denom = d00 * d11 - d01 * d01;

    if denom.abs() < 1e-8 {
        return (1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0);
    }

    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    let u = 1.0 - v - w;
    (u.clamp(0.0, 1.0), v.clamp(0.0, 1.0), w.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id_transform(pos: Vec3) -> Transform {
        Transform { position: pos, rotation: Quat::IDENTITY, scale: Vec3::ONE }
    }

    #[test]
    fn separated_spheres_report_no_contact() {
        let a = Shape::sphere(1.0);
        let b = Shape::sphere(1.0);
        let ta = id_transform(Vec3::ZERO);
        let tb = id_transform(Vec3::new(10.0, 0.0, 0.0));
        assert!(NarrowPhase::test(&a, &ta, &b, &tb).is_none());
    }

    #[test]
    fn overlapping_spheres_report_contact_with_unit_normal() {
        let a = Shape::sphere(1.0);
        let b = Shape::sphere(1.0);
        let ta = id_transform(Vec3::ZERO);
        let tb = id_transform(Vec3::new(1.5, 0.0, 0.0));
        let contact = NarrowPhase::test(&a, &ta, &b, &tb).expect("expected contact");
        assert!((contact.normal.length() - 1.0).abs() < 1e-4);
        assert!(contact.penetration > 0.0);
        assert!(contact.normal.x > 0.0);
    }

    #[test]
    fn overlapping_boxes_report_positive_penetration() {
        let a = Shape::cuboid(Vec3::splat(0.5));
        let b = Shape::cuboid(Vec3::splat(0.5));
        let ta = id_transform(Vec3::ZERO);
        let tb = id_transform(Vec3::new(0.8, 0.0, 0.0));
        let contact = NarrowPhase::test(&a, &ta, &b, &tb).expect("expected contact");
        assert!(contact.penetration > 0.0);
        assert!((contact.normal.length() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn separated_boxes_report_no_contact() {
        let a = Shape::cuboid(Vec3::splat(0.5));
        let b = Shape::cuboid(Vec3::splat(0.5));
        let ta = id_transform(Vec3::ZERO);
        let tb = id_transform(Vec3::new(5.0, 0.0, 0.0));
        assert!(NarrowPhase::test(&a, &ta, &b, &tb).is_none());
    }

    #[test]
    fn box_resting_on_box_reports_small_penetration() {
        let floor = Shape::cuboid(Vec3::new(5.0, 0.25, 5.0));
        let box_ = Shape::cuboid(Vec3::splat(0.5));
        let ta = id_transform(Vec3::ZERO);
        let tb = id_transform(Vec3::new(0.0, 0.74, 0.0));
        let contact = NarrowPhase::test(&floor, &ta, &box_, &tb).expect("expected contact");
        assert!(contact.penetration > 0.0 && contact.penetration < 0.05);
        assert!(contact.normal.y > 0.9);
    }
}
