#![warn(missing_docs)]

//! Boolean operations on closed triangle meshes.
//!
//! The algorithm is the classic BSP-tree CSG: each operand is turned into a
//! tree of convex polygons, the trees clip each other, and the surviving
//! polygons form the result. Polygons whose bounding box misses the other
//! operand's box bypass the trees entirely.
//!
//! Face ids survive the operation. The caller is responsible for keeping the
//! two operands' face ids disjoint (see [`boolean`], which offsets B's ids).

pub mod bsp;
pub mod plane;
pub mod polygon;

use bsp::Node;
use paramak_kernel_math::{Aabb3, Point3, Vec3};
use paramak_kernel_mesh::TriangleMesh;
use polygon::{mesh_from_polygons, polygons_from_mesh, Polygon};

/// Boolean operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    /// A ∪ B
    Union,
    /// A − B
    Difference,
    /// A ∩ B
    Intersection,
}

/// Quantum used to weld coincident vertices of a boolean result.
const WELD_QUANTUM: f64 = 1e7;

/// Perform a boolean operation on two closed meshes.
///
/// B's face ids are shifted past A's so the result keeps both face sets
/// distinguishable.
pub fn boolean(a: &TriangleMesh, b: &TriangleMesh, op: BooleanOp) -> TriangleMesh {
    let mut b = b.clone();
    b.offset_face_ids(a.face_id_bound());

    let box_a = a.bounding_box();
    let box_b = b.bounding_box();
    if !box_a.overlaps(&box_b) {
        tracing::trace!(?op, "operands are disjoint, skipping BSP");
        return match op {
            BooleanOp::Union => {
                let mut out = a.clone();
                out.merge(&b);
                out
            }
            BooleanOp::Difference => a.clone(),
            BooleanOp::Intersection => TriangleMesh::new(),
        };
    }

    let (a_clip, a_pass) = partition(polygons_from_mesh(a), &box_b);
    let (b_clip, b_pass) = partition(polygons_from_mesh(&b), &box_a);
    tracing::trace!(
        ?op,
        a_clip = a_clip.len(),
        b_clip = b_clip.len(),
        "running BSP boolean"
    );

    let result = if a_clip.is_empty() || b_clip.is_empty() {
        nested_boolean(a, &b, a_clip, a_pass, b_clip, b_pass, op)
    } else {
        let mut polys = match op {
            BooleanOp::Union => union_polygons(a_clip, b_clip),
            BooleanOp::Difference => difference_polygons(a_clip, b_clip),
            BooleanOp::Intersection => intersection_polygons(a_clip, b_clip),
        };
        match op {
            BooleanOp::Union => {
                polys.extend(a_pass);
                polys.extend(b_pass);
            }
            BooleanOp::Difference => polys.extend(a_pass),
            BooleanOp::Intersection => {}
        }
        polys
    };
    mesh_from_polygons(&result).welded(WELD_QUANTUM)
}

/// Shorthand for [`boolean`] with [`BooleanOp::Union`].
pub fn union(a: &TriangleMesh, b: &TriangleMesh) -> TriangleMesh {
    boolean(a, b, BooleanOp::Union)
}

/// Shorthand for [`boolean`] with [`BooleanOp::Difference`].
pub fn difference(a: &TriangleMesh, b: &TriangleMesh) -> TriangleMesh {
    boolean(a, b, BooleanOp::Difference)
}

/// Shorthand for [`boolean`] with [`BooleanOp::Intersection`].
pub fn intersection(a: &TriangleMesh, b: &TriangleMesh) -> TriangleMesh {
    boolean(a, b, BooleanOp::Intersection)
}

/// Split polygons into those touching `other` and those that cannot.
fn partition(polygons: Vec<Polygon>, other: &Aabb3) -> (Vec<Polygon>, Vec<Polygon>) {
    let mut bounds = *other;
    bounds.expand(plane::EPSILON);
    polygons
        .into_iter()
        .partition(|p| p.bounding_box().overlaps(&bounds))
}

/// One operand has no surface near the other, so the other's clipped part is
/// either wholly inside or wholly outside it. Decide with a ray cast.
fn nested_boolean(
    a: &TriangleMesh,
    b: &TriangleMesh,
    a_clip: Vec<Polygon>,
    a_pass: Vec<Polygon>,
    b_clip: Vec<Polygon>,
    b_pass: Vec<Polygon>,
    op: BooleanOp,
) -> Vec<Polygon> {
    let a_in_b = a_clip
        .first()
        .map(|p| point_in_mesh(&centroid(p), b))
        .unwrap_or(false);
    let b_in_a = b_clip
        .first()
        .map(|p| point_in_mesh(&centroid(p), a))
        .unwrap_or(false);

    let mut out = Vec::new();
    match op {
        BooleanOp::Union => {
            out.extend(a_pass);
            out.extend(b_pass);
            if !a_in_b {
                out.extend(a_clip);
            }
            if !b_in_a {
                out.extend(b_clip);
            }
        }
        BooleanOp::Difference => {
            out.extend(a_pass);
            if !a_in_b {
                out.extend(a_clip);
            }
            if b_in_a {
                out.extend(b_clip.into_iter().map(|mut p| {
                    p.flip();
                    p
                }));
            }
        }
        BooleanOp::Intersection => {
            if a_in_b {
                out.extend(a_clip);
            }
            if b_in_a {
                out.extend(b_clip);
            }
        }
    }
    out
}

fn union_polygons(a: Vec<Polygon>, b: Vec<Polygon>) -> Vec<Polygon> {
    let mut a = Node::from_polygons(&a);
    let mut b = Node::from_polygons(&b);
    a.clip_to(&b);
    b.clip_to(&a);
    b.invert();
    b.clip_to(&a);
    b.invert();
    a.build(b.all_polygons());
    a.all_polygons()
}

fn difference_polygons(a: Vec<Polygon>, b: Vec<Polygon>) -> Vec<Polygon> {
    let mut a = Node::from_polygons(&a);
    let mut b = Node::from_polygons(&b);
    a.invert();
    a.clip_to(&b);
    b.clip_to(&a);
    b.invert();
    b.clip_to(&a);
    b.invert();
    a.build(b.all_polygons());
    a.invert();
    a.all_polygons()
}

fn intersection_polygons(a: Vec<Polygon>, b: Vec<Polygon>) -> Vec<Polygon> {
    let mut a = Node::from_polygons(&a);
    let mut b = Node::from_polygons(&b);
    a.invert();
    b.clip_to(&a);
    b.invert();
    a.clip_to(&b);
    b.clip_to(&a);
    a.build(b.all_polygons());
    a.invert();
    a.all_polygons()
}

fn centroid(p: &Polygon) -> Point3 {
    let sum = p
        .vertices
        .iter()
        .fold(Vec3::zeros(), |acc, v| acc + v.coords);
    Point3::from(sum / p.vertices.len() as f64)
}

/// Test whether a point lies inside a closed mesh by ray-crossing parity.
pub fn point_in_mesh(p: &Point3, mesh: &TriangleMesh) -> bool {
    // skewed so the ray rarely grazes an edge of an axis-aligned mesh
    let dir = Vec3::new(0.573_462_1, 0.577_350_3, 0.581_242_7).normalize();
    let mut crossings = 0usize;
    for ([v0, v1, v2], _) in mesh.iter_triangles() {
        if ray_hits_triangle(p, &dir, &v0, &v1, &v2) {
            crossings += 1;
        }
    }
    crossings % 2 == 1
}

/// Möller–Trumbore ray/triangle test, forward hits only.
fn ray_hits_triangle(origin: &Point3, dir: &Vec3, v0: &Point3, v1: &Point3, v2: &Point3) -> bool {
    let e1 = v1 - v0;
    let e2 = v2 - v0;
    let h = dir.cross(&e2);
    let det = e1.dot(&h);
    if det.abs() < 1e-14 {
        return false;
    }
    let inv = 1.0 / det;
    let s = origin - v0;
    let u = inv * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return false;
    }
    let q = s.cross(&e1);
    let v = inv * dir.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return false;
    }
    inv * e2.dot(&q) > 1e-12
}

#[cfg(test)]
mod tests {
    use super::*;
    use paramak_kernel_mesh::box_mesh;

    fn cube(min: f64, max: f64) -> TriangleMesh {
        box_mesh(Point3::new(min, min, min), Point3::new(max, max, max))
    }

    fn shifted_cube(dx: f64) -> TriangleMesh {
        box_mesh(Point3::new(dx, 0.0, 0.0), Point3::new(dx + 10.0, 10.0, 10.0))
    }

    #[test]
    fn test_union_overlapping() {
        let result = union(&shifted_cube(0.0), &shifted_cube(5.0));
        let v = result.volume();
        assert!((v - 1500.0).abs() < 1e-6, "expected 1500, got {v}");
    }

    #[test]
    fn test_difference_overlapping() {
        let result = difference(&shifted_cube(0.0), &shifted_cube(5.0));
        let v = result.volume();
        assert!((v - 500.0).abs() < 1e-6, "expected 500, got {v}");
    }

    #[test]
    fn test_intersection_overlapping() {
        let result = intersection(&shifted_cube(0.0), &shifted_cube(5.0));
        let v = result.volume();
        assert!((v - 500.0).abs() < 1e-6, "expected 500, got {v}");
    }

    #[test]
    fn test_disjoint_union_keeps_both() {
        let result = union(&shifted_cube(0.0), &shifted_cube(50.0));
        assert!((result.volume() - 2000.0).abs() < 1e-6);
        assert_eq!(result.face_count(), 12);
    }

    #[test]
    fn test_disjoint_intersection_is_empty() {
        let result = intersection(&shifted_cube(0.0), &shifted_cube(50.0));
        assert!(result.is_empty());
    }

    #[test]
    fn test_difference_of_nested_cube_leaves_cavity() {
        // inner cube's box touches no face of the outer cube
        let result = difference(&cube(0.0, 30.0), &cube(10.0, 20.0));
        let v = result.volume();
        assert!((v - (27000.0 - 1000.0)).abs() < 1e-6, "got {v}");
        assert_eq!(result.face_count(), 12);
    }

    #[test]
    fn test_union_of_nested_cube_is_outer() {
        let result = union(&cube(0.0, 30.0), &cube(10.0, 20.0));
        assert!((result.volume() - 27000.0).abs() < 1e-6);
    }

    #[test]
    fn test_difference_keeps_face_ids_apart() {
        let result = difference(&shifted_cube(0.0), &shifted_cube(5.0));
        // the face closing the cut comes from B, whose ids start after A's six
        assert!(result.face_ids.iter().any(|&f| f < 6));
        assert!(result.face_ids.iter().any(|&f| f >= 6));
    }

    #[test]
    fn test_point_in_mesh() {
        let c = cube(0.0, 10.0);
        assert!(point_in_mesh(&Point3::new(5.0, 5.0, 5.0), &c));
        assert!(!point_in_mesh(&Point3::new(15.0, 5.0, 5.0), &c));
        assert!(!point_in_mesh(&Point3::new(-1.0, -1.0, -1.0), &c));
    }
}
