//! Convex planar polygons carried through the BSP tree.

use crate::plane::Plane;
use paramak_kernel_math::{Aabb3, Point3};
use paramak_kernel_mesh::TriangleMesh;

/// A convex planar polygon tagged with the logical face it came from.
#[derive(Debug, Clone)]
pub struct Polygon {
    /// Vertices, counter-clockwise around `plane.normal`.
    pub vertices: Vec<Point3>,
    /// Supporting plane.
    pub plane: Plane,
    /// Logical face id.
    pub face: u32,
}

impl Polygon {
    /// Build a polygon, computing its plane. `None` if degenerate.
    pub fn new(vertices: Vec<Point3>, face: u32) -> Option<Self> {
        let plane = Plane::from_polygon(&vertices)?;
        Some(Self {
            vertices,
            plane,
            face,
        })
    }

    /// Build a polygon on a known plane.
    pub fn with_plane(vertices: Vec<Point3>, plane: Plane, face: u32) -> Self {
        Self {
            vertices,
            plane,
            face,
        }
    }

    /// Reverse winding and plane.
    pub fn flip(&mut self) {
        self.vertices.reverse();
        self.plane.flip();
    }

    /// Bounding box of the vertices.
    pub fn bounding_box(&self) -> Aabb3 {
        Aabb3::from_points(&self.vertices)
    }

    /// Area by fan triangulation.
    pub fn area(&self) -> f64 {
        let v0 = self.vertices[0];
        self.vertices
            .windows(2)
            .skip(1)
            .map(|w| (w[0] - v0).cross(&(w[1] - v0)).norm() / 2.0)
            .sum()
    }
}

/// Convert a mesh into one polygon per non-degenerate triangle.
pub fn polygons_from_mesh(mesh: &TriangleMesh) -> Vec<Polygon> {
    mesh.iter_triangles()
        .filter_map(|([a, b, c], face)| Polygon::new(vec![a, b, c], face))
        .collect()
}

/// Fan-triangulate convex polygons back into a mesh.
pub fn mesh_from_polygons(polygons: &[Polygon]) -> TriangleMesh {
    let mut mesh = TriangleMesh::new();
    for poly in polygons {
        let base = mesh.num_vertices() as u32;
        for v in &poly.vertices {
            mesh.add_vertex(*v);
        }
        for i in 1..poly.vertices.len() as u32 - 1 {
            mesh.add_triangle(base, base + i, base + i + 1, poly.face);
        }
    }
    mesh
}
