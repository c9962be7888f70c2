#![warn(missing_docs)]

//! Face-tagged triangle meshes for the paramak kernel.
//!
//! Every solid in the kernel is a closed, outward-oriented triangle mesh.
//! Each triangle carries the id of the logical face it was generated from
//! (one profile edge swept into a surface, or one end cap), which lets the
//! kernel report per-face areas and face counts the way a B-rep would.

use paramak_kernel_math::{Aabb3, Point3, Transform, Vec3};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// A triangle mesh whose triangles are grouped into logical faces.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub positions: Vec<Point3>,
    /// Triangles as counter-clockwise (seen from outside) vertex index triples.
    pub triangles: Vec<[u32; 3]>,
    /// Logical face id of each triangle. Same length as `triangles`.
    pub face_ids: Vec<u32>,
}

impl TriangleMesh {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// True if the mesh holds no triangles.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Append a vertex and return its index.
    pub fn add_vertex(&mut self, p: Point3) -> u32 {
        self.positions.push(p);
        (self.positions.len() - 1) as u32
    }

    /// Append a triangle over existing vertices.
    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32, face: u32) {
        self.triangles.push([a, b, c]);
        self.face_ids.push(face);
    }

    /// Append a triangle by position, creating three fresh vertices.
    pub fn push_triangle(&mut self, a: Point3, b: Point3, c: Point3, face: u32) {
        let ia = self.add_vertex(a);
        let ib = self.add_vertex(b);
        let ic = self.add_vertex(c);
        self.add_triangle(ia, ib, ic, face);
    }

    /// Positions of the three corners of triangle `i`.
    pub fn triangle(&self, i: usize) -> [Point3; 3] {
        let [a, b, c] = self.triangles[i];
        [
            self.positions[a as usize],
            self.positions[b as usize],
            self.positions[c as usize],
        ]
    }

    /// Iterate over `(corners, face_id)` for every triangle.
    pub fn iter_triangles(&self) -> impl Iterator<Item = ([Point3; 3], u32)> + '_ {
        (0..self.triangles.len()).map(move |i| (self.triangle(i), self.face_ids[i]))
    }

    /// Merge another mesh into this one, keeping its face ids unchanged.
    pub fn merge(&mut self, other: &TriangleMesh) {
        let offset = self.num_vertices() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.triangles.extend(
            other
                .triangles
                .iter()
                .map(|t| [t[0] + offset, t[1] + offset, t[2] + offset]),
        );
        self.face_ids.extend_from_slice(&other.face_ids);
    }

    /// Highest face id plus one (0 for an empty mesh).
    pub fn face_id_bound(&self) -> u32 {
        self.face_ids.iter().max().map_or(0, |m| m + 1)
    }

    /// Shift every face id by `offset`.
    pub fn offset_face_ids(&mut self, offset: u32) {
        for f in &mut self.face_ids {
            *f += offset;
        }
    }

    // =========================================================================
    // Transforms
    // =========================================================================

    /// Return a transformed copy. Mirroring transforms flip the winding so the
    /// mesh stays outward-oriented.
    pub fn transformed(&self, t: &Transform) -> TriangleMesh {
        let mut out = self.clone();
        for p in &mut out.positions {
            *p = t.apply_point(p);
        }
        if t.determinant() < 0.0 {
            out.flip();
        }
        out
    }

    /// Reverse the winding of every triangle.
    pub fn flip(&mut self) {
        for t in &mut self.triangles {
            t.swap(1, 2);
        }
    }

    // =========================================================================
    // Mass properties
    // =========================================================================

    /// Enclosed volume, by the divergence theorem over signed tetrahedra.
    pub fn signed_volume(&self) -> f64 {
        let mut vol = 0.0;
        for ([v0, v1, v2], _) in self.iter_triangles() {
            vol += v0.coords.dot(&v1.coords.cross(&v2.coords));
        }
        vol / 6.0
    }

    /// Absolute enclosed volume.
    pub fn volume(&self) -> f64 {
        self.signed_volume().abs()
    }

    /// Total surface area.
    pub fn surface_area(&self) -> f64 {
        self.iter_triangles()
            .map(|([a, b, c], _)| triangle_area(&a, &b, &c))
            .sum()
    }

    /// Surface area of each logical face, keyed by face id.
    ///
    /// Faces whose triangles are all degenerate are omitted.
    pub fn face_areas(&self) -> BTreeMap<u32, f64> {
        let mut areas: BTreeMap<u32, f64> = BTreeMap::new();
        for ([a, b, c], face) in self.iter_triangles() {
            let area = triangle_area(&a, &b, &c);
            if area > 0.0 {
                *areas.entry(face).or_insert(0.0) += area;
            }
        }
        areas.retain(|_, a| *a > 1e-9);
        areas
    }

    /// Number of distinct logical faces with non-zero area.
    pub fn face_count(&self) -> usize {
        self.face_areas().len()
    }

    /// Axis-aligned bounding box of all vertices referenced by triangles.
    pub fn bounding_box(&self) -> Aabb3 {
        let mut aabb = Aabb3::empty();
        for t in &self.triangles {
            for &i in t {
                aabb.include_point(&self.positions[i as usize]);
            }
        }
        aabb
    }

    /// Centre of mass assuming uniform density.
    pub fn center_of_mass(&self) -> Point3 {
        let mut c = Vec3::zeros();
        let mut total = 0.0;
        for ([v0, v1, v2], _) in self.iter_triangles() {
            let vol = v0.coords.dot(&v1.coords.cross(&v2.coords));
            total += vol;
            c += vol * (v0.coords + v1.coords + v2.coords);
        }
        if total.abs() < 1e-15 {
            return Point3::origin();
        }
        Point3::from(c / (4.0 * total))
    }

    // =========================================================================
    // Clean-up
    // =========================================================================

    /// Merge coincident vertices and drop triangles that collapse.
    ///
    /// Positions are quantized to `1 / quantum` before comparison.
    pub fn welded(&self, quantum: f64) -> TriangleMesh {
        let quantize = |v: f64| (v * quantum).round() as i64;
        let mut lookup: FxHashMap<(i64, i64, i64), u32> = FxHashMap::default();
        let mut remap = Vec::with_capacity(self.positions.len());
        let mut out = TriangleMesh::new();
        for p in &self.positions {
            let key = (quantize(p.x), quantize(p.y), quantize(p.z));
            let idx = *lookup.entry(key).or_insert_with(|| {
                out.positions.push(*p);
                (out.positions.len() - 1) as u32
            });
            remap.push(idx);
        }
        for (t, &face) in self.triangles.iter().zip(&self.face_ids) {
            let [a, b, c] = [
                remap[t[0] as usize],
                remap[t[1] as usize],
                remap[t[2] as usize],
            ];
            if a != b && b != c && a != c {
                out.add_triangle(a, b, c, face);
            }
        }
        out
    }

    /// Subdivide triangles until no edge is longer than `max_edge`.
    ///
    /// Each triangle is split uniformly into `k * k` children where `k` is
    /// chosen from its longest edge. Neighbouring triangles may pick a
    /// different `k`, which leaves T-junctions; enclosed volume is unchanged.
    pub fn refined(&self, max_edge: f64) -> TriangleMesh {
        if max_edge <= 0.0 {
            return self.clone();
        }
        let mut out = TriangleMesh::new();
        for ([a, b, c], face) in self.iter_triangles() {
            let longest = (b - a).norm().max((c - b).norm()).max((a - c).norm());
            let k = (longest / max_edge).ceil().max(1.0) as usize;
            if k == 1 {
                out.push_triangle(a, b, c, face);
                continue;
            }
            let at = |i: usize, j: usize| -> Point3 {
                let (u, v) = (i as f64 / k as f64, j as f64 / k as f64);
                a + (b - a) * u + (c - a) * v
            };
            for i in 0..k {
                for j in 0..(k - i) {
                    out.push_triangle(at(i, j), at(i + 1, j), at(i, j + 1), face);
                    if i + j + 1 < k {
                        out.push_triangle(at(i + 1, j), at(i + 1, j + 1), at(i, j + 1), face);
                    }
                }
            }
        }
        out
    }
}

/// Area of a single triangle.
pub fn triangle_area(a: &Point3, b: &Point3, c: &Point3) -> f64 {
    (b - a).cross(&(c - a)).norm() / 2.0
}

/// Unit normal of a triangle, or zero for a degenerate one.
pub fn triangle_normal(a: &Point3, b: &Point3, c: &Point3) -> Vec3 {
    let n = (b - a).cross(&(c - a));
    let len = n.norm();
    if len < 1e-300 {
        Vec3::zeros()
    } else {
        n / len
    }
}

/// Axis-aligned box as a closed mesh with six faces (ids 0..6).
pub fn box_mesh(min: Point3, max: Point3) -> TriangleMesh {
    let corner = |i: usize| {
        Point3::new(
            if i & 1 == 0 { min.x } else { max.x },
            if i & 2 == 0 { min.y } else { max.y },
            if i & 4 == 0 { min.z } else { max.z },
        )
    };
    let mut mesh = TriangleMesh::new();
    for i in 0..8 {
        mesh.add_vertex(corner(i));
    }
    // quads wound counter-clockwise seen from outside
    let quads: [[u32; 4]; 6] = [
        [0, 2, 3, 1], // -z
        [4, 5, 7, 6], // +z
        [0, 1, 5, 4], // -y
        [2, 6, 7, 3], // +y
        [0, 4, 6, 2], // -x
        [1, 3, 7, 5], // +x
    ];
    for (face, q) in quads.iter().enumerate() {
        mesh.add_triangle(q[0], q[1], q[2], face as u32);
        mesh.add_triangle(q[0], q[2], q[3], face as u32);
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cube() -> TriangleMesh {
        box_mesh(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_box_mesh_volume_and_faces() {
        let mesh = box_mesh(Point3::origin(), Point3::new(20.0, 20.0, 30.0));
        assert!((mesh.signed_volume() - 12000.0).abs() < 1e-9, "got {}", mesh.signed_volume());
        assert_eq!(mesh.face_count(), 6);
        let mut areas: Vec<f64> = mesh.face_areas().values().copied().collect();
        areas.sort_by(|a, b| a.total_cmp(b));
        assert!((areas[0] - 400.0).abs() < 1e-9);
        assert!((areas[5] - 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_surface_area() {
        assert!((unit_cube().surface_area() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_merge_offsets_indices() {
        let mut a = unit_cube();
        let mut b = unit_cube().transformed(&Transform::translation(5.0, 0.0, 0.0));
        b.offset_face_ids(6);
        a.merge(&b);
        assert_eq!(a.num_triangles(), 24);
        assert_eq!(a.face_count(), 12);
        assert!((a.volume() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_mirror_keeps_outward_orientation() {
        let mirror = Transform {
            matrix: nalgebra::Matrix4::new_nonuniform_scaling(&Vec3::new(-1.0, 1.0, 1.0)),
        };
        let mesh = unit_cube().transformed(&mirror);
        assert!(mesh.signed_volume() > 0.0);
    }

    #[test]
    fn test_center_of_mass() {
        let com = box_mesh(Point3::new(2.0, 2.0, 2.0), Point3::new(4.0, 6.0, 8.0)).center_of_mass();
        assert!((com - Point3::new(3.0, 4.0, 5.0)).norm() < 1e-9, "got {com:?}");
    }

    #[test]
    fn test_weld_merges_duplicates() {
        let mut soup = TriangleMesh::new();
        for ([a, b, c], f) in unit_cube().iter_triangles() {
            soup.push_triangle(a, b, c, f);
        }
        assert_eq!(soup.num_vertices(), 36);
        let welded = soup.welded(1e9);
        assert_eq!(welded.num_vertices(), 8);
        assert_eq!(welded.num_triangles(), 12);
    }

    #[test]
    fn test_refine_preserves_volume() {
        let mesh = box_mesh(Point3::origin(), Point3::new(10.0, 10.0, 10.0));
        let fine = mesh.refined(2.0);
        assert!(fine.num_triangles() > mesh.num_triangles());
        assert!((fine.volume() - 1000.0).abs() < 1e-6);
        for ([a, b, c], _) in fine.iter_triangles() {
            let longest = (b - a).norm().max((c - b).norm()).max((a - c).norm());
            assert!(longest <= 2.0 * 2f64.sqrt() + 1e-9);
        }
    }
}
