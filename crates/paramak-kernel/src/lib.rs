#![warn(missing_docs)]

//! Solid facade and kernel seam for the paramak geometry engine.
//!
//! Provides the [`Solid`] type, a compound of closed faceted bodies, and
//! the narrow [`Kernel`] trait through which the parametric layer builds
//! wires, revolves, extrudes, sweeps and combines them. [`MeshKernel`] is
//! the in-process implementation over the sketch and boolean crates.
//!
//! # Example
//!
//! ```
//! use paramak_kernel::Solid;
//!
//! let a = Solid::cuboid([0.0, 0.0, 0.0], [10.0, 10.0, 10.0]);
//! let b = Solid::cuboid([5.0, 0.0, 0.0], [15.0, 10.0, 10.0]);
//! let cut = a.difference(&b);
//! assert!((cut.volume() - 500.0).abs() < 1e-6);
//! ```

mod kernel;

pub use kernel::{current_kernel, install_kernel, Frame, Kernel, KernelError, MeshKernel};

pub use paramak_kernel_booleans;
pub use paramak_kernel_math;
pub use paramak_kernel_mesh;
pub use paramak_kernel_sketch;
pub use paramak_kernel_step;

use paramak_kernel_booleans::{boolean, BooleanOp};
use paramak_kernel_math::{Aabb3, Dir3, Point3, Transform, Vec3};
use paramak_kernel_mesh::{box_mesh, TriangleMesh};

/// A 3D solid: a compound of closed, outward-oriented faceted bodies.
///
/// Bodies whose bounding boxes are disjoint are kept apart rather than
/// merged, so a union of separated parts stays a compound with one volume
/// per part.
#[derive(Debug, Clone, Default)]
pub struct Solid {
    bodies: Vec<TriangleMesh>,
}

impl Solid {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create an empty solid.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap a single closed mesh. Empty meshes give an empty solid.
    pub fn from_mesh(mesh: TriangleMesh) -> Self {
        if mesh.is_empty() {
            Self::empty()
        } else {
            Self { bodies: vec![mesh] }
        }
    }

    /// Gather several solids into one compound without combining them.
    pub fn compound<'a>(parts: impl IntoIterator<Item = &'a Solid>) -> Self {
        Self {
            bodies: parts
                .into_iter()
                .flat_map(|s| s.bodies.iter().cloned())
                .collect(),
        }
    }

    /// Axis-aligned box between two corners.
    pub fn cuboid(min: [f64; 3], max: [f64; 3]) -> Self {
        Self::from_mesh(box_mesh(
            Point3::new(min[0], min[1], min[2]),
            Point3::new(max[0], max[1], max[2]),
        ))
    }

    // =========================================================================
    // CSG boolean operations
    // =========================================================================

    /// Boolean union (self ∪ other).
    pub fn union(&self, other: &Solid) -> Solid {
        let mut bodies = self.bodies.clone();
        for body in &other.bodies {
            let mut merged = body.clone();
            let mut rest = Vec::with_capacity(bodies.len());
            for existing in bodies {
                if existing.bounding_box().overlaps(&merged.bounding_box()) {
                    merged = boolean(&existing, &merged, BooleanOp::Union);
                } else {
                    rest.push(existing);
                }
            }
            rest.push(merged);
            bodies = rest;
        }
        Solid { bodies }
    }

    /// Boolean difference (self − other).
    pub fn difference(&self, other: &Solid) -> Solid {
        let mut bodies = Vec::with_capacity(self.bodies.len());
        for body in &self.bodies {
            let mut current = body.clone();
            for tool in &other.bodies {
                if current.is_empty() {
                    break;
                }
                if current.bounding_box().overlaps(&tool.bounding_box()) {
                    current = boolean(&current, tool, BooleanOp::Difference);
                }
            }
            if !current.is_empty() {
                bodies.push(current);
            }
        }
        Solid { bodies }
    }

    /// Boolean intersection (self ∩ other).
    pub fn intersection(&self, other: &Solid) -> Solid {
        let mut bodies = Vec::new();
        for a in &self.bodies {
            for b in &other.bodies {
                if !a.bounding_box().overlaps(&b.bounding_box()) {
                    continue;
                }
                let common = boolean(a, b, BooleanOp::Intersection);
                if !common.is_empty() {
                    bodies.push(common);
                }
            }
        }
        Solid { bodies }
    }

    // =========================================================================
    // Transforms
    // =========================================================================

    /// Translate the solid by `(x, y, z)`.
    pub fn translate(&self, x: f64, y: f64, z: f64) -> Solid {
        self.apply_transform(&Transform::translation(x, y, z))
    }

    /// Rotate the solid by `angle_deg` degrees about the line through
    /// `origin` along `axis`. A zero axis leaves the solid unchanged.
    pub fn rotate(&self, origin: Point3, axis: Vec3, angle_deg: f64) -> Solid {
        if axis.norm() < 1e-12 || angle_deg == 0.0 {
            return self.clone();
        }
        let axis = Dir3::new_normalize(axis);
        self.apply_transform(&Transform::rotation_about_line(
            &origin,
            &axis,
            angle_deg.to_radians(),
        ))
    }

    /// Apply a rigid or scaling transform to every body.
    pub fn apply_transform(&self, transform: &Transform) -> Solid {
        Solid {
            bodies: self
                .bodies
                .iter()
                .map(|b| b.transformed(transform))
                .collect(),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Check if the solid is empty (has no geometry).
    pub fn is_empty(&self) -> bool {
        self.bodies.iter().all(|b| b.is_empty())
    }

    /// The separate bodies of the compound.
    pub fn bodies(&self) -> &[TriangleMesh] {
        &self.bodies
    }

    /// Number of bodies in the compound.
    pub fn num_bodies(&self) -> usize {
        self.bodies.len()
    }

    /// All bodies merged into one mesh; face ids are made unique per body.
    pub fn to_mesh(&self) -> TriangleMesh {
        let mut out = TriangleMesh::new();
        for body in &self.bodies {
            let mut b = body.clone();
            b.offset_face_ids(out.face_id_bound());
            out.merge(&b);
        }
        out
    }

    /// Total enclosed volume.
    pub fn volume(&self) -> f64 {
        self.bodies.iter().map(|b| b.volume()).sum()
    }

    /// Volume of each body.
    pub fn volumes(&self) -> Vec<f64> {
        self.bodies.iter().map(|b| b.volume()).collect()
    }

    /// Total surface area.
    pub fn surface_area(&self) -> f64 {
        self.bodies.iter().map(|b| b.surface_area()).sum()
    }

    /// Area of each face, body by body, in face id order.
    pub fn face_areas(&self) -> Vec<f64> {
        self.bodies
            .iter()
            .flat_map(|b| {
                b.face_areas()
                    .into_values()
                    .filter(|a| *a > 1e-9)
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Number of faces with non-zero area.
    pub fn face_count(&self) -> usize {
        self.bodies.iter().map(|b| b.face_count()).sum()
    }

    /// Axis-aligned bounding box of all bodies.
    pub fn bounding_box(&self) -> Aabb3 {
        let mut bb = Aabb3::empty();
        for body in &self.bodies {
            bb.include_box(&body.bounding_box());
        }
        bb
    }

    /// Largest absolute coordinate of the bounding box.
    pub fn largest_dimension(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.bounding_box().largest_abs_coordinate()
        }
    }

    /// Volume-weighted centroid of all bodies.
    pub fn center_of_mass(&self) -> Point3 {
        let total = self.volume();
        if total <= 0.0 {
            return Point3::origin();
        }
        let mut acc = Vec3::zeros();
        for body in &self.bodies {
            acc += body.center_of_mass().coords * body.volume();
        }
        Point3::from(acc / total)
    }

    /// Number of triangles over all bodies.
    pub fn num_triangles(&self) -> usize {
        self.bodies.iter().map(|b| b.num_triangles()).sum()
    }
}
