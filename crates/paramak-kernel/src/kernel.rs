//! The kernel seam: everything the parametric layer asks of a geometry
//! kernel goes through [`Kernel`].

use std::cell::RefCell;
use std::rc::Rc;

use paramak_kernel_math::{Aabb3, Point3, Vec3};
use paramak_kernel_sketch::{SketchError, SketchProfile, SketchSegment, SweepMode, Tessellation};
use thiserror::Error;

use crate::Solid;

/// Errors reported by a kernel.
#[derive(Debug, Clone, Error)]
pub enum KernelError {
    /// A sketch could not be turned into a wire or solid.
    #[error(transparent)]
    Sketch(#[from] SketchError),

    /// An operation produced no geometry.
    #[error("{0} produced an empty solid")]
    EmptyResult(&'static str),

    /// Inputs the kernel refuses outright.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// A placed 2D coordinate frame: local u maps to `x_dir`, local v to `y_dir`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Frame origin in 3D.
    pub origin: Point3,
    /// Direction of local u.
    pub x_dir: Vec3,
    /// Direction of local v.
    pub y_dir: Vec3,
}

impl Frame {
    /// Unit normal of the frame (x_dir × y_dir).
    pub fn normal(&self) -> Vec3 {
        self.x_dir.cross(&self.y_dir).normalize()
    }

    /// The same frame moved to a new origin.
    pub fn with_origin(&self, origin: Point3) -> Self {
        Self { origin, ..*self }
    }
}

/// Narrow interface to a solid-modelling kernel.
///
/// Angles are in degrees. Implementations are not expected to be
/// re-entrant; the engine holds one per thread (see [`current_kernel`]).
pub trait Kernel {
    /// Stable identifier, folded into shape fingerprints so cached solids
    /// from one kernel are never served for another.
    fn fingerprint(&self) -> String;

    /// Turn connected 2D segments on a frame into a closed wire.
    fn build_wire(&self, segments: Vec<SketchSegment>, frame: &Frame)
        -> Result<SketchProfile, KernelError>;

    /// Discretised outline of a wire in 3D, closed (last point equals first).
    fn wire_points(&self, wire: &SketchProfile) -> Result<Vec<Point3>, KernelError>;

    /// Revolve the face bounded by `wire` about an axis.
    fn revolve(
        &self,
        wire: &SketchProfile,
        axis_origin: Point3,
        axis_dir: Vec3,
        angle_deg: f64,
    ) -> Result<Solid, KernelError>;

    /// Extrude the face bounded by `wire` by `distance` along its normal,
    /// either one-sided or symmetric about the wire's plane.
    fn extrude(&self, wire: &SketchProfile, distance: f64, both: bool)
        -> Result<Solid, KernelError>;

    /// Sweep the face bounded by `wire` along a polyline path.
    fn sweep(&self, wire: &SketchProfile, path: &[Point3], mode: SweepMode)
        -> Result<Solid, KernelError>;

    /// Boolean difference.
    fn boolean_cut(&self, a: &Solid, b: &Solid) -> Result<Solid, KernelError>;

    /// Boolean union.
    fn boolean_union(&self, a: &Solid, b: &Solid) -> Result<Solid, KernelError>;

    /// Boolean intersection.
    fn boolean_intersect(&self, a: &Solid, b: &Solid) -> Result<Solid, KernelError>;

    /// Rotate about the line through `origin` along `axis`.
    fn rotate(&self, solid: &Solid, origin: Point3, axis: Vec3, angle_deg: f64) -> Solid;

    /// Enclosed volume.
    fn volume(&self, solid: &Solid) -> f64 {
        solid.volume()
    }

    /// Total surface area.
    fn area(&self, solid: &Solid) -> f64 {
        solid.surface_area()
    }

    /// Area of every face.
    fn faces(&self, solid: &Solid) -> Vec<f64> {
        solid.face_areas()
    }

    /// Axis-aligned bounding box.
    fn bounding_box(&self, solid: &Solid) -> Aabb3 {
        solid.bounding_box()
    }
}

/// In-process kernel over faceted solids and BSP booleans.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshKernel {
    /// Discretisation of curved edges and revolutions.
    pub tessellation: Tessellation,
}

impl MeshKernel {
    /// Kernel with a custom discretisation.
    pub fn with_tessellation(tessellation: Tessellation) -> Self {
        Self { tessellation }
    }
}

impl Kernel for MeshKernel {
    fn fingerprint(&self) -> String {
        format!(
            "mesh/{}/{}",
            self.tessellation.segments_per_turn, self.tessellation.spline_subdivisions
        )
    }

    fn build_wire(
        &self,
        segments: Vec<SketchSegment>,
        frame: &Frame,
    ) -> Result<SketchProfile, KernelError> {
        Ok(SketchProfile::new(
            frame.origin,
            frame.x_dir,
            frame.y_dir,
            segments,
        )?)
    }

    fn wire_points(&self, wire: &SketchProfile) -> Result<Vec<Point3>, KernelError> {
        let lp = wire.sample(&self.tessellation)?;
        let mut pts: Vec<Point3> = lp.points.iter().map(|p| wire.to_3d(p)).collect();
        if let Some(first) = pts.first().copied() {
            pts.push(first);
        }
        Ok(pts)
    }

    fn revolve(
        &self,
        wire: &SketchProfile,
        axis_origin: Point3,
        axis_dir: Vec3,
        angle_deg: f64,
    ) -> Result<Solid, KernelError> {
        let mesh = paramak_kernel_sketch::revolve(
            wire,
            axis_origin,
            axis_dir,
            angle_deg.to_radians(),
            &self.tessellation,
        )?;
        non_empty(Solid::from_mesh(mesh), "revolve")
    }

    fn extrude(
        &self,
        wire: &SketchProfile,
        distance: f64,
        both: bool,
    ) -> Result<Solid, KernelError> {
        let normal = *wire.normal.as_ref();
        let mesh = if both {
            let mut start = wire.clone();
            start.origin -= normal * (distance / 2.0);
            paramak_kernel_sketch::extrude(&start, normal * distance, &self.tessellation)?
        } else {
            paramak_kernel_sketch::extrude(wire, normal * distance, &self.tessellation)?
        };
        non_empty(Solid::from_mesh(mesh), "extrude")
    }

    fn sweep(
        &self,
        wire: &SketchProfile,
        path: &[Point3],
        mode: SweepMode,
    ) -> Result<Solid, KernelError> {
        let mesh = paramak_kernel_sketch::sweep(wire, path, mode, &self.tessellation)?;
        non_empty(Solid::from_mesh(mesh), "sweep")
    }

    fn boolean_cut(&self, a: &Solid, b: &Solid) -> Result<Solid, KernelError> {
        non_empty(a.difference(b), "cut")
    }

    fn boolean_union(&self, a: &Solid, b: &Solid) -> Result<Solid, KernelError> {
        non_empty(a.union(b), "union")
    }

    fn boolean_intersect(&self, a: &Solid, b: &Solid) -> Result<Solid, KernelError> {
        non_empty(a.intersection(b), "intersect")
    }

    fn rotate(&self, solid: &Solid, origin: Point3, axis: Vec3, angle_deg: f64) -> Solid {
        solid.rotate(origin, axis, angle_deg)
    }
}

fn non_empty(solid: Solid, op: &'static str) -> Result<Solid, KernelError> {
    if solid.is_empty() || solid.volume() <= 0.0 {
        Err(KernelError::EmptyResult(op))
    } else {
        Ok(solid)
    }
}

thread_local! {
    static KERNEL: RefCell<Rc<dyn Kernel>> = RefCell::new(Rc::new(MeshKernel::default()));
}

/// The kernel used by the calling thread. Defaults to [`MeshKernel`].
pub fn current_kernel() -> Rc<dyn Kernel> {
    KERNEL.with(|k| Rc::clone(&k.borrow()))
}

/// Replace the calling thread's kernel, returning the previous one.
pub fn install_kernel(kernel: Rc<dyn Kernel>) -> Rc<dyn Kernel> {
    tracing::debug!(fingerprint = %kernel.fingerprint(), "installing kernel");
    KERNEL.with(|k| std::mem::replace(&mut *k.borrow_mut(), kernel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use paramak_kernel_math::Point2;

    fn xz_frame() -> Frame {
        Frame {
            origin: Point3::origin(),
            x_dir: Vec3::x(),
            y_dir: Vec3::z(),
        }
    }

    fn square(size: f64) -> Vec<SketchSegment> {
        let p = [
            Point2::new(0.0, 0.0),
            Point2::new(0.0, size),
            Point2::new(size, size),
            Point2::new(size, 0.0),
        ];
        (0..4)
            .map(|i| SketchSegment::Line {
                start: p[i],
                end: p[(i + 1) % 4],
            })
            .collect()
    }

    #[test]
    fn test_revolve_full_square() {
        let k = MeshKernel::default();
        let wire = k.build_wire(square(20.0), &xz_frame()).unwrap();
        let s = k.revolve(&wire, Point3::origin(), Vec3::z(), 360.0).unwrap();
        let exact = std::f64::consts::PI * 400.0 * 20.0;
        assert!((s.volume() - exact).abs() / exact < 0.01);
    }

    #[test]
    fn test_extrude_both_is_centred() {
        let k = MeshKernel::default();
        let wire = k.build_wire(square(20.0), &xz_frame()).unwrap();
        let s = k.extrude(&wire, 30.0, true).unwrap();
        assert!((s.volume() - 12000.0).abs() < 1e-6);
        let bb = s.bounding_box();
        assert!((bb.min.y + 15.0).abs() < 1e-9);
        assert!((bb.max.y - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_wire_points_closed() {
        let k = MeshKernel::default();
        let wire = k.build_wire(square(10.0), &xz_frame()).unwrap();
        let pts = k.wire_points(&wire).unwrap();
        assert_eq!(pts.len(), 5);
        assert_eq!(pts[0], pts[4]);
    }

    #[test]
    fn test_cut_everything_is_empty_result() {
        let k = MeshKernel::default();
        let a = Solid::cuboid([0.0; 3], [1.0; 3]);
        let b = Solid::cuboid([-1.0; 3], [2.0; 3]);
        assert!(matches!(
            k.boolean_cut(&a, &b),
            Err(KernelError::EmptyResult("cut"))
        ));
    }

    #[test]
    fn test_install_kernel_swaps() {
        let fine = MeshKernel::with_tessellation(Tessellation {
            segments_per_turn: 180,
            spline_subdivisions: 8,
        });
        let previous = install_kernel(Rc::new(fine));
        assert_eq!(current_kernel().fingerprint(), "mesh/180/8");
        install_kernel(previous);
        assert_eq!(current_kernel().fingerprint(), "mesh/90/6");
    }
}
