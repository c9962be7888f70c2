#![warn(missing_docs)]

//! Sketch-based operations for the paramak kernel.
//!
//! A [`SketchProfile`] is a closed loop of line, spline, arc and circle
//! segments on a plane in 3D. The generators in this crate turn it into a
//! closed, outward-oriented [`TriangleMesh`](paramak_kernel_mesh::TriangleMesh):
//!
//! * [`extrude`] along a vector,
//! * [`revolve`] about an axis by an angle in (0, 2π],
//! * [`sweep`] along a sampled path, either keeping sections parallel to the
//!   sketch plane or turning them perpendicular to the path.
//!
//! Each profile segment becomes one logical face of the result; end caps get
//! their own face ids after the segments.
//!
//! # Example
//!
//! ```
//! use paramak_kernel_sketch::{extrude, SketchProfile, Tessellation};
//! use paramak_kernel_math::{Point3, Vec3};
//!
//! let profile = SketchProfile::rectangle(Point3::origin(), Vec3::x(), Vec3::y(), 20.0, 20.0);
//! let mesh = extrude(&profile, Vec3::new(0.0, 0.0, 30.0), &Tessellation::default()).unwrap();
//! assert!((mesh.volume() - 12000.0).abs() < 1e-6);
//! assert_eq!(mesh.face_count(), 6);
//! ```

mod cap;
pub mod curve;
mod extrude;
mod loft;
mod profile;
mod revolve;
mod sweep;

pub use extrude::extrude;
pub use profile::{ProfileLoop, SketchProfile, SketchSegment};
pub use revolve::revolve;
pub use sweep::{sweep, SweepMode};

use thiserror::Error;

/// Errors from sketch-based operations.
#[derive(Debug, Clone, Error)]
pub enum SketchError {
    /// The profile is not closed (gap between first and last segment).
    #[error("profile is not closed: gap of {0:.6}")]
    NotClosed(f64),

    /// A segment is degenerate (zero length).
    #[error("degenerate segment at index {0}")]
    DegenerateSegment(usize),

    /// The three points of an arc are collinear.
    #[error("arc at index {0} is defined by collinear points")]
    CollinearArc(usize),

    /// Extrusion direction has zero length or lies in the sketch plane.
    #[error("extrusion direction is zero or parallel to the sketch plane")]
    ZeroExtrusion,

    /// Revolution axis has zero length.
    #[error("revolution axis is zero")]
    ZeroAxis,

    /// Revolution angle is invalid (must be in (0, 2π]).
    #[error("invalid revolution angle: {0} radians")]
    InvalidAngle(f64),

    /// Profile lies on both sides of the revolution axis.
    #[error("profile crosses the revolution axis")]
    AxisIntersection,

    /// Profile has no segments.
    #[error("profile has no segments")]
    EmptyProfile,

    /// The sweep path has fewer than two distinct points.
    #[error("sweep path is degenerate")]
    DegeneratePath,

    /// The cap polygon could not be triangulated.
    #[error("cap triangulation failed: {0}")]
    Triangulation(String),
}

/// Discretisation settings for curved geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tessellation {
    /// Segments per full turn for arcs, circles and revolutions.
    pub segments_per_turn: u32,
    /// Sub-segments per span of a spline.
    pub spline_subdivisions: u32,
}

impl Default for Tessellation {
    fn default() -> Self {
        Self {
            segments_per_turn: 90,
            spline_subdivisions: 6,
        }
    }
}

impl Tessellation {
    /// Number of segments used to sweep `angle` radians (at least one).
    pub fn segments_for_angle(&self, angle: f64) -> usize {
        let turns = angle.abs() / std::f64::consts::TAU;
        ((turns * self.segments_per_turn as f64).ceil() as usize).max(1)
    }
}
