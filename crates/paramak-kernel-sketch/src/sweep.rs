//! Sweep operation: move a profile along a sampled path.
//!
//! The profile's local origin is carried to every path point. How the
//! section is oriented there depends on [`SweepMode`].

use paramak_kernel_math::{Dir3, Point3, Transform, Vec3};
use paramak_kernel_mesh::TriangleMesh;

use crate::loft::loft;
use crate::{SketchError, SketchProfile, Tessellation};

/// Orientation of the sections along a sweep path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepMode {
    /// Sections stay parallel to the sketch plane and are only translated.
    /// Every slice parallel to the sketch plane has the profile's outline.
    Parallel,
    /// Sections are turned to lie perpendicular to the path tangent at each
    /// path point, so the tube has the profile's outline in its own
    /// cross-section.
    Perpendicular,
}

/// Sweep a closed profile along `path`.
///
/// # Errors
///
/// - `DegeneratePath` if the path has fewer than two distinct points, or a
///   parallel sweep does not leave the sketch plane
/// - sampling errors from the profile
pub fn sweep(
    profile: &SketchProfile,
    path: &[Point3],
    mode: SweepMode,
    tess: &Tessellation,
) -> Result<TriangleMesh, SketchError> {
    let mut pts: Vec<Point3> = Vec::with_capacity(path.len());
    for p in path {
        if pts.last().map_or(true, |last| (p - last).norm() > 1e-9) {
            pts.push(*p);
        }
    }
    if pts.len() < 2 {
        return Err(SketchError::DegeneratePath);
    }

    let lp = profile.sample(tess)?;
    let local: Vec<Vec3> = lp.points.iter().map(|p| profile.to_3d(p) - profile.origin).collect();
    let normal = *profile.normal.as_ref();

    let (sections, forward) = match mode {
        SweepMode::Parallel => {
            let travel = (pts[pts.len() - 1] - pts[0]).dot(&normal);
            if travel.abs() < 1e-9 {
                return Err(SketchError::DegeneratePath);
            }
            let sections = pts
                .iter()
                .map(|c| local.iter().map(|v| c + v).collect())
                .collect::<Vec<Vec<Point3>>>();
            (sections, travel > 0.0)
        }
        SweepMode::Perpendicular => {
            let sections = (0..pts.len())
                .map(|k| {
                    let frame = align(&normal, &tangent(&pts, k), profile.x_dir.as_ref());
                    local.iter().map(|v| pts[k] + frame.apply_vec(v)).collect()
                })
                .collect::<Vec<Vec<Point3>>>();
            (sections, true)
        }
    };

    loft(&lp, &sections, profile.segments.len() as u32, false, forward)
}

/// Unit tangent at path point `k` by central differences.
fn tangent(pts: &[Point3], k: usize) -> Vec3 {
    let prev = pts[k.saturating_sub(1)];
    let next = pts[(k + 1).min(pts.len() - 1)];
    (next - prev).normalize()
}

/// Smallest rotation taking `from` onto `to`. Antiparallel vectors turn
/// half a revolution about `fallback`.
fn align(from: &Vec3, to: &Vec3, fallback: &Vec3) -> Transform {
    let axis = from.cross(to);
    let sin = axis.norm();
    let cos = from.dot(to);
    if sin < 1e-12 {
        if cos > 0.0 {
            return Transform::identity();
        }
        return Transform::rotation_about_axis(&Dir3::new_normalize(*fallback), std::f64::consts::PI);
    }
    Transform::rotation_about_axis(&Dir3::new_normalize(axis), sin.atan2(cos))
}
