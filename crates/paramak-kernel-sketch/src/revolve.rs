//! Revolve operation: create a solid by rotating a profile around an axis.

use std::f64::consts::TAU;

use paramak_kernel_math::{Dir3, Point3, Transform, Vec3};
use paramak_kernel_mesh::TriangleMesh;

use crate::loft::loft;
use crate::{SketchError, SketchProfile, Tessellation};

/// Revolve a closed profile around an axis.
///
/// # Arguments
///
/// * `profile` - The closed 2D profile to revolve
/// * `axis_origin` - A point on the axis of revolution
/// * `axis_dir` - Direction of the axis of revolution
/// * `angle` - Angle of revolution in radians, in (0, 2π]
///
/// A full turn joins the last section back to the first; any smaller angle
/// closes the solid with two planar end caps. Profile edges lying on the
/// axis collapse and contribute no face.
///
/// # Errors
///
/// - `ZeroAxis` if the axis direction is zero
/// - `InvalidAngle` if angle is not in (0, 2π]
/// - `AxisIntersection` if the profile lies on both sides of an in-plane axis
pub fn revolve(
    profile: &SketchProfile,
    axis_origin: Point3,
    axis_dir: Vec3,
    angle: f64,
    tess: &Tessellation,
) -> Result<TriangleMesh, SketchError> {
    if axis_dir.norm() < 1e-12 {
        return Err(SketchError::ZeroAxis);
    }
    if !(angle > 0.0 && angle <= TAU + 1e-12) {
        return Err(SketchError::InvalidAngle(angle));
    }
    let axis = Dir3::new_normalize(axis_dir);
    let full = (angle - TAU).abs() < 1e-9;

    let lp = profile.sample(tess)?;
    let base: Vec<Point3> = lp.points.iter().map(|p| profile.to_3d(p)).collect();

    // when the axis lies in the sketch plane the profile must stay on one side
    let normal = profile.normal.as_ref();
    if axis.as_ref().dot(normal).abs() < 1e-9 {
        let radial = normal.cross(axis.as_ref()).normalize();
        let tol = 1e-6 * (1.0 + base.iter().map(|p| (p - axis_origin).norm()).fold(0.0, f64::max));
        let sides: Vec<f64> = base.iter().map(|p| (p - axis_origin).dot(&radial)).collect();
        let positive = sides.iter().any(|&s| s > tol);
        let negative = sides.iter().any(|&s| s < -tol);
        if positive && negative {
            return Err(SketchError::AxisIntersection);
        }
    }

    let steps = tess.segments_for_angle(angle).max(if full { 3 } else { 1 });
    let count = if full { steps } else { steps + 1 };
    let sections: Vec<Vec<Point3>> = (0..count)
        .map(|k| {
            let t = Transform::rotation_about_line(&axis_origin, &axis, angle * k as f64 / steps as f64);
            base.iter().map(|p| t.apply_point(p)).collect()
        })
        .collect();

    // rotating about +axis moves the profile along axis × r
    let centroid = base.iter().fold(Vec3::zeros(), |acc, p| acc + p.coords) / base.len() as f64;
    let velocity = axis.as_ref().cross(&(Point3::from(centroid) - axis_origin));
    let forward = velocity.dot(normal) >= 0.0;

    loft(&lp, &sections, profile.segments.len() as u32, full, forward)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SketchSegment;
    use paramak_kernel_math::Point2;
    use std::f64::consts::PI;

    fn xz_profile(corners: &[(f64, f64)]) -> SketchProfile {
        let n = corners.len();
        let segments = (0..n)
            .map(|i| SketchSegment::Line {
                start: Point2::new(corners[i].0, corners[i].1),
                end: Point2::new(corners[(i + 1) % n].0, corners[(i + 1) % n].1),
            })
            .collect();
        SketchProfile::new(Point3::origin(), Vec3::x(), Vec3::z(), segments).unwrap()
    }

    #[test]
    fn test_revolve_rectangle_touching_axis() {
        let profile = xz_profile(&[(0.0, 0.0), (0.0, 20.0), (20.0, 20.0), (20.0, 0.0)]);
        let mesh = revolve(&profile, Point3::origin(), Vec3::z(), TAU, &Tessellation::default()).unwrap();
        let exact = PI * 400.0 * 20.0;
        let v = mesh.signed_volume();
        assert!((v - exact).abs() / exact < 1e-3, "expected {exact}, got {v}");
        // the edge on the axis collapses: outer wall plus two discs
        assert_eq!(mesh.face_count(), 3);
    }

    #[test]
    fn test_revolve_annulus() {
        let profile = xz_profile(&[(5.0, -7.5), (10.0, -7.5), (10.0, 7.5), (5.0, 7.5)]);
        let mesh = revolve(&profile, Point3::origin(), Vec3::z(), TAU, &Tessellation::default()).unwrap();
        let exact = PI * (100.0 - 25.0) * 15.0;
        assert!((mesh.volume() - exact).abs() / exact < 1e-3);
        assert_eq!(mesh.face_count(), 4);
    }

    #[test]
    fn test_partial_revolve_scales_with_angle() {
        let profile = xz_profile(&[(5.0, -7.5), (10.0, -7.5), (10.0, 7.5), (5.0, 7.5)]);
        let tess = Tessellation::default();
        let full = revolve(&profile, Point3::origin(), Vec3::z(), TAU, &tess).unwrap().volume();
        let half = revolve(&profile, Point3::origin(), Vec3::z(), PI, &tess).unwrap();
        assert!((half.volume() - full / 2.0).abs() / full < 1e-6);
        // four walls plus two end caps
        assert_eq!(half.face_count(), 6);
        assert!(half.signed_volume() > 0.0);
    }

    #[test]
    fn test_revolve_arc_profile() {
        // half disc on the axis revolves into a sphere
        let profile = SketchProfile::new(
            Point3::origin(),
            Vec3::x(),
            Vec3::z(),
            vec![
                SketchSegment::Arc {
                    start: Point2::new(0.0, -10.0),
                    mid: Point2::new(10.0, 0.0),
                    end: Point2::new(0.0, 10.0),
                },
                SketchSegment::Line {
                    start: Point2::new(0.0, 10.0),
                    end: Point2::new(0.0, -10.0),
                },
            ],
        )
        .unwrap();
        let mesh = revolve(&profile, Point3::origin(), Vec3::z(), TAU, &Tessellation::default()).unwrap();
        let exact = 4.0 / 3.0 * PI * 1000.0;
        assert!((mesh.volume() - exact).abs() / exact < 3e-3, "got {}", mesh.volume());
    }

    #[test]
    fn test_profile_crossing_axis_rejected() {
        let profile = xz_profile(&[(-5.0, 0.0), (5.0, 0.0), (5.0, 5.0), (-5.0, 5.0)]);
        let err = revolve(&profile, Point3::origin(), Vec3::z(), TAU, &Tessellation::default()).unwrap_err();
        assert!(matches!(err, SketchError::AxisIntersection));
    }

    #[test]
    fn test_invalid_angles_rejected() {
        let profile = xz_profile(&[(5.0, 0.0), (10.0, 0.0), (10.0, 5.0), (5.0, 5.0)]);
        let tess = Tessellation::default();
        assert!(matches!(
            revolve(&profile, Point3::origin(), Vec3::z(), 0.0, &tess),
            Err(SketchError::InvalidAngle(_))
        ));
        assert!(matches!(
            revolve(&profile, Point3::origin(), Vec3::z(), 7.0, &tess),
            Err(SketchError::InvalidAngle(_))
        ));
        assert!(matches!(
            revolve(&profile, Point3::origin(), Vec3::zeros(), PI, &tess),
            Err(SketchError::ZeroAxis)
        ));
    }
}
