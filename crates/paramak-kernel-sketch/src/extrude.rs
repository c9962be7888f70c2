//! Extrude operation: create a solid by sweeping a profile along a vector.

use paramak_kernel_math::Vec3;
use paramak_kernel_mesh::TriangleMesh;

use crate::loft::loft;
use crate::{SketchError, SketchProfile, Tessellation};

/// Extrude a closed profile along a direction vector.
///
/// The bottom cap lies on the sketch plane and the top cap at
/// `origin + direction`. The direction does not need to be normal to the
/// sketch plane, but it must not lie in it.
///
/// # Errors
///
/// - `ZeroExtrusion` if the direction is zero or parallel to the sketch plane
/// - sampling errors from the profile
pub fn extrude(
    profile: &SketchProfile,
    direction: Vec3,
    tess: &Tessellation,
) -> Result<TriangleMesh, SketchError> {
    let along_normal = direction.dot(profile.normal.as_ref());
    if direction.norm() < 1e-12 || along_normal.abs() < 1e-12 {
        return Err(SketchError::ZeroExtrusion);
    }

    let lp = profile.sample(tess)?;
    let bottom: Vec<_> = lp.points.iter().map(|p| profile.to_3d(p)).collect();
    let top: Vec<_> = bottom.iter().map(|p| p + direction).collect();
    loft(
        &lp,
        &[bottom, top],
        profile.segments.len() as u32,
        false,
        along_normal > 0.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SketchSegment, Tessellation};
    use paramak_kernel_math::{Point2, Point3};

    #[test]
    fn test_extrude_rectangle() {
        let profile = SketchProfile::rectangle(Point3::origin(), Vec3::x(), Vec3::y(), 20.0, 20.0);
        let mesh = extrude(&profile, Vec3::new(0.0, 0.0, 30.0), &Tessellation::default()).unwrap();
        assert!((mesh.signed_volume() - 12000.0).abs() < 1e-6);
        let mut areas: Vec<f64> = mesh.face_areas().values().copied().collect();
        areas.sort_by(|a, b| a.total_cmp(b));
        let expected = [400.0, 400.0, 600.0, 600.0, 600.0, 600.0];
        for (a, e) in areas.iter().zip(expected) {
            assert!((a - e).abs() < 1e-6, "expected {e}, got {a}");
        }
    }

    #[test]
    fn test_extrude_against_normal_stays_outward() {
        let profile = SketchProfile::rectangle(Point3::origin(), Vec3::x(), Vec3::y(), 2.0, 3.0);
        let mesh = extrude(&profile, Vec3::new(0.0, 0.0, -4.0), &Tessellation::default()).unwrap();
        assert!((mesh.signed_volume() - 24.0).abs() < 1e-9);
        assert!(mesh.bounding_box().min.z < -3.9);
    }

    #[test]
    fn test_extrude_circle() {
        let profile = SketchProfile::circle(Point3::origin(), Vec3::x(), Vec3::y(), Point2::new(30.0, 0.0), 10.0);
        let mesh = extrude(&profile, Vec3::new(0.0, 0.0, 20.0), &Tessellation::default()).unwrap();
        let exact = std::f64::consts::PI * 100.0 * 20.0;
        assert!((mesh.volume() - exact).abs() / exact < 1e-3);
        assert_eq!(mesh.face_count(), 3);
    }

    #[test]
    fn test_extrude_spline_profile() {
        let profile = SketchProfile::new(
            Point3::origin(),
            Vec3::x(),
            Vec3::y(),
            vec![
                SketchSegment::Spline {
                    points: vec![Point2::new(0.0, 0.0), Point2::new(5.0, 3.0), Point2::new(10.0, 0.0)],
                },
                SketchSegment::Line {
                    start: Point2::new(10.0, 0.0),
                    end: Point2::new(0.0, 0.0),
                },
            ],
        )
        .unwrap();
        let mesh = extrude(&profile, Vec3::new(0.0, 0.0, 1.0), &Tessellation::default()).unwrap();
        assert_eq!(mesh.face_count(), 4);
        assert!(mesh.volume() > 15.0);
    }

    #[test]
    fn test_extrude_in_plane_rejected() {
        let profile = SketchProfile::rectangle(Point3::origin(), Vec3::x(), Vec3::y(), 1.0, 1.0);
        let err = extrude(&profile, Vec3::new(1.0, 0.0, 0.0), &Tessellation::default()).unwrap_err();
        assert!(matches!(err, SketchError::ZeroExtrusion));
    }
}
