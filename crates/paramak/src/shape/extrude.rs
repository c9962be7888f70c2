//! Extruded shapes.

use super::rotate::check_rotation_angle;
use super::{Construction, ParametricShape, Profile, ShapeCore, ShapeVariant};
use crate::error::{positive, ParamakError, Result};
use crate::polyline::Polyline;
use crate::utils::Point;

/// A profile extruded along its workplane normal.
///
/// One-sided extrusions run against the normal, so an `XZ` profile grows
/// towards +Y. With `extrude_both` the solid is centred on the workplane.
/// A `rotation_angle` below 360 keeps only that sector about the rotation
/// axis.
#[derive(Debug)]
pub struct ExtrudeShape {
    core: ShapeCore,
    variant: ShapeVariant,
    profile: Profile,
    distance: f64,
    extrude_both: bool,
    rotation_angle: f64,
    extrusion_start_offset: f64,
}

impl ExtrudeShape {
    fn with_profile(variant: ShapeVariant, profile: Profile, distance: f64) -> Result<Self> {
        variant.check(&profile)?;
        positive("distance", distance)?;
        Ok(Self {
            core: ShapeCore::new(format!("Extrude{}Shape", variant.label())),
            variant,
            profile,
            distance,
            extrude_both: true,
            rotation_angle: 360.0,
            extrusion_start_offset: 0.0,
        })
    }

    /// Any connection-typed outline.
    pub fn mixed(points: Polyline, distance: f64) -> Result<Self> {
        Self::with_profile(ShapeVariant::Mixed, Profile::Polyline(points), distance)
    }

    /// Several outlines extruded together.
    pub fn compound(parts: Vec<Profile>, distance: f64) -> Result<Self> {
        Self::with_profile(ShapeVariant::Mixed, Profile::Compound(parts), distance)
    }

    /// Points joined by straight edges.
    pub fn straight(points: &[Point], distance: f64) -> Result<Self> {
        Self::with_profile(ShapeVariant::Straight, ShapeVariant::Straight.profile(points)?, distance)
    }

    /// Points on one closed spline.
    pub fn spline(points: &[Point], distance: f64) -> Result<Self> {
        Self::with_profile(ShapeVariant::Spline, ShapeVariant::Spline.profile(points)?, distance)
    }

    /// A circle, extruded into a cylinder.
    pub fn circle(center: Point, radius: f64, distance: f64) -> Result<Self> {
        Self::with_profile(ShapeVariant::Circle, Profile::Circle { center, radius }, distance)
    }

    /// Extrusion length.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Set the extrusion length.
    pub fn set_distance(&mut self, distance: f64) -> Result<()> {
        positive("distance", distance)?;
        self.distance = distance;
        Ok(())
    }

    /// Extrude to one side only (`false`) or symmetrically (`true`).
    pub fn with_extrude_both(mut self, both: bool) -> Self {
        self.extrude_both = both;
        self
    }

    /// Keep only `angle` degrees about the rotation axis.
    pub fn with_rotation_angle(mut self, angle: f64) -> Result<Self> {
        check_rotation_angle(angle)?;
        self.rotation_angle = angle;
        Ok(self)
    }

    /// Move the start plane along the extrusion direction.
    pub fn with_extrusion_start_offset(mut self, offset: f64) -> Result<Self> {
        if !offset.is_finite() {
            return Err(ParamakError::out_of_range(
                "extrusion_start_offset",
                offset,
                f64::MIN,
                f64::MAX,
            ));
        }
        self.extrusion_start_offset = offset;
        Ok(self)
    }

    /// Replace the outline, keeping the variant's connection rules.
    pub fn set_profile(&mut self, profile: Profile) -> Result<()> {
        self.variant.check(&profile)?;
        self.profile = profile;
        Ok(())
    }
}

impl ParametricShape for ExtrudeShape {
    fn core(&self) -> &ShapeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ShapeCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        match self.variant {
            ShapeVariant::Mixed => "ExtrudeMixedShape",
            ShapeVariant::Straight => "ExtrudeStraightShape",
            ShapeVariant::Spline => "ExtrudeSplineShape",
            ShapeVariant::Circle => "ExtrudeCircleShape",
        }
    }

    fn profile(&self) -> Result<Profile> {
        Ok(self.profile.clone())
    }

    fn construction(&self) -> Result<Construction> {
        Ok(Construction::Extrude {
            distance: self.distance,
            extrude_both: self.extrude_both,
            rotation_angle: self.rotation_angle,
            extrusion_start_offset: self.extrusion_start_offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workplane::Workplane;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn square() -> Vec<Point> {
        vec![(0.0, 0.0), (0.0, 20.0), (20.0, 20.0), (20.0, 0.0)]
    }

    #[test]
    fn test_extruded_rectangle_volume_and_faces() {
        let shape = ExtrudeShape::straight(&square(), 30.0).unwrap();
        assert_relative_eq!(shape.volume().unwrap(), 12000.0, epsilon = 1e-6);
        let mut areas = shape.areas().unwrap();
        areas.sort_by(f64::total_cmp);
        assert_eq!(areas.len(), 6);
        for (a, e) in areas.iter().zip([400.0, 400.0, 600.0, 600.0, 600.0, 600.0]) {
            assert_relative_eq!(*a, e, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_extruded_circle_volume() {
        let shape = ExtrudeShape::circle((30.0, 0.0), 10.0, 20.0).unwrap();
        assert_relative_eq!(shape.volume().unwrap(), PI * 100.0 * 20.0, max_relative = 0.01);
        assert_eq!(shape.points().unwrap(), vec![(30.0, 0.0)]);
    }

    #[test]
    fn test_one_sided_extrusion_direction() {
        let both = ExtrudeShape::straight(&square(), 30.0).unwrap();
        let bb = both.solid().unwrap().bounding_box();
        assert_relative_eq!(bb.min.y, -15.0, epsilon = 1e-9);
        assert_relative_eq!(bb.max.y, 15.0, epsilon = 1e-9);

        let one = ExtrudeShape::straight(&square(), 30.0)
            .unwrap()
            .with_extrude_both(false);
        let bb = one.solid().unwrap().bounding_box();
        assert_relative_eq!(bb.min.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(bb.max.y, 30.0, epsilon = 1e-9);

        let offset = ExtrudeShape::straight(&square(), 30.0)
            .unwrap()
            .with_extrude_both(false)
            .with_extrusion_start_offset(10.0)
            .unwrap();
        let bb = offset.solid().unwrap().bounding_box();
        assert_relative_eq!(bb.min.y, 10.0, epsilon = 1e-9);
        assert_relative_eq!(bb.max.y, 40.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rotation_angle_keeps_a_sector() {
        // a slab centred on the Z axis, cut down to a half
        let slab = [(-10.0, -5.0), (-10.0, 5.0), (10.0, 5.0), (10.0, -5.0)];
        let full = ExtrudeShape::straight(&slab, 20.0)
            .unwrap()
            .with_workplane(Workplane::XY);
        let half = ExtrudeShape::straight(&slab, 20.0)
            .unwrap()
            .with_workplane(Workplane::XY)
            .with_rotation_axis("Z".parse().unwrap())
            .with_rotation_angle(180.0)
            .unwrap();
        assert_relative_eq!(
            half.volume().unwrap(),
            full.volume().unwrap() / 2.0,
            max_relative = 0.01
        );
    }

    #[test]
    fn test_distance_must_be_positive() {
        assert!(matches!(
            ExtrudeShape::straight(&square(), 0.0),
            Err(ParamakError::ParameterOutOfRange { .. })
        ));
        let mut shape = ExtrudeShape::straight(&square(), 1.0).unwrap();
        assert!(shape.set_distance(-3.0).is_err());
        shape.set_distance(3.0).unwrap();
        assert_eq!(shape.distance(), 3.0);
    }
}
