//! Revolved shapes.

use super::{Construction, ParametricShape, Profile, ShapeCore, ShapeVariant};
use crate::error::{ParamakError, Result};
use crate::polyline::Polyline;
use crate::utils::Point;

/// Check a revolve or keep angle lies in `(0, 360]`.
pub(crate) fn check_rotation_angle(angle: f64) -> Result<()> {
    if angle > 0.0 && angle <= 360.0 {
        Ok(())
    } else {
        Err(ParamakError::out_of_range("rotation_angle", angle, 0.0, 360.0))
    }
}

/// A profile revolved about its workplane's local y axis.
///
/// ```
/// use paramak::{ParametricShape, RotateShape};
///
/// let shape = RotateShape::straight(&[(0.0, 0.0), (0.0, 20.0), (20.0, 20.0), (20.0, 0.0)])
///     .unwrap()
///     .with_rotation_angle(360.0)
///     .unwrap();
/// let expected = std::f64::consts::PI * 20.0 * 20.0 * 20.0;
/// assert!((shape.volume().unwrap() - expected).abs() / expected < 0.01);
/// ```
#[derive(Debug)]
pub struct RotateShape {
    core: ShapeCore,
    variant: ShapeVariant,
    profile: Profile,
    rotation_angle: f64,
}

impl RotateShape {
    fn with_profile(variant: ShapeVariant, profile: Profile) -> Result<Self> {
        variant.check(&profile)?;
        let kind = format!("Rotate{}Shape", variant.label());
        Ok(Self {
            core: ShapeCore::new(kind),
            variant,
            profile,
            rotation_angle: 360.0,
        })
    }

    /// Any connection-typed outline.
    pub fn mixed(points: Polyline) -> Self {
        Self {
            core: ShapeCore::new("RotateMixedShape"),
            variant: ShapeVariant::Mixed,
            profile: Profile::Polyline(points),
            rotation_angle: 360.0,
        }
    }

    /// A compound of outlines revolved together.
    pub fn compound(parts: Vec<Profile>) -> Result<Self> {
        Self::with_profile(ShapeVariant::Mixed, Profile::Compound(parts))
    }

    /// Points joined by straight edges.
    pub fn straight(points: &[Point]) -> Result<Self> {
        Self::with_profile(ShapeVariant::Straight, ShapeVariant::Straight.profile(points)?)
    }

    /// Points on one closed spline.
    pub fn spline(points: &[Point]) -> Result<Self> {
        Self::with_profile(ShapeVariant::Spline, ShapeVariant::Spline.profile(points)?)
    }

    /// A circle, revolved into a torus.
    pub fn circle(center: Point, radius: f64) -> Result<Self> {
        Self::with_profile(ShapeVariant::Circle, Profile::Circle { center, radius })
    }

    /// Revolve angle in degrees.
    pub fn rotation_angle(&self) -> f64 {
        self.rotation_angle
    }

    /// Set the revolve angle, in `(0, 360]`.
    pub fn set_rotation_angle(&mut self, angle: f64) -> Result<()> {
        check_rotation_angle(angle)?;
        self.rotation_angle = angle;
        Ok(())
    }

    /// Builder form of [`RotateShape::set_rotation_angle`].
    pub fn with_rotation_angle(mut self, angle: f64) -> Result<Self> {
        self.set_rotation_angle(angle)?;
        Ok(self)
    }

    /// Replace the outline, keeping the variant's connection rules.
    pub fn set_profile(&mut self, profile: Profile) -> Result<()> {
        self.variant.check(&profile)?;
        self.profile = profile;
        Ok(())
    }

    /// Which connection kinds this shape accepts.
    pub fn variant(&self) -> ShapeVariant {
        self.variant
    }
}

impl ParametricShape for RotateShape {
    fn core(&self) -> &ShapeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ShapeCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        match self.variant {
            ShapeVariant::Mixed => "RotateMixedShape",
            ShapeVariant::Straight => "RotateStraightShape",
            ShapeVariant::Spline => "RotateSplineShape",
            ShapeVariant::Circle => "RotateCircleShape",
        }
    }

    fn profile(&self) -> Result<Profile> {
        Ok(self.profile.clone())
    }

    fn construction(&self) -> Result<Construction> {
        Ok(Construction::Rotate {
            rotation_angle: self.rotation_angle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ShapeRef;
    use crate::workplane::Workplane;
    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::f64::consts::PI;
    use std::rc::Rc;

    fn square(x0: f64, size: f64) -> Vec<Point> {
        vec![(x0, 0.0), (x0, size), (x0 + size, size), (x0 + size, 0.0)]
    }

    #[test]
    fn test_full_revolve_volume() {
        let shape = RotateShape::straight(&square(0.0, 20.0)).unwrap();
        assert_relative_eq!(shape.volume().unwrap(), PI * 20.0 * 20.0 * 20.0, max_relative = 0.01);
    }

    #[test]
    fn test_partial_revolve_is_proportional() {
        let full = RotateShape::straight(&square(10.0, 10.0)).unwrap();
        for angle in [90.0, 180.0, 270.0] {
            let part = RotateShape::straight(&square(10.0, 10.0))
                .unwrap()
                .with_rotation_angle(angle)
                .unwrap();
            assert_relative_eq!(
                part.volume().unwrap(),
                full.volume().unwrap() * angle / 360.0,
                max_relative = 0.01
            );
        }
    }

    #[test]
    fn test_rotation_angle_bounds() {
        let shape = RotateShape::straight(&square(0.0, 1.0)).unwrap();
        for bad in [0.0, -10.0, 360.5] {
            assert!(matches!(
                RotateShape::straight(&square(0.0, 1.0)).unwrap().with_rotation_angle(bad),
                Err(ParamakError::ParameterOutOfRange { .. })
            ));
        }
        assert_eq!(shape.rotation_angle(), 360.0);
    }

    #[test]
    fn test_placement_copies_add_volume() {
        let one = RotateShape::straight(&square(20.0, 10.0))
            .unwrap()
            .with_rotation_angle(30.0)
            .unwrap();
        let three = RotateShape::straight(&square(20.0, 10.0))
            .unwrap()
            .with_rotation_angle(30.0)
            .unwrap()
            .with_azimuth_placement_angles(vec![0.0, 120.0, 240.0]);
        assert_relative_eq!(
            three.volume().unwrap(),
            3.0 * one.volume().unwrap(),
            max_relative = 0.01
        );
    }

    #[test]
    fn test_cut_subtracts_contained_shape() {
        let inner = RotateShape::straight(&[(12.0, 2.0), (12.0, 8.0), (18.0, 8.0), (18.0, 2.0)]).unwrap();
        let inner_volume = inner.volume().unwrap();
        let outer = RotateShape::straight(&square(10.0, 10.0)).unwrap();
        let outer_volume = outer.volume().unwrap();
        let outer = outer.with_cut(ShapeRef::new(inner));
        assert_relative_eq!(
            outer.volume().unwrap(),
            outer_volume - inner_volume,
            max_relative = 0.001
        );
    }

    #[test]
    fn test_intersect_and_union_with_overlapping_ring() {
        let ring = || RotateShape::straight(&[(15.0, 0.0), (15.0, 10.0), (25.0, 10.0), (25.0, 0.0)]).unwrap();
        let common = RotateShape::straight(&square(10.0, 10.0))
            .unwrap()
            .with_intersect(ShapeRef::new(ring()));
        assert_relative_eq!(
            common.volume().unwrap(),
            PI * (400.0 - 225.0) * 10.0,
            max_relative = 0.01
        );
        let joined = RotateShape::straight(&square(10.0, 10.0))
            .unwrap()
            .with_union(ShapeRef::new(ring()));
        assert_relative_eq!(
            joined.volume().unwrap(),
            PI * (625.0 - 100.0) * 10.0,
            max_relative = 0.01
        );
    }

    #[test]
    fn test_translate_and_colour_are_fingerprinted() {
        let plain = RotateShape::straight(&square(10.0, 10.0)).unwrap();
        let moved = RotateShape::straight(&square(10.0, 10.0))
            .unwrap()
            .with_translate([0.0, 0.0, 5.0])
            .with_color(crate::shape::Color::rgb(1.0, 0.0, 0.0).unwrap());
        assert_ne!(plain.hash_value().unwrap(), moved.hash_value().unwrap());
        let (a, b) = (plain.solid().unwrap().bounding_box(), moved.solid().unwrap().bounding_box());
        assert_relative_eq!(b.min.z - a.min.z, 5.0, epsilon = 1e-9);
        assert_relative_eq!(moved.volume().unwrap(), plain.volume().unwrap(), max_relative = 1e-9);
    }

    #[test]
    fn test_solid_is_cached_until_mutation() {
        let mut shape = RotateShape::straight(&square(5.0, 5.0)).unwrap();
        let a = shape.solid().unwrap();
        let b = shape.solid().unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        let before = shape.hash_value().unwrap();

        shape.set_rotation_angle(90.0).unwrap();
        assert_ne!(shape.hash_value().unwrap(), before);
        let c = shape.solid().unwrap();
        assert!(!Rc::ptr_eq(&a, &c));

        shape.core_mut().workplane = Workplane::XY;
        let d = shape.solid().unwrap();
        assert!(!Rc::ptr_eq(&c, &d));
    }

    #[test]
    fn test_child_mutation_invalidates_parent() {
        let tool = Rc::new(RefCell::new(
            RotateShape::straight(&[(6.0, 1.0), (6.0, 4.0), (9.0, 4.0), (9.0, 1.0)]).unwrap(),
        ));
        let body = RotateShape::straight(&square(5.0, 5.0))
            .unwrap()
            .with_cut(Rc::clone(&tool));
        let first = body.solid().unwrap();
        tool.borrow_mut().set_rotation_angle(180.0).unwrap();
        let second = body.solid().unwrap();
        assert!(!Rc::ptr_eq(&first, &second));
        assert!(second.volume() > first.volume());
    }

    #[test]
    fn test_self_cut_is_cyclic() {
        let shape = Rc::new(RefCell::new(RotateShape::straight(&square(5.0, 5.0)).unwrap()));
        let handle = ShapeRef::from(Rc::clone(&shape));
        shape.borrow_mut().core_mut().union.push(handle.clone());
        let err = handle.solid().unwrap_err();
        assert!(matches!(err, ParamakError::CyclicDependency(_)));
        // break the cycle so the shapes can be dropped
        shape.borrow_mut().core_mut().union.clear();
    }

    #[test]
    fn test_crossing_axis_is_self_intersecting() {
        let shape = RotateShape::straight(&[(-5.0, 0.0), (-5.0, 5.0), (5.0, 5.0), (5.0, 0.0)]).unwrap();
        assert!(matches!(shape.solid(), Err(ParamakError::SelfIntersecting(_))));
    }

    #[test]
    fn test_circle_torus_volume() {
        let torus = RotateShape::circle((50.0, 0.0), 10.0).unwrap();
        let expected = 2.0 * PI * PI * 50.0 * 10.0 * 10.0;
        assert_relative_eq!(torus.volume().unwrap(), expected, max_relative = 0.01);
        assert!(RotateShape::circle((50.0, 0.0), 0.0).is_err());
    }

    #[test]
    fn test_variant_rules() {
        use crate::polyline::ConnectionKind::{Spline, Straight};
        let mixed = Polyline::new([(10.0, 0.0, Straight), (20.0, 0.0, Spline), (25.0, 5.0, Spline), (20.0, 10.0, Straight)]).unwrap();
        let mut shape = RotateShape::straight(&square(10.0, 5.0)).unwrap();
        assert!(shape.set_profile(Profile::Polyline(mixed.clone())).is_err());
        let shape = RotateShape::mixed(mixed).with_rotation_angle(90.0).unwrap();
        assert!(shape.volume().unwrap() > 0.0);
        assert_eq!(shape.kind(), "RotateMixedShape");
    }
}
