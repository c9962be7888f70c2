//! Swept shapes.

use super::pipeline::check_path_workplane;
use super::{Construction, ParametricShape, Profile, ShapeCore, ShapeVariant};
use crate::error::{ParamakError, Result};
use crate::polyline::Polyline;
use crate::utils::Point;
use crate::workplane::Workplane;

/// A profile swept along a spline through `path_points`.
///
/// The path lives in `path_workplane`, which must differ from the profile
/// workplane and share its first axis. The profile's local origin is
/// carried to the first path point.
///
/// [`SweepShape::set_workplanes`] rejects a bad pair straight away. A
/// workplane written through [`ShapeCore`] is only checked when the solid
/// is built.
#[derive(Debug)]
pub struct SweepShape {
    core: ShapeCore,
    variant: ShapeVariant,
    profile: Profile,
    path_points: Vec<Point>,
    path_workplane: Workplane,
    force_cross_section: bool,
}

impl SweepShape {
    fn with_profile(variant: ShapeVariant, profile: Profile, path_points: Vec<Point>) -> Result<Self> {
        variant.check(&profile)?;
        check_path(&path_points)?;
        let mut core = ShapeCore::new(format!("Sweep{}Shape", variant.label()));
        core.workplane = Workplane::XY;
        Ok(Self {
            core,
            variant,
            profile,
            path_points,
            path_workplane: Workplane::XZ,
            force_cross_section: false,
        })
    }

    /// Any connection-typed outline.
    pub fn mixed(points: Polyline, path_points: Vec<Point>) -> Result<Self> {
        Self::with_profile(ShapeVariant::Mixed, Profile::Polyline(points), path_points)
    }

    /// Points joined by straight edges.
    pub fn straight(points: &[Point], path_points: Vec<Point>) -> Result<Self> {
        Self::with_profile(ShapeVariant::Straight, ShapeVariant::Straight.profile(points)?, path_points)
    }

    /// Points on one closed spline.
    pub fn spline(points: &[Point], path_points: Vec<Point>) -> Result<Self> {
        Self::with_profile(ShapeVariant::Spline, ShapeVariant::Spline.profile(points)?, path_points)
    }

    /// A circle, swept into a tube.
    pub fn circle(center: Point, radius: f64, path_points: Vec<Point>) -> Result<Self> {
        Self::with_profile(ShapeVariant::Circle, Profile::Circle { center, radius }, path_points)
    }

    /// Draw the profile in `workplane` and the path in `path_workplane`.
    pub fn set_workplanes(&mut self, workplane: Workplane, path_workplane: Workplane) -> Result<()> {
        check_path_workplane(workplane, path_workplane)?;
        self.core.workplane = workplane;
        self.path_workplane = path_workplane;
        Ok(())
    }

    /// Builder form of [`SweepShape::set_workplanes`].
    pub fn with_workplanes(mut self, workplane: Workplane, path_workplane: Workplane) -> Result<Self> {
        self.set_workplanes(workplane, path_workplane)?;
        Ok(self)
    }

    /// Rebuild the section perpendicular to the path at every path point.
    pub fn with_force_cross_section(mut self, force: bool) -> Self {
        self.force_cross_section = force;
        self
    }

    /// Replace the path.
    pub fn set_path_points(&mut self, path_points: Vec<Point>) -> Result<()> {
        check_path(&path_points)?;
        self.path_points = path_points;
        Ok(())
    }

    /// The path points.
    pub fn path_points(&self) -> &[Point] {
        &self.path_points
    }

    /// The path workplane.
    pub fn path_workplane(&self) -> Workplane {
        self.path_workplane
    }
}

fn check_path(points: &[Point]) -> Result<()> {
    if points.len() < 2 {
        return Err(ParamakError::invalid(
            "path_points",
            format!("a sweep path needs at least two points, got {}", points.len()),
        ));
    }
    if points.iter().any(|p| !p.0.is_finite() || !p.1.is_finite()) {
        return Err(ParamakError::invalid("path_points", "non-finite coordinate"));
    }
    Ok(())
}

impl ParametricShape for SweepShape {
    fn core(&self) -> &ShapeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ShapeCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        match self.variant {
            ShapeVariant::Mixed => "SweepMixedShape",
            ShapeVariant::Straight => "SweepStraightShape",
            ShapeVariant::Spline => "SweepSplineShape",
            ShapeVariant::Circle => "SweepCircleShape",
        }
    }

    fn profile(&self) -> Result<Profile> {
        Ok(self.profile.clone())
    }

    fn construction(&self) -> Result<Construction> {
        check_path_workplane(self.core.workplane, self.path_workplane)?;
        Ok(Construction::Sweep {
            path_points: self.path_points.clone(),
            path_workplane: self.path_workplane,
            force_cross_section: self.force_cross_section,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn square() -> Vec<Point> {
        vec![(-10.0, -10.0), (-10.0, 10.0), (10.0, 10.0), (10.0, -10.0)]
    }

    #[test]
    fn test_straight_path_volume() {
        let shape = SweepShape::straight(&square(), vec![(0.0, 0.0), (0.0, 50.0), (0.0, 100.0)]).unwrap();
        assert_relative_eq!(shape.volume().unwrap(), 400.0 * 100.0, max_relative = 0.01);
    }

    #[test]
    fn test_circle_sweep_volume() {
        let shape = SweepShape::circle((0.0, 0.0), 5.0, vec![(0.0, 0.0), (0.0, 40.0)]).unwrap();
        assert_relative_eq!(shape.volume().unwrap(), PI * 25.0 * 40.0, max_relative = 0.01);
    }

    #[test]
    fn test_forced_cross_section_gives_more_volume_on_a_bend() {
        let path = vec![(0.0, 0.0), (30.0, 50.0), (0.0, 100.0)];
        let free = SweepShape::straight(&square(), path.clone()).unwrap();
        let forced = SweepShape::straight(&square(), path)
            .unwrap()
            .with_force_cross_section(true);
        assert!(forced.volume().unwrap() > free.volume().unwrap());
    }

    #[test]
    fn test_incompatible_workplanes() {
        let shape = SweepShape::straight(&square(), vec![(0.0, 0.0), (0.0, 10.0)]).unwrap();
        assert!(matches!(
            shape.with_workplanes(Workplane::XY, Workplane::XY),
            Err(ParamakError::IncompatiblePathWorkplane { .. })
        ));
        let shape = SweepShape::straight(&square(), vec![(0.0, 0.0), (0.0, 10.0)]).unwrap();
        assert!(matches!(
            shape.with_workplanes(Workplane::XY, Workplane::YZ),
            Err(ParamakError::IncompatiblePathWorkplane { .. })
        ));
        let shape = SweepShape::straight(&square(), vec![(0.0, 0.0), (0.0, 10.0)]).unwrap();
        assert!(shape.with_workplanes(Workplane::YZ, Workplane::YX).is_ok());
    }

    #[test]
    fn test_workplane_edits_are_checked() {
        let mut shape = SweepShape::straight(&square(), vec![(0.0, 0.0), (0.0, 10.0)]).unwrap();
        assert!(shape.set_workplanes(Workplane::XZ, Workplane::XZ).is_err());
        assert_eq!(shape.core().workplane, Workplane::XY);
        assert_eq!(shape.path_workplane(), Workplane::XZ);

        let shape = shape.with_workplane(Workplane::XZ);
        assert!(matches!(
            shape.solid(),
            Err(ParamakError::IncompatiblePathWorkplane { .. })
        ));
    }

    #[test]
    fn test_short_path_rejected() {
        assert!(SweepShape::straight(&square(), vec![(0.0, 0.0)]).is_err());
    }
}
