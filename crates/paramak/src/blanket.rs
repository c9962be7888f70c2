//! Blankets and first walls offset from a plasma boundary.
//!
//! [`BlanketFP`] walks the plasma curve over a poloidal angle window and
//! pushes each sample out along the analytic normal. The inner contour sits
//! `offset_from_plasma` away from the plasma and the outer contour a further
//! `thickness`; both may vary with the poloidal angle through an
//! [`AngleFunction`].

use std::fmt;
use std::rc::Rc;

use paramak_kernel::{Kernel, Solid};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{positive, ParamakError, Result, Warning};
use crate::plasma::{Plasma, PlasmaParameters};
use crate::polyline::{ConnectionKind, Polyline, PolylinePoint};
use crate::shape::{check_rotation_angle, construct_leaves};
use crate::shape::{Construction, ParametricShape, Profile, ShapeCore};
use crate::utils::{diff_between_angles, linspace, Point};

// =============================================================================
// Angle-dependent values
// =============================================================================

/// A quantity that varies with poloidal angle (degrees).
#[derive(Clone)]
pub enum AngleFunction {
    /// The same value everywhere.
    Constant(f64),
    /// Values evenly spaced from the start to the stop angle, linearly
    /// interpolated between.
    Values(Vec<f64>),
    /// Values at explicit angles, linearly interpolated and clamped to the
    /// end values outside the given range.
    Interpolated {
        /// Sample angles in degrees.
        angles: Vec<f64>,
        /// Value at each angle.
        values: Vec<f64>,
    },
    /// Any function of the angle in degrees.
    Custom(Rc<dyn Fn(f64) -> f64>),
}

impl AngleFunction {
    /// A linear ramp from `from` at the start angle to `to` at the stop
    /// angle.
    pub fn ramp(from: f64, to: f64) -> Self {
        AngleFunction::Values(vec![from, to])
    }

    /// Wrap a closure.
    pub fn custom(f: impl Fn(f64) -> f64 + 'static) -> Self {
        AngleFunction::Custom(Rc::new(f))
    }

    fn validate(&self, parameter: &str) -> Result<()> {
        match self {
            AngleFunction::Constant(v) if !v.is_finite() => {
                Err(ParamakError::invalid(parameter, "must be finite"))
            }
            AngleFunction::Values(values) if values.is_empty() => {
                Err(ParamakError::invalid(parameter, "needs at least one value"))
            }
            AngleFunction::Interpolated { angles, values } => {
                if angles.len() != values.len() {
                    return Err(ParamakError::invalid(
                        parameter,
                        format!(
                            "{} angles but {} values; the lists must be the same length",
                            angles.len(),
                            values.len()
                        ),
                    ));
                }
                if angles.is_empty() {
                    return Err(ParamakError::invalid(parameter, "needs at least one value"));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// The value at `theta`, with `start`/`stop` giving the span that
    /// [`AngleFunction::Values`] is spread across.
    pub fn value_at(&self, theta: f64, start: f64, stop: f64) -> f64 {
        match self {
            AngleFunction::Constant(v) => *v,
            AngleFunction::Values(values) => {
                let angles = linspace(start, stop, values.len(), true);
                interpolate(&angles, values, theta)
            }
            AngleFunction::Interpolated { angles, values } => interpolate(angles, values, theta),
            AngleFunction::Custom(f) => f(theta),
        }
    }

    fn describe(&self) -> Value {
        match self {
            AngleFunction::Constant(v) => json!(v),
            AngleFunction::Values(values) => json!(values),
            AngleFunction::Interpolated { angles, values } => json!([angles, values]),
            // the sampled points carry a closure's effect into the fingerprint
            AngleFunction::Custom(_) => json!("custom"),
        }
    }
}

impl From<f64> for AngleFunction {
    fn from(v: f64) -> Self {
        AngleFunction::Constant(v)
    }
}

impl fmt::Debug for AngleFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AngleFunction::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            AngleFunction::Values(v) => f.debug_tuple("Values").field(v).finish(),
            AngleFunction::Interpolated { angles, values } => f
                .debug_struct("Interpolated")
                .field("angles", angles)
                .field("values", values)
                .finish(),
            AngleFunction::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Piecewise-linear interpolation through `(xs, ys)`, clamped at the ends.
/// The abscissae may come in either order.
fn interpolate(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let mut pairs: Vec<(f64, f64)> = xs.iter().copied().zip(ys.iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    let (Some(&first), Some(&last)) = (pairs.first(), pairs.last()) else {
        return 0.0;
    };
    if x <= first.0 {
        return first.1;
    }
    if x >= last.0 {
        return last.1;
    }
    for w in pairs.windows(2) {
        let ((x0, y0), (x1, y1)) = (w[0], w[1]);
        if x >= x0 && x <= x1 {
            if x1 == x0 {
                return y1;
            }
            return y0 + (y1 - y0) * (x - x0) / (x1 - x0);
        }
    }
    last.1
}

// =============================================================================
// BlanketFP
// =============================================================================

/// A named physical group of a blanket, for meshing tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhysicalGroup {
    /// 3 for volumes, 2 for surfaces.
    pub dim: u8,
    /// One-based id within its dimension.
    pub id: usize,
    /// Group name.
    pub name: &'static str,
}

/// A blanket following the plasma between two poloidal angles.
///
/// ```
/// use paramak::{BlanketFP, ParametricShape};
///
/// let blanket = BlanketFP::new(100.0, 10.0, 270.0)
///     .unwrap()
///     .with_offset_from_plasma(30.0)
///     .unwrap();
/// assert_eq!(blanket.core().material_tag.as_deref(), Some("blanket_mat"));
/// ```
#[derive(Debug)]
pub struct BlanketFP {
    core: ShapeCore,
    plasma: PlasmaParameters,
    thickness: AngleFunction,
    offset_from_plasma: AngleFunction,
    start_angle: f64,
    stop_angle: f64,
    num_points: usize,
    rotation_angle: f64,
    allow_overlapping_shape: bool,
    segments_angles: Option<Vec<f64>>,
}

impl BlanketFP {
    /// A blanket of constant `thickness` around the default plasma, from
    /// `start_angle` to `stop_angle` degrees.
    pub fn new(thickness: impl Into<AngleFunction>, start_angle: f64, stop_angle: f64) -> Result<Self> {
        let blanket = Self {
            core: ShapeCore::new("blanket_fp").tagged("blanket_mat", "BlanketFP"),
            plasma: PlasmaParameters::default(),
            thickness: thickness.into(),
            offset_from_plasma: AngleFunction::Constant(0.0),
            start_angle,
            stop_angle,
            num_points: 50,
            rotation_angle: 360.0,
            allow_overlapping_shape: false,
            segments_angles: None,
        };
        blanket.thickness.validate("thickness")?;
        blanket.check_angles()?;
        Ok(blanket)
    }

    fn check_angles(&self) -> Result<()> {
        for (label, v) in [("start_angle", self.start_angle), ("stop_angle", self.stop_angle)] {
            if !v.is_finite() {
                return Err(ParamakError::invalid(label, "must be finite"));
            }
        }
        Ok(())
    }

    /// Follow `plasma`'s shape.
    pub fn with_plasma(mut self, plasma: &Plasma) -> Self {
        self.plasma = *plasma.parameters_ref();
        self
    }

    /// Follow a plasma given by its parameters.
    pub fn with_plasma_parameters(mut self, params: PlasmaParameters) -> Result<Self> {
        params.validate()?;
        self.plasma = params;
        Ok(self)
    }

    /// Gap between the plasma and the inner contour.
    pub fn with_offset_from_plasma(mut self, offset: impl Into<AngleFunction>) -> Result<Self> {
        let offset = offset.into();
        offset.validate("offset_from_plasma")?;
        self.offset_from_plasma = offset;
        Ok(self)
    }

    /// Replace the thickness.
    pub fn set_thickness(&mut self, thickness: impl Into<AngleFunction>) -> Result<()> {
        let thickness = thickness.into();
        thickness.validate("thickness")?;
        self.thickness = thickness;
        Ok(())
    }

    /// Replace the poloidal window.
    pub fn set_angles(&mut self, start_angle: f64, stop_angle: f64) -> Result<()> {
        let (old_start, old_stop) = (self.start_angle, self.stop_angle);
        self.start_angle = start_angle;
        self.stop_angle = stop_angle;
        self.check_angles().inspect_err(|_| {
            self.start_angle = old_start;
            self.stop_angle = old_stop;
        })
    }

    /// Samples per contour.
    pub fn with_num_points(mut self, num_points: usize) -> Result<Self> {
        if num_points < 2 {
            return Err(ParamakError::out_of_range(
                "num_points",
                num_points as f64,
                2.0,
                f64::INFINITY,
            ));
        }
        self.num_points = num_points;
        Ok(self)
    }

    /// Revolve angle in degrees.
    pub fn with_rotation_angle(mut self, angle: f64) -> Result<Self> {
        check_rotation_angle(angle)?;
        self.rotation_angle = angle;
        Ok(self)
    }

    /// Accept points clipped at negative radius without a warning.
    pub fn with_allow_overlapping_shape(mut self, allow: bool) -> Self {
        self.allow_overlapping_shape = allow;
        self
    }

    /// Split poloidally at these angles; each consecutive pair becomes one
    /// body of the solid.
    pub fn with_segments_angles(mut self, angles: Vec<f64>) -> Result<Self> {
        if angles.len() < 2 {
            return Err(ParamakError::invalid(
                "segments_angles",
                "at least two angles are needed to make a segment",
            ));
        }
        self.segments_angles = Some(angles);
        Ok(self)
    }

    /// Poloidal window start in degrees.
    pub fn start_angle(&self) -> f64 {
        self.start_angle
    }

    /// Poloidal window stop in degrees.
    pub fn stop_angle(&self) -> f64 {
        self.stop_angle
    }

    /// Revolve angle in degrees.
    pub fn rotation_angle(&self) -> f64 {
        self.rotation_angle
    }

    /// The followed plasma's parameters.
    pub fn plasma_parameters(&self) -> &PlasmaParameters {
        &self.plasma
    }

    /// Contour points offset by `offset(θ)` at each angle, dropping those
    /// at non-positive radius. Returns the points and the number dropped.
    fn offset_points(&self, thetas: &[f64], offset: impl Fn(f64) -> f64) -> Result<(Vec<PolylinePoint>, usize)> {
        let mut points = Vec::with_capacity(thetas.len());
        let mut dropped = 0;
        for &theta in thetas {
            let t = theta.to_radians();
            let (r, z) = self.plasma.point_at(t);
            let (nx, nz) = self.plasma.normal_at(t);
            let d = offset(theta);
            if !d.is_finite() {
                return Err(ParamakError::invalid(
                    "thickness",
                    format!("non-finite offset at {theta} degrees"),
                ));
            }
            let (pr, pz) = (r + d * nx, z + d * nz);
            if pr > 0.0 {
                points.push(PolylinePoint::new(pr, pz, ConnectionKind::Spline));
            } else {
                dropped += 1;
            }
        }
        if let Some(last) = points.last_mut() {
            last.connection = ConnectionKind::Straight;
        }
        Ok((points, dropped))
    }

    /// The closed outline over the angles `thetas`: inner contour with θ
    /// ascending, outer contour descending.
    fn outline(&self, thetas: &[f64]) -> Result<Polyline> {
        let (start, stop) = (self.start_angle, self.stop_angle);
        let inner = |theta: f64| self.offset_from_plasma.value_at(theta, start, stop);
        let outer = |theta: f64| inner(theta) + self.thickness.value_at(theta, start, stop);

        let (mut points, dropped_inner) = self.offset_points(thetas, inner)?;
        let reversed: Vec<f64> = thetas.iter().rev().copied().collect();
        let (outer_points, dropped_outer) = self.offset_points(&reversed, outer)?;
        points.extend(outer_points);

        let dropped = dropped_inner + dropped_outer;
        if dropped > 0 && !self.allow_overlapping_shape {
            Warning::ShapeClippedNegativeR {
                shape: self.core.name.clone(),
                dropped,
            }
            .emit();
        }
        Polyline::new(points)
    }

    /// The inner contour, θ ascending.
    pub fn inner_points(&self) -> Result<Vec<Point>> {
        let thetas = linspace(self.start_angle, self.stop_angle, self.num_points, true);
        let (start, stop) = (self.start_angle, self.stop_angle);
        let (points, _) =
            self.offset_points(&thetas, |t| self.offset_from_plasma.value_at(t, start, stop))?;
        Ok(points.iter().map(PolylinePoint::xy).collect())
    }

    /// The outer contour, θ descending.
    pub fn outer_points(&self) -> Result<Vec<Point>> {
        let mut thetas = linspace(self.start_angle, self.stop_angle, self.num_points, true);
        thetas.reverse();
        let (start, stop) = (self.start_angle, self.stop_angle);
        let (points, _) = self.offset_points(&thetas, |t| {
            self.offset_from_plasma.value_at(t, start, stop) + self.thickness.value_at(t, start, stop)
        })?;
        Ok(points.iter().map(PolylinePoint::xy).collect())
    }

    /// Volume and surface groups in the order a mesher numbers them.
    pub fn physical_groups(&self) -> Vec<PhysicalGroup> {
        let full_rotation = self.rotation_angle == 360.0;
        let closed_window = diff_between_angles(self.start_angle, self.stop_angle) == 0.0;
        let mut names = vec!["inner", "outer"];
        if !full_rotation {
            names.extend(["left_section", "right_section"]);
        }
        if !closed_window {
            names.extend(["inner_section", "outer_section"]);
        }
        let order: Vec<usize> = match (full_rotation, closed_window) {
            (true, false) => vec![0, 2, 1, 3],
            (false, false) => vec![0, 4, 1, 5, 2, 3],
            _ => (0..names.len()).collect(),
        };
        let mut groups = vec![PhysicalGroup {
            dim: 3,
            id: 1,
            name: "inside",
        }];
        groups.extend(order.into_iter().enumerate().map(|(i, k)| PhysicalGroup {
            dim: 2,
            id: i + 1,
            name: names[k],
        }));
        groups
    }
}

impl ParametricShape for BlanketFP {
    fn core(&self) -> &ShapeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ShapeCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        "BlanketFP"
    }

    fn parameters(&self) -> Value {
        json!({
            "plasma": self.plasma,
            "thickness": self.thickness.describe(),
            "offset_from_plasma": self.offset_from_plasma.describe(),
            "start_angle": self.start_angle,
            "stop_angle": self.stop_angle,
            "num_points": self.num_points,
            "allow_overlapping_shape": self.allow_overlapping_shape,
            "segments_angles": self.segments_angles,
        })
    }

    fn profile(&self) -> Result<Profile> {
        if (self.stop_angle - self.start_angle).abs() == 360.0 && self.rotation_angle == 360.0 {
            return Err(ParamakError::AmbiguousFullCoverage(self.core.name.clone()));
        }
        match &self.segments_angles {
            None => {
                let thetas = linspace(self.start_angle, self.stop_angle, self.num_points, true);
                Ok(Profile::Polyline(self.outline(&thetas)?))
            }
            Some(angles) => angles
                .windows(2)
                .map(|w| {
                    let thetas = linspace(w[0], w[1], self.num_points, true);
                    self.outline(&thetas).map(Profile::Polyline)
                })
                .collect::<Result<Vec<_>>>()
                .map(Profile::Compound),
        }
    }

    fn construction(&self) -> Result<Construction> {
        Ok(Construction::Rotate {
            rotation_angle: self.rotation_angle,
        })
    }

    /// Segments stay separate bodies rather than being fused.
    fn construct(&self, kernel: &dyn Kernel) -> Result<Solid> {
        let pieces = construct_leaves(self, kernel)?;
        Ok(Solid::compound(pieces.iter()))
    }
}

// =============================================================================
// Constant-thickness arc blankets
// =============================================================================

/// Which way a constant-thickness arc blanket grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
enum ArcDirection {
    Horizontal,
    Vertical,
}

/// A constant-thickness blanket whose inner face is the arc through three
/// points.
#[derive(Debug)]
pub struct BlanketConstantThicknessArc {
    core: ShapeCore,
    direction: ArcDirection,
    inner_upper_point: Point,
    inner_mid_point: Point,
    inner_lower_point: Point,
    thickness: f64,
    rotation_angle: f64,
}

impl BlanketConstantThicknessArc {
    fn build(
        direction: ArcDirection,
        stem: &str,
        inner_upper_point: Point,
        inner_mid_point: Point,
        inner_lower_point: Point,
        thickness: f64,
    ) -> Result<Self> {
        positive("thickness", thickness.abs())?;
        Ok(Self {
            core: ShapeCore::new(stem).tagged("blanket_mat", stem),
            direction,
            inner_upper_point,
            inner_mid_point,
            inner_lower_point,
            thickness,
            rotation_angle: 360.0,
        })
    }

    /// The outer face is the inner arc shifted radially by `thickness`.
    pub fn horizontal(upper: Point, mid: Point, lower: Point, thickness: f64) -> Result<Self> {
        Self::build(
            ArcDirection::Horizontal,
            "BlanketConstantThicknessArcH",
            upper,
            mid,
            lower,
            thickness,
        )
    }

    /// The arc's ends grow vertically and its middle radially by
    /// `thickness`.
    pub fn vertical(upper: Point, mid: Point, lower: Point, thickness: f64) -> Result<Self> {
        Self::build(
            ArcDirection::Vertical,
            "BlanketConstantThicknessArcV",
            upper,
            mid,
            lower,
            thickness,
        )
    }

    /// Revolve angle in degrees.
    pub fn with_rotation_angle(mut self, angle: f64) -> Result<Self> {
        check_rotation_angle(angle)?;
        self.rotation_angle = angle;
        Ok(self)
    }

    /// Blanket thickness.
    pub fn thickness(&self) -> f64 {
        self.thickness
    }
}

impl ParametricShape for BlanketConstantThicknessArc {
    fn core(&self) -> &ShapeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ShapeCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        match self.direction {
            ArcDirection::Horizontal => "BlanketConstantThicknessArcH",
            ArcDirection::Vertical => "BlanketConstantThicknessArcV",
        }
    }

    fn parameters(&self) -> Value {
        json!({ "thickness": self.thickness })
    }

    fn profile(&self) -> Result<Profile> {
        use ConnectionKind::{Circle, Straight};
        let (up, mid, low) = (self.inner_upper_point, self.inner_mid_point, self.inner_lower_point);
        let t = self.thickness.abs();
        let outer = match self.direction {
            ArcDirection::Horizontal => [
                (low.0 + t, low.1, Circle),
                (mid.0 + t, mid.1, Circle),
                (up.0 + t, up.1, Straight),
            ],
            ArcDirection::Vertical => [
                (low.0, low.1 - t, Circle),
                (mid.0 + self.thickness, mid.1, Circle),
                (up.0, up.1 + t, Straight),
            ],
        };
        let mut points = vec![(up.0, up.1, Circle), (mid.0, mid.1, Circle), (low.0, low.1, Straight)];
        points.extend(outer);
        Ok(Profile::Polyline(Polyline::new(points)?))
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
    use approx::assert_relative_eq;

    fn blanket(thickness: impl Into<AngleFunction>) -> BlanketFP {
        BlanketFP::new(thickness, -90.0, 90.0)
            .unwrap()
            .with_rotation_angle(90.0)
            .unwrap()
    }

    #[test]
    fn test_interpolation_is_clamped_linear() {
        let xs = [0.0, 10.0, 20.0];
        let ys = [1.0, 3.0, 2.0];
        assert_relative_eq!(interpolate(&xs, &ys, 5.0), 2.0);
        assert_relative_eq!(interpolate(&xs, &ys, 15.0), 2.5);
        assert_relative_eq!(interpolate(&xs, &ys, -50.0), 1.0);
        assert_relative_eq!(interpolate(&xs, &ys, 50.0), 2.0);
        // descending abscissae are sorted first
        assert_relative_eq!(interpolate(&[20.0, 0.0], &[0.0, 10.0], 5.0), 7.5);
    }

    #[test]
    fn test_ramp_spans_the_window() {
        let ramp = AngleFunction::ramp(10.0, 30.0);
        assert_relative_eq!(ramp.value_at(-90.0, -90.0, 90.0), 10.0);
        assert_relative_eq!(ramp.value_at(0.0, -90.0, 90.0), 20.0);
        assert_relative_eq!(ramp.value_at(90.0, -90.0, 90.0), 30.0);
    }

    #[test]
    fn test_mismatched_interpolation_lists() {
        let bad = AngleFunction::Interpolated {
            angles: vec![0.0, 90.0],
            values: vec![10.0],
        };
        assert!(matches!(
            BlanketFP::new(bad, 0.0, 90.0),
            Err(ParamakError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_inner_points_sit_at_the_offset() {
        let b = blanket(50.0).with_offset_from_plasma(20.0).unwrap();
        let params = *b.plasma_parameters();
        for (i, p) in b.inner_points().unwrap().iter().enumerate() {
            let theta = linspace(-90.0, 90.0, 50, true)[i].to_radians();
            let on = params.point_at(theta);
            let d = (p.0 - on.0).hypot(p.1 - on.1);
            assert_relative_eq!(d, 20.0, epsilon = 1e-9);
        }
        let outer = b.outer_points().unwrap();
        assert_eq!(outer.len(), 50);
        // outer contour runs back from the stop angle
        assert!(outer[0].1 > outer[49].1);
    }

    #[test]
    fn test_thickness_is_measured_along_the_normal() {
        let gaps = |b: &BlanketFP| -> Vec<f64> {
            let inner = b.inner_points().unwrap();
            let mut outer = b.outer_points().unwrap();
            outer.reverse();
            assert_eq!(inner.len(), outer.len());
            inner
                .iter()
                .zip(&outer)
                .map(|(a, b)| (b.0 - a.0).hypot(b.1 - a.1))
                .collect()
        };

        let constant = blanket(50.0).with_offset_from_plasma(20.0).unwrap();
        for gap in gaps(&constant) {
            assert_relative_eq!(gap, 50.0, epsilon = 1e-9);
        }

        let ramped = blanket(AngleFunction::ramp(10.0, 30.0));
        let angles = linspace(-90.0, 90.0, 50, true);
        for (gap, theta) in gaps(&ramped).into_iter().zip(angles) {
            assert_relative_eq!(gap, 20.0 + theta / 9.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_profile_connections() {
        let profile = blanket(50.0).profile().unwrap();
        let Profile::Polyline(line) = profile else {
            panic!("expected a single outline");
        };
        let records = line.records();
        assert_eq!(records.len(), 100);
        assert_eq!(records[0].connection, ConnectionKind::Spline);
        assert_eq!(records[49].connection, ConnectionKind::Straight);
        assert_eq!(records[99].connection, ConnectionKind::Straight);
    }

    #[test]
    fn test_thicker_blanket_has_more_volume() {
        let thin = blanket(20.0);
        let thick = blanket(60.0);
        assert!(thick.volume().unwrap() > thin.volume().unwrap());
    }

    #[test]
    fn test_full_coverage_and_full_rotation_is_ambiguous() {
        let b = BlanketFP::new(50.0, 0.0, 360.0).unwrap();
        assert!(matches!(b.solid(), Err(ParamakError::AmbiguousFullCoverage(_))));
        let b = BlanketFP::new(50.0, 0.0, 360.0)
            .unwrap()
            .with_rotation_angle(180.0)
            .unwrap();
        assert!(b.profile().is_ok());
    }

    #[test]
    fn test_negative_radius_points_are_dropped() {
        let small = PlasmaParameters {
            major_radius: 100.0,
            minor_radius: 90.0,
            ..PlasmaParameters::default()
        };
        let b = BlanketFP::new(50.0, 90.0, 270.0)
            .unwrap()
            .with_plasma_parameters(small)
            .unwrap()
            .with_offset_from_plasma(30.0)
            .unwrap();
        let n = b.points().unwrap().len();
        assert!(n < 100);
        assert!(b.points().unwrap().iter().all(|p| p.0 > 0.0));
    }

    #[test]
    fn test_segments_are_separate_bodies() {
        let b = blanket(50.0)
            .with_segments_angles(vec![-90.0, -30.0, 30.0, 90.0])
            .unwrap();
        let solid = b.solid().unwrap();
        assert_eq!(solid.num_bodies(), 3);
        let whole = blanket(50.0).volume().unwrap();
        assert_relative_eq!(b.volume().unwrap(), whole, max_relative = 0.02);
    }

    #[test]
    fn test_custom_thickness_changes_the_fingerprint() {
        let constant = blanket(50.0);
        let custom = blanket(AngleFunction::custom(|t| 40.0 + t.abs() / 9.0));
        assert_ne!(constant.hash_value().unwrap(), custom.hash_value().unwrap());
    }

    #[test]
    fn test_physical_groups_order() {
        let names: Vec<_> = blanket(50.0).physical_groups().iter().map(|g| g.name).collect();
        assert_eq!(
            names,
            ["inside", "inner", "inner_section", "outer", "outer_section", "left_section", "right_section"]
        );
        let full = BlanketFP::new(50.0, 0.0, 180.0).unwrap();
        let names: Vec<_> = full.physical_groups().iter().map(|g| g.name).collect();
        assert_eq!(names, ["inside", "inner", "inner_section", "outer", "outer_section"]);
    }

    #[test]
    fn test_arc_blankets() {
        let h = BlanketConstantThicknessArc::horizontal((300.0, 200.0), (500.0, 0.0), (300.0, -200.0), 20.0)
            .unwrap()
            .with_rotation_angle(90.0)
            .unwrap();
        let pts = h.points().unwrap();
        assert_eq!(pts[3], (320.0, -200.0));
        assert!(h.volume().unwrap() > 0.0);
        assert_eq!(h.kind(), "BlanketConstantThicknessArcH");

        let v = BlanketConstantThicknessArc::vertical((300.0, 200.0), (500.0, 0.0), (300.0, -200.0), 20.0).unwrap();
        let pts = v.points().unwrap();
        assert_eq!(pts[3], (300.0, -220.0));
        assert_eq!(pts[5], (300.0, 220.0));
        assert!(BlanketConstantThicknessArc::vertical((1.0, 1.0), (2.0, 0.0), (1.0, -1.0), 0.0).is_err());
    }
}
