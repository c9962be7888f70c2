//! Toroidal field coils.
//!
//! Outboard coils are drawn in the XZ plane, extruded symmetrically by
//! their toroidal `distance` and copied around the Z axis. Every planform
//! is a C-shaped band open on the inboard side; the optional inner leg
//! closes it.

use std::f64::consts::{FRAC_PI_2, PI};

use serde::Serialize;
use serde_json::{json, Value};

use super::{evenly_spaced, straight};
use crate::error::{non_negative, positive, ParamakError, Result};
use crate::polyline::{ConnectionKind, Polyline};
use crate::shape::{check_rotation_angle, Color, Construction, ParametricShape, Profile, ShapeCore};
use crate::utils::{linspace, rotate, Point};
use crate::workplane::{Axis, RotationAxis, Workplane};

/// Samples along each half of a Princeton-D curve.
const PRINCETON_D_SAMPLES: usize = 40;
/// Intervals of the Simpson rule used for the Princeton-D heights.
const SIMPSON_INTERVALS: usize = 64;
/// Samples along each arc of a triple-arc coil.
const ARC_SAMPLES: usize = 24;

// =============================================================================
// Planforms
// =============================================================================

/// The poloidal outline of an outboard coil.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "planform", rename_all = "snake_case")]
pub enum TfCoilPlanform {
    /// Constant-tension ("Princeton-D") curve between the inner leg at
    /// `r1` and the outboard midplane point at `r2`.
    PrincetonD {
        /// Radius of the inboard edge of the inner leg.
        r1: f64,
        /// Outboard midplane radius of the inner curve.
        r2: f64,
        /// Vertical offset of the whole coil.
        vertical_displacement: f64,
    },
    /// Horizontal runs joined to a vertical outboard leg by sloped sections.
    CoatHanger {
        /// Inboard end of the upper horizontal run.
        horizontal_start_point: Point,
        /// Length of the horizontal runs.
        horizontal_length: f64,
        /// Centre of the vertical outboard leg.
        vertical_mid_point: Point,
        /// Length of the vertical outboard leg.
        vertical_length: f64,
    },
    /// A rectangle.
    Rectangle {
        /// Inboard upper corner of the inner outline.
        horizontal_start_point: Point,
        /// Outboard midplane point of the inner outline.
        vertical_mid_point: Point,
    },
    /// A rectangle with rounded outboard corners.
    RoundCorners {
        /// Inboard lower corner of the inner outline.
        lower_inner_coordinates: Point,
        /// Outboard midplane point of the inner outline.
        mid_point_coordinates: Point,
    },
    /// Three tangent arcs per half.
    TripleArc {
        /// Radius of the inboard edge of the coil.
        r1: f64,
        /// Height of the straight inner leg.
        h: f64,
        /// Radii of the small and middle arcs.
        radii: (f64, f64),
        /// Angular coverage of the small and middle arcs, in degrees.
        coverages: (f64, f64),
        /// Vertical offset of the whole coil.
        vertical_displacement: f64,
    },
}

impl TfCoilPlanform {
    fn kind(&self) -> &'static str {
        match self {
            TfCoilPlanform::PrincetonD { .. } => "ToroidalFieldCoilPrincetonD",
            TfCoilPlanform::CoatHanger { .. } => "ToroidalFieldCoilCoatHanger",
            TfCoilPlanform::Rectangle { .. } => "ToroidalFieldCoilRectangle",
            TfCoilPlanform::RoundCorners { .. } => "ToroidalFieldCoilRectangleRoundCorners",
            TfCoilPlanform::TripleArc { .. } => "ToroidalFieldCoilTripleArc",
        }
    }

    fn validate(&self, thickness: f64) -> Result<()> {
        match *self {
            TfCoilPlanform::PrincetonD { r1, r2, .. } => {
                positive("r1", r1)?;
                if r2 <= r1 + thickness {
                    return Err(ParamakError::out_of_range("r2", r2, r1 + thickness, f64::INFINITY));
                }
            }
            TfCoilPlanform::CoatHanger {
                horizontal_start_point,
                horizontal_length,
                vertical_mid_point,
                vertical_length,
            } => {
                positive("horizontal_length", horizontal_length)?;
                positive("vertical_length", vertical_length)?;
                let run_end = horizontal_start_point.0 + horizontal_length;
                if vertical_mid_point.0 <= run_end {
                    return Err(ParamakError::out_of_range(
                        "vertical_mid_point",
                        vertical_mid_point.0,
                        run_end,
                        f64::INFINITY,
                    ));
                }
            }
            TfCoilPlanform::Rectangle {
                horizontal_start_point,
                vertical_mid_point,
            } => {
                if horizontal_start_point.0 >= vertical_mid_point.0 {
                    return Err(ParamakError::invalid(
                        "horizontal_start_point",
                        "must lie inboard of vertical_mid_point",
                    ));
                }
                if vertical_mid_point.1 >= horizontal_start_point.1 {
                    return Err(ParamakError::invalid(
                        "vertical_mid_point",
                        "must lie below horizontal_start_point",
                    ));
                }
            }
            TfCoilPlanform::RoundCorners {
                lower_inner_coordinates,
                mid_point_coordinates,
            } => {
                if lower_inner_coordinates.0 >= mid_point_coordinates.0 {
                    return Err(ParamakError::invalid(
                        "lower_inner_coordinates",
                        "must lie inboard of mid_point_coordinates",
                    ));
                }
                if lower_inner_coordinates.1 == mid_point_coordinates.1 {
                    return Err(ParamakError::invalid(
                        "mid_point_coordinates",
                        "must differ in height from lower_inner_coordinates",
                    ));
                }
            }
            TfCoilPlanform::TripleArc {
                r1,
                h,
                radii,
                coverages,
                ..
            } => {
                if r1 - thickness < 0.0 {
                    return Err(ParamakError::out_of_range("r1", r1, thickness, f64::INFINITY));
                }
                positive("h", h)?;
                positive("small radius", radii.0)?;
                positive("mid radius", radii.1)?;
                positive("small coverage", coverages.0)?;
                positive("mid coverage", coverages.1)?;
                if coverages.0 + coverages.1 >= 180.0 {
                    return Err(ParamakError::out_of_range(
                        "coverages",
                        coverages.0 + coverages.1,
                        0.0,
                        180.0,
                    ));
                }
            }
        }
        Ok(())
    }

    /// The open band and the leg closing it.
    fn outline(&self, thickness: f64) -> Result<(Profile, Vec<Point>)> {
        match *self {
            TfCoilPlanform::PrincetonD {
                r1,
                r2,
                vertical_displacement,
            } => {
                let inner_r1 = r1 + thickness;
                let (curve, normals) = princeton_d(inner_r1, r2);
                let lift = |(x, z): Point| (x, z + vertical_displacement);
                let inner: Vec<Point> = curve.iter().copied().map(lift).collect();
                let outer: Vec<Point> = curve
                    .iter()
                    .zip(&normals)
                    .map(|(p, n)| lift((p.0 + thickness * n.0, p.1 + thickness * n.1)))
                    .collect();
                let top = inner[0].1;
                let bottom = inner[inner.len() - 1].1;
                let leg = vec![(inner_r1, top), (inner_r1, bottom), (r1, bottom), (r1, top)];
                Ok((band(&inner, &outer)?, leg))
            }
            TfCoilPlanform::TripleArc {
                r1,
                h,
                radii,
                coverages,
                vertical_displacement,
            } => {
                let lift = |(x, z): Point| (x, z + vertical_displacement);
                let inner: Vec<Point> = triple_arc(r1, h / 2.0, radii, coverages)?
                    .into_iter()
                    .map(lift)
                    .collect();
                let grown = (radii.0 + thickness, radii.1 + thickness);
                let outer: Vec<Point> = triple_arc(r1 - thickness, h / 2.0, grown, coverages)?
                    .into_iter()
                    .map(lift)
                    .collect();
                let top = h / 2.0 + vertical_displacement;
                let bottom = -h / 2.0 + vertical_displacement;
                let leg = vec![(r1 - thickness, top), (r1, top), (r1, bottom), (r1 - thickness, bottom)];
                Ok((band(&inner, &outer)?, leg))
            }
            TfCoilPlanform::Rectangle {
                horizontal_start_point: hs,
                vertical_mid_point: vm,
            } => {
                let t = thickness;
                let points = [
                    hs,
                    (hs.0 + t, hs.1),
                    (vm.0, hs.1),
                    (vm.0, -hs.1),
                    (hs.0 + t, -hs.1),
                    (hs.0, -hs.1),
                    (hs.0, -(hs.1 + t)),
                    (vm.0 + t, -(hs.1 + t)),
                    (vm.0 + t, hs.1 + t),
                    (hs.0, hs.1 + t),
                ];
                let leg = vec![points[0], points[1], points[4], points[5]];
                Ok((straight(&points)?, leg))
            }
            TfCoilPlanform::CoatHanger {
                horizontal_start_point: hs,
                horizontal_length,
                vertical_mid_point: vm,
                vertical_length,
            } => {
                let t = thickness;
                let run_end = hs.0 + horizontal_length;
                let leg_top = vm.1 + vertical_length / 2.0;
                let leg_bottom = vm.1 - vertical_length / 2.0;
                let slope = ((hs.1 - leg_top) / (vm.0 - run_end)).atan();
                let slope_mid = FRAC_PI_2 - slope;
                let points = [
                    hs,
                    (run_end, hs.1),
                    (vm.0, leg_top),
                    (vm.0, leg_bottom),
                    (run_end, -hs.1),
                    (hs.0, -hs.1),
                    (hs.0, -hs.1 - t),
                    (run_end, -hs.1 - t),
                    rotate((run_end, -hs.1), (run_end, -hs.1 - t), slope),
                    rotate((vm.0, leg_bottom), (vm.0 + t, leg_bottom), -slope_mid),
                    (vm.0 + t, leg_bottom),
                    (vm.0 + t, leg_top),
                    rotate((vm.0, leg_top), (vm.0 + t, leg_top), slope_mid),
                    rotate((run_end, hs.1), (run_end, hs.1 + t), -slope),
                    (run_end, hs.1 + t),
                    (hs.0, hs.1 + t),
                ];
                let leg = vec![hs, (hs.0 + t, hs.1), (points[5].0 + t, points[5].1), points[5]];
                Ok((straight(&points)?, leg))
            }
            TfCoilPlanform::RoundCorners {
                lower_inner_coordinates,
                mid_point_coordinates,
            } => round_corners(lower_inner_coordinates, mid_point_coordinates, thickness),
        }
    }
}

/// A band between two curves that share their end heights: `inner` in
/// order, then `outer` reversed, joined by straight ends.
fn band(inner: &[Point], outer: &[Point]) -> Result<Profile> {
    let tag = |points: Vec<Point>| {
        let last = points.len().saturating_sub(1);
        points.into_iter().enumerate().map(move |(i, (x, z))| {
            let kind = if i == last {
                ConnectionKind::Straight
            } else {
                ConnectionKind::Spline
            };
            (x, z, kind)
        })
    };
    let records = tag(inner.to_vec()).chain(tag(outer.iter().rev().copied().collect()));
    Ok(Profile::Polyline(Polyline::new(records)?))
}

/// Composite Simpson integral of `f` over `[a, b]`.
fn simpson(f: impl Fn(f64) -> f64, a: f64, b: f64, intervals: usize) -> f64 {
    let n = intervals + intervals % 2;
    let h = (b - a) / n as f64;
    let inner: f64 = (1..n)
        .map(|i| {
            let w = if i % 2 == 1 { 4.0 } else { 2.0 };
            w * f(a + h * i as f64)
        })
        .sum();
    h / 3.0 * (f(a) + inner + f(b))
}

/// Points and outward normals of a Princeton-D from `(r1, z1)` over the
/// top to `(r2, 0)` and back down to `(r1, -z1)`.
///
/// With `psi` the tangent angle, constant tension gives
/// `R = R0 exp(-k sin psi)` and `dZ/dpsi = -k R sin psi`, where
/// `R0 = sqrt(r1 r2)` and `k = ln(r2 / r1) / 2`.
fn princeton_d(r1: f64, r2: f64) -> (Vec<Point>, Vec<Point>) {
    let k = 0.5 * (r2 / r1).ln();
    let r0 = (r1 * r2).sqrt();
    let apex = k * r0 * simpson(|u| (k * u.sin()).exp() * u.sin(), 0.0, FRAC_PI_2, SIMPSON_INTERVALS);
    let at = |psi: f64| {
        let r = r0 * (-k * psi.sin()).exp();
        let drop = k * r0 * simpson(|t| (-k * t.sin()).exp() * t.sin(), 0.0, psi, SIMPSON_INTERVALS);
        ((r, apex - drop), (-psi.sin(), psi.cos()))
    };
    let top: Vec<(Point, Point)> = linspace(FRAC_PI_2, -FRAC_PI_2, PRINCETON_D_SAMPLES, true)
        .into_iter()
        .map(at)
        .collect();
    let bottom = top
        .iter()
        .rev()
        .skip(1)
        .map(|&((r, z), (nx, nz))| ((r, -z), (nx, -nz)));
    top.iter().copied().chain(bottom).unzip()
}

/// The inner curve of a triple-arc coil starting at `(r1, half_height)`,
/// mirrored below the midplane.
fn triple_arc(r1: f64, half_height: f64, radii: (f64, f64), coverages: (f64, f64)) -> Result<Vec<Point>> {
    let (small_r, mid_r) = radii;
    let small_cov = coverages.0.to_radians();
    let total_cov = small_cov + coverages.1.to_radians();

    let mut top: Vec<Point> = linspace(0.0, small_cov, ARC_SAMPLES, true)
        .into_iter()
        .map(|theta| (r1 + small_r * (1.0 - theta.cos()), half_height + small_r * theta.sin()))
        .collect();
    let (rs, zs) = top[top.len() - 1];
    top.extend(
        linspace(small_cov, total_cov, ARC_SAMPLES, true)
            .into_iter()
            .skip(1)
            .map(|theta| {
                (
                    rs + mid_r * (small_cov.cos() - theta.cos()),
                    zs + mid_r * (theta.sin() - small_cov.sin()),
                )
            }),
    );
    let (rm, zm) = top[top.len() - 1];
    if zm <= 0.0 {
        return Err(ParamakError::invalid("radii", "the middle arc ends below the midplane"));
    }
    let large_r = zm / (PI - total_cov).sin();
    top.extend(
        linspace(total_cov, PI, 2 * ARC_SAMPLES, true)
            .into_iter()
            .skip(1)
            .map(|theta| {
                (
                    rm + large_r * ((PI - theta).cos() - (PI - total_cov).cos()),
                    zm - large_r * (total_cov.sin() - (PI - theta).sin()),
                )
            }),
    );
    let bottom: Vec<Point> = top.iter().rev().skip(1).map(|&(r, z)| (r, -z)).collect();
    top.extend(bottom);
    Ok(top)
}

/// Rectangle with rounded outboard corners, open on the inboard side.
fn round_corners(lower: Point, mid: Point, thickness: f64) -> Result<(Profile, Vec<Point>)> {
    use ConnectionKind::{Circle, Straight};

    let t = thickness;
    let base = mid.0 - lower.0;
    let height = 2.0 * (mid.1 - lower.1).abs();
    let (inner_r, outer_r) = if t / base >= 1.0 {
        (0.1 * t, 1.1 * t)
    } else {
        (t * t / base, (1.0 + t / base) * t)
    };
    // Offsets of the 45 degree point of an arc from its ends.
    let long = |r: f64| std::f64::consts::FRAC_1_SQRT_2 * r;
    let short = |r: f64| r - long(r);

    let p1 = lower;
    let p2 = (p1.0 + base, p1.1);
    let p3 = (p2.0, p2.1 + height);
    let p4 = (p1.0, p1.1 + height);
    let p5 = (p4.0, p4.1 + t);
    let p6 = (p3.0, p4.1 + t);
    let p8 = (p2.0 + t, p2.1);
    let p10 = (p1.0, p1.1 - t);
    let p11 = (p2.0 - inner_r, p2.1);
    let p12 = (p11.0 + long(inner_r), p11.1 + short(inner_r));
    let p13 = (p2.0, p2.1 + inner_r);
    let p14 = (p3.0, p3.1 - inner_r);
    let p15 = (p14.0 - short(inner_r), p14.1 + long(inner_r));
    let p16 = (p3.0 - inner_r, p3.1);
    let p17 = (p6.0 - inner_r, p6.1);
    let p18 = (p17.0 + long(outer_r), p17.1 - short(outer_r));
    let p19 = (p14.0 + t, p14.1);
    let p20 = (p8.0, p8.1 + inner_r);
    let p21 = (p18.0, p20.1 - long(outer_r));
    let p22 = (p11.0, p11.1 - t);

    let records = [
        (p1, Straight),
        (p11, Circle),
        (p12, Circle),
        (p13, Straight),
        (p14, Circle),
        (p15, Circle),
        (p16, Straight),
        (p4, Straight),
        (p5, Straight),
        (p17, Circle),
        (p18, Circle),
        (p19, Straight),
        (p20, Circle),
        (p21, Circle),
        (p22, Straight),
        (p10, Straight),
    ]
    .map(|((x, z), kind)| (x, z, kind));
    let leg = vec![p1, (p1.0 + t, p1.1), (p4.0 + t, p4.1), p4];
    Ok((Profile::Polyline(Polyline::new(records)?), leg))
}

// =============================================================================
// Outboard coils
// =============================================================================

/// A set of identical outboard toroidal field coils.
///
/// ```
/// use paramak::{ParametricShape, TfCoilPlanform, ToroidalFieldCoil};
///
/// let planform = TfCoilPlanform::Rectangle {
///     horizontal_start_point: (100.0, 700.0),
///     vertical_mid_point: (800.0, 0.0),
/// };
/// let coils = ToroidalFieldCoil::new(planform, 150.0, 50.0, 1).unwrap();
/// assert_eq!(coils.points().unwrap().len(), 14);
/// ```
#[derive(Debug)]
pub struct ToroidalFieldCoil {
    core: ShapeCore,
    planform: TfCoilPlanform,
    thickness: f64,
    distance: f64,
    number_of_coils: usize,
    with_inner_leg: bool,
    azimuth_start_angle: f64,
    rotation_angle: f64,
}

impl ToroidalFieldCoil {
    /// `number_of_coils` coils of the given planform, spaced evenly from 0
    /// degrees.
    pub fn new(planform: TfCoilPlanform, thickness: f64, distance: f64, number_of_coils: usize) -> Result<Self> {
        positive("thickness", thickness)?;
        positive("distance", distance)?;
        check_number_of_coils(number_of_coils)?;
        planform.validate(thickness)?;
        let mut core = ShapeCore::new("toroidal_field_coil").tagged("outer_tf_coil_mat", planform.kind());
        core.color = Color {
            r: 0.0,
            g: 0.0,
            b: 1.0,
            a: None,
        };
        core.azimuth_placement_angle = evenly_spaced(0.0, number_of_coils);
        Ok(Self {
            core,
            planform,
            thickness,
            distance,
            number_of_coils,
            with_inner_leg: true,
            azimuth_start_angle: 0.0,
            rotation_angle: 360.0,
        })
    }

    /// Princeton-D coils.
    pub fn princeton_d(r1: f64, r2: f64, thickness: f64, distance: f64, number_of_coils: usize) -> Result<Self> {
        let planform = TfCoilPlanform::PrincetonD {
            r1,
            r2,
            vertical_displacement: 0.0,
        };
        Self::new(planform, thickness, distance, number_of_coils)
    }

    /// Rectangular coils.
    pub fn rectangle(
        horizontal_start_point: Point,
        vertical_mid_point: Point,
        thickness: f64,
        distance: f64,
        number_of_coils: usize,
    ) -> Result<Self> {
        let planform = TfCoilPlanform::Rectangle {
            horizontal_start_point,
            vertical_mid_point,
        };
        Self::new(planform, thickness, distance, number_of_coils)
    }

    /// Include (default) or omit the straight inner leg.
    pub fn with_inner_leg(mut self, with_inner_leg: bool) -> Self {
        self.with_inner_leg = with_inner_leg;
        self
    }

    /// Angle of the first coil, in degrees.
    pub fn with_azimuth_start_angle(mut self, angle: f64) -> Self {
        self.azimuth_start_angle = angle;
        self.core.azimuth_placement_angle = evenly_spaced(angle, self.number_of_coils);
        self
    }

    /// Keep only `angle` degrees of the coil set about the Z axis.
    pub fn with_rotation_angle(mut self, angle: f64) -> Result<Self> {
        check_rotation_angle(angle)?;
        self.rotation_angle = angle;
        Ok(self)
    }

    /// Change the number of coils and respace them.
    pub fn set_number_of_coils(&mut self, number_of_coils: usize) -> Result<()> {
        check_number_of_coils(number_of_coils)?;
        self.number_of_coils = number_of_coils;
        self.core.azimuth_placement_angle = evenly_spaced(self.azimuth_start_angle, number_of_coils);
        Ok(())
    }

    /// Change the planform.
    pub fn set_planform(&mut self, planform: TfCoilPlanform) -> Result<()> {
        planform.validate(self.thickness)?;
        self.planform = planform;
        Ok(())
    }

    /// The planform.
    pub fn planform(&self) -> &TfCoilPlanform {
        &self.planform
    }

    /// Radial thickness of the coil.
    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    /// Toroidal extent of each coil.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Number of coils.
    pub fn number_of_coils(&self) -> usize {
        self.number_of_coils
    }

    /// Corners of the inner leg.
    pub fn inner_leg_points(&self) -> Result<Vec<Point>> {
        Ok(self.planform.outline(self.thickness)?.1)
    }
}

fn check_number_of_coils(n: usize) -> Result<()> {
    if n == 0 {
        return Err(ParamakError::out_of_range("number_of_coils", 0.0, 1.0, f64::INFINITY));
    }
    Ok(())
}

impl ParametricShape for ToroidalFieldCoil {
    core_accessors!();

    fn kind(&self) -> &'static str {
        self.planform.kind()
    }

    fn parameters(&self) -> Value {
        json!({
            "planform": self.planform,
            "thickness": self.thickness,
            "number_of_coils": self.number_of_coils,
            "with_inner_leg": self.with_inner_leg,
        })
    }

    fn profile(&self) -> Result<Profile> {
        let (band, leg) = self.planform.outline(self.thickness)?;
        if self.with_inner_leg {
            Ok(Profile::Compound(vec![band, straight(&leg)?]))
        } else {
            Ok(band)
        }
    }

    fn construction(&self) -> Result<Construction> {
        Ok(Construction::Extrude {
            distance: self.distance,
            extrude_both: true,
            rotation_angle: self.rotation_angle,
            extrusion_start_offset: 0.0,
        })
    }
}

// =============================================================================
// Inner coils
// =============================================================================

/// How the radii of flat inner coils are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RadiusType {
    /// To the corners of the polygon.
    Corner,
    /// To the middle of the flat faces.
    Straight,
}

/// Cross-section of the inner coil segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum InnerTfCoilsShape {
    /// Flat inner and outer faces.
    Flat {
        /// Meaning of the radii.
        radius_type: RadiusType,
    },
    /// Faces following circles of the inner and outer radii.
    Circular,
}

/// The inboard legs of the toroidal field coils as a ring of segments
/// separated by gaps, drawn in the XY plane and extruded vertically.
#[derive(Debug)]
pub struct InnerTfCoils {
    core: ShapeCore,
    shape: InnerTfCoilsShape,
    height: f64,
    inner_radius: f64,
    outer_radius: f64,
    number_of_coils: usize,
    gap_size: f64,
    azimuth_start_angle: f64,
}

impl InnerTfCoils {
    /// `number_of_coils` segments between the two radii.
    pub fn new(
        shape: InnerTfCoilsShape,
        height: f64,
        inner_radius: f64,
        outer_radius: f64,
        number_of_coils: usize,
        gap_size: f64,
    ) -> Result<Self> {
        let kind = match shape {
            InnerTfCoilsShape::Flat { .. } => "InnerTfCoilsFlat",
            InnerTfCoilsShape::Circular => "InnerTfCoilsCircular",
        };
        let mut core = ShapeCore::new("inner_tf_coils").tagged("inner_tf_coil_mat", kind);
        core.workplane = Workplane::XY;
        core.rotation_axis = Some(RotationAxis::Global(Axis::Z, false));
        core.azimuth_placement_angle = evenly_spaced(0.0, number_of_coils);
        let coils = Self {
            core,
            shape,
            height,
            inner_radius,
            outer_radius,
            number_of_coils,
            gap_size,
            azimuth_start_angle: 0.0,
        };
        coils.validate()?;
        Ok(coils)
    }

    /// Segments with circular faces.
    pub fn circular(
        height: f64,
        inner_radius: f64,
        outer_radius: f64,
        number_of_coils: usize,
        gap_size: f64,
    ) -> Result<Self> {
        Self::new(
            InnerTfCoilsShape::Circular,
            height,
            inner_radius,
            outer_radius,
            number_of_coils,
            gap_size,
        )
    }

    /// Segments with flat faces.
    pub fn flat(
        height: f64,
        inner_radius: f64,
        outer_radius: f64,
        number_of_coils: usize,
        gap_size: f64,
        radius_type: RadiusType,
    ) -> Result<Self> {
        Self::new(
            InnerTfCoilsShape::Flat { radius_type },
            height,
            inner_radius,
            outer_radius,
            number_of_coils,
            gap_size,
        )
    }

    fn validate(&self) -> Result<()> {
        positive("height", self.height)?;
        check_number_of_coils(self.number_of_coils)?;
        non_negative("gap_size", self.gap_size)?;
        match self.shape {
            InnerTfCoilsShape::Circular => positive("inner_radius", self.inner_radius)?,
            InnerTfCoilsShape::Flat { .. } => non_negative("inner_radius", self.inner_radius)?,
        }
        if self.outer_radius <= self.inner_radius {
            return Err(ParamakError::out_of_range(
                "outer_radius",
                self.outer_radius,
                self.inner_radius,
                f64::INFINITY,
            ));
        }
        let (inner, _) = self.corner_distances();
        let n = self.number_of_coils as f64;
        if inner > 0.0 && self.gap_size * n > 2.0 * PI * inner {
            return Err(ParamakError::out_of_range(
                "gap_size",
                self.gap_size,
                0.0,
                2.0 * PI * inner / n,
            ));
        }
        Ok(())
    }

    fn corner_distances(&self) -> (f64, f64) {
        match self.shape {
            InnerTfCoilsShape::Flat {
                radius_type: RadiusType::Straight,
            } => {
                let half = (180.0 / self.number_of_coils as f64).to_radians();
                (self.inner_radius / half.cos(), self.outer_radius / half.cos())
            }
            _ => (self.inner_radius, self.outer_radius),
        }
    }

    /// Angle of the first segment, in degrees.
    pub fn with_azimuth_start_angle(mut self, angle: f64) -> Self {
        self.azimuth_start_angle = angle;
        self.core.azimuth_placement_angle = evenly_spaced(angle, self.number_of_coils);
        self
    }

    /// Segment height.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Gap between neighbouring segments.
    pub fn gap_size(&self) -> f64 {
        self.gap_size
    }

    /// Number of segments.
    pub fn number_of_coils(&self) -> usize {
        self.number_of_coils
    }

    /// Angular span of a segment at distance `d` and its start angle.
    fn span(&self, d: f64) -> (f64, f64) {
        let n = self.number_of_coils as f64;
        let theta = (2.0 * PI * d - self.gap_size * n) / (d * n);
        let omega = (self.gap_size / (2.0 * d)).asin();
        (theta, omega)
    }
}

fn polar(d: f64, angle: f64) -> Point {
    (d * angle.cos(), d * angle.sin())
}

impl ParametricShape for InnerTfCoils {
    core_accessors!();

    fn kind(&self) -> &'static str {
        match self.shape {
            InnerTfCoilsShape::Flat { .. } => "InnerTfCoilsFlat",
            InnerTfCoilsShape::Circular => "InnerTfCoilsCircular",
        }
    }

    fn parameters(&self) -> Value {
        json!({
            "shape": self.shape,
            "height": self.height,
            "inner_radius": self.inner_radius,
            "outer_radius": self.outer_radius,
            "number_of_coils": self.number_of_coils,
            "gap_size": self.gap_size,
        })
    }

    fn profile(&self) -> Result<Profile> {
        let (inner, outer) = self.corner_distances();
        let (theta_o, omega_o) = self.span(outer);
        match self.shape {
            InnerTfCoilsShape::Circular => {
                use ConnectionKind::{Circle, Straight};
                let (theta_i, omega_i) = self.span(inner);
                let records = [
                    (polar(inner, omega_i), Circle),
                    (polar(inner, omega_i + theta_i / 2.0), Circle),
                    (polar(inner, omega_i + theta_i), Straight),
                    (polar(outer, omega_o + theta_o), Circle),
                    (polar(outer, omega_o + theta_o / 2.0), Circle),
                    (polar(outer, omega_o), Straight),
                ]
                .map(|((x, y), kind)| (x, y, kind));
                Ok(Profile::Polyline(Polyline::new(records)?))
            }
            InnerTfCoilsShape::Flat { .. } => {
                let mut points = if inner > 0.0 {
                    let (theta_i, omega_i) = self.span(inner);
                    vec![polar(inner, omega_i), polar(inner, omega_i + theta_i)]
                } else {
                    vec![(0.0, 0.0)]
                };
                points.push(polar(outer, omega_o + theta_o));
                points.push(polar(outer, omega_o));
                straight(&points)
            }
        }
    }

    fn construction(&self) -> Result<Construction> {
        Ok(Construction::Extrude {
            distance: self.height,
            extrude_both: true,
            rotation_angle: 360.0,
            extrusion_start_offset: 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rectangle_coil(n: usize) -> ToroidalFieldCoil {
        ToroidalFieldCoil::rectangle((100.0, 700.0), (800.0, 0.0), 150.0, 50.0, n).unwrap()
    }

    #[test]
    fn test_rectangle_coil_volume() {
        let coil = rectangle_coil(1);
        let ring = 850.0 * 1700.0 - 550.0 * 1400.0;
        assert_relative_eq!(coil.volume().unwrap(), ring * 50.0, max_relative = 1e-3);

        let open = rectangle_coil(1).with_inner_leg(false);
        let notch = 150.0 * 1400.0;
        assert_relative_eq!(open.volume().unwrap(), (ring - notch) * 50.0, max_relative = 1e-3);
    }

    #[test]
    fn test_rectangle_coil_placements() {
        let mut coil = rectangle_coil(4);
        assert_eq!(coil.core().azimuth_placement_angle, vec![0.0, 90.0, 180.0, 270.0]);
        let coil_b = rectangle_coil(4).with_azimuth_start_angle(10.0);
        assert_eq!(coil_b.core().azimuth_placement_angle[1], 100.0);
        let before = coil.hash_value().unwrap();
        coil.set_number_of_coils(5).unwrap();
        assert_ne!(coil.hash_value().unwrap(), before);
        assert!(coil.set_number_of_coils(0).is_err());
    }

    #[test]
    fn test_rectangle_coil_validation() {
        assert!(ToroidalFieldCoil::rectangle((900.0, 700.0), (800.0, 0.0), 150.0, 50.0, 1).is_err());
        assert!(ToroidalFieldCoil::rectangle((100.0, 700.0), (800.0, 800.0), 150.0, 50.0, 1).is_err());
        assert!(ToroidalFieldCoil::rectangle((100.0, 700.0), (800.0, 0.0), 0.0, 50.0, 1).is_err());
    }

    #[test]
    fn test_princeton_d_extent() {
        let coil = ToroidalFieldCoil::princeton_d(100.0, 500.0, 20.0, 30.0, 1).unwrap();
        let points = coil.points().unwrap();
        let min_x = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let max_x = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        let max_z = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
        let min_z = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        assert_relative_eq!(min_x, 100.0, epsilon = 1e-9);
        assert_relative_eq!(max_x, 520.0, epsilon = 1e-6);
        assert_relative_eq!(max_z, -min_z, epsilon = 1e-6);
        assert!(max_z > 0.0);
    }

    #[test]
    fn test_princeton_d_inner_curve_meets_midplane() {
        let (curve, normals) = princeton_d(120.0, 500.0);
        let mid = curve.len() / 2;
        assert_relative_eq!(curve[mid].0, 500.0, epsilon = 1e-6);
        assert_relative_eq!(curve[mid].1, 0.0, epsilon = 1e-6);
        assert_relative_eq!(curve[0].0, 120.0, epsilon = 1e-6);
        assert_relative_eq!(normals[0].0, -1.0, epsilon = 1e-9);
        // The curve rises above the top of the leg before turning down.
        let apex = curve.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
        assert!(apex > curve[0].1);
    }

    #[test]
    fn test_princeton_d_copies_scale_volume() {
        let one = ToroidalFieldCoil::princeton_d(100.0, 500.0, 20.0, 30.0, 1).unwrap();
        let three = ToroidalFieldCoil::princeton_d(100.0, 500.0, 20.0, 30.0, 3).unwrap();
        assert_relative_eq!(three.volume().unwrap(), 3.0 * one.volume().unwrap(), max_relative = 0.01);
        assert!(ToroidalFieldCoil::princeton_d(100.0, 110.0, 20.0, 30.0, 1).is_err());
    }

    #[test]
    fn test_triple_arc_is_symmetric() {
        let planform = TfCoilPlanform::TripleArc {
            r1: 100.0,
            h: 200.0,
            radii: (100.0, 200.0),
            coverages: (20.0, 50.0),
            vertical_displacement: 0.0,
        };
        let coil = ToroidalFieldCoil::new(planform.clone(), 10.0, 20.0, 1).unwrap();
        let points = coil.points().unwrap();
        let max_z = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
        let min_z = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let min_x = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        assert_relative_eq!(max_z, -min_z, epsilon = 1e-6);
        assert_relative_eq!(min_x, 90.0, epsilon = 1e-9);

        let open = ToroidalFieldCoil::new(planform, 10.0, 20.0, 1).unwrap().with_inner_leg(false);
        let leg = 10.0 * 200.0 * 20.0;
        assert_relative_eq!(coil.volume().unwrap() - open.volume().unwrap(), leg, max_relative = 0.02);
    }

    #[test]
    fn test_triple_arc_coverage_limit() {
        let planform = TfCoilPlanform::TripleArc {
            r1: 100.0,
            h: 200.0,
            radii: (100.0, 200.0),
            coverages: (90.0, 90.0),
            vertical_displacement: 0.0,
        };
        assert!(ToroidalFieldCoil::new(planform, 10.0, 20.0, 1).is_err());
    }

    #[test]
    fn test_coat_hanger() {
        let planform = TfCoilPlanform::CoatHanger {
            horizontal_start_point: (200.0, 500.0),
            horizontal_length: 400.0,
            vertical_mid_point: (700.0, 0.0),
            vertical_length: 200.0,
        };
        let coil = ToroidalFieldCoil::new(planform.clone(), 50.0, 50.0, 1).unwrap();
        assert_eq!(coil.points().unwrap().len(), 20);
        let open = ToroidalFieldCoil::new(planform, 50.0, 50.0, 1).unwrap().with_inner_leg(false);
        assert_eq!(open.points().unwrap().len(), 16);
        assert_relative_eq!(
            coil.volume().unwrap() - open.volume().unwrap(),
            50.0 * 1000.0 * 50.0,
            max_relative = 0.01
        );
    }

    #[test]
    fn test_round_corners() {
        let planform = TfCoilPlanform::RoundCorners {
            lower_inner_coordinates: (100.0, -500.0),
            mid_point_coordinates: (600.0, 0.0),
        };
        let coil = ToroidalFieldCoil::new(planform, 50.0, 40.0, 1).unwrap();
        assert_eq!(coil.inner_leg_points().unwrap()[2], (150.0, 500.0));
        // Ring plus leg; the rounded outboard corners take a little off.
        let full = 550.0 * 1100.0 - 500.0 * 1000.0 + 50.0 * 1000.0;
        let volume = coil.volume().unwrap();
        assert!(volume < full * 40.0);
        assert!(volume > full * 40.0 * 0.98);

        let bad = TfCoilPlanform::RoundCorners {
            lower_inner_coordinates: (700.0, -500.0),
            mid_point_coordinates: (600.0, 0.0),
        };
        assert!(ToroidalFieldCoil::new(bad, 50.0, 40.0, 1).is_err());
    }

    #[test]
    fn test_inner_coils_circular_volume() {
        let coils = InnerTfCoils::circular(500.0, 50.0, 150.0, 6, 5.0).unwrap();
        let annulus = PI * (150.0f64.powi(2) - 50.0f64.powi(2));
        let gaps = 6.0 * 5.0 * 100.0;
        assert_relative_eq!(coils.volume().unwrap(), (annulus - gaps) * 500.0, max_relative = 0.02);
        assert_eq!(coils.core().material_tag.as_deref(), Some("inner_tf_coil_mat"));
    }

    #[test]
    fn test_inner_coils_gap_too_large() {
        let err = InnerTfCoils::circular(500.0, 10.0, 150.0, 10, 10.0).unwrap_err();
        assert!(matches!(err, ParamakError::ParameterOutOfRange { ref parameter, .. } if parameter == "gap_size"));
    }

    #[test]
    fn test_inner_coils_flat() {
        let corner = InnerTfCoils::flat(100.0, 0.0, 100.0, 4, 0.0, RadiusType::Corner).unwrap();
        assert_eq!(corner.points().unwrap().len(), 3);
        // Four touching right-angle triangles make a square of diagonal 200.
        assert_relative_eq!(corner.volume().unwrap(), 20000.0 * 100.0, max_relative = 1e-3);

        let straight = InnerTfCoils::flat(100.0, 0.0, 100.0, 4, 0.0, RadiusType::Straight).unwrap();
        assert_relative_eq!(straight.volume().unwrap(), 40000.0 * 100.0, max_relative = 1e-3);
    }
}
