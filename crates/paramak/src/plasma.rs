//! Parametric tokamak plasma cross-sections.
//!
//! The boundary follows
//!
//! ```text
//! R(θ) = R0 + a·cos(θ + δ·sin θ)
//! Z(θ) = κ·a·sin θ + Zv
//! ```
//!
//! sampled at `num_points` evenly spaced angles starting on the outboard
//! midplane and running counter-clockwise in the (R, Z) plane.

use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{within, ParamakError, Result};
use crate::polyline::{ConnectionKind, Polyline, PolylinePoint};
use crate::shape::check_rotation_angle;
use crate::shape::{Construction, ParametricShape, Profile, ShapeCore};
use crate::utils::{linspace, Point};

/// Magnetic configuration: how many X-points the boundary has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlasmaConfiguration {
    /// Smooth boundary.
    #[default]
    NonNull,
    /// One X-point below the plasma.
    SingleNull,
    /// X-points above and below.
    DoubleNull,
}

impl fmt::Display for PlasmaConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlasmaConfiguration::NonNull => "non-null",
            PlasmaConfiguration::SingleNull => "single-null",
            PlasmaConfiguration::DoubleNull => "double-null",
        })
    }
}

impl FromStr for PlasmaConfiguration {
    type Err = ParamakError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "non-null" => Ok(PlasmaConfiguration::NonNull),
            "single-null" => Ok(PlasmaConfiguration::SingleNull),
            "double-null" => Ok(PlasmaConfiguration::DoubleNull),
            other => Err(ParamakError::invalid(
                "configuration",
                format!("expected non-null, single-null or double-null, got {other:?}"),
            )),
        }
    }
}

/// Shaping parameters of a plasma boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlasmaParameters {
    /// Major radius R0.
    pub major_radius: f64,
    /// Minor radius a.
    pub minor_radius: f64,
    /// Elongation κ.
    pub elongation: f64,
    /// Triangularity δ.
    pub triangularity: f64,
    /// Vertical displacement Zv.
    pub vertical_displacement: f64,
    /// Number of boundary samples.
    pub num_points: usize,
    /// X-point configuration.
    pub configuration: PlasmaConfiguration,
    /// Relative offset of the X-points beyond the boundary tips.
    pub x_point_shift: f64,
}

impl Default for PlasmaParameters {
    fn default() -> Self {
        Self {
            major_radius: 450.0,
            minor_radius: 150.0,
            elongation: 2.0,
            triangularity: 0.55,
            vertical_displacement: 0.0,
            num_points: 50,
            configuration: PlasmaConfiguration::NonNull,
            x_point_shift: 0.1,
        }
    }
}

impl PlasmaParameters {
    /// Check every bound.
    pub fn validate(&self) -> Result<()> {
        within("major_radius", self.major_radius, 1.0, f64::INFINITY)?;
        within("minor_radius", self.minor_radius, 1.0, self.major_radius)?;
        within("elongation", self.elongation, 0.0, 10.0)?;
        within("x_point_shift", self.x_point_shift, 0.0, 1.0)?;
        if !self.triangularity.is_finite() || !self.vertical_displacement.is_finite() {
            return Err(ParamakError::invalid("triangularity", "must be finite"));
        }
        if self.num_points < 3 {
            return Err(ParamakError::out_of_range(
                "num_points",
                self.num_points as f64,
                3.0,
                f64::INFINITY,
            ));
        }
        Ok(())
    }

    /// Boundary point at angle `theta` (radians).
    pub fn point_at(&self, theta: f64) -> Point {
        let a = self.minor_radius;
        (
            self.major_radius + a * (theta + self.triangularity * theta.sin()).cos(),
            self.elongation * a * theta.sin() + self.vertical_displacement,
        )
    }

    /// Derivative `(dR/dθ, dZ/dθ)` at `theta`.
    pub fn tangent_at(&self, theta: f64) -> Point {
        let a = self.minor_radius;
        let phase = theta + self.triangularity * theta.sin();
        (
            -a * phase.sin() * (1.0 + self.triangularity * theta.cos()),
            self.elongation * a * theta.cos(),
        )
    }

    /// Outward unit normal at `theta`.
    pub fn normal_at(&self, theta: f64) -> Point {
        let (dr, dz) = self.tangent_at(theta);
        let len = dr.hypot(dz);
        if len == 0.0 {
            return (theta.cos(), theta.sin());
        }
        (dz / len, -dr / len)
    }

    /// Topmost boundary point.
    pub fn high_point(&self) -> Point {
        (
            self.major_radius - self.triangularity * self.minor_radius,
            self.elongation * self.minor_radius + self.vertical_displacement,
        )
    }

    /// Bottommost boundary point.
    pub fn low_point(&self) -> Point {
        (
            self.major_radius - self.triangularity * self.minor_radius,
            -self.elongation * self.minor_radius + self.vertical_displacement,
        )
    }

    /// Inboard midplane point.
    pub fn inner_equatorial_point(&self) -> Point {
        (self.major_radius - self.minor_radius, self.vertical_displacement)
    }

    /// Outboard midplane point.
    pub fn outer_equatorial_point(&self) -> Point {
        (self.major_radius + self.minor_radius, self.vertical_displacement)
    }

    /// Lower X-point, for single- and double-null plasmas.
    pub fn lower_x_point(&self) -> Option<Point> {
        match self.configuration {
            PlasmaConfiguration::NonNull => None,
            _ => {
                let s = 1.0 + self.x_point_shift;
                Some((
                    self.major_radius - s * self.triangularity * self.minor_radius,
                    -s * self.elongation * self.minor_radius + self.vertical_displacement,
                ))
            }
        }
    }

    /// Upper X-point, for double-null plasmas.
    pub fn upper_x_point(&self) -> Option<Point> {
        match self.configuration {
            PlasmaConfiguration::DoubleNull => {
                let s = 1.0 + self.x_point_shift;
                self.lower_x_point().map(|(x, _)| {
                    (
                        x,
                        s * self.elongation * self.minor_radius + self.vertical_displacement,
                    )
                })
            }
            _ => None,
        }
    }

    /// The closed boundary polyline: splines through the samples, with
    /// each X-point replacing the nearest tip sample and joined to its
    /// neighbours by straight edges.
    ///
    /// The edge back to the first sample takes the last sample's
    /// connection, so a smooth boundary closes with a spline.
    pub fn polyline(&self) -> Result<Polyline> {
        self.validate()?;
        let mut records: Vec<PolylinePoint> = linspace(0.0, TAU, self.num_points, false)
            .into_iter()
            .map(|t| {
                let (r, z) = self.point_at(t);
                PolylinePoint::new(r, z, ConnectionKind::Spline)
            })
            .collect();
        let n = records.len();

        let lowest = (0..n).min_by(|&i, &j| records[i].y.total_cmp(&records[j].y));
        let highest = (0..n).max_by(|&i, &j| records[i].y.total_cmp(&records[j].y));
        for (x_point, index) in [(self.lower_x_point(), lowest), (self.upper_x_point(), highest)] {
            if let (Some((x, y)), Some(i)) = (x_point, index) {
                records[i] = PolylinePoint::new(x, y, ConnectionKind::Straight);
                records[(i + n - 1) % n].connection = ConnectionKind::Straight;
            }
        }
        Polyline::closed(records)
    }
}

/// A plasma revolved about the vertical axis.
///
/// ```
/// use paramak::Plasma;
///
/// let plasma = Plasma::new().with_shape(620.0, 210.0, 1.85, 0.33).unwrap();
/// let (inner, outer) = (plasma.inner_equatorial_point(), plasma.outer_equatorial_point());
/// assert!((outer.0 - inner.0 - 420.0).abs() < 1e-9);
/// ```
#[derive(Debug)]
pub struct Plasma {
    core: ShapeCore,
    params: PlasmaParameters,
    rotation_angle: f64,
}

impl Default for Plasma {
    fn default() -> Self {
        Self::new()
    }
}

impl Plasma {
    /// A plasma with default parameters.
    pub fn new() -> Self {
        Self {
            core: ShapeCore::new("plasma").tagged("DT_plasma", "plasma"),
            params: PlasmaParameters::default(),
            rotation_angle: 360.0,
        }
    }

    /// A plasma from explicit parameters.
    pub fn from_parameters(params: PlasmaParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            ..Self::new()
        })
    }

    /// Derive the shaping parameters from the midplane extents and the top
    /// of the plasma.
    pub fn from_points(
        outer_equatorial_x: f64,
        inner_equatorial_x: f64,
        high_point: Point,
    ) -> Result<Self> {
        let minor_radius = (outer_equatorial_x - inner_equatorial_x) / 2.0;
        if minor_radius <= 0.0 {
            return Err(ParamakError::invalid(
                "outer_equatorial_x_point",
                "must lie outboard of the inner equatorial point",
            ));
        }
        let major_radius = inner_equatorial_x + minor_radius;
        Self::from_parameters(PlasmaParameters {
            major_radius,
            minor_radius,
            elongation: high_point.1 / minor_radius,
            triangularity: (major_radius - high_point.0) / minor_radius,
            ..PlasmaParameters::default()
        })
    }

    /// Set the four shaping parameters at once.
    pub fn with_shape(
        mut self,
        major_radius: f64,
        minor_radius: f64,
        elongation: f64,
        triangularity: f64,
    ) -> Result<Self> {
        let params = PlasmaParameters {
            major_radius,
            minor_radius,
            elongation,
            triangularity,
            ..self.params
        };
        params.validate()?;
        self.params = params;
        Ok(self)
    }

    /// Set the X-point configuration.
    pub fn with_configuration(mut self, configuration: PlasmaConfiguration) -> Self {
        self.params.configuration = configuration;
        self
    }

    /// Set the vertical displacement.
    pub fn with_vertical_displacement(mut self, displacement: f64) -> Self {
        self.params.vertical_displacement = displacement;
        self
    }

    /// Set the revolve angle.
    pub fn with_rotation_angle(mut self, angle: f64) -> Result<Self> {
        check_rotation_angle(angle)?;
        self.rotation_angle = angle;
        Ok(self)
    }

    /// Replace every parameter.
    pub fn set_parameters(&mut self, params: PlasmaParameters) -> Result<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    /// The shaping parameters.
    pub fn parameters_ref(&self) -> &PlasmaParameters {
        &self.params
    }

    /// Revolve angle in degrees.
    pub fn rotation_angle(&self) -> f64 {
        self.rotation_angle
    }

    /// See [`PlasmaParameters::high_point`].
    pub fn high_point(&self) -> Point {
        self.params.high_point()
    }

    /// See [`PlasmaParameters::low_point`].
    pub fn low_point(&self) -> Point {
        self.params.low_point()
    }

    /// See [`PlasmaParameters::inner_equatorial_point`].
    pub fn inner_equatorial_point(&self) -> Point {
        self.params.inner_equatorial_point()
    }

    /// See [`PlasmaParameters::outer_equatorial_point`].
    pub fn outer_equatorial_point(&self) -> Point {
        self.params.outer_equatorial_point()
    }

    /// See [`PlasmaParameters::lower_x_point`].
    pub fn lower_x_point(&self) -> Option<Point> {
        self.params.lower_x_point()
    }

    /// See [`PlasmaParameters::upper_x_point`].
    pub fn upper_x_point(&self) -> Option<Point> {
        self.params.upper_x_point()
    }
}

impl ParametricShape for Plasma {
    fn core(&self) -> &ShapeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ShapeCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        "Plasma"
    }

    fn parameters(&self) -> Value {
        json!(self.params)
    }

    fn profile(&self) -> Result<Profile> {
        Ok(Profile::Polyline(self.params.polyline()?))
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

    fn iter_plasma() -> Plasma {
        Plasma::new().with_shape(620.0, 210.0, 1.85, 0.33).unwrap()
    }

    #[test]
    fn test_landmarks() {
        let p = iter_plasma();
        assert_relative_eq!(p.inner_equatorial_point().0, 410.0);
        assert_relative_eq!(p.outer_equatorial_point().0, 830.0);
        assert_relative_eq!(p.inner_equatorial_point().1, 0.0);
        assert_relative_eq!(p.high_point().1, 388.5, epsilon = 1e-9);
        assert_relative_eq!(p.low_point().1, -388.5, epsilon = 1e-9);
        assert_relative_eq!(
            p.outer_equatorial_point().0 - p.inner_equatorial_point().0,
            2.0 * 210.0
        );
    }

    #[test]
    fn test_points_are_closed() {
        let pts = iter_plasma().points().unwrap();
        assert_eq!(pts.len(), 51);
        assert_eq!(pts.first(), pts.last());
        assert_relative_eq!(pts[0].0, 830.0, epsilon = 1e-9);

        let line = iter_plasma().params.polyline().unwrap();
        let records = line.records();
        assert_eq!(records[records.len() - 2].connection, ConnectionKind::Spline);
    }

    #[test]
    fn test_parameter_bounds() {
        assert!(Plasma::new().with_shape(450.0, 0.5, 2.0, 0.5).is_err());
        assert!(Plasma::new().with_shape(450.0, 150.0, 11.0, 0.5).is_err());
        assert!(Plasma::new().with_shape(450.0, 150.0, -1.0, 0.5).is_err());
        assert!(Plasma::new().with_shape(100.0, 150.0, 2.0, 0.5).is_err());
        assert!(Plasma::new().with_rotation_angle(0.0).is_err());
    }

    #[test]
    fn test_x_points() {
        let p = iter_plasma();
        assert!(p.lower_x_point().is_none());

        let single = iter_plasma().with_configuration(PlasmaConfiguration::SingleNull);
        let (x, y) = single.lower_x_point().unwrap();
        assert_relative_eq!(x, 620.0 - 1.1 * 0.33 * 210.0, epsilon = 1e-9);
        assert_relative_eq!(y, -1.1 * 1.85 * 210.0, epsilon = 1e-9);
        assert!(single.upper_x_point().is_none());
        let pts = single.points().unwrap();
        assert!(pts.iter().any(|p| (p.1 - y).abs() < 1e-9));

        let double = iter_plasma().with_configuration(PlasmaConfiguration::DoubleNull);
        let (_, top) = double.upper_x_point().unwrap();
        assert_relative_eq!(top, -y, epsilon = 1e-9);
        let line = double.params.polyline().unwrap();
        assert!(line
            .records()
            .iter()
            .filter(|r| r.connection == ConnectionKind::Straight)
            .count()
            >= 4);
    }

    #[test]
    fn test_from_points() {
        let p = Plasma::from_points(830.0, 410.0, (550.7, 388.5)).unwrap();
        let params = p.parameters_ref();
        assert_relative_eq!(params.major_radius, 620.0);
        assert_relative_eq!(params.minor_radius, 210.0);
        assert_relative_eq!(params.elongation, 1.85, epsilon = 1e-12);
        assert_relative_eq!(params.triangularity, 0.33, epsilon = 1e-12);
    }

    #[test]
    fn test_normals_point_outward() {
        let params = iter_plasma().params;
        for t in linspace(0.0, TAU, 16, false) {
            let (r, z) = params.point_at(t);
            let (nr, nz) = params.normal_at(t);
            let out = (r + nr - 620.0).hypot(z + nz) > (r - 620.0).hypot(z);
            assert!(out, "normal at {t} points inward");
        }
    }

    #[test]
    fn test_configuration_parsing() {
        assert_eq!(
            "single-null".parse::<PlasmaConfiguration>().unwrap(),
            PlasmaConfiguration::SingleNull
        );
        assert!("triple-null".parse::<PlasmaConfiguration>().is_err());
    }

    #[test]
    fn test_volume_positive() {
        let p = Plasma::new().with_rotation_angle(90.0).unwrap();
        assert!(p.volume().unwrap() > 0.0);
    }
}
