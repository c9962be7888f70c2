//! Poloidal field coils and their casings.

use paramak_kernel::{Kernel, Solid};
use serde_json::{json, Value};

use super::{hollow_pairs, rectangle, same_lengths, straight};
use crate::error::{non_negative, positive, ParamakError, Result};
use crate::shape::{check_rotation_angle, construct_leaves, Construction, ParametricShape, Profile, ShapeCore};
use crate::utils::Point;

fn check_coil(height: f64, width: f64) -> Result<()> {
    positive("height", height)?;
    positive("width", width)
}

// =============================================================================
// Single coils
// =============================================================================

/// A rectangular coil revolved about the vertical axis.
#[derive(Debug)]
pub struct PoloidalFieldCoil {
    core: ShapeCore,
    height: f64,
    width: f64,
    center_point: Point,
    rotation_angle: f64,
}

impl PoloidalFieldCoil {
    /// A `width` by `height` coil centred on `center_point`.
    pub fn new(height: f64, width: f64, center_point: Point) -> Result<Self> {
        check_coil(height, width)?;
        let mut core = ShapeCore::new("pf_coil").tagged("pf_coil_mat", "PoloidalFieldCoil");
        core.color = crate::shape::Color {
            r: 1.0,
            g: 1.0,
            b: 0.498,
            a: None,
        };
        Ok(Self {
            core,
            height,
            width,
            center_point,
            rotation_angle: 360.0,
        })
    }

    /// A coil spanning two opposite corners.
    pub fn from_corners(corner_a: Point, corner_b: Point) -> Result<Self> {
        let height = (corner_a.1 - corner_b.1).abs();
        let width = (corner_a.0 - corner_b.0).abs();
        let center = ((corner_a.0 + corner_b.0) / 2.0, (corner_a.1 + corner_b.1) / 2.0);
        Self::new(height, width, center)
    }

    /// Revolve angle in degrees.
    pub fn with_rotation_angle(mut self, angle: f64) -> Result<Self> {
        check_rotation_angle(angle)?;
        self.rotation_angle = angle;
        Ok(self)
    }

    /// Coil height.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Coil width.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Coil centre.
    pub fn center_point(&self) -> Point {
        self.center_point
    }

    /// Move the coil.
    pub fn set_center_point(&mut self, center_point: Point) {
        self.center_point = center_point;
    }
}

impl ParametricShape for PoloidalFieldCoil {
    core_accessors!();

    fn kind(&self) -> &'static str {
        "PoloidalFieldCoil"
    }

    fn profile(&self) -> Result<Profile> {
        straight(&rectangle(self.center_point, self.width, self.height))
    }

    fn construction(&self) -> Result<Construction> {
        Ok(Construction::Rotate {
            rotation_angle: self.rotation_angle,
        })
    }
}

/// A rectangular casing of constant thickness around a coil.
#[derive(Debug)]
pub struct PoloidalFieldCoilCase {
    core: ShapeCore,
    coil_height: f64,
    coil_width: f64,
    center_point: Point,
    casing_thickness: f64,
    rotation_angle: f64,
}

impl PoloidalFieldCoilCase {
    /// A casing around a `coil_width` by `coil_height` coil.
    pub fn new(casing_thickness: f64, coil_height: f64, coil_width: f64, center_point: Point) -> Result<Self> {
        check_coil(coil_height, coil_width)?;
        positive("casing_thickness", casing_thickness)?;
        let mut core = ShapeCore::new("pf_coil_case").tagged("pf_coil_case_mat", "PoloidalFieldCoilCase");
        core.color = crate::shape::Color {
            r: 1.0,
            g: 1.0,
            b: 0.498,
            a: None,
        };
        Ok(Self {
            core,
            coil_height,
            coil_width,
            center_point,
            casing_thickness,
            rotation_angle: 360.0,
        })
    }

    /// A casing fitted to `coil`.
    pub fn for_coil(coil: &PoloidalFieldCoil, casing_thickness: f64) -> Result<Self> {
        let mut case = Self::new(casing_thickness, coil.height, coil.width, coil.center_point)?;
        case.core.stp_filename = Some("PoloidalFieldCoilCaseFC.stp".into());
        case.core.stl_filename = Some("PoloidalFieldCoilCaseFC.stl".into());
        Ok(case)
    }

    /// Revolve angle in degrees.
    pub fn with_rotation_angle(mut self, angle: f64) -> Result<Self> {
        check_rotation_angle(angle)?;
        self.rotation_angle = angle;
        Ok(self)
    }

    /// Casing thickness.
    pub fn casing_thickness(&self) -> f64 {
        self.casing_thickness
    }
}

impl ParametricShape for PoloidalFieldCoilCase {
    core_accessors!();

    fn kind(&self) -> &'static str {
        "PoloidalFieldCoilCase"
    }

    fn parameters(&self) -> Value {
        json!({ "casing_thickness": self.casing_thickness })
    }

    fn profile(&self) -> Result<Profile> {
        let t = self.casing_thickness;
        Ok(Profile::Compound(vec![
            straight(&rectangle(self.center_point, self.coil_width + 2.0 * t, self.coil_height + 2.0 * t))?,
            straight(&rectangle(self.center_point, self.coil_width, self.coil_height))?,
        ]))
    }

    fn construction(&self) -> Result<Construction> {
        Ok(Construction::Rotate {
            rotation_angle: self.rotation_angle,
        })
    }

    fn construct(&self, kernel: &dyn Kernel) -> Result<Solid> {
        hollow_pairs(&self.core.name, construct_leaves(self, kernel)?, kernel)
    }
}

// =============================================================================
// Sets
// =============================================================================

/// Several rectangular coils kept as separate bodies of one solid.
#[derive(Debug)]
pub struct PoloidalFieldCoilSet {
    core: ShapeCore,
    heights: Vec<f64>,
    widths: Vec<f64>,
    center_points: Vec<Point>,
    rotation_angle: f64,
}

impl PoloidalFieldCoilSet {
    /// One coil per `(height, width, center_point)` triple.
    pub fn new(heights: Vec<f64>, widths: Vec<f64>, center_points: Vec<Point>) -> Result<Self> {
        same_lengths("heights, widths and center_points", &[heights.len(), widths.len(), center_points.len()])?;
        if heights.is_empty() {
            return Err(ParamakError::invalid("heights", "a coil set needs at least one coil"));
        }
        for (h, w) in heights.iter().zip(&widths) {
            check_coil(*h, *w)?;
        }
        let mut core = ShapeCore::new("pf_coil").tagged("pf_coil_mat", "PoloidalFieldCoil");
        core.color = crate::shape::Color {
            r: 1.0,
            g: 1.0,
            b: 0.498,
            a: None,
        };
        Ok(Self {
            core,
            heights,
            widths,
            center_points,
            rotation_angle: 360.0,
        })
    }

    /// Revolve angle in degrees.
    pub fn with_rotation_angle(mut self, angle: f64) -> Result<Self> {
        check_rotation_angle(angle)?;
        self.rotation_angle = angle;
        Ok(self)
    }

    /// Coil heights.
    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    /// Coil widths.
    pub fn widths(&self) -> &[f64] {
        &self.widths
    }

    /// Coil centres.
    pub fn center_points(&self) -> &[Point] {
        &self.center_points
    }
}

impl ParametricShape for PoloidalFieldCoilSet {
    core_accessors!();

    fn kind(&self) -> &'static str {
        "PoloidalFieldCoilSet"
    }

    fn profile(&self) -> Result<Profile> {
        self.heights
            .iter()
            .zip(&self.widths)
            .zip(&self.center_points)
            .map(|((h, w), c)| straight(&rectangle(*c, *w, *h)))
            .collect::<Result<Vec<_>>>()
            .map(Profile::Compound)
    }

    fn construction(&self) -> Result<Construction> {
        Ok(Construction::Rotate {
            rotation_angle: self.rotation_angle,
        })
    }

    fn construct(&self, kernel: &dyn Kernel) -> Result<Solid> {
        let coils = construct_leaves(self, kernel)?;
        Ok(Solid::compound(coils.iter()))
    }
}

/// Casings for a set of coils. A zero thickness leaves that coil without
/// a casing.
#[derive(Debug)]
pub struct PoloidalFieldCoilCaseSet {
    core: ShapeCore,
    heights: Vec<f64>,
    widths: Vec<f64>,
    center_points: Vec<Point>,
    casing_thicknesses: Vec<f64>,
    rotation_angle: f64,
}

impl PoloidalFieldCoilCaseSet {
    /// Casings of the given thicknesses around the described coils.
    pub fn new(
        heights: Vec<f64>,
        widths: Vec<f64>,
        casing_thicknesses: Vec<f64>,
        center_points: Vec<Point>,
    ) -> Result<Self> {
        same_lengths(
            "heights, widths, center_points and casing_thicknesses",
            &[heights.len(), widths.len(), center_points.len(), casing_thicknesses.len()],
        )?;
        for (h, w) in heights.iter().zip(&widths) {
            check_coil(*h, *w)?;
        }
        for t in &casing_thicknesses {
            non_negative("casing_thicknesses", *t)?;
        }
        if casing_thicknesses.iter().all(|t| *t == 0.0) {
            return Err(ParamakError::invalid(
                "casing_thicknesses",
                "at least one casing must have a thickness",
            ));
        }
        let mut core = ShapeCore::new("pf_coil_case_set").tagged("pf_coil_case_mat", "PoloidalFieldCoilCaseSet");
        core.color = crate::shape::Color {
            r: 1.0,
            g: 1.0,
            b: 0.498,
            a: None,
        };
        Ok(Self {
            core,
            heights,
            widths,
            center_points,
            casing_thicknesses,
            rotation_angle: 360.0,
        })
    }

    /// Casings of one `thickness` around every coil of `coils`.
    pub fn for_coil_set(coils: &PoloidalFieldCoilSet, thickness: f64) -> Result<Self> {
        let n = coils.heights.len();
        Self::for_coil_set_each(coils, vec![thickness; n])
    }

    /// Casings with per-coil thicknesses around `coils`.
    pub fn for_coil_set_each(coils: &PoloidalFieldCoilSet, thicknesses: Vec<f64>) -> Result<Self> {
        if thicknesses.len() != coils.heights.len() {
            return Err(ParamakError::invalid(
                "casing_thicknesses",
                format!(
                    "{} thicknesses for {} coils",
                    thicknesses.len(),
                    coils.heights.len()
                ),
            ));
        }
        let mut set = Self::new(
            coils.heights.clone(),
            coils.widths.clone(),
            thicknesses,
            coils.center_points.clone(),
        )?;
        set.core.name = "pf_coil_case_set_fc".into();
        set.core.stp_filename = Some("PoloidalFieldCoilCaseSetFC.stp".into());
        set.core.stl_filename = Some("PoloidalFieldCoilCaseSetFC.stl".into());
        Ok(set)
    }

    /// Casings around individual coils.
    pub fn for_coils(coils: &[&PoloidalFieldCoil], thickness: f64) -> Result<Self> {
        let mut set = Self::new(
            coils.iter().map(|c| c.height).collect(),
            coils.iter().map(|c| c.width).collect(),
            vec![thickness; coils.len()],
            coils.iter().map(|c| c.center_point).collect(),
        )?;
        set.core.name = "pf_coil_case_set_fc".into();
        Ok(set)
    }

    /// Revolve angle in degrees.
    pub fn with_rotation_angle(mut self, angle: f64) -> Result<Self> {
        check_rotation_angle(angle)?;
        self.rotation_angle = angle;
        Ok(self)
    }
}

impl ParametricShape for PoloidalFieldCoilCaseSet {
    core_accessors!();

    fn kind(&self) -> &'static str {
        "PoloidalFieldCoilCaseSet"
    }

    fn parameters(&self) -> Value {
        json!({ "casing_thicknesses": self.casing_thicknesses })
    }

    fn profile(&self) -> Result<Profile> {
        let mut parts = Vec::new();
        for (((h, w), c), t) in self
            .heights
            .iter()
            .zip(&self.widths)
            .zip(&self.center_points)
            .zip(&self.casing_thicknesses)
        {
            if *t == 0.0 {
                continue;
            }
            parts.push(straight(&rectangle(*c, w + 2.0 * t, h + 2.0 * t))?);
            parts.push(straight(&rectangle(*c, *w, *h))?);
        }
        Ok(Profile::Compound(parts))
    }

    fn construction(&self) -> Result<Construction> {
        Ok(Construction::Rotate {
            rotation_angle: self.rotation_angle,
        })
    }

    fn construct(&self, kernel: &dyn Kernel) -> Result<Solid> {
        hollow_pairs(&self.core.name, construct_leaves(self, kernel)?, kernel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    /// Volume of a rectangle of `area` revolved with its centroid at `r`.
    fn pappus(area: f64, r: f64) -> f64 {
        2.0 * PI * r * area
    }

    #[test]
    fn test_coil_volume() {
        let coil = PoloidalFieldCoil::new(50.0, 20.0, (600.0, 700.0)).unwrap();
        assert_relative_eq!(coil.volume().unwrap(), pappus(1000.0, 600.0), max_relative = 0.01);
        assert_eq!(coil.core().material_tag.as_deref(), Some("pf_coil_mat"));
        assert!(PoloidalFieldCoil::new(0.0, 20.0, (600.0, 700.0)).is_err());
    }

    #[test]
    fn test_coil_from_corners() {
        let coil = PoloidalFieldCoil::from_corners((580.0, 675.0), (620.0, 725.0)).unwrap();
        assert_eq!(coil.center_point(), (600.0, 700.0));
        assert_relative_eq!(coil.width(), 40.0);
        assert_relative_eq!(coil.height(), 50.0);
    }

    #[test]
    fn test_case_volume_is_the_ring() {
        let coil = PoloidalFieldCoil::new(50.0, 20.0, (600.0, 700.0)).unwrap();
        let case = PoloidalFieldCoilCase::for_coil(&coil, 10.0).unwrap();
        let ring = 40.0 * 70.0 - 20.0 * 50.0;
        assert_relative_eq!(case.volume().unwrap(), pappus(ring, 600.0), max_relative = 0.01);
        assert_eq!(case.core().stp_filename.as_deref(), Some("PoloidalFieldCoilCaseFC.stp"));
    }

    #[test]
    fn test_set_keeps_coils_separate() {
        let set = PoloidalFieldCoilSet::new(
            vec![10.0, 10.0, 20.0],
            vec![10.0, 10.0, 20.0],
            vec![(100.0, 100.0), (100.0, 150.0), (50.0, -100.0)],
        )
        .unwrap();
        let solid = set.solid().unwrap();
        assert_eq!(solid.num_bodies(), 3);
        let expected = pappus(100.0, 100.0) * 2.0 + pappus(400.0, 50.0);
        assert_relative_eq!(set.volume().unwrap(), expected, max_relative = 0.01);
    }

    #[test]
    fn test_set_lengths_must_match() {
        assert!(PoloidalFieldCoilSet::new(vec![10.0], vec![10.0, 5.0], vec![(1.0, 1.0)]).is_err());
    }

    #[test]
    fn test_case_set_skips_zero_thickness() {
        let set = PoloidalFieldCoilSet::new(
            vec![10.0, 10.0],
            vec![10.0, 10.0],
            vec![(100.0, 100.0), (100.0, 150.0)],
        )
        .unwrap();
        let cases = PoloidalFieldCoilCaseSet::for_coil_set_each(&set, vec![5.0, 0.0]).unwrap();
        assert_eq!(cases.solid().unwrap().num_bodies(), 1);
        assert!(PoloidalFieldCoilCaseSet::for_coil_set_each(&set, vec![5.0]).is_err());

        let cases = PoloidalFieldCoilCaseSet::for_coil_set(&set, 2.0).unwrap();
        let ring = 14.0 * 14.0 - 100.0;
        assert_relative_eq!(cases.volume().unwrap(), 2.0 * pappus(ring, 100.0), max_relative = 0.01);
    }
}
