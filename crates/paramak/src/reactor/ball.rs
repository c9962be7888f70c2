//! Spherical tokamaks with a cylindrical centre column.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::build::{resolve_build, Layer, LayerKind, ResolvedBuild};
use super::{label, ParametricReactor, ReactorCore};
use crate::blanket::BlanketConstantThicknessArc;
use crate::components::{CenterColumnShield, PoloidalFieldCoil, PoloidalFieldCoilCase, ToroidalFieldCoil};
use crate::error::{positive, ParamakError, Result};
use crate::plasma::{Plasma, PlasmaConfiguration, PlasmaParameters};
use crate::polyline::Polyline;
use crate::shape::{check_rotation_angle, ParametricShape, Profile, RotateShape, ShapeRef};
use crate::utils::Point;

/// Poloidal field coils outboard of the blanket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PfCoilOptions {
    /// Gap between the rear wall and the coils, also added above and below
    /// the build when spacing the coils.
    pub to_rear_blanket_radial_gap: f64,
    /// Radial thickness of each coil.
    pub radial_thicknesses: Vec<f64>,
    /// Vertical thickness of each coil.
    pub vertical_thicknesses: Vec<f64>,
    /// Wrap every coil in a case of this thickness.
    #[serde(default)]
    pub case_thickness: Option<f64>,
}

/// Rectangular toroidal field coils around the whole build.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TfCoilOptions {
    /// Gap between the poloidal field coils (or the rear wall) and the
    /// outboard leg.
    pub to_pf_coil_radial_gap: f64,
    /// Radial thickness of the outboard leg.
    pub radial_thickness: f64,
    /// Toroidal thickness of each coil.
    pub poloidal_thickness: f64,
}

/// Parameters of a ball reactor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallReactorBuild {
    /// Empty bore on the axis.
    pub inner_bore_radial_thickness: f64,
    /// Inboard legs of the toroidal field coils.
    pub inboard_tf_leg_radial_thickness: f64,
    /// Shield around the inboard legs.
    pub center_column_shield_radial_thickness: f64,
    /// Radial extent of the divertor above and below the plasma.
    pub divertor_radial_thickness: f64,
    /// Gap between the shield and the plasma.
    pub inner_plasma_gap_radial_thickness: f64,
    /// Plasma width, twice the minor radius.
    pub plasma_radial_thickness: f64,
    /// Gap between the plasma and the first wall.
    pub outer_plasma_gap_radial_thickness: f64,
    /// First wall.
    pub firstwall_radial_thickness: f64,
    /// Breeding blanket.
    pub blanket_radial_thickness: f64,
    /// Wall behind the blanket.
    pub blanket_rear_wall_radial_thickness: f64,
    /// Plasma elongation.
    pub elongation: f64,
    /// Plasma triangularity.
    pub triangularity: f64,
    /// Number of toroidal field coils.
    pub number_of_tf_coils: usize,
    /// Degrees of the full turn that are built.
    pub rotation_angle: f64,
    /// Optional poloidal field coils.
    pub pf_coils: Option<PfCoilOptions>,
    /// Optional outboard toroidal field coils.
    pub tf_coils: Option<TfCoilOptions>,
}

impl Default for BallReactorBuild {
    fn default() -> Self {
        Self {
            inner_bore_radial_thickness: 50.0,
            inboard_tf_leg_radial_thickness: 200.0,
            center_column_shield_radial_thickness: 50.0,
            divertor_radial_thickness: 50.0,
            inner_plasma_gap_radial_thickness: 50.0,
            plasma_radial_thickness: 100.0,
            outer_plasma_gap_radial_thickness: 50.0,
            firstwall_radial_thickness: 50.0,
            blanket_radial_thickness: 100.0,
            blanket_rear_wall_radial_thickness: 50.0,
            elongation: 2.0,
            triangularity: 0.55,
            number_of_tf_coils: 16,
            rotation_angle: 360.0,
            pf_coils: None,
            tf_coils: None,
        }
    }
}

/// Layer names of the radial build, axis outward.
const LAYER_NAMES: [&str; 9] = [
    "inner_bore",
    "inboard_tf_coils",
    "center_column_shield",
    "inner_plasma_gap",
    "plasma",
    "outer_plasma_gap",
    "firstwall",
    "blanket",
    "blanket_rear_wall",
];

const LAYER_KINDS: [LayerKind; 9] = [
    LayerKind::Gap,
    LayerKind::Solid,
    LayerKind::Solid,
    LayerKind::Gap,
    LayerKind::Plasma,
    LayerKind::Gap,
    LayerKind::Solid,
    LayerKind::Solid,
    LayerKind::Solid,
];

impl BallReactorBuild {
    /// The radial build these thicknesses describe.
    pub fn radial_build(&self) -> Vec<Layer> {
        let thicknesses = [
            self.inner_bore_radial_thickness,
            self.inboard_tf_leg_radial_thickness,
            self.center_column_shield_radial_thickness,
            self.inner_plasma_gap_radial_thickness,
            self.plasma_radial_thickness,
            self.outer_plasma_gap_radial_thickness,
            self.firstwall_radial_thickness,
            self.blanket_radial_thickness,
            self.blanket_rear_wall_radial_thickness,
        ];
        LAYER_KINDS
            .iter()
            .zip(LAYER_NAMES)
            .zip(thicknesses)
            .map(|((&kind, name), thickness)| Layer {
                kind,
                thickness,
                name: Some(name.to_string()),
                material_tag: None,
            })
            .collect()
    }

    /// Take the nine radial thicknesses from a build laid out as
    /// gap, solid, solid, gap, plasma, gap, solid, solid, solid.
    pub fn with_radial_build(mut self, layers: &[Layer]) -> Result<Self> {
        resolve_build(layers, None)?;
        let kinds: Vec<LayerKind> = layers.iter().map(|l| l.kind).collect();
        if kinds != LAYER_KINDS {
            return Err(ParamakError::BuildResolutionError(format!(
                "a ball reactor build is bore gap, inboard TF, shield, gap, plasma, gap, \
                 first wall, blanket, rear wall; got {kinds:?}"
            )));
        }
        let t: Vec<f64> = layers.iter().map(|l| l.thickness).collect();
        self.inner_bore_radial_thickness = t[0];
        self.inboard_tf_leg_radial_thickness = t[1];
        self.center_column_shield_radial_thickness = t[2];
        self.inner_plasma_gap_radial_thickness = t[3];
        self.plasma_radial_thickness = t[4];
        self.outer_plasma_gap_radial_thickness = t[5];
        self.firstwall_radial_thickness = t[6];
        self.blanket_radial_thickness = t[7];
        self.blanket_rear_wall_radial_thickness = t[8];
        Ok(self)
    }

    /// Check the parameters and resolve the radial build.
    pub fn resolve(&self) -> Result<ResolvedBuild> {
        let build = resolve_build(&self.radial_build(), None)?;
        positive("divertor_radial_thickness", self.divertor_radial_thickness)?;
        let room = self.inner_plasma_gap_radial_thickness
            + self.plasma_radial_thickness
            + self.outer_plasma_gap_radial_thickness;
        if self.divertor_radial_thickness >= room {
            return Err(ParamakError::BuildResolutionError(format!(
                "divertor_radial_thickness {} reaches the outboard first wall ({room} available)",
                self.divertor_radial_thickness
            )));
        }
        check_rotation_angle(self.rotation_angle)?;
        if let Some(pf) = &self.pf_coils {
            positive("pf_coils.to_rear_blanket_radial_gap", pf.to_rear_blanket_radial_gap)?;
            if pf.radial_thicknesses.len() != pf.vertical_thicknesses.len() || pf.radial_thicknesses.is_empty() {
                return Err(ParamakError::invalid(
                    "pf_coils",
                    "radial_thicknesses and vertical_thicknesses must be non-empty and the same length",
                ));
            }
        }
        if let Some(tf) = &self.tf_coils {
            positive("tf_coils.to_pf_coil_radial_gap", tf.to_pf_coil_radial_gap)?;
            positive("tf_coils.radial_thickness", tf.radial_thickness)?;
            positive("tf_coils.poloidal_thickness", tf.poloidal_thickness)?;
        }
        Ok(build)
    }
}

// =============================================================================
// Geometry shared by the ball reactors
// =============================================================================

/// Which divertors a ball reactor has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Divertors {
    UpperAndLower,
    Lower,
}

/// Radii and heights derived from a resolved build.
struct Envelope {
    center_column_end: f64,
    divertor_end: f64,
    firstwall_start: f64,
    rear_wall_end: f64,
    /// Height of the first wall's inner face above the midplane.
    firstwall_height: f64,
    /// Height of the outside of the rear wall.
    rear_wall_height: f64,
}

fn components(params: &BallReactorBuild, divertors: Divertors) -> Result<Vec<ShapeRef>> {
    let build = params.resolve()?;
    let angle = params.rotation_angle;
    let radial = &build.radial;
    let configuration = match divertors {
        Divertors::UpperAndLower => PlasmaConfiguration::NonNull,
        Divertors::Lower => PlasmaConfiguration::SingleNull,
    };
    let plasma = Plasma::from_parameters(PlasmaParameters {
        major_radius: build.major_radius,
        minor_radius: build.minor_radius,
        elongation: params.elongation,
        triangularity: params.triangularity,
        configuration,
        ..PlasmaParameters::default()
    })?
    .with_rotation_angle(angle)?;

    let (high, low) = (plasma.high_point(), plasma.low_point());
    let lowest = plasma.lower_x_point().map_or(low.1, |x| x.1.min(low.1));
    let shells = params.firstwall_radial_thickness + params.blanket_radial_thickness + params.blanket_rear_wall_radial_thickness;
    let firstwall_height = high.1.max(-lowest) + params.outer_plasma_gap_radial_thickness;
    let env = Envelope {
        center_column_end: radial[2].end,
        divertor_end: (radial[2].end + params.divertor_radial_thickness).max(high.0),
        firstwall_start: radial[6].start,
        rear_wall_end: radial[8].end,
        firstwall_height,
        rear_wall_height: firstwall_height + shells,
    };

    let mut shapes = vec![ShapeRef::new(plasma)];

    let inboard_tf = CenterColumnShield::cylinder(2.0 * env.rear_wall_height, radial[1].start, radial[1].end)?
        .with_rotation_angle(angle)?;
    shapes.push(ShapeRef::new(named(inboard_tf, "inboard_tf_coils")));

    let shield = CenterColumnShield::cylinder(2.0 * env.rear_wall_height, radial[2].start, radial[2].end)?
        .with_rotation_angle(angle)?;
    shapes.push(ShapeRef::new(named(shield, "center_column_shield")));

    // The divertor spans from the shield to the plasma tip (or further when
    // thicker) between the first wall's inner face and the rear wall's
    // outer face.
    let block = |sign: f64| -> Result<Profile> {
        let (r0, r1) = (env.center_column_end, env.divertor_end);
        let (z0, z1) = (sign * env.firstwall_height, sign * env.rear_wall_height);
        Ok(Profile::Polyline(Polyline::straight(&[(r0, z1), (r0, z0), (r1, z0), (r1, z1)])?))
    };
    let blocks = match divertors {
        Divertors::UpperAndLower => vec![block(1.0)?, block(-1.0)?],
        Divertors::Lower => vec![block(-1.0)?],
    };
    let divertor = ShapeRef::new(named(
        RotateShape::compound(blocks)?.with_rotation_angle(angle)?,
        "divertor",
    ));
    shapes.push(divertor.clone());

    // Shells close onto the divertor; without an upper divertor they run on
    // to the shield.
    let upper_end = match divertors {
        Divertors::UpperAndLower => high.0,
        Divertors::Lower => env.center_column_end,
    };
    let mut start = env.firstwall_start;
    let mut height = env.firstwall_height;
    for (name, thickness) in [
        ("firstwall", params.firstwall_radial_thickness),
        ("blanket", params.blanket_radial_thickness),
        ("blanket_rear_wall", params.blanket_rear_wall_radial_thickness),
    ] {
        let shell = BlanketConstantThicknessArc::vertical((upper_end, height), (start, 0.0), (high.0, -height), thickness)?
            .with_rotation_angle(angle)?
            .with_cut(divertor.clone());
        shapes.push(ShapeRef::new(named(shell, name)));
        start += thickness;
        height += thickness;
    }

    let mut outer_edge = env.rear_wall_end;
    if let Some(pf) = &params.pf_coils {
        let (coils, edge) = pf_coils(pf, &env, angle)?;
        shapes.extend(coils);
        outer_edge = edge;
    }
    if let Some(tf) = &params.tf_coils {
        let leg = outer_edge + tf.to_pf_coil_radial_gap;
        let coils = ToroidalFieldCoil::rectangle(
            (radial[1].start, env.rear_wall_height),
            (leg, 0.0),
            tf.radial_thickness,
            tf.poloidal_thickness,
            params.number_of_tf_coils,
        )?
        .with_inner_leg(false)
        .with_rotation_angle(angle)?;
        shapes.push(ShapeRef::new(named(coils, "tf_coils")));
    }
    Ok(shapes)
}

/// Coils (and their cases) stacked at equal spacing over the height of the
/// build plus the gap above and below. Returns them with the outer radius
/// of the widest coil or case.
fn pf_coils(pf: &PfCoilOptions, env: &Envelope, angle: f64) -> Result<(Vec<ShapeRef>, f64)> {
    let reach = env.rear_wall_height + pf.to_rear_blanket_radial_gap;
    let step = 2.0 * reach / (pf.vertical_thicknesses.len() + 1) as f64;
    let inner = env.rear_wall_end + pf.to_rear_blanket_radial_gap;
    let mut shapes = Vec::new();
    let mut outer_edge = inner;
    for (i, (&width, &height)) in pf.radial_thicknesses.iter().zip(&pf.vertical_thicknesses).enumerate() {
        let center: Point = (inner + width / 2.0, reach - step * (i + 1) as f64);
        let coil = PoloidalFieldCoil::new(height, width, center)?.with_rotation_angle(angle)?;
        outer_edge = outer_edge.max(inner + width);
        if let Some(thickness) = pf.case_thickness {
            let case = PoloidalFieldCoilCase::for_coil(&coil, thickness)?.with_rotation_angle(angle)?;
            outer_edge = outer_edge.max(inner + width + thickness);
            shapes.push(ShapeRef::new(named(coil, &format!("pf_coil_{i}"))));
            shapes.push(ShapeRef::new(named(case, &format!("pf_coil_case_{i}"))));
        } else {
            shapes.push(ShapeRef::new(named(coil, &format!("pf_coil_{i}"))));
        }
    }
    Ok((shapes, outer_edge))
}

fn named<S: ParametricShape>(shape: S, name: &str) -> S {
    label(shape, name, &format!("{name}_mat"))
}

// =============================================================================
// Reactors
// =============================================================================

/// A spherical tokamak: plasma, inboard TF legs, centre column shield,
/// upper and lower divertors and first wall, blanket and rear wall shells,
/// with optional PF coils and outboard TF coils.
///
/// ```
/// use paramak::{BallReactor, BallReactorBuild, ParametricReactor};
///
/// let reactor = BallReactor::new(BallReactorBuild::default()).unwrap();
/// assert_eq!(reactor.major_radius(), 400.0);
/// assert_eq!(reactor.names().unwrap().len(), 7);
/// ```
#[derive(Debug)]
pub struct BallReactor {
    core: ReactorCore,
    build: BallReactorBuild,
}

impl BallReactor {
    /// A reactor from checked parameters.
    pub fn new(build: BallReactorBuild) -> Result<Self> {
        build.resolve()?;
        Ok(Self {
            core: ReactorCore::new("ball_reactor"),
            build,
        })
    }

    /// The parameters.
    pub fn build(&self) -> &BallReactorBuild {
        &self.build
    }

    /// Replace the parameters; the components are rebuilt on next use.
    pub fn set_build(&mut self, build: BallReactorBuild) -> Result<()> {
        build.resolve()?;
        self.build = build;
        Ok(())
    }

    /// Centre of the plasma layer.
    pub fn major_radius(&self) -> f64 {
        let b = &self.build;
        b.inner_bore_radial_thickness
            + b.inboard_tf_leg_radial_thickness
            + b.center_column_shield_radial_thickness
            + b.inner_plasma_gap_radial_thickness
            + b.plasma_radial_thickness / 2.0
    }

    /// Half the plasma layer.
    pub fn minor_radius(&self) -> f64 {
        self.build.plasma_radial_thickness / 2.0
    }
}

impl ParametricReactor for BallReactor {
    fn core(&self) -> &ReactorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ReactorCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        "BallReactor"
    }

    fn rotation_angle(&self) -> f64 {
        self.build.rotation_angle
    }

    fn parameters(&self) -> Result<Value> {
        Ok(serde_json::to_value(&self.build)?)
    }

    fn create_components(&self) -> Result<Vec<ShapeRef>> {
        components(&self.build, Divertors::UpperAndLower)
    }
}

/// A ball reactor with a single-null plasma and only a lower divertor; the
/// shells close onto the centre column at the top.
#[derive(Debug)]
pub struct SingleNullBallReactor {
    core: ReactorCore,
    build: BallReactorBuild,
}

impl SingleNullBallReactor {
    /// A reactor from checked parameters.
    pub fn new(build: BallReactorBuild) -> Result<Self> {
        build.resolve()?;
        Ok(Self {
            core: ReactorCore::new("single_null_ball_reactor"),
            build,
        })
    }

    /// The parameters.
    pub fn build(&self) -> &BallReactorBuild {
        &self.build
    }

    /// Replace the parameters.
    pub fn set_build(&mut self, build: BallReactorBuild) -> Result<()> {
        build.resolve()?;
        self.build = build;
        Ok(())
    }
}

impl ParametricReactor for SingleNullBallReactor {
    fn core(&self) -> &ReactorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ReactorCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        "SingleNullBallReactor"
    }

    fn rotation_angle(&self) -> f64 {
        self.build.rotation_angle
    }

    fn parameters(&self) -> Result<Value> {
        Ok(serde_json::to_value(&self.build)?)
    }

    fn create_components(&self) -> Result<Vec<ShapeRef>> {
        components(&self.build, Divertors::Lower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn half() -> BallReactorBuild {
        BallReactorBuild {
            rotation_angle: 180.0,
            ..BallReactorBuild::default()
        }
    }

    #[test]
    fn test_radial_build_round_trips_through_thicknesses() {
        let layers = half().radial_build();
        assert_eq!(layers.len(), 9);
        assert_eq!(layers[4].kind, LayerKind::Plasma);
        let again = BallReactorBuild::default().with_radial_build(&layers).unwrap();
        assert_eq!(again.radial_build(), layers);

        let mut bad = layers.clone();
        bad[3].kind = LayerKind::Solid;
        let result = BallReactorBuild::default().with_radial_build(&bad);
        assert!(matches!(result, Err(ParamakError::BuildResolutionError(_))));
    }

    #[test]
    fn test_divertor_must_leave_room_for_the_plasma() {
        let build = BallReactorBuild {
            divertor_radial_thickness: 500.0,
            ..half()
        };
        assert!(matches!(BallReactor::new(build), Err(ParamakError::BuildResolutionError(_))));
    }

    #[test]
    fn test_components_are_rebuilt_after_set_build() {
        let mut reactor = BallReactor::new(half()).unwrap();
        let first = reactor.shapes_and_components().unwrap();
        reactor
            .set_build(BallReactorBuild {
                blanket_radial_thickness: 150.0,
                ..half()
            })
            .unwrap();
        let second = reactor.shapes_and_components().unwrap();
        assert!(!std::rc::Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_shells_are_cut_by_the_divertor() {
        // A divertor wider than the gap to the plasma tip overlaps the
        // shell ends.
        let build = BallReactorBuild {
            divertor_radial_thickness: 140.0,
            ..half()
        };
        let reactor = BallReactor::new(build).unwrap();
        let firstwall = reactor.component("firstwall").unwrap().unwrap();
        let divertor = reactor.component("divertor").unwrap().unwrap();
        assert_eq!(firstwall.borrow().core().cut.len(), 1);
        assert!(firstwall.borrow().core().cut[0].ptr_eq(&divertor));
        assert!(firstwall.solid().unwrap().volume() > 0.0);
    }

    #[test]
    fn test_pf_and_tf_coils() {
        let build = BallReactorBuild {
            pf_coils: Some(PfCoilOptions {
                to_rear_blanket_radial_gap: 50.0,
                radial_thicknesses: vec![50.0, 50.0],
                vertical_thicknesses: vec![50.0, 50.0],
                case_thickness: Some(10.0),
            }),
            tf_coils: Some(TfCoilOptions {
                to_pf_coil_radial_gap: 50.0,
                radial_thickness: 50.0,
                poloidal_thickness: 50.0,
            }),
            number_of_tf_coils: 4,
            ..half()
        };
        let reactor = BallReactor::new(build).unwrap();
        let names = reactor.names().unwrap();
        assert_eq!(names.len(), 12);
        assert_eq!(&names[7..], ["pf_coil_0", "pf_coil_case_0", "pf_coil_1", "pf_coil_case_1", "tf_coils"]);

        // Two coils split the height into three equal steps, symmetric
        // about the midplane.
        let upper = reactor.component("pf_coil_0").unwrap().unwrap();
        let lower = reactor.component("pf_coil_1").unwrap().unwrap();
        let (a, b) = (upper.solid().unwrap().bounding_box(), lower.solid().unwrap().bounding_box());
        assert_relative_eq!(a.max.z, -b.min.z, epsilon = 1e-6);
    }

    #[test]
    fn test_single_null_has_one_lower_divertor() {
        let reactor = SingleNullBallReactor::new(half()).unwrap();
        assert_eq!(reactor.names().unwrap().len(), 7);
        let divertor = reactor.component("divertor").unwrap().unwrap();
        let bb = divertor.solid().unwrap().bounding_box();
        assert!(bb.max.z < 0.0);
        let plasma = reactor.component("plasma").unwrap().unwrap();
        let plasma_low = plasma.solid().unwrap().bounding_box().min.z;
        assert!(bb.max.z < plasma_low);
    }
}
