//! Radial and vertical builds.
//!
//! A build is an ordered list of layers from the machine axis outward (or
//! from the bottom up). Resolving it turns thicknesses into boundaries and
//! reads the plasma's major and minor radius off the one plasma layer.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{label, ParametricReactor, ReactorCore};
use crate::blanket::BlanketConstantThicknessArc;
use crate::error::{ParamakError, Result};
use crate::plasma::{Plasma, PlasmaParameters};
use crate::shape::{check_rotation_angle, RotateShape, ShapeRef};

/// What occupies a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// Empty space.
    Gap,
    /// A component.
    Solid,
    /// The plasma. A build has exactly one.
    Plasma,
}

/// One entry of a build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// What the layer holds.
    pub kind: LayerKind,
    /// Extent of the layer.
    pub thickness: f64,
    /// Component name of a solid layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Material tag of a solid layer; `<name>_mat` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_tag: Option<String>,
}

impl Layer {
    fn of(kind: LayerKind, thickness: f64) -> Self {
        Self {
            kind,
            thickness,
            name: None,
            material_tag: None,
        }
    }

    /// Empty space.
    pub fn gap(thickness: f64) -> Self {
        Self::of(LayerKind::Gap, thickness)
    }

    /// A component layer.
    pub fn solid(thickness: f64) -> Self {
        Self::of(LayerKind::Solid, thickness)
    }

    /// The plasma layer.
    pub fn plasma(thickness: f64) -> Self {
        Self::of(LayerKind::Plasma, thickness)
    }

    /// Name the layer.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Tag the layer's material.
    pub fn with_material_tag(mut self, tag: impl Into<String>) -> Self {
        self.material_tag = Some(tag.into());
        self
    }
}

/// A layer with its boundaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLayer {
    /// What the layer holds.
    pub kind: LayerKind,
    /// Inner (or lower) boundary.
    pub start: f64,
    /// Outer (or upper) boundary.
    pub end: f64,
    /// Layer name, `layer_<index>` when the build did not name it.
    pub name: String,
    /// Material tag.
    pub material_tag: String,
}

impl ResolvedLayer {
    /// `end - start`.
    pub fn thickness(&self) -> f64 {
        self.end - self.start
    }
}

/// Boundaries and plasma dimensions of a build.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedBuild {
    /// Radial layers, inboard first.
    pub radial: Vec<ResolvedLayer>,
    /// Vertical layers, bottom first, centred on the midplane.
    pub vertical: Option<Vec<ResolvedLayer>>,
    /// Index of the plasma among the radial layers.
    pub plasma_index: usize,
    /// Centre of the radial plasma layer.
    pub major_radius: f64,
    /// Half the radial plasma thickness.
    pub minor_radius: f64,
    /// Half-height over minor radius, when a vertical build is given.
    pub elongation: Option<f64>,
    /// Height of the vertical plasma centre above the midplane.
    pub vertical_displacement: f64,
}

impl ResolvedBuild {
    /// The radial plasma layer.
    pub fn plasma(&self) -> &ResolvedLayer {
        &self.radial[self.plasma_index]
    }

    /// Radial layers inboard of the plasma.
    pub fn inboard(&self) -> &[ResolvedLayer] {
        &self.radial[..self.plasma_index]
    }

    /// Radial layers outboard of the plasma.
    pub fn outboard(&self) -> &[ResolvedLayer] {
        &self.radial[self.plasma_index + 1..]
    }

    /// Outer boundary of the last radial layer.
    pub fn outer_radius(&self) -> f64 {
        self.radial.last().map_or(0.0, |l| l.end)
    }
}

/// Cumulative boundaries from `origin`, plus the index of the single
/// plasma layer.
fn accumulate(axis: &str, layers: &[Layer], origin: f64) -> Result<(Vec<ResolvedLayer>, usize)> {
    let plasmas: Vec<usize> = layers
        .iter()
        .enumerate()
        .filter(|(_, l)| l.kind == LayerKind::Plasma)
        .map(|(i, _)| i)
        .collect();
    let plasma_index = match plasmas.as_slice() {
        [single] => *single,
        [] => {
            return Err(ParamakError::BuildResolutionError(format!(
                "the {axis} build has no plasma layer"
            )))
        }
        many => {
            return Err(ParamakError::BuildResolutionError(format!(
                "the {axis} build has {} plasma layers, expected one",
                many.len()
            )))
        }
    };

    let mut at = origin;
    let mut resolved = Vec::with_capacity(layers.len());
    for (i, layer) in layers.iter().enumerate() {
        if !(layer.thickness > 0.0 && layer.thickness.is_finite()) {
            return Err(ParamakError::BuildResolutionError(format!(
                "{axis} layer {i} has thickness {}, layers must be thicker than zero",
                layer.thickness
            )));
        }
        let name = layer.name.clone().unwrap_or_else(|| match layer.kind {
            LayerKind::Plasma => "plasma".to_string(),
            _ => format!("layer_{i}"),
        });
        let material_tag = layer
            .material_tag
            .clone()
            .unwrap_or_else(|| format!("{name}_mat"));
        resolved.push(ResolvedLayer {
            kind: layer.kind,
            start: at,
            end: at + layer.thickness,
            name,
            material_tag,
        });
        at += layer.thickness;
    }
    Ok((resolved, plasma_index))
}

/// Resolve a radial build and an optional vertical build.
///
/// The radial build starts at the machine axis. The vertical build runs
/// bottom to top and is centred on the midplane; its plasma layer gives
/// the elongation and vertical displacement.
///
/// ```
/// use paramak::{resolve_build, Layer};
///
/// let build = resolve_build(
///     &[Layer::gap(100.0), Layer::solid(50.0), Layer::plasma(200.0), Layer::solid(20.0)],
///     None,
/// )
/// .unwrap();
/// assert_eq!(build.major_radius, 250.0);
/// assert_eq!(build.minor_radius, 100.0);
/// assert_eq!(build.outer_radius(), 370.0);
/// ```
pub fn resolve_build(radial: &[Layer], vertical: Option<&[Layer]>) -> Result<ResolvedBuild> {
    let (radial, plasma_index) = accumulate("radial", radial, 0.0)?;
    let plasma = &radial[plasma_index];
    let minor_radius = plasma.thickness() / 2.0;
    let major_radius = plasma.start + minor_radius;

    let (vertical, elongation, vertical_displacement) = match vertical {
        Some(layers) => {
            let total: f64 = layers.iter().map(|l| l.thickness).sum();
            let (resolved, index) = accumulate("vertical", layers, -total / 2.0)?;
            let plasma = &resolved[index];
            let elongation = plasma.thickness() / 2.0 / minor_radius;
            let displacement = (plasma.start + plasma.end) / 2.0;
            (Some(resolved), Some(elongation), displacement)
        }
        None => (None, None, 0.0),
    };

    tracing::debug!(major_radius, minor_radius, ?elongation, "resolved build");
    Ok(ResolvedBuild {
        radial,
        vertical,
        plasma_index,
        major_radius,
        minor_radius,
        elongation,
        vertical_displacement,
    })
}

// =============================================================================
// Reactors built straight from layers
// =============================================================================

/// A reactor whose components are the solid layers of a radial build.
///
/// Inboard layers become full-height cylinders; outboard layers become
/// constant-thickness shells closing over the top and bottom of the
/// plasma.
#[derive(Debug)]
pub struct BuildReactor {
    core: ReactorCore,
    radial_build: Vec<Layer>,
    vertical_build: Option<Vec<Layer>>,
    elongation: f64,
    triangularity: f64,
    rotation_angle: f64,
}

impl BuildReactor {
    /// A reactor from a radial build, resolved immediately so a bad build
    /// fails here rather than on first use.
    pub fn new(radial_build: Vec<Layer>) -> Result<Self> {
        resolve_build(&radial_build, None)?;
        Ok(Self {
            core: ReactorCore::new("build_reactor"),
            radial_build,
            vertical_build: None,
            elongation: 2.0,
            triangularity: 0.55,
            rotation_angle: 360.0,
        })
    }

    /// Take the elongation from a vertical build.
    pub fn with_vertical_build(mut self, vertical_build: Vec<Layer>) -> Result<Self> {
        resolve_build(&self.radial_build, Some(&vertical_build))?;
        self.vertical_build = Some(vertical_build);
        Ok(self)
    }

    /// Plasma shape used when there is no vertical build.
    pub fn with_plasma_shape(mut self, elongation: f64, triangularity: f64) -> Self {
        self.elongation = elongation;
        self.triangularity = triangularity;
        self
    }

    /// Revolve every component through `angle` degrees.
    pub fn with_rotation_angle(mut self, angle: f64) -> Result<Self> {
        check_rotation_angle(angle)?;
        self.rotation_angle = angle;
        Ok(self)
    }

    /// The resolved build.
    pub fn resolved(&self) -> Result<ResolvedBuild> {
        resolve_build(&self.radial_build, self.vertical_build.as_deref())
    }
}

impl ParametricReactor for BuildReactor {
    fn core(&self) -> &ReactorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ReactorCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        "BuildReactor"
    }

    fn rotation_angle(&self) -> f64 {
        self.rotation_angle
    }

    fn parameters(&self) -> Result<Value> {
        Ok(json!({
            "radial_build": self.radial_build,
            "vertical_build": self.vertical_build,
            "elongation": self.elongation,
            "triangularity": self.triangularity,
            "rotation_angle": self.rotation_angle,
        }))
    }

    fn create_components(&self) -> Result<Vec<ShapeRef>> {
        let build = self.resolved()?;
        let params = PlasmaParameters {
            major_radius: build.major_radius,
            minor_radius: build.minor_radius,
            elongation: build.elongation.unwrap_or(self.elongation),
            triangularity: self.triangularity,
            vertical_displacement: build.vertical_displacement,
            ..PlasmaParameters::default()
        };
        let plasma = Plasma::from_parameters(params)?.with_rotation_angle(self.rotation_angle)?;
        let (high, low) = (plasma.high_point(), plasma.low_point());
        let plasma_edge = build.plasma().end;
        let reach = build.outer_radius() - plasma_edge;

        let mut components = Vec::new();
        for layer in build.inboard().iter().filter(|l| l.kind == LayerKind::Solid) {
            let (top, bottom) = (high.1 + reach, low.1 - reach);
            let column = RotateShape::straight(&[
                (layer.start, top),
                (layer.end, top),
                (layer.end, bottom),
                (layer.start, bottom),
            ])?
            .with_rotation_angle(self.rotation_angle)?;
            components.push(ShapeRef::new(label(column, &layer.name, &layer.material_tag)));
        }
        components.push(ShapeRef::new(plasma));
        for layer in build.outboard().iter().filter(|l| l.kind == LayerKind::Solid) {
            let clearance = layer.start - plasma_edge;
            let shell = BlanketConstantThicknessArc::vertical(
                (high.0, high.1 + clearance),
                (layer.start, build.vertical_displacement),
                (low.0, low.1 - clearance),
                layer.thickness(),
            )?
            .with_rotation_angle(self.rotation_angle)?;
            components.push(ShapeRef::new(label(shell, &layer.name, &layer.material_tag)));
        }
        Ok(components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ParametricShape;
    use approx::assert_relative_eq;

    fn build() -> Vec<Layer> {
        vec![
            Layer::gap(50.0),
            Layer::solid(100.0).named("center_column"),
            Layer::gap(20.0),
            Layer::plasma(300.0),
            Layer::gap(20.0),
            Layer::solid(40.0).named("firstwall"),
            Layer::solid(100.0).named("blanket").with_material_tag("lithium_lead"),
        ]
    }

    #[test]
    fn test_cumulative_boundaries() {
        let resolved = resolve_build(&build(), None).unwrap();
        assert_eq!(resolved.plasma_index, 3);
        assert_relative_eq!(resolved.major_radius, 320.0);
        assert_relative_eq!(resolved.minor_radius, 150.0);
        assert_relative_eq!(resolved.outer_radius(), 630.0);
        assert_eq!(resolved.inboard().len(), 3);
        assert_eq!(resolved.outboard()[1].name, "firstwall");
        assert_eq!(resolved.outboard()[1].material_tag, "firstwall_mat");
        assert_eq!(resolved.outboard()[2].material_tag, "lithium_lead");
        assert_eq!(resolved.radial[0].name, "layer_0");
    }

    #[test]
    fn test_plasma_count_is_checked() {
        let none = resolve_build(&[Layer::gap(10.0), Layer::solid(10.0)], None);
        assert!(matches!(none, Err(ParamakError::BuildResolutionError(_))));
        let two = resolve_build(&[Layer::plasma(10.0), Layer::plasma(10.0)], None);
        assert!(matches!(two, Err(ParamakError::BuildResolutionError(_))));
    }

    #[test]
    fn test_thicknesses_must_be_positive() {
        let zero = resolve_build(&[Layer::gap(0.0), Layer::plasma(10.0)], None);
        assert!(matches!(zero, Err(ParamakError::BuildResolutionError(_))));
        let negative = resolve_build(&[Layer::plasma(10.0), Layer::solid(-5.0)], None);
        assert!(matches!(negative, Err(ParamakError::BuildResolutionError(_))));
    }

    #[test]
    fn test_vertical_build_sets_elongation() {
        let vertical = [Layer::solid(100.0), Layer::plasma(600.0), Layer::solid(200.0)];
        let resolved = resolve_build(&build(), Some(&vertical)).unwrap();
        assert_relative_eq!(resolved.elongation.unwrap(), 2.0);
        // Centred on the midplane: the plasma spans -350..250.
        assert_relative_eq!(resolved.vertical_displacement, -50.0);
        assert!(resolve_build(&build(), Some(&[Layer::solid(10.0)])).is_err());
    }

    #[test]
    fn test_build_reactor_components_follow_the_build() {
        let reactor = BuildReactor::new(build())
            .unwrap()
            .with_plasma_shape(1.5, 0.3)
            .with_rotation_angle(90.0)
            .unwrap();
        assert_eq!(
            reactor.names().unwrap(),
            vec!["center_column", "plasma", "firstwall", "blanket"]
        );
        for shape in reactor.shapes_and_components().unwrap().iter() {
            assert!(shape.try_shape().unwrap().volume().unwrap() > 0.0, "{}", shape.name());
        }
        let blanket = reactor.component("blanket").unwrap().unwrap();
        assert_eq!(blanket.borrow().core().material_tag.as_deref(), Some("lithium_lead"));
        assert!(reactor.make_sector_wedge().unwrap().is_some());
    }

    #[test]
    fn test_bad_build_fails_at_construction() {
        let result = BuildReactor::new(vec![Layer::solid(10.0)]);
        assert!(matches!(result, Err(ParamakError::BuildResolutionError(_))));
    }
}
