//! Reactor assemblies.
//!
//! A reactor is an ordered set of named shapes. [`Reactor`] holds shapes
//! added by hand; parametric reactors such as [`BallReactor`] derive their
//! components from a handful of build parameters. Both share the
//! [`ParametricReactor`] trait, which caches the component list by a
//! fingerprint of the parameters and provides the exports.

mod ball;
mod build;

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use paramak_kernel::Solid;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::components::{CuttingWedge, HollowCube};
use crate::error::{non_negative, positive, ParamakError, Result, Warning};
use crate::export::{self, DagmcBackend, DagmcOptions, NeutronicsDescription, SvgOptions, Units};
use crate::hash::fingerprint;
use crate::shape::{Construction, ParametricShape, ShapeRef};

pub use ball::{BallReactor, BallReactorBuild, PfCoilOptions, SingleNullBallReactor, TfCoilOptions};
pub use build::{resolve_build, BuildReactor, Layer, LayerKind, ResolvedBuild, ResolvedLayer};

/// Side of the default graveyard cube.
pub const DEFAULT_GRAVEYARD_SIZE: f64 = 20_000.0;

// =============================================================================
// Shared state
// =============================================================================

/// Parameters every reactor owns.
pub struct ReactorCore {
    /// Reactor name, used in log messages and warnings.
    pub name: String,
    /// Side of the graveyard cube when no offset is given.
    pub graveyard_size: f64,
    /// Clearance between the geometry and the graveyard. When set, the
    /// graveyard is sized from the largest dimension instead of
    /// `graveyard_size`.
    pub graveyard_offset: Option<f64>,
    /// Shapes to measure the largest dimension from; all components when
    /// unset.
    pub largest_shapes: Option<Vec<ShapeRef>>,
    cache: RefCell<Option<(String, Rc<[ShapeRef]>)>>,
}

impl ReactorCore {
    /// Defaults for a reactor called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            graveyard_size: DEFAULT_GRAVEYARD_SIZE,
            graveyard_offset: None,
            largest_shapes: None,
            cache: RefCell::new(None),
        }
    }
}

impl fmt::Debug for ReactorCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactorCore")
            .field("name", &self.name)
            .field("graveyard_size", &self.graveyard_size)
            .field("graveyard_offset", &self.graveyard_offset)
            .finish_non_exhaustive()
    }
}

/// What a reactor STEP export writes besides the components.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StpExportOptions {
    /// Length unit of the files.
    pub units: Units,
    /// Also write `graveyard.stp`.
    pub include_graveyard: bool,
    /// Also write the wedge filling the unused sector of a partial reactor.
    pub include_sector_wedge: bool,
}

// =============================================================================
// The reactor trait
// =============================================================================

/// A reactor whose components follow from its parameters.
pub trait ParametricReactor {
    /// Shared parameters.
    fn core(&self) -> &ReactorCore;

    /// Shared parameters, mutably.
    fn core_mut(&mut self) -> &mut ReactorCore;

    /// Type name, part of the fingerprint.
    fn kind(&self) -> &'static str;

    /// Everything the component list depends on.
    fn parameters(&self) -> Result<Value>;

    /// Build the components, in assembly order.
    fn create_components(&self) -> Result<Vec<ShapeRef>>;

    /// Degrees of the full turn the reactor covers.
    fn rotation_angle(&self) -> f64 {
        360.0
    }

    // -------------------------------------------------------------------------
    // Components
    // -------------------------------------------------------------------------

    /// Current parameter fingerprint.
    fn reactor_hash_value(&self) -> Result<String> {
        fingerprint(&json!({
            "kind": self.kind(),
            "name": self.core().name,
            "parameters": self.parameters()?,
        }))
    }

    /// The components, recreated only when the fingerprint changed.
    fn shapes_and_components(&self) -> Result<Rc<[ShapeRef]>> {
        let core = self.core();
        let hash = self.reactor_hash_value()?;
        if let Some((cached, shapes)) = core.cache.borrow().as_ref() {
            if *cached == hash {
                tracing::debug!(reactor = %core.name, "component cache hit");
                return Ok(Rc::clone(shapes));
            }
        }

        tracing::debug!(reactor = %core.name, kind = self.kind(), "creating components");
        let shapes: Rc<[ShapeRef]> = self.create_components()?.into();
        check_unique_names(&shapes)?;
        warn_full_rotation(&core.name, &shapes)?;
        *core.cache.borrow_mut() = Some((hash, Rc::clone(&shapes)));
        Ok(shapes)
    }

    /// Component names in assembly order.
    fn names(&self) -> Result<Vec<String>> {
        Ok(self.shapes_and_components()?.iter().map(ShapeRef::name).collect())
    }

    /// The component called `name`.
    fn component(&self, name: &str) -> Result<Option<ShapeRef>> {
        Ok(self
            .shapes_and_components()?
            .iter()
            .find(|s| s.name() == name)
            .cloned())
    }

    /// Every component's solid as one compound.
    fn solid(&self) -> Result<Solid> {
        let solids = component_solids(&self.shapes_and_components()?)?;
        Ok(Solid::compound(solids.iter().map(|(_, s)| &**s)))
    }

    /// Largest absolute bounding-box coordinate over `largest_shapes`, or
    /// over every component.
    fn largest_dimension(&self) -> Result<f64> {
        let shapes: Vec<ShapeRef> = match &self.core().largest_shapes {
            Some(shapes) => shapes.clone(),
            None => self.shapes_and_components()?.to_vec(),
        };
        shapes.iter().try_fold(0.0_f64, |largest, shape| {
            Ok(largest.max(shape.try_shape()?.largest_dimension()?))
        })
    }

    /// A hollow cube around the reactor. An `offset` (or the reactor's
    /// `graveyard_offset`) sizes it from the largest dimension; otherwise
    /// it has side `graveyard_size`.
    fn make_graveyard(&self, offset: Option<f64>) -> Result<HollowCube> {
        let core = self.core();
        match offset.or(core.graveyard_offset) {
            Some(offset) => {
                non_negative("graveyard_offset", offset)?;
                HollowCube::graveyard(self.largest_dimension()?, offset)
            }
            None => {
                positive("graveyard_size", core.graveyard_size)?;
                HollowCube::graveyard(core.graveyard_size / 2.0, 0.0)
            }
        }
    }

    /// The wedge that fills the sector a partial reactor leaves out, or
    /// `None` for a full turn.
    fn make_sector_wedge(&self) -> Result<Option<CuttingWedge>> {
        let angle = self.rotation_angle();
        if angle >= 360.0 {
            return Ok(None);
        }
        let largest = self.largest_dimension()?.max(1.0);
        let wedge = CuttingWedge::new(6.0 * largest, 3.0 * largest)?
            .with_rotation_angle(360.0 - angle)?
            .with_azimuth_placement_angle(angle)
            .with_name("sector_wedge")
            .with_material_tag("vacuum")
            .with_stp_filename("sector_wedge.stp")
            .with_stl_filename("sector_wedge.stl");
        Ok(Some(wedge))
    }

    /// Material and file names of the components, optionally without the
    /// plasma and with the graveyard.
    fn neutronics_description(&self, include_plasma: bool, include_graveyard: bool) -> Result<Vec<NeutronicsDescription>> {
        let mut descriptions = Vec::new();
        for shape in self.shapes_and_components()?.iter() {
            let shape = shape.try_shape()?;
            if !include_plasma && shape.kind() == "Plasma" {
                continue;
            }
            descriptions.push(shape.neutronics_description()?);
        }
        if include_graveyard {
            descriptions.push(self.make_graveyard(None)?.neutronics_description()?);
        }
        Ok(descriptions)
    }

    // -------------------------------------------------------------------------
    // Exports
    // -------------------------------------------------------------------------

    /// Write [`neutronics_description`](Self::neutronics_description) as JSON.
    fn export_neutronics_description(
        &self,
        path: &Path,
        include_plasma: bool,
        include_graveyard: bool,
    ) -> Result<PathBuf> {
        let path = export::with_extension(path, &["json"], "json");
        let descriptions = self.neutronics_description(include_plasma, include_graveyard)?;
        export::write_json(&path, &descriptions)?;
        Ok(path)
    }

    /// Write one STEP file per component into `folder`, named by each
    /// component's `stp_filename`. Returns the written paths.
    fn export_stp(&self, folder: &Path, options: &StpExportOptions) -> Result<Vec<PathBuf>> {
        let mut extra: Vec<Box<dyn ParametricShape>> = Vec::new();
        if options.include_sector_wedge {
            if let Some(wedge) = self.make_sector_wedge()? {
                extra.push(Box::new(wedge));
            }
        }
        if options.include_graveyard {
            extra.push(Box::new(self.make_graveyard(None)?));
        }

        let shapes = self.shapes_and_components()?;
        let borrowed = shapes.iter().map(ShapeRef::try_shape).collect::<Result<Vec<_>>>()?;
        let all: Vec<&dyn ParametricShape> = borrowed
            .iter()
            .map(|s| &**s)
            .chain(extra.iter().map(|s| &**s))
            .collect();
        let paths = output_paths(folder, &all, "stp", |s| s.core().stp_filename.clone())?;

        for (shape, path) in all.iter().zip(&paths) {
            let solid = shape.solid()?;
            export::write_stp_solids(path, &[(shape.name(), &*solid)], options.units)?;
        }
        Ok(paths)
    }

    /// Write one STEP file per component to explicit paths, in component
    /// order.
    fn export_stp_files(&self, paths: &[PathBuf], units: Units) -> Result<Vec<PathBuf>> {
        let shapes = self.shapes_and_components()?;
        if paths.len() != shapes.len() {
            return Err(ParamakError::invalid(
                "paths",
                format!("{} paths given for {} components", paths.len(), shapes.len()),
            ));
        }
        let mut seen = HashSet::new();
        let mut written = Vec::with_capacity(paths.len());
        for (shape, path) in shapes.iter().zip(paths) {
            let path = export::with_extension(path, &["stp", "step"], "stp");
            if !seen.insert(path.clone()) {
                return Err(ParamakError::DuplicateName(format!(
                    "{} is the output file of more than one component",
                    path.display()
                )));
            }
            let shape = shape.try_shape()?;
            let solid = shape.solid()?;
            export::write_stp_solids(&path, &[(shape.name(), &*solid)], units)?;
            written.push(path);
        }
        Ok(written)
    }

    /// Write one binary STL per component into `folder`, named by each
    /// component's `stl_filename`.
    fn export_stl(&self, folder: &Path, tolerance: Option<f64>, include_graveyard: bool) -> Result<Vec<PathBuf>> {
        let graveyard = if include_graveyard {
            Some(self.make_graveyard(None)?)
        } else {
            None
        };
        let shapes = self.shapes_and_components()?;
        let borrowed = shapes.iter().map(ShapeRef::try_shape).collect::<Result<Vec<_>>>()?;
        let mut all: Vec<&dyn ParametricShape> = borrowed.iter().map(|s| &**s).collect();
        if let Some(graveyard) = &graveyard {
            all.push(graveyard);
        }
        let paths = output_paths(folder, &all, "stl", |s| s.core().stl_filename.clone())?;

        for (shape, path) in all.iter().zip(&paths) {
            let solid = shape.solid()?;
            export::write_stl(path, &[&*solid], tolerance)?;
        }
        Ok(paths)
    }

    /// Draw every component in one projected line drawing.
    fn export_svg(&self, path: &Path, options: &SvgOptions) -> Result<PathBuf> {
        let path = export::with_extension(path, &["svg"], "svg");
        let shapes = self.shapes_and_components()?;
        let solids = component_solids(&shapes)?;
        let colored: Vec<(&Solid, _)> = solids
            .iter()
            .zip(shapes.iter())
            .map(|((_, solid), shape)| (&**solid, shape.borrow().core().color))
            .collect();
        export::write_svg(&path, &colored, options)?;
        Ok(path)
    }

    /// Plot every component's profile points in one 2D page.
    fn export_html(&self, path: &Path) -> Result<PathBuf> {
        let path = export::with_extension(path, &["html"], "html");
        let traces = self
            .shapes_and_components()?
            .iter()
            .map(|shape| {
                let shape = shape.try_shape()?;
                Ok(export::PlotTrace::from_profile(shape.name(), &shape.profile()?, shape.core().color))
            })
            .collect::<Result<Vec<_>>>()?;
        export::write_html_2d(&path, &traces)?;
        Ok(path)
    }

    /// Write a 3D scene of every component, keyed by name.
    fn export_html_3d(&self, path: &Path) -> Result<PathBuf> {
        let path = export::with_extension(path, &["html"], "html");
        let shapes = self.shapes_and_components()?;
        let solids = component_solids(&shapes)?;
        let colors: Vec<_> = shapes.iter().map(|s| s.borrow().core().color).collect();
        let scene: Vec<(&str, &Solid, _)> = solids
            .iter()
            .zip(colors)
            .map(|((name, solid), color)| (name.as_str(), &**solid, color))
            .collect();
        export::write_html_3d(&path, &scene)?;
        Ok(path)
    }

    /// Write tagged faceted geometry of every component, grouped by
    /// material tag, plus the graveyard when `options` asks for it.
    fn export_dagmc_h5m(&self, path: &Path, backend: &dyn DagmcBackend, options: &DagmcOptions) -> Result<PathBuf> {
        let shapes = self.shapes_and_components()?;
        let solids = component_solids(&shapes)?;
        let tags = material_tags(&shapes);
        let graveyard = if options.include_graveyard {
            Some(self.make_graveyard(Some(options.graveyard_offset))?.solid()?)
        } else {
            None
        };
        let mut volumes: Vec<_> = tags
            .iter()
            .zip(&solids)
            .map(|(tag, (_, solid))| export::DagmcVolume::new(tag, solid))
            .collect();
        if let Some(graveyard) = &graveyard {
            volumes.push(export::DagmcVolume::new("graveyard", graveyard));
        }
        export::write_dagmc(path, backend, &volumes, options)
    }

    /// Write a JSON table of volume and surface ids for every component.
    fn export_physical_groups(&self, path: &Path) -> Result<PathBuf> {
        let path = export::with_extension(path, &["json"], "json");
        let shapes = self.shapes_and_components()?;
        let solids = component_solids(&shapes)?;
        let tags = material_tags(&shapes);
        let tagged: Vec<(&str, &Solid)> = tags
            .iter()
            .zip(&solids)
            .map(|(tag, (_, solid))| (tag.as_str(), &**solid))
            .collect();
        export::write_physical_groups(&path, &tagged)?;
        Ok(path)
    }

    // -------------------------------------------------------------------------
    // Builders
    // -------------------------------------------------------------------------

    /// Set the side of the default graveyard.
    fn with_graveyard_size(mut self, size: f64) -> Result<Self>
    where
        Self: Sized,
    {
        positive("graveyard_size", size)?;
        self.core_mut().graveyard_size = size;
        Ok(self)
    }

    /// Size the graveyard from the largest dimension plus `offset`.
    fn with_graveyard_offset(mut self, offset: f64) -> Result<Self>
    where
        Self: Sized,
    {
        non_negative("graveyard_offset", offset)?;
        self.core_mut().graveyard_offset = Some(offset);
        Ok(self)
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Name a component and derive its file names from the name.
fn label<S: ParametricShape>(shape: S, name: &str, material_tag: &str) -> S {
    shape
        .with_name(name)
        .with_material_tag(material_tag)
        .with_stp_filename(format!("{name}.stp"))
        .with_stl_filename(format!("{name}.stl"))
}

fn check_unique_names(shapes: &[ShapeRef]) -> Result<()> {
    let mut seen = HashSet::new();
    for shape in shapes {
        let name = shape.name();
        if !seen.insert(name.clone()) {
            return Err(ParamakError::DuplicateName(name));
        }
    }
    Ok(())
}

/// Warn once per reactor when a component is revolved through a full turn.
fn warn_full_rotation(reactor: &str, shapes: &[ShapeRef]) -> Result<()> {
    for shape in shapes {
        let full = matches!(
            shape.try_shape()?.construction()?,
            Construction::Rotate { rotation_angle } if rotation_angle >= 360.0
        );
        if full {
            Warning::FullRotationInstability {
                shape: reactor.to_string(),
            }
            .emit();
            break;
        }
    }
    Ok(())
}

fn component_solids(shapes: &[ShapeRef]) -> Result<Vec<(String, Rc<Solid>)>> {
    shapes.iter().map(|s| Ok((s.name(), s.solid()?))).collect()
}

fn material_tags(shapes: &[ShapeRef]) -> Vec<String> {
    shapes
        .iter()
        .map(|s| {
            let shape = s.borrow();
            shape.core().material_tag.clone().unwrap_or_else(|| shape.name().to_string())
        })
        .collect()
}

/// `folder/<file name>` for every shape, rejecting two shapes that would
/// write the same file.
fn output_paths(
    folder: &Path,
    shapes: &[&dyn ParametricShape],
    extension: &str,
    filename: impl Fn(&dyn ParametricShape) -> Option<String>,
) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut paths = Vec::with_capacity(shapes.len());
    for shape in shapes {
        let name = filename(*shape).unwrap_or_else(|| format!("{}.{extension}", shape.name()));
        if !seen.insert(name.clone()) {
            return Err(ParamakError::DuplicateName(format!(
                "{name} is the output file of more than one component"
            )));
        }
        paths.push(export::with_extension(&folder.join(name), &[extension], extension));
    }
    Ok(paths)
}

// =============================================================================
// Hand-assembled reactors
// =============================================================================

/// A reactor assembled from shapes added one at a time.
///
/// ```
/// use paramak::{ParametricReactor, ParametricShape, Reactor, RotateShape, ShapeRef};
///
/// let mut reactor = Reactor::new();
/// let ring = RotateShape::straight(&[(10.0, 0.0), (10.0, 5.0), (20.0, 5.0), (20.0, 0.0)]).unwrap();
/// reactor.add(ShapeRef::new(ring), "ring").unwrap();
/// assert_eq!(reactor.names().unwrap(), vec!["ring".to_string()]);
/// ```
#[derive(Debug)]
pub struct Reactor {
    core: ReactorCore,
    shapes: Vec<ShapeRef>,
}

impl Default for Reactor {
    fn default() -> Self {
        Self::new()
    }
}

impl Reactor {
    /// An empty reactor.
    pub fn new() -> Self {
        Self {
            core: ReactorCore::new("reactor"),
            shapes: Vec::new(),
        }
    }

    /// A reactor holding `shapes` under their own names.
    pub fn from_shapes(shapes: Vec<ShapeRef>) -> Result<Self> {
        check_unique_names(&shapes)?;
        Ok(Self {
            shapes,
            ..Self::new()
        })
    }

    /// Attach `shape` under `name`. The shape is renamed; names must be
    /// unique within the reactor.
    pub fn add(&mut self, shape: ShapeRef, name: &str) -> Result<()> {
        if self.shapes.iter().any(|s| s.name() == name) {
            return Err(ParamakError::DuplicateName(name.to_string()));
        }
        if self.shapes.iter().any(|s| s.ptr_eq(&shape)) {
            return Err(ParamakError::DuplicateName(format!(
                "{} is already part of the reactor",
                shape.name()
            )));
        }
        shape.borrow_mut().core_mut().name = name.to_string();
        self.shapes.push(shape);
        Ok(())
    }
}

impl ParametricReactor for Reactor {
    fn core(&self) -> &ReactorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ReactorCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        "Reactor"
    }

    fn parameters(&self) -> Result<Value> {
        let hashes = self.shapes.iter().map(ShapeRef::hash_value).collect::<Result<Vec<_>>>()?;
        Ok(json!(hashes))
    }

    fn create_components(&self) -> Result<Vec<ShapeRef>> {
        Ok(self.shapes.clone())
    }
}
