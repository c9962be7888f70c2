//! The shape base: parameters, boolean children, lazy cached solids.
//!
//! Every concrete shape implements [`ParametricShape`] by exposing its
//! [`ShapeCore`] and describing itself as a 2D [`Profile`] plus a
//! [`Construction`] (revolve, extrude or sweep). Everything else (solid
//! caching, placement copies, booleans, queries and exports) comes from
//! the trait's provided methods.

mod extrude;
mod pipeline;
mod rotate;
mod sweep;

use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use paramak_kernel::paramak_kernel_math::{Point2, Point3};
use paramak_kernel::paramak_kernel_sketch::SketchSegment;
use paramak_kernel::{current_kernel, Kernel, Solid};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ParamakError, Result, Warning};
use crate::export::{self, DagmcBackend, DagmcOptions, NeutronicsDescription, StpMode, SvgOptions, Units};
use crate::polyline::Polyline;
use crate::utils::Point;
use crate::workplane::{RotationAxis, Workplane};

pub use extrude::ExtrudeShape;
pub use pipeline::{evaluate, hash_value};
pub use rotate::RotateShape;
pub(crate) use rotate::check_rotation_angle;
pub(crate) use pipeline::construct_leaves;
pub use sweep::SweepShape;

// =============================================================================
// Parameters
// =============================================================================

/// Display colour, components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red.
    pub r: f64,
    /// Green.
    pub g: f64,
    /// Blue.
    pub b: f64,
    /// Optional opacity.
    pub a: Option<f64>,
}

impl Default for Color {
    fn default() -> Self {
        Self {
            r: 0.5,
            g: 0.5,
            b: 0.5,
            a: None,
        }
    }
}

impl Color {
    /// An opaque colour.
    pub fn rgb(r: f64, g: f64, b: f64) -> Result<Self> {
        Self::check(Self { r, g, b, a: None })
    }

    /// A colour with opacity.
    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Result<Self> {
        Self::check(Self { r, g, b, a: Some(a) })
    }

    fn check(c: Self) -> Result<Self> {
        for (label, v) in [("r", c.r), ("g", c.g), ("b", c.b), ("a", c.a.unwrap_or(1.0))] {
            crate::error::within(&format!("color.{label}"), v, 0.0, 1.0)?;
        }
        Ok(c)
    }

    /// `#rrggbb` form.
    pub fn to_hex(&self) -> String {
        let byte = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", byte(self.r), byte(self.g), byte(self.b))
    }
}

/// The 2D outline a shape is built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Profile {
    /// A connection-typed polyline.
    Polyline(Polyline),
    /// A full circle.
    Circle {
        /// Centre in workplane coordinates.
        center: Point,
        /// Radius.
        radius: f64,
    },
    /// Several outlines built separately and unioned.
    Compound(Vec<Profile>),
}

impl Profile {
    /// Every point of the outline, compounds concatenated. A circle
    /// contributes its centre.
    pub fn points(&self) -> Vec<Point> {
        match self {
            Profile::Polyline(line) => line.points(),
            Profile::Circle { center, .. } => vec![*center],
            Profile::Compound(parts) => parts.iter().flat_map(Profile::points).collect(),
        }
    }

    /// The leaf outlines in order.
    pub fn leaves(&self) -> Vec<&Profile> {
        match self {
            Profile::Compound(parts) => parts.iter().flat_map(Profile::leaves).collect(),
            leaf => vec![leaf],
        }
    }

    /// Sketch segments of a leaf outline; empty for a compound.
    pub fn segments(&self) -> Vec<SketchSegment> {
        match self {
            Profile::Polyline(line) => line.to_segments(),
            Profile::Circle { center, radius } => vec![SketchSegment::Circle {
                center: Point2::new(center.0, center.1),
                radius: *radius,
            }],
            Profile::Compound(_) => Vec::new(),
        }
    }
}

/// How a profile becomes a solid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Construction {
    /// Revolve about the workplane's local y axis.
    Rotate {
        /// Degrees, in `(0, 360]`.
        rotation_angle: f64,
    },
    /// Extrude along the workplane normal.
    Extrude {
        /// Extrusion length.
        distance: f64,
        /// Symmetric about the workplane.
        extrude_both: bool,
        /// Degrees kept about the rotation axis; 360 keeps everything.
        rotation_angle: f64,
        /// Start plane offset along the extrusion direction.
        extrusion_start_offset: f64,
    },
    /// Sweep along a spline through points of a second workplane.
    Sweep {
        /// Path points in `path_workplane` coordinates.
        path_points: Vec<Point>,
        /// Workplane of the path.
        path_workplane: Workplane,
        /// Keep the section perpendicular to the path.
        force_cross_section: bool,
    },
}

/// Which connection kinds a family member accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeVariant {
    /// Any connection-typed polyline.
    Mixed,
    /// Straight edges only.
    Straight,
    /// A single closed spline.
    Spline,
    /// A full circle.
    Circle,
}

impl ShapeVariant {
    /// The outline for plain points under this variant. Circles use
    /// [`Profile::Circle`] directly.
    pub fn profile(self, points: &[Point]) -> Result<Profile> {
        match self {
            ShapeVariant::Straight => Ok(Profile::Polyline(Polyline::straight(points)?)),
            ShapeVariant::Spline => Ok(Profile::Polyline(Polyline::spline(points)?)),
            ShapeVariant::Mixed | ShapeVariant::Circle => Err(ParamakError::invalid(
                "points",
                format!("{self:?} shapes are not built from plain points"),
            )),
        }
    }

    /// Check a profile only uses this variant's connection kinds.
    pub fn check(self, profile: &Profile) -> Result<()> {
        use crate::polyline::ConnectionKind;
        let allowed = |kind: ConnectionKind| match self {
            ShapeVariant::Mixed => true,
            ShapeVariant::Straight => kind == ConnectionKind::Straight,
            ShapeVariant::Spline => kind == ConnectionKind::Spline,
            ShapeVariant::Circle => false,
        };
        for leaf in profile.leaves() {
            match leaf {
                Profile::Polyline(line) => {
                    if let Some(bad) = line.cycle_connections().find(|k| !allowed(*k)) {
                        return Err(ParamakError::InvalidPolyline(format!(
                            "{bad} connections are not allowed in a {self:?} shape"
                        )));
                    }
                }
                Profile::Circle { radius, .. } => {
                    if self != ShapeVariant::Circle && self != ShapeVariant::Mixed {
                        return Err(ParamakError::invalid(
                            "points",
                            format!("a circle is not allowed in a {self:?} shape"),
                        ));
                    }
                    crate::error::positive("radius", *radius)?;
                }
                Profile::Compound(_) => {}
            }
        }
        Ok(())
    }

    /// Name fragment used in shape kinds.
    pub fn label(self) -> &'static str {
        match self {
            ShapeVariant::Mixed => "Mixed",
            ShapeVariant::Straight => "Straight",
            ShapeVariant::Spline => "Spline",
            ShapeVariant::Circle => "Circle",
        }
    }
}

/// Parameters every shape owns.
pub struct ShapeCore {
    /// Name used in legends, file names and reactor lookups.
    pub name: String,
    /// Display colour.
    pub color: Color,
    /// Neutronics material tag.
    pub material_tag: Option<String>,
    /// STEP file name used by reactor exports.
    pub stp_filename: Option<String>,
    /// STL file name used by reactor exports.
    pub stl_filename: Option<String>,
    /// Plane the profile is drawn in.
    pub workplane: Workplane,
    /// One placed copy per angle (degrees).
    pub azimuth_placement_angle: Vec<f64>,
    /// Placement axis; the workplane's second axis when unset.
    pub rotation_axis: Option<RotationAxis>,
    /// Offset applied after placement.
    pub translate: Option<[f64; 3]>,
    /// Shapes subtracted from this one.
    pub cut: Vec<ShapeRef>,
    /// Shapes this one is intersected with.
    pub intersect: Vec<ShapeRef>,
    /// Shapes added to this one.
    pub union: Vec<ShapeRef>,
    cache: RefCell<Option<(String, Rc<Solid>)>>,
}

impl ShapeCore {
    /// Defaults for a shape called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: Color::default(),
            material_tag: None,
            stp_filename: None,
            stl_filename: None,
            workplane: Workplane::default(),
            azimuth_placement_angle: vec![0.0],
            rotation_axis: None,
            translate: None,
            cut: Vec::new(),
            intersect: Vec::new(),
            union: Vec::new(),
            cache: RefCell::new(None),
        }
    }

    /// Set the material tag and default file names together.
    pub(crate) fn tagged(mut self, material_tag: &str, stem: &str) -> Self {
        self.material_tag = Some(material_tag.to_string());
        self.stp_filename = Some(format!("{stem}.stp"));
        self.stl_filename = Some(format!("{stem}.stl"));
        self
    }

    /// Parameters that enter the fingerprint.
    pub(crate) fn hash_tree(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "color": self.color,
            "material_tag": self.material_tag,
            "stp_filename": self.stp_filename,
            "stl_filename": self.stl_filename,
            "workplane": self.workplane,
            "azimuth_placement_angle": self.azimuth_placement_angle,
            "rotation_axis": self.rotation_axis,
            "translate": self.translate,
        })
    }

    /// The cached fingerprint, if a solid has been built.
    pub fn cached_hash(&self) -> Option<String> {
        self.cache.borrow().as_ref().map(|(h, _)| h.clone())
    }
}

impl fmt::Debug for ShapeCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeCore")
            .field("name", &self.name)
            .field("workplane", &self.workplane)
            .field("azimuth_placement_angle", &self.azimuth_placement_angle)
            .field("cut", &self.cut.len())
            .field("intersect", &self.intersect.len())
            .field("union", &self.union.len())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// The shape trait
// =============================================================================

/// A shape that derives its solid from parameters.
pub trait ParametricShape {
    /// Shared parameters.
    fn core(&self) -> &ShapeCore;

    /// Shared parameters, mutably.
    fn core_mut(&mut self) -> &mut ShapeCore;

    /// Type name, part of the fingerprint.
    fn kind(&self) -> &'static str;

    /// The 2D outline, re-derived from parameters on every call.
    fn profile(&self) -> Result<Profile>;

    /// How the outline becomes a solid.
    fn construction(&self) -> Result<Construction>;

    /// Parameters not captured by the profile and construction.
    fn parameters(&self) -> Value {
        Value::Null
    }

    /// Build the unplaced solid. Shapes whose geometry is not a single
    /// profile operation override this.
    fn construct(&self, kernel: &dyn Kernel) -> Result<Solid> {
        pipeline::construct_profile(self, kernel)
    }

    // -------------------------------------------------------------------------
    // Derived accessors
    // -------------------------------------------------------------------------

    /// Shape name.
    fn name(&self) -> &str {
        &self.core().name
    }

    /// The outline's points.
    fn points(&self) -> Result<Vec<Point>> {
        Ok(self.profile()?.points())
    }

    /// The built solid, rebuilt only when the fingerprint changed.
    fn solid(&self) -> Result<Rc<Solid>> {
        evaluate(self)
    }

    /// Current parameter fingerprint.
    fn hash_value(&self) -> Result<String> {
        hash_value(self)
    }

    /// Total volume.
    fn volume(&self) -> Result<f64> {
        Ok(current_kernel().volume(&*self.solid()?))
    }

    /// Volume of each body of the solid.
    fn volumes(&self) -> Result<Vec<f64>> {
        Ok(self.solid()?.volumes())
    }

    /// Total surface area.
    fn area(&self) -> Result<f64> {
        Ok(current_kernel().area(&*self.solid()?))
    }

    /// Area of every face.
    fn areas(&self) -> Result<Vec<f64>> {
        Ok(current_kernel().faces(&*self.solid()?))
    }

    /// Largest absolute bounding-box coordinate.
    fn largest_dimension(&self) -> Result<f64> {
        Ok(current_kernel()
            .bounding_box(&*self.solid()?)
            .largest_abs_coordinate())
    }

    /// Material and file names for neutronics workflows.
    fn neutronics_description(&self) -> Result<NeutronicsDescription> {
        let core = self.core();
        let material = core.material_tag.clone().ok_or_else(|| {
            ParamakError::invalid("material_tag", format!("{} has no material tag", core.name))
        })?;
        Ok(NeutronicsDescription {
            material,
            stp_filename: core.stp_filename.clone(),
            filename: core.stp_filename.clone(),
            stl_filename: core.stl_filename.clone(),
        })
    }

    /// A hollow cube enclosing the shape with `offset` clearance.
    fn make_graveyard(&self, offset: f64) -> Result<crate::components::HollowCube> {
        crate::components::HollowCube::graveyard(self.largest_dimension()?, offset)
    }

    // -------------------------------------------------------------------------
    // Exports
    // -------------------------------------------------------------------------

    /// Write a STEP file of the solid, or of the profile wires.
    fn export_stp(&self, path: &Path, mode: StpMode, units: Units) -> Result<PathBuf> {
        let path = export::with_extension(path, &["stp", "step"], "stp");
        match mode {
            StpMode::Solid => {
                let solid = self.solid()?;
                export::write_stp_solids(&path, &[(self.name(), &*solid)], units)?;
            }
            StpMode::Wire => {
                let wires = pipeline::profile_wires(self, &*current_kernel())?;
                let named: Vec<(&str, &[Point3])> =
                    wires.iter().map(|w| (self.name(), w.as_slice())).collect();
                export::write_stp_wires(&path, &named, units)?;
            }
        }
        Ok(path)
    }

    /// Write a binary STL of the solid.
    fn export_stl(&self, path: &Path, tolerance: Option<f64>) -> Result<PathBuf> {
        let path = export::with_extension(path, &["stl"], "stl");
        let solid = self.solid()?;
        export::write_stl(&path, &[&*solid], tolerance)?;
        Ok(path)
    }

    /// Write a projected line drawing.
    fn export_svg(&self, path: &Path, options: &SvgOptions) -> Result<PathBuf> {
        let path = export::with_extension(path, &["svg"], "svg");
        let solid = self.solid()?;
        export::write_svg(&path, &[(&*solid, self.core().color)], options)?;
        Ok(path)
    }

    /// Write a 2D plot of the profile points.
    fn export_html(&self, path: &Path) -> Result<PathBuf> {
        let path = export::with_extension(path, &["html"], "html");
        let profile = self.profile()?;
        export::write_html_2d(&path, &[export::PlotTrace::from_profile(self.name(), &profile, self.core().color)])?;
        Ok(path)
    }

    /// Write a self-contained 3D scene.
    fn export_html_3d(&self, path: &Path) -> Result<PathBuf> {
        let path = export::with_extension(path, &["html"], "html");
        let solid = self.solid()?;
        export::write_html_3d(&path, &[(self.name(), &*solid, self.core().color)])?;
        Ok(path)
    }

    /// Write a tagged faceted geometry through `backend`.
    fn export_dagmc_h5m(
        &self,
        path: &Path,
        backend: &dyn DagmcBackend,
        options: &DagmcOptions,
    ) -> Result<PathBuf> {
        let description = self.neutronics_description()?;
        let solid = self.solid()?;
        let graveyard = if options.include_graveyard {
            Some(self.make_graveyard(options.graveyard_offset)?.solid()?)
        } else {
            None
        };
        let mut volumes = vec![export::DagmcVolume::new(&description.material, &solid)];
        if let Some(graveyard) = &graveyard {
            volumes.push(export::DagmcVolume::new("graveyard", graveyard));
        }
        export::write_dagmc(path, backend, &volumes, options)
    }

    /// Write a JSON table of volume and surface ids.
    fn export_physical_groups(&self, path: &Path) -> Result<PathBuf> {
        let path = export::with_extension(path, &["json"], "json");
        let solid = self.solid()?;
        let tag = self
            .core()
            .material_tag
            .clone()
            .unwrap_or_else(|| self.name().to_string());
        export::write_physical_groups(&path, &[(tag.as_str(), &*solid)])?;
        Ok(path)
    }

    // -------------------------------------------------------------------------
    // Builders
    // -------------------------------------------------------------------------

    /// Rename.
    fn with_name(mut self, name: impl Into<String>) -> Self
    where
        Self: Sized,
    {
        self.core_mut().name = name.into();
        self
    }

    /// Recolour.
    fn with_color(mut self, color: Color) -> Self
    where
        Self: Sized,
    {
        self.core_mut().color = color;
        self
    }

    /// Set the material tag; tags DAGMC would truncate are warned about.
    fn with_material_tag(mut self, tag: impl Into<String>) -> Self
    where
        Self: Sized,
    {
        let tag = tag.into();
        if tag.len() > 27 {
            Warning::LongMaterialTag { tag: tag.clone() }.emit();
        }
        self.core_mut().material_tag = Some(tag);
        self
    }

    /// Set the STEP file name used by reactor exports.
    fn with_stp_filename(mut self, filename: impl Into<String>) -> Self
    where
        Self: Sized,
    {
        self.core_mut().stp_filename = Some(filename.into());
        self
    }

    /// Set the STL file name used by reactor exports.
    fn with_stl_filename(mut self, filename: impl Into<String>) -> Self
    where
        Self: Sized,
    {
        self.core_mut().stl_filename = Some(filename.into());
        self
    }

    /// Draw the profile in another plane.
    fn with_workplane(mut self, workplane: Workplane) -> Self
    where
        Self: Sized,
    {
        self.core_mut().workplane = workplane;
        self
    }

    /// Place a single copy at `angle` degrees.
    fn with_azimuth_placement_angle(mut self, angle: f64) -> Self
    where
        Self: Sized,
    {
        self.core_mut().azimuth_placement_angle = vec![angle];
        self
    }

    /// Place one copy per angle.
    fn with_azimuth_placement_angles(mut self, angles: Vec<f64>) -> Self
    where
        Self: Sized,
    {
        self.core_mut().azimuth_placement_angle = angles;
        self
    }

    /// Rotate placement copies about `axis`.
    fn with_rotation_axis(mut self, axis: RotationAxis) -> Self
    where
        Self: Sized,
    {
        self.core_mut().rotation_axis = Some(axis);
        self
    }

    /// Offset the placed solid.
    fn with_translate(mut self, offset: [f64; 3]) -> Self
    where
        Self: Sized,
    {
        self.core_mut().translate = Some(offset);
        self
    }

    /// Subtract `shape`.
    fn with_cut(mut self, shape: impl Into<ShapeRef>) -> Self
    where
        Self: Sized,
    {
        self.core_mut().cut.push(shape.into());
        self
    }

    /// Intersect with `shape`.
    fn with_intersect(mut self, shape: impl Into<ShapeRef>) -> Self
    where
        Self: Sized,
    {
        self.core_mut().intersect.push(shape.into());
        self
    }

    /// Add `shape`.
    fn with_union(mut self, shape: impl Into<ShapeRef>) -> Self
    where
        Self: Sized,
    {
        self.core_mut().union.push(shape.into());
        self
    }
}

// =============================================================================
// Shared references
// =============================================================================

/// A shared, mutable handle to any shape.
///
/// Reactors and boolean children hold these; mutating through one handle
/// is seen by every holder on its next `solid()` call.
#[derive(Clone)]
pub struct ShapeRef(Rc<RefCell<dyn ParametricShape>>);

impl ShapeRef {
    /// Wrap an owned shape.
    pub fn new<S: ParametricShape + 'static>(shape: S) -> Self {
        Self(Rc::new(RefCell::new(shape)))
    }

    /// Borrow the shape.
    pub fn borrow(&self) -> std::cell::Ref<'_, dyn ParametricShape> {
        self.0.borrow()
    }

    /// Borrow the shape mutably.
    pub fn borrow_mut(&self) -> std::cell::RefMut<'_, dyn ParametricShape> {
        self.0.borrow_mut()
    }

    /// Borrow for evaluation; a shape already borrowed mutably can only be
    /// reached through a cycle or a caller holding it open.
    pub(crate) fn try_shape(&self) -> Result<std::cell::Ref<'_, dyn ParametricShape>> {
        self.0
            .try_borrow()
            .map_err(|_| ParamakError::CyclicDependency("a shape that is being modified".into()))
    }

    /// Shape name.
    pub fn name(&self) -> String {
        self.0.borrow().name().to_string()
    }

    /// The shape's solid.
    pub fn solid(&self) -> Result<Rc<Solid>> {
        self.try_shape()?.solid()
    }

    /// The shape's fingerprint.
    pub fn hash_value(&self) -> Result<String> {
        self.try_shape()?.hash_value()
    }

    /// Whether two handles point at the same shape.
    pub fn ptr_eq(&self, other: &ShapeRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<S: ParametricShape + 'static> From<Rc<RefCell<S>>> for ShapeRef {
    fn from(shape: Rc<RefCell<S>>) -> Self {
        Self(shape)
    }
}

impl fmt::Debug for ShapeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(shape) => write!(f, "ShapeRef({:?})", shape.name()),
            Err(_) => f.write_str("ShapeRef(<borrowed>)"),
        }
    }
}
