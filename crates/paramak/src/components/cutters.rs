//! Shapes that exist to be cut from, or intersected with, other shapes:
//! ports, blanket cutters, poloidal segmenters and sector wedges.

use paramak_kernel::{Kernel, Solid};
use serde_json::{json, Value};

use super::straight;
use crate::error::{positive, within, ParamakError, Result};
use crate::shape::{
    check_rotation_angle, construct_leaves, Construction, ParametricShape, Profile, ShapeCore, ShapeRef,
};
use crate::utils::{coefficients_of_line_from_points, linspace, rotate, Point};
use crate::workplane::{Axis, RotationAxis, Workplane};

/// Blanket cutters default to ten copies, one every 36 degrees.
fn ten_placements() -> Vec<f64> {
    linspace(0.0, 360.0, 10, false)
}

/// Straight-edged rectangle from the axis out to `width`, centred on z = 0.
fn slab_outline(width: f64, height: f64) -> Vec<Point> {
    vec![
        (0.0, -height / 2.0),
        (width, -height / 2.0),
        (width, height / 2.0),
        (0.0, height / 2.0),
    ]
}

// =============================================================================
// Ports
// =============================================================================

/// A rectangular port running radially outward from the axis.
///
/// Placement angles are measured from +X.
#[derive(Debug)]
pub struct PortCutterRectangular {
    core: ShapeCore,
    center_z: f64,
    height: f64,
    width: f64,
    distance: f64,
    extrusion_start_offset: f64,
}

impl PortCutterRectangular {
    /// A `width` by `height` port centred at height `center_z`, `distance`
    /// long.
    pub fn new(center_z: f64, height: f64, width: f64, distance: f64) -> Result<Self> {
        positive("height", height)?;
        positive("width", width)?;
        positive("distance", distance)?;
        let mut core =
            ShapeCore::new("rectangular_port_cutter").tagged("rectangular_port_cutter_mat", "PortCutterRectangular");
        core.azimuth_placement_angle = vec![-90.0];
        Ok(Self {
            core,
            center_z,
            height,
            width,
            distance,
            extrusion_start_offset: 0.0,
        })
    }

    /// One port per angle (degrees from +X).
    pub fn with_placement_angles(mut self, angles: Vec<f64>) -> Self {
        self.core.azimuth_placement_angle = angles.into_iter().map(|a| a - 90.0).collect();
        self
    }

    /// Start the port `offset` away from the axis.
    pub fn with_extrusion_start_offset(mut self, offset: f64) -> Self {
        self.extrusion_start_offset = offset;
        self
    }
}

impl ParametricShape for PortCutterRectangular {
    core_accessors!();

    fn kind(&self) -> &'static str {
        "PortCutterRectangular"
    }

    fn profile(&self) -> Result<Profile> {
        let (w, h, z) = (self.width / 2.0, self.height / 2.0, self.center_z);
        straight(&[(-w, z - h), (w, z - h), (w, z + h), (-w, z + h)])
    }

    fn construction(&self) -> Result<Construction> {
        Ok(Construction::Extrude {
            distance: self.distance,
            extrude_both: false,
            rotation_angle: 360.0,
            extrusion_start_offset: self.extrusion_start_offset,
        })
    }
}

/// A circular port running radially outward from the axis.
///
/// Placement angles are measured from +X.
#[derive(Debug)]
pub struct PortCutterCircular {
    core: ShapeCore,
    center_z: f64,
    radius: f64,
    distance: f64,
    extrusion_start_offset: f64,
}

impl PortCutterCircular {
    /// A port of `radius` centred at height `center_z`, `distance` long.
    pub fn new(center_z: f64, radius: f64, distance: f64) -> Result<Self> {
        positive("radius", radius)?;
        positive("distance", distance)?;
        let mut core = ShapeCore::new("circular_port_cutter").tagged("circular_port_cutter_mat", "PortCutterCircular");
        core.azimuth_placement_angle = vec![-90.0];
        Ok(Self {
            core,
            center_z,
            radius,
            distance,
            extrusion_start_offset: 0.0,
        })
    }

    /// One port per angle (degrees from +X).
    pub fn with_placement_angles(mut self, angles: Vec<f64>) -> Self {
        self.core.azimuth_placement_angle = angles.into_iter().map(|a| a - 90.0).collect();
        self
    }

    /// Start the port `offset` away from the axis.
    pub fn with_extrusion_start_offset(mut self, offset: f64) -> Self {
        self.extrusion_start_offset = offset;
        self
    }
}

impl ParametricShape for PortCutterCircular {
    core_accessors!();

    fn kind(&self) -> &'static str {
        "PortCutterCircular"
    }

    fn profile(&self) -> Result<Profile> {
        Ok(Profile::Circle {
            center: (0.0, self.center_z),
            radius: self.radius,
        })
    }

    fn construction(&self) -> Result<Construction> {
        Ok(Construction::Extrude {
            distance: self.distance,
            extrude_both: false,
            rotation_angle: 360.0,
            extrusion_start_offset: self.extrusion_start_offset,
        })
    }
}

/// A poloidal fan from `center_point`, revolved through a small toroidal
/// angle. Used to cut angled ports through blankets.
#[derive(Debug)]
pub struct PortCutterRotated {
    core: ShapeCore,
    center_point: Point,
    polar_coverage_angle: f64,
    polar_placement_angle: f64,
    max_distance_from_center: f64,
    rotation_angle: f64,
}

impl PortCutterRotated {
    /// A 10 degree fan pointing along +R, reaching 3000 from the centre and
    /// revolved through 10 degrees.
    pub fn new(center_point: Point) -> Self {
        Self {
            core: ShapeCore::new("port_cutter").tagged("port_cutter_mat", "PortCutter"),
            center_point,
            polar_coverage_angle: 10.0,
            polar_placement_angle: 0.0,
            max_distance_from_center: 3000.0,
            rotation_angle: 10.0,
        }
    }

    /// Opening angle of the fan, below 180 degrees.
    pub fn with_polar_coverage_angle(mut self, angle: f64) -> Result<Self> {
        within("polar_coverage_angle", angle, f64::MIN_POSITIVE, 180.0)?;
        if angle == 180.0 {
            // both fan edges lie on one line through the centre
            return Err(ParamakError::invalid(
                "polar_coverage_angle",
                "a 180 degree fan is a flat triangle with no area",
            ));
        }
        self.polar_coverage_angle = angle;
        Ok(self)
    }

    /// Direction of the fan, degrees counter-clockwise from +R.
    pub fn with_polar_placement_angle(mut self, angle: f64) -> Self {
        self.polar_placement_angle = angle;
        self
    }

    /// Length of the fan.
    pub fn with_max_distance_from_center(mut self, distance: f64) -> Result<Self> {
        positive("max_distance_from_center", distance)?;
        self.max_distance_from_center = distance;
        Ok(self)
    }

    /// Toroidal extent in degrees.
    pub fn with_rotation_angle(mut self, angle: f64) -> Result<Self> {
        check_rotation_angle(angle)?;
        self.rotation_angle = angle;
        Ok(self)
    }
}

impl ParametricShape for PortCutterRotated {
    core_accessors!();

    fn kind(&self) -> &'static str {
        "PortCutterRotated"
    }

    fn profile(&self) -> Result<Profile> {
        let c = self.center_point;
        let reach = (c.0 + self.max_distance_from_center, c.1);
        let axis = rotate(c, reach, self.polar_placement_angle.to_radians());
        let half = (self.polar_coverage_angle / 2.0).to_radians();
        straight(&[c, rotate(c, axis, half), rotate(c, axis, -half)])
    }

    fn construction(&self) -> Result<Construction> {
        Ok(Construction::Rotate {
            rotation_angle: self.rotation_angle,
        })
    }
}

// =============================================================================
// Blanket cutters
// =============================================================================

/// Radial slabs used to slice a blanket into toroidal sectors.
#[derive(Debug)]
pub struct BlanketCutterStar {
    core: ShapeCore,
    distance: f64,
    height: f64,
    width: f64,
}

impl BlanketCutterStar {
    /// Slabs `distance` thick, 2000 wide and 2000 tall, every 36 degrees.
    pub fn new(distance: f64) -> Result<Self> {
        positive("distance", distance)?;
        let mut core = ShapeCore::new("blanket_cutter_star").tagged("blanket_cutter_star_mat", "BlanketCutterStar");
        core.azimuth_placement_angle = ten_placements();
        Ok(Self {
            core,
            distance,
            height: 2000.0,
            width: 2000.0,
        })
    }

    /// Slab extent in R and Z.
    pub fn with_size(mut self, width: f64, height: f64) -> Result<Self> {
        positive("width", width)?;
        positive("height", height)?;
        self.width = width;
        self.height = height;
        Ok(self)
    }
}

impl ParametricShape for BlanketCutterStar {
    core_accessors!();

    fn kind(&self) -> &'static str {
        "BlanketCutterStar"
    }

    fn profile(&self) -> Result<Profile> {
        straight(&slab_outline(self.width, self.height))
    }

    fn construction(&self) -> Result<Construction> {
        Ok(Construction::Extrude {
            distance: self.distance,
            extrude_both: true,
            rotation_angle: 360.0,
            extrusion_start_offset: 0.0,
        })
    }
}

/// Pairs of parallel slabs `distance` thick either side of a `gap_size`
/// slot; cutting with them leaves thin parallel-sided blanket walls.
#[derive(Debug)]
pub struct BlanketCutterParallels {
    core: ShapeCore,
    distance: f64,
    gap_size: f64,
    height: f64,
    width: f64,
}

impl BlanketCutterParallels {
    /// Slab pairs 2000 wide and 2000 tall, every 36 degrees.
    pub fn new(distance: f64, gap_size: f64) -> Result<Self> {
        positive("distance", distance)?;
        positive("gap_size", gap_size)?;
        let mut core =
            ShapeCore::new("blanket_cutter_parallels").tagged("blanket_cutter_parallels_mat", "BlanketCutterParallels");
        core.azimuth_placement_angle = ten_placements();
        Ok(Self {
            core,
            distance,
            gap_size,
            height: 2000.0,
            width: 2000.0,
        })
    }

    /// Slab extent in R and Z.
    pub fn with_size(mut self, width: f64, height: f64) -> Result<Self> {
        positive("width", width)?;
        positive("height", height)?;
        self.width = width;
        self.height = height;
        Ok(self)
    }
}

impl ParametricShape for BlanketCutterParallels {
    core_accessors!();

    fn kind(&self) -> &'static str {
        "BlanketCutterParallels"
    }

    fn parameters(&self) -> Value {
        json!({ "gap_size": self.gap_size })
    }

    fn profile(&self) -> Result<Profile> {
        straight(&slab_outline(self.width, self.height))
    }

    fn construction(&self) -> Result<Construction> {
        Ok(Construction::Extrude {
            distance: self.gap_size + 2.0 * self.distance,
            extrude_both: true,
            rotation_angle: 360.0,
            extrusion_start_offset: 0.0,
        })
    }

    fn construct(&self, kernel: &dyn Kernel) -> Result<Solid> {
        let name = self.core.name.as_str();
        let wire = kernel
            .build_wire(self.profile()?.segments(), &self.core.workplane.frame())
            .map_err(|e| ParamakError::construction(name, e))?;
        let outer = kernel
            .extrude(&wire, self.gap_size + 2.0 * self.distance, true)
            .map_err(|e| ParamakError::construction(name, e))?;
        let slot = kernel
            .extrude(&wire, self.gap_size, true)
            .map_err(|e| ParamakError::construction(name, e))?;
        kernel
            .boolean_cut(&outer, &slot)
            .map_err(|source| ParamakError::BooleanFailure {
                shape: name.to_string(),
                operation: "cut",
                source,
            })
    }
}

// =============================================================================
// Poloidal segmenter
// =============================================================================

/// Revolved triangular fans around `center_point` that split a shape into
/// poloidal segments.
///
/// With a `shape_to_segment` the solid is the compound of that shape's
/// pieces, one body per segment; without one it is the compound of the
/// fans themselves.
#[derive(Debug)]
pub struct PoloidalSegmenter {
    core: ShapeCore,
    center_point: Point,
    shape_to_segment: Option<ShapeRef>,
    number_of_segments: usize,
    max_distance_from_center: f64,
    rotation_angle: f64,
}

impl PoloidalSegmenter {
    /// Ten segments reaching 1000 from `center_point`.
    pub fn new(center_point: Point) -> Self {
        Self {
            core: ShapeCore::new("poloidal_segmenter").tagged("poloidal_segmenter_mat", "PoloidalSegmenter"),
            center_point,
            shape_to_segment: None,
            number_of_segments: 10,
            max_distance_from_center: 1000.0,
            rotation_angle: 360.0,
        }
    }

    /// Split into `n` equal angular segments. Fewer than three would give
    /// fans of 180 degrees or more.
    pub fn with_number_of_segments(mut self, n: usize) -> Result<Self> {
        if n < 3 {
            return Err(ParamakError::out_of_range("number_of_segments", n as f64, 3.0, f64::INFINITY));
        }
        self.number_of_segments = n;
        Ok(self)
    }

    /// The shape to split.
    pub fn with_shape_to_segment(mut self, shape: impl Into<ShapeRef>) -> Self {
        self.shape_to_segment = Some(shape.into());
        self
    }

    /// Reach of the fans.
    pub fn with_max_distance_from_center(mut self, distance: f64) -> Result<Self> {
        positive("max_distance_from_center", distance)?;
        self.max_distance_from_center = distance;
        Ok(self)
    }

    /// Revolve angle in degrees.
    pub fn with_rotation_angle(mut self, angle: f64) -> Result<Self> {
        check_rotation_angle(angle)?;
        self.rotation_angle = angle;
        Ok(self)
    }

    /// Number of segments.
    pub fn number_of_segments(&self) -> usize {
        self.number_of_segments
    }
}

impl ParametricShape for PoloidalSegmenter {
    core_accessors!();

    fn kind(&self) -> &'static str {
        "PoloidalSegmenter"
    }

    fn parameters(&self) -> Value {
        let target = self.shape_to_segment.as_ref().map(|s| s.hash_value().ok());
        json!({ "shape_to_segment": target })
    }

    fn profile(&self) -> Result<Profile> {
        let c = self.center_point;
        let reach = (c.0 + self.max_distance_from_center, c.1);
        let step = 360.0 / self.number_of_segments as f64;
        // Points behind the axis are pulled back along their ray to R = 0.
        let clip = |p: Point| {
            if p.0 < 0.0 {
                (0.0, coefficients_of_line_from_points(p, c).1)
            } else {
                p
            }
        };
        (0..self.number_of_segments)
            .map(|i| {
                let a = rotate(c, reach, (i as f64 * step).to_radians());
                let b = rotate(c, reach, ((i + 1) as f64 * step).to_radians());
                straight(&[c, clip(a), clip(b)])
            })
            .collect::<Result<Vec<_>>>()
            .map(Profile::Compound)
    }

    fn construction(&self) -> Result<Construction> {
        Ok(Construction::Rotate {
            rotation_angle: self.rotation_angle,
        })
    }

    fn construct(&self, kernel: &dyn Kernel) -> Result<Solid> {
        let fans = construct_leaves(self, kernel)?;
        let Some(target) = &self.shape_to_segment else {
            return Ok(Solid::compound(fans.iter()));
        };
        let target = target.solid()?;
        let pieces = fans
            .iter()
            .map(|fan| {
                kernel
                    .boolean_intersect(&target, fan)
                    .map_err(|source| ParamakError::BooleanFailure {
                        shape: self.core.name.clone(),
                        operation: "intersect",
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Solid::compound(pieces.iter()))
    }
}

// =============================================================================
// Cutting wedge
// =============================================================================

/// A revolved rectangle from the axis, used to remove a sector.
#[derive(Debug)]
pub struct CuttingWedge {
    core: ShapeCore,
    height: f64,
    radius: f64,
    rotation_angle: f64,
}

impl CuttingWedge {
    /// A half-turn wedge of the given size.
    pub fn new(height: f64, radius: f64) -> Result<Self> {
        positive("height", height)?;
        positive("radius", radius)?;
        Ok(Self {
            core: ShapeCore::new("cutting_wedge").tagged("cutting_slice_mat", "CuttingWedge"),
            height,
            radius,
            rotation_angle: 180.0,
        })
    }

    /// The wedge that removes everything `shape` leaves out of a full turn
    /// about its rotation axis.
    pub fn for_shape(shape: &dyn ParametricShape) -> Result<Self> {
        let kept = match shape.construction()? {
            Construction::Rotate { rotation_angle } | Construction::Extrude { rotation_angle, .. } => rotation_angle,
            Construction::Sweep { .. } => 360.0,
        };
        if kept >= 360.0 {
            return Err(ParamakError::invalid(
                "rotation_angle",
                format!("{} covers a full turn, there is nothing to cut", shape.name()),
            ));
        }
        let core = shape.core();
        let axis = core.rotation_axis.unwrap_or_else(|| core.workplane.default_rotation_axis());
        let global = axis.global_axis().ok_or_else(|| {
            ParamakError::invalid("rotation_axis", "a cutting wedge needs a global rotation axis")
        })?;
        let workplane = if core.workplane.axes().1 == global {
            core.workplane
        } else {
            match global {
                Axis::X => Workplane::ZX,
                Axis::Y => Workplane::XY,
                Axis::Z => Workplane::XZ,
            }
        };
        let largest = shape.largest_dimension()?.max(1.0);
        let mut wedge = Self::new(6.0 * largest, 3.0 * largest)?;
        wedge.rotation_angle = 360.0 - kept;
        wedge.core.stp_filename = Some("CuttingWedgeAlternate.stp".into());
        wedge.core.stl_filename = Some("CuttingWedgeAlternate.stl".into());
        wedge.core.workplane = workplane;
        wedge.core.rotation_axis = Some(RotationAxis::Global(global, false));
        wedge.core.azimuth_placement_angle = match core.azimuth_placement_angle.as_slice() {
            [single] => vec![single + kept],
            _ => vec![kept],
        };
        Ok(wedge)
    }

    /// Angle swept by the wedge in degrees.
    pub fn with_rotation_angle(mut self, angle: f64) -> Result<Self> {
        check_rotation_angle(angle)?;
        self.rotation_angle = angle;
        Ok(self)
    }

    /// Angle swept by the wedge.
    pub fn rotation_angle(&self) -> f64 {
        self.rotation_angle
    }

    /// Height of the wedge.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Radius of the wedge.
    pub fn radius(&self) -> f64 {
        self.radius
    }
}

impl ParametricShape for CuttingWedge {
    core_accessors!();

    fn kind(&self) -> &'static str {
        "CuttingWedge"
    }

    fn profile(&self) -> Result<Profile> {
        let h = self.height / 2.0;
        straight(&[(0.0, h), (self.radius, h), (self.radius, -h), (0.0, -h)])
    }

    fn construction(&self) -> Result<Construction> {
        Ok(Construction::Rotate {
            rotation_angle: self.rotation_angle,
        })
    }
}
