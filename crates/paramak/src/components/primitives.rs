//! Small building blocks: rectangles, pins, channels, pivoted outlines and
//! the hollow cube used as a graveyard.

use paramak_kernel::{Kernel, Solid};
use serde_json::{json, Value};

use super::{evenly_spaced, hollow_pairs, rectangle, straight};
use crate::error::{positive, ParamakError, Result};
use crate::shape::{check_rotation_angle, construct_leaves, Construction, ParametricShape, Profile, ShapeCore};
use crate::utils::{rotate, Point};
use crate::workplane::{Axis, RotationAxis, Workplane};

// =============================================================================
// Coolant channels
// =============================================================================

/// Path of a coolant channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelPath {
    /// Vertical cylinders.
    Straight,
    /// Channels bowed outward by `mid_offset` at the midplane.
    Curved {
        /// Radial bow at the midplane.
        mid_offset: f64,
    },
}

/// A ring of circular coolant channels around the vertical axis.
///
/// ```
/// use paramak::{CoolantChannelRing, ParametricShape};
///
/// let ring = CoolantChannelRing::straight(100.0, 5.0, 4, 50.0).unwrap();
/// assert_eq!(ring.core().azimuth_placement_angle, vec![0.0, 90.0, 180.0, 270.0]);
/// ```
#[derive(Debug)]
pub struct CoolantChannelRing {
    core: ShapeCore,
    path: ChannelPath,
    height: f64,
    channel_radius: f64,
    number_of_coolant_channels: usize,
    ring_radius: f64,
    start_angle: f64,
    force_cross_section: bool,
}

impl CoolantChannelRing {
    fn new(
        path: ChannelPath,
        height: f64,
        channel_radius: f64,
        number_of_coolant_channels: usize,
        ring_radius: f64,
    ) -> Result<Self> {
        positive("height", height)?;
        positive("channel_radius", channel_radius)?;
        if number_of_coolant_channels == 0 {
            return Err(ParamakError::invalid("number_of_coolant_channels", "at least one channel is needed"));
        }
        let stem = match path {
            ChannelPath::Straight => "CoolantChannelRingStraight",
            ChannelPath::Curved { .. } => "CoolantChannelRingCurved",
        };
        let mut core = ShapeCore::new("coolant_channel_ring").tagged("coolant_channel_mat", stem);
        core.workplane = Workplane::XY;
        core.rotation_axis = Some(RotationAxis::Global(Axis::Z, false));
        let mut ring = Self {
            core,
            path,
            height,
            channel_radius,
            number_of_coolant_channels,
            ring_radius,
            start_angle: 0.0,
            force_cross_section: false,
        };
        ring.place_channels();
        Ok(ring)
    }

    /// Straight channels `height` tall on a ring of `ring_radius`.
    pub fn straight(height: f64, channel_radius: f64, number_of_coolant_channels: usize, ring_radius: f64) -> Result<Self> {
        Self::new(ChannelPath::Straight, height, channel_radius, number_of_coolant_channels, ring_radius)
    }

    /// Channels swept through `(ring_radius + mid_offset, 0)` at the midplane.
    pub fn curved(
        height: f64,
        channel_radius: f64,
        number_of_coolant_channels: usize,
        ring_radius: f64,
        mid_offset: f64,
    ) -> Result<Self> {
        Self::new(
            ChannelPath::Curved { mid_offset },
            height,
            channel_radius,
            number_of_coolant_channels,
            ring_radius,
        )
    }

    /// Angle of the first channel in degrees.
    pub fn with_start_angle(mut self, angle: f64) -> Self {
        self.start_angle = angle;
        self.place_channels();
        self
    }

    /// Keep curved channels' sections perpendicular to their path.
    pub fn with_force_cross_section(mut self, force: bool) -> Self {
        self.force_cross_section = force;
        self
    }

    /// Change the channel count; placements follow.
    pub fn set_number_of_coolant_channels(&mut self, n: usize) -> Result<()> {
        if n == 0 {
            return Err(ParamakError::invalid("number_of_coolant_channels", "at least one channel is needed"));
        }
        self.number_of_coolant_channels = n;
        self.place_channels();
        Ok(())
    }

    fn place_channels(&mut self) {
        self.core.azimuth_placement_angle = evenly_spaced(self.start_angle, self.number_of_coolant_channels);
    }

    /// The sweep path of a curved channel.
    pub fn path_points(&self) -> Option<Vec<Point>> {
        match self.path {
            ChannelPath::Straight => None,
            ChannelPath::Curved { mid_offset } => {
                let (r, h) = (self.ring_radius, self.height / 2.0);
                Some(vec![(r, -h), (r + mid_offset, 0.0), (r, h)])
            }
        }
    }
}

impl ParametricShape for CoolantChannelRing {
    core_accessors!();

    fn kind(&self) -> &'static str {
        match self.path {
            ChannelPath::Straight => "CoolantChannelRingStraight",
            ChannelPath::Curved { .. } => "CoolantChannelRingCurved",
        }
    }

    fn profile(&self) -> Result<Profile> {
        // Swept sections start at the first path point.
        let center = match self.path {
            ChannelPath::Straight => (self.ring_radius, 0.0),
            ChannelPath::Curved { .. } => (0.0, 0.0),
        };
        Ok(Profile::Circle {
            center,
            radius: self.channel_radius,
        })
    }

    fn construction(&self) -> Result<Construction> {
        Ok(match self.path_points() {
            None => Construction::Extrude {
                distance: self.height,
                extrude_both: true,
                rotation_angle: 360.0,
                extrusion_start_offset: 0.0,
            },
            Some(path_points) => Construction::Sweep {
                path_points,
                path_workplane: Workplane::XZ,
                force_cross_section: self.force_cross_section,
            },
        })
    }
}

// =============================================================================
// Rectangles
// =============================================================================

/// A rectangle in the XZ plane extruded along Y.
#[derive(Debug)]
pub struct ExtrudeRectangle {
    core: ShapeCore,
    height: f64,
    width: f64,
    center_point: Point,
    distance: f64,
    extrude_both: bool,
}

impl ExtrudeRectangle {
    /// A `width` by `height` rectangle centred on `center_point`.
    pub fn new(height: f64, width: f64, center_point: Point, distance: f64) -> Result<Self> {
        positive("height", height)?;
        positive("width", width)?;
        positive("distance", distance)?;
        Ok(Self {
            core: ShapeCore::new("extrude_rectangle").tagged("extrude_rectangle_mat", "ExtrudeRectangle"),
            height,
            width,
            center_point,
            distance,
            extrude_both: true,
        })
    }

    /// Extrude one way instead of symmetrically.
    pub fn with_extrude_both(mut self, both: bool) -> Self {
        self.extrude_both = both;
        self
    }
}

impl ParametricShape for ExtrudeRectangle {
    core_accessors!();

    fn kind(&self) -> &'static str {
        "ExtrudeRectangle"
    }

    fn profile(&self) -> Result<Profile> {
        straight(&rectangle(self.center_point, self.width, self.height))
    }

    fn construction(&self) -> Result<Construction> {
        Ok(Construction::Extrude {
            distance: self.distance,
            extrude_both: self.extrude_both,
            rotation_angle: 360.0,
            extrusion_start_offset: 0.0,
        })
    }
}

/// A rectangular tube: a `width` by `height` hole with walls
/// `casing_thickness` thick, extruded along the workplane normal.
#[derive(Debug)]
pub struct ExtrudeHollowRectangle {
    core: ShapeCore,
    height: f64,
    width: f64,
    distance: f64,
    casing_thickness: f64,
    center_point: Point,
    extrude_both: bool,
}

impl ExtrudeHollowRectangle {
    /// A tube around a `width` by `height` hole centred at the origin.
    pub fn new(height: f64, width: f64, distance: f64, casing_thickness: f64) -> Result<Self> {
        positive("height", height)?;
        positive("width", width)?;
        positive("distance", distance)?;
        positive("casing_thickness", casing_thickness)?;
        Ok(Self {
            core: ShapeCore::new("extrude_hollow_rectangle"),
            height,
            width,
            distance,
            casing_thickness,
            center_point: (0.0, 0.0),
            extrude_both: true,
        })
    }

    /// Move the hole's centre.
    pub fn with_center_point(mut self, center_point: Point) -> Self {
        self.center_point = center_point;
        self
    }

    /// Extrude one way instead of symmetrically.
    pub fn with_extrude_both(mut self, both: bool) -> Self {
        self.extrude_both = both;
        self
    }
}

impl ParametricShape for ExtrudeHollowRectangle {
    core_accessors!();

    fn kind(&self) -> &'static str {
        "ExtrudeHollowRectangle"
    }

    fn profile(&self) -> Result<Profile> {
        let t = 2.0 * self.casing_thickness;
        Ok(Profile::Compound(vec![
            straight(&rectangle(self.center_point, self.width + t, self.height + t))?,
            straight(&rectangle(self.center_point, self.width, self.height))?,
        ]))
    }

    fn construction(&self) -> Result<Construction> {
        Ok(Construction::Extrude {
            distance: self.distance,
            extrude_both: self.extrude_both,
            rotation_angle: 360.0,
            extrusion_start_offset: 0.0,
        })
    }

    fn construct(&self, kernel: &dyn Kernel) -> Result<Solid> {
        hollow_pairs(&self.core.name, construct_leaves(self, kernel)?, kernel)
    }
}

// =============================================================================
// Hollow cube
// =============================================================================

/// An axis-aligned cube of side `length` surrounded by a shell; the outer
/// side is `length + thickness`.
#[derive(Debug)]
pub struct HollowCube {
    core: ShapeCore,
    length: f64,
    thickness: f64,
}

impl HollowCube {
    /// A shell 10 thick overall around a cube of side `length`.
    pub fn new(length: f64) -> Result<Self> {
        positive("length", length)?;
        Ok(Self {
            core: ShapeCore::new("hollow_cube").tagged("hollow_cube_mat", "HollowCube"),
            length,
            thickness: 10.0,
        })
    }

    /// The graveyard around geometry reaching `largest_dimension` from the
    /// origin, with `offset` clearance on every side.
    pub fn graveyard(largest_dimension: f64, offset: f64) -> Result<Self> {
        let length = 2.0 * largest_dimension + 2.0 * offset;
        let mut cube = Self::new(length).map_err(|_| {
            ParamakError::invalid("graveyard_offset", format!("graveyard side {length} is not positive"))
        })?;
        cube.core.name = "graveyard".into();
        cube.core.material_tag = Some("graveyard".into());
        cube.core.stp_filename = Some("graveyard.stp".into());
        cube.core.stl_filename = Some("graveyard.stl".into());
        Ok(cube)
    }

    /// Change the shell thickness.
    pub fn with_thickness(mut self, thickness: f64) -> Result<Self> {
        positive("thickness", thickness)?;
        self.thickness = thickness;
        Ok(self)
    }

    /// Inner side.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Outer side minus inner side.
    pub fn thickness(&self) -> f64 {
        self.thickness
    }
}

impl ParametricShape for HollowCube {
    core_accessors!();

    fn kind(&self) -> &'static str {
        "HollowCube"
    }

    fn parameters(&self) -> Value {
        json!({ "length": self.length, "thickness": self.thickness })
    }

    fn profile(&self) -> Result<Profile> {
        let outer = self.length + self.thickness;
        Ok(Profile::Compound(vec![
            straight(&rectangle((0.0, 0.0), outer, outer))?,
            straight(&rectangle((0.0, 0.0), self.length, self.length))?,
        ]))
    }

    fn construction(&self) -> Result<Construction> {
        Ok(Construction::Extrude {
            distance: self.length + self.thickness,
            extrude_both: true,
            rotation_angle: 360.0,
            extrusion_start_offset: 0.0,
        })
    }

    fn construct(&self, kernel: &dyn Kernel) -> Result<Solid> {
        let cube = |side: f64| {
            let h = side / 2.0;
            Solid::cuboid([-h, -h, -h], [h, h, h])
        };
        kernel
            .boolean_cut(&cube(self.length + self.thickness), &cube(self.length))
            .map_err(|source| ParamakError::BooleanFailure {
                shape: self.core.name.clone(),
                operation: "cut",
                source,
            })
    }
}

// =============================================================================
// Pins and pivoted outlines
// =============================================================================

/// A regular hexagonal prism.
#[derive(Debug)]
pub struct HexagonPin {
    core: ShapeCore,
    length_of_side: f64,
    distance: f64,
    center_point: Point,
}

impl HexagonPin {
    /// A pin with the given side length extruded `distance` about the
    /// XZ plane.
    pub fn new(length_of_side: f64, distance: f64, center_point: Point) -> Result<Self> {
        positive("length_of_side", length_of_side)?;
        positive("distance", distance)?;
        Ok(Self {
            core: ShapeCore::new("hexagon_pin").tagged("hexagon_pin_mat", "HexagonPin"),
            length_of_side,
            distance,
            center_point,
        })
    }
}

impl ParametricShape for HexagonPin {
    core_accessors!();

    fn kind(&self) -> &'static str {
        "HexagonPin"
    }

    fn profile(&self) -> Result<Profile> {
        let (cx, cy) = self.center_point;
        let s = self.length_of_side;
        let corners: Vec<Point> = (0..6)
            .map(|i| {
                let a = std::f64::consts::FRAC_PI_3 * i as f64;
                (cx + s * a.cos(), cy + s * a.sin())
            })
            .collect();
        straight(&corners)
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

/// Outline corners turned by `pivot_angle` degrees about `pivot`.
fn pivoted(pivot: Point, pivot_angle: f64, corners: &[Point]) -> Result<Profile> {
    let turned: Vec<Point> = corners
        .iter()
        .map(|&p| rotate(pivot, p, pivot_angle.to_radians()))
        .collect();
    straight(&turned)
}

/// An isosceles triangle hanging from its apex at `pivot_point`, turned by
/// `pivot_angle` and revolved about the vertical axis.
#[derive(Debug)]
pub struct RotatedIsoscelesTriangle {
    core: ShapeCore,
    base_length: f64,
    height: f64,
    pivot_point: Point,
    pivot_angle: f64,
    rotation_angle: f64,
}

impl RotatedIsoscelesTriangle {
    /// An unturned triangle with its base `height` below the apex.
    pub fn new(base_length: f64, height: f64, pivot_point: Point) -> Result<Self> {
        positive("base_length", base_length)?;
        positive("height", height)?;
        Ok(Self {
            core: ShapeCore::new("rotated_triangle").tagged("rotated_triangle_mat", "RotatedIsoscelesTriangle"),
            base_length,
            height,
            pivot_point,
            pivot_angle: 0.0,
            rotation_angle: 360.0,
        })
    }

    /// Turn the outline counter-clockwise about the apex, in degrees.
    pub fn with_pivot_angle(mut self, angle: f64) -> Self {
        self.pivot_angle = angle;
        self
    }

    /// Revolve angle in degrees.
    pub fn with_rotation_angle(mut self, angle: f64) -> Result<Self> {
        check_rotation_angle(angle)?;
        self.rotation_angle = angle;
        Ok(self)
    }
}

impl ParametricShape for RotatedIsoscelesTriangle {
    core_accessors!();

    fn kind(&self) -> &'static str {
        "RotatedIsoscelesTriangle"
    }

    fn profile(&self) -> Result<Profile> {
        let (px, py) = self.pivot_point;
        let b = self.base_length / 2.0;
        pivoted(
            self.pivot_point,
            self.pivot_angle,
            &[(px, py), (px - b, py - self.height), (px + b, py - self.height)],
        )
    }

    fn construction(&self) -> Result<Construction> {
        Ok(Construction::Rotate {
            rotation_angle: self.rotation_angle,
        })
    }
}

/// A trapezoid whose top edge is centred on `pivot_point`, turned by
/// `pivot_angle` and revolved about the vertical axis.
#[derive(Debug)]
pub struct RotatedTrapezoid {
    core: ShapeCore,
    length_1: f64,
    length_2: f64,
    length_3: f64,
    pivot_point: Point,
    pivot_angle: f64,
    rotation_angle: f64,
}

impl RotatedTrapezoid {
    /// Top edge `length_1`, base `length_2`, `length_3` apart.
    pub fn new(length_1: f64, length_2: f64, length_3: f64, pivot_point: Point) -> Result<Self> {
        positive("length_1", length_1)?;
        positive("length_2", length_2)?;
        positive("length_3", length_3)?;
        Ok(Self {
            core: ShapeCore::new("rotated_trapezoid").tagged("rotated_trapezoid_mat", "RotatedTrapezoid"),
            length_1,
            length_2,
            length_3,
            pivot_point,
            pivot_angle: 0.0,
            rotation_angle: 360.0,
        })
    }

    /// Turn the outline counter-clockwise about the pivot, in degrees.
    pub fn with_pivot_angle(mut self, angle: f64) -> Self {
        self.pivot_angle = angle;
        self
    }

    /// Revolve angle in degrees.
    pub fn with_rotation_angle(mut self, angle: f64) -> Result<Self> {
        check_rotation_angle(angle)?;
        self.rotation_angle = angle;
        Ok(self)
    }
}

impl ParametricShape for RotatedTrapezoid {
    core_accessors!();

    fn kind(&self) -> &'static str {
        "RotatedTrapezoid"
    }

    fn profile(&self) -> Result<Profile> {
        let (px, py) = self.pivot_point;
        let (top, base) = (self.length_1 / 2.0, self.length_2 / 2.0);
        pivoted(
            self.pivot_point,
            self.pivot_angle,
            &[
                (px + top, py),
                (px - top, py),
                (px - base, py - self.length_3),
                (px + base, py - self.length_3),
            ],
        )
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
    use std::f64::consts::PI;

    #[test]
    fn test_straight_channels() {
        let ring = CoolantChannelRing::straight(100.0, 5.0, 6, 50.0).unwrap();
        assert_eq!(ring.core().azimuth_placement_angle.len(), 6);
        assert_relative_eq!(ring.volume().unwrap(), 6.0 * PI * 25.0 * 100.0, max_relative = 0.01);
        let bb = ring.solid().unwrap().bounding_box();
        assert_relative_eq!(bb.max.z, 50.0, epsilon = 1e-6);
        assert_relative_eq!(bb.max.x, 55.0, epsilon = 1e-6);
    }

    #[test]
    fn test_channel_count_moves_placements() {
        let mut ring = CoolantChannelRing::straight(100.0, 5.0, 4, 50.0).unwrap().with_start_angle(10.0);
        assert_eq!(ring.core().azimuth_placement_angle, vec![10.0, 100.0, 190.0, 280.0]);
        let before = ring.hash_value().unwrap();
        ring.set_number_of_coolant_channels(3).unwrap();
        assert_eq!(ring.core().azimuth_placement_angle, vec![10.0, 130.0, 250.0]);
        assert_ne!(ring.hash_value().unwrap(), before);
        assert!(ring.set_number_of_coolant_channels(0).is_err());
    }

    #[test]
    fn test_curved_channels_bow_out() {
        let ring = CoolantChannelRing::curved(100.0, 5.0, 1, 50.0, 20.0).unwrap();
        assert_eq!(
            ring.path_points().unwrap(),
            vec![(50.0, -50.0), (70.0, 0.0), (50.0, 50.0)]
        );
        let bb = ring.solid().unwrap().bounding_box();
        assert!(bb.max.x > 70.0);
        assert!(bb.max.x < 80.0);
        assert!(ring.volume().unwrap() > 0.9 * PI * 25.0 * 100.0);
    }

    #[test]
    fn test_extrude_rectangle() {
        let rect = ExtrudeRectangle::new(20.0, 10.0, (100.0, 0.0), 5.0).unwrap();
        assert_relative_eq!(rect.volume().unwrap(), 1000.0, max_relative = 1e-6);
        assert_eq!(rect.points().unwrap()[0], (105.0, 10.0));
    }

    #[test]
    fn test_hollow_rectangle_volume() {
        let tube = ExtrudeHollowRectangle::new(20.0, 10.0, 30.0, 2.0).unwrap();
        assert_relative_eq!(tube.volume().unwrap(), (14.0 * 24.0 - 10.0 * 20.0) * 30.0, max_relative = 1e-6);
    }

    #[test]
    fn test_hollow_cube() {
        let cube = HollowCube::new(100.0).unwrap();
        assert_relative_eq!(cube.volume().unwrap(), 110.0f64.powi(3) - 100.0f64.powi(3), max_relative = 1e-6);
        let bb = cube.solid().unwrap().bounding_box();
        assert_relative_eq!(bb.max.x, 55.0, epsilon = 1e-9);
    }

    #[test]
    fn test_graveyard_encloses_geometry() {
        let graveyard = HollowCube::graveyard(500.0, 100.0).unwrap();
        assert_relative_eq!(graveyard.length(), 1200.0);
        assert_eq!(graveyard.core().material_tag.as_deref(), Some("graveyard"));
        assert!(HollowCube::graveyard(10.0, -20.0).is_err());
    }

    #[test]
    fn test_hexagon_pin() {
        let pin = HexagonPin::new(10.0, 50.0, (0.0, 0.0)).unwrap();
        let area = 3.0 * 3.0f64.sqrt() / 2.0 * 100.0;
        assert_relative_eq!(pin.volume().unwrap(), area * 50.0, max_relative = 1e-6);
        assert_eq!(pin.points().unwrap().len(), 6);
    }

    #[test]
    fn test_triangle_pivot() {
        let triangle = RotatedIsoscelesTriangle::new(20.0, 50.0, (100.0, 0.0)).unwrap();
        let points = triangle.points().unwrap();
        assert_eq!(points[1], (90.0, -50.0));
        let turned = RotatedIsoscelesTriangle::new(20.0, 50.0, (100.0, 0.0))
            .unwrap()
            .with_pivot_angle(90.0);
        let points = turned.points().unwrap();
        assert_eq!(points[0], (100.0, 0.0));
        assert_relative_eq!(points[1].0, 150.0, epsilon = 1e-9);
        assert_relative_eq!(points[1].1, -10.0, epsilon = 1e-9);
        // Pappus: area times the path of the centroid.
        let expected = 500.0 * 2.0 * PI * (100.0 + 2.0 * 50.0 / 3.0);
        assert_relative_eq!(turned.volume().unwrap(), expected, max_relative = 0.01);
    }

    #[test]
    fn test_trapezoid_pivot() {
        let trapezoid = RotatedTrapezoid::new(10.0, 20.0, 30.0, (100.0, 0.0))
            .unwrap()
            .with_pivot_angle(180.0);
        let points = trapezoid.points().unwrap();
        assert_relative_eq!(points[0].0, 95.0, epsilon = 1e-9);
        assert_relative_eq!(points[2].1, 30.0, epsilon = 1e-9);
        let area = 15.0 * 30.0;
        assert_relative_eq!(trapezoid.volume().unwrap(), area * 2.0 * PI * 100.0, max_relative = 0.01);
    }
}
