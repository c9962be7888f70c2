#![warn(missing_docs)]

//! Geometry primitives shared by the paramak kernel crates.
//!
//! Everything is `f64` and built on nalgebra. Reactor models live in the
//! `(x, z)` poloidal plane and are revolved about the z axis, so most
//! transforms here are rotations about a line plus translations.

use nalgebra::{Matrix4, Rotation3, Translation3, Unit, Vector2, Vector3};

/// Position in model space.
pub type Point3 = nalgebra::Point3<f64>;

/// Displacement in model space.
pub type Vec3 = Vector3<f64>;

/// Normalised axis direction.
pub type Dir3 = Unit<Vector3<f64>>;

/// Position on a sketch workplane.
pub type Point2 = nalgebra::Point2<f64>;

/// Displacement on a sketch workplane.
pub type Vec2 = Vector2<f64>;

/// Distance below which two sketch points or an edge length count as zero.
pub const LINEAR_TOLERANCE: f64 = 1e-6;

/// Homogeneous affine map applied to solids and meshes.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Row-major homogeneous matrix; the last row is `[0, 0, 0, 1]`.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// The map that leaves every point where it is.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Shift by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            matrix: Translation3::new(dx, dy, dz).to_homogeneous(),
        }
    }

    /// Right-handed turn of `angle` radians about `axis` through the origin.
    pub fn rotation_about_axis(axis: &Dir3, angle: f64) -> Self {
        Self {
            matrix: Rotation3::from_axis_angle(axis, angle).to_homogeneous(),
        }
    }

    /// Right-handed turn of `angle` radians about the line through `origin`.
    pub fn rotation_about_line(origin: &Point3, axis: &Dir3, angle: f64) -> Self {
        let shift = origin.coords;
        Self::translation(shift.x, shift.y, shift.z)
            .then(&Self::rotation_about_axis(axis, angle))
            .then(&Self::translation(-shift.x, -shift.y, -shift.z))
    }

    /// Matrix product `self * other`: `other` acts on a point first.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Map a position, translation included.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        Point3::from_homogeneous(self.matrix * p.to_homogeneous()).unwrap_or(*p)
    }

    /// Map a direction; translation has no effect.
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        self.matrix.fixed_view::<3, 3>(0, 0) * v
    }

    /// Determinant of the 3x3 block. Mirrors give a negative value and
    /// need their triangle winding flipped.
    pub fn determinant(&self) -> f64 {
        self.matrix.fixed_view::<3, 3>(0, 0).determinant()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Box aligned with the model axes, used for graveyard sizing and to skip
/// boolean work on disjoint solids.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3 {
    /// Lowest x, y and z.
    pub min: Point3,
    /// Highest x, y and z.
    pub max: Point3,
}

impl Aabb3 {
    /// Box spanning `min` to `max`.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Inside-out box that any included point replaces.
    pub fn empty() -> Self {
        Self {
            min: Point3::from(Vec3::repeat(f64::INFINITY)),
            max: Point3::from(Vec3::repeat(f64::NEG_INFINITY)),
        }
    }

    /// Smallest box holding every point.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Self {
        points.into_iter().fold(Self::empty(), |mut bounds, p| {
            bounds.include_point(p);
            bounds
        })
    }

    /// Whether nothing has been included yet.
    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| self.min[i] > self.max[i])
    }

    /// Stretch to cover `p`.
    pub fn include_point(&mut self, p: &Point3) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    /// Stretch to cover `other`. Empty boxes are ignored.
    pub fn include_box(&mut self, other: &Aabb3) {
        if !other.is_empty() {
            self.include_point(&other.min);
            self.include_point(&other.max);
        }
    }

    /// Whether the two boxes share any point, faces included.
    pub fn overlaps(&self, other: &Aabb3) -> bool {
        (0..3).all(|i| self.min[i] <= other.max[i] && other.min[i] <= self.max[i])
    }

    /// Pad every side by `margin`.
    pub fn expand(&mut self, margin: f64) {
        let pad = Vec3::repeat(margin);
        self.min -= pad;
        self.max += pad;
    }

    /// The furthest any corner coordinate gets from zero. Zero when empty.
    pub fn largest_abs_coordinate(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.min.coords.amax().max(self.max.coords.amax())
    }
}

impl Default for Aabb3 {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn close(a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < 1e-12
    }

    #[test]
    fn test_translation_moves_points_not_vectors() {
        let shift = Transform::translation(10.0, -5.0, 2.5);
        assert!(close(
            &shift.apply_point(&Point3::new(1.0, 1.0, 1.0)),
            &Point3::new(11.0, -4.0, 3.5)
        ));
        assert_eq!(shift.apply_vec(&Vec3::x()), Vec3::x());
    }

    #[test]
    fn test_quarter_turn_about_vertical_axis() {
        let turn = Transform::rotation_about_axis(&Vec3::z_axis(), FRAC_PI_2);
        assert!(close(
            &turn.apply_point(&Point3::new(400.0, 0.0, 30.0)),
            &Point3::new(0.0, 400.0, 30.0)
        ));
    }

    #[test]
    fn test_half_turn_about_offset_line() {
        let pivot = Point3::new(10.0, 0.0, 0.0);
        let turn = Transform::rotation_about_line(&pivot, &Vec3::z_axis(), 2.0 * FRAC_PI_2);
        assert!(close(
            &turn.apply_point(&Point3::new(11.0, 0.0, 5.0)),
            &Point3::new(9.0, 0.0, 5.0)
        ));
    }

    #[test]
    fn test_then_applies_argument_first() {
        let turn = Transform::rotation_about_axis(&Vec3::z_axis(), FRAC_PI_2);
        let shift = Transform::translation(1.0, 0.0, 0.0);
        // shift to (1, 0, 0) then turn onto the y axis
        assert!(close(
            &turn.then(&shift).apply_point(&Point3::origin()),
            &Point3::new(0.0, 1.0, 0.0)
        ));
    }

    #[test]
    fn test_mirror_has_negative_determinant() {
        assert!((Transform::default().determinant() - 1.0).abs() < 1e-12);
        let mirror = Transform {
            matrix: Matrix4::new_nonuniform_scaling(&Vec3::new(1.0, -1.0, 1.0)),
        };
        assert!(mirror.determinant() < 0.0);
    }

    #[test]
    fn test_bounds_grow_and_overlap() {
        let mut coil = Aabb3::from_points(&[Point3::new(100.0, -50.0, 600.0), Point3::new(150.0, 50.0, 650.0)]);
        let shield = Aabb3::new(Point3::new(0.0, -50.0, -600.0), Point3::new(100.0, 50.0, 600.0));
        assert!(coil.overlaps(&shield));
        coil.expand(-1.0);
        assert!(!coil.overlaps(&shield));

        let mut all = Aabb3::empty();
        assert!(all.is_empty());
        all.include_box(&Aabb3::empty());
        assert!(all.is_empty());
        all.include_box(&shield);
        assert_eq!(all, shield);
    }

    #[test]
    fn test_largest_abs_coordinate() {
        let bounds = Aabb3::new(Point3::new(-700.0, -1.0, 0.0), Point3::new(650.0, 2.0, 5.0));
        assert_eq!(bounds.largest_abs_coordinate(), 700.0);
        assert_eq!(Aabb3::empty().largest_abs_coordinate(), 0.0);
    }
}
