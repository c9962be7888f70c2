//! Vacuum vessels and domes.

use serde_json::{json, Value};

use super::straight;
use crate::error::{positive, ParamakError, Result};
use crate::polyline::{ConnectionKind, Polyline};
use crate::shape::{check_rotation_angle, Construction, ParametricShape, Profile, ShapeCore};

/// Outline of a constant-thickness spherical cap resting on the chord
/// `z = chord_center_height`, `|x| <= chord_width / 2`. Facing down mirrors
/// it below the chord.
fn dome_outline(
    thickness: f64,
    chord_center_height: f64,
    chord_width: f64,
    chord_height: f64,
    facing_down: bool,
) -> Result<Profile> {
    use ConnectionKind::{Circle, Straight};

    let half = chord_width / 2.0;
    let radius = chord_width * chord_width / (8.0 * chord_height) + chord_height / 2.0;
    let center = chord_center_height + chord_height - radius;
    let outer = radius + thickness;
    let outer_foot = center + (outer * outer - half * half).sqrt();

    let on_circle = |r: f64, angle: f64| (r * angle.cos(), center + r * angle.sin());
    let mid_angle = |z: f64| (std::f64::consts::FRAC_PI_2 + (z - center).atan2(half)) / 2.0;

    let points = [
        ((0.0, chord_center_height + chord_height), Circle),
        (on_circle(radius, mid_angle(chord_center_height)), Circle),
        ((half, chord_center_height), Straight),
        ((half, outer_foot), Circle),
        (on_circle(outer, mid_angle(outer_foot)), Circle),
        ((0.0, center + outer), Straight),
    ];
    let flip = |z: f64| {
        if facing_down {
            2.0 * chord_center_height - z
        } else {
            z
        }
    };
    let records = points.map(|((x, z), kind)| (x, flip(z), kind));
    Ok(Profile::Polyline(Polyline::new(records)?))
}

fn check_dome(thickness: f64, chord_width: f64, chord_height: f64) -> Result<()> {
    positive("thickness", thickness)?;
    positive("chord_width", chord_width)?;
    positive("chord_height", chord_height)?;
    if chord_height > chord_width / 2.0 {
        return Err(ParamakError::out_of_range(
            "chord_height",
            chord_height,
            0.0,
            chord_width / 2.0,
        ));
    }
    Ok(())
}

// =============================================================================
// Dome
// =============================================================================

/// A spherical cap of constant thickness on the vertical axis.
#[derive(Debug)]
pub struct ConstantThicknessDome {
    core: ShapeCore,
    thickness: f64,
    chord_center_height: f64,
    chord_width: f64,
    chord_height: f64,
    facing_down: bool,
    rotation_angle: f64,
}

impl ConstantThicknessDome {
    /// A dome whose inner surface rises `chord_height` above a chord of
    /// `chord_width` at `chord_center_height`.
    pub fn new(thickness: f64, chord_center_height: f64, chord_width: f64, chord_height: f64) -> Result<Self> {
        check_dome(thickness, chord_width, chord_height)?;
        Ok(Self {
            core: ShapeCore::new("constant_thickness_dome")
                .tagged("dome_mat", "ConstantThicknessDome"),
            thickness,
            chord_center_height,
            chord_width,
            chord_height,
            facing_down: false,
            rotation_angle: 360.0,
        })
    }

    /// Mirror the dome below its chord.
    pub fn facing_down(mut self, facing_down: bool) -> Self {
        self.facing_down = facing_down;
        self
    }

    /// Revolve angle in degrees.
    pub fn with_rotation_angle(mut self, angle: f64) -> Result<Self> {
        check_rotation_angle(angle)?;
        self.rotation_angle = angle;
        Ok(self)
    }

    /// Radius of the inner sphere.
    pub fn radius_of_curvature(&self) -> f64 {
        self.chord_width * self.chord_width / (8.0 * self.chord_height) + self.chord_height / 2.0
    }
}

impl ParametricShape for ConstantThicknessDome {
    core_accessors!();

    fn kind(&self) -> &'static str {
        "ConstantThicknessDome"
    }

    fn parameters(&self) -> Value {
        json!({ "facing_down": self.facing_down })
    }

    fn profile(&self) -> Result<Profile> {
        dome_outline(
            self.thickness,
            self.chord_center_height,
            self.chord_width,
            self.chord_height,
            self.facing_down,
        )
    }

    fn construction(&self) -> Result<Construction> {
        Ok(Construction::Rotate {
            rotation_angle: self.rotation_angle,
        })
    }
}

// =============================================================================
// Vessels
// =============================================================================

/// A flat-ended cylindrical vessel: a hollow cylinder with a lid and a
/// base, open around the axis.
#[derive(Debug)]
pub struct VacuumVessel {
    core: ShapeCore,
    height: f64,
    inner_radius: f64,
    thickness: f64,
    rotation_angle: f64,
}

impl VacuumVessel {
    /// A vessel enclosing a cylinder of `inner_radius` and `height`.
    pub fn new(height: f64, inner_radius: f64, thickness: f64) -> Result<Self> {
        positive("height", height)?;
        positive("inner_radius", inner_radius)?;
        positive("thickness", thickness)?;
        Ok(Self {
            core: ShapeCore::new("vacuum_vessel").tagged("vacuum_vessel_mat", "VacuumVessel"),
            height,
            inner_radius,
            thickness,
            rotation_angle: 360.0,
        })
    }

    /// Revolve angle in degrees.
    pub fn with_rotation_angle(mut self, angle: f64) -> Result<Self> {
        check_rotation_angle(angle)?;
        self.rotation_angle = angle;
        Ok(self)
    }

    /// Inner height.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Inner radius.
    pub fn inner_radius(&self) -> f64 {
        self.inner_radius
    }

    /// Wall thickness.
    pub fn thickness(&self) -> f64 {
        self.thickness
    }
}

impl ParametricShape for VacuumVessel {
    core_accessors!();

    fn kind(&self) -> &'static str {
        "VacuumVessel"
    }

    fn profile(&self) -> Result<Profile> {
        let (h, r, t) = (self.height / 2.0, self.inner_radius, self.thickness);
        straight(&[
            (0.0, h),
            (r, h),
            (r, -h),
            (0.0, -h),
            (0.0, -(h + t)),
            (r + t, -(h + t)),
            (r + t, h + t),
            (0.0, h + t),
        ])
    }

    fn construction(&self) -> Result<Construction> {
        Ok(Construction::Rotate {
            rotation_angle: self.rotation_angle,
        })
    }
}

/// A cylindrical vessel closed by two constant-thickness domes.
#[derive(Debug)]
pub struct DishedVacuumVessel {
    core: ShapeCore,
    radius: f64,
    center_point: f64,
    dish_height: f64,
    cylinder_height: f64,
    thickness: f64,
    rotation_angle: f64,
}

impl DishedVacuumVessel {
    /// A vessel of outer `radius` whose straight section is
    /// `cylinder_height` tall, centred at `center_point` on the axis.
    pub fn new(radius: f64, center_point: f64, dish_height: f64, cylinder_height: f64, thickness: f64) -> Result<Self> {
        positive("radius", radius)?;
        positive("thickness", thickness)?;
        positive("cylinder_height", cylinder_height)?;
        if thickness >= radius {
            return Err(ParamakError::out_of_range("thickness", thickness, 0.0, radius));
        }
        check_dome(thickness, 2.0 * (radius - thickness), dish_height)?;
        Ok(Self {
            core: ShapeCore::new("dished_vessel").tagged("vacuum_vessel_mat", "DishedVacuumVessel"),
            radius,
            center_point,
            dish_height,
            cylinder_height,
            thickness,
            rotation_angle: 360.0,
        })
    }

    /// Revolve angle in degrees.
    pub fn with_rotation_angle(mut self, angle: f64) -> Result<Self> {
        check_rotation_angle(angle)?;
        self.rotation_angle = angle;
        Ok(self)
    }
}

impl ParametricShape for DishedVacuumVessel {
    core_accessors!();

    fn kind(&self) -> &'static str {
        "DishedVacuumVessel"
    }

    fn parameters(&self) -> Value {
        json!({
            "radius": self.radius,
            "center_point": self.center_point,
            "dish_height": self.dish_height,
            "cylinder_height": self.cylinder_height,
            "thickness": self.thickness,
        })
    }

    fn profile(&self) -> Result<Profile> {
        let inner = self.radius - self.thickness;
        let top = self.center_point + self.cylinder_height / 2.0;
        let bottom = self.center_point - self.cylinder_height / 2.0;
        Ok(Profile::Compound(vec![
            straight(&[(inner, top), (self.radius, top), (self.radius, bottom), (inner, bottom)])?,
            dome_outline(self.thickness, top, 2.0 * inner, self.dish_height, false)?,
            dome_outline(self.thickness, bottom, 2.0 * inner, self.dish_height, true)?,
        ]))
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

    /// Volume under a sphere of radius `r` centred at height `c` on the
    /// axis, above `base` and inside the cylinder of radius `a`.
    fn cap_volume(r: f64, c: f64, base: f64, a: f64) -> f64 {
        PI * a * a * (c - base) + 2.0 * PI / 3.0 * (r.powi(3) - (r * r - a * a).powf(1.5))
    }

    #[test]
    fn test_dome_volume() {
        let dome = ConstantThicknessDome::new(10.0, 0.0, 200.0, 50.0).unwrap();
        let rho = dome.radius_of_curvature();
        assert_relative_eq!(rho, 125.0);
        let c = 50.0 - rho;
        let expected = cap_volume(rho + 10.0, c, 0.0, 100.0) - cap_volume(rho, c, 0.0, 100.0);
        assert_relative_eq!(dome.volume().unwrap(), expected, max_relative = 0.02);
    }

    #[test]
    fn test_dome_facing_down_mirrors() {
        let up = ConstantThicknessDome::new(10.0, 100.0, 200.0, 50.0).unwrap();
        let down = ConstantThicknessDome::new(10.0, 100.0, 200.0, 50.0).unwrap().facing_down(true);
        assert_relative_eq!(up.volume().unwrap(), down.volume().unwrap(), max_relative = 1e-6);
        let bb = down.solid().unwrap().bounding_box();
        assert!(bb.max.z <= 100.0 + 1e-6);
        assert_ne!(up.hash_value().unwrap(), down.hash_value().unwrap());
    }

    #[test]
    fn test_dome_rejects_deep_cap() {
        assert!(ConstantThicknessDome::new(10.0, 0.0, 200.0, 150.0).is_err());
        assert!(ConstantThicknessDome::new(0.0, 0.0, 200.0, 50.0).is_err());
    }

    #[test]
    fn test_vacuum_vessel_volume() {
        let vessel = VacuumVessel::new(800.0, 300.0, 20.0).unwrap();
        let expected = PI * 320.0f64.powi(2) * 840.0 - PI * 300.0f64.powi(2) * 800.0;
        assert_relative_eq!(vessel.volume().unwrap(), expected, max_relative = 0.01);
        assert_eq!(vessel.core().material_tag.as_deref(), Some("vacuum_vessel_mat"));
    }

    #[test]
    fn test_dished_vessel_is_cylinder_plus_domes() {
        let vessel = DishedVacuumVessel::new(300.0, 0.0, 50.0, 400.0, 15.0).unwrap();
        let wall = PI * (300.0f64.powi(2) - 285.0f64.powi(2)) * 400.0;
        let dome = ConstantThicknessDome::new(15.0, 200.0, 570.0, 50.0).unwrap();
        let expected = wall + 2.0 * dome.volume().unwrap();
        assert_relative_eq!(vessel.volume().unwrap(), expected, max_relative = 0.01);
        assert!(DishedVacuumVessel::new(300.0, 0.0, 50.0, 400.0, 300.0).is_err());
    }
}
