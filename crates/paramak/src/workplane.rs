//! Workplanes and rotation axes.

use std::fmt;
use std::str::FromStr;

use paramak_kernel::paramak_kernel_math::{Point3, Vec3};
use paramak_kernel::Frame;
use serde::{Deserialize, Serialize};

use crate::error::ParamakError;

/// One of the six ordered axis pairs a 2D profile can be drawn in.
///
/// The first letter is the direction of local x, the second of local y;
/// the normal is their cross product, so `XZ` faces −Y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Workplane {
    /// x → X, y → Y.
    XY,
    /// x → Y, y → X.
    YX,
    /// x → X, y → Z.
    #[default]
    XZ,
    /// x → Z, y → X.
    ZX,
    /// x → Y, y → Z.
    YZ,
    /// x → Z, y → Y.
    ZY,
}

/// A global coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// The X axis.
    X,
    /// The Y axis.
    Y,
    /// The Z axis.
    Z,
}

impl Axis {
    /// Unit vector along the axis.
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::x(),
            Axis::Y => Vec3::y(),
            Axis::Z => Vec3::z(),
        }
    }

    fn letter(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
        }
    }
}

impl Workplane {
    /// All six workplanes.
    pub const ALL: [Workplane; 6] = [
        Workplane::XY,
        Workplane::YX,
        Workplane::XZ,
        Workplane::ZX,
        Workplane::YZ,
        Workplane::ZY,
    ];

    /// The axes of local x and local y.
    pub fn axes(self) -> (Axis, Axis) {
        match self {
            Workplane::XY => (Axis::X, Axis::Y),
            Workplane::YX => (Axis::Y, Axis::X),
            Workplane::XZ => (Axis::X, Axis::Z),
            Workplane::ZX => (Axis::Z, Axis::X),
            Workplane::YZ => (Axis::Y, Axis::Z),
            Workplane::ZY => (Axis::Z, Axis::Y),
        }
    }

    /// Whether `axis` is one of the plane's two axes.
    pub fn contains(self, axis: Axis) -> bool {
        let (a, b) = self.axes();
        a == axis || b == axis
    }

    /// Kernel frame at the global origin.
    pub fn frame(self) -> Frame {
        let (a, b) = self.axes();
        Frame {
            origin: Point3::origin(),
            x_dir: a.unit(),
            y_dir: b.unit(),
        }
    }

    /// Unit normal (local x × local y).
    pub fn normal(self) -> Vec3 {
        let (a, b) = self.axes();
        a.unit().cross(&b.unit())
    }

    /// Map a local point to 3D.
    pub fn to_3d(self, p: (f64, f64)) -> Point3 {
        let (a, b) = self.axes();
        Point3::from(a.unit() * p.0 + b.unit() * p.1)
    }

    /// The default placement axis: the plane's second axis.
    pub fn default_rotation_axis(self) -> RotationAxis {
        RotationAxis::Global(self.axes().1, false)
    }
}

impl fmt::Display for Workplane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, b) = self.axes();
        write!(f, "{}{}", a.letter(), b.letter())
    }
}

impl FromStr for Workplane {
    type Err = ParamakError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Workplane::ALL
            .into_iter()
            .find(|w| w.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParamakError::invalid("workplane", format!("unknown workplane {s:?}")))
    }
}

/// The axis placement rotations turn about.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RotationAxis {
    /// A global axis through the origin; `true` reverses it.
    Global(Axis, bool),
    /// The line through two points, directed from the first to the second.
    Custom([f64; 3], [f64; 3]),
}

impl RotationAxis {
    /// A point on the axis and its (unnormalised) direction.
    pub fn line(&self) -> (Point3, Vec3) {
        match *self {
            RotationAxis::Global(axis, reversed) => {
                let d = axis.unit();
                (Point3::origin(), if reversed { -d } else { d })
            }
            RotationAxis::Custom(a, b) => (
                Point3::new(a[0], a[1], a[2]),
                Vec3::new(b[0] - a[0], b[1] - a[1], b[2] - a[2]),
            ),
        }
    }

    /// The global axis, if this is one.
    pub fn global_axis(&self) -> Option<Axis> {
        match *self {
            RotationAxis::Global(axis, _) => Some(axis),
            RotationAxis::Custom(..) => None,
        }
    }
}

impl FromStr for RotationAxis {
    type Err = ParamakError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (reversed, letter) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let axis = match letter.to_ascii_uppercase().as_str() {
            "X" => Axis::X,
            "Y" => Axis::Y,
            "Z" => Axis::Z,
            _ => {
                return Err(ParamakError::invalid(
                    "rotation_axis",
                    format!("expected X, Y, Z, -X, -Y or -Z, got {s:?}"),
                ))
            }
        };
        Ok(RotationAxis::Global(axis, reversed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normals_follow_right_hand_rule() {
        assert_eq!(Workplane::XY.normal(), Vec3::z());
        assert_eq!(Workplane::XZ.normal(), -Vec3::y());
        assert_eq!(Workplane::YZ.normal(), Vec3::x());
        assert_eq!(Workplane::ZX.normal(), Vec3::y());
        assert_eq!(Workplane::YX.normal(), -Vec3::z());
        assert_eq!(Workplane::ZY.normal(), -Vec3::x());
    }

    #[test]
    fn test_parse_round_trip_names() {
        for w in Workplane::ALL {
            assert_eq!(w.to_string().parse::<Workplane>().unwrap(), w);
        }
        assert!("XX".parse::<Workplane>().is_err());
    }

    #[test]
    fn test_default_rotation_axis_is_second_letter() {
        assert_eq!(
            Workplane::XZ.default_rotation_axis(),
            RotationAxis::Global(Axis::Z, false)
        );
        assert_eq!(
            Workplane::XY.default_rotation_axis(),
            RotationAxis::Global(Axis::Y, false)
        );
    }

    #[test]
    fn test_rotation_axis_parsing() {
        assert_eq!(
            "-z".parse::<RotationAxis>().unwrap(),
            RotationAxis::Global(Axis::Z, true)
        );
        let (_, d) = "-Z".parse::<RotationAxis>().unwrap().line();
        assert_eq!(d, -Vec3::z());
        assert!("W".parse::<RotationAxis>().is_err());
    }

    #[test]
    fn test_to_3d() {
        assert_eq!(Workplane::XZ.to_3d((3.0, 4.0)), Point3::new(3.0, 0.0, 4.0));
        assert_eq!(Workplane::ZY.to_3d((3.0, 4.0)), Point3::new(0.0, 4.0, 3.0));
    }
}
