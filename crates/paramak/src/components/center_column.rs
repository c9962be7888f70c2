//! Centre column shields.

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{positive, ParamakError, Result};
use crate::polyline::{ConnectionKind, Polyline};
use crate::shape::{check_rotation_angle, Construction, ParametricShape, Profile, ShapeCore};

/// Outline of the shield's outer face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CenterColumnShape {
    /// Straight outer face.
    Cylinder,
    /// Outer face bulging in to `mid_radius` at the midplane along a spline.
    Hyperbola {
        /// Outer radius at the midplane.
        mid_radius: f64,
    },
    /// As [`CenterColumnShape::Hyperbola`], but only over the central
    /// `arc_height`; straight above and below.
    FlatTopHyperbola {
        /// Outer radius at the midplane.
        mid_radius: f64,
        /// Height of the curved section.
        arc_height: f64,
    },
    /// Outer face following a circular arc through `mid_radius`.
    Circular {
        /// Outer radius at the midplane.
        mid_radius: f64,
    },
    /// As [`CenterColumnShape::Circular`] over the central `arc_height`.
    FlatTopCircular {
        /// Outer radius at the midplane.
        mid_radius: f64,
        /// Height of the curved section.
        arc_height: f64,
    },
}

impl CenterColumnShape {
    fn kind(&self) -> &'static str {
        match self {
            CenterColumnShape::Cylinder => "CenterColumnShieldCylinder",
            CenterColumnShape::Hyperbola { .. } => "CenterColumnShieldHyperbola",
            CenterColumnShape::FlatTopHyperbola { .. } => "CenterColumnShieldFlatTopHyperbola",
            CenterColumnShape::Circular { .. } => "CenterColumnShieldCircular",
            CenterColumnShape::FlatTopCircular { .. } => "CenterColumnShieldFlatTopCircular",
        }
    }
}

/// A shield around the centre column, revolved about the vertical axis.
///
/// ```
/// use paramak::{CenterColumnShield, ParametricShape};
///
/// let shield = CenterColumnShield::cylinder(15.0, 5.0, 10.0).unwrap();
/// let expected = std::f64::consts::PI * (100.0 - 25.0) * 15.0;
/// assert!((shield.volume().unwrap() - expected).abs() / expected < 0.01);
/// ```
#[derive(Debug)]
pub struct CenterColumnShield {
    core: ShapeCore,
    shape: CenterColumnShape,
    height: f64,
    inner_radius: f64,
    outer_radius: f64,
    rotation_angle: f64,
}

impl CenterColumnShield {
    /// A shield with the given outer-face `shape`.
    pub fn new(shape: CenterColumnShape, height: f64, inner_radius: f64, outer_radius: f64) -> Result<Self> {
        let core = ShapeCore::new("center_column_shield").tagged("center_column_shield_mat", shape.kind());
        let shield = Self {
            core,
            shape,
            height,
            inner_radius,
            outer_radius,
            rotation_angle: 360.0,
        };
        shield.validate()?;
        Ok(shield)
    }

    /// A hollow cylinder.
    pub fn cylinder(height: f64, inner_radius: f64, outer_radius: f64) -> Result<Self> {
        Self::new(CenterColumnShape::Cylinder, height, inner_radius, outer_radius)
    }

    /// A spline-waisted shield.
    pub fn hyperbola(height: f64, inner_radius: f64, mid_radius: f64, outer_radius: f64) -> Result<Self> {
        Self::new(CenterColumnShape::Hyperbola { mid_radius }, height, inner_radius, outer_radius)
    }

    /// An arc-waisted shield.
    pub fn circular(height: f64, inner_radius: f64, mid_radius: f64, outer_radius: f64) -> Result<Self> {
        Self::new(CenterColumnShape::Circular { mid_radius }, height, inner_radius, outer_radius)
    }

    fn validate(&self) -> Result<()> {
        positive("height", self.height)?;
        positive("inner_radius", self.inner_radius)?;
        if self.inner_radius >= self.outer_radius {
            return Err(ParamakError::out_of_range(
                "inner_radius",
                self.inner_radius,
                0.0,
                self.outer_radius,
            ));
        }
        let (mid, arc_height) = match self.shape {
            CenterColumnShape::Cylinder => return Ok(()),
            CenterColumnShape::Hyperbola { mid_radius } | CenterColumnShape::Circular { mid_radius } => {
                (mid_radius, None)
            }
            CenterColumnShape::FlatTopHyperbola {
                mid_radius,
                arc_height,
            }
            | CenterColumnShape::FlatTopCircular {
                mid_radius,
                arc_height,
            } => (mid_radius, Some(arc_height)),
        };
        if !(self.inner_radius <= mid && mid <= self.outer_radius) {
            return Err(ParamakError::out_of_range(
                "mid_radius",
                mid,
                self.inner_radius,
                self.outer_radius,
            ));
        }
        if let Some(arc_height) = arc_height {
            positive("arc_height", arc_height)?;
            if arc_height >= self.height {
                return Err(ParamakError::out_of_range("arc_height", arc_height, 0.0, self.height));
            }
        }
        Ok(())
    }

    /// Change the height.
    pub fn set_height(&mut self, height: f64) -> Result<()> {
        let previous = std::mem::replace(&mut self.height, height);
        self.validate().inspect_err(|_| self.height = previous)
    }

    /// Change both radii.
    pub fn set_radii(&mut self, inner_radius: f64, outer_radius: f64) -> Result<()> {
        let previous = (self.inner_radius, self.outer_radius);
        (self.inner_radius, self.outer_radius) = (inner_radius, outer_radius);
        self.validate().inspect_err(|_| {
            (self.inner_radius, self.outer_radius) = previous;
        })
    }

    /// Revolve angle in degrees.
    pub fn with_rotation_angle(mut self, angle: f64) -> Result<Self> {
        check_rotation_angle(angle)?;
        self.rotation_angle = angle;
        Ok(self)
    }

    /// Height.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Inner radius.
    pub fn inner_radius(&self) -> f64 {
        self.inner_radius
    }

    /// Outer radius.
    pub fn outer_radius(&self) -> f64 {
        self.outer_radius
    }
}

impl ParametricShape for CenterColumnShield {
    core_accessors!();

    fn kind(&self) -> &'static str {
        self.shape.kind()
    }

    fn parameters(&self) -> Value {
        json!({ "shape": self.shape })
    }

    fn profile(&self) -> Result<Profile> {
        use ConnectionKind::{Circle, Spline, Straight};
        let (ri, ro, h) = (self.inner_radius, self.outer_radius, self.height / 2.0);
        let points = match self.shape {
            CenterColumnShape::Cylinder => {
                vec![(ri, h, Straight), (ro, h, Straight), (ro, -h, Straight), (ri, -h, Straight)]
            }
            CenterColumnShape::Hyperbola { mid_radius } | CenterColumnShape::Circular { mid_radius } => {
                let curve = if matches!(self.shape, CenterColumnShape::Circular { .. }) {
                    Circle
                } else {
                    Spline
                };
                vec![
                    (ri, 0.0, Straight),
                    (ri, h, Straight),
                    (ro, h, curve),
                    (mid_radius, 0.0, curve),
                    (ro, -h, Straight),
                    (ri, -h, Straight),
                ]
            }
            CenterColumnShape::FlatTopHyperbola {
                mid_radius,
                arc_height,
            }
            | CenterColumnShape::FlatTopCircular {
                mid_radius,
                arc_height,
            } => {
                let curve = if matches!(self.shape, CenterColumnShape::FlatTopCircular { .. }) {
                    Circle
                } else {
                    Spline
                };
                let a = arc_height / 2.0;
                vec![
                    (ri, 0.0, Straight),
                    (ri, h, Straight),
                    (ro, h, Straight),
                    (ro, a, curve),
                    (mid_radius, 0.0, curve),
                    (ro, -a, Straight),
                    (ro, -h, Straight),
                    (ri, -h, Straight),
                ]
            }
        };
        Ok(Profile::Polyline(Polyline::new(points)?))
    }

    fn construction(&self) -> Result<Construction> {
        Ok(Construction::Rotate {
            rotation_angle: self.rotation_angle,
        })
    }
}
