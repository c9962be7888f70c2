//! Named reactor components.
//!
//! Each component stores the engineering parameters it is defined by and
//! derives its outline from them on every `profile()` call, so mutating a
//! parameter changes the fingerprint and rebuilds the solid on next use.

/// Implement the [`ParametricShape`](crate::shape::ParametricShape) core
/// accessors for a struct with a `core: ShapeCore` field.
macro_rules! core_accessors {
    () => {
        fn core(&self) -> &$crate::shape::ShapeCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut $crate::shape::ShapeCore {
            &mut self.core
        }
    };
}

mod center_column;
mod cutters;
mod pf_coils;
mod primitives;
mod tf_coils;
mod vessels;

pub use center_column::{CenterColumnShape, CenterColumnShield};
pub use cutters::{
    BlanketCutterParallels, BlanketCutterStar, CuttingWedge, PoloidalSegmenter, PortCutterCircular,
    PortCutterRectangular, PortCutterRotated,
};
pub use pf_coils::{PoloidalFieldCoil, PoloidalFieldCoilCase, PoloidalFieldCoilCaseSet, PoloidalFieldCoilSet};
pub use primitives::{
    ChannelPath, CoolantChannelRing, ExtrudeHollowRectangle, ExtrudeRectangle, HexagonPin, HollowCube,
    RotatedIsoscelesTriangle, RotatedTrapezoid,
};
pub use tf_coils::{InnerTfCoils, InnerTfCoilsShape, RadiusType, TfCoilPlanform, ToroidalFieldCoil};
pub use vessels::{ConstantThicknessDome, DishedVacuumVessel, VacuumVessel};

use paramak_kernel::{Kernel, Solid};

use crate::error::{ParamakError, Result};
use crate::polyline::Polyline;
use crate::shape::Profile;
use crate::utils::{linspace, Point};

/// `n` evenly spaced placement angles starting at `start`.
pub(crate) fn evenly_spaced(start: f64, n: usize) -> Vec<f64> {
    linspace(start, start + 360.0, n, false)
}

/// Corners of an axis-aligned rectangle, clockwise from the upper right.
pub(crate) fn rectangle(center: Point, width: f64, height: f64) -> Vec<Point> {
    let (cx, cy) = center;
    vec![
        (cx + width / 2.0, cy + height / 2.0),
        (cx + width / 2.0, cy - height / 2.0),
        (cx - width / 2.0, cy - height / 2.0),
        (cx - width / 2.0, cy + height / 2.0),
    ]
}

/// A straight-edged outline.
pub(crate) fn straight(points: &[Point]) -> Result<Profile> {
    Ok(Profile::Polyline(Polyline::straight(points)?))
}

/// Solids built from `(outer, inner)` leaf pairs: each inner is cut from
/// its outer and the rings are kept as separate bodies.
pub(crate) fn hollow_pairs(name: &str, leaves: Vec<Solid>, kernel: &dyn Kernel) -> Result<Solid> {
    if leaves.len() % 2 != 0 {
        return Err(ParamakError::invalid(
            "points",
            format!("{name}: hollow outlines come in outer/inner pairs"),
        ));
    }
    let rings = leaves
        .chunks(2)
        .map(|pair| {
            kernel
                .boolean_cut(&pair[0], &pair[1])
                .map_err(|source| ParamakError::BooleanFailure {
                    shape: name.to_string(),
                    operation: "cut",
                    source,
                })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Solid::compound(rings.iter()))
}

/// Check that every list has the same length as the first.
pub(crate) fn same_lengths(what: &str, lengths: &[usize]) -> Result<()> {
    if lengths.windows(2).any(|w| w[0] != w[1]) {
        return Err(ParamakError::invalid(
            what,
            format!("lists must be the same length, got {lengths:?}"),
        ));
    }
    Ok(())
}
