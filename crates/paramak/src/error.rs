//! Error and warning kinds raised by the parametric layer.

use std::collections::HashSet;
use std::sync::{Mutex, OnceLock};

use paramak_kernel::{paramak_kernel_step::StepError, KernelError};
use thiserror::Error;

/// Errors returned by shape construction, reactor assembly and export.
#[derive(Error, Debug)]
pub enum ParamakError {
    /// Malformed point list or connection sequence.
    #[error("invalid polyline: {0}")]
    InvalidPolyline(String),

    /// A numeric parameter violates its bounds.
    #[error("{parameter} = {value} is out of range [{min}, {max}]")]
    ParameterOutOfRange {
        /// Parameter name.
        parameter: String,
        /// Offending value.
        value: f64,
        /// Smallest accepted value.
        min: f64,
        /// Largest accepted value.
        max: f64,
    },

    /// A non-numeric parameter is inconsistent (mismatched list lengths,
    /// unknown option, missing companion value).
    #[error("invalid parameter {parameter}: {reason}")]
    InvalidParameter {
        /// Parameter name.
        parameter: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A radial or vertical build cannot be resolved.
    #[error("build resolution failed: {0}")]
    BuildResolutionError(String),

    /// The kernel failed to build a wire, face or solid.
    #[error("construction of {shape} failed: {source}")]
    ConstructionFailed {
        /// Name of the shape being built.
        shape: String,
        /// Kernel error.
        #[source]
        source: KernelError,
    },

    /// A cut, intersect or union produced an empty or invalid solid.
    #[error("boolean {operation} on {shape} failed: {source}")]
    BooleanFailure {
        /// Name of the shape being built.
        shape: String,
        /// `cut`, `intersect` or `union`.
        operation: &'static str,
        /// Kernel error.
        #[source]
        source: KernelError,
    },

    /// A sweep's path workplane does not fit its profile workplane.
    #[error("path workplane {path_workplane} is incompatible with workplane {workplane}")]
    IncompatiblePathWorkplane {
        /// Profile workplane.
        workplane: String,
        /// Path workplane.
        path_workplane: String,
    },

    /// A full poloidal window combined with a full toroidal revolve.
    #[error("{0}: full poloidal coverage with a 360 degree rotation is ambiguous")]
    AmbiguousFullCoverage(String),

    /// A revolve profile lies on both sides of its axis.
    #[error("{0}: profile crosses the rotation axis")]
    SelfIntersecting(String),

    /// A shape appears among its own cut, intersect or union children.
    #[error("{0} depends on itself through its boolean children")]
    CyclicDependency(String),

    /// Two shapes of a reactor claim the same name or output file.
    #[error("duplicate name: {0}")]
    DuplicateName(String),

    /// An I/O error occurred during export.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// STEP serialisation failed.
    #[error(transparent)]
    Step(#[from] StepError),

    /// JSON serialisation failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ParamakError {
    /// Shorthand for [`ParamakError::ParameterOutOfRange`].
    pub fn out_of_range(parameter: impl Into<String>, value: f64, min: f64, max: f64) -> Self {
        Self::ParameterOutOfRange {
            parameter: parameter.into(),
            value,
            min,
            max,
        }
    }

    /// Shorthand for [`ParamakError::InvalidParameter`].
    pub fn invalid(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a kernel error raised while building `shape`. Axis crossings
    /// become [`ParamakError::SelfIntersecting`].
    pub(crate) fn construction(shape: &str, source: KernelError) -> Self {
        match source {
            KernelError::Sketch(paramak_kernel::paramak_kernel_sketch::SketchError::AxisIntersection) => {
                Self::SelfIntersecting(shape.to_string())
            }
            source => Self::ConstructionFailed {
                shape: shape.to_string(),
                source,
            },
        }
    }
}

/// Result alias for the parametric layer.
pub type Result<T> = std::result::Result<T, ParamakError>;

/// Require `value > 0`.
pub(crate) fn positive(parameter: &str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ParamakError::out_of_range(parameter, value, 0.0, f64::INFINITY))
    }
}

/// Require `value >= 0`.
pub(crate) fn non_negative(parameter: &str, value: f64) -> Result<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ParamakError::out_of_range(parameter, value, 0.0, f64::INFINITY))
    }
}

/// Require `min <= value <= max`.
pub(crate) fn within(parameter: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ParamakError::out_of_range(parameter, value, min, max))
    }
}

// =============================================================================
// Warnings
// =============================================================================

/// Non-fatal conditions. Each distinct warning is logged once per process.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// Offset points that fell at negative radius were dropped.
    ShapeClippedNegativeR {
        /// Shape name.
        shape: String,
        /// Number of dropped points.
        dropped: usize,
    },
    /// A full 360 degree revolve whose end faces coincide.
    FullRotationInstability {
        /// Shape or reactor name.
        shape: String,
    },
    /// Material tags longer than 27 characters are truncated by DAGMC.
    LongMaterialTag {
        /// The tag.
        tag: String,
    },
}

impl Warning {
    fn key(&self) -> String {
        match self {
            Warning::ShapeClippedNegativeR { shape, .. } => format!("clipped:{shape}"),
            Warning::FullRotationInstability { shape } => format!("full-rotation:{shape}"),
            Warning::LongMaterialTag { tag } => format!("long-tag:{tag}"),
        }
    }

    /// Log the warning unless an identical one was already logged.
    /// Returns whether it was logged.
    pub fn emit(self) -> bool {
        static SEEN: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
        let seen = SEEN.get_or_init(|| Mutex::new(HashSet::new()));
        let fresh = match seen.lock() {
            Ok(mut set) => set.insert(self.key()),
            Err(poisoned) => poisoned.into_inner().insert(self.key()),
        };
        if !fresh {
            return false;
        }
        match &self {
            Warning::ShapeClippedNegativeR { shape, dropped } => tracing::warn!(
                shape = %shape,
                dropped,
                "points at negative radius were removed from the profile"
            ),
            Warning::FullRotationInstability { shape } => tracing::warn!(
                shape = %shape,
                "a 360 degree rotation may give coincident end faces; consider 359.9"
            ),
            Warning::LongMaterialTag { tag } => tracing::warn!(
                tag = %tag,
                len = tag.len(),
                "material tags over 27 characters are truncated by DAGMC"
            ),
        }
        true
    }
}
