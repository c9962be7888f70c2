#![warn(missing_docs)]

//! STEP export for the paramak kernel.
//!
//! Writes ISO 10303-21 files under the AP214 (Automotive Design) schema.
//! Solids are written as faceted B-reps (one planar face per triangle over
//! shared cartesian points); construction wires as geometric curve sets of
//! polylines. Output is deterministic: the same bodies always serialise to
//! the same bytes.
//!
//! # Example
//!
//! ```no_run
//! use paramak_kernel_math::Point3;
//! use paramak_kernel_mesh::box_mesh;
//! use paramak_kernel_step::{LengthUnit, StepWriter};
//!
//! let mut writer = StepWriter::new(LengthUnit::Millimetre);
//! writer.add_solid("block", &box_mesh(Point3::origin(), Point3::new(10.0, 10.0, 10.0)));
//! writer.write("block.stp").unwrap();
//! ```

mod error;
mod writer;

pub use error::StepError;
pub use writer::{LengthUnit, StepWriter};
