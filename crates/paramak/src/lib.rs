#![warn(missing_docs)]

//! paramak: parametric fusion reactor geometry
//!
//! Shapes are defined by 2D outlines on a workplane that are revolved,
//! extruded or swept into solids. Solids are built lazily and cached
//! against a fingerprint of the parameters, so changing a parameter
//! rebuilds the shape on next use. Named components (plasma, blankets,
//! coils, shields, vessels, cutters) derive their outlines from
//! engineering parameters, and reactors assemble them from a radial build.
//!
//! # Example
//!
//! ```rust,no_run
//! use paramak::{BallReactor, BallReactorBuild, ParametricReactor, StpExportOptions};
//!
//! let reactor = BallReactor::new(BallReactorBuild {
//!     rotation_angle: 180.0,
//!     ..BallReactorBuild::default()
//! })
//! .unwrap();
//! reactor.export_stp("out".as_ref(), &StpExportOptions::default()).unwrap();
//! reactor.export_neutronics_description("out/manifest.json".as_ref(), true, true).unwrap();
//! ```

pub mod blanket;
pub mod components;
pub mod error;
pub mod export;
pub mod hash;
pub mod plasma;
pub mod polyline;
pub mod reactor;
pub mod shape;
pub mod utils;
pub mod workplane;

pub use blanket::{AngleFunction, BlanketConstantThicknessArc, BlanketFP, PhysicalGroup};
pub use components::{
    BlanketCutterParallels, BlanketCutterStar, CenterColumnShape, CenterColumnShield, ChannelPath,
    ConstantThicknessDome, CoolantChannelRing, CuttingWedge, DishedVacuumVessel, ExtrudeHollowRectangle,
    ExtrudeRectangle, HexagonPin, HollowCube, InnerTfCoils, InnerTfCoilsShape, PoloidalFieldCoil,
    PoloidalFieldCoilCase, PoloidalFieldCoilCaseSet, PoloidalFieldCoilSet, PoloidalSegmenter, PortCutterCircular,
    PortCutterRectangular, PortCutterRotated, RadiusType, RotatedIsoscelesTriangle, RotatedTrapezoid,
    TfCoilPlanform, ToroidalFieldCoil, VacuumVessel,
};
pub use error::{ParamakError, Result, Warning};
pub use export::{
    DagmcBackend, DagmcOptions, DagmcVolume, JsonDagmcBackend, NeutronicsDescription, PlotTrace, StpMode,
    SvgOptions, Units,
};
pub use plasma::{Plasma, PlasmaConfiguration, PlasmaParameters};
pub use polyline::{ConnectionKind, Polyline, PolylinePoint};
pub use reactor::{
    resolve_build, BallReactor, BallReactorBuild, BuildReactor, Layer, LayerKind, ParametricReactor,
    PfCoilOptions, Reactor, ReactorCore, ResolvedBuild, ResolvedLayer, SingleNullBallReactor, StpExportOptions,
    TfCoilOptions, DEFAULT_GRAVEYARD_SIZE,
};
pub use shape::{
    Color, Construction, ExtrudeShape, ParametricShape, Profile, RotateShape, ShapeCore, ShapeRef, ShapeVariant,
    SweepShape,
};
pub use utils::Point;
pub use workplane::{Axis, RotationAxis, Workplane};
