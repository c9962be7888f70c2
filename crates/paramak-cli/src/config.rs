//! Reactor descriptions read from TOML.

use std::path::Path;

use anyhow::{Context, Result};
use paramak::{
    resolve_build, BallReactor, BallReactorBuild, BuildReactor, DagmcOptions, Layer, ParametricReactor,
    ResolvedBuild, SingleNullBallReactor, SvgOptions, Units,
};
use serde::Deserialize;

/// Output formats of `paramak build`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// One STEP file per component.
    Stp,
    /// One binary STL file per component.
    Stl,
    /// A projected line drawing of the whole reactor.
    Svg,
    /// Interactive 2D outline and 3D viewers.
    Html,
    /// Tagged faceted geometry for DAGMC.
    H5m,
    /// The neutronics manifest.
    Json,
}

/// A whole reactor description.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Overrides the reactor's default name.
    #[serde(default)]
    pub name: Option<String>,
    /// What to build.
    pub reactor: ReactorConfig,
    /// Graveyard sizing.
    #[serde(default)]
    pub graveyard: GraveyardConfig,
    /// What to write.
    #[serde(default)]
    pub export: ExportConfig,
}

/// The reactor family and its parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReactorConfig {
    /// Spherical tokamak with upper and lower divertors.
    Ball(BallReactorBuild),
    /// Spherical tokamak with a lower divertor only.
    SingleNullBall(BallReactorBuild),
    /// Components laid out from an arbitrary build.
    Build(BuildConfig),
}

/// Parameters of a reactor laid out from a build.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    /// Layers from the axis outward.
    pub radial_build: Vec<Layer>,
    /// Layers from the bottom up; sets the elongation.
    #[serde(default)]
    pub vertical_build: Option<Vec<Layer>>,
    #[serde(default = "default_elongation")]
    pub elongation: f64,
    #[serde(default = "default_triangularity")]
    pub triangularity: f64,
    #[serde(default = "default_rotation_angle")]
    pub rotation_angle: f64,
}

fn default_elongation() -> f64 {
    2.0
}

fn default_triangularity() -> f64 {
    0.55
}

fn default_rotation_angle() -> f64 {
    360.0
}

/// Either a fixed graveyard side or a clearance around the reactor.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct GraveyardConfig {
    pub size: Option<f64>,
    pub offset: Option<f64>,
}

/// Export settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Used when no `--format` is given.
    pub formats: Vec<Format>,
    pub units: Units,
    pub include_plasma: bool,
    pub include_graveyard: bool,
    pub include_sector_wedge: bool,
    pub stl_tolerance: Option<f64>,
    pub svg: SvgOptions,
    pub dagmc: DagmcOptions,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            formats: vec![Format::Stp, Format::Json],
            units: Units::default(),
            include_plasma: true,
            include_graveyard: true,
            include_sector_wedge: false,
            stl_tolerance: None,
            svg: SvgOptions::default(),
            dagmc: DagmcOptions::default(),
        }
    }
}

impl Config {
    /// Read and parse a TOML file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Parse a TOML description.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// The resolved radial (and vertical) build.
    pub fn resolved_build(&self) -> paramak::Result<ResolvedBuild> {
        match &self.reactor {
            ReactorConfig::Ball(build) | ReactorConfig::SingleNullBall(build) => build.resolve(),
            ReactorConfig::Build(config) => resolve_build(&config.radial_build, config.vertical_build.as_deref()),
        }
    }

    /// Construct the reactor.
    pub fn reactor(&self) -> paramak::Result<Box<dyn ParametricReactor>> {
        match &self.reactor {
            ReactorConfig::Ball(build) => self.finish(BallReactor::new(build.clone())?),
            ReactorConfig::SingleNullBall(build) => self.finish(SingleNullBallReactor::new(build.clone())?),
            ReactorConfig::Build(config) => {
                let mut reactor = BuildReactor::new(config.radial_build.clone())?
                    .with_plasma_shape(config.elongation, config.triangularity)
                    .with_rotation_angle(config.rotation_angle)?;
                if let Some(vertical) = &config.vertical_build {
                    reactor = reactor.with_vertical_build(vertical.clone())?;
                }
                self.finish(reactor)
            }
        }
    }

    fn finish<R: ParametricReactor + 'static>(&self, mut reactor: R) -> paramak::Result<Box<dyn ParametricReactor>> {
        if let Some(name) = &self.name {
            reactor.core_mut().name = name.clone();
        }
        if let Some(size) = self.graveyard.size {
            reactor = reactor.with_graveyard_size(size)?;
        }
        if let Some(offset) = self.graveyard.offset {
            reactor = reactor.with_graveyard_offset(offset)?;
        }
        Ok(Box::new(reactor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paramak::LayerKind;

    #[test]
    fn test_bundled_configs_parse() {
        for text in [
            include_str!("../configs/ball.toml"),
            include_str!("../configs/single_null_ball.toml"),
            include_str!("../configs/build.toml"),
        ] {
            let config = Config::parse(text).unwrap();
            let build = config.resolved_build().unwrap();
            assert!(build.major_radius > build.minor_radius);
            config.reactor().unwrap();
        }
    }

    #[test]
    fn test_ball_defaults_fill_missing_fields() {
        let config = Config::parse(
            r#"
            [reactor]
            kind = "ball"
            rotation_angle = 90
            "#,
        )
        .unwrap();
        let ReactorConfig::Ball(build) = &config.reactor else {
            panic!("expected a ball reactor");
        };
        assert_eq!(build.rotation_angle, 90.0);
        assert_eq!(build.blanket_radial_thickness, 100.0);
        assert_eq!(config.export.formats, [Format::Stp, Format::Json]);
        assert_eq!(config.resolved_build().unwrap().major_radius, 400.0);
    }

    #[test]
    fn test_build_layers_and_graveyard() {
        let config = Config::parse(
            r#"
            name = "demo"

            [graveyard]
            offset = 50

            [reactor]
            kind = "build"
            rotation_angle = 180
            radial_build = [
                { kind = "gap", thickness = 100 },
                { kind = "solid", thickness = 50, name = "column" },
                { kind = "gap", thickness = 20 },
                { kind = "plasma", thickness = 300 },
                { kind = "gap", thickness = 20 },
                { kind = "solid", thickness = 40, name = "firstwall", material_tag = "eurofer" },
            ]
            "#,
        )
        .unwrap();
        let build = config.resolved_build().unwrap();
        assert_eq!(build.plasma().kind, LayerKind::Plasma);
        assert_eq!(build.major_radius, 320.0);

        let reactor = config.reactor().unwrap();
        assert_eq!(reactor.core().name, "demo");
        assert_eq!(reactor.core().graveyard_offset, Some(50.0));
        assert_eq!(reactor.names().unwrap(), ["column", "plasma", "firstwall"]);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let result = Config::parse(
            r#"
            [reactor]
            kind = "stellarator"
            "#,
        );
        assert!(result.is_err());
    }
}
