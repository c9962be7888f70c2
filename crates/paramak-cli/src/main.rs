//! paramak CLI - build parametric fusion reactors from TOML descriptions
//!
//! Reads a reactor description, constructs its components and writes the
//! requested exports into an output directory.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use paramak::{
    JsonDagmcBackend, ParametricReactor, ParametricShape, Plasma, PlasmaConfiguration, PlasmaParameters,
    ResolvedLayer, StpExportOptions, StpMode, Units,
};
use tracing_subscriber::EnvFilter;

mod config;

use config::{Config, Format};

#[derive(Parser)]
#[command(name = "paramak")]
#[command(about = "Parametric fusion reactor geometry", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a reactor from a TOML description and export it
    Build {
        /// Reactor description
        config: PathBuf,
        /// Output directory
        #[arg(short, long, default_value = "out")]
        out: PathBuf,
        /// Export format, repeatable (default: `export.formats` of the config)
        #[arg(short, long = "format", value_enum)]
        formats: Vec<Format>,
    },
    /// Draw a plasma boundary as an interactive HTML plot
    Plasma {
        #[arg(long)]
        major_radius: f64,
        #[arg(long)]
        minor_radius: f64,
        #[arg(long, default_value_t = 2.0)]
        elongation: f64,
        #[arg(long, default_value_t = 0.55, allow_hyphen_values = true)]
        triangularity: f64,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        vertical_displacement: f64,
        /// non-null, single-null or double-null
        #[arg(long, default_value = "non-null")]
        configuration: PlasmaConfiguration,
        /// HTML file to write
        #[arg(short, long)]
        out: PathBuf,
        /// Also write the revolved plasma as STEP
        #[arg(long)]
        stp: Option<PathBuf>,
    },
    /// Print the resolved build and component volumes
    Info {
        /// Reactor description
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Build { config, out, formats } => build(&config, &out, formats),
        Commands::Plasma {
            major_radius,
            minor_radius,
            elongation,
            triangularity,
            vertical_displacement,
            configuration,
            out,
            stp,
        } => {
            let params = PlasmaParameters {
                major_radius,
                minor_radius,
                elongation,
                triangularity,
                vertical_displacement,
                configuration,
                ..PlasmaParameters::default()
            };
            plasma(params, &out, stp.as_deref())
        }
        Commands::Info { config } => info(&config),
    }
}

fn build(config_path: &Path, out: &Path, formats: Vec<Format>) -> Result<()> {
    let config = Config::from_path(config_path)?;
    let reactor = config.reactor().context("invalid reactor description")?;
    let formats = if formats.is_empty() {
        config.export.formats.clone()
    } else {
        formats
    };
    if formats.is_empty() {
        bail!("nothing to export: pass --format or set export.formats");
    }
    std::fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;

    let export = &config.export;
    tracing::info!(reactor = %reactor.core().name, ?formats, out = %out.display(), "building");
    for format in formats {
        let written = match format {
            Format::Stp => reactor.export_stp(
                out,
                &StpExportOptions {
                    units: export.units,
                    include_graveyard: export.include_graveyard,
                    include_sector_wedge: export.include_sector_wedge,
                },
            )?,
            Format::Stl => reactor.export_stl(out, export.stl_tolerance, export.include_graveyard)?,
            Format::Svg => vec![reactor.export_svg(&out.join("reactor.svg"), &export.svg)?],
            Format::Html => vec![
                reactor.export_html(&out.join("reactor.html"))?,
                reactor.export_html_3d(&out.join("reactor_3d.html"))?,
            ],
            Format::H5m => vec![reactor.export_dagmc_h5m(&out.join("dagmc.h5m"), &JsonDagmcBackend, &export.dagmc)?],
            Format::Json => vec![reactor.export_neutronics_description(
                &out.join("manifest.json"),
                export.include_plasma,
                export.include_graveyard,
            )?],
        };
        for path in written {
            println!("{}", path.display());
        }
    }
    Ok(())
}

fn plasma(params: PlasmaParameters, out: &Path, stp: Option<&Path>) -> Result<()> {
    let plasma = Plasma::from_parameters(params)?;
    println!("{}", plasma.export_html(out)?.display());
    if let Some(stp) = stp {
        println!("{}", plasma.export_stp(stp, StpMode::default(), Units::default())?.display());
    }
    Ok(())
}

fn info(config_path: &Path) -> Result<()> {
    let config = Config::from_path(config_path)?;
    let build = config.resolved_build()?;
    let reactor = config.reactor()?;

    println!("{} ({})", reactor.core().name, reactor.kind());
    println!("  Major radius: {:.3}", build.major_radius);
    println!("  Minor radius: {:.3}", build.minor_radius);
    if let Some(elongation) = build.elongation {
        println!("  Elongation: {elongation:.3}");
    }
    println!("  Vertical displacement: {:.3}", build.vertical_displacement);
    println!("  Rotation angle: {}", reactor.rotation_angle());

    println!("\nRadial build:");
    print_layers(&build.radial);
    if let Some(vertical) = &build.vertical {
        println!("\nVertical build:");
        print_layers(vertical);
    }

    println!("\nComponents:");
    for shape in reactor.shapes_and_components()?.iter() {
        let solid = shape.solid()?;
        println!("  {:<24} {:>16.1}", shape.name(), solid.volume());
    }
    println!("\nLargest dimension: {:.3}", reactor.largest_dimension()?);
    Ok(())
}

fn print_layers(layers: &[ResolvedLayer]) {
    for layer in layers {
        let kind = format!("{:?}", layer.kind).to_lowercase();
        println!("  {:<24} {kind:<7} {:>10.3} {:>10.3}", layer.name, layer.start, layer.end);
    }
}
