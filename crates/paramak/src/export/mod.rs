//! File writers for shapes and reactors.
//!
//! Every writer renders into memory first and then replaces the target in
//! one rename, so an interrupted export never leaves a half-written file
//! behind. Output is deterministic for identical inputs.

mod dagmc;
mod html;
mod stl;
mod svg;

use std::path::{Path, PathBuf};

use paramak_kernel::paramak_kernel_math::Point3;
use paramak_kernel::paramak_kernel_step::{LengthUnit, StepWriter};
use paramak_kernel::Solid;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use self::dagmc::{write_dagmc, DagmcBackend, DagmcOptions, DagmcVolume, JsonDagmcBackend};
pub use self::html::{write_html_2d, write_html_3d, PlotTrace};
pub use self::stl::write_stl;
pub use self::svg::{write_svg, SvgOptions};

// =============================================================================
// Options
// =============================================================================

/// What a STEP export contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StpMode {
    /// The built solid.
    #[default]
    Solid,
    /// The profile outlines only.
    Wire,
}

/// Length unit of exported coordinates. Geometry is modelled in
/// millimetres; centimetre output scales by 0.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Millimetres.
    #[default]
    Mm,
    /// Centimetres.
    Cm,
}

impl From<Units> for LengthUnit {
    fn from(units: Units) -> Self {
        match units {
            Units::Mm => LengthUnit::Millimetre,
            Units::Cm => LengthUnit::Centimetre,
        }
    }
}

/// Material and file names handed to neutronics workflows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeutronicsDescription {
    /// Material tag.
    pub material: String,
    /// STEP file name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stp_filename: Option<String>,
    /// Geometry file name, the STEP file unless overridden.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// STL file name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stl_filename: Option<String>,
}

// =============================================================================
// Paths and writes
// =============================================================================

/// `path` unchanged if its extension is one of `accepted` (any case),
/// otherwise with the extension replaced by `default`.
pub fn with_extension(path: &Path, accepted: &[&str], default: &str) -> PathBuf {
    let ok = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| accepted.iter().any(|a| a.eq_ignore_ascii_case(e)));
    if ok {
        path.to_path_buf()
    } else {
        path.with_extension(default)
    }
}

/// Write `bytes` to `path` through a sibling temporary file.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".part");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, bytes)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

// =============================================================================
// STEP
// =============================================================================

/// Write named solids to one STEP file. Bodies of a compound are written
/// as separate solids named `name`, `name_1`, `name_2`, ...
pub fn write_stp_solids(path: &Path, solids: &[(&str, &Solid)], units: Units) -> Result<()> {
    let mut writer = StepWriter::new(units.into());
    for (name, solid) in solids {
        for (i, body) in solid.bodies().iter().enumerate() {
            if i == 0 {
                writer.add_solid(name, body);
            } else {
                writer.add_solid(&format!("{name}_{i}"), body);
            }
        }
    }
    write_atomic(path, writer.write_to_buffer()?.as_bytes())?;
    tracing::info!(path = %path.display(), solids = solids.len(), "wrote STEP");
    Ok(())
}

/// Write named closed polylines to one STEP file.
pub fn write_stp_wires(path: &Path, wires: &[(&str, &[Point3])], units: Units) -> Result<()> {
    let mut writer = StepWriter::new(units.into());
    for (name, points) in wires {
        writer.add_wire(name, points);
    }
    write_atomic(path, writer.write_to_buffer()?.as_bytes())?;
    tracing::info!(path = %path.display(), wires = wires.len(), "wrote STEP wires");
    Ok(())
}

/// Write `value` as pretty-printed JSON.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    write_atomic(path, serde_json::to_string_pretty(value)?.as_bytes())?;
    tracing::info!(path = %path.display(), "wrote JSON");
    Ok(())
}

// =============================================================================
// Physical groups
// =============================================================================

#[derive(Serialize)]
struct PhysicalGroup<'a> {
    material: &'a str,
    volume_id: usize,
    surface_ids: Vec<usize>,
}

/// Write a JSON table giving each body a volume id and each of its faces
/// a surface id, both numbered from 1 across the whole file.
pub fn write_physical_groups(path: &Path, solids: &[(&str, &Solid)]) -> Result<()> {
    let mut groups = Vec::new();
    let mut next_surface = 1;
    for (material, solid) in solids {
        for body in solid.bodies() {
            let faces = body.face_areas().values().filter(|a| **a > 1e-9).count();
            groups.push(PhysicalGroup {
                material,
                volume_id: groups.len() + 1,
                surface_ids: (next_surface..next_surface + faces).collect(),
            });
            next_surface += faces;
        }
    }
    write_atomic(path, serde_json::to_string_pretty(&groups)?.as_bytes())?;
    tracing::info!(path = %path.display(), volumes = groups.len(), "wrote physical groups");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("paramak-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn test_with_extension() {
        assert_eq!(with_extension(Path::new("a/b.STEP"), &["stp", "step"], "stp"), Path::new("a/b.STEP"));
        assert_eq!(with_extension(Path::new("a/b"), &["stp"], "stp"), Path::new("a/b.stp"));
        assert_eq!(with_extension(Path::new("a/b.txt"), &["stl"], "stl"), Path::new("a/b.stl"));
    }

    #[test]
    fn test_step_units_and_determinism() {
        let cube = Solid::cuboid([0.0; 3], [10.0; 3]);
        let mm = scratch("cube_mm.stp");
        let cm = scratch("cube_cm.stp");
        write_stp_solids(&mm, &[("cube", &cube)], Units::Mm).unwrap();
        write_stp_solids(&cm, &[("cube", &cube)], Units::Cm).unwrap();
        let first = std::fs::read_to_string(&mm).unwrap();
        assert!(first.contains(".MILLI."));
        assert!(std::fs::read_to_string(&cm).unwrap().contains(".CENTI."));

        write_stp_solids(&mm, &[("cube", &cube)], Units::Mm).unwrap();
        assert_eq!(std::fs::read_to_string(&mm).unwrap(), first);
        assert!(!mm.with_extension("stp.part").exists());
    }

    #[test]
    fn test_physical_groups_number_surfaces() {
        let a = Solid::cuboid([0.0; 3], [1.0; 3]);
        let b = Solid::cuboid([5.0; 3], [6.0; 3]);
        let path = scratch("groups.json");
        write_physical_groups(&path, &[("steel", &a), ("water", &b)]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["material"], "steel");
        assert_eq!(value[1]["volume_id"], 2);
        let first = value[0]["surface_ids"].as_array().unwrap().len();
        assert_eq!(value[1]["surface_ids"][0], first + 1);
    }

    #[test]
    fn test_description_skips_missing_files() {
        let description = NeutronicsDescription {
            material: "steel".into(),
            stp_filename: Some("a.stp".into()),
            filename: Some("a.stp".into()),
            stl_filename: None,
        };
        let json = serde_json::to_value(&description).unwrap();
        assert_eq!(json["material"], "steel");
        assert!(json.get("stl_filename").is_none());
    }
}
