//! Tagged faceted geometry for DAGMC neutronics.
//!
//! The facet writer sits behind [`DagmcBackend`] so an h5m writer can be
//! plugged in without touching shapes or reactors. [`JsonDagmcBackend`]
//! writes the same content as JSON.

use std::path::{Path, PathBuf};

use paramak_kernel::paramak_kernel_mesh::TriangleMesh;
use paramak_kernel::Solid;
use serde::{Deserialize, Serialize};

use super::{with_extension, write_atomic};
use crate::error::{ParamakError, Result, Warning};

/// Meshing and graveyard settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DagmcOptions {
    /// Smallest facet edge the mesher may produce.
    pub min_mesh_size: f64,
    /// Facets are refined until no edge is longer than this.
    pub max_mesh_size: f64,
    /// Add a `mat:graveyard` volume around the geometry.
    pub include_graveyard: bool,
    /// Clearance between the geometry and the graveyard.
    pub graveyard_offset: f64,
}

impl Default for DagmcOptions {
    fn default() -> Self {
        Self {
            min_mesh_size: 5.0,
            max_mesh_size: 20.0,
            include_graveyard: true,
            graveyard_offset: 100.0,
        }
    }
}

impl DagmcOptions {
    fn validate(&self) -> Result<()> {
        crate::error::positive("min_mesh_size", self.min_mesh_size)?;
        if self.min_mesh_size > self.max_mesh_size {
            return Err(ParamakError::out_of_range(
                "min_mesh_size",
                self.min_mesh_size,
                0.0,
                self.max_mesh_size,
            ));
        }
        Ok(())
    }
}

/// One tagged volume.
#[derive(Debug, Clone, Copy)]
pub struct DagmcVolume<'a> {
    /// Material tag, without the `mat:` prefix.
    pub material_tag: &'a str,
    /// Geometry.
    pub solid: &'a Solid,
}

impl<'a> DagmcVolume<'a> {
    /// Tag `solid` with `material_tag`.
    pub fn new(material_tag: &'a str, solid: &'a Solid) -> Self {
        Self { material_tag, solid }
    }

    /// Group name, `mat:<tag>`.
    pub fn group(&self) -> String {
        format!("mat:{}", self.material_tag)
    }
}

/// A writer of tagged faceted geometry.
pub trait DagmcBackend {
    /// File extension the backend writes.
    fn extension(&self) -> &'static str;

    /// Write `volumes` to `path`. Facets have already been refined to the
    /// requested mesh size.
    fn write(&self, path: &Path, volumes: &[(String, TriangleMesh)], options: &DagmcOptions) -> Result<()>;
}

/// Writes groups, positions and triangles as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDagmcBackend;

#[derive(Serialize)]
struct JsonVolume<'a> {
    id: usize,
    group: &'a str,
    positions: Vec<[f64; 3]>,
    triangles: &'a [[u32; 3]],
}

#[derive(Serialize)]
struct JsonModel<'a> {
    min_mesh_size: f64,
    max_mesh_size: f64,
    groups: std::collections::BTreeMap<&'a str, Vec<usize>>,
    volumes: Vec<JsonVolume<'a>>,
}

impl DagmcBackend for JsonDagmcBackend {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn write(&self, path: &Path, volumes: &[(String, TriangleMesh)], options: &DagmcOptions) -> Result<()> {
        let mut model = JsonModel {
            min_mesh_size: options.min_mesh_size,
            max_mesh_size: options.max_mesh_size,
            groups: Default::default(),
            volumes: Vec::with_capacity(volumes.len()),
        };
        for (i, (group, mesh)) in volumes.iter().enumerate() {
            model.groups.entry(group.as_str()).or_default().push(i + 1);
            model.volumes.push(JsonVolume {
                id: i + 1,
                group,
                positions: mesh.positions.iter().map(|p| [p.x, p.y, p.z]).collect(),
                triangles: &mesh.triangles,
            });
        }
        write_atomic(path, serde_json::to_string(&model)?.as_bytes())
    }
}

/// Refine and tag `volumes`, then hand them to `backend`. Every body of a
/// compound becomes its own volume in the owning group.
pub fn write_dagmc(
    path: &Path,
    backend: &dyn DagmcBackend,
    volumes: &[DagmcVolume<'_>],
    options: &DagmcOptions,
) -> Result<PathBuf> {
    options.validate()?;
    if volumes.is_empty() {
        return Err(ParamakError::invalid("volumes", "nothing to write"));
    }
    let mut tagged = Vec::new();
    for volume in volumes {
        if volume.material_tag.len() > 27 {
            Warning::LongMaterialTag {
                tag: volume.material_tag.to_string(),
            }
            .emit();
        }
        for body in volume.solid.bodies() {
            tagged.push((volume.group(), body.welded(1e6).refined(options.max_mesh_size)));
        }
    }
    let path = with_extension(path, &[backend.extension()], backend.extension());
    backend.write(&path, &tagged, options)?;
    tracing::info!(path = %path.display(), volumes = tagged.len(), "wrote DAGMC geometry");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_and_refinement() {
        let steel = Solid::cuboid([0.0; 3], [50.0; 3]);
        let graveyard = Solid::cuboid([-100.0; 3], [-90.0; 3]);
        let options = DagmcOptions {
            min_mesh_size: 1.0,
            max_mesh_size: 10.0,
            ..DagmcOptions::default()
        };
        let path = std::env::temp_dir().join(format!("paramak-dagmc-{}.h5m", std::process::id()));
        let written = write_dagmc(
            &path,
            &JsonDagmcBackend,
            &[DagmcVolume::new("steel", &steel), DagmcVolume::new("graveyard", &graveyard)],
            &options,
        )
        .unwrap();
        assert_eq!(written.extension().unwrap(), "json");

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&written).unwrap()).unwrap();
        assert_eq!(value["groups"]["mat:steel"], serde_json::json!([1]));
        assert_eq!(value["groups"]["mat:graveyard"], serde_json::json!([2]));
        let triangles = value["volumes"][0]["triangles"].as_array().unwrap().len();
        assert!(triangles > 12);
    }

    #[test]
    fn test_mesh_sizes_are_ordered() {
        let cube = Solid::cuboid([0.0; 3], [1.0; 3]);
        let options = DagmcOptions {
            min_mesh_size: 30.0,
            max_mesh_size: 20.0,
            ..DagmcOptions::default()
        };
        let path = std::env::temp_dir().join("paramak-dagmc-bad.json");
        let result = write_dagmc(&path, &JsonDagmcBackend, &[DagmcVolume::new("a", &cube)], &options);
        assert!(matches!(result, Err(ParamakError::ParameterOutOfRange { .. })));
    }
}
