//! Binary STL.

use std::io::Cursor;
use std::path::Path;

use paramak_kernel::paramak_kernel_mesh::triangle_normal;
use paramak_kernel::Solid;
use stl_io::{Normal, Triangle, Vertex};

use super::write_atomic;
use crate::error::{ParamakError, Result};

/// Write the triangles of every solid to one binary STL.
///
/// A `tolerance` subdivides facets until no edge is longer than it.
pub fn write_stl(path: &Path, solids: &[&Solid], tolerance: Option<f64>) -> Result<()> {
    if let Some(t) = tolerance {
        crate::error::positive("tolerance", t)?;
    }
    let mut triangles = Vec::new();
    for solid in solids {
        for body in solid.bodies() {
            let body = match tolerance {
                Some(t) => body.refined(t),
                None => body.clone(),
            };
            for ([a, b, c], _) in body.iter_triangles() {
                let n = triangle_normal(&a, &b, &c);
                let vertex = |p: paramak_kernel::paramak_kernel_math::Point3| {
                    Vertex::new([p.x as f32, p.y as f32, p.z as f32])
                };
                triangles.push(Triangle {
                    normal: Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                    vertices: [vertex(a), vertex(b), vertex(c)],
                });
            }
        }
    }
    if triangles.is_empty() {
        return Err(ParamakError::invalid("solids", "nothing to write"));
    }
    let mut cursor = Cursor::new(Vec::new());
    stl_io::write_stl(&mut cursor, triangles.iter())?;
    write_atomic(path, &cursor.into_inner())?;
    tracing::info!(path = %path.display(), triangles = triangles.len(), "wrote STL");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stl_round_trip_counts() {
        let dir = std::env::temp_dir().join(format!("paramak-stl-{}", std::process::id()));
        let path = dir.join("cube.stl");
        let cube = Solid::cuboid([0.0; 3], [10.0; 3]);
        write_stl(&path, &[&cube], None).unwrap();

        let mut file = std::fs::File::open(&path).unwrap();
        let mesh = stl_io::read_stl(&mut file).unwrap();
        assert_eq!(mesh.faces.len(), cube.bodies()[0].num_triangles());

        write_stl(&path, &[&cube], Some(2.0)).unwrap();
        let mut file = std::fs::File::open(&path).unwrap();
        let refined = stl_io::read_stl(&mut file).unwrap();
        assert!(refined.faces.len() > mesh.faces.len());

        assert!(write_stl(&path, &[&cube], Some(0.0)).is_err());
        assert!(write_stl(&path, &[], None).is_err());
    }
}
