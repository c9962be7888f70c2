//! Skinning a sequence of profile sections into a closed mesh.

use paramak_kernel_math::Point3;
use paramak_kernel_mesh::TriangleMesh;

use crate::cap::triangulate;
use crate::{ProfileLoop, SketchError};

/// Quantum used to weld generator output.
pub(crate) const WELD_QUANTUM: f64 = 1e9;

/// Skin `sections` (each one a placed copy of `profile`) into a solid.
///
/// `forward` states whether the sections advance along the profile plane's
/// normal. With `periodic` the last section is joined back to the first and
/// no caps are produced. Side faces take the profile's segment tags; the
/// start and end caps get `segment_count` and `segment_count + 1`.
pub(crate) fn loft(
    profile: &ProfileLoop,
    sections: &[Vec<Point3>],
    segment_count: u32,
    periodic: bool,
    forward: bool,
) -> Result<TriangleMesh, SketchError> {
    let n = profile.points.len();
    let m = sections.len();
    let mut mesh = TriangleMesh::new();
    for section in sections {
        for p in section {
            mesh.add_vertex(*p);
        }
    }
    let idx = |k: usize, i: usize| (k * n + i % n) as u32;

    let spans = if periodic { m } else { m - 1 };
    for k in 0..spans {
        let k1 = (k + 1) % m;
        for i in 0..n {
            let tag = profile.tags[i];
            let (b0, b1) = (idx(k, i), idx(k, i + 1));
            let (t0, t1) = (idx(k1, i), idx(k1, i + 1));
            mesh.add_triangle(b0, b1, t1, tag);
            mesh.add_triangle(b0, t1, t0, tag);
        }
    }

    if !periodic {
        let tris = triangulate(&profile.points)?;
        let last = m - 1;
        for t in &tris {
            mesh.add_triangle(idx(0, t[0] as usize), idx(0, t[2] as usize), idx(0, t[1] as usize), segment_count);
            mesh.add_triangle(
                idx(last, t[0] as usize),
                idx(last, t[1] as usize),
                idx(last, t[2] as usize),
                segment_count + 1,
            );
        }
    }

    if !forward {
        mesh.flip();
    }
    let mut mesh = mesh.welded(WELD_QUANTUM);
    if mesh.signed_volume() < 0.0 {
        mesh.flip();
    }
    Ok(mesh)
}
