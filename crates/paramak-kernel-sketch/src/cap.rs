//! Planar cap triangulation.

use paramak_kernel_math::Point2;

use crate::SketchError;

/// Triangulate a simple polygon, returning index triples wound
/// counter-clockwise in the sketch plane.
pub(crate) fn triangulate(points: &[Point2]) -> Result<Vec<[u32; 3]>, SketchError> {
    if points.len() < 3 {
        return Err(SketchError::Triangulation(
            "polygon must have at least 3 vertices".to_string(),
        ));
    }
    let mut coords = Vec::with_capacity(points.len() * 2);
    for p in points {
        coords.push(p.x);
        coords.push(p.y);
    }
    let indices = earcutr::earcut(&coords, &[], 2)
        .map_err(|e| SketchError::Triangulation(format!("{:?}", e)))?;

    let mut tris = Vec::with_capacity(indices.len() / 3);
    for t in indices.chunks_exact(3) {
        let (a, b, c) = (points[t[0]], points[t[1]], points[t[2]]);
        let cross = (b - a).perp(&(c - a));
        if cross.abs() < 1e-300 {
            continue;
        }
        if cross > 0.0 {
            tris.push([t[0] as u32, t[1] as u32, t[2] as u32]);
        } else {
            tris.push([t[0] as u32, t[2] as u32, t[1] as u32]);
        }
    }
    Ok(tris)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l_shape_cap_area() {
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        let tris = triangulate(&pts).unwrap();
        let area: f64 = tris
            .iter()
            .map(|t| {
                let (a, b, c) = (pts[t[0] as usize], pts[t[1] as usize], pts[t[2] as usize]);
                (b - a).perp(&(c - a)) / 2.0
            })
            .sum();
        assert!((area - 3.0).abs() < 1e-12, "got {area}");
    }
}
