//! Orthographic line drawings.
//!
//! Edges are drawn where two logical faces meet, so a revolved body shows
//! its profile edges swept round rather than every facet.

use std::collections::BTreeMap;
use std::path::Path;

use paramak_kernel::paramak_kernel_math::{Point3, Vec3};
use paramak_kernel::paramak_kernel_mesh::triangle_normal;
use paramak_kernel::Solid;
use serde::{Deserialize, Serialize};
use svg::node::element::path::Data;
use svg::node::element::{Group, Path as SvgPath};
use svg::Document;

use super::write_atomic;
use crate::error::{positive, Result};
use crate::shape::Color;

/// Drawing options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvgOptions {
    /// Image width in pixels.
    pub width: f64,
    /// Image height in pixels.
    pub height: f64,
    /// Horizontal margin on each side.
    pub margin_left: f64,
    /// Vertical margin on each side.
    pub margin_top: f64,
    /// Direction the drawing is viewed from.
    pub projection_dir: [f64; 3],
    /// Line width in pixels.
    pub stroke_width: f64,
    /// Visible line colour; each solid's own colour when unset.
    pub stroke_color: Option<Color>,
    /// Colour of hidden lines.
    pub hidden_color: Color,
    /// Draw edges facing away from the viewer.
    pub show_hidden: bool,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 240.0,
            margin_left: 200.0,
            margin_top: 20.0,
            projection_dir: [-1.75, 1.1, 5.0],
            stroke_width: 1.0,
            stroke_color: None,
            hidden_color: Color {
                r: 0.627,
                g: 0.627,
                b: 0.627,
                a: None,
            },
            show_hidden: true,
        }
    }
}

/// An orthographic camera: screen right, screen up and the viewing
/// direction.
struct View {
    right: Vec3,
    up: Vec3,
    toward_viewer: Vec3,
}

impl View {
    fn new(dir: [f64; 3]) -> Self {
        let d = Vec3::new(dir[0], dir[1], dir[2]);
        let d = if d.norm() < 1e-12 { Vec3::z() } else { d.normalize() };
        let world_up = if d.dot(&Vec3::z()).abs() > 0.999 { Vec3::y() } else { Vec3::z() };
        let right = world_up.cross(&d).normalize();
        let up = d.cross(&right);
        Self {
            right,
            up,
            toward_viewer: d,
        }
    }

    fn project(&self, p: &Point3) -> (f64, f64) {
        (p.coords.dot(&self.right), -p.coords.dot(&self.up))
    }
}

/// Edges of `solid` where faces meet, split into visible and hidden.
fn feature_edges(solid: &Solid, view: &View) -> (Vec<[Point3; 2]>, Vec<[Point3; 2]>) {
    let (mut visible, mut hidden) = (Vec::new(), Vec::new());
    for body in solid.bodies() {
        let welded = body.welded(1e6);
        let mut edges: BTreeMap<(u32, u32), Vec<(u32, bool)>> = BTreeMap::new();
        for (t, tri) in welded.triangles.iter().enumerate() {
            let [a, b, c] = tri.map(|i| welded.positions[i as usize]);
            let facing = triangle_normal(&a, &b, &c).dot(&view.toward_viewer) > 0.0;
            for (i, j) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                edges
                    .entry((i.min(j), i.max(j)))
                    .or_default()
                    .push((welded.face_ids[t], facing));
            }
        }
        for ((i, j), sides) in edges {
            let crease = sides.len() != 2 || sides[0].0 != sides[1].0;
            if !crease {
                continue;
            }
            let segment = [welded.positions[i as usize], welded.positions[j as usize]];
            if sides.iter().any(|s| s.1) {
                visible.push(segment);
            } else {
                hidden.push(segment);
            }
        }
    }
    (visible, hidden)
}

fn stroke(data: Data, color: Color, width: f64) -> SvgPath {
    SvgPath::new()
        .set("fill", "none")
        .set("stroke", color.to_hex())
        .set("stroke-width", width)
        .set("d", data)
}

/// Render solids as a projected line drawing, scaled to fit the image.
pub fn write_svg(path: &Path, solids: &[(&Solid, Color)], options: &SvgOptions) -> Result<()> {
    positive("width", options.width)?;
    positive("height", options.height)?;
    let view = View::new(options.projection_dir);
    let drawn: Vec<_> = solids
        .iter()
        .map(|(solid, color)| (feature_edges(solid, &view), *color))
        .collect();

    let (mut min, mut max) = ((f64::INFINITY, f64::INFINITY), (f64::NEG_INFINITY, f64::NEG_INFINITY));
    for ((visible, hidden), _) in &drawn {
        for p in visible.iter().chain(hidden).flatten() {
            let (x, y) = view.project(p);
            min = (min.0.min(x), min.1.min(y));
            max = (max.0.max(x), max.1.max(y));
        }
    }
    let span_x = (max.0 - min.0).max(1e-9);
    let span_y = (max.1 - min.1).max(1e-9);
    let avail_x = (options.width - 2.0 * options.margin_left).max(1.0);
    let avail_y = (options.height - 2.0 * options.margin_top).max(1.0);
    let scale = (avail_x / span_x).min(avail_y / span_y);
    let offset = (
        options.margin_left + (avail_x - span_x * scale) / 2.0,
        options.margin_top + (avail_y - span_y * scale) / 2.0,
    );
    let to_screen = |p: &Point3| {
        let (x, y) = view.project(p);
        ((x - min.0) * scale + offset.0, (y - min.1) * scale + offset.1)
    };
    let lines = |segments: &[[Point3; 2]]| {
        segments.iter().fold(Data::new(), |data, [a, b]| {
            data.move_to(to_screen(a)).line_to(to_screen(b))
        })
    };

    let mut document = Document::new()
        .set("width", options.width)
        .set("height", options.height)
        .set("viewBox", (0.0, 0.0, options.width, options.height));
    if options.show_hidden {
        let mut group = Group::new().set("stroke-dasharray", "4,2");
        for ((_, hidden), _) in &drawn {
            if !hidden.is_empty() {
                group = group.add(stroke(lines(hidden), options.hidden_color, options.stroke_width));
            }
        }
        document = document.add(group);
    }
    for ((visible, _), color) in &drawn {
        if !visible.is_empty() {
            let color = options.stroke_color.unwrap_or(*color);
            document = document.add(stroke(lines(visible), color, options.stroke_width));
        }
    }

    write_atomic(path, document.to_string().as_bytes())?;
    tracing::info!(path = %path.display(), "wrote SVG");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_drawing() {
        let cube = Solid::cuboid([0.0; 3], [10.0; 3]);
        let view = View::new([1.0, 1.0, 1.0]);
        let (visible, hidden) = feature_edges(&cube, &view);
        // Twelve box edges, diagonals inside each face are not creases.
        assert_eq!(visible.len() + hidden.len(), 12);
        assert_eq!(visible.len(), 9);

        let path = std::env::temp_dir().join(format!("paramak-svg-{}.svg", std::process::id()));
        write_svg(&path, &[(&cube, Color::default())], &SvgOptions::default()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("<svg"));
        assert!(text.contains("stroke-dasharray"));
    }

    #[test]
    fn test_view_basis() {
        let view = View::new([0.0, 0.0, 1.0]);
        assert!((view.right - Vec3::x()).norm() < 1e-12);
        assert!((view.up - Vec3::y()).norm() < 1e-12);
    }
}
