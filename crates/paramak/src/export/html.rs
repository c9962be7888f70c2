//! Self-contained HTML pages: a 2D plot of profile points and a 3D scene.

use std::path::Path;

use paramak_kernel::Solid;
use serde::Serialize;
use svg::node::element::path::Data;
use svg::node::element::{Circle, Path as SvgPath, Rectangle, Text};
use svg::Document;

use super::write_atomic;
use crate::error::{ParamakError, Result};
use crate::polyline::ConnectionKind;
use crate::shape::{Color, Profile};
use crate::utils::Point;

const PLOT_SIZE: f64 = 600.0;
const PLOT_MARGIN: f64 = 40.0;

/// One named series of a 2D plot.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotTrace {
    /// Legend entry.
    pub name: String,
    /// Line colour.
    pub color: Color,
    /// Closed outlines, each a list of points with their outgoing
    /// connection kind.
    pub outlines: Vec<Vec<(Point, ConnectionKind)>>,
}

impl PlotTrace {
    /// The outlines of `profile`. A circle appears as its centre.
    pub fn from_profile(name: &str, profile: &Profile, color: Color) -> Self {
        let outlines = profile
            .leaves()
            .into_iter()
            .map(|leaf| match leaf {
                Profile::Polyline(line) => line.records().iter().map(|p| (p.xy(), p.connection)).collect(),
                Profile::Circle { center, .. } => vec![(*center, ConnectionKind::Circle)],
                Profile::Compound(_) => Vec::new(),
            })
            .collect();
        Self {
            name: name.to_string(),
            color,
            outlines,
        }
    }
}

fn marker(kind: ConnectionKind) -> &'static str {
    match kind {
        ConnectionKind::Straight => "#1f77b4",
        ConnectionKind::Spline => "#2ca02c",
        ConnectionKind::Circle => "#d62728",
    }
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n{body}\n</body>\n</html>\n"
    )
}

/// Plot profile points in the (R, Z) plane with one marker colour per
/// connection kind.
pub fn write_html_2d(path: &Path, traces: &[PlotTrace]) -> Result<()> {
    let points = || traces.iter().flat_map(|t| t.outlines.iter().flatten()).map(|(p, _)| *p);
    if points().next().is_none() {
        return Err(ParamakError::invalid("traces", "nothing to plot"));
    }
    let (mut min, mut max) = ((f64::INFINITY, f64::INFINITY), (f64::NEG_INFINITY, f64::NEG_INFINITY));
    for (x, y) in points() {
        min = (min.0.min(x), min.1.min(y));
        max = (max.0.max(x), max.1.max(y));
    }
    let span = (max.0 - min.0).max(max.1 - min.1).max(1e-9);
    let scale = (PLOT_SIZE - 2.0 * PLOT_MARGIN) / span;
    let to_screen = |(x, y): Point| {
        (PLOT_MARGIN + (x - min.0) * scale, PLOT_SIZE - PLOT_MARGIN - (y - min.1) * scale)
    };

    let mut document = Document::new()
        .set("width", PLOT_SIZE)
        .set("height", PLOT_SIZE)
        .set("viewBox", (0.0, 0.0, PLOT_SIZE, PLOT_SIZE))
        .add(Rectangle::new().set("width", PLOT_SIZE).set("height", PLOT_SIZE).set("fill", "white"));
    for (i, trace) in traces.iter().enumerate() {
        for outline in &trace.outlines {
            if outline.len() > 1 {
                let mut data = Data::new().move_to(to_screen(outline[0].0));
                for (p, _) in &outline[1..] {
                    data = data.line_to(to_screen(*p));
                }
                document = document.add(
                    SvgPath::new()
                        .set("fill", "none")
                        .set("stroke", trace.color.to_hex())
                        .set("d", data.close()),
                );
            }
            for (p, kind) in outline {
                let (cx, cy) = to_screen(*p);
                document = document.add(
                    Circle::new()
                        .set("cx", cx)
                        .set("cy", cy)
                        .set("r", 3)
                        .set("fill", marker(*kind))
                        .set("class", kind.to_string()),
                );
            }
        }
        document = document.add(
            Text::new(trace.name.as_str())
                .set("x", PLOT_MARGIN)
                .set("y", 16.0 * (i + 1) as f64)
                .set("fill", trace.color.to_hex()),
        );
    }

    let title = traces.first().map(|t| t.name.as_str()).unwrap_or("profile");
    write_atomic(path, page(title, &document.to_string()).as_bytes())?;
    tracing::info!(path = %path.display(), traces = traces.len(), "wrote 2D HTML");
    Ok(())
}

#[derive(Serialize)]
struct SceneMesh<'a> {
    name: &'a str,
    color: String,
    positions: Vec<f32>,
    indices: Vec<u32>,
}

const VIEWER: &str = r#"<canvas id="view" width="900" height="700"></canvas>
<script>
const scene = JSON.parse(document.getElementById("scene").textContent);
const canvas = document.getElementById("view");
const ctx = canvas.getContext("2d");
let yaw = 0.6, pitch = 0.4, drag = null;
const tris = [];
let extent = 1;
for (const m of scene) {
  for (let i = 0; i < m.indices.length; i += 3) {
    const v = [0, 1, 2].map(k => m.positions.slice(3 * m.indices[i + k], 3 * m.indices[i + k] + 3));
    v.forEach(p => p.forEach(c => extent = Math.max(extent, Math.abs(c))));
    tris.push({ v, color: m.color, name: m.name });
  }
}
function draw() {
  const cy = Math.cos(yaw), sy = Math.sin(yaw), cp = Math.cos(pitch), sp = Math.sin(pitch);
  const s = 0.45 * Math.min(canvas.width, canvas.height) / extent;
  const proj = p => {
    const x = cy * p[0] - sy * p[1], y = sy * p[0] + cy * p[1];
    return [x, cp * p[2] - sp * y, sp * p[2] + cp * y];
  };
  const faces = tris.map(t => ({ p: t.v.map(proj), color: t.color }));
  faces.sort((a, b) => (a.p[0][2] + a.p[1][2] + a.p[2][2]) - (b.p[0][2] + b.p[1][2] + b.p[2][2]));
  ctx.clearRect(0, 0, canvas.width, canvas.height);
  for (const f of faces) {
    ctx.beginPath();
    f.p.forEach((q, i) => {
      const X = canvas.width / 2 + s * q[0], Y = canvas.height / 2 - s * q[1];
      i ? ctx.lineTo(X, Y) : ctx.moveTo(X, Y);
    });
    ctx.closePath();
    ctx.fillStyle = f.color;
    ctx.strokeStyle = "rgba(0,0,0,0.15)";
    ctx.fill();
    ctx.stroke();
  }
}
canvas.onmousedown = e => drag = [e.clientX, e.clientY];
window.onmouseup = () => drag = null;
canvas.onmousemove = e => {
  if (!drag) return;
  yaw += 0.01 * (e.clientX - drag[0]);
  pitch += 0.01 * (e.clientY - drag[1]);
  drag = [e.clientX, e.clientY];
  draw();
};
draw();
</script>"#;

/// Write a page that renders the named solids and can be turned with the
/// mouse. The geometry is embedded as JSON.
pub fn write_html_3d(path: &Path, solids: &[(&str, &Solid, Color)]) -> Result<()> {
    let scene: Vec<SceneMesh<'_>> = solids
        .iter()
        .map(|(name, solid, color)| {
            let mesh = solid.to_mesh();
            SceneMesh {
                name,
                color: color.to_hex(),
                positions: mesh
                    .positions
                    .iter()
                    .flat_map(|p| [p.x as f32, p.y as f32, p.z as f32])
                    .collect(),
                indices: mesh.triangles.iter().flatten().copied().collect(),
            }
        })
        .collect();
    let json = serde_json::to_string(&scene)?.replace("</", "<\\/");
    let body = format!("<script type=\"application/json\" id=\"scene\">{json}</script>\n{VIEWER}");
    let title = solids.first().map(|s| s.0).unwrap_or("scene");
    write_atomic(path, page(title, &body).as_bytes())?;
    tracing::info!(path = %path.display(), solids = solids.len(), "wrote 3D HTML");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polyline::Polyline;

    #[test]
    fn test_trace_keeps_connection_kinds() {
        let line = Polyline::new([
            (0.0, 0.0, ConnectionKind::Straight),
            (10.0, 0.0, ConnectionKind::Spline),
            (10.0, 10.0, ConnectionKind::Straight),
        ])
        .unwrap();
        let profile = Profile::Compound(vec![
            Profile::Polyline(line),
            Profile::Circle {
                center: (50.0, 0.0),
                radius: 5.0,
            },
        ]);
        let trace = PlotTrace::from_profile("part", &profile, Color::default());
        assert_eq!(trace.outlines.len(), 2);
        assert_eq!(trace.outlines[0][1].1, ConnectionKind::Spline);
        assert_eq!(trace.outlines[1], vec![((50.0, 0.0), ConnectionKind::Circle)]);

        let path = std::env::temp_dir().join(format!("paramak-plot-{}.html", std::process::id()));
        write_html_2d(&path, &[trace]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("<title>part</title>"));
        assert_eq!(text.matches("<circle").count(), 4);
        assert!(write_html_2d(&path, &[]).is_err());
    }

    #[test]
    fn test_scene_embeds_geometry() {
        let cube = Solid::cuboid([0.0; 3], [1.0; 3]);
        let path = std::env::temp_dir().join(format!("paramak-scene-{}.html", std::process::id()));
        write_html_3d(&path, &[("cube", &cube, Color::default())]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"name\":\"cube\""));
        assert!(text.contains("#808080"));
    }
}
