//! Connection-typed polylines: the 2D outline every shape is built from.
//!
//! Each record carries the kind of edge that leaves it towards the next
//! record. The outline is closed: the last record connects back to the
//! first with its own connection kind, unless the polyline was closed
//! explicitly by repeating the first point, in which case that terminal
//! record's kind is ignored.

use std::fmt;
use std::str::FromStr;

use paramak_kernel::paramak_kernel_math::Point2;
use paramak_kernel::paramak_kernel_sketch::SketchSegment;
use serde::{Deserialize, Serialize};

use crate::error::{ParamakError, Result};
use crate::utils::{find_center_point_of_circle, Point};

/// How the edge leaving a point reaches the next point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    /// A straight line.
    Straight,
    /// Part of an interpolating spline through the run of spline points.
    Spline,
    /// Half of a three-point arc; circle edges come in pairs.
    Circle,
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionKind::Straight => "straight",
            ConnectionKind::Spline => "spline",
            ConnectionKind::Circle => "circle",
        })
    }
}

impl FromStr for ConnectionKind {
    type Err = ParamakError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "straight" => Ok(ConnectionKind::Straight),
            "spline" => Ok(ConnectionKind::Spline),
            "circle" => Ok(ConnectionKind::Circle),
            other => Err(ParamakError::InvalidPolyline(format!(
                "unknown connection type {other:?}"
            ))),
        }
    }
}

/// A point and the connection leaving it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolylinePoint {
    /// Local x.
    pub x: f64,
    /// Local y.
    pub y: f64,
    /// Edge kind towards the next point.
    pub connection: ConnectionKind,
}

impl PolylinePoint {
    /// A point with its outgoing connection.
    pub fn new(x: f64, y: f64, connection: ConnectionKind) -> Self {
        Self { x, y, connection }
    }

    /// The coordinates as a tuple.
    pub fn xy(&self) -> Point {
        (self.x, self.y)
    }
}

impl From<(f64, f64, ConnectionKind)> for PolylinePoint {
    fn from((x, y, connection): (f64, f64, ConnectionKind)) -> Self {
        Self { x, y, connection }
    }
}

/// A validated, closed sequence of connection-typed points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<PolylinePoint>,
    explicitly_closed: bool,
}

/// One edge run: consecutive edges of the same kind.
struct Run {
    kind: ConnectionKind,
    /// Indices into the open record list, first to last point of the run.
    indices: Vec<usize>,
}

impl Polyline {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Build from records whose last point differs from the first. The
    /// closing edge uses the last record's connection.
    pub fn new(points: impl IntoIterator<Item = impl Into<PolylinePoint>>) -> Result<Self> {
        let points: Vec<PolylinePoint> = points.into_iter().map(Into::into).collect();
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            if points.len() > 1 && first.xy() == last.xy() {
                return Err(ParamakError::InvalidPolyline(
                    "the last point repeats the first; use Polyline::closed".into(),
                ));
            }
        }
        let line = Self {
            points,
            explicitly_closed: false,
        };
        line.validate()?;
        Ok(line)
    }

    /// Build an explicitly closed polyline. The first point is appended as
    /// terminal record if it is not already last.
    pub fn closed(points: impl IntoIterator<Item = impl Into<PolylinePoint>>) -> Result<Self> {
        let mut points: Vec<PolylinePoint> = points.into_iter().map(Into::into).collect();
        if let (Some(first), Some(last)) = (points.first().copied(), points.last()) {
            if points.len() == 1 || first.xy() != last.xy() {
                points.push(first);
            }
        }
        let line = Self {
            points,
            explicitly_closed: true,
        };
        line.validate()?;
        Ok(line)
    }

    /// All points joined by straight edges.
    pub fn straight(points: &[Point]) -> Result<Self> {
        Self::uniform(points, ConnectionKind::Straight)
    }

    /// All points on one closed spline.
    pub fn spline(points: &[Point]) -> Result<Self> {
        Self::uniform(points, ConnectionKind::Spline)
    }

    fn uniform(points: &[Point], kind: ConnectionKind) -> Result<Self> {
        Self::new(points.iter().map(|&(x, y)| PolylinePoint::new(x, y, kind)))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The records, terminal included when explicitly closed.
    pub fn records(&self) -> &[PolylinePoint] {
        &self.points
    }

    /// Point coordinates, terminal included when explicitly closed.
    pub fn points(&self) -> Vec<Point> {
        self.points.iter().map(PolylinePoint::xy).collect()
    }

    /// Whether the first point was repeated at the end.
    pub fn is_explicitly_closed(&self) -> bool {
        self.explicitly_closed
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a validated polyline.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Connection kinds of the edges that form the closed outline.
    pub fn cycle_connections(&self) -> impl Iterator<Item = ConnectionKind> + '_ {
        self.cycle().iter().map(|p| p.connection)
    }

    /// Records forming the cycle: the terminal duplicate is dropped.
    fn cycle(&self) -> &[PolylinePoint] {
        if self.explicitly_closed {
            &self.points[..self.points.len() - 1]
        } else {
            &self.points
        }
    }

    // =========================================================================
    // Validation
    // =========================================================================

    fn validate(&self) -> Result<()> {
        if self.points.len() < 2 {
            return Err(ParamakError::InvalidPolyline(format!(
                "at least two points are needed, got {}",
                self.points.len()
            )));
        }
        if let Some(i) = self
            .points
            .iter()
            .position(|p| !p.x.is_finite() || !p.y.is_finite())
        {
            return Err(ParamakError::InvalidPolyline(format!(
                "point {i} has a non-finite coordinate"
            )));
        }
        let cycle = self.cycle();
        if cycle.len() < 2 {
            return Err(ParamakError::InvalidPolyline(
                "a closed polyline needs two distinct points".into(),
            ));
        }
        for run in self.runs() {
            if run.kind != ConnectionKind::Circle {
                continue;
            }
            let edges = run.indices.len() - 1;
            if edges != 2 {
                return Err(ParamakError::InvalidPolyline(format!(
                    "circle connections must come in pairs, found a run of {edges} starting at point {}",
                    run.indices[0]
                )));
            }
            let [a, b, c] = [0, 1, 2].map(|k| cycle[run.indices[k]].xy());
            if find_center_point_of_circle(a, b, c).is_none() {
                return Err(ParamakError::InvalidPolyline(format!(
                    "circle through points {}, {} and {} is degenerate: the points are colinear",
                    run.indices[0], run.indices[1], run.indices[2]
                )));
            }
        }
        Ok(())
    }

    /// Split the closed edge cycle into runs of equal connection kind.
    fn runs(&self) -> Vec<Run> {
        let cycle = self.cycle();
        let n = cycle.len();
        // start on an edge whose kind differs from the previous one, so no
        // run wraps past the end
        let start = (0..n)
            .find(|&i| cycle[i].connection != cycle[(i + n - 1) % n].connection)
            .unwrap_or(0);
        let mut runs: Vec<Run> = Vec::new();
        for k in 0..n {
            let i = (start + k) % n;
            let j = (i + 1) % n;
            let kind = cycle[i].connection;
            match runs.last_mut() {
                Some(run) if run.kind == kind => run.indices.push(j),
                _ => runs.push(Run {
                    kind,
                    indices: vec![i, j],
                }),
            }
        }
        runs
    }

    // =========================================================================
    // Conversion
    // =========================================================================

    /// Convert to kernel sketch segments, head to tail, closed.
    pub fn to_segments(&self) -> Vec<SketchSegment> {
        let cycle = self.cycle();
        let p = |i: usize| Point2::new(cycle[i].x, cycle[i].y);
        let mut segments = Vec::new();
        for run in self.runs() {
            match run.kind {
                ConnectionKind::Straight => {
                    segments.extend(run.indices.windows(2).map(|w| SketchSegment::Line {
                        start: p(w[0]),
                        end: p(w[1]),
                    }));
                }
                ConnectionKind::Spline => segments.push(SketchSegment::Spline {
                    points: run.indices.iter().map(|&i| p(i)).collect(),
                }),
                ConnectionKind::Circle => segments.push(SketchSegment::Arc {
                    start: p(run.indices[0]),
                    mid: p(run.indices[1]),
                    end: p(run.indices[2]),
                }),
            }
        }
        segments
    }

    /// Largest x and y over all points.
    pub fn max_xy(&self) -> Point {
        self.points.iter().fold((f64::MIN, f64::MIN), |(mx, my), p| {
            (mx.max(p.x), my.max(p.y))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionKind::{Circle, Spline, Straight};

    fn square() -> Vec<Point> {
        vec![(0.0, 0.0), (0.0, 20.0), (20.0, 20.0), (20.0, 0.0)]
    }

    #[test]
    fn test_straight_square_gives_four_lines() {
        let line = Polyline::straight(&square()).unwrap();
        let segs = line.to_segments();
        assert_eq!(segs.len(), 4);
        assert!(segs.iter().all(|s| matches!(s, SketchSegment::Line { .. })));
        assert_eq!(segs[3].end(), segs[0].start());
    }

    #[test]
    fn test_repeated_first_point_needs_explicit_close() {
        let mut pts = square();
        pts.push((0.0, 0.0));
        assert!(matches!(
            Polyline::straight(&pts),
            Err(ParamakError::InvalidPolyline(_))
        ));
        let closed = Polyline::closed(pts.iter().map(|&(x, y)| (x, y, Straight))).unwrap();
        assert_eq!(closed.len(), 5);
        assert_eq!(closed.points()[0], closed.points()[4]);
        assert_eq!(closed.to_segments().len(), 4);
    }

    #[test]
    fn test_closed_appends_terminal() {
        let closed = Polyline::closed(square().iter().map(|&(x, y)| (x, y, Spline))).unwrap();
        assert_eq!(closed.len(), 5);
        let segs = closed.to_segments();
        assert_eq!(segs.len(), 1);
        match &segs[0] {
            SketchSegment::Spline { points } => {
                assert_eq!(points.len(), 5);
                assert_eq!(points[0], points[4]);
            }
            other => panic!("expected spline, got {other:?}"),
        }
    }

    #[test]
    fn test_mixed_runs() {
        // arc 0 -> 1 -> 2, then straight 2 -> 3 -> 0
        let line = Polyline::new([
            (0.0, 10.0, Circle),
            (10.0, 0.0, Circle),
            (0.0, -10.0, Straight),
            (-5.0, 0.0, Straight),
        ])
        .unwrap();
        let segs = line.to_segments();
        assert_eq!(segs.len(), 3);
        assert!(matches!(segs[0], SketchSegment::Arc { .. }));
        assert_eq!(segs[0].end(), Point2::new(0.0, -10.0));
        assert_eq!(segs[2].end(), Point2::new(0.0, 10.0));
    }

    #[test]
    fn test_spline_run_ends_on_next_point() {
        let line = Polyline::new([
            (0.0, 0.0, Straight),
            (10.0, 0.0, Spline),
            (15.0, 5.0, Spline),
            (10.0, 10.0, Straight),
        ])
        .unwrap();
        let segs = line.to_segments();
        let spline = segs
            .iter()
            .find_map(|s| match s {
                SketchSegment::Spline { points } => Some(points.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(spline.len(), 3);
        assert_eq!(spline[2], Point2::new(10.0, 10.0));
    }

    #[test]
    fn test_wrapping_circle_run() {
        // the pair starts on the last record and wraps to the first
        let line = Polyline::new([
            (10.0, 0.0, Straight),
            (0.0, -10.0, Circle),
            (-10.0, 0.0, Circle),
        ]);
        assert!(line.is_ok());
        let segs = line.unwrap().to_segments();
        assert!(segs.iter().any(|s| matches!(s, SketchSegment::Arc { .. })));
    }

    #[test]
    fn test_invalid_circle_runs() {
        let single = Polyline::new([(0.0, 0.0, Circle), (1.0, 1.0, Straight), (2.0, 0.0, Straight)]);
        assert!(matches!(single, Err(ParamakError::InvalidPolyline(_))));

        let colinear = Polyline::new([
            (0.0, 0.0, Circle),
            (1.0, 0.0, Circle),
            (2.0, 0.0, Straight),
            (1.0, 5.0, Straight),
        ]);
        assert!(matches!(colinear, Err(ParamakError::InvalidPolyline(_))));
    }

    #[test]
    fn test_nan_and_short_rejected() {
        assert!(Polyline::straight(&[(0.0, f64::NAN), (1.0, 1.0), (2.0, 0.0)]).is_err());
        assert!(Polyline::straight(&[(0.0, 0.0)]).is_err());
    }

    #[test]
    fn test_connection_kind_parsing() {
        assert_eq!("spline".parse::<ConnectionKind>().unwrap(), Spline);
        assert!(matches!(
            "bezier".parse::<ConnectionKind>(),
            Err(ParamakError::InvalidPolyline(_))
        ));
    }

    #[test]
    fn test_max_xy() {
        let line = Polyline::straight(&square()).unwrap();
        assert_eq!(line.max_xy(), (20.0, 20.0));
    }
}
