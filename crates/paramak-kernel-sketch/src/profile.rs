//! Closed outlines drawn on a sketch plane.

use paramak_kernel_math::{Dir3, Point2, Point3, Vec2, Vec3, LINEAR_TOLERANCE};

use crate::curve::{catmull_rom, circle_points, circle_through, three_point_arc};
use crate::{SketchError, Tessellation};

/// One edge of an outline, in plane coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum SketchSegment {
    /// Straight edge.
    Line {
        /// First point.
        start: Point2,
        /// Last point.
        end: Point2,
    },
    /// Catmull-Rom curve passing through every point.
    Spline {
        /// Interpolated points, in order.
        points: Vec<Point2>,
    },
    /// Circular arc defined by three points on it.
    Arc {
        /// First point.
        start: Point2,
        /// Any other point on the arc.
        mid: Point2,
        /// Last point.
        end: Point2,
    },
    /// Whole circle; must be the only segment.
    Circle {
        /// Circle centre.
        center: Point2,
        /// Circle radius.
        radius: f64,
    },
}

impl SketchSegment {
    /// Where the edge begins. A circle begins at its rightmost point.
    pub fn start(&self) -> Point2 {
        match self {
            SketchSegment::Line { start, .. } | SketchSegment::Arc { start, .. } => *start,
            SketchSegment::Spline { points } => points.first().copied().unwrap_or_else(Point2::origin),
            SketchSegment::Circle { center, radius } => *center + Vec2::x() * *radius,
        }
    }

    /// Where the edge finishes.
    pub fn end(&self) -> Point2 {
        match self {
            SketchSegment::Line { end, .. } | SketchSegment::Arc { end, .. } => *end,
            SketchSegment::Spline { points } => points.last().copied().unwrap_or_else(Point2::origin),
            SketchSegment::Circle { .. } => self.start(),
        }
    }

    /// Whether the edge collapses to a point.
    pub fn is_degenerate(&self) -> bool {
        let short = |a: &Point2, b: &Point2| (b - a).norm() < LINEAR_TOLERANCE;
        match self {
            SketchSegment::Line { start, end } | SketchSegment::Arc { start, end, .. } => short(start, end),
            SketchSegment::Spline { points } => points.windows(2).all(|w| short(&w[0], &w[1])),
            SketchSegment::Circle { radius, .. } => *radius < LINEAR_TOLERANCE,
        }
    }

    /// Sample the segment, start point included and end point excluded.
    fn sample(&self, tess: &Tessellation, index: usize) -> Result<Vec<Point2>, SketchError> {
        let mut pts = match self {
            SketchSegment::Line { start, end } => vec![*start, *end],
            SketchSegment::Spline { points } => catmull_rom(points, tess.spline_subdivisions),
            SketchSegment::Arc { start, mid, end } => {
                three_point_arc(start, mid, end, tess.segments_per_turn)
                    .ok_or(SketchError::CollinearArc(index))?
            }
            SketchSegment::Circle { center, radius } => {
                return Ok(circle_points(center, *radius, tess.segments_per_turn));
            }
        };
        pts.pop();
        Ok(pts)
    }
}

/// A sampled closed profile: a polygon whose edges remember the segment
/// they were sampled from.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileLoop {
    /// Polygon vertices, without repeating the first one at the end.
    pub points: Vec<Point2>,
    /// `tags[i]` is the segment index of the edge `points[i] → points[i + 1]`.
    pub tags: Vec<u32>,
}

impl ProfileLoop {
    /// Signed area (positive for counter-clockwise loops).
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        (0..n)
            .map(|i| {
                let (a, b) = (self.points[i], self.points[(i + 1) % n]);
                a.x * b.y - b.x * a.y
            })
            .sum::<f64>()
            / 2.0
    }

    /// Reverse traversal direction, keeping each edge's tag.
    pub fn reverse(&mut self) {
        let n = self.points.len();
        let tags = self.tags.clone();
        self.points.reverse();
        self.tags = (0..n).map(|j| tags[(2 * n - 2 - j) % n]).collect();
    }

    /// Make the loop counter-clockwise.
    pub fn make_ccw(&mut self) {
        if self.signed_area() < 0.0 {
            self.reverse();
        }
    }
}

/// A closed outline placed in space by a plane origin and two in-plane axes.
#[derive(Debug, Clone)]
pub struct SketchProfile {
    /// Where plane coordinate `(0, 0)` sits.
    pub origin: Point3,
    /// Plane u axis.
    pub x_dir: Dir3,
    /// Plane v axis.
    pub y_dir: Dir3,
    /// `x_dir × y_dir`.
    pub normal: Dir3,
    /// Edges in traversal order, each starting where the previous ends.
    pub segments: Vec<SketchSegment>,
}

impl SketchProfile {
    /// Validate and place an outline.
    ///
    /// Fails on an empty outline, a zero-length edge, an arc whose three
    /// points are collinear, or a gap between consecutive edges.
    pub fn new(origin: Point3, x_dir: Vec3, y_dir: Vec3, segments: Vec<SketchSegment>) -> Result<Self, SketchError> {
        if segments.is_empty() {
            return Err(SketchError::EmptyProfile);
        }
        for (i, seg) in segments.iter().enumerate() {
            if seg.is_degenerate() {
                return Err(SketchError::DegenerateSegment(i));
            }
            if let SketchSegment::Arc { start, mid, end } = seg {
                circle_through(start, mid, end).ok_or(SketchError::CollinearArc(i))?;
            }
        }
        let next = segments.iter().cycle().skip(1);
        if let Some(gap) = segments
            .iter()
            .zip(next)
            .map(|(seg, next)| (seg.end() - next.start()).norm())
            .find(|gap| *gap > LINEAR_TOLERANCE)
        {
            return Err(SketchError::NotClosed(gap));
        }
        Ok(Self::from_parts(origin, x_dir, y_dir, segments))
    }

    /// A `width` by `height` rectangle with its lower-left corner at the plane origin.
    pub fn rectangle(origin: Point3, x_dir: Vec3, y_dir: Vec3, width: f64, height: f64) -> Self {
        let corners = [(0.0, 0.0), (width, 0.0), (width, height), (0.0, height)].map(|(u, v)| Point2::new(u, v));
        let segments = corners
            .iter()
            .zip(corners.iter().cycle().skip(1))
            .map(|(start, end)| SketchSegment::Line { start: *start, end: *end })
            .collect();
        Self::from_parts(origin, x_dir, y_dir, segments)
    }

    /// A single circle.
    pub fn circle(origin: Point3, x_dir: Vec3, y_dir: Vec3, center: Point2, radius: f64) -> Self {
        Self::from_parts(origin, x_dir, y_dir, vec![SketchSegment::Circle { center, radius }])
    }

    fn from_parts(origin: Point3, x_dir: Vec3, y_dir: Vec3, segments: Vec<SketchSegment>) -> Self {
        let x_dir = Dir3::new_normalize(x_dir);
        let y_dir = Dir3::new_normalize(y_dir);
        Self {
            origin,
            normal: Dir3::new_normalize(x_dir.cross(y_dir.as_ref())),
            x_dir,
            y_dir,
            segments,
        }
    }

    /// Map a local 2D point to 3D.
    pub fn to_3d(&self, p: &Point2) -> Point3 {
        self.origin + p.x * self.x_dir.as_ref() + p.y * self.y_dir.as_ref()
    }

    /// Sample the profile into a counter-clockwise polygon.
    ///
    /// Consecutive duplicate samples are dropped.
    pub fn sample(&self, tess: &Tessellation) -> Result<ProfileLoop, SketchError> {
        let mut points: Vec<Point2> = Vec::new();
        let mut tags: Vec<u32> = Vec::new();
        for (i, seg) in self.segments.iter().enumerate() {
            for p in seg.sample(tess, i)? {
                if points.last().is_some_and(|last| (p - last).norm() < 1e-9) {
                    continue;
                }
                points.push(p);
                tags.push(i as u32);
            }
        }
        while points.len() > 1 && (points[0] - points[points.len() - 1]).norm() < 1e-9 {
            points.pop();
            tags.pop();
        }
        if points.len() < 3 {
            return Err(SketchError::EmptyProfile);
        }
        let mut lp = ProfileLoop { points, tags };
        lp.make_ccw();
        Ok(lp)
    }

    /// Area enclosed by the sampled profile.
    pub fn area(&self, tess: &Tessellation) -> Result<f64, SketchError> {
        Ok(self.sample(tess)?.signed_area().abs())
    }
}
