//! 2D geometry helpers shared by the components.
//!
//! Points are `(x, y)` tuples in workplane coordinates; angles are radians
//! unless a name says otherwise.

/// A point in workplane coordinates.
pub type Point = (f64, f64);

/// Rotate `point` counter-clockwise about `origin` by `angle` radians.
pub fn rotate(origin: Point, point: Point, angle: f64) -> Point {
    let (ox, oy) = origin;
    let (px, py) = point;
    let (s, c) = angle.sin_cos();
    (
        ox + c * (px - ox) - s * (py - oy),
        oy + s * (px - ox) + c * (py - oy),
    )
}

/// The point at distance `length` from `a` in the direction of `b`.
pub fn extend(a: Point, b: Point, length: f64) -> Point {
    let d = distance_between_two_points(a, b);
    if d == 0.0 {
        return a;
    }
    (a.0 + length * (b.0 - a.0) / d, a.1 + length * (b.1 - a.1) / d)
}

/// Euclidean distance.
pub fn distance_between_two_points(a: Point, b: Point) -> f64 {
    (b.0 - a.0).hypot(b.1 - a.1)
}

/// Centre and radius of the circle through three points, or `None` when
/// they are collinear.
pub fn find_center_point_of_circle(a: Point, b: Point, c: Point) -> Option<(Point, f64)> {
    let temp = b.0 * b.0 + b.1 * b.1;
    let bc = (a.0 * a.0 + a.1 * a.1 - temp) / 2.0;
    let cd = (temp - c.0 * c.0 - c.1 * c.1) / 2.0;
    let det = (a.0 - b.0) * (b.1 - c.1) - (b.0 - c.0) * (a.1 - b.1);
    if det.abs() < 1e-6 {
        return None;
    }
    let cx = (bc * (b.1 - c.1) - cd * (a.1 - b.1)) / det;
    let cy = ((a.0 - b.0) * cd - (b.0 - c.0) * bc) / det;
    let radius = (cx - a.0).hypot(cy - a.1);
    Some(((cx, cy), radius))
}

/// Radius of a circle from its centre and a point on it. Infinite when the
/// two coincide.
pub fn find_radius_of_circle(center: Point, edge: Point) -> f64 {
    if center == edge {
        return f64::INFINITY;
    }
    distance_between_two_points(center, edge)
}

/// Angle subtended at the centre by two points on a circle of `radius`.
pub fn angle_between_two_points_on_circle(p1: Point, p2: Point, radius: f64) -> f64 {
    let sep = distance_between_two_points(p1, p2);
    let cos = (2.0 * radius * radius - sep * sep) / (2.0 * radius * radius);
    cos.clamp(-1.0, 1.0).acos()
}

/// Signed difference `b - a` between two angles in degrees, in (-180, 180].
pub fn diff_between_angles(a: f64, b: f64) -> f64 {
    let d = (b - a).rem_euclid(360.0);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// Slope and intercept `(m, c)` of the line `y = m x + c` through two
/// points. Vertical lines give an infinite slope.
pub fn coefficients_of_line_from_points(a: Point, b: Point) -> (f64, f64) {
    let dx = b.0 - a.0;
    if dx == 0.0 {
        return (f64::INFINITY, f64::NAN);
    }
    let m = (b.1 - a.1) / dx;
    (m, a.1 - m * a.0)
}

/// Intersection of the infinite lines through `(a1, a2)` and `(b1, b2)`.
pub fn intersect_lines(a1: Point, a2: Point, b1: Point, b2: Point) -> Option<Point> {
    let d1 = (a2.0 - a1.0, a2.1 - a1.1);
    let d2 = (b2.0 - b1.0, b2.1 - b1.1);
    let denom = d1.0 * d2.1 - d1.1 * d2.0;
    if denom.abs() < 1e-12 {
        return None;
    }
    let t = ((b1.0 - a1.0) * d2.1 - (b1.1 - a1.1) * d2.0) / denom;
    Some((a1.0 + t * d1.0, a1.1 + t * d1.1))
}

/// `n` evenly spaced values from `start` to `stop`, optionally including
/// `stop`.
pub fn linspace(start: f64, stop: f64, n: usize, endpoint: bool) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let div = if endpoint { n - 1 } else { n } as f64;
            let step = (stop - start) / div;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Offset a curve by `thickness` along its normals.
///
/// The normal at each point is the tangent (by central differences)
/// turned clockwise, which points outward for a curve running
/// counter-clockwise. `reverse` flips it.
pub fn add_thickness(points: &[Point], thickness: f64, reverse: bool) -> Vec<Point> {
    let n = points.len();
    if n < 2 {
        return points.to_vec();
    }
    let sign = if reverse { -1.0 } else { 1.0 };
    (0..n)
        .map(|i| {
            let prev = points[i.saturating_sub(1)];
            let next = points[(i + 1).min(n - 1)];
            let (tx, ty) = (next.0 - prev.0, next.1 - prev.1);
            let len = tx.hypot(ty);
            if len == 0.0 {
                return points[i];
            }
            let (nx, ny) = (ty / len, -tx / len);
            (
                points[i].0 + sign * thickness * nx,
                points[i].1 + sign * thickness * ny,
            )
        })
        .collect()
}

// =============================================================================
// Edge selectors
// =============================================================================

/// Index and length of the longest edge of a closed polygon.
pub fn longest_edge(points: &[Point]) -> Option<(usize, f64)> {
    edge_lengths(points).max_by(|a, b| a.1.total_cmp(&b.1))
}

/// Index and length of the shortest edge of a closed polygon.
pub fn shortest_edge(points: &[Point]) -> Option<(usize, f64)> {
    edge_lengths(points).min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Indices of the edges whose both end points lie at `radius` from the
/// origin, within `tolerance`.
pub fn edges_on_radius(points: &[Point], radius: f64, tolerance: f64) -> Vec<usize> {
    let n = points.len();
    let on = |p: Point| (p.0.hypot(p.1) - radius).abs() <= tolerance;
    (0..n)
        .filter(|&i| on(points[i]) && on(points[(i + 1) % n]))
        .collect()
}

fn edge_lengths(points: &[Point]) -> impl Iterator<Item = (usize, f64)> + '_ {
    let n = points.len();
    (0..if n > 1 { n } else { 0 })
        .map(move |i| (i, distance_between_two_points(points[i], points[(i + 1) % n])))
}
