//! Curve sampling: splines, three-point arcs and circles in the sketch plane.

use paramak_kernel_math::{Point2, Vec2};
use std::f64::consts::TAU;

/// Sample a centripetal Catmull-Rom spline through `points`.
///
/// The curve interpolates every input point. End tangents come from
/// reflected phantom points. Each span contributes `subdivisions` segments;
/// the result starts at the first point and ends at the last one.
pub fn catmull_rom(points: &[Point2], subdivisions: u32) -> Vec<Point2> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let n = points.len();
    let sub = subdivisions.max(1) as usize;
    let at = |i: isize| -> Point2 {
        if i < 0 {
            points[0] + (points[0] - points[1])
        } else if i as usize >= n {
            points[n - 1] + (points[n - 1] - points[n - 2])
        } else {
            points[i as usize]
        }
    };

    let mut out = Vec::with_capacity((n - 1) * sub + 1);
    out.push(points[0]);
    for i in 0..(n - 1) as isize {
        let (p0, p1, p2, p3) = (at(i - 1), at(i), at(i + 1), at(i + 2));
        for k in 1..=sub {
            if k == sub {
                out.push(p2);
            } else {
                out.push(centripetal_point(p0, p1, p2, p3, k as f64 / sub as f64));
            }
        }
    }
    out
}

/// Barry-Goldman evaluation of one centripetal Catmull-Rom span at `u` in [0, 1].
fn centripetal_point(p0: Point2, p1: Point2, p2: Point2, p3: Point2, u: f64) -> Point2 {
    let knot = |a: Point2, b: Point2| (b - a).norm().sqrt().max(1e-12);
    let t0 = 0.0;
    let t1 = t0 + knot(p0, p1);
    let t2 = t1 + knot(p1, p2);
    let t3 = t2 + knot(p2, p3);
    let t = t1 + (t2 - t1) * u;

    let lerp = |a: Point2, b: Point2, ta: f64, tb: f64| -> Vec2 {
        (a.coords * (tb - t) + b.coords * (t - ta)) / (tb - ta)
    };
    let a1 = Point2::from(lerp(p0, p1, t0, t1));
    let a2 = Point2::from(lerp(p1, p2, t1, t2));
    let a3 = Point2::from(lerp(p2, p3, t2, t3));
    let b1 = Point2::from(lerp(a1, a2, t0, t2));
    let b2 = Point2::from(lerp(a2, a3, t1, t3));
    Point2::from(lerp(b1, b2, t1, t2))
}

/// Centre and radius of the circle through three points, `None` if collinear.
pub fn circle_through(a: &Point2, b: &Point2, c: &Point2) -> Option<(Point2, f64)> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    let scale = (b - a).norm().max((c - a).norm()).max(1.0);
    if d.abs() < 1e-12 * scale * scale {
        return None;
    }
    let (a2, b2, c2) = (a.coords.norm_squared(), b.coords.norm_squared(), c.coords.norm_squared());
    let ux = (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d;
    let uy = (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d;
    let center = Point2::new(ux, uy);
    Some((center, (a - center).norm()))
}

/// Signed sweep (radians) of the arc from `start` through `mid` to `end`
/// around `center`. Positive is counter-clockwise.
pub fn arc_sweep(start: &Point2, mid: &Point2, end: &Point2, center: &Point2) -> f64 {
    let angle = |p: &Point2| (p.y - center.y).atan2(p.x - center.x);
    let a0 = angle(start);
    let ccw_to = |p: &Point2| (angle(p) - a0).rem_euclid(TAU);
    let to_mid = ccw_to(mid);
    let to_end = ccw_to(end);
    if to_mid <= to_end {
        to_end
    } else {
        to_end - TAU
    }
}

/// Sample the arc from `start` through `mid` to `end`, endpoints included.
///
/// Returns `None` if the three points are collinear.
pub fn three_point_arc(
    start: &Point2,
    mid: &Point2,
    end: &Point2,
    segments_per_turn: u32,
) -> Option<Vec<Point2>> {
    let (center, radius) = circle_through(start, mid, end)?;
    let sweep = arc_sweep(start, mid, end, &center);
    let n = ((sweep.abs() / TAU * segments_per_turn as f64).ceil() as usize).max(2);
    let a0 = (start.y - center.y).atan2(start.x - center.x);
    let mut out = Vec::with_capacity(n + 1);
    out.push(*start);
    for k in 1..n {
        let a = a0 + sweep * k as f64 / n as f64;
        out.push(Point2::new(center.x + radius * a.cos(), center.y + radius * a.sin()));
    }
    out.push(*end);
    Some(out)
}

/// Sample a full circle counter-clockwise, starting at angle zero. The first
/// point is not repeated at the end.
pub fn circle_points(center: &Point2, radius: f64, segments: u32) -> Vec<Point2> {
    let n = segments.max(3);
    (0..n)
        .map(|k| {
            let a = TAU * k as f64 / n as f64;
            Point2::new(center.x + radius * a.cos(), center.y + radius * a.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_catmull_rom_interpolates_inputs() {
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 2.0),
            Point2::new(3.0, 3.0),
            Point2::new(6.0, 1.0),
        ];
        let samples = catmull_rom(&pts, 4);
        assert_eq!(samples.len(), 13);
        for (k, p) in pts.iter().enumerate() {
            assert!((samples[k * 4] - p).norm() < 1e-12, "point {k} not interpolated");
        }
    }

    #[test]
    fn test_catmull_rom_on_circle_stays_close() {
        let pts: Vec<Point2> = (0..=16)
            .map(|k| {
                let a = PI * k as f64 / 16.0;
                Point2::new(10.0 * a.cos(), 10.0 * a.sin())
            })
            .collect();
        for p in catmull_rom(&pts, 8).iter().skip(8).take(112) {
            let r = p.coords.norm();
            assert!((r - 10.0).abs() < 0.01, "radius drifted to {r}");
        }
    }

    #[test]
    fn test_circle_through_three_points() {
        let (c, r) = circle_through(
            &Point2::new(1.0, 0.0),
            &Point2::new(0.0, 1.0),
            &Point2::new(-1.0, 0.0),
        )
        .unwrap();
        assert!(c.coords.norm() < 1e-12);
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_collinear_points_have_no_circle() {
        assert!(circle_through(
            &Point2::new(0.0, 0.0),
            &Point2::new(1.0, 1.0),
            &Point2::new(2.0, 2.0)
        )
        .is_none());
    }

    #[test]
    fn test_arc_direction_follows_mid_point() {
        let start = Point2::new(1.0, 0.0);
        let end = Point2::new(-1.0, 0.0);
        let upper = arc_sweep(&start, &Point2::new(0.0, 1.0), &end, &Point2::origin());
        let lower = arc_sweep(&start, &Point2::new(0.0, -1.0), &end, &Point2::origin());
        assert!((upper - PI).abs() < 1e-12);
        assert!((lower + PI).abs() < 1e-12);
    }

    #[test]
    fn test_three_point_arc_endpoints_exact() {
        let pts = three_point_arc(
            &Point2::new(5.0, 0.0),
            &Point2::new(0.0, 5.0),
            &Point2::new(-5.0, 0.0),
            90,
        )
        .unwrap();
        assert_eq!(pts.len(), 46);
        assert_eq!(pts[0], Point2::new(5.0, 0.0));
        assert_eq!(*pts.last().unwrap(), Point2::new(-5.0, 0.0));
        assert!(pts.iter().all(|p| p.y >= -1e-12));
    }
}
