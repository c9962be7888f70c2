//! Oriented planes and polygon classification.

use crate::polygon::Polygon;
use paramak_kernel_math::{Point3, Vec3};

/// Distance below which a point is treated as lying on a plane.
pub const EPSILON: f64 = 1e-6;

/// Vertex lies on the plane.
pub const COPLANAR: u8 = 0;
/// Vertex lies in front of the plane (normal side).
pub const FRONT: u8 = 1;
/// Vertex lies behind the plane.
pub const BACK: u8 = 2;
/// Polygon has vertices on both sides.
pub const SPANNING: u8 = 3;

/// An oriented plane `normal · p = w`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal.
    pub normal: Vec3,
    /// Signed offset from the origin along `normal`.
    pub w: f64,
}

impl Plane {
    /// Plane through three points, wound counter-clockwise around the normal.
    ///
    /// Returns `None` for collinear points.
    pub fn from_points(a: &Point3, b: &Point3, c: &Point3) -> Option<Self> {
        let n = (b - a).cross(&(c - a));
        let len = n.norm();
        if len < 1e-12 {
            return None;
        }
        let normal = n / len;
        Some(Self {
            normal,
            w: normal.dot(&a.coords),
        })
    }

    /// Plane of a convex polygon, using Newell's method so that near-degenerate
    /// leading vertices do not spoil the normal.
    pub fn from_polygon(vertices: &[Point3]) -> Option<Self> {
        if vertices.len() < 3 {
            return None;
        }
        let mut n = Vec3::zeros();
        for (i, cur) in vertices.iter().enumerate() {
            let next = &vertices[(i + 1) % vertices.len()];
            n.x += (cur.y - next.y) * (cur.z + next.z);
            n.y += (cur.z - next.z) * (cur.x + next.x);
            n.z += (cur.x - next.x) * (cur.y + next.y);
        }
        let len = n.norm();
        if len < 1e-12 {
            return None;
        }
        let normal = n / len;
        Some(Self {
            normal,
            w: normal.dot(&vertices[0].coords),
        })
    }

    /// Reverse the orientation.
    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    /// Signed distance of a point from the plane.
    pub fn distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&p.coords) - self.w
    }

    /// Classify a single point.
    pub fn orient_point(&self, p: &Point3) -> u8 {
        let d = self.distance(p);
        if d < -EPSILON {
            BACK
        } else if d > EPSILON {
            FRONT
        } else {
            COPLANAR
        }
    }

    /// Classify a whole polygon (bitwise OR of its vertex classes).
    pub fn classify_polygon(&self, polygon: &Polygon) -> u8 {
        polygon
            .vertices
            .iter()
            .fold(COPLANAR, |acc, v| acc | self.orient_point(v))
    }

    /// Split `polygon` by this plane.
    ///
    /// Returns `(coplanar_front, coplanar_back, front, back)`. Coplanar
    /// polygons are sorted by whether they face the same way as the plane.
    pub fn split_polygon(
        &self,
        polygon: &Polygon,
    ) -> (Vec<Polygon>, Vec<Polygon>, Vec<Polygon>, Vec<Polygon>) {
        let mut coplanar_front = Vec::new();
        let mut coplanar_back = Vec::new();
        let mut front = Vec::new();
        let mut back = Vec::new();

        let types: Vec<u8> = polygon
            .vertices
            .iter()
            .map(|v| self.orient_point(v))
            .collect();
        let polygon_type = types.iter().fold(COPLANAR, |acc, &t| acc | t);

        match polygon_type {
            COPLANAR => {
                if self.normal.dot(&polygon.plane.normal) > 0.0 {
                    coplanar_front.push(polygon.clone());
                } else {
                    coplanar_back.push(polygon.clone());
                }
            }
            FRONT => front.push(polygon.clone()),
            BACK => back.push(polygon.clone()),
            _ => {
                let n = polygon.vertices.len();
                let mut split_front = Vec::with_capacity(n + 1);
                let mut split_back = Vec::with_capacity(n + 1);
                for i in 0..n {
                    let j = (i + 1) % n;
                    let (ti, tj) = (types[i], types[j]);
                    let (vi, vj) = (&polygon.vertices[i], &polygon.vertices[j]);
                    if ti != BACK {
                        split_front.push(*vi);
                    }
                    if ti != FRONT {
                        split_back.push(*vi);
                    }
                    if (ti | tj) == SPANNING {
                        let denom = self.normal.dot(&(vj - vi));
                        if denom.abs() > f64::EPSILON {
                            let t = (self.w - self.normal.dot(&vi.coords)) / denom;
                            let v = vi + (vj - vi) * t;
                            split_front.push(v);
                            split_back.push(v);
                        }
                    }
                }
                // keep the parent plane; recomputing it from split vertices drifts
                if split_front.len() >= 3 {
                    front.push(Polygon::with_plane(split_front, polygon.plane, polygon.face));
                }
                if split_back.len() >= 3 {
                    back.push(Polygon::with_plane(split_back, polygon.plane, polygon.face));
                }
            }
        }
        (coplanar_front, coplanar_back, front, back)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_from_points() {
        let p = Plane::from_points(
            &Point3::new(0.0, 0.0, 1.0),
            &Point3::new(1.0, 0.0, 1.0),
            &Point3::new(0.0, 1.0, 1.0),
        )
        .unwrap();
        assert!((p.normal - Vec3::z()).norm() < 1e-12);
        assert!((p.w - 1.0).abs() < 1e-12);
        assert_eq!(p.orient_point(&Point3::new(0.0, 0.0, 2.0)), FRONT);
        assert_eq!(p.orient_point(&Point3::new(0.0, 0.0, 0.0)), BACK);
    }

    #[test]
    fn test_collinear_points_have_no_plane() {
        let p = Plane::from_points(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(2.0, 0.0, 0.0),
        );
        assert!(p.is_none());
    }

    #[test]
    fn test_split_spanning_square() {
        let square = Polygon::new(
            vec![
                Point3::new(-1.0, -1.0, 0.0),
                Point3::new(1.0, -1.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(-1.0, 1.0, 0.0),
            ],
            7,
        )
        .unwrap();
        let splitter = Plane {
            normal: Vec3::x(),
            w: 0.0,
        };
        let (cf, cb, front, back) = splitter.split_polygon(&square);
        assert!(cf.is_empty() && cb.is_empty());
        assert_eq!(front.len(), 1);
        assert_eq!(back.len(), 1);
        assert_eq!(front[0].vertices.len(), 4);
        assert_eq!(front[0].face, 7);
        assert!((front[0].area() - 2.0).abs() < 1e-12);
        assert!((back[0].area() - 2.0).abs() < 1e-12);
    }
}
