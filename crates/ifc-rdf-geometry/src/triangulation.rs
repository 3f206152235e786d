// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar face triangulation
//!
//! Faces of breps and face sets are 3D loops. They are projected onto their
//! own plane and ear-clipped there with earcutr.

use crate::{Error, Point2, Point3, Result, Vector3};

const EPSILON: f64 = 1e-10;

/// Orthonormal 2D frame lying in the plane of a polygon
#[derive(Clone, Debug)]
pub struct PlaneFrame {
    pub origin: Point3<f64>,
    pub u: Vector3<f64>,
    pub v: Vector3<f64>,
}

impl PlaneFrame {
    /// Frame for the plane of `points`, anchored at the first point
    pub fn of_polygon(points: &[Point3<f64>]) -> Option<Self> {
        let origin = *points.first()?;
        let normal = newell_normal(points);

        // Seed with the world axis least aligned to the normal
        let seed = if normal.x.abs() <= normal.y.abs() && normal.x.abs() <= normal.z.abs() {
            Vector3::x()
        } else if normal.y.abs() <= normal.z.abs() {
            Vector3::y()
        } else {
            Vector3::z()
        };
        let u = normal.cross(&seed).normalize();
        let v = normal.cross(&u).normalize();
        Some(Self { origin, u, v })
    }

    pub fn project(&self, points: &[Point3<f64>]) -> Vec<Point2<f64>> {
        points
            .iter()
            .map(|p| {
                let d = p - self.origin;
                Point2::new(d.dot(&self.u), d.dot(&self.v))
            })
            .collect()
    }
}

/// Unit normal by Newell's method; +Z for degenerate loops
pub fn newell_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let mut normal = Vector3::<f64>::zeros();
    for (i, current) in points.iter().enumerate() {
        let next = &points[(i + 1) % points.len()];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }

    let len = normal.norm();
    if len > EPSILON {
        normal / len
    } else {
        Vector3::z()
    }
}

/// Ear-clip an outer loop with holes
///
/// Holes with fewer than three points are dropped. Returned indices address
/// the outer points followed by the kept holes, in order.
pub fn earcut_with_holes(outer: &[Point2<f64>], holes: &[Vec<Point2<f64>>]) -> Result<Vec<usize>> {
    if outer.len() < 3 {
        return Err(Error::triangulation("outer loop has fewer than 3 points"));
    }

    let mut flat: Vec<f64> = outer.iter().flat_map(|p| [p.x, p.y]).collect();
    let mut hole_starts = Vec::new();
    for hole in holes.iter().filter(|h| h.len() >= 3) {
        hole_starts.push(flat.len() / 2);
        flat.extend(hole.iter().flat_map(|p| [p.x, p.y]));
    }

    earcutr::earcut(&flat, &hole_starts, 2).map_err(|e| Error::triangulation(format!("{:?}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normal_of_vertical_face() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let normal = newell_normal(&points);
        assert_relative_eq!(normal.y.abs(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_frame_preserves_distances() {
        let points = [
            Point3::new(0.0, 0.0, 2.0),
            Point3::new(3.0, 0.0, 2.0),
            Point3::new(3.0, 4.0, 2.0),
        ];
        let frame = PlaneFrame::of_polygon(&points).unwrap();
        let flat = frame.project(&points);
        assert_relative_eq!((flat[2] - flat[0]).norm(), 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_hole_is_dropped() {
        let outer = [
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        let indices = earcut_with_holes(&outer, &[vec![Point2::new(1.0, 1.0)]]).unwrap();
        assert_eq!(indices.len(), 6);
        assert!(earcut_with_holes(&outer[..2], &[]).is_err());
    }
}
