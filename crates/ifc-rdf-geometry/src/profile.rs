// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar profiles swept by extrusions
//!
//! Profiles live in the XY plane of their own position. Circles are
//! approximated with between 8 and 32 segments depending on radius.

use crate::error::{Error, Result};
use crate::triangulation::earcut_with_holes;
use nalgebra::Point2;

/// Closed outer loop with optional holes
#[derive(Debug, Clone)]
pub struct Profile2D {
    /// Counter-clockwise
    pub outer: Vec<Point2<f64>>,
    /// Clockwise
    pub holes: Vec<Vec<Point2<f64>>>,
}

impl Profile2D {
    pub fn new(outer: Vec<Point2<f64>>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    pub fn add_hole(&mut self, hole: Vec<Point2<f64>>) {
        self.holes.push(hole);
    }

    /// Ear-clip the profile
    ///
    /// Fails when the outer loop has fewer than three points or collapses
    /// to zero area.
    pub fn triangulate(&self) -> Result<Triangulation> {
        if self.outer.len() < 3 {
            return Err(Error::profile("profile needs at least 3 vertices"));
        }

        let indices = earcut_with_holes(&self.outer, &self.holes)?;
        if indices.is_empty() {
            return Err(Error::triangulation("profile is degenerate"));
        }

        let points = self
            .outer
            .iter()
            .chain(self.holes.iter().filter(|h| h.len() >= 3).flatten())
            .copied()
            .collect();
        Ok(Triangulation { points, indices })
    }

    /// `IfcRectangleProfileDef`: X by Y, centred on the origin
    pub fn rectangle(x_dim: f64, y_dim: f64) -> Self {
        let (x, y) = (x_dim / 2.0, y_dim / 2.0);
        Self::new(vec![
            Point2::new(-x, -y),
            Point2::new(x, -y),
            Point2::new(x, y),
            Point2::new(-x, y),
        ])
    }

    /// `IfcCircleProfileDef`, centred on the origin
    pub fn circle(radius: f64, segments: Option<usize>) -> Self {
        let segments = segments.unwrap_or_else(|| calculate_circle_segments(radius));
        let step = std::f64::consts::TAU / segments as f64;
        Self::new(
            (0..segments)
                .map(|i| {
                    let (sin, cos) = (step * i as f64).sin_cos();
                    Point2::new(radius * cos, radius * sin)
                })
                .collect(),
        )
    }

    /// Create a ring: circle of `radius` with a concentric hole
    pub fn hollow_circle(radius: f64, wall_thickness: f64) -> Result<Self> {
        let inner_radius = radius - wall_thickness;
        if inner_radius <= 0.0 {
            return Err(Error::profile("hollow circle wall is thicker than its radius"));
        }

        let mut profile = Self::circle(radius, None);
        let mut hole = Self::circle(inner_radius, None).outer;
        hole.reverse();
        profile.add_hole(hole);
        Ok(profile)
    }
}

/// Ear-clipped profile
#[derive(Debug, Clone)]
pub struct Triangulation {
    /// Outer loop followed by the kept holes
    pub points: Vec<Point2<f64>>,
    pub indices: Vec<usize>,
}

/// Segment count for a circle of `radius` (profile units)
#[inline]
pub fn calculate_circle_segments(radius: f64) -> usize {
    ((radius.sqrt() * 8.0).ceil() as usize).clamp(8, 32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_segments_are_clamped() {
        assert_eq!(calculate_circle_segments(0.01), 8);
        assert_eq!(calculate_circle_segments(4.0), 16);
        assert_eq!(calculate_circle_segments(500.0), 32);
        assert_eq!(Profile2D::circle(4.0, None).outer.len(), 16);
    }

    #[test]
    fn test_hollow_circle() {
        let profile = Profile2D::hollow_circle(1.0, 0.1).unwrap();
        assert_eq!(profile.holes.len(), 1);
        assert!(Profile2D::hollow_circle(1.0, 1.5).is_err());
    }

    #[test]
    fn test_degenerate_profile_fails() {
        let profile = Profile2D::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
        ]);
        assert!(profile.triangulate().is_err());
    }

    #[test]
    fn test_triangulate_rectangle() {
        let profile = Profile2D::rectangle(10.0, 5.0);
        let tri = profile.triangulate().unwrap();
        assert_eq!(tri.points.len(), 4);
        assert_eq!(tri.indices.len(), 6);

        let ring = Profile2D::hollow_circle(1.0, 0.1).unwrap().triangulate().unwrap();
        assert_eq!(ring.points.len(), 16);
    }
}
