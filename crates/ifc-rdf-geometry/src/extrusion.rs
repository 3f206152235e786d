// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extrusion operations - converting 2D profiles to 3D meshes

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::profile::{Profile2D, Triangulation};
use nalgebra::{Matrix4, Point2, Point3, Vector3};

/// Extrude a 2D profile along +Z by `depth`
///
/// Produces a bottom cap at z = 0, a top cap at z = depth and side walls for
/// the outer boundary and every hole. `transform` is applied last.
pub fn extrude_profile(
    profile: &Profile2D,
    depth: f64,
    transform: Option<Matrix4<f64>>,
) -> Result<Mesh> {
    if depth <= 0.0 || !depth.is_finite() {
        return Err(Error::geometry(format!(
            "extrusion depth must be positive, got {}",
            depth
        )));
    }

    let triangulation = profile.triangulate()?;

    let wall_vertices = (profile.outer.len() + profile.holes.iter().map(Vec::len).sum::<usize>()) * 4;
    let mut mesh = Mesh::with_capacity(
        triangulation.points.len() * 2 + wall_vertices,
        triangulation.indices.len() * 2 + wall_vertices / 4 * 6,
    );

    create_cap_mesh(&triangulation, 0.0, Vector3::new(0.0, 0.0, -1.0), &mut mesh);
    create_cap_mesh(&triangulation, depth, Vector3::new(0.0, 0.0, 1.0), &mut mesh);

    create_side_walls(&profile.outer, depth, &mut mesh);
    for hole in &profile.holes {
        create_side_walls(hole, depth, &mut mesh);
    }

    if let Some(matrix) = transform {
        apply_transform(&mut mesh, &matrix);
    }

    Ok(mesh)
}

/// Add one cap; the bottom cap (normal -Z) gets reversed winding
fn create_cap_mesh(triangulation: &Triangulation, z: f64, normal: Vector3<f64>, mesh: &mut Mesh) {
    let base = mesh.vertex_count() as u32;

    for point in &triangulation.points {
        mesh.add_vertex(Point3::new(point.x, point.y, z), normal);
    }

    for tri in triangulation.indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] as u32, tri[1] as u32, tri[2] as u32);
        if normal.z < 0.0 {
            mesh.add_triangle(base + i0, base + i2, base + i1);
        } else {
            mesh.add_triangle(base + i0, base + i1, base + i2);
        }
    }
}

/// Add a quad per boundary edge; degenerate edges are skipped
fn create_side_walls(boundary: &[Point2<f64>], depth: f64, mesh: &mut Mesh) {
    let n = boundary.len();
    if n < 2 {
        return;
    }

    for i in 0..n {
        let p0 = boundary[i];
        let p1 = boundary[(i + 1) % n];

        let edge = Vector3::new(p1.x - p0.x, p1.y - p0.y, 0.0);
        let normal = match edge.cross(&Vector3::z()).try_normalize(1e-10) {
            Some(normal) => normal,
            None => continue,
        };

        let base = mesh.vertex_count() as u32;
        mesh.add_vertex(Point3::new(p0.x, p0.y, 0.0), normal);
        mesh.add_vertex(Point3::new(p1.x, p1.y, 0.0), normal);
        mesh.add_vertex(Point3::new(p1.x, p1.y, depth), normal);
        mesh.add_vertex(Point3::new(p0.x, p0.y, depth), normal);

        mesh.add_triangle(base, base + 1, base + 2);
        mesh.add_triangle(base, base + 2, base + 3);
    }
}

/// Apply a transformation matrix to a mesh in place
#[inline]
pub fn apply_transform(mesh: &mut Mesh, transform: &Matrix4<f64>) {
    mesh.transform(transform);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_extrude_rectangle() {
        let profile = Profile2D::rectangle(2.0, 1.0);
        let mesh = extrude_profile(&profile, 3.0, None).unwrap();

        // 2 caps x 4 vertices + 4 walls x 4 vertices
        assert_eq!(mesh.vertex_count(), 24);
        // 2 caps x 2 triangles + 4 walls x 2 triangles
        assert_eq!(mesh.triangle_count(), 12);

        let (min, max) = mesh.bounds().unwrap();
        assert_relative_eq!(min.z, 0.0);
        assert_relative_eq!(max.z, 3.0);
        assert_relative_eq!(max.x - min.x, 2.0);
    }

    #[test]
    fn test_extrude_with_transform() {
        let profile = Profile2D::rectangle(1.0, 1.0);
        let shift = Matrix4::new_translation(&Vector3::new(0.0, 0.0, 10.0));
        let mesh = extrude_profile(&profile, 1.0, Some(shift)).unwrap();

        let (min, _) = mesh.bounds().unwrap();
        assert_relative_eq!(min.z, 10.0);
    }

    #[test]
    fn test_rejects_non_positive_depth() {
        let profile = Profile2D::rectangle(1.0, 1.0);
        assert!(extrude_profile(&profile, 0.0, None).is_err());
        assert!(extrude_profile(&profile, -1.0, None).is_err());
    }

    #[test]
    fn test_hole_adds_walls() {
        let mut profile = Profile2D::rectangle(4.0, 4.0);
        profile.add_hole(vec![
            Point2::new(-1.0, -1.0),
            Point2::new(-1.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, -1.0),
        ]);
        let solid = extrude_profile(&Profile2D::rectangle(4.0, 4.0), 1.0, None).unwrap();
        let hollow = extrude_profile(&profile, 1.0, None).unwrap();

        assert!(hollow.triangle_count() > solid.triangle_count());
    }
}
