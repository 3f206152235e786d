// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh data structures

use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

/// Triangle mesh
///
/// `normals` is either empty or parallel to `positions`. Face-set processors
/// leave it empty; merging a mesh without normals drops them from the result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f32>,
    /// Vertex normals (nx, ny, nz)
    pub normals: Vec<f32>,
    /// Triangle indices (i0, i1, i2)
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with capacity
    pub fn with_capacity(vertex_count: usize, index_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count * 3),
            normals: Vec::with_capacity(vertex_count * 3),
            indices: Vec::with_capacity(index_count),
        }
    }

    /// Build a mesh from raw buffers without normals
    pub fn from_buffers(positions: Vec<f32>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            normals: Vec::new(),
            indices,
        }
    }

    /// Add a vertex with normal
    #[inline]
    pub fn add_vertex(&mut self, position: Point3<f64>, normal: Vector3<f64>) {
        self.positions.push(position.x as f32);
        self.positions.push(position.y as f32);
        self.positions.push(position.z as f32);

        self.normals.push(normal.x as f32);
        self.normals.push(normal.y as f32);
        self.normals.push(normal.z as f32);
    }

    /// Add a triangle
    #[inline]
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.push(i0);
        self.indices.push(i1);
        self.indices.push(i2);
    }

    /// Append another mesh, offsetting its indices
    pub fn merge(&mut self, other: &Mesh) {
        if other.is_empty() {
            return;
        }

        let keep_normals = (self.is_empty() || self.has_normals()) && other.has_normals();
        let vertex_offset = self.vertex_count() as u32;

        self.positions.extend_from_slice(&other.positions);
        if keep_normals {
            self.normals.extend_from_slice(&other.normals);
        } else {
            self.normals.clear();
        }
        self.indices
            .extend(other.indices.iter().map(|&i| i + vertex_offset));
    }

    /// Whether normals are present for every vertex
    #[inline]
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty() && self.normals.len() == self.positions.len()
    }

    /// Transform positions (and normals, when present) by a 4x4 matrix
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        for chunk in self.positions.chunks_exact_mut(3) {
            let p = Point3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64);
            let t = matrix.transform_point(&p);
            chunk[0] = t.x as f32;
            chunk[1] = t.y as f32;
            chunk[2] = t.z as f32;
        }

        if self.normals.is_empty() {
            return;
        }

        // Normals transform by the inverse-transpose of the linear part
        let linear: Matrix3<f64> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let normal_matrix = linear
            .try_inverse()
            .map(|m| m.transpose())
            .unwrap_or(linear);

        for chunk in self.normals.chunks_exact_mut(3) {
            let n = Vector3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64);
            let t = (normal_matrix * n).try_normalize(1e-12).unwrap_or(n);
            chunk[0] = t.x as f32;
            chunk[1] = t.y as f32;
            chunk[2] = t.z as f32;
        }
    }

    /// Multiply every position by a uniform factor
    pub fn scale(&mut self, factor: f64) {
        if factor == 1.0 {
            return;
        }
        let factor = factor as f32;
        for value in self.positions.iter_mut() {
            *value *= factor;
        }
    }

    /// Vertex positions as `[x, y, z]` triples
    pub fn vertices(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.positions
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
    }

    /// Triangles as index triples
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]])
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Get triangle count
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if mesh has no triangles
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }

    /// Axis-aligned bounds `(min, max)`
    pub fn bounds(&self) -> Option<(Point3<f32>, Point3<f32>)> {
        let mut vertices = self.vertices();
        let first = vertices.next()?;
        let mut min = Point3::new(first[0], first[1], first[2]);
        let mut max = min;

        for [x, y, z] in vertices {
            min.x = min.x.min(x);
            min.y = min.y.min(y);
            min.z = min.z.min(z);
            max.x = max.x.max(x);
            max.y = max.y.max(y);
            max.z = max.z.max(z);
        }

        Some((min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn triangle() -> Mesh {
        Mesh::from_buffers(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn test_merge_offsets_indices() {
        let mut mesh = triangle();
        mesh.merge(&triangle());

        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.indices[3..], [3, 4, 5]);
    }

    #[test]
    fn test_merge_drops_partial_normals() {
        let mut mesh = Mesh::new();
        mesh.add_vertex(Point3::origin(), Vector3::z());
        mesh.add_vertex(Point3::new(1.0, 0.0, 0.0), Vector3::z());
        mesh.add_vertex(Point3::new(0.0, 1.0, 0.0), Vector3::z());
        mesh.add_triangle(0, 1, 2);
        assert!(mesh.has_normals());

        mesh.merge(&triangle());
        assert!(mesh.normals.is_empty());
    }

    #[test]
    fn test_transform_and_scale() {
        let mut mesh = triangle();
        mesh.transform(&Matrix4::new_translation(&Vector3::new(10.0, 0.0, 5.0)));
        mesh.scale(0.5);

        let (min, max) = mesh.bounds().unwrap();
        assert_relative_eq!(min.x, 5.0);
        assert_relative_eq!(max.x, 5.5);
        assert_relative_eq!(min.z, 2.5);
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = Mesh::new();
        assert!(mesh.is_empty());
        assert!(mesh.bounds().is_none());
    }
}
