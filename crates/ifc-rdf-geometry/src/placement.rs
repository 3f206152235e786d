// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Placement and coordinate-system resolution
//!
//! Turns IFC placement entities into homogeneous 4x4 matrices. All lookups go
//! through [`EntityResolver`]; a missing or malformed entity resolves to
//! `None` and the caller decides whether that is an identity or a failure.

use ifc_rdf_model::{AttributeValue, EntityId, EntityResolver, IfcType};
use log::debug;
use nalgebra::{Matrix3, Matrix4, Point2, Point3, Vector3};
use rustc_hash::FxHashSet;

/// Read up to three coordinates from a list attribute, padding with `default_z`
fn coordinates(values: &[AttributeValue], default_z: f64) -> (f64, f64, f64) {
    let x = values.first().and_then(|v| v.as_float()).unwrap_or(0.0);
    let y = values.get(1).and_then(|v| v.as_float()).unwrap_or(0.0);
    let z = values.get(2).and_then(|v| v.as_float()).unwrap_or(default_z);
    (x, y, z)
}

/// Resolve an IfcCartesianPoint (2D points get z = 0)
pub fn cartesian_point(id: EntityId, resolver: &dyn EntityResolver) -> Option<Point3<f64>> {
    let point = resolver.get(id)?;
    if point.ifc_type != IfcType::IfcCartesianPoint {
        return None;
    }
    let (x, y, z) = coordinates(point.get_list(0)?, 0.0);
    Some(Point3::new(x, y, z))
}

/// Resolve an IfcCartesianPoint as a 2D point
pub fn cartesian_point_2d(id: EntityId, resolver: &dyn EntityResolver) -> Option<Point2<f64>> {
    cartesian_point(id, resolver).map(|p| Point2::new(p.x, p.y))
}

/// Resolve an IfcDirection (2D directions get z = 0)
pub fn direction(id: EntityId, resolver: &dyn EntityResolver) -> Option<Vector3<f64>> {
    let direction = resolver.get(id)?;
    if direction.ifc_type != IfcType::IfcDirection {
        return None;
    }
    let ratios = direction.get_list(0)?;
    let default_z = if ratios.len() == 2 { 0.0 } else { 1.0 };
    let (x, y, z) = coordinates(ratios, default_z);
    Vector3::new(x, y, z).try_normalize(1e-12)
}

/// Build a matrix from an origin, a Z axis and an approximate X axis
///
/// X is re-orthogonalized against Z. Falls back to the world axes when the
/// inputs are parallel or degenerate.
pub fn basis_matrix(origin: Point3<f64>, z_axis: Vector3<f64>, ref_dir: Vector3<f64>) -> Matrix4<f64> {
    let z = z_axis.try_normalize(1e-12).unwrap_or_else(Vector3::z);
    let x = (ref_dir - z * ref_dir.dot(&z))
        .try_normalize(1e-12)
        .or_else(|| {
            let fallback = if z.x.abs() < 0.9 { Vector3::x() } else { Vector3::y() };
            (fallback - z * fallback.dot(&z)).try_normalize(1e-12)
        })
        .unwrap_or_else(Vector3::x);
    let y = z.cross(&x);

    let rotation = Matrix3::from_columns(&[x, y, z]);
    let mut matrix = rotation.to_homogeneous();
    matrix[(0, 3)] = origin.x;
    matrix[(1, 3)] = origin.y;
    matrix[(2, 3)] = origin.z;
    matrix
}

/// Resolve an IfcAxis2Placement3D
///
/// Location (0), Axis (1, default +Z), RefDirection (2, default +X).
pub fn axis2_placement_3d(id: EntityId, resolver: &dyn EntityResolver) -> Option<Matrix4<f64>> {
    let placement = resolver.get(id)?;
    if placement.ifc_type != IfcType::IfcAxis2Placement3D {
        return None;
    }

    let location = placement
        .get_ref(0)
        .and_then(|id| cartesian_point(id, resolver))
        .unwrap_or_else(Point3::origin);
    let axis = placement
        .get_ref(1)
        .and_then(|id| direction(id, resolver))
        .unwrap_or_else(Vector3::z);
    let ref_dir = placement
        .get_ref(2)
        .and_then(|id| direction(id, resolver))
        .unwrap_or_else(Vector3::x);

    Some(basis_matrix(location, axis, ref_dir))
}

/// Resolve an IfcAxis2Placement2D as a 3D matrix in the XY plane
///
/// Location (0), RefDirection (1, default +X).
pub fn axis2_placement_2d(id: EntityId, resolver: &dyn EntityResolver) -> Option<Matrix4<f64>> {
    let placement = resolver.get(id)?;
    if placement.ifc_type != IfcType::IfcAxis2Placement2D {
        return None;
    }

    let location = placement
        .get_ref(0)
        .and_then(|id| cartesian_point(id, resolver))
        .unwrap_or_else(Point3::origin);
    let ref_dir = placement
        .get_ref(1)
        .and_then(|id| direction(id, resolver))
        .map(|d| Vector3::new(d.x, d.y, 0.0))
        .unwrap_or_else(Vector3::x);

    Some(basis_matrix(
        Point3::new(location.x, location.y, 0.0),
        Vector3::z(),
        ref_dir,
    ))
}

/// Resolve an IfcCartesianTransformationOperator3D (optionally non-uniform)
///
/// Axis1 (0), Axis2 (1), LocalOrigin (2), Scale (3), Axis3 (4), and for the
/// non-uniform variant Scale2 (5) and Scale3 (6).
pub fn transformation_operator(id: EntityId, resolver: &dyn EntityResolver) -> Option<Matrix4<f64>> {
    let op = resolver.get(id)?;
    let non_uniform = match op.ifc_type {
        IfcType::IfcCartesianTransformationOperator3D => false,
        IfcType::IfcCartesianTransformationOperator3DnonUniform => true,
        _ => return None,
    };

    let axis1 = op.get_ref(0).and_then(|id| direction(id, resolver));
    let origin = op
        .get_ref(2)
        .and_then(|id| cartesian_point(id, resolver))
        .unwrap_or_else(Point3::origin);
    let scale = op.get_float(3).unwrap_or(1.0);
    let axis3 = op.get_ref(4).and_then(|id| direction(id, resolver));

    let (scale_y, scale_z) = if non_uniform {
        (
            op.get_float(5).unwrap_or(scale),
            op.get_float(6).unwrap_or(scale),
        )
    } else {
        (scale, scale)
    };

    let base = basis_matrix(
        origin,
        axis3.unwrap_or_else(Vector3::z),
        axis1.unwrap_or_else(Vector3::x),
    );
    Some(base * Matrix4::new_nonuniform_scaling(&Vector3::new(scale, scale_y, scale_z)))
}

/// Resolve any supported placement entity to a matrix
pub fn placement_matrix(id: EntityId, resolver: &dyn EntityResolver) -> Option<Matrix4<f64>> {
    let placement = resolver.get(id)?;
    match placement.ifc_type {
        IfcType::IfcLocalPlacement => Some(local_placement(id, resolver)),
        IfcType::IfcAxis2Placement3D => axis2_placement_3d(id, resolver),
        IfcType::IfcAxis2Placement2D => axis2_placement_2d(id, resolver),
        IfcType::IfcCartesianTransformationOperator3D
        | IfcType::IfcCartesianTransformationOperator3DnonUniform => {
            transformation_operator(id, resolver)
        }
        _ => None,
    }
}

/// Resolve an IfcLocalPlacement to world coordinates
///
/// Walks `PlacementRelTo` (0) outward, composing each `RelativePlacement` (1).
/// A broken link or a reference cycle ends the chain at that point.
pub fn local_placement(id: EntityId, resolver: &dyn EntityResolver) -> Matrix4<f64> {
    let mut world = Matrix4::identity();
    let mut visited = FxHashSet::default();
    let mut current = Some(id);

    while let Some(id) = current {
        if !visited.insert(id) {
            debug!("Placement cycle at {}", id);
            break;
        }
        let placement = match resolver.get(id) {
            Some(p) if p.ifc_type == IfcType::IfcLocalPlacement => p,
            _ => break,
        };

        if let Some(relative) = placement
            .get_ref(1)
            .and_then(|rel| placement_matrix(rel, resolver))
        {
            world = relative * world;
        }
        current = placement.get_ref(0);
    }

    world
}
