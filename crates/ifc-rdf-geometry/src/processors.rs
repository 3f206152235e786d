// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Item tessellators
//!
//! One processor per family of representation items. Each returns a mesh in
//! the item's own coordinate system, in file units.

use crate::{
    extrusion::extrude_profile,
    placement::{axis2_placement_2d, axis2_placement_3d, cartesian_point_2d, direction},
    profile::Profile2D,
    router::GeometryProcessor,
    triangulation::{earcut_with_holes, PlaneFrame},
    Error, Mesh, Result,
};
use ifc_rdf_model::{AttributeValue, DecodedEntity, EntityId, EntityResolver, IfcType};
use nalgebra::{Matrix4, Point2, Point3};

/// `IfcExtrudedAreaSolid`: a profile swept along a direction
///
/// Attributes: SweptArea (0), Position (1), ExtrudedDirection (2), Depth (3).
#[derive(Default)]
pub struct ExtrudedAreaSolidProcessor;

impl ExtrudedAreaSolidProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl GeometryProcessor for ExtrudedAreaSolidProcessor {
    fn process(&self, entity: &DecodedEntity, resolver: &dyn EntityResolver) -> Result<Mesh> {
        let area = entity
            .get_ref(0)
            .and_then(|id| resolver.get(id))
            .ok_or_else(|| Error::invalid_attribute(0, "SweptArea does not resolve"))?;
        let profile = swept_area(&area, resolver)?;

        let dir = entity
            .get_ref(2)
            .and_then(|id| direction(id, resolver))
            .ok_or_else(|| Error::invalid_attribute(2, "ExtrudedDirection does not resolve"))?;
        let depth = required_float(entity, 3, "Depth")?;

        // extrude_profile sweeps along +Z; shear +Z onto `dir` otherwise
        let straight_up = dir.x.abs() < 1e-9 && dir.y.abs() < 1e-9 && dir.z > 0.0;
        let shear = (!straight_up).then(|| {
            let mut m = Matrix4::identity();
            m[(0, 2)] = dir.x;
            m[(1, 2)] = dir.y;
            m[(2, 2)] = dir.z;
            m
        });

        let mut mesh = extrude_profile(&profile, depth, shear)?;
        if let Some(position) = entity.get_ref(1).and_then(|id| axis2_placement_3d(id, resolver)) {
            mesh.transform(&position);
        }
        Ok(mesh)
    }

    fn handles(&self) -> Vec<IfcType> {
        vec![IfcType::IfcExtrudedAreaSolid]
    }
}

/// 2D outline of a profile definition
///
/// Parameterized profiles carry an optional Position (2); arbitrary ones are
/// already in profile coordinates.
fn swept_area(def: &DecodedEntity, resolver: &dyn EntityResolver) -> Result<Profile2D> {
    let parameterized = match def.ifc_type {
        IfcType::IfcRectangleProfileDef => Profile2D::rectangle(
            required_float(def, 3, "XDim")?,
            required_float(def, 4, "YDim")?,
        ),
        IfcType::IfcCircleProfileDef => Profile2D::circle(required_float(def, 3, "Radius")?, None),
        IfcType::IfcCircleHollowProfileDef => Profile2D::hollow_circle(
            required_float(def, 3, "Radius")?,
            required_float(def, 4, "WallThickness")?,
        )?,
        IfcType::IfcArbitraryClosedProfileDef => return outer_curve_profile(def, resolver),
        IfcType::IfcArbitraryProfileDefWithVoids => {
            let mut profile = outer_curve_profile(def, resolver)?;
            // InnerCurves (3); unreadable voids are left out
            for id in def.get_refs(3).unwrap_or_default() {
                if let Ok(hole) = curve_points(id, resolver) {
                    if hole.len() >= 3 {
                        profile.add_hole(hole);
                    }
                }
            }
            return Ok(profile);
        }
        _ => {
            return Err(Error::unsupported_type(format!(
                "profile {}",
                def.ifc_type
            )))
        }
    };

    Ok(
        match def.get_ref(2).and_then(|id| axis2_placement_2d(id, resolver)) {
            Some(position) => transform_profile(parameterized, &position),
            None => parameterized,
        },
    )
}

/// OuterCurve (2) of an arbitrary profile
fn outer_curve_profile(def: &DecodedEntity, resolver: &dyn EntityResolver) -> Result<Profile2D> {
    let curve = def
        .get_ref(2)
        .ok_or_else(|| Error::invalid_attribute(2, "OuterCurve is not a reference"))?;
    let outline = curve_points(curve, resolver)?;
    if outline.len() < 3 {
        return Err(Error::profile(format!(
            "outer curve of {} has {} points",
            def.id,
            outline.len()
        )));
    }
    Ok(Profile2D::new(outline))
}

/// `IfcTriangulatedFaceSet`: explicit triangles over a point list
#[derive(Default)]
pub struct TriangulatedFaceSetProcessor;

impl TriangulatedFaceSetProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl GeometryProcessor for TriangulatedFaceSetProcessor {
    fn process(&self, entity: &DecodedEntity, resolver: &dyn EntityResolver) -> Result<Mesh> {
        // 0: Coordinates (IfcCartesianPointList3D), 3: CoordIndex (1-based triples)
        let positions = point_list_3d(entity, resolver)?;
        let vertex_count = positions.len() / 3;

        let face_list = entity
            .get_list(3)
            .ok_or_else(|| Error::invalid_attribute(3, "Missing CoordIndex"))?;

        let mut indices = Vec::with_capacity(face_list.len() * 3);
        for face in face_list {
            let triangle = match face.as_list().map(one_based_indices) {
                Some(triangle) if triangle.len() == 3 => triangle,
                _ => continue,
            };
            if triangle.iter().all(|&i| (i as usize) < vertex_count) {
                indices.extend_from_slice(&triangle);
            }
        }

        Ok(Mesh::from_buffers(positions, indices))
    }

    fn handles(&self) -> Vec<IfcType> {
        vec![IfcType::IfcTriangulatedFaceSet]
    }
}

/// `IfcPolygonalFaceSet`: indexed polygons, optionally with voids
#[derive(Default)]
pub struct PolygonalFaceSetProcessor;

impl PolygonalFaceSetProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl GeometryProcessor for PolygonalFaceSetProcessor {
    fn process(&self, entity: &DecodedEntity, resolver: &dyn EntityResolver) -> Result<Mesh> {
        // 0: Coordinates, 1: Closed, 2: Faces, 3: PnIndex
        let positions = point_list_3d(entity, resolver)?;
        let points: Vec<Point3<f64>> = positions
            .chunks_exact(3)
            .map(|c| Point3::new(c[0] as f64, c[1] as f64, c[2] as f64))
            .collect();

        let face_ids = entity
            .get_refs(2)
            .ok_or_else(|| Error::invalid_attribute(2, "Missing Faces"))?;

        let lookup = |indices: Vec<u32>| -> Option<Vec<Point3<f64>>> {
            indices
                .into_iter()
                .map(|i| points.get(i as usize).copied())
                .collect()
        };

        let mut mesh = Mesh::new();
        for face_id in face_ids {
            let face = match resolver.get(face_id) {
                Some(face) => face,
                None => continue,
            };

            let outer = match face.get_list(0).map(one_based_indices).and_then(lookup) {
                Some(outer) if outer.len() >= 3 => outer,
                _ => continue,
            };
            let holes: Vec<Vec<Point3<f64>>> = if face.ifc_type
                == IfcType::IfcIndexedPolygonalFaceWithVoids
            {
                face.get_list(1)
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|inner| inner.as_list().map(one_based_indices))
                    .filter_map(lookup)
                    .filter(|hole| hole.len() >= 3)
                    .collect()
            } else {
                Vec::new()
            };

            mesh.merge(&triangulate_face(&outer, &holes));
        }

        Ok(mesh)
    }

    fn handles(&self) -> Vec<IfcType> {
        vec![IfcType::IfcPolygonalFaceSet]
    }
}

/// `IfcFacetedBrep`: the Outer closed shell; voids of the
/// `WithVoids` subtype are ignored
#[derive(Default)]
pub struct FacetedBrepProcessor;

impl FacetedBrepProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl GeometryProcessor for FacetedBrepProcessor {
    fn process(&self, entity: &DecodedEntity, resolver: &dyn EntityResolver) -> Result<Mesh> {
        match entity.get_ref(0) {
            Some(outer) => shell_mesh(outer, resolver),
            None => Err(Error::invalid_attribute(0, "Outer is not a reference")),
        }
    }

    fn handles(&self) -> Vec<IfcType> {
        vec![IfcType::IfcFacetedBrep, IfcType::IfcFacetedBrepWithVoids]
    }
}

/// `IfcShellBasedSurfaceModel`: every shell of SbsmBoundary (0)
#[derive(Default)]
pub struct ShellBasedSurfaceModelProcessor;

impl ShellBasedSurfaceModelProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl GeometryProcessor for ShellBasedSurfaceModelProcessor {
    fn process(&self, entity: &DecodedEntity, resolver: &dyn EntityResolver) -> Result<Mesh> {
        let shells = entity
            .get_refs(0)
            .ok_or_else(|| Error::invalid_attribute(0, "Missing SbsmBoundary"))?;

        let mut mesh = Mesh::new();
        for shell_id in shells {
            if let Ok(shell) = shell_mesh(shell_id, resolver) {
                mesh.merge(&shell);
            }
        }
        Ok(mesh)
    }

    fn handles(&self) -> Vec<IfcType> {
        vec![IfcType::IfcShellBasedSurfaceModel]
    }
}

/// Read a required numeric attribute
fn required_float(entity: &DecodedEntity, index: usize, name: &str) -> Result<f64> {
    entity
        .get(index)
        .and_then(|v| v.unwrap_typed().as_float())
        .ok_or_else(|| Error::invalid_attribute(index, format!("Missing {}", name)))
}

/// Convert a list of 1-based STEP indices to 0-based, dropping invalid entries
fn one_based_indices(values: &[AttributeValue]) -> Vec<u32> {
    values
        .iter()
        .filter_map(|v| v.as_integer())
        .filter(|&i| i >= 1 && i <= u32::MAX as i64)
        .map(|i| (i - 1) as u32)
        .collect()
}

/// Flattened positions of an IfcCartesianPointList3D referenced at index 0
fn point_list_3d(entity: &DecodedEntity, resolver: &dyn EntityResolver) -> Result<Vec<f32>> {
    let coord_id = entity
        .get_ref(0)
        .ok_or_else(|| Error::invalid_attribute(0, "Missing Coordinates"))?;
    let coord_entity = resolver
        .get(coord_id)
        .ok_or_else(|| Error::entity_not_found(coord_id))?;
    let coord_list = coord_entity
        .get_list(0)
        .ok_or_else(|| Error::invalid_attribute(0, "Missing CoordList"))?;

    let mut positions = Vec::with_capacity(coord_list.len() * 3);
    for coord in coord_list {
        if let Some(point) = coord.as_list() {
            for axis in 0..3 {
                let value = point.get(axis).and_then(|v| v.as_float()).unwrap_or(0.0);
                positions.push(value as f32);
            }
        }
    }
    Ok(positions)
}

/// Apply a 2D placement to every profile point
fn transform_profile(profile: Profile2D, position: &Matrix4<f64>) -> Profile2D {
    let place = |points: Vec<Point2<f64>>| -> Vec<Point2<f64>> {
        points
            .into_iter()
            .map(|p| {
                let t = position.transform_point(&Point3::new(p.x, p.y, 0.0));
                Point2::new(t.x, t.y)
            })
            .collect()
    };

    Profile2D {
        outer: place(profile.outer),
        holes: profile.holes.into_iter().map(place).collect(),
    }
}

/// Extract 2D points from an IfcPolyline or IfcIndexedPolyCurve
///
/// A closing point equal to the first point is removed.
fn curve_points(curve_id: EntityId, resolver: &dyn EntityResolver) -> Result<Vec<Point2<f64>>> {
    let curve = resolver
        .get(curve_id)
        .ok_or_else(|| Error::entity_not_found(curve_id))?;

    let mut points = match curve.ifc_type {
        IfcType::IfcPolyline => curve
            .get_refs(0)
            .ok_or_else(|| Error::invalid_attribute(0, "Missing Points"))?
            .into_iter()
            .filter_map(|id| cartesian_point_2d(id, resolver))
            .collect::<Vec<_>>(),
        IfcType::IfcIndexedPolyCurve => indexed_poly_curve_points(&curve, resolver)?,
        _ => {
            return Err(Error::unsupported_type(format!(
                "Curve type {}",
                curve.ifc_type
            )))
        }
    };

    if points.len() > 1 {
        let first = points[0];
        let last = points[points.len() - 1];
        if (first - last).norm() < 1e-10 {
            points.pop();
        }
    }

    Ok(points)
}

/// Points (0) is an IfcCartesianPointList2D; Segments (1) optionally selects
/// and orders them through IfcLineIndex / IfcArcIndex values. Arc segments are
/// approximated by their three defining points.
fn indexed_poly_curve_points(
    curve: &DecodedEntity,
    resolver: &dyn EntityResolver,
) -> Result<Vec<Point2<f64>>> {
    let list_id = curve
        .get_ref(0)
        .ok_or_else(|| Error::invalid_attribute(0, "Missing Points"))?;
    let list = resolver
        .get(list_id)
        .ok_or_else(|| Error::entity_not_found(list_id))?;
    let coords = list
        .get_list(0)
        .ok_or_else(|| Error::invalid_attribute(0, "Missing CoordList"))?;

    let all: Vec<Point2<f64>> = coords
        .iter()
        .filter_map(|c| c.as_list())
        .map(|c| {
            Point2::new(
                c.first().and_then(|v| v.as_float()).unwrap_or(0.0),
                c.get(1).and_then(|v| v.as_float()).unwrap_or(0.0),
            )
        })
        .collect();

    let segments = match curve.get_list(1) {
        Some(segments) if !segments.is_empty() => segments,
        _ => return Ok(all),
    };

    let mut points: Vec<Point2<f64>> = Vec::new();
    for segment in segments {
        let indices = match segment {
            AttributeValue::TypedValue(_, args) => match args.first().and_then(|a| a.as_list()) {
                Some(list) => one_based_indices(list),
                None => continue,
            },
            AttributeValue::List(list) => one_based_indices(list),
            _ => continue,
        };
        for index in indices {
            if let Some(point) = all.get(index as usize) {
                if points.last() != Some(point) {
                    points.push(*point);
                }
            }
        }
    }

    Ok(points)
}

/// Triangulate every face of an IfcClosedShell / IfcOpenShell
fn shell_mesh(shell_id: EntityId, resolver: &dyn EntityResolver) -> Result<Mesh> {
    let shell = resolver
        .get(shell_id)
        .ok_or_else(|| Error::entity_not_found(shell_id))?;

    // CfsFaces at index 0
    let faces = shell
        .get_refs(0)
        .ok_or_else(|| Error::invalid_attribute(0, "Missing CfsFaces"))?;

    let mut mesh = Mesh::new();

    for face_id in faces {
        let face = match resolver.get(face_id) {
            Some(face) => face,
            None => continue,
        };

        let mut outer: Option<Vec<Point3<f64>>> = None;
        let mut holes: Vec<Vec<Point3<f64>>> = Vec::new();

        // IfcFace.Bounds at index 0
        for bound_id in face.get_refs(0).unwrap_or_default() {
            let bound = match resolver.get(bound_id) {
                Some(bound) => bound,
                None => continue,
            };

            // IfcFaceBound: Bound (0), Orientation (1)
            let mut points = match bound.get_ref(0).and_then(|id| loop_points(id, resolver)) {
                Some(points) => points,
                None => continue,
            };
            if bound.get_bool(1) == Some(false) {
                points.reverse();
            }

            let is_outer = bound.ifc_type == IfcType::IfcFaceOuterBound;
            if is_outer {
                if let Some(previous) = outer.replace(points) {
                    holes.push(previous);
                }
            } else if outer.is_none() {
                outer = Some(points);
            } else {
                holes.push(points);
            }
        }

        if let Some(outer) = outer {
            mesh.merge(&triangulate_face(&outer, &holes));
        }
    }

    Ok(mesh)
}

/// Points of an IfcPolyLoop (Polygon at index 0); `None` below 3 points
fn loop_points(loop_id: EntityId, resolver: &dyn EntityResolver) -> Option<Vec<Point3<f64>>> {
    let poly_loop = resolver.get(loop_id)?;
    if poly_loop.ifc_type != IfcType::IfcPolyLoop {
        return None;
    }

    let points: Vec<Point3<f64>> = poly_loop
        .get_refs(0)?
        .into_iter()
        .filter_map(|id| crate::placement::cartesian_point(id, resolver))
        .collect();

    (points.len() >= 3).then_some(points)
}

/// Triangulate a planar 3D face (supports holes)
///
/// Falls back to a fan over the outer loop when ear clipping fails.
fn triangulate_face(outer: &[Point3<f64>], holes: &[Vec<Point3<f64>>]) -> Mesh {
    let n = outer.len();
    let push_points = |positions: &mut Vec<f32>, points: &[Point3<f64>]| {
        for point in points {
            positions.push(point.x as f32);
            positions.push(point.y as f32);
            positions.push(point.z as f32);
        }
    };

    // Fast path: triangle or quad without holes
    if holes.is_empty() && (n == 3 || n == 4) {
        let mut positions = Vec::with_capacity(n * 3);
        push_points(&mut positions, outer);
        let indices = if n == 3 {
            vec![0, 1, 2]
        } else {
            vec![0, 1, 2, 0, 2, 3]
        };
        return Mesh::from_buffers(positions, indices);
    }

    let triangles = PlaneFrame::of_polygon(outer).map(|frame| {
        let holes_2d: Vec<Vec<Point2<f64>>> = holes.iter().map(|hole| frame.project(hole)).collect();
        earcut_with_holes(&frame.project(outer), &holes_2d)
    });

    match triangles {
        Some(Ok(triangles)) if !triangles.is_empty() => {
            let mut positions = Vec::new();
            push_points(&mut positions, outer);
            for hole in holes.iter().filter(|h| h.len() >= 3) {
                push_points(&mut positions, hole);
            }
            Mesh::from_buffers(positions, triangles.into_iter().map(|i| i as u32).collect())
        }
        _ => {
            let mut positions = Vec::with_capacity(n * 3);
            push_points(&mut positions, outer);
            let indices = (1..n as u32 - 1).flat_map(|i| [0, i, i + 1]).collect();
            Mesh::from_buffers(positions, indices)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ifc_rdf_parser::ResolverImpl;

    const SOLIDS: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCCARTESIANPOINT((0.,0.,0.));
#2=IFCDIRECTION((0.,0.,1.));
#3=IFCAXIS2PLACEMENT3D(#1,$,$);
#4=IFCRECTANGLEPROFILEDEF(.AREA.,$,$,4.,0.2);
#5=IFCEXTRUDEDAREASOLID(#4,#3,#2,3.);
#10=IFCCARTESIANPOINTLIST3D(((0.,0.,0.),(1.,0.,0.),(1.,1.,0.),(0.,1.,0.)));
#11=IFCTRIANGULATEDFACESET(#10,$,.T.,((1,2,3),(1,3,4)),$);
#12=IFCINDEXEDPOLYGONALFACE((1,2,3,4));
#13=IFCPOLYGONALFACESET(#10,.T.,(#12),$);
#20=IFCCARTESIANPOINT((0.,0.,0.));
#21=IFCCARTESIANPOINT((1.,0.,0.));
#22=IFCCARTESIANPOINT((1.,1.,0.));
#23=IFCCARTESIANPOINT((0.,1.,0.));
#24=IFCPOLYLOOP((#20,#21,#22,#23));
#25=IFCFACEOUTERBOUND(#24,.T.);
#26=IFCFACE((#25));
#27=IFCCLOSEDSHELL((#26));
#28=IFCFACETEDBREP(#27);
#29=IFCOPENSHELL((#26));
#30=IFCSHELLBASEDSURFACEMODEL((#29));
#40=IFCCARTESIANPOINT((0.,0.));
#41=IFCCARTESIANPOINT((2.,0.));
#42=IFCCARTESIANPOINT((2.,2.));
#43=IFCCARTESIANPOINT((0.,2.));
#44=IFCPOLYLINE((#40,#41,#42,#43,#40));
#45=IFCARBITRARYCLOSEDPROFILEDEF(.AREA.,$,#44);
#46=IFCEXTRUDEDAREASOLID(#45,#3,#2,1.);
#50=IFCCARTESIANPOINTLIST2D(((0.,0.),(3.,0.),(3.,3.),(0.,3.)));
#51=IFCINDEXEDPOLYCURVE(#50,(IFCLINEINDEX((1,2,3,4,1))),.F.);
#52=IFCARBITRARYCLOSEDPROFILEDEF(.AREA.,$,#51);
#53=IFCEXTRUDEDAREASOLID(#52,#3,#2,1.);
ENDSEC;
END-ISO-10303-21;
"#;

    fn resolver() -> ResolverImpl {
        ResolverImpl::new(SOLIDS.to_string())
    }

    fn process(processor: &dyn GeometryProcessor, id: u32) -> Mesh {
        let resolver = resolver();
        let entity = resolver.get(EntityId(id)).unwrap();
        processor.process(&entity, &resolver).unwrap()
    }

    #[test]
    fn test_extruded_rectangle() {
        let mesh = process(&ExtrudedAreaSolidProcessor::new(), 5);
        assert_eq!(mesh.triangle_count(), 12);

        let (min, max) = mesh.bounds().unwrap();
        assert_relative_eq!(max.x - min.x, 4.0, epsilon = 1e-5);
        assert_relative_eq!(max.y - min.y, 0.2, epsilon = 1e-5);
        assert_relative_eq!(max.z, 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_extruded_polyline_profile() {
        let mesh = process(&ExtrudedAreaSolidProcessor::new(), 46);
        let (min, max) = mesh.bounds().unwrap();
        assert_relative_eq!(max.x - min.x, 2.0, epsilon = 1e-5);
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn test_extruded_indexed_poly_curve_profile() {
        let mesh = process(&ExtrudedAreaSolidProcessor::new(), 53);
        let (_, max) = mesh.bounds().unwrap();
        assert_relative_eq!(max.x, 3.0, epsilon = 1e-5);
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn test_triangulated_face_set() {
        let mesh = process(&TriangulatedFaceSetProcessor::new(), 11);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_polygonal_face_set() {
        let mesh = process(&PolygonalFaceSetProcessor::new(), 13);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_faceted_brep() {
        let mesh = process(&FacetedBrepProcessor::new(), 28);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_shell_based_surface_model() {
        let mesh = process(&ShellBasedSurfaceModelProcessor::new(), 30);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_triangulate_face_with_hole() {
        let outer = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(4.0, 4.0, 0.0),
            Point3::new(0.0, 4.0, 0.0),
        ];
        let hole = vec![
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 3.0, 0.0),
            Point3::new(3.0, 3.0, 0.0),
            Point3::new(3.0, 1.0, 0.0),
        ];
        let mesh = triangulate_face(&outer, &[hole]);
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 8);
    }
}
