// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Links geometry records to the entity graph

use crate::geometry::GeometrySet;
use crate::identity::IdentityResolver;
use crate::rdf::namespace::{fog, gom, omg, rdf};
use crate::rdf::{Graph, Literal};
use log::info;
use std::path::Path;

/// Add the main geometry node and one node per record
///
/// Does nothing without a GLB path. Returns the number of triples added.
pub fn link_geometry(
    glb_path: Option<&Path>,
    asset: &str,
    geometry: &GeometrySet,
    identities: &IdentityResolver,
    graph: &mut Graph,
) -> usize {
    let Some(glb_path) = glb_path else {
        return 0;
    };
    info!("Creating geometry links in RDF...");
    let before = graph.len();

    let main = identities.uri_for(&format!("geometry_{}", asset));
    graph.add_iri(&main, rdf::TYPE, omg::GEOMETRY);
    graph.add_iri(&main, rdf::TYPE, gom::MESH_GEOMETRY);
    graph.add_literal(
        &main,
        fog::AS_GLTF_GLB,
        Literal::any_uri(glb_path.to_string_lossy()),
    );
    if let Ok(meta) = std::fs::metadata(glb_path) {
        graph.add_literal(&main, gom::HAS_FILE_SIZE, Literal::non_negative(meta.len()));
    }
    graph.add_literal(
        &main,
        gom::HAS_VERTICES,
        Literal::non_negative(geometry.total_vertices() as u64),
    );
    graph.add_literal(
        &main,
        gom::HAS_FACES,
        Literal::non_negative(geometry.total_faces() as u64),
    );

    for record in &geometry.records {
        let entity = identities.uri_for(&record.identifier);
        let node = identities.uri_for(&format!(
            "geometry_{}_{}",
            record.identifier, record.representation_index
        ));

        graph.add_iri(&entity, omg::HAS_GEOMETRY, &node);
        graph.add_iri(&node, rdf::TYPE, omg::GEOMETRY);
        graph.add_iri(&node, rdf::TYPE, gom::MESH_GEOMETRY);
        graph.add_iri(&node, omg::IS_PART_OF_GEOMETRY, &main);
        graph.add_literal(&node, gom::HAS_VERTICES, Literal::non_negative(record.vertex_count() as u64));
        graph.add_literal(&node, gom::HAS_FACES, Literal::non_negative(record.face_count() as u64));
    }

    info!("Geometry links created for {} elements", geometry.records.len());
    graph.len() - before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{GeometryRecord, MaterialRegistry};
    use crate::rdf::Term;
    use ifc_rdf_model::EntityId;

    const BASE: &str = "http://example.org/data/";

    fn geometry() -> GeometrySet {
        let record = |index: usize| GeometryRecord {
            name: format!("w_{}", index),
            entity: EntityId(7),
            identifier: "w".to_string(),
            ifc_type: "IfcWall".to_string(),
            representation_index: index,
            positions: vec![0.0; 9],
            indices: vec![0, 1, 2],
            material: 0,
        };
        GeometrySet {
            records: vec![record(0), record(1)],
            materials: MaterialRegistry::new(),
            failures: 0,
        }
    }

    #[test]
    fn test_no_glb_is_a_no_op() {
        let mut graph = Graph::new();
        let identities = IdentityResolver::new(BASE);
        assert_eq!(link_geometry(None, "house", &geometry(), &identities, &mut graph), 0);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_links() {
        let dir = tempfile::tempdir().unwrap();
        let glb = dir.path().join("house.glb");
        std::fs::write(&glb, [0u8; 20]).unwrap();

        let mut graph = Graph::new();
        let identities = IdentityResolver::new(BASE);
        let added = link_geometry(Some(&glb), "house", &geometry(), &identities, &mut graph);

        // 6 on the main node, 6 per record
        assert_eq!(added, 18);

        let main = format!("{}geometry_house", BASE);
        let size: Vec<_> = graph.matching(&main, gom::HAS_FILE_SIZE).collect();
        assert_eq!(size.len(), 1);
        assert_eq!(size[0].o, Term::from(Literal::non_negative(20)));
        let vertices: Vec<_> = graph.matching(&main, gom::HAS_VERTICES).collect();
        assert_eq!(vertices[0].o, Term::from(Literal::non_negative(6)));

        let wall = format!("{}w", BASE);
        assert_eq!(graph.matching(&wall, omg::HAS_GEOMETRY).count(), 2);
        let second = format!("{}geometry_w_1", BASE);
        assert_eq!(graph.matching(&second, omg::IS_PART_OF_GEOMETRY).count(), 1);
    }

    #[test]
    fn test_missing_file_has_no_size() {
        let mut graph = Graph::new();
        let identities = IdentityResolver::new(BASE);
        let added = link_geometry(
            Some(Path::new("/nonexistent/house.glb")),
            "house",
            &geometry(),
            &identities,
            &mut graph,
        );
        assert_eq!(added, 17);
    }
}
