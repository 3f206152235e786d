// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vocabulary namespaces and the IRIs the converter emits

pub const BEO: &str = "https://w3id.org/beo#";
pub const OMG: &str = "https://w3id.org/omg#";
pub const FOG: &str = "https://w3id.org/fog#";
pub const GOM: &str = "https://w3id.org/gom#";
pub const BOT: &str = "https://w3id.org/bot#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const OWL: &str = "http://www.w3.org/2002/07/owl#";

/// Join a namespace and a local name
pub fn iri(namespace: &str, local: &str) -> String {
    format!("{}{}", namespace, local)
}

pub mod rdf {
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
}

pub mod rdfs {
    pub const LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
}

pub mod owl {
    pub const ONTOLOGY: &str = "http://www.w3.org/2002/07/owl#Ontology";
}

pub mod bot {
    pub const HAS_SPACE: &str = "https://w3id.org/bot#hasSpace";
    pub const HAS_STOREY: &str = "https://w3id.org/bot#hasStorey";
    pub const HAS_BUILDING: &str = "https://w3id.org/bot#hasBuilding";
    pub const CONTAINS_ZONE: &str = "https://w3id.org/bot#containsZone";
}

pub mod omg {
    pub const GEOMETRY: &str = "https://w3id.org/omg#Geometry";
    pub const HAS_GEOMETRY: &str = "https://w3id.org/omg#hasGeometry";
    pub const IS_PART_OF_GEOMETRY: &str = "https://w3id.org/omg#isPartOfGeometry";
}

pub mod fog {
    pub const AS_GLTF_GLB: &str = "https://w3id.org/fog#asGltf_v2.0-glb";
}

pub mod gom {
    pub const MESH_GEOMETRY: &str = "https://w3id.org/gom#MeshGeometry";
    pub const HAS_FILE_SIZE: &str = "https://w3id.org/gom#hasFileSize";
    pub const HAS_VERTICES: &str = "https://w3id.org/gom#hasVertices";
    pub const HAS_FACES: &str = "https://w3id.org/gom#hasFaces";
}

/// Prefix bindings written at the top of every Turtle document
///
/// `inst` is bound to the run's instance namespace and always comes first.
pub fn prefixes(instance_base: &str) -> Vec<(&'static str, String)> {
    vec![
        ("inst", instance_base.to_string()),
        ("beo", BEO.to_string()),
        ("omg", OMG.to_string()),
        ("fog", FOG.to_string()),
        ("gom", GOM.to_string()),
        ("bot", BOT.to_string()),
        ("xsd", XSD.to_string()),
        ("rdf", RDF.to_string()),
        ("rdfs", RDFS.to_string()),
        ("owl", OWL.to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_constants_live_in_their_namespace() {
        assert_eq!(rdf::TYPE, iri(RDF, "type"));
        assert_eq!(bot::HAS_STOREY, iri(BOT, "hasStorey"));
        assert_eq!(fog::AS_GLTF_GLB, iri(FOG, "asGltf_v2.0-glb"));
        assert_eq!(gom::HAS_FILE_SIZE, iri(GOM, "hasFileSize"));
    }

    #[test]
    fn test_instance_prefix_first() {
        let bound = prefixes("http://localhost:8000/data/");
        assert_eq!(bound[0], ("inst", "http://localhost:8000/data/".to_string()));
        assert_eq!(bound.len(), 10);
    }
}
