// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One conversion run
//!
//! [`Converter::run`] drives the stages in order and never panics or
//! returns early on a stage failure: the failure is logged, recorded in
//! [`RunResult::errors`], and later stages see the missing output.
//! Only an unreadable or unparsable IFC file ends the run.

use crate::cache::PropertyCache;
use crate::config::ConverterConfig;
use crate::error::{ConvertError, Result};
use crate::geometry::{build_records, GeometrySet};
use crate::glb::write_glb;
use crate::identity::IdentityResolver;
use crate::inverse::InverseIndex;
use crate::linker::link_geometry;
use crate::mapping::ConversionMap;
use crate::projection::{ProjectionContext, Projector};
use crate::rdf::namespace::{self, owl, rdf};
use crate::rdf::{write_turtle_file, Graph};
use crate::spatial::project_spatial;
use ifc_rdf_geometry::GeometryRouter;
use ifc_rdf_model::IfcModel;
use ifc_rdf_parser::ParsedModel;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Written Turtle document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RdfFile {
    pub path: PathBuf,
    pub size: u64,
    pub format: String,
    pub triples: usize,
}

/// Written GLB container
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlbFile {
    pub path: PathBuf,
    pub size: u64,
    pub format: String,
    pub elements: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputFiles {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rdf: Option<RdfFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glb: Option<GlbFile>,
}

/// Counts describing a finished run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub asset_name: String,
    pub ifc_schema: String,
    pub entities_processed: usize,
    pub geometry_elements: usize,
    pub total_vertices: usize,
    pub total_faces: usize,
}

/// Outcome of [`Converter::run`]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub success: bool,
    pub files: OutputFiles,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RunMetadata>,
    pub errors: Vec<String>,
}

impl RunResult {
    fn record(&mut self, err: &ConvertError) {
        error!("{}", err);
        self.errors.push(err.to_string());
    }
}

/// Converts one IFC file into a Turtle graph and a GLB container
pub struct Converter {
    config: ConverterConfig,
}

impl Converter {
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Run every stage
    pub fn run(&self) -> RunResult {
        let mut result = RunResult::default();
        let asset = self.config.resolved_asset_name();
        let base = self.config.namespace();
        info!("Starting integrated conversion for: {}", asset);

        let model = match load_model(&self.config.ifc_file) {
            Ok(model) => model,
            Err(e) => {
                result.record(&e);
                return result;
            }
        };
        let resolver = model.resolver();
        let schema = model.schema();

        let mapping = self.load_mapping(&mut result);
        let cache = PropertyCache::build(resolver, schema);
        let mut identities = IdentityResolver::new(base.clone());

        let geometry = if self.config.convert_geometry {
            let router = GeometryRouter::with_default_processors_and_unit_scale(model.unit_scale());
            build_records(resolver, schema, &router, &mut identities)
        } else {
            info!("Geometry conversion disabled");
            GeometrySet::default()
        };

        let glb_path = if !self.config.convert_geometry {
            None
        } else if geometry.is_empty() {
            result.record(&ConvertError::geometry("no representation produced a mesh"));
            None
        } else {
            match write_glb(&geometry, &self.config.glb_output_dir, &asset) {
                Ok(path) => Some(path),
                Err(e) => {
                    result.record(&e);
                    None
                }
            }
        };

        let mut graph = Graph::new();
        graph.add_iri(&base, rdf::TYPE, owl::ONTOLOGY);

        let inverses = InverseIndex::build(resolver, schema);
        let mut projector = Projector::new(ProjectionContext {
            resolver,
            schema,
            mapping: &mapping,
            cache: &cache,
            inverses: &inverses,
        });
        projector.project_all(&mut identities, &mut graph);
        project_spatial(resolver, schema, &mut identities, &mut graph);
        link_geometry(glb_path.as_deref(), &asset, &geometry, &identities, &mut graph);

        let rdf_path = self.config.rdf_output_dir.join(format!("{}.ttl", asset));
        match write_turtle_file(&rdf_path, &graph, &namespace::prefixes(&base)) {
            Ok(()) => {
                info!("RDF saved: {} ({} triples)", rdf_path.display(), graph.len());
                result.files.rdf = Some(RdfFile {
                    size: file_size(&rdf_path),
                    path: rdf_path,
                    format: "turtle".to_string(),
                    triples: graph.len(),
                });
            }
            Err(e) => result.record(&ConvertError::io(&rdf_path, e)),
        }

        if let Some(path) = glb_path {
            result.files.glb = Some(GlbFile {
                size: file_size(&path),
                path,
                format: "glb".to_string(),
                elements: geometry.records.len(),
            });
        }

        result.metadata = Some(RunMetadata {
            asset_name: asset.clone(),
            ifc_schema: model.metadata().schema_version.clone(),
            entities_processed: projector.projected_count(),
            geometry_elements: geometry.records.len(),
            total_vertices: geometry.total_vertices(),
            total_faces: geometry.total_faces(),
        });
        result.success = true;
        info!("Conversion completed successfully for: {}", asset);
        result
    }

    /// Configured or discovered conversion map, or the empty fallback
    fn load_mapping(&self, result: &mut RunResult) -> ConversionMap {
        let loaded = match ConversionMap::locate(self.config.conversion_map.as_deref()) {
            Some(path) => ConversionMap::load(&path),
            None => Err(ConvertError::mapping(
                crate::mapping::CONVERSION_MAP_FILE,
                "no conversion map found",
            )),
        };

        loaded.unwrap_or_else(|e| {
            result.record(&e);
            warn!("Using minimal default mapping");
            ConversionMap::empty()
        })
    }
}

/// Read and index an IFC file
pub fn load_model(path: &Path) -> Result<ParsedModel> {
    info!("Loading IFC file: {}", path.display());
    let bytes = std::fs::read(path).map_err(|e| ConvertError::io(path, e))?;
    let content = String::from_utf8_lossy(&bytes);
    let model = ParsedModel::parse(&content)?;
    info!("IFC loaded successfully. Schema: {}", model.metadata().schema_version);
    Ok(model)
}

fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|meta| meta.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::namespace::{omg, rdfs};
    use crate::rdf::{Literal, Term};
    use std::fs;
    use tempfile::TempDir;

    const WALL_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [ReferenceView]'),'2;1');
FILE_NAME('wall.ifc','2024-01-01T00:00:00',(''),(''),'','','');
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCCARTESIANPOINT((0.,0.,0.));
#2=IFCAXIS2PLACEMENT3D(#1,$,$);
#3=IFCLOCALPLACEMENT($,#2);
#10=IFCCARTESIANPOINTLIST3D(((0.,0.,0.),(4.,0.,0.),(4.,0.,3.),(0.,0.,3.)));
#11=IFCTRIANGULATEDFACESET(#10,$,.T.,((1,2,3),(1,3,4)),$);
#12=IFCSHAPEREPRESENTATION($,'Body','Tessellation',(#11));
#13=IFCPRODUCTDEFINITIONSHAPE($,$,(#12));
#20=IFCWALL('1YEiFK9gX9Wfa1c1bqz2WW',$,'Wall-01',$,$,#3,#13,$,$);
#30=IFCPROPERTYSINGLEVALUE('IsExternal',$,IFCBOOLEAN(.T.),$);
#31=IFCPROPERTYSET('0MbZm8PBjE8PqX8x5xWd5V',$,'Pset_WallCommon',$,(#30));
#32=IFCRELDEFINESBYPROPERTIES('2Hy5GxUEn9uQUlWEhOQzVR',$,$,$,(#20),#31);
ENDSEC;
END-ISO-10303-21;
"#;

    const WALL_MAP: &str = r#"{
        "classes": {"IfcWall": {"class": "https://example.org/Wall"}},
        "psets": {"Pset_WallCommon": {"IsExternal": "https://example.org/isExternal"}}
    }"#;

    const WALL_URI: &str = "http://example.org/data/623ac3d4-26a8-4982-9901-981974f42820";

    struct Workspace {
        dir: TempDir,
    }

    impl Workspace {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            fs::write(dir.path().join("wall.ifc"), WALL_IFC).unwrap();
            fs::write(dir.path().join("map.json"), WALL_MAP).unwrap();
            Self { dir }
        }

        fn config(&self) -> ConverterConfig {
            let root = self.dir.path();
            ConverterConfig::new(root.join("wall.ifc"))
                .with_base_url("http://example.org/data")
                .with_rdf_output_dir(root.join("rdf"))
                .with_glb_output_dir(root.join("glb"))
                .with_conversion_map(root.join("map.json"))
        }
    }

    fn turtle_triples(result: &RunResult) -> String {
        let rdf = result.files.rdf.as_ref().unwrap();
        fs::read_to_string(&rdf.path).unwrap()
    }

    #[test]
    fn test_wall_end_to_end() {
        let workspace = Workspace::new();
        let result = Converter::new(workspace.config()).run();

        assert!(result.success, "errors: {:?}", result.errors);
        assert!(result.errors.is_empty(), "errors: {:?}", result.errors);

        let metadata = result.metadata.as_ref().unwrap();
        assert_eq!(metadata.asset_name, "wall");
        assert_eq!(metadata.ifc_schema, "IFC4");
        assert_eq!(metadata.entities_processed, 1);
        assert_eq!(metadata.geometry_elements, 1);
        assert_eq!(metadata.total_vertices, 4);
        assert_eq!(metadata.total_faces, 2);

        let glb = result.files.glb.as_ref().unwrap();
        assert_eq!(glb.path, workspace.dir.path().join("glb/wall.glb"));
        assert_eq!(glb.elements, 1);
        assert!(glb.size > 0);

        let rdf = result.files.rdf.as_ref().unwrap();
        assert_eq!(rdf.format, "turtle");
        assert_eq!(rdf.path, workspace.dir.path().join("rdf/wall.ttl"));

        let turtle = turtle_triples(&result);
        assert!(turtle.starts_with("@prefix inst: <http://example.org/data/> .\n"));
        assert_eq!(turtle.matches("<https://example.org/Wall>").count(), 1);
        assert_eq!(turtle.matches("rdfs:label \"Wall-01\"^^xsd:string").count(), 1);
        assert_eq!(turtle.matches("<https://example.org/isExternal> \"true\"^^xsd:boolean").count(), 1);
        assert_eq!(turtle.matches("omg:hasGeometry").count(), 1);
        assert!(turtle.contains("inst:geometry_623ac3d4-26a8-4982-9901-981974f42820_0"));
    }

    #[test]
    fn test_wall_glb_container() {
        let workspace = Workspace::new();
        let result = Converter::new(workspace.config()).run();
        let glb = result.files.glb.as_ref().unwrap();
        let bytes = fs::read(&glb.path).unwrap();
        let word = |at: usize| u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap());

        assert_eq!(&bytes[0..4], b"glTF");
        assert_eq!(word(4), 2);
        assert_eq!(word(8) as usize, bytes.len());
        assert_eq!(glb.size, bytes.len() as u64);

        let json_len = word(12) as usize;
        assert_eq!(&bytes[16..20], b"JSON");
        assert_eq!(json_len % 4, 0);
        let doc: serde_json::Value = serde_json::from_slice(&bytes[20..20 + json_len]).unwrap();
        assert_eq!(&bytes[20 + json_len + 4..20 + json_len + 8], b"BIN\0");

        let meshes = doc["meshes"].as_array().unwrap();
        assert_eq!(meshes.len(), 1);
        let primitive = &meshes[0]["primitives"][0];
        let position = primitive["attributes"]["POSITION"].as_u64().unwrap() as usize;
        let indices = primitive["indices"].as_u64().unwrap() as usize;
        assert_eq!(doc["accessors"][position]["count"], 4);
        assert_eq!(doc["accessors"][indices]["count"], 6);

        assert_eq!(doc["nodes"][0]["name"], "623ac3d4-26a8-4982-9901-981974f42820");
    }

    #[test]
    fn test_wall_graph_terms() {
        let workspace = Workspace::new();
        let config = workspace.config();
        let model = load_model(&config.ifc_file).unwrap();
        let mapping = ConversionMap::from_json(WALL_MAP).unwrap();
        let cache = PropertyCache::build(model.resolver(), model.schema());
        let inverses = InverseIndex::build(model.resolver(), model.schema());
        let mut identities = IdentityResolver::new(config.namespace());
        let mut graph = Graph::new();

        let mut projector = Projector::new(ProjectionContext {
            resolver: model.resolver(),
            schema: model.schema(),
            mapping: &mapping,
            cache: &cache,
            inverses: &inverses,
        });
        projector.project_all(&mut identities, &mut graph);

        assert_eq!(graph.matching(WALL_URI, rdf::TYPE).count(), 1);
        let label: Vec<_> = graph.matching(WALL_URI, rdfs::LABEL).collect();
        assert_eq!(label.len(), 1);
        assert_eq!(label[0].o, Term::from(Literal::string("Wall-01")));
        let external: Vec<_> = graph.matching(WALL_URI, "https://example.org/isExternal").collect();
        assert_eq!(external.len(), 1);
        assert_eq!(external[0].o, Term::from(Literal::boolean(true)));
        assert_eq!(graph.matching(WALL_URI, omg::HAS_GEOMETRY).count(), 0);
    }

    #[test]
    fn test_geometry_disabled() {
        let workspace = Workspace::new();
        let result = Converter::new(workspace.config().with_geometry(false)).run();

        assert!(result.success);
        assert!(result.errors.is_empty());
        assert!(result.files.glb.is_none());
        assert!(!workspace.dir.path().join("glb").exists());
        assert!(!turtle_triples(&result).contains("omg:hasGeometry"));
    }

    #[test]
    fn test_missing_map_falls_back() {
        let workspace = Workspace::new();
        let config = workspace
            .config()
            .with_conversion_map(workspace.dir.path().join("absent.json"))
            .with_asset_name("fallback");
        let result = Converter::new(config).run();

        assert!(result.success);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("absent.json"));

        let metadata = result.metadata.unwrap();
        assert_eq!(metadata.entities_processed, 0);
        // Geometry does not depend on the map
        assert_eq!(metadata.geometry_elements, 1);
    }

    #[test]
    fn test_missing_ifc_fails() {
        let workspace = Workspace::new();
        let mut config = workspace.config();
        config.ifc_file = workspace.dir.path().join("absent.ifc");
        let result = Converter::new(config).run();

        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        assert!(result.metadata.is_none());
        assert!(result.files.rdf.is_none());
    }

    #[test]
    fn test_no_geometry_is_recorded() {
        let workspace = Workspace::new();
        let ifc = WALL_IFC.replace("#3,#13,$,$);", "#3,$,$,$);");
        fs::write(workspace.dir.path().join("wall.ifc"), ifc).unwrap();

        let result = Converter::new(workspace.config()).run();
        assert!(result.success);
        assert_eq!(result.errors.len(), 1);
        assert!(result.files.glb.is_none());
        assert!(result.files.rdf.is_some());
    }

    #[test]
    fn test_result_json_shape() {
        let workspace = Workspace::new();
        let result = Converter::new(workspace.config()).run();
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["files"]["rdf"]["format"], "turtle");
        assert_eq!(json["files"]["glb"]["format"], "glb");
        assert_eq!(json["metadata"]["total_faces"], 2);
        assert!(json["errors"].as_array().unwrap().is_empty());
    }
}
