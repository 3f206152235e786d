// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parsed model: header, resolver, schema table and length unit

use crate::header::{data_section_start, parse_header};
use crate::resolver::ResolverImpl;
use crate::schema::StaticSchema;
use crate::units::extract_unit_scale;

use ifc_rdf_model::{
    EntityResolver, IfcModel, ModelMetadata, ParseError, Result, SchemaIntrospector,
};
use log::debug;
use std::sync::Arc;

/// An indexed IFC file
pub struct ParsedModel {
    resolver: Arc<ResolverImpl>,
    schema: Arc<dyn SchemaIntrospector>,
    /// Metres per file length unit
    unit_scale: f64,
    metadata: ModelMetadata,
}

impl ParsedModel {
    /// Parse IFC content against the built-in schema table
    pub fn parse(content: &str) -> Result<Self> {
        let schema_version = parse_header(content).schema_version;
        Self::parse_with_schema(content, Arc::new(StaticSchema::ifc(schema_version)))
    }

    /// Parse IFC content against a caller-supplied schema
    pub fn parse_with_schema(content: &str, schema: Arc<dyn SchemaIntrospector>) -> Result<Self> {
        if data_section_start(content).is_none() {
            return Err(ParseError::missing_section("DATA"));
        }

        let resolver = Arc::new(ResolverImpl::new(content.to_string()));
        if resolver.entity_count() == 0 {
            return Err(ParseError::EmptyData);
        }

        let unit_scale = extract_unit_scale(resolver.as_ref(), schema.as_ref());

        let metadata = parse_header(content);

        debug!(
            "Indexed {} entities ({}), unit scale {}",
            resolver.entity_count(),
            metadata.schema_version,
            unit_scale
        );

        Ok(Self {
            resolver,
            schema,
            unit_scale,
            metadata,
        })
    }
}

impl IfcModel for ParsedModel {
    fn resolver(&self) -> &dyn EntityResolver {
        self.resolver.as_ref()
    }

    fn schema(&self) -> &dyn SchemaIntrospector {
        self.schema.as_ref()
    }

    fn unit_scale(&self) -> f64 {
        self.unit_scale
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_rdf_model::SchemaIntrospectorExt;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_NAME('test.ifc','2024-01-01T00:00:00',('Author'),('Org'),'Preprocessor','App','');
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
#1=IFCPROJECT('guid',$,'Test Project',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT((#3));
#3=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
#4=IFCSITE('guid2',$,'Site',$,$,$,$,$,$,$,$,$,$,$);
#5=IFCRELAGGREGATES('guid3',$,$,$,#1,(#4));
#10=IFCWALL('guid8',$,'Wall 1',$,$,$,$,$);
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_parse_model() {
        let model = ParsedModel::parse(TEST_IFC).unwrap();

        assert_eq!(model.metadata().schema_version, "IFC2X3");
        assert_eq!(model.metadata().file_name, Some("test.ifc".to_string()));
        assert!((model.unit_scale() - 0.001).abs() < 1e-10);

        let walls = model.resolver().instances_of("IFCWALL");
        assert_eq!(walls.len(), 1);
        assert_eq!(model.schema().schema_name(), "IFC2X3");
    }

    #[test]
    fn test_named_attribute_access() {
        let model = ParsedModel::parse(TEST_IFC).unwrap();
        let rel = model.resolver().instances_of("IfcRelAggregates")[0].clone();
        let relating = model.schema().attribute(&rel, "RelatingObject").unwrap();
        assert_eq!(relating.as_entity_ref().map(|id| id.0), Some(1));
    }

    #[test]
    fn test_rejects_content_without_entities() {
        assert!(matches!(
            ParsedModel::parse("not a step file"),
            Err(ParseError::MissingSection("DATA"))
        ));
        assert!(matches!(
            ParsedModel::parse("ISO-10303-21;\nHEADER;\nENDSEC;\nDATA;\nENDSEC;\n"),
            Err(ParseError::EmptyData)
        ));
    }
}
