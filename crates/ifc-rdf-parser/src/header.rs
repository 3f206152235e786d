// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HEADER section

use crate::tokenizer::{parameter_list, Token};
use ifc_rdf_model::ModelMetadata;

/// Byte offset just after the `DATA;` keyword
pub fn data_section_start(content: &str) -> Option<usize> {
    let header_end = content.find("ENDSEC;").unwrap_or(0);
    content[header_end..]
        .find("DATA;")
        .map(|p| header_end + p + "DATA;".len())
}

/// Read `FILE_SCHEMA` and `FILE_NAME`
///
/// Missing or malformed header records leave the matching fields empty.
pub fn parse_header(content: &str) -> ModelMetadata {
    let begin = content.find("HEADER;").unwrap_or(0);
    let end = content[begin..]
        .find("ENDSEC;")
        .map_or(content.len(), |p| begin + p);
    let header = &content[begin..end];

    let mut metadata = ModelMetadata::default();

    if let Some(params) = record(header, "FILE_SCHEMA") {
        if let Some(Token::List(names)) = params.first() {
            metadata.schema_version = names.first().and_then(text).unwrap_or_default();
        }
    }

    // name, time_stamp, (author), (organization), preprocessor_version,
    // originating_system, authorization
    if let Some(params) = record(header, "FILE_NAME") {
        let field = |i: usize| params.get(i).and_then(text);
        let first_of = |i: usize| match params.get(i) {
            Some(Token::List(items)) => items.iter().find_map(text),
            _ => None,
        };
        metadata.file_name = field(0);
        metadata.timestamp = field(1);
        metadata.author = first_of(2);
        metadata.organization = first_of(3);
        metadata.preprocessor_version = field(4);
        metadata.originating_system = field(5);
    }

    metadata
}

fn text(token: &Token<'_>) -> Option<String> {
    match token {
        Token::String(s) if !s.is_empty() => Some(s.to_string()),
        _ => None,
    }
}

fn record<'h>(header: &'h str, keyword: &str) -> Option<Vec<Token<'h>>> {
    let start = header.find(keyword)? + keyword.len();
    parameter_list(&header[start..]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = r#"ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [ReferenceView]'),'2;1');
FILE_NAME('house.ifc','2025-03-14T09:26:53',('J. Doe',''),('ACME'),'pre 1.2','Modeller 7','');
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPERSON($,$,$,$,$,$,$,$);
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_file_name_fields() {
        let metadata = parse_header(HEADER);
        assert_eq!(metadata.schema_version, "IFC4");
        assert_eq!(metadata.file_name.as_deref(), Some("house.ifc"));
        assert_eq!(metadata.timestamp.as_deref(), Some("2025-03-14T09:26:53"));
        assert_eq!(metadata.author.as_deref(), Some("J. Doe"));
        assert_eq!(metadata.organization.as_deref(), Some("ACME"));
        assert_eq!(metadata.preprocessor_version.as_deref(), Some("pre 1.2"));
        assert_eq!(metadata.originating_system.as_deref(), Some("Modeller 7"));
    }

    #[test]
    fn test_missing_header_records() {
        let metadata = parse_header("ISO-10303-21;\nHEADER;\nENDSEC;\nDATA;\nENDSEC;\n");
        assert!(metadata.schema_version.is_empty());
        assert!(metadata.file_name.is_none());
    }

    #[test]
    fn test_data_section_start() {
        let start = data_section_start(HEADER).unwrap();
        assert!(HEADER[start..].trim_start().starts_with("#1="));
        assert_eq!(data_section_start("HEADER;\nENDSEC;\n"), None);
    }
}
