// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inverse relations
//!
//! STEP files only store forward references. [`InverseIndex`] records, for
//! every entity, which entities point at it and through which attribute, so
//! that `IsDecomposedBy`, `ContainsElements` and friends can be answered.
//!
//! An inverse attribute is flattened into a single predicate by reading one
//! attribute of each relation object; [`target_attribute`] picks which.

use ifc_rdf_model::{
    AttributeDecl, DecodedEntity, EntityId, EntityResolver, IfcType, InverseDecl,
    SchemaIntrospector,
};
use log::info;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Attribute names that never carry the target of a flattened inverse
pub const INVERSE_STOPLIST: [&str; 11] = [
    "GlobalId",
    "OwnerHistory",
    "Name",
    "Description",
    "RelatedObjectsType",
    "ActingRole",
    "ConnectionGeometry",
    "QuantityInProcess",
    "SequenceType",
    "TimeLag",
    "UserDefinedSequenceType",
];

/// Relation types with more candidate attributes than this are not flattened
pub const MAX_INVERSE_CANDIDATES: usize = 2;

/// Which attribute of the relation objects an inverse resolves to
#[derive(Clone, Debug, PartialEq)]
pub enum InverseChoice {
    /// Read this attribute of every relation object
    Attribute(AttributeDecl),
    /// The relation type has this many candidate attributes
    TooComplex(usize),
    /// The relation type has no candidate attribute
    NoCandidate,
}

/// Pick the attribute an inverse relation is flattened to
///
/// Candidates are the attributes of `reference_type` (inherited ones
/// included) minus [`INVERSE_STOPLIST`]. With one candidate it is taken;
/// with two, the one that is not the back reference; with more, the relation
/// is skipped.
pub fn target_attribute(schema: &dyn SchemaIntrospector, inverse: &InverseDecl) -> InverseChoice {
    let candidates: Vec<AttributeDecl> = schema
        .attributes_of(&inverse.reference_type)
        .into_iter()
        .filter(|decl| !INVERSE_STOPLIST.contains(&decl.name.as_str()))
        .collect();

    match candidates.len() {
        0 => InverseChoice::NoCandidate,
        1 => candidates
            .into_iter()
            .next()
            .map_or(InverseChoice::NoCandidate, InverseChoice::Attribute),
        n if n > MAX_INVERSE_CANDIDATES => InverseChoice::TooComplex(n),
        _ => candidates
            .into_iter()
            .find(|decl| decl.name != inverse.back_reference)
            .map_or(InverseChoice::NoCandidate, InverseChoice::Attribute),
    }
}

/// Referenced entity -> attribute name -> referencing entities
#[derive(Debug, Default)]
pub struct InverseIndex {
    refs: FxHashMap<EntityId, FxHashMap<String, Vec<EntityId>>>,
}

impl InverseIndex {
    /// Index every reference held by an entity of a declared type
    pub fn build(resolver: &dyn EntityResolver, schema: &dyn SchemaIntrospector) -> Self {
        let mut index = Self::default();
        let mut declarations: FxHashMap<IfcType, Vec<AttributeDecl>> = FxHashMap::default();

        for id in resolver.ids() {
            let Some(entity) = resolver.get(id) else {
                continue;
            };
            let attributes = declarations
                .entry(entity.ifc_type.clone())
                .or_insert_with(|| schema.attributes_of(entity.ifc_type.name()));
            if attributes.is_empty() {
                continue;
            }

            for decl in attributes.iter() {
                if let Some(value) = entity.get(decl.index) {
                    value.for_each_ref(&mut |target| index.insert(target, &decl.name, id));
                }
            }
        }

        info!("Indexed inverse references for {} entities", index.refs.len());
        index
    }

    fn insert(&mut self, target: EntityId, attribute: &str, source: EntityId) {
        let sources = self
            .refs
            .entry(target)
            .or_default()
            .entry(attribute.to_string())
            .or_default();
        if sources.last() != Some(&source) {
            sources.push(source);
        }
    }

    /// Entities whose `attribute` references `target`, in file order
    pub fn referencing(&self, target: EntityId, attribute: &str) -> &[EntityId] {
        self.refs
            .get(&target)
            .and_then(|by_attribute| by_attribute.get(attribute))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Relation objects of `inverse` for `entity`
    pub fn resolve(
        &self,
        entity: &DecodedEntity,
        inverse: &InverseDecl,
        resolver: &dyn EntityResolver,
        schema: &dyn SchemaIntrospector,
    ) -> Vec<Arc<DecodedEntity>> {
        self.referencing(entity.id, &inverse.back_reference)
            .iter()
            .filter_map(|&id| resolver.get(id))
            .filter(|rel| schema.is_subtype_of(rel.ifc_type.name(), &inverse.reference_type))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_rdf_model::{IfcModel, SchemaIntrospectorExt};
    use ifc_rdf_parser::schema::{inv, opt, req, EntityDef};
    use ifc_rdf_parser::{ParsedModel, StaticSchema};

    /// Three synthetic relation types with one, two and three candidates
    static RELATIONS: &[EntityDef] = &[
        EntityDef {
            name: "IfcRoot",
            supertype: None,
            attributes: &[req("GlobalId"), opt("OwnerHistory"), opt("Name"), opt("Description")],
            inverses: &[],
        },
        EntityDef {
            name: "IfcThing",
            supertype: Some("IfcRoot"),
            attributes: &[],
            inverses: &[
                inv("Tagged", "IfcRelOne", "RelatingThing"),
                inv("PairedWith", "IfcRelTwo", "RelatingThing"),
                inv("Tangled", "IfcRelThree", "RelatingThing"),
            ],
        },
        EntityDef {
            name: "IfcRelOne",
            supertype: Some("IfcRoot"),
            attributes: &[req("RelatingThing"), opt("TimeLag")],
            inverses: &[],
        },
        EntityDef {
            name: "IfcRelTwo",
            supertype: Some("IfcRoot"),
            attributes: &[req("RelatedThings"), req("RelatingThing")],
            inverses: &[],
        },
        EntityDef {
            name: "IfcRelThree",
            supertype: Some("IfcRoot"),
            attributes: &[req("RelatingThing"), req("RelatedThings"), req("Weight")],
            inverses: &[],
        },
    ];

    fn schema() -> StaticSchema {
        StaticSchema::new("TEST", RELATIONS)
    }

    fn inverse(schema: &StaticSchema, name: &str) -> InverseDecl {
        schema
            .inverse_relations_of("IfcThing")
            .into_iter()
            .find(|decl| decl.name == name)
            .unwrap()
    }

    #[test]
    fn test_single_candidate_is_taken() {
        let schema = schema();
        match target_attribute(&schema, &inverse(&schema, "Tagged")) {
            InverseChoice::Attribute(decl) => assert_eq!(decl.name, "RelatingThing"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_two_candidates_pick_the_far_side() {
        let schema = schema();
        match target_attribute(&schema, &inverse(&schema, "PairedWith")) {
            InverseChoice::Attribute(decl) => {
                assert_eq!(decl.name, "RelatedThings");
                assert_eq!(decl.index, 4);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_three_candidates_are_too_complex() {
        let schema = schema();
        assert_eq!(
            target_attribute(&schema, &inverse(&schema, "Tangled")),
            InverseChoice::TooComplex(3)
        );
    }

    #[test]
    fn test_ifc_aggregation_flattens_to_related_objects() {
        let schema = StaticSchema::ifc("IFC4");
        let decomposed_by = schema
            .inverse_relations_of("IfcBuilding")
            .into_iter()
            .find(|decl| decl.name == "IsDecomposedBy")
            .unwrap();
        match target_attribute(&schema, &decomposed_by) {
            InverseChoice::Attribute(decl) => assert_eq!(decl.name, "RelatedObjects"),
            other => panic!("unexpected {:?}", other),
        }
    }

    const AGGREGATION: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCBUILDING('b',$,'B',$,$,$,$,$,$,$,$,$);
#2=IFCBUILDINGSTOREY('s1',$,'S1',$,$,$,$,$,$,$);
#3=IFCBUILDINGSTOREY('s2',$,'S2',$,$,$,$,$,$,$);
#4=IFCRELAGGREGATES('r',$,$,$,#1,(#2,#3));
#5=IFCRELNESTS('n',$,$,$,#1,(#3));
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_index_resolves_relations_by_type() {
        let model = ParsedModel::parse(AGGREGATION).unwrap();
        let resolver = model.resolver();
        let schema = model.schema();
        let index = InverseIndex::build(resolver, schema);

        assert_eq!(index.referencing(EntityId(1), "RelatingObject"), &[EntityId(4), EntityId(5)]);
        assert_eq!(index.referencing(EntityId(3), "RelatedObjects"), &[EntityId(4), EntityId(5)]);
        assert!(index.referencing(EntityId(2), "RelatingObject").is_empty());

        let building = resolver.get(EntityId(1)).unwrap();
        let decomposed_by = schema
            .inverse_relations_of("IfcBuilding")
            .into_iter()
            .find(|decl| decl.name == "IsDecomposedBy")
            .unwrap();
        let relations = index.resolve(&building, &decomposed_by, resolver, schema);
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].id, EntityId(4));

        let related = schema.attribute(&relations[0], "RelatedObjects").unwrap();
        assert_eq!(resolver.resolve_ref_list(related).len(), 2);
    }
}
