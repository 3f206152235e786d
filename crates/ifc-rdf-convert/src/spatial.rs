// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! BOT containment triples from `IfcRelAggregates`

use crate::identity::IdentityResolver;
use crate::rdf::namespace::bot;
use crate::rdf::Graph;
use ifc_rdf_model::{EntityResolver, SchemaIntrospector, SchemaIntrospectorExt};
use log::{debug, info};

/// Containment predicate for an aggregated part
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpatialBucket {
    Space,
    Storey,
    Building,
    Zone,
}

impl SpatialBucket {
    /// Classify the type of an aggregated part
    pub fn classify(schema: &dyn SchemaIntrospector, type_name: &str) -> Self {
        if schema.is_subtype_of(type_name, "IfcSpace") {
            SpatialBucket::Space
        } else if schema.is_subtype_of(type_name, "IfcBuildingStorey") {
            SpatialBucket::Storey
        } else if schema.is_subtype_of(type_name, "IfcBuilding")
            || schema.is_subtype_of(type_name, "IfcFacility")
        {
            SpatialBucket::Building
        } else {
            SpatialBucket::Zone
        }
    }

    /// BOT predicate IRI
    pub fn predicate(self) -> &'static str {
        match self {
            SpatialBucket::Space => bot::HAS_SPACE,
            SpatialBucket::Storey => bot::HAS_STOREY,
            SpatialBucket::Building => bot::HAS_BUILDING,
            SpatialBucket::Zone => bot::CONTAINS_ZONE,
        }
    }
}

/// Emit one containment triple per part of every spatial aggregation
///
/// Aggregations whose whole is not an `IfcSpatialElement` are ignored.
/// Returns the number of triples added.
pub fn project_spatial(
    resolver: &dyn EntityResolver,
    schema: &dyn SchemaIntrospector,
    identities: &mut IdentityResolver,
    graph: &mut Graph,
) -> usize {
    info!("Creating spatial relationships...");
    let mut added = 0;

    for id in resolver.ids() {
        let Some(rel) = resolver.get(id) else {
            continue;
        };
        if !schema.is_subtype_of(rel.ifc_type.name(), "IfcRelAggregates") {
            continue;
        }

        let Some(whole) = schema
            .attribute(&rel, "RelatingObject")
            .and_then(|attr| resolver.resolve_ref(attr))
        else {
            debug!("{} has no resolvable RelatingObject", rel.id);
            continue;
        };
        if !schema.is_subtype_of(whole.ifc_type.name(), "IfcSpatialElement") {
            continue;
        }

        let parts = schema
            .attribute(&rel, "RelatedObjects")
            .map(|attr| resolver.resolve_ref_list(attr))
            .unwrap_or_default();
        if parts.is_empty() {
            continue;
        }

        let whole_uri = identities.resolve(&whole, schema).uri;
        for part in parts {
            let bucket = SpatialBucket::classify(schema, part.ifc_type.name());
            if bucket == SpatialBucket::Zone {
                debug!("{} ({}) aggregated as zone", part.id, part.ifc_type);
            }
            let part_uri = identities.resolve(&part, schema).uri;
            if graph.add_iri(&whole_uri, bucket.predicate(), &part_uri) {
                added += 1;
            }
        }
    }

    info!("Added {} spatial triples", added);
    added
}
