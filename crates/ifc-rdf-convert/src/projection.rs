// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity projection
//!
//! Turns every entity whose type is in the conversion map into triples:
//!
//! 1. `rdf:type` for each configured class
//! 2. `rdfs:label` from `Name`
//! 3. cached property and quantity set members
//! 4. configured direct attributes, in declaration order
//! 5. configured inverse attributes, flattened through [`target_attribute`]
//!
//! Each IRI is projected once per run. Referenced entities are only
//! identified, never projected from here.

use crate::cache::PropertyCache;
use crate::identity::{natural_id, IdentityResolver};
use crate::inverse::{target_attribute, InverseChoice, InverseIndex};
use crate::mapping::{ClassMapping, ConversionMap};
use crate::rdf::namespace::{rdf, rdfs};
use crate::rdf::{Graph, Literal};
use ifc_rdf_model::{
    AttributeValue, DecodedEntity, EntityResolver, InverseDecl, SchemaIntrospector,
    SchemaIntrospectorExt,
};
use log::{debug, info};
use rustc_hash::{FxHashMap, FxHashSet};

/// What projecting one entity did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProjectionOutcome {
    /// The entity's type is not in the conversion map
    Unmapped,
    /// The entity's IRI was projected earlier in this run
    AlreadyProjected,
    /// The entity was projected; `triples` counts the new triples
    Projected { uri: String, triples: usize },
}

/// Read-only inputs shared by every projection in a run
#[derive(Clone, Copy)]
pub struct ProjectionContext<'a> {
    pub resolver: &'a dyn EntityResolver,
    pub schema: &'a dyn SchemaIntrospector,
    pub mapping: &'a ConversionMap,
    pub cache: &'a PropertyCache,
    pub inverses: &'a InverseIndex,
}

/// Projects entities into a graph, remembering which IRIs are done
pub struct Projector<'a> {
    ctx: ProjectionContext<'a>,
    created: FxHashSet<String>,
    /// (reference type, back reference) -> flattening choice
    choices: FxHashMap<(String, String), InverseChoice>,
}

impl<'a> Projector<'a> {
    pub fn new(ctx: ProjectionContext<'a>) -> Self {
        Self {
            ctx,
            created: FxHashSet::default(),
            choices: FxHashMap::default(),
        }
    }

    /// Number of distinct IRIs projected so far
    pub fn projected_count(&self) -> usize {
        self.created.len()
    }

    /// Whether `uri` has been projected
    pub fn is_projected(&self, uri: &str) -> bool {
        self.created.contains(uri)
    }

    /// Project every entity of the model in file order
    pub fn project_all(&mut self, identities: &mut IdentityResolver, graph: &mut Graph) -> usize {
        info!("Creating RDF entities...");
        let resolver = self.ctx.resolver;
        let mut projected = 0;

        for id in resolver.ids() {
            let Some(entity) = resolver.get(id) else {
                continue;
            };
            if let ProjectionOutcome::Projected { .. } = self.project(&entity, identities, graph) {
                projected += 1;
            }
        }

        info!("Created {} RDF entities ({} triples)", projected, graph.len());
        projected
    }

    /// Project one entity
    pub fn project(
        &mut self,
        entity: &DecodedEntity,
        identities: &mut IdentityResolver,
        graph: &mut Graph,
    ) -> ProjectionOutcome {
        let ctx = self.ctx;
        let Some(rules) = ctx.mapping.class_mapping(entity.ifc_type.name()) else {
            return ProjectionOutcome::Unmapped;
        };

        let identity = identities.resolve(entity, ctx.schema);
        if !self.created.insert(identity.uri.clone()) {
            return ProjectionOutcome::AlreadyProjected;
        }

        let uri = identity.uri;
        let before = graph.len();

        for class in &rules.class {
            graph.add_iri(&uri, rdf::TYPE, class);
        }

        if let Some(name) = label(entity, ctx.schema) {
            graph.add_literal(&uri, rdfs::LABEL, Literal::string(name));
        }

        self.add_cached_properties(entity, &uri, graph);
        self.add_direct_attributes(entity, rules, &uri, identities, graph);
        self.add_inverse_attributes(entity, rules, &uri, identities, graph);

        ProjectionOutcome::Projected {
            triples: graph.len() - before,
            uri,
        }
    }

    fn add_cached_properties(&self, entity: &DecodedEntity, uri: &str, graph: &mut Graph) {
        let ctx = self.ctx;
        let Some(sets) = natural_id(entity, ctx.schema).and_then(|gid| ctx.cache.get(gid)) else {
            return;
        };

        let configured = sets
            .psets
            .iter()
            .filter_map(|set| ctx.mapping.pset(&set.name).map(|preds| (set, preds)))
            .chain(
                sets.qsets
                    .iter()
                    .filter_map(|set| ctx.mapping.qset(&set.name).map(|preds| (set, preds))),
            );

        for (set, predicates) in configured {
            for (member, predicate) in predicates {
                if let Some(value) = set.get(member) {
                    graph.add_literal(uri, predicate, value.to_literal());
                }
            }
        }
    }

    fn add_direct_attributes(
        &self,
        entity: &DecodedEntity,
        rules: &ClassMapping,
        uri: &str,
        identities: &mut IdentityResolver,
        graph: &mut Graph,
    ) {
        if rules.attrs.is_empty() {
            return;
        }
        let ctx = self.ctx;

        for decl in ctx.schema.attributes_of(entity.ifc_type.name()) {
            let Some(predicate) = rules.attrs.get(&decl.name) else {
                continue;
            };

            let value = match entity.get(decl.index) {
                Some(value) if !value.is_null() && !value.is_derived() => value,
                _ => {
                    if !decl.optional {
                        debug!("{} has no value for mandatory {}", entity.id, decl.name);
                    }
                    continue;
                }
            };

            match value.unwrap_typed() {
                AttributeValue::Bool(b) => {
                    graph.add_literal(uri, predicate, Literal::boolean(*b));
                }
                AttributeValue::Integer(i) => {
                    graph.add_literal(uri, predicate, Literal::integer(*i));
                }
                AttributeValue::Float(f) => {
                    graph.add_literal(uri, predicate, Literal::float(*f));
                }
                AttributeValue::String(s) | AttributeValue::Enum(s) => {
                    graph.add_literal(uri, predicate, Literal::string(s.as_str()));
                }
                AttributeValue::EntityRef(id) => {
                    let Some(target) = ctx.resolver.get(*id) else {
                        debug!("{}.{} references missing {}", entity.id, decl.name, id);
                        continue;
                    };
                    if ctx.mapping.is_mapped(target.ifc_type.name()) {
                        let target_uri = identities.resolve(&target, ctx.schema).uri;
                        graph.add_iri(uri, predicate, &target_uri);
                    }
                }
                _ => {}
            }
        }
    }

    fn add_inverse_attributes(
        &mut self,
        entity: &DecodedEntity,
        rules: &ClassMapping,
        uri: &str,
        identities: &mut IdentityResolver,
        graph: &mut Graph,
    ) {
        if rules.inv_attrs.is_empty() {
            return;
        }
        let ctx = self.ctx;

        for inverse in ctx.schema.inverse_relations_of(entity.ifc_type.name()) {
            let Some(predicate) = rules.inv_attrs.get(&inverse.name) else {
                continue;
            };

            let target = match self.choice(&inverse) {
                InverseChoice::Attribute(decl) => decl,
                InverseChoice::TooComplex(count) => {
                    debug!(
                        "Skipping {}.{}: {} has {} candidate attributes",
                        entity.ifc_type, inverse.name, inverse.reference_type, count
                    );
                    continue;
                }
                InverseChoice::NoCandidate => continue,
            };

            for relation in ctx.inverses.resolve(entity, &inverse, ctx.resolver, ctx.schema) {
                match relation.get(target.index) {
                    Some(AttributeValue::List(items)) => {
                        for item in items {
                            self.link(uri, predicate, item, identities, graph);
                        }
                    }
                    Some(value) => self.link(uri, predicate, value, identities, graph),
                    None => debug!("{} has no {}", relation.id, target.name),
                }
            }
        }
    }

    fn choice(&mut self, inverse: &InverseDecl) -> InverseChoice {
        let schema = self.ctx.schema;
        self.choices
            .entry((inverse.reference_type.clone(), inverse.back_reference.clone()))
            .or_insert_with(|| target_attribute(schema, inverse))
            .clone()
    }

    /// `uri predicate <target>` when `value` references a mapped entity
    fn link(
        &self,
        uri: &str,
        predicate: &str,
        value: &AttributeValue,
        identities: &mut IdentityResolver,
        graph: &mut Graph,
    ) {
        let Some(target) = self.ctx.resolver.resolve_ref(value) else {
            return;
        };
        if self.ctx.mapping.is_mapped(target.ifc_type.name()) {
            let target_uri = identities.resolve(&target, self.ctx.schema).uri;
            graph.add_iri(uri, predicate, &target_uri);
        }
    }
}

/// Non-empty `Name`
fn label<'e>(entity: &'e DecodedEntity, schema: &dyn SchemaIntrospector) -> Option<&'e str> {
    let value = if schema.declares(entity.ifc_type.name()) {
        schema.attribute(entity, "Name")
    } else {
        entity.get(2)
    }?;
    value.as_string().filter(|name| !name.is_empty())
}
