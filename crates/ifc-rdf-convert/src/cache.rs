// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property and quantity cache
//!
//! One pass over `IfcRelDefinesByProperties` collecting, for every related
//! object's `GlobalId`, the property sets and quantity sets attached to it.
//! The projection engine reads the cache afterwards; nothing writes to it
//! once built.

use crate::identity::natural_id;
use crate::rdf::Literal;
use ifc_rdf_model::{
    AttributeValue, DecodedEntity, EntityId, EntityResolver, SchemaIntrospector,
    SchemaIntrospectorExt,
};
use log::{debug, info};
use rustc_hash::FxHashMap;
use std::fmt;

/// A cached property or quantity value
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl PropertyValue {
    /// Decode an `IfcValue`, unwrapping its defined type
    ///
    /// `None` for unset values and for values that are not scalars.
    pub fn from_attribute(value: &AttributeValue) -> Option<Self> {
        match value.unwrap_typed() {
            AttributeValue::Bool(b) => Some(PropertyValue::Bool(*b)),
            AttributeValue::Integer(i) => Some(PropertyValue::Integer(*i)),
            AttributeValue::Float(f) => Some(PropertyValue::Real(*f)),
            AttributeValue::String(s) => Some(PropertyValue::Text(s.clone())),
            AttributeValue::Enum(e) => Some(PropertyValue::Text(e.clone())),
            _ => None,
        }
    }

    /// Typed literal for the graph
    pub fn to_literal(&self) -> Literal {
        match self {
            PropertyValue::Bool(b) => Literal::boolean(*b),
            PropertyValue::Integer(i) => Literal::integer(*i),
            PropertyValue::Real(f) => Literal::double(*f),
            PropertyValue::Text(s) => Literal::string(s.as_str()),
        }
    }
}

/// One named property or quantity set as attached to an object
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertySet {
    pub name: String,
    /// Member name -> value, in file order
    pub values: Vec<(String, PropertyValue)>,
}

impl PropertySet {
    /// Value of a member by exact name
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

/// Sets attached to one object
#[derive(Clone, Debug, Default)]
pub struct CachedSets {
    pub psets: Vec<PropertySet>,
    pub qsets: Vec<PropertySet>,
}

/// Why a relationship contributed nothing
#[derive(Debug, Clone, PartialEq)]
pub enum CacheSkip {
    /// `RelatingPropertyDefinition` is missing or dangling
    MissingDefinition(EntityId),
    /// The definition is neither a property set nor an element quantity
    UnsupportedDefinition { relation: EntityId, type_name: String },
    /// No related object carries a `GlobalId`
    NoRelatedObjects(EntityId),
}

impl fmt::Display for CacheSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheSkip::MissingDefinition(rel) => {
                write!(f, "{} has no resolvable property definition", rel)
            }
            CacheSkip::UnsupportedDefinition { relation, type_name } => {
                write!(f, "{} defines unsupported {}", relation, type_name)
            }
            CacheSkip::NoRelatedObjects(rel) => {
                write!(f, "{} relates no object with a GlobalId", rel)
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum SetKind {
    Property,
    Quantity,
}

/// `GlobalId` -> attached property and quantity sets
#[derive(Debug, Default)]
pub struct PropertyCache {
    entries: FxHashMap<String, CachedSets>,
}

impl PropertyCache {
    /// Build the cache from every `IfcRelDefinesByProperties` in the model
    ///
    /// Malformed relations are skipped with a debug message.
    pub fn build(resolver: &dyn EntityResolver, schema: &dyn SchemaIntrospector) -> Self {
        info!("Caching IFC properties...");
        let mut cache = Self::default();
        let mut skipped = 0usize;

        for rel in resolver.instances_of("IfcRelDefinesByProperties") {
            if let Err(skip) = cache.add_relation(&rel, resolver, schema) {
                debug!("Skipping property relation: {}", skip);
                skipped += 1;
            }
        }

        info!(
            "Cached properties for {} objects ({} relations skipped)",
            cache.entries.len(),
            skipped
        );
        cache
    }

    /// Cache one relationship; returns the number of objects it was attached to
    pub fn add_relation(
        &mut self,
        rel: &DecodedEntity,
        resolver: &dyn EntityResolver,
        schema: &dyn SchemaIntrospector,
    ) -> Result<usize, CacheSkip> {
        let definition = schema
            .attribute(rel, "RelatingPropertyDefinition")
            .and_then(|attr| resolver.resolve_ref(attr))
            .ok_or(CacheSkip::MissingDefinition(rel.id))?;

        let type_name = definition.ifc_type.name();
        let (kind, set) = if schema.is_subtype_of(type_name, "IfcElementQuantity") {
            (SetKind::Quantity, read_quantities(&definition, resolver, schema))
        } else if schema.is_subtype_of(type_name, "IfcPropertySet") {
            (SetKind::Property, read_properties(&definition, resolver, schema))
        } else {
            return Err(CacheSkip::UnsupportedDefinition {
                relation: rel.id,
                type_name: type_name.to_string(),
            });
        };

        let related = schema
            .attribute(rel, "RelatedObjects")
            .map(|attr| resolver.resolve_ref_list(attr))
            .unwrap_or_default();

        let mut attached = 0;
        for object in related {
            let Some(global_id) = natural_id(&object, schema) else {
                continue;
            };
            let entry = self.entries.entry(global_id.to_string()).or_default();
            match kind {
                SetKind::Property => entry.psets.push(set.clone()),
                SetKind::Quantity => entry.qsets.push(set.clone()),
            }
            attached += 1;
        }

        if attached == 0 {
            return Err(CacheSkip::NoRelatedObjects(rel.id));
        }
        Ok(attached)
    }

    /// Sets attached to the object with this `GlobalId`
    pub fn get(&self, global_id: &str) -> Option<&CachedSets> {
        self.entries.get(global_id)
    }

    /// Number of objects with at least one set
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn set_name(definition: &DecodedEntity, schema: &dyn SchemaIntrospector) -> String {
    schema
        .attribute(definition, "Name")
        .and_then(|v| v.as_string())
        .unwrap_or_default()
        .to_string()
}

/// `IfcPropertySingleValue` members with a name and a nominal value
fn read_properties(
    pset: &DecodedEntity,
    resolver: &dyn EntityResolver,
    schema: &dyn SchemaIntrospector,
) -> PropertySet {
    let mut set = PropertySet {
        name: set_name(pset, schema),
        values: Vec::new(),
    };

    let members = schema
        .attribute(pset, "HasProperties")
        .map(|attr| resolver.resolve_ref_list(attr))
        .unwrap_or_default();

    for property in members {
        let name = schema.attribute(&property, "Name").and_then(|v| v.as_string());
        let value = schema
            .attribute(&property, "NominalValue")
            .and_then(PropertyValue::from_attribute);
        if let (Some(name), Some(value)) = (name, value) {
            set.values.push((name.to_string(), value));
        }
    }

    set
}

/// Area, length and volume members; other quantity kinds are ignored
fn read_quantities(
    qset: &DecodedEntity,
    resolver: &dyn EntityResolver,
    schema: &dyn SchemaIntrospector,
) -> PropertySet {
    let mut set = PropertySet {
        name: set_name(qset, schema),
        values: Vec::new(),
    };

    let members = schema
        .attribute(qset, "Quantities")
        .map(|attr| resolver.resolve_ref_list(attr))
        .unwrap_or_default();

    for quantity in members {
        let type_name = quantity.ifc_type.name();
        let value_attribute = match schema.canonical_name(type_name).unwrap_or(type_name) {
            "IfcQuantityArea" => "AreaValue",
            "IfcQuantityLength" => "LengthValue",
            "IfcQuantityVolume" => "VolumeValue",
            other => {
                debug!("Ignoring {} in {}", other, set.name);
                continue;
            }
        };
        let name = schema.attribute(&quantity, "Name").and_then(|v| v.as_string());
        let value = schema
            .attribute(&quantity, value_attribute)
            .and_then(|v| v.unwrap_typed().as_float());
        if let (Some(name), Some(value)) = (name, value) {
            set.values.push((name.to_string(), PropertyValue::Real(value)));
        }
    }

    set
}
