// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Schema introspection
//!
//! STEP records are positional: attribute names, optionality and inverse
//! relations live only in the EXPRESS schema. [`SchemaIntrospector`] exposes
//! that information so callers can enumerate an entity type's fields without
//! compile-time knowledge of every IFC type.

use crate::{AttributeValue, DecodedEntity};

/// A declared (explicit) attribute of an entity type
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeDecl {
    /// Attribute name as written in the schema (`GlobalId`, `RelatingObject`)
    pub name: String,
    /// `OPTIONAL` in the schema
    pub optional: bool,
    /// Position in the STEP record, inherited attributes first
    pub index: usize,
}

/// A declared inverse relation of an entity type
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InverseDecl {
    /// Inverse attribute name (`IsDecomposedBy`)
    pub name: String,
    /// Entity type holding the forward reference (`IfcRelAggregates`)
    pub reference_type: String,
    /// Attribute on `reference_type` pointing back at the owner (`RelatingObject`)
    pub back_reference: String,
}

/// Read access to an EXPRESS schema
///
/// All type names are matched case-insensitively, so `IFCWALL` (as written in
/// STEP files) and `IfcWall` (as written in the schema) are the same type.
pub trait SchemaIntrospector: Send + Sync {
    /// Schema identifier (e.g., "IFC4")
    fn schema_name(&self) -> &str;

    /// Schema spelling of a type name, `None` when the type is not declared
    fn canonical_name(&self, type_name: &str) -> Option<&str>;

    /// Explicit attributes in declaration order, supertypes first
    fn attributes_of(&self, type_name: &str) -> Vec<AttributeDecl>;

    /// Inverse relations, including those inherited from supertypes
    fn inverse_relations_of(&self, type_name: &str) -> Vec<InverseDecl>;

    /// Whether `type_name` is `ancestor` or one of its subtypes
    fn is_subtype_of(&self, type_name: &str, ancestor: &str) -> bool;

    /// Whether the schema declares this type
    fn declares(&self, type_name: &str) -> bool {
        self.canonical_name(type_name).is_some()
    }
}

/// Named attribute access built on [`SchemaIntrospector`]
pub trait SchemaIntrospectorExt: SchemaIntrospector {
    /// Record position of a named attribute
    fn attribute_index(&self, type_name: &str, attribute: &str) -> Option<usize> {
        self.attributes_of(type_name)
            .into_iter()
            .find(|decl| decl.name == attribute)
            .map(|decl| decl.index)
    }

    /// Read a named attribute from a decoded entity
    ///
    /// Returns `None` when the type does not declare the attribute or when the
    /// record is too short to hold it.
    fn attribute<'e>(&self, entity: &'e DecodedEntity, attribute: &str) -> Option<&'e AttributeValue> {
        self.attribute_index(entity.ifc_type.name(), attribute)
            .and_then(|index| entity.get(index))
    }
}

impl<T: SchemaIntrospector + ?Sized> SchemaIntrospectorExt for T {}
