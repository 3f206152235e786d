// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for IFC data representation
//!
//! Entities are read-only records decoded from a STEP file. The converter never
//! creates or mutates them; everything it emits is derived from these values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type-safe entity identifier
///
/// Wraps the raw STEP instance name (e.g., #123 becomes EntityId(123))
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize, Default,
)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        EntityId(id)
    }
}

macro_rules! ifc_types {
    ($( $(#[$doc:meta])* $variant:ident ),* $(,)?) => {
        /// IFC entity type enumeration
        ///
        /// Only the types matched on in code get a variant. Everything else
        /// keeps its file spelling in [`IfcType::Unknown`] and is compared
        /// by name with [`IfcType::is`].
        #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
        pub enum IfcType {
            $( $(#[$doc])* $variant, )*
            /// Unknown type - stores the original type name string
            Unknown(String),
        }

        impl IfcType {
            const KNOWN: &'static [(&'static str, IfcType)] = &[
                $( (stringify!($variant), IfcType::$variant), )*
            ];

            /// Schema spelling of the type (`IfcWall`), or the original text for unknown types
            pub fn name(&self) -> &str {
                match self {
                    $( IfcType::$variant => stringify!($variant), )*
                    IfcType::Unknown(s) => s,
                }
            }
        }
    };
}

ifc_types! {
    IfcProject,
    IfcSite,
    IfcBuilding,
    IfcBuildingStorey,
    IfcSpace,
    IfcWall,
    IfcSlab,

    // Shape and placement
    IfcProductDefinitionShape,
    IfcMappedItem,
    IfcLocalPlacement,
    IfcAxis2Placement2D,
    IfcAxis2Placement3D,
    IfcCartesianPoint,
    IfcDirection,
    IfcCartesianTransformationOperator3D,
    IfcCartesianTransformationOperator3DnonUniform,

    // Items the tessellator understands
    IfcExtrudedAreaSolid,
    IfcFacetedBrep,
    IfcFacetedBrepWithVoids,
    IfcShellBasedSurfaceModel,
    IfcTriangulatedFaceSet,
    IfcPolygonalFaceSet,
    IfcIndexedPolygonalFaceWithVoids,
    IfcFaceOuterBound,
    IfcPolyLoop,
    IfcBooleanResult,
    IfcBooleanClippingResult,
    IfcRectangleProfileDef,
    IfcCircleProfileDef,
    IfcCircleHollowProfileDef,
    IfcArbitraryClosedProfileDef,
    IfcArbitraryProfileDefWithVoids,
    IfcPolyline,
    IfcIndexedPolyCurve,

    // Units
    IfcSIUnit,
    IfcConversionBasedUnit,
    IfcMeasureWithUnit,
}

impl IfcType {
    /// Parse a type name, ignoring case (`IFCWALL`, `IfcWall` and `ifcwall` agree)
    pub fn parse(s: &str) -> Self {
        Self::KNOWN
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
            .map(|(_, ty)| ty.clone())
            .unwrap_or_else(|| IfcType::Unknown(s.to_string()))
    }

    /// Case-insensitive comparison against a type name
    pub fn is(&self, name: &str) -> bool {
        self.name().eq_ignore_ascii_case(name)
    }
}

impl Default for IfcType {
    fn default() -> Self {
        IfcType::Unknown(String::new())
    }
}

impl fmt::Display for IfcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One parameter of a STEP record
#[derive(Clone, Debug, PartialEq, Default)]
pub enum AttributeValue {
    /// `$`
    #[default]
    Null,
    /// `*`
    Derived,
    /// `#123`
    EntityRef(EntityId),
    /// `.T.` / `.F.`
    Bool(bool),
    Integer(i64),
    Float(f64),
    /// Decoded string, escapes resolved
    String(String),
    /// `.VALUE.` other than booleans, without the dots
    Enum(String),
    List(Vec<AttributeValue>),
    /// `IFCLABEL('text')`: type name and arguments
    TypedValue(String, Vec<AttributeValue>),
}

impl AttributeValue {
    pub fn as_entity_ref(&self) -> Option<EntityId> {
        match self {
            AttributeValue::EntityRef(id) => Some(*id),
            _ => None,
        }
    }

    /// String content, looking through a typed wrapper
    pub fn as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            AttributeValue::TypedValue(_, args) if !args.is_empty() => args[0].as_string(),
            _ => None,
        }
    }

    /// Real content; integers widen
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::Integer(i) => Some(*i as f64),
            AttributeValue::TypedValue(_, args) if !args.is_empty() => args[0].as_float(),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// `.T.`/`.F.`, also when decoded as an enumeration
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            AttributeValue::Enum(s) => match s.to_uppercase().as_str() {
                "TRUE" | "T" => Some(true),
                "FALSE" | "F" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&str> {
        match self {
            AttributeValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::List(list) => Some(list),
            _ => None,
        }
    }

    /// Strip a `TypedValue` wrapper, yielding the wrapped value
    ///
    /// `IFCBOOLEAN(.T.)` unwraps to `Bool(true)`, `IFCLABEL('x')` to `String("x")`.
    /// Values that are not wrapped are returned unchanged.
    pub fn unwrap_typed(&self) -> &AttributeValue {
        match self {
            AttributeValue::TypedValue(_, args) if args.len() == 1 => args[0].unwrap_typed(),
            other => other,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    pub fn is_derived(&self) -> bool {
        matches!(self, AttributeValue::Derived)
    }

    /// Visit every entity reference in this value, descending into lists and typed values
    pub fn for_each_ref(&self, f: &mut impl FnMut(EntityId)) {
        match self {
            AttributeValue::EntityRef(id) => f(*id),
            AttributeValue::List(items) | AttributeValue::TypedValue(_, items) => {
                for item in items {
                    item.for_each_ref(f);
                }
            }
            _ => {}
        }
    }
}

/// A decoded STEP record
///
/// Attributes are positional. `get(i)` returning `None` means the record has
/// fewer than `i + 1` attributes, which callers treat like `$`.
#[derive(Clone, Debug)]
pub struct DecodedEntity {
    pub id: EntityId,
    pub ifc_type: IfcType,
    pub attributes: Vec<AttributeValue>,
}

impl DecodedEntity {
    pub fn get(&self, index: usize) -> Option<&AttributeValue> {
        self.attributes.get(index)
    }

    pub fn get_ref(&self, index: usize) -> Option<EntityId> {
        self.get(index).and_then(|v| v.as_entity_ref())
    }

    pub fn get_string(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(|v| v.as_string())
    }

    pub fn get_float(&self, index: usize) -> Option<f64> {
        self.get(index).and_then(|v| v.as_float())
    }

    pub fn get_list(&self, index: usize) -> Option<&[AttributeValue]> {
        self.get(index).and_then(|v| v.as_list())
    }

    pub fn get_bool(&self, index: usize) -> Option<bool> {
        self.get(index).and_then(|v| v.as_bool())
    }

    pub fn get_enum(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(|v| v.as_enum())
    }

    /// References in the list at `index`; other members are dropped
    pub fn get_refs(&self, index: usize) -> Option<Vec<EntityId>> {
        self.get_list(index)
            .map(|list| list.iter().filter_map(|v| v.as_entity_ref()).collect())
    }
}

/// Values read from the HEADER section
#[derive(Clone, Debug, Default, Serialize)]
pub struct ModelMetadata {
    /// First `FILE_SCHEMA` entry as written (`IFC2X3`, `IFC4`, `IFC4X3`)
    pub schema_version: String,
    pub originating_system: Option<String>,
    pub preprocessor_version: Option<String>,
    pub file_name: Option<String>,
    pub author: Option<String>,
    pub organization: Option<String>,
    pub timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(IfcType::parse("IFCWALL"), IfcType::IfcWall);
        assert_eq!(IfcType::parse("ifcbuildingstorey"), IfcType::IfcBuildingStorey);
        assert_eq!(IfcType::parse("IfcSIUnit"), IfcType::IfcSIUnit);
    }

    #[test]
    fn test_name_uses_schema_spelling() {
        assert_eq!(IfcType::parse("IFCBUILDINGSTOREY").name(), "IfcBuildingStorey");
        assert_eq!(IfcType::IfcMappedItem.to_string(), "IfcMappedItem");
    }

    #[test]
    fn test_unknown_type_keeps_spelling() {
        let ty = IfcType::parse("IFCFLOWSEGMENT");
        assert_eq!(ty, IfcType::Unknown("IFCFLOWSEGMENT".to_string()));
        assert!(ty.is("IfcFlowSegment"));
    }

    #[test]
    fn test_unwrap_typed() {
        let wrapped = AttributeValue::TypedValue(
            "IFCBOOLEAN".to_string(),
            vec![AttributeValue::Bool(true)],
        );
        assert_eq!(wrapped.unwrap_typed(), &AttributeValue::Bool(true));
        assert_eq!(AttributeValue::Integer(3).unwrap_typed(), &AttributeValue::Integer(3));
    }

    #[test]
    fn test_for_each_ref_descends_into_lists() {
        let value = AttributeValue::List(vec![
            AttributeValue::EntityRef(EntityId(1)),
            AttributeValue::List(vec![AttributeValue::EntityRef(EntityId(7))]),
            AttributeValue::String("x".into()),
        ]);
        let mut seen = Vec::new();
        value.for_each_ref(&mut |id| seen.push(id));
        assert_eq!(seen, vec![EntityId(1), EntityId(7)]);
    }
}
