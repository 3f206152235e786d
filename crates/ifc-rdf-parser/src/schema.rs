// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Static EXPRESS schema table
//!
//! A declarative subset of the IFC4 schema (plus the IFC4X3 facility types)
//! covering the kernel, the spatial structure, building elements, the
//! relationship entities and the property/quantity definitions. Geometry
//! resources are read positionally by the geometry crate and are not listed.

use ifc_rdf_model::{AttributeDecl, InverseDecl, SchemaIntrospector};
use rustc_hash::FxHashMap;

/// One explicit attribute: name and `OPTIONAL` flag
#[derive(Clone, Copy, Debug)]
pub struct AttrDef {
    pub name: &'static str,
    pub optional: bool,
}

/// One inverse attribute
#[derive(Clone, Copy, Debug)]
pub struct InvDef {
    pub name: &'static str,
    pub reference_type: &'static str,
    pub back_reference: &'static str,
}

/// One entity declaration; attributes are the ones declared locally
#[derive(Clone, Copy, Debug)]
pub struct EntityDef {
    pub name: &'static str,
    pub supertype: Option<&'static str>,
    pub attributes: &'static [AttrDef],
    pub inverses: &'static [InvDef],
}

/// Mandatory attribute
pub const fn req(name: &'static str) -> AttrDef {
    AttrDef { name, optional: false }
}

/// `OPTIONAL` attribute
pub const fn opt(name: &'static str) -> AttrDef {
    AttrDef { name, optional: true }
}

/// Inverse attribute `name : SET OF reference_type FOR back_reference`
pub const fn inv(
    name: &'static str,
    reference_type: &'static str,
    back_reference: &'static str,
) -> InvDef {
    InvDef {
        name,
        reference_type,
        back_reference,
    }
}

macro_rules! def {
    (@super $super:literal) => { Some($super) };
    (@super) => { None };
    ($name:literal $(: $super:literal)? [$($attr:expr),* $(,)?] $(inverse [$($inv:expr),* $(,)?])?) => {
        EntityDef {
            name: $name,
            supertype: def!(@super $($super)?),
            attributes: &[$($attr),*],
            inverses: &[$($($inv),*)?],
        }
    };
}

/// IFC4 entity declarations used by the converter
pub const IFC4_ENTITIES: &[EntityDef] = &[
    // Kernel
    def!("IfcRoot" [req("GlobalId"), opt("OwnerHistory"), opt("Name"), opt("Description")]),
    def!("IfcObjectDefinition": "IfcRoot" [] inverse [
        inv("HasAssignments", "IfcRelAssigns", "RelatedObjects"),
        inv("Nests", "IfcRelNests", "RelatedObjects"),
        inv("IsNestedBy", "IfcRelNests", "RelatingObject"),
        inv("HasContext", "IfcRelDeclares", "RelatedDefinitions"),
        inv("IsDecomposedBy", "IfcRelAggregates", "RelatingObject"),
        inv("Decomposes", "IfcRelAggregates", "RelatedObjects"),
        inv("HasAssociations", "IfcRelAssociates", "RelatedObjects"),
    ]),
    def!("IfcObject": "IfcObjectDefinition" [opt("ObjectType")] inverse [
        inv("IsDeclaredBy", "IfcRelDefinesByObject", "RelatedObjects"),
        inv("Declares", "IfcRelDefinesByObject", "RelatingObject"),
        inv("IsTypedBy", "IfcRelDefinesByType", "RelatedObjects"),
        inv("IsDefinedBy", "IfcRelDefinesByProperties", "RelatedObjects"),
    ]),
    def!("IfcContext": "IfcObjectDefinition" [
        opt("ObjectType"), opt("LongName"), opt("Phase"),
        opt("RepresentationContexts"), opt("UnitsInContext"),
    ] inverse [
        inv("IsDefinedBy", "IfcRelDefinesByProperties", "RelatedObjects"),
        inv("Declares", "IfcRelDeclares", "RelatingContext"),
    ]),
    def!("IfcProject": "IfcContext" []),
    def!("IfcProjectLibrary": "IfcContext" []),
    def!("IfcTypeObject": "IfcObjectDefinition" [opt("ApplicableOccurrence"), opt("HasPropertySets")] inverse [
        inv("Types", "IfcRelDefinesByType", "RelatingType"),
    ]),
    def!("IfcTypeProduct": "IfcTypeObject" [opt("RepresentationMaps"), opt("Tag")]),
    def!("IfcElementType": "IfcTypeProduct" [opt("ElementType")]),
    def!("IfcBuildingElementType": "IfcElementType" []),
    def!("IfcWallType": "IfcBuildingElementType" [req("PredefinedType")]),
    def!("IfcSlabType": "IfcBuildingElementType" [req("PredefinedType")]),
    def!("IfcBeamType": "IfcBuildingElementType" [req("PredefinedType")]),
    def!("IfcColumnType": "IfcBuildingElementType" [req("PredefinedType")]),
    def!("IfcDoorType": "IfcBuildingElementType" [
        req("PredefinedType"), req("OperationType"), opt("ParameterTakesPrecedence"),
        opt("UserDefinedOperationType"),
    ]),
    def!("IfcWindowType": "IfcBuildingElementType" [
        req("PredefinedType"), req("PartitioningType"), opt("ParameterTakesPrecedence"),
        opt("UserDefinedPartitioningType"),
    ]),

    // Products
    def!("IfcProduct": "IfcObject" [opt("ObjectPlacement"), opt("Representation")] inverse [
        inv("ReferencedBy", "IfcRelAssignsToProduct", "RelatingProduct"),
    ]),
    def!("IfcElement": "IfcProduct" [opt("Tag")] inverse [
        inv("FillsVoids", "IfcRelFillsElement", "RelatedBuildingElement"),
        inv("ConnectedTo", "IfcRelConnectsElements", "RelatingElement"),
        inv("IsInterferedByElements", "IfcRelInterferesElements", "RelatedElement"),
        inv("InterferesElements", "IfcRelInterferesElements", "RelatingElement"),
        inv("HasProjections", "IfcRelProjectsElement", "RelatingElement"),
        inv("ReferencedInStructures", "IfcRelReferencedInSpatialStructure", "RelatedElements"),
        inv("HasOpenings", "IfcRelVoidsElement", "RelatingBuildingElement"),
        inv("IsConnectionRealization", "IfcRelConnectsWithRealizingElements", "RealizingElements"),
        inv("ProvidesBoundaries", "IfcRelSpaceBoundary", "RelatedBuildingElement"),
        inv("ConnectedFrom", "IfcRelConnectsElements", "RelatedElement"),
        inv("ContainedInStructure", "IfcRelContainedInSpatialStructure", "RelatedElements"),
        inv("HasCoverings", "IfcRelCoversBldgElements", "RelatingBuildingElement"),
    ]),
    def!("IfcBuildingElement": "IfcElement" []),
    def!("IfcBuiltElement": "IfcElement" []),
    def!("IfcWall": "IfcBuildingElement" [opt("PredefinedType")]),
    def!("IfcWallStandardCase": "IfcWall" []),
    def!("IfcWallElementedCase": "IfcWall" []),
    def!("IfcCurtainWall": "IfcBuildingElement" [opt("PredefinedType")]),
    def!("IfcSlab": "IfcBuildingElement" [opt("PredefinedType")]),
    def!("IfcRoof": "IfcBuildingElement" [opt("PredefinedType")]),
    def!("IfcBeam": "IfcBuildingElement" [opt("PredefinedType")]),
    def!("IfcColumn": "IfcBuildingElement" [opt("PredefinedType")]),
    def!("IfcMember": "IfcBuildingElement" [opt("PredefinedType")]),
    def!("IfcPlate": "IfcBuildingElement" [opt("PredefinedType")]),
    def!("IfcFooting": "IfcBuildingElement" [opt("PredefinedType")]),
    def!("IfcPile": "IfcBuildingElement" [opt("PredefinedType"), opt("ConstructionType")]),
    def!("IfcStair": "IfcBuildingElement" [opt("PredefinedType")]),
    def!("IfcStairFlight": "IfcBuildingElement" [
        opt("NumberOfRisers"), opt("NumberOfTreads"), opt("RiserHeight"),
        opt("TreadLength"), opt("PredefinedType"),
    ]),
    def!("IfcRamp": "IfcBuildingElement" [opt("PredefinedType")]),
    def!("IfcRampFlight": "IfcBuildingElement" [opt("PredefinedType")]),
    def!("IfcRailing": "IfcBuildingElement" [opt("PredefinedType")]),
    def!("IfcChimney": "IfcBuildingElement" [opt("PredefinedType")]),
    def!("IfcShadingDevice": "IfcBuildingElement" [opt("PredefinedType")]),
    def!("IfcBuildingElementProxy": "IfcBuildingElement" [opt("PredefinedType")]),
    def!("IfcCovering": "IfcBuildingElement" [opt("PredefinedType")] inverse [
        inv("CoversSpaces", "IfcRelCoversSpaces", "RelatedCoverings"),
        inv("CoversElements", "IfcRelCoversBldgElements", "RelatedCoverings"),
    ]),
    def!("IfcDoor": "IfcBuildingElement" [
        opt("OverallHeight"), opt("OverallWidth"), opt("PredefinedType"),
        opt("OperationType"), opt("UserDefinedOperationType"),
    ]),
    def!("IfcWindow": "IfcBuildingElement" [
        opt("OverallHeight"), opt("OverallWidth"), opt("PredefinedType"),
        opt("PartitioningType"), opt("UserDefinedPartitioningType"),
    ]),
    def!("IfcElementAssembly": "IfcElement" [opt("AssemblyPlace"), opt("PredefinedType")]),
    def!("IfcFurnishingElement": "IfcElement" []),
    def!("IfcFurniture": "IfcFurnishingElement" [opt("PredefinedType")]),
    def!("IfcDistributionElement": "IfcElement" []),
    def!("IfcDistributionFlowElement": "IfcDistributionElement" []),
    def!("IfcFlowSegment": "IfcDistributionFlowElement" []),
    def!("IfcFlowFitting": "IfcDistributionFlowElement" []),
    def!("IfcFlowTerminal": "IfcDistributionFlowElement" []),
    def!("IfcFeatureElement": "IfcElement" []),
    def!("IfcFeatureElementSubtraction": "IfcFeatureElement" [] inverse [
        inv("VoidsElements", "IfcRelVoidsElement", "RelatedOpeningElement"),
    ]),
    def!("IfcOpeningElement": "IfcFeatureElementSubtraction" [opt("PredefinedType")] inverse [
        inv("HasFillings", "IfcRelFillsElement", "RelatingOpeningElement"),
    ]),

    // Spatial structure
    def!("IfcSpatialElement": "IfcProduct" [opt("LongName")] inverse [
        inv("ContainsElements", "IfcRelContainedInSpatialStructure", "RelatingStructure"),
        inv("ServicedBySystems", "IfcRelServicesBuildings", "RelatedBuildings"),
        inv("ReferencesElements", "IfcRelReferencedInSpatialStructure", "RelatingStructure"),
    ]),
    def!("IfcSpatialStructureElement": "IfcSpatialElement" [opt("CompositionType")]),
    def!("IfcSite": "IfcSpatialStructureElement" [
        opt("RefLatitude"), opt("RefLongitude"), opt("RefElevation"),
        opt("LandTitleNumber"), opt("SiteAddress"),
    ]),
    def!("IfcBuilding": "IfcSpatialStructureElement" [
        opt("ElevationOfRefHeight"), opt("ElevationOfTerrain"), opt("BuildingAddress"),
    ]),
    def!("IfcBuildingStorey": "IfcSpatialStructureElement" [opt("Elevation")]),
    def!("IfcSpace": "IfcSpatialStructureElement" [opt("PredefinedType"), opt("ElevationWithFlooring")] inverse [
        inv("HasCoverings", "IfcRelCoversSpaces", "RelatingSpace"),
        inv("BoundedBy", "IfcRelSpaceBoundary", "RelatingSpace"),
    ]),
    def!("IfcFacility": "IfcSpatialStructureElement" []),
    def!("IfcFacilityPart": "IfcSpatialStructureElement" []),
    def!("IfcBridge": "IfcFacility" [opt("PredefinedType")]),
    def!("IfcRoad": "IfcFacility" [opt("PredefinedType")]),
    def!("IfcRailway": "IfcFacility" [opt("PredefinedType")]),
    def!("IfcSpatialZone": "IfcSpatialElement" [opt("PredefinedType")]),
    def!("IfcExternalSpatialElement": "IfcSpatialElement" [opt("PredefinedType")]),

    // Groups, actors, processes
    def!("IfcGroup": "IfcObject" [] inverse [
        inv("IsGroupedBy", "IfcRelAssignsToGroup", "RelatingGroup"),
    ]),
    def!("IfcSystem": "IfcGroup" [] inverse [
        inv("ServicesBuildings", "IfcRelServicesBuildings", "RelatingSystem"),
    ]),
    def!("IfcZone": "IfcSystem" [opt("LongName")]),
    def!("IfcActor": "IfcObject" [req("TheActor")] inverse [
        inv("IsActingUpon", "IfcRelAssignsToActor", "RelatingActor"),
    ]),
    def!("IfcProcess": "IfcObject" [opt("Identification"), opt("LongDescription")] inverse [
        inv("IsPredecessorTo", "IfcRelSequence", "RelatingProcess"),
        inv("IsSuccessorFrom", "IfcRelSequence", "RelatedProcess"),
        inv("OperatesOn", "IfcRelAssignsToProcess", "RelatingProcess"),
    ]),
    def!("IfcTask": "IfcProcess" [
        opt("Status"), opt("WorkMethod"), req("IsMilestone"), opt("Priority"),
        opt("TaskTime"), opt("PredefinedType"),
    ]),

    // Relationships
    def!("IfcRelationship": "IfcRoot" []),
    def!("IfcRelDecomposes": "IfcRelationship" []),
    def!("IfcRelAggregates": "IfcRelDecomposes" [req("RelatingObject"), req("RelatedObjects")]),
    def!("IfcRelNests": "IfcRelDecomposes" [req("RelatingObject"), req("RelatedObjects")]),
    def!("IfcRelVoidsElement": "IfcRelDecomposes" [req("RelatingBuildingElement"), req("RelatedOpeningElement")]),
    def!("IfcRelProjectsElement": "IfcRelDecomposes" [req("RelatingElement"), req("RelatedFeatureElement")]),
    def!("IfcRelConnects": "IfcRelationship" []),
    def!("IfcRelContainedInSpatialStructure": "IfcRelConnects" [req("RelatedElements"), req("RelatingStructure")]),
    def!("IfcRelReferencedInSpatialStructure": "IfcRelConnects" [req("RelatedElements"), req("RelatingStructure")]),
    def!("IfcRelFillsElement": "IfcRelConnects" [req("RelatingOpeningElement"), req("RelatedBuildingElement")]),
    def!("IfcRelConnectsElements": "IfcRelConnects" [
        opt("ConnectionGeometry"), req("RelatingElement"), req("RelatedElement"),
    ]),
    def!("IfcRelConnectsPathElements": "IfcRelConnectsElements" [
        req("RelatingPriorities"), req("RelatedPriorities"),
        req("RelatedConnectionType"), req("RelatingConnectionType"),
    ]),
    def!("IfcRelConnectsWithRealizingElements": "IfcRelConnectsElements" [
        req("RealizingElements"), opt("ConnectionType"),
    ]),
    def!("IfcRelInterferesElements": "IfcRelConnects" [
        req("RelatingElement"), req("RelatedElement"), opt("InterferenceGeometry"),
        opt("InterferenceType"), req("ImpliedOrder"),
    ]),
    def!("IfcRelSpaceBoundary": "IfcRelConnects" [
        req("RelatingSpace"), req("RelatedBuildingElement"), opt("ConnectionGeometry"),
        req("PhysicalOrVirtualBoundary"), req("InternalOrExternalBoundary"),
    ]),
    def!("IfcRelCoversBldgElements": "IfcRelConnects" [req("RelatingBuildingElement"), req("RelatedCoverings")]),
    def!("IfcRelCoversSpaces": "IfcRelConnects" [req("RelatingSpace"), req("RelatedCoverings")]),
    def!("IfcRelServicesBuildings": "IfcRelConnects" [req("RelatingSystem"), req("RelatedBuildings")]),
    def!("IfcRelSequence": "IfcRelConnects" [
        req("RelatingProcess"), req("RelatedProcess"), opt("TimeLag"),
        opt("SequenceType"), opt("UserDefinedSequenceType"),
    ]),
    def!("IfcRelAssigns": "IfcRelationship" [req("RelatedObjects"), opt("RelatedObjectsType")]),
    def!("IfcRelAssignsToGroup": "IfcRelAssigns" [req("RelatingGroup")]),
    def!("IfcRelAssignsToProduct": "IfcRelAssigns" [req("RelatingProduct")]),
    def!("IfcRelAssignsToActor": "IfcRelAssigns" [req("RelatingActor"), opt("ActingRole")]),
    def!("IfcRelAssignsToProcess": "IfcRelAssigns" [req("RelatingProcess"), opt("QuantityInProcess")]),
    def!("IfcRelDefines": "IfcRelationship" []),
    def!("IfcRelDefinesByProperties": "IfcRelDefines" [req("RelatedObjects"), req("RelatingPropertyDefinition")]),
    def!("IfcRelDefinesByType": "IfcRelDefines" [req("RelatedObjects"), req("RelatingType")]),
    def!("IfcRelDefinesByObject": "IfcRelDefines" [req("RelatedObjects"), req("RelatingObject")]),
    def!("IfcRelDeclares": "IfcRelationship" [req("RelatingContext"), req("RelatedDefinitions")]),
    def!("IfcRelAssociates": "IfcRelationship" [req("RelatedObjects")]),
    def!("IfcRelAssociatesMaterial": "IfcRelAssociates" [req("RelatingMaterial")]),
    def!("IfcRelAssociatesClassification": "IfcRelAssociates" [req("RelatingClassification")]),

    // Property and quantity definitions
    def!("IfcPropertyDefinition": "IfcRoot" []),
    def!("IfcPropertySetDefinition": "IfcPropertyDefinition" [] inverse [
        inv("DefinesOccurrence", "IfcRelDefinesByProperties", "RelatingPropertyDefinition"),
    ]),
    def!("IfcPropertySet": "IfcPropertySetDefinition" [req("HasProperties")]),
    def!("IfcQuantitySet": "IfcPropertySetDefinition" []),
    def!("IfcElementQuantity": "IfcQuantitySet" [opt("MethodOfMeasurement"), req("Quantities")]),
    def!("IfcPropertyAbstraction" []),
    def!("IfcProperty": "IfcPropertyAbstraction" [req("Name"), opt("Description")]),
    def!("IfcSimpleProperty": "IfcProperty" []),
    def!("IfcPropertySingleValue": "IfcSimpleProperty" [opt("NominalValue"), opt("Unit")]),
    def!("IfcPropertyEnumeratedValue": "IfcSimpleProperty" [opt("EnumerationValues"), opt("EnumerationReference")]),
    def!("IfcPhysicalQuantity" [req("Name"), opt("Description")]),
    def!("IfcPhysicalSimpleQuantity": "IfcPhysicalQuantity" [opt("Unit")]),
    def!("IfcQuantityLength": "IfcPhysicalSimpleQuantity" [req("LengthValue"), opt("Formula")]),
    def!("IfcQuantityArea": "IfcPhysicalSimpleQuantity" [req("AreaValue"), opt("Formula")]),
    def!("IfcQuantityVolume": "IfcPhysicalSimpleQuantity" [req("VolumeValue"), opt("Formula")]),
    def!("IfcQuantityCount": "IfcPhysicalSimpleQuantity" [req("CountValue"), opt("Formula")]),
    def!("IfcQuantityWeight": "IfcPhysicalSimpleQuantity" [req("WeightValue"), opt("Formula")]),

    // Materials
    def!("IfcMaterialDefinition" [] inverse [
        inv("AssociatedTo", "IfcRelAssociatesMaterial", "RelatingMaterial"),
    ]),
    def!("IfcMaterial": "IfcMaterialDefinition" [req("Name"), opt("Description"), opt("Category")]),
];

/// Schema introspector backed by a table of [`EntityDef`]s
pub struct StaticSchema {
    name: String,
    defs: &'static [EntityDef],
    /// Upper-case type name -> position in `defs`
    by_name: FxHashMap<String, usize>,
}

impl StaticSchema {
    /// Build an introspector over an arbitrary declaration table
    pub fn new(name: impl Into<String>, defs: &'static [EntityDef]) -> Self {
        let by_name = defs
            .iter()
            .enumerate()
            .map(|(i, def)| (def.name.to_ascii_uppercase(), i))
            .collect();
        Self {
            name: name.into(),
            defs,
            by_name,
        }
    }

    /// The built-in IFC table, reported under the file's schema identifier
    pub fn ifc(schema_name: impl Into<String>) -> Self {
        Self::new(schema_name, IFC4_ENTITIES)
    }

    fn lookup(&self, type_name: &str) -> Option<&EntityDef> {
        self.by_name
            .get(&type_name.to_ascii_uppercase())
            .map(|&i| &self.defs[i])
    }

    /// Declaration chain from the root supertype down to `type_name`
    fn lineage(&self, type_name: &str) -> Vec<&EntityDef> {
        let mut chain = Vec::new();
        let mut current = self.lookup(type_name);
        while let Some(def) = current {
            // A cyclic table would otherwise loop forever
            if chain.len() > self.defs.len() {
                break;
            }
            chain.push(def);
            current = def.supertype.and_then(|s| self.lookup(s));
        }
        chain.reverse();
        chain
    }
}

impl SchemaIntrospector for StaticSchema {
    fn schema_name(&self) -> &str {
        &self.name
    }

    fn canonical_name(&self, type_name: &str) -> Option<&str> {
        self.lookup(type_name).map(|def| def.name)
    }

    fn attributes_of(&self, type_name: &str) -> Vec<AttributeDecl> {
        self.lineage(type_name)
            .into_iter()
            .flat_map(|def| def.attributes.iter())
            .enumerate()
            .map(|(index, attr)| AttributeDecl {
                name: attr.name.to_string(),
                optional: attr.optional,
                index,
            })
            .collect()
    }

    fn inverse_relations_of(&self, type_name: &str) -> Vec<InverseDecl> {
        self.lineage(type_name)
            .into_iter()
            .flat_map(|def| def.inverses.iter())
            .map(|inv| InverseDecl {
                name: inv.name.to_string(),
                reference_type: inv.reference_type.to_string(),
                back_reference: inv.back_reference.to_string(),
            })
            .collect()
    }

    fn is_subtype_of(&self, type_name: &str, ancestor: &str) -> bool {
        self.lineage(type_name)
            .iter()
            .any(|def| def.name.eq_ignore_ascii_case(ancestor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_rdf_model::SchemaIntrospectorExt;

    #[test]
    fn test_attributes_inherit_root_first() {
        let schema = StaticSchema::ifc("IFC4");
        let names: Vec<String> = schema
            .attributes_of("IFCWALL")
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "GlobalId",
                "OwnerHistory",
                "Name",
                "Description",
                "ObjectType",
                "ObjectPlacement",
                "Representation",
                "Tag",
                "PredefinedType"
            ]
        );
    }

    #[test]
    fn test_attribute_indices_match_step_positions() {
        let schema = StaticSchema::ifc("IFC4");
        assert_eq!(schema.attribute_index("IfcProject", "UnitsInContext"), Some(8));
        assert_eq!(schema.attribute_index("IfcRelAggregates", "RelatedObjects"), Some(5));
        assert_eq!(schema.attribute_index("IfcPropertySingleValue", "NominalValue"), Some(2));
        assert_eq!(schema.attribute_index("IfcQuantityArea", "AreaValue"), Some(3));
        assert_eq!(schema.attribute_index("IfcRelDefinesByProperties", "RelatingPropertyDefinition"), Some(5));
        assert_eq!(schema.attribute_index("IfcWall", "Elevation"), None);
    }

    #[test]
    fn test_optionality() {
        let schema = StaticSchema::ifc("IFC4");
        let attrs = schema.attributes_of("IfcRelAggregates");
        assert!(!attrs[0].optional);
        assert!(attrs[2].optional);
        assert!(!attrs[4].optional);
    }

    #[test]
    fn test_inverses_are_inherited() {
        let schema = StaticSchema::ifc("IFC4");
        let inverses = schema.inverse_relations_of("IfcBuildingStorey");
        let decomposed = inverses
            .iter()
            .find(|i| i.name == "IsDecomposedBy")
            .unwrap();
        assert_eq!(decomposed.reference_type, "IfcRelAggregates");
        assert_eq!(decomposed.back_reference, "RelatingObject");
        assert!(inverses.iter().any(|i| i.name == "ContainsElements"));
        assert!(!inverses.iter().any(|i| i.name == "FillsVoids"));
    }

    #[test]
    fn test_subtypes() {
        let schema = StaticSchema::ifc("IFC4");
        assert!(schema.is_subtype_of("IFCBUILDINGSTOREY", "IfcSpatialElement"));
        assert!(schema.is_subtype_of("IfcWallStandardCase", "IfcProduct"));
        assert!(schema.is_subtype_of("IfcWall", "IfcWall"));
        assert!(!schema.is_subtype_of("IfcWall", "IfcSpatialElement"));
        assert!(!schema.is_subtype_of("IfcCartesianPoint", "IfcRoot"));
    }

    #[test]
    fn test_canonical_name() {
        let schema = StaticSchema::ifc("IFC2X3");
        assert_eq!(schema.canonical_name("IFCRELAGGREGATES"), Some("IfcRelAggregates"));
        assert_eq!(schema.canonical_name("IFCCARTESIANPOINT"), None);
        assert_eq!(schema.schema_name(), "IFC2X3");
    }
}
