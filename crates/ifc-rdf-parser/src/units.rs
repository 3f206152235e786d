// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Unit scale extraction from IFC files

use ifc_rdf_model::{
    DecodedEntity, EntityResolver, IfcType, SchemaIntrospector, SchemaIntrospectorExt,
};

/// Extract the length unit scale (file units to metres)
///
/// Follows `IfcProject.UnitsInContext` to the length unit. Returns 1.0 if no
/// unit information is found.
pub fn extract_unit_scale(resolver: &dyn EntityResolver, schema: &dyn SchemaIntrospector) -> f64 {
    let Some(project) = resolver.instances_of("IfcProject").into_iter().next() else {
        return 1.0;
    };

    let Some(units) = schema
        .attribute(&project, "UnitsInContext")
        .and_then(|attr| resolver.resolve_ref(attr))
    else {
        return 1.0;
    };

    // IFCUNITASSIGNMENT(Units)
    units
        .get(0)
        .map(|list| resolver.resolve_ref_list(list))
        .unwrap_or_default()
        .iter()
        .find_map(|unit| length_unit_scale(unit, resolver))
        .unwrap_or(1.0)
}

/// Scale of a unit entity (IFCSIUNIT or IFCCONVERSIONBASEDUNIT), if it is a length unit
fn length_unit_scale(unit: &DecodedEntity, resolver: &dyn EntityResolver) -> Option<f64> {
    match unit.ifc_type {
        IfcType::IfcSIUnit => si_unit_scale(unit),
        IfcType::IfcConversionBasedUnit => conversion_unit_scale(unit, resolver),
        _ => None,
    }
}

/// IFCSIUNIT(*, UnitType, Prefix, Name)
fn si_unit_scale(unit: &DecodedEntity) -> Option<f64> {
    if unit.get_enum(1)? != "LENGTHUNIT" || unit.get_enum(3)? != "METRE" {
        return None;
    }

    let prefix_scale = match unit.get_enum(2) {
        Some("EXA") => 1e18,
        Some("PETA") => 1e15,
        Some("TERA") => 1e12,
        Some("GIGA") => 1e9,
        Some("MEGA") => 1e6,
        Some("KILO") => 1e3,
        Some("HECTO") => 1e2,
        Some("DECA") => 1e1,
        Some("DECI") => 1e-1,
        Some("CENTI") => 1e-2,
        Some("MILLI") => 1e-3,
        Some("MICRO") => 1e-6,
        Some("NANO") => 1e-9,
        Some("PICO") => 1e-12,
        Some("FEMTO") => 1e-15,
        Some("ATTO") => 1e-18,
        _ => 1.0,
    };

    Some(prefix_scale)
}

/// IFCCONVERSIONBASEDUNIT(Dimensions, UnitType, Name, ConversionFactor)
fn conversion_unit_scale(unit: &DecodedEntity, resolver: &dyn EntityResolver) -> Option<f64> {
    if unit.get_enum(1)? != "LENGTHUNIT" {
        return None;
    }

    // IFCMEASUREWITHUNIT(ValueComponent, UnitComponent)
    let factor = resolver.get(unit.get_ref(3)?)?;
    if factor.ifc_type != IfcType::IfcMeasureWithUnit {
        return None;
    }

    // ValueComponent is a typed measure such as IFCLENGTHMEASURE(0.3048)
    let value = factor.get_float(0)?;
    let base_scale = factor
        .get_ref(1)
        .and_then(|id| resolver.get(id))
        .and_then(|base| length_unit_scale(&base, resolver))
        .unwrap_or(1.0);

    Some(value * base_scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolverImpl;
    use crate::schema::StaticSchema;
    use approx::assert_relative_eq;

    fn scale_of(data: &str) -> f64 {
        let content = format!(
            "ISO-10303-21;\nHEADER;\nFILE_SCHEMA(('IFC4'));\nENDSEC;\nDATA;\n{}\nENDSEC;\nEND-ISO-10303-21;\n",
            data
        );
        let resolver = ResolverImpl::new(content);
        extract_unit_scale(&resolver, &StaticSchema::ifc("IFC4"))
    }

    #[test]
    fn test_millimetres() {
        let scale = scale_of(
            "#1=IFCPROJECT('g',$,'P',$,$,$,$,$,#2);\n#2=IFCUNITASSIGNMENT((#3));\n#3=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);",
        );
        assert_relative_eq!(scale, 0.001);
    }

    #[test]
    fn test_feet_conversion_unit() {
        let scale = scale_of(
            "#1=IFCPROJECT('g',$,'P',$,$,$,$,$,#2);\n#2=IFCUNITASSIGNMENT((#5,#3));\n\
             #3=IFCCONVERSIONBASEDUNIT(#6,.LENGTHUNIT.,'FOOT',#4);\n\
             #4=IFCMEASUREWITHUNIT(IFCLENGTHMEASURE(0.3048),#5);\n\
             #5=IFCSIUNIT(*,.AREAUNIT.,$,.SQUARE_METRE.);\n#6=IFCDIMENSIONALEXPONENTS(1,0,0,0,0,0,0);",
        );
        assert_relative_eq!(scale, 0.3048);
    }

    #[test]
    fn test_no_project_defaults_to_metres() {
        assert_relative_eq!(scale_of("#1=IFCWALL('g',$,$,$,$,$,$,$);"), 1.0);
    }
}
