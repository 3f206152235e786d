// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Representation dispatch
//!
//! Routes IFC representation items to the processor registered for their
//! type and assembles the per-representation world-space mesh of a product:
//!
//! ```text
//! IfcProduct.Representation (6)
//!   -> IfcProductDefinitionShape.Representations (2) [i]
//!     -> IfcShapeRepresentation.Items (3)
//! ```
//!
//! The product's `ObjectPlacement` chain and the file's length unit are
//! applied last, so every mesh leaving [`RepresentationExtractor::extract`]
//! is in metres in the project's world coordinate system.

use crate::placement::{local_placement, placement_matrix};
use crate::processors::{
    ExtrudedAreaSolidProcessor, FacetedBrepProcessor, PolygonalFaceSetProcessor,
    ShellBasedSurfaceModelProcessor, TriangulatedFaceSetProcessor,
};
use crate::{Error, Mesh, Result};
use ifc_rdf_model::{DecodedEntity, EntityId, EntityResolver, IfcType};
use log::debug;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::sync::Arc;

/// Nesting limit for mapped items and boolean operands
const MAX_ITEM_DEPTH: usize = 16;

/// Tessellates one family of representation items
///
/// Output is in the item's own coordinate system and in file units; the
/// router applies placements and the length unit.
pub trait GeometryProcessor: Send + Sync {
    fn process(&self, entity: &DecodedEntity, resolver: &dyn EntityResolver) -> Result<Mesh>;

    /// Item types this processor accepts
    fn handles(&self) -> Vec<IfcType>;
}

/// Turns one representation of a product into a world-space mesh
pub trait RepresentationExtractor {
    /// Number of entries in the product's representation list
    fn representation_count(&self, product: &DecodedEntity, resolver: &dyn EntityResolver) -> usize;

    /// Tessellate representation `representation_index` of `product`
    ///
    /// Fails with [`Error::EmptyRepresentation`] when no item yields a triangle.
    fn extract(
        &self,
        product: &DecodedEntity,
        representation_index: usize,
        resolver: &dyn EntityResolver,
    ) -> Result<Mesh>;
}

/// Processor table plus a tessellation cache for representation maps
///
/// Every `IfcMappedItem` instancing the same map reuses the cached mesh.
pub struct GeometryRouter {
    by_type: FxHashMap<IfcType, Arc<dyn GeometryProcessor>>,
    /// MappedRepresentation id -> mesh before the mapping transforms
    mapped: RefCell<FxHashMap<EntityId, Arc<Mesh>>>,
    /// File length unit in metres
    unit_scale: f64,
}

impl GeometryRouter {
    /// Router with an empty processor table
    pub fn new() -> Self {
        Self {
            by_type: FxHashMap::default(),
            mapped: RefCell::new(FxHashMap::default()),
            unit_scale: 1.0,
        }
    }

    /// Router knowing every item type this crate can tessellate
    pub fn with_default_processors() -> Self {
        let defaults: [Arc<dyn GeometryProcessor>; 5] = [
            Arc::new(ExtrudedAreaSolidProcessor::new()),
            Arc::new(TriangulatedFaceSetProcessor::new()),
            Arc::new(PolygonalFaceSetProcessor::new()),
            Arc::new(FacetedBrepProcessor::new()),
            Arc::new(ShellBasedSurfaceModelProcessor::new()),
        ];
        let mut router = Self::new();
        for processor in defaults {
            router.register(processor);
        }
        router
    }

    pub fn with_default_processors_and_unit_scale(unit_scale: f64) -> Self {
        let mut router = Self::with_default_processors();
        router.set_unit_scale(unit_scale);
        router
    }

    pub fn unit_scale(&self) -> f64 {
        self.unit_scale
    }

    /// Non-finite or non-positive values reset the scale to 1
    pub fn set_unit_scale(&mut self, scale: f64) {
        self.unit_scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
    }

    /// Route every type the processor handles to it, replacing earlier entries
    pub fn register(&mut self, processor: Arc<dyn GeometryProcessor>) {
        for ty in processor.handles() {
            self.by_type.insert(ty, Arc::clone(&processor));
        }
    }

    pub fn supports(&self, ty: &IfcType) -> bool {
        self.by_type.contains_key(ty)
    }

    fn process_item(
        &self,
        item: &DecodedEntity,
        resolver: &dyn EntityResolver,
        depth: usize,
    ) -> Result<Mesh> {
        if depth > MAX_ITEM_DEPTH {
            return Err(Error::geometry(format!("item nesting too deep at {}", item.id)));
        }

        match item.ifc_type {
            IfcType::IfcMappedItem => self.process_mapped_item(item, resolver, depth),
            // Only the first operand is kept: no CSG is performed
            IfcType::IfcBooleanResult | IfcType::IfcBooleanClippingResult => {
                let operand = item
                    .get_ref(1)
                    .and_then(|id| resolver.get(id))
                    .ok_or_else(|| Error::invalid_attribute(1, "Missing FirstOperand"))?;
                self.process_item(&operand, resolver, depth + 1)
            }
            _ => {
                match self.by_type.get(&item.ifc_type) {
                    Some(processor) => processor.process(item, resolver),
                    None => Err(Error::unsupported_type(item.ifc_type.name())),
                }
            }
        }
    }

    /// IfcMappedItem: MappingSource (0) -> IfcRepresentationMap
    /// { MappingOrigin (0), MappedRepresentation (1) }, MappingTarget (1)
    fn process_mapped_item(
        &self,
        item: &DecodedEntity,
        resolver: &dyn EntityResolver,
        depth: usize,
    ) -> Result<Mesh> {
        let source = item
            .get_ref(0)
            .and_then(|id| resolver.get(id))
            .ok_or_else(|| Error::invalid_attribute(0, "Missing MappingSource"))?;
        let mapped_rep_id = source
            .get_ref(1)
            .ok_or_else(|| Error::invalid_attribute(1, "Missing MappedRepresentation"))?;

        let cached = self.mapped.borrow().get(&mapped_rep_id).cloned();
        let source_mesh = match cached {
            Some(mesh) => mesh,
            None => {
                let mapped_rep = resolver
                    .get(mapped_rep_id)
                    .ok_or_else(|| Error::entity_not_found(mapped_rep_id))?;
                let mesh = Arc::new(self.process_items(&mapped_rep, resolver, depth + 1));
                self.mapped.borrow_mut().insert(mapped_rep_id, Arc::clone(&mesh));
                mesh
            }
        };

        let mut mesh = (*source_mesh).clone();
        let origin = source.get_ref(0).and_then(|id| placement_matrix(id, resolver));
        let target = item.get_ref(1).and_then(|id| placement_matrix(id, resolver));
        match (target, origin) {
            (Some(target), Some(origin)) => mesh.transform(&(target * origin)),
            (Some(matrix), None) | (None, Some(matrix)) => mesh.transform(&matrix),
            (None, None) => {}
        }

        Ok(mesh)
    }

    /// Merge every item of a shape representation (Items at index 3)
    ///
    /// Items that fail are skipped with a debug note.
    fn process_items(
        &self,
        shape_rep: &DecodedEntity,
        resolver: &dyn EntityResolver,
        depth: usize,
    ) -> Mesh {
        let mut combined = Mesh::new();

        for item_id in shape_rep.get_refs(3).unwrap_or_default() {
            let item = match resolver.get(item_id) {
                Some(item) => item,
                None => continue,
            };
            match self.process_item(&item, resolver, depth) {
                Ok(mesh) => combined.merge(&mesh),
                Err(e) => debug!("Skipping item {} ({}): {}", item_id, item.ifc_type, e),
            }
        }

        combined
    }

    /// Shape representation ids of a product, in list order
    fn representation_ids(
        &self,
        product: &DecodedEntity,
        resolver: &dyn EntityResolver,
    ) -> Vec<EntityId> {
        product
            .get_ref(6)
            .and_then(|id| resolver.get(id))
            .and_then(|shape| shape.get_refs(2))
            .unwrap_or_default()
    }
}

impl RepresentationExtractor for GeometryRouter {
    fn representation_count(&self, product: &DecodedEntity, resolver: &dyn EntityResolver) -> usize {
        self.representation_ids(product, resolver).len()
    }

    fn extract(
        &self,
        product: &DecodedEntity,
        representation_index: usize,
        resolver: &dyn EntityResolver,
    ) -> Result<Mesh> {
        let rep_id = self
            .representation_ids(product, resolver)
            .get(representation_index)
            .copied()
            .ok_or(Error::NoRepresentation {
                product: product.id,
                index: representation_index,
            })?;
        let shape_rep = resolver
            .get(rep_id)
            .ok_or_else(|| Error::entity_not_found(rep_id))?;

        let mut mesh = self.process_items(&shape_rep, resolver, 0);
        if mesh.is_empty() {
            return Err(Error::EmptyRepresentation(rep_id));
        }

        // ObjectPlacement at index 5
        if let Some(placement_id) = product.get_ref(5) {
            mesh.transform(&local_placement(placement_id, resolver));
        }
        mesh.scale(self.unit_scale);

        Ok(mesh)
    }
}

impl Default for GeometryRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ifc_rdf_parser::ResolverImpl;

    const PRODUCTS: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCCARTESIANPOINT((0.,0.,0.));
#2=IFCCARTESIANPOINT((1000.,0.,0.));
#3=IFCAXIS2PLACEMENT3D(#1,$,$);
#4=IFCAXIS2PLACEMENT3D(#2,$,$);
#5=IFCLOCALPLACEMENT($,#4);
#6=IFCLOCALPLACEMENT(#5,#3);
#10=IFCCARTESIANPOINTLIST3D(((0.,0.,0.),(1000.,0.,0.),(1000.,1000.,0.),(0.,1000.,0.)));
#11=IFCTRIANGULATEDFACESET(#10,$,.T.,((1,2,3),(1,3,4)),$);
#12=IFCSHAPEREPRESENTATION($,'Body','Tessellation',(#11));
#13=IFCPOLYLINE((#1,#2));
#14=IFCSHAPEREPRESENTATION($,'Axis','Curve2D',(#13));
#15=IFCPRODUCTDEFINITIONSHAPE($,$,(#14,#12));
#16=IFCWALL('1YEiFK9gX9Wfa1c1bqz2WW',$,'Wall-01',$,$,#6,#15,$,$);
#20=IFCREPRESENTATIONMAP(#3,#12);
#21=IFCCARTESIANTRANSFORMATIONOPERATOR3D($,$,#2,$,$);
#22=IFCMAPPEDITEM(#20,#21);
#23=IFCBOOLEANCLIPPINGRESULT(.DIFFERENCE.,#22,#11);
#24=IFCSHAPEREPRESENTATION($,'Body','MappedRepresentation',(#22,#23));
#25=IFCPRODUCTDEFINITIONSHAPE($,$,(#24));
#26=IFCSLAB('2O2Fr$t4X7Zf8NOew3FLOH',$,$,$,$,$,#25,$,$);
ENDSEC;
END-ISO-10303-21;
"#;

    fn setup() -> (GeometryRouter, ResolverImpl) {
        (
            GeometryRouter::with_default_processors_and_unit_scale(0.001),
            ResolverImpl::new(PRODUCTS.to_string()),
        )
    }

    #[test]
    fn test_empty_router_supports_nothing() {
        let router = GeometryRouter::new();
        assert!(!router.supports(&IfcType::IfcExtrudedAreaSolid));
        assert!(!router.supports(&IfcType::IfcMappedItem));
    }

    #[test]
    fn test_default_table() {
        let router = GeometryRouter::with_default_processors();
        for ty in [
            IfcType::IfcExtrudedAreaSolid,
            IfcType::IfcTriangulatedFaceSet,
            IfcType::IfcPolygonalFaceSet,
            IfcType::IfcFacetedBrep,
            IfcType::IfcFacetedBrepWithVoids,
            IfcType::IfcShellBasedSurfaceModel,
        ] {
            assert!(router.supports(&ty), "{} should be routed", ty);
        }
    }

    #[test]
    fn test_unit_scale_rejects_nonsense() {
        let mut router = GeometryRouter::with_default_processors_and_unit_scale(0.001);
        assert_eq!(router.unit_scale(), 0.001);
        router.set_unit_scale(f64::NAN);
        assert_eq!(router.unit_scale(), 1.0);
        router.set_unit_scale(-2.0);
        assert_eq!(router.unit_scale(), 1.0);
    }

    #[test]
    fn test_extract_applies_placement_and_units() {
        let (router, resolver) = setup();
        let wall = resolver.get(EntityId(16)).unwrap();
        assert_eq!(router.representation_count(&wall, &resolver), 2);

        let mesh = router.extract(&wall, 1, &resolver).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);

        let (min, max) = mesh.bounds().unwrap();
        assert_relative_eq!(min.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(max.x, 2.0, epsilon = 1e-5);
        assert_relative_eq!(max.y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_curve_representation_is_empty() {
        let (router, resolver) = setup();
        let wall = resolver.get(EntityId(16)).unwrap();
        assert!(matches!(
            router.extract(&wall, 0, &resolver),
            Err(Error::EmptyRepresentation(EntityId(14)))
        ));
        assert!(matches!(
            router.extract(&wall, 5, &resolver),
            Err(Error::NoRepresentation { index: 5, .. })
        ));
    }

    #[test]
    fn test_mapped_item_and_boolean_first_operand() {
        let (router, resolver) = setup();
        let slab = resolver.get(EntityId(26)).unwrap();
        let mesh = router.extract(&slab, 0, &resolver).unwrap();

        // Mapped copy plus the boolean's first operand (another mapped copy)
        assert_eq!(mesh.triangle_count(), 4);
        let (min, max) = mesh.bounds().unwrap();
        assert_relative_eq!(min.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(max.x, 2.0, epsilon = 1e-5);
    }
}
