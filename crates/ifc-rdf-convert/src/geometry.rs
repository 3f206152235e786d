// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry records
//!
//! One record per (product, representation) that tessellates to at least one
//! triangle. Vertices are converted from IFC's Z-up to glTF's Y-up axes and
//! every record gets a material from a fixed per-type palette.

use crate::identity::IdentityResolver;
use ifc_rdf_geometry::{Error, Mesh, RepresentationExtractor};
use ifc_rdf_model::{DecodedEntity, EntityId, EntityResolver, IfcType, SchemaIntrospector};
use log::{debug, info};
use rustc_hash::FxHashMap;

/// Linear RGBA
pub type Rgba = [f32; 4];

/// Color for types without a palette entry
pub const DEFAULT_COLOR: Rgba = [0.5, 0.5, 0.5, 1.0];

/// Display color for an IFC type, by exact type name
pub fn palette_color(type_name: &str) -> Rgba {
    match type_name {
        "IfcWall" => [0.8, 0.8, 0.8, 1.0],
        "IfcSlab" => [0.7, 0.7, 0.7, 1.0],
        "IfcColumn" => [0.6, 0.6, 0.9, 1.0],
        "IfcBeam" => [0.9, 0.6, 0.6, 1.0],
        "IfcDoor" => [0.8, 0.5, 0.2, 1.0],
        "IfcWindow" => [0.5, 0.8, 0.9, 1.0],
        "IfcStair" => [0.7, 0.8, 0.6, 1.0],
        "IfcRoof" => [0.8, 0.4, 0.4, 1.0],
        "IfcRailing" => [0.5, 0.5, 0.5, 1.0],
        _ => DEFAULT_COLOR,
    }
}

/// Convert a Z-up vertex to Y-up: `(x, y, z) -> (x, z, -y)`
#[inline]
pub fn to_y_up([x, y, z]: [f32; 3]) -> [f32; 3] {
    [x, z, -y]
}

/// Distinct colors, indexed in first-seen order
#[derive(Debug, Default)]
pub struct MaterialRegistry {
    colors: Vec<Rgba>,
    by_bits: FxHashMap<[u32; 4], usize>,
}

impl MaterialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `color`, registering it when new
    pub fn index_of(&mut self, color: Rgba) -> usize {
        let key = color.map(f32::to_bits);
        *self.by_bits.entry(key).or_insert_with(|| {
            self.colors.push(color);
            self.colors.len() - 1
        })
    }

    /// Registered colors by index
    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// One tessellated representation of one product
#[derive(Clone, Debug)]
pub struct GeometryRecord {
    /// Mesh and node name: the identifier, suffixed with the representation
    /// index when the product has several representations
    pub name: String,
    pub entity: EntityId,
    /// Instance identifier of the owning product
    pub identifier: String,
    pub ifc_type: String,
    pub representation_index: usize,
    /// Y-up positions (x, y, z), metres
    pub positions: Vec<f32>,
    /// Triangle indices
    pub indices: Vec<u32>,
    pub material: usize,
}

impl GeometryRecord {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn face_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// All records of a run plus the materials they use
#[derive(Debug, Default)]
pub struct GeometrySet {
    pub records: Vec<GeometryRecord>,
    pub materials: MaterialRegistry,
    /// Representations that failed to tessellate
    pub failures: usize,
}

impl GeometrySet {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_vertices(&self) -> usize {
        self.records.iter().map(GeometryRecord::vertex_count).sum()
    }

    pub fn total_faces(&self) -> usize {
        self.records.iter().map(GeometryRecord::face_count).sum()
    }
}

/// Whether `entity` is a product
///
/// Types missing from the schema table count as products when their
/// `Representation` slot points at an `IfcProductDefinitionShape`.
fn is_product(entity: &DecodedEntity, resolver: &dyn EntityResolver, schema: &dyn SchemaIntrospector) -> bool {
    let type_name = entity.ifc_type.name();
    if schema.declares(type_name) {
        return schema.is_subtype_of(type_name, "IfcProduct");
    }
    entity
        .get_ref(6)
        .and_then(|id| resolver.get(id))
        .is_some_and(|shape| shape.ifc_type == IfcType::IfcProductDefinitionShape)
}

/// Tessellate every representation of every product
///
/// A representation without triangles is skipped silently. One that fails
/// is skipped with a debug message and counted in `failures`; it never
/// stops the remaining ones.
pub fn build_records(
    resolver: &dyn EntityResolver,
    schema: &dyn SchemaIntrospector,
    extractor: &dyn RepresentationExtractor,
    identities: &mut IdentityResolver,
) -> GeometrySet {
    info!("Processing geometry for GLB conversion...");
    let mut set = GeometrySet::default();

    for id in resolver.ids() {
        let Some(product) = resolver.get(id) else {
            continue;
        };
        if !is_product(&product, resolver, schema) {
            continue;
        }

        let count = extractor.representation_count(&product, resolver);
        if count == 0 {
            continue;
        }

        let type_name = schema
            .canonical_name(product.ifc_type.name())
            .unwrap_or(product.ifc_type.name())
            .to_string();

        for index in 0..count {
            let mesh = match extractor.extract(&product, index, resolver) {
                Ok(mesh) if !mesh.is_empty() => mesh,
                Ok(_) | Err(Error::EmptyRepresentation(_)) => continue,
                Err(e) => {
                    debug!("Skipping representation {} of {}: {}", index, product.id, e);
                    set.failures += 1;
                    continue;
                }
            };

            let identifier = identities.resolve(&product, schema).identifier;
            let name = if count > 1 {
                format!("{}_{}", identifier, index)
            } else {
                identifier.clone()
            };
            let material = set.materials.index_of(palette_color(&type_name));

            set.records.push(GeometryRecord {
                name,
                entity: product.id,
                identifier,
                ifc_type: type_name.clone(),
                representation_index: index,
                positions: y_up_positions(&mesh),
                indices: mesh.indices,
                material,
            });
        }
    }

    info!(
        "Geometry processed: {} representations ({} failed)",
        set.records.len(),
        set.failures
    );
    set
}

fn y_up_positions(mesh: &Mesh) -> Vec<f32> {
    mesh.vertices().flat_map(to_y_up).collect()
}
