// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC-RDF Geometry Extraction
//!
//! Tessellates IFC shape representations into triangle meshes in world
//! coordinates, in metres. Entity lookup goes through the `EntityResolver`
//! trait from `ifc-rdf-model`, so the crate does not depend on a parser.
//!
//! ## Overview
//!
//! - **Profiles**: rectangle, circle, hollow circle and arbitrary (with voids)
//!   profile definitions, triangulated with earcutr
//! - **Solids and surfaces**: extruded area solids, triangulated and polygonal
//!   face sets, faceted breps and shell based surface models
//! - **Instancing**: mapped items with origin and target transforms
//! - **Placement**: the full `IfcLocalPlacement` chain and the file's length unit
//!
//! Boolean results are reduced to their first operand; no CSG is performed.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ifc_rdf_geometry::{GeometryRouter, RepresentationExtractor};
//!
//! let router = GeometryRouter::with_default_processors_and_unit_scale(model.unit_scale());
//! for index in 0..router.representation_count(&wall, resolver) {
//!     if let Ok(mesh) = router.extract(&wall, index, resolver) {
//!         println!("{} triangles", mesh.triangle_count());
//!     }
//! }
//! ```

pub mod error;
pub mod extrusion;
pub mod mesh;
pub mod placement;
pub mod processors;
pub mod profile;
pub mod router;
pub mod triangulation;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point2, Point3, Vector3};

pub use error::{Error, Result};
pub use extrusion::{apply_transform, extrude_profile};
pub use mesh::Mesh;
pub use profile::{calculate_circle_segments, Profile2D, Triangulation};
pub use router::{GeometryProcessor, GeometryRouter, RepresentationExtractor};

pub use processors::{
    ExtrudedAreaSolidProcessor, FacetedBrepProcessor, PolygonalFaceSetProcessor,
    ShellBasedSurfaceModelProcessor, TriangulatedFaceSetProcessor,
};
