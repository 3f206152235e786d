// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC to RDF + GLB
//!
//! Converts an IFC model into two linked artifacts:
//!
//! - a Turtle graph describing the entities named in a JSON conversion map,
//!   with their property sets, attributes, inverse relations and BOT
//!   containment
//! - a binary glTF container with one mesh per product representation
//!
//! The graph links every meshed entity to its geometry node using the OMG,
//! FOG and GOM vocabularies.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ifc_rdf_convert::{Converter, ConverterConfig};
//!
//! let config = ConverterConfig::new("house.ifc")
//!     .with_base_url("https://example.org/house/")
//!     .with_conversion_map("config/conversion-map.json");
//! let result = Converter::new(config).run();
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! ```

pub mod cache;
pub mod config;
pub mod converter;
pub mod error;
pub mod geometry;
pub mod glb;
pub mod identity;
pub mod inverse;
pub mod linker;
pub mod mapping;
pub mod projection;
pub mod rdf;
pub mod spatial;

pub use cache::{PropertyCache, PropertySet, PropertyValue};
pub use config::{ConverterConfig, DEFAULT_BASE_URL, DEFAULT_GLB_OUTPUT_DIR, DEFAULT_RDF_OUTPUT_DIR};
pub use converter::{load_model, Converter, GlbFile, OutputFiles, RdfFile, RunMetadata, RunResult};
pub use error::{ConvertError, Result};
pub use geometry::{GeometryRecord, GeometrySet, MaterialRegistry};
pub use identity::{expand_guid, Identity, IdentityResolver};
pub use mapping::{ClassMapping, ConversionMap};
pub use projection::{ProjectionContext, ProjectionOutcome, Projector};
pub use rdf::{Graph, Literal, Term, Triple};
