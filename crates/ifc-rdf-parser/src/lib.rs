// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP reader for IFC files
//!
//! Implements the `ifc-rdf-model` traits over an in-memory STEP file:
//!
//! - records are located with `memchr` and indexed by id on load
//! - a record's parameters are tokenized with `nom` only when first requested
//! - attribute names, optionality and inverse relations come from a static
//!   IFC schema table ([`StaticSchema`])
//! - the length unit is read from the project's unit assignment
//!
//! # Example
//!
//! ```ignore
//! use ifc_rdf_model::{IfcModel, SchemaIntrospectorExt};
//! use ifc_rdf_parser::ParsedModel;
//!
//! let model = ParsedModel::parse(&content)?;
//! for wall in model.resolver().instances_of("IfcWall") {
//!     println!("{:?}", model.schema().attribute(&wall, "Name"));
//! }
//! ```

mod header;
mod model;
mod resolver;
mod scanner;
pub mod schema;
mod tokenizer;
mod units;

pub use header::parse_header;
pub use model::ParsedModel;
pub use resolver::ResolverImpl;
pub use schema::StaticSchema;
pub use tokenizer::{decode_step_string, parse_entity, Token};
