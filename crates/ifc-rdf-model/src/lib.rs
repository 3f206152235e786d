// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Read-only view of an IFC model
//!
//! The converter and the geometry crate work against these traits only:
//!
//! - [`IfcModel`] bundles a loaded file
//! - [`EntityResolver`] looks instances up by id or type name
//! - [`SchemaIntrospector`] names attributes and declares inverse relations

pub mod error;
pub mod resolver;
pub mod schema;
pub mod traits;
pub mod types;

pub use error::*;
pub use resolver::*;
pub use schema::*;
pub use traits::*;
pub use types::*;
