// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tessellation errors
//!
//! Every variant describes one representation item or one representation
//! that could not be meshed. Callers skip the offending part and go on.

use ifc_rdf_model::EntityId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Degenerate input, such as a zero-length extrusion
    #[error("cannot tessellate: {0}")]
    Geometry(String),

    /// A reference points at no record, or at one that failed to decode
    #[error("{0} does not resolve")]
    EntityNotFound(EntityId),

    #[error("attribute {index}: {message}")]
    InvalidAttribute { index: usize, message: String },

    #[error("bad profile: {0}")]
    Profile(String),

    #[error("ear clipping failed: {0}")]
    Triangulation(String),

    /// No processor is registered for the item type
    #[error("no tessellator for {0}")]
    UnsupportedType(String),

    #[error("{product} has no representation at index {index}")]
    NoRepresentation { product: EntityId, index: usize },

    #[error("representation {0} produced no triangles")]
    EmptyRepresentation(EntityId),
}

impl Error {
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    pub fn profile(msg: impl Into<String>) -> Self {
        Self::Profile(msg.into())
    }

    pub fn triangulation(msg: impl Into<String>) -> Self {
        Self::Triangulation(msg.into())
    }

    pub fn entity_not_found(id: EntityId) -> Self {
        Self::EntityNotFound(id)
    }

    pub fn invalid_attribute(index: usize, msg: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            index,
            message: msg.into(),
        }
    }

    pub fn unsupported_type(type_name: impl Into<String>) -> Self {
        Self::UnsupportedType(type_name.into())
    }
}
