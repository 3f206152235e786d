// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for conversion runs

use ifc_rdf_model::ParseError;
use std::path::PathBuf;
use thiserror::Error;

/// Conversion result type
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Conversion errors
///
/// Only [`ConvertError::Model`] and [`ConvertError::Io`] on the input file end
/// a run. Everything else is reported as a stage failure and recorded in the
/// run's error list.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The IFC file could not be parsed
    #[error("Error loading IFC file: {0}")]
    Model(#[from] ParseError),

    /// Filesystem failure on a specific path
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The conversion map could not be read or decoded
    #[error("Error loading conversion map from {}: {message}", path.display())]
    Mapping { path: PathBuf, message: String },

    /// JSON encoding failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Geometry processing produced nothing usable
    #[error("Geometry error: {0}")]
    Geometry(String),

    /// The GLB container could not be assembled
    #[error("GLB error: {0}")]
    Glb(String),
}

impl ConvertError {
    /// Create an I/O error for `path`
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a mapping error for `path`
    pub fn mapping(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        ConvertError::Mapping {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a geometry error
    pub fn geometry(msg: impl Into<String>) -> Self {
        ConvertError::Geometry(msg.into())
    }

    /// Create a GLB error
    pub fn glb(msg: impl Into<String>) -> Self {
        ConvertError::Glb(msg.into())
    }
}
