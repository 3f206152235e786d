// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Errors raised while opening a STEP file

use thiserror::Error;

/// Result type alias for model loading
pub type Result<T> = std::result::Result<T, ParseError>;

/// Why a file could not be opened as an IFC model
///
/// Individual records that fail to decode are not errors at this level;
/// resolvers report them as absent.
#[derive(Error, Debug)]
pub enum ParseError {
    /// A mandatory section is missing
    #[error("Invalid IFC format: no {0} section")]
    MissingSection(&'static str),

    /// The DATA section holds no entity instances
    #[error("Invalid IFC format: DATA section contains no entities")]
    EmptyData,
}

impl ParseError {
    pub fn missing_section(section: &'static str) -> Self {
        ParseError::MissingSection(section)
    }
}
