// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversion map
//!
//! The declarative table deciding what reaches the graph:
//!
//! ```json
//! {
//!   "classes": {
//!     "IfcWall": {
//!       "class": ["https://w3id.org/beo#Wall"],
//!       "attrs": { "Tag": "https://example.org/tag" },
//!       "inv_attrs": { "IsDecomposedBy": "https://w3id.org/bot#hasSubElement" }
//!     }
//!   },
//!   "psets": { "Pset_WallCommon": { "IsExternal": "https://example.org/isExternal" } },
//!   "qsets": { "Qto_WallBaseQuantities": { "Length": "https://example.org/length" } }
//! }
//! ```
//!
//! Entity type keys match case-insensitively; set and property names match
//! exactly. Types without an entry are never projected.

use crate::error::{ConvertError, Result};
use log::{debug, info};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File name searched for when no explicit map is given
pub const CONVERSION_MAP_FILE: &str = "conversion-map.json";

/// Property or quantity name -> predicate IRI
pub type PredicateMap = BTreeMap<String, String>;

/// Projection rules for one entity type
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ClassMapping {
    /// `rdf:type` objects
    #[serde(default, deserialize_with = "one_or_many")]
    pub class: Vec<String>,
    /// Direct attribute name -> predicate IRI
    #[serde(default)]
    pub attrs: PredicateMap,
    /// Inverse attribute name -> predicate IRI
    #[serde(default)]
    pub inv_attrs: PredicateMap,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(class) => vec![class],
        OneOrMany::Many(classes) => classes,
    })
}

#[derive(Deserialize, Default)]
struct RawConversionMap {
    #[serde(default)]
    classes: BTreeMap<String, ClassMapping>,
    #[serde(default)]
    psets: BTreeMap<String, PredicateMap>,
    #[serde(default)]
    qsets: BTreeMap<String, PredicateMap>,
}

/// A loaded conversion map
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(from = "RawConversionMap")]
pub struct ConversionMap {
    classes: BTreeMap<String, ClassMapping>,
    psets: BTreeMap<String, PredicateMap>,
    qsets: BTreeMap<String, PredicateMap>,
    /// Upper-case type name -> key in `classes`
    index: FxHashMap<String, String>,
}

impl From<RawConversionMap> for ConversionMap {
    fn from(raw: RawConversionMap) -> Self {
        let index = raw
            .classes
            .keys()
            .map(|key| (key.to_ascii_uppercase(), key.clone()))
            .collect();
        Self {
            classes: raw.classes,
            psets: raw.psets,
            qsets: raw.qsets,
            index,
        }
    }
}

impl ConversionMap {
    /// The fallback map: projects nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Decode a map from JSON text
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Read and decode a map file
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading conversion map from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConvertError::mapping(path, e.to_string()))?;
        let map = Self::from_json(&text).map_err(|e| ConvertError::mapping(path, e.to_string()))?;
        info!(
            "Conversion map loaded: {} classes, {} psets, {} qsets",
            map.classes.len(),
            map.psets.len(),
            map.qsets.len()
        );
        Ok(map)
    }

    /// Pick the map file to load
    ///
    /// An explicit path is returned as is. Otherwise `conversion-map.json`
    /// next to the running executable, then `config/conversion-map.json`
    /// under the working directory.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        let beside_exe = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(CONVERSION_MAP_FILE)));
        let in_config = PathBuf::from("config").join(CONVERSION_MAP_FILE);

        beside_exe
            .into_iter()
            .chain(std::iter::once(in_config))
            .find(|candidate| {
                let found = candidate.is_file();
                if !found {
                    debug!("No conversion map at {}", candidate.display());
                }
                found
            })
    }

    /// Rules for an entity type, matched case-insensitively
    pub fn class_mapping(&self, type_name: &str) -> Option<&ClassMapping> {
        self.index
            .get(&type_name.to_ascii_uppercase())
            .and_then(|key| self.classes.get(key))
    }

    /// Whether entities of this type are projected
    pub fn is_mapped(&self, type_name: &str) -> bool {
        self.class_mapping(type_name).is_some()
    }

    /// Predicates for a property set name
    pub fn pset(&self, name: &str) -> Option<&PredicateMap> {
        self.psets.get(name)
    }

    /// Predicates for a quantity set name
    pub fn qset(&self, name: &str) -> Option<&PredicateMap> {
        self.qsets.get(name)
    }

    /// Number of mapped entity types
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Whether nothing at all is mapped
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.psets.is_empty() && self.qsets.is_empty()
    }
}
