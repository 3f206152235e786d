// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Converter configuration

use std::path::{Path, PathBuf};

/// Default instance namespace
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/data/";
/// Default Turtle output directory
pub const DEFAULT_RDF_OUTPUT_DIR: &str = "./data/rdf";
/// Default GLB output directory
pub const DEFAULT_GLB_OUTPUT_DIR: &str = "./data/glb";

/// Settings for one conversion run
#[derive(Clone, Debug)]
pub struct ConverterConfig {
    /// IFC file to convert
    pub ifc_file: PathBuf,
    /// Stem of the output files; the IFC file stem when `None`
    pub asset_name: Option<String>,
    /// Instance namespace, always ending with `/`
    pub base_url: String,
    /// Directory receiving `{asset}.ttl`
    pub rdf_output_dir: PathBuf,
    /// Directory receiving `{asset}.glb`
    pub glb_output_dir: PathBuf,
    /// Whether to tessellate and write the GLB container
    pub convert_geometry: bool,
    /// Explicit conversion map; searched for when `None`
    pub conversion_map: Option<PathBuf>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            ifc_file: PathBuf::new(),
            asset_name: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            rdf_output_dir: PathBuf::from(DEFAULT_RDF_OUTPUT_DIR),
            glb_output_dir: PathBuf::from(DEFAULT_GLB_OUTPUT_DIR),
            convert_geometry: true,
            conversion_map: None,
        }
    }
}

impl ConverterConfig {
    /// Defaults for converting `ifc_file`
    pub fn new(ifc_file: impl Into<PathBuf>) -> Self {
        Self {
            ifc_file: ifc_file.into(),
            ..Self::default()
        }
    }

    /// Set the asset name used for output files and the main geometry node
    pub fn with_asset_name(mut self, name: impl Into<String>) -> Self {
        self.asset_name = Some(name.into());
        self
    }

    /// Set the instance namespace (a trailing `/` is added when missing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_base_url(base_url.into());
        self
    }

    /// Set the Turtle output directory
    pub fn with_rdf_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.rdf_output_dir = dir.into();
        self
    }

    /// Set the GLB output directory
    pub fn with_glb_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.glb_output_dir = dir.into();
        self
    }

    /// Enable or disable geometry conversion
    pub fn with_geometry(mut self, enabled: bool) -> Self {
        self.convert_geometry = enabled;
        self
    }

    /// Use an explicit conversion map file
    pub fn with_conversion_map(mut self, path: impl Into<PathBuf>) -> Self {
        self.conversion_map = Some(path.into());
        self
    }

    /// Asset name, falling back to the IFC file stem
    pub fn resolved_asset_name(&self) -> String {
        self.asset_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .or_else(|| file_stem(&self.ifc_file))
            .unwrap_or_else(|| "model".to_string())
    }

    /// Base URL with the trailing separator enforced
    pub fn namespace(&self) -> String {
        normalize_base_url(self.base_url.clone())
    }
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
}

/// Append `/` unless the URL already ends with one
pub fn normalize_base_url(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}
