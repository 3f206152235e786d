// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `ifc2rdf`: convert an IFC file to RDF Turtle and GLB
//!
//! ```bash
//! ifc2rdf models/house.ifc -u https://example.org/house/ -m config/conversion-map.json
//! ```

use anyhow::Context;
use clap::Parser;
use ifc_rdf_convert::{
    Converter, ConverterConfig, RunResult, DEFAULT_BASE_URL, DEFAULT_GLB_OUTPUT_DIR,
    DEFAULT_RDF_OUTPUT_DIR,
};
use log::{error, info, warn};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// IFC to RDF + GLB converter
#[derive(Parser, Debug)]
#[command(name = "ifc2rdf", version)]
#[command(about = "Convert an IFC file to an RDF Turtle graph and a GLB container")]
struct Args {
    /// Path to the IFC file
    ifc_file: PathBuf,

    /// Asset name used for output files (defaults to the file stem)
    #[arg(short = 'n', long)]
    asset_name: Option<String>,

    /// Base URL of the instance namespace
    #[arg(short = 'u', long, default_value = DEFAULT_BASE_URL, env = "IFC2RDF_BASE_URL")]
    base_url: String,

    /// Output directory for Turtle files
    #[arg(short = 'r', long, default_value = DEFAULT_RDF_OUTPUT_DIR, env = "IFC2RDF_RDF_OUTPUT")]
    rdf_output: PathBuf,

    /// Output directory for GLB files
    #[arg(short = 'g', long, default_value = DEFAULT_GLB_OUTPUT_DIR, env = "IFC2RDF_GLB_OUTPUT")]
    glb_output: PathBuf,

    /// Skip geometry conversion
    #[arg(long)]
    no_geometry: bool,

    /// Custom conversion map (JSON)
    #[arg(short = 'm', long, env = "IFC2RDF_CONVERSION_MAP")]
    conversion_map: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Print the run result as JSON on stdout
    #[arg(long)]
    json: bool,
}

impl Args {
    fn to_config(&self) -> ConverterConfig {
        let mut config = ConverterConfig::new(&self.ifc_file)
            .with_base_url(self.base_url.as_str())
            .with_rdf_output_dir(&self.rdf_output)
            .with_glb_output_dir(&self.glb_output)
            .with_geometry(!self.no_geometry);

        if let Some(name) = &self.asset_name {
            config = config.with_asset_name(name.as_str());
        }
        if let Some(map) = &self.conversion_map {
            if map.is_file() {
                config = config.with_conversion_map(map);
            } else {
                warn!(
                    "Conversion map {} not found, falling back to the default lookup",
                    map.display()
                );
            }
        }
        config
    }
}

/// `--verbose` wins over `RUST_LOG`
fn log_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

fn init_logging(verbose: bool) {
    let filter = log_filter(verbose);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn print_summary(result: &RunResult) {
    if let Some(rdf) = &result.files.rdf {
        info!("RDF: {} ({} bytes, {} triples)", rdf.path.display(), rdf.size, rdf.triples);
    }
    if let Some(glb) = &result.files.glb {
        info!("GLB: {} ({} bytes, {} elements)", glb.path.display(), glb.size, glb.elements);
    }
    if let Some(metadata) = &result.metadata {
        info!(
            "Schema {}: {} entities, {} geometry elements, {} vertices, {} faces",
            metadata.ifc_schema,
            metadata.entities_processed,
            metadata.geometry_elements,
            metadata.total_vertices,
            metadata.total_faces
        );
    }
    for message in &result.errors {
        warn!("{}", message);
    }
}

fn run(args: &Args) -> anyhow::Result<bool> {
    info!("ifc2rdf {}", env!("CARGO_PKG_VERSION"));
    info!("Input: {}", args.ifc_file.display());

    let result = Converter::new(args.to_config()).run();
    print_summary(&result);

    if args.json {
        let json = serde_json::to_string_pretty(&result).context("serializing run result")?;
        println!("{}", json);
    }

    if result.success {
        info!("Conversion finished");
    } else {
        error!("Conversion failed");
    }
    Ok(result.success)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_forces_debug() {
        assert_eq!(log_filter(true).to_string(), "debug");
    }

    #[test]
    fn test_verbose_flag_parses() {
        let args =
            Args::try_parse_from(["ifc2rdf", "house.ifc", "--verbose", "--no-geometry"]).unwrap();
        assert!(args.verbose);
        assert!(!args.to_config().convert_geometry);
    }
}
