//! # CRD Generator
//!
//! Generates the `CertManager` CustomResourceDefinition YAML from the Rust
//! type definitions.
//!
//! ## Usage
//!
//! ```bash
//! # Print to stdout
//! cargo run --bin crdgen > config/crd/certmanager.yaml
//!
//! # Write to a file
//! cargo run --bin crdgen -- --output config/crd/certmanager.yaml
//! ```

use anyhow::{Context, Result};
use cert_manager_operator::crd::CertManager;
use clap::Parser;
use kube::core::CustomResourceExt;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "crdgen", about = "Generate the CertManager CRD manifest")]
struct Args {
    /// Write the manifest to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let yaml = serde_yaml::to_string(&CertManager::crd()).context("Failed to serialize CRD")?;

    match args.output {
        Some(path) => std::fs::write(&path, yaml)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => print!("{yaml}"),
    }
    Ok(())
}
