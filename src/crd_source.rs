//! # CRD Documents
//!
//! CustomResourceDefinitions are not synthesized: each supported version
//! ships a fixed set of YAML manifests that are read and decoded as-is.
//!
//! Layout: `<root>/<version>/crd-<plural>.yaml`.

use crate::constants::SUPPORTED_VERSIONS;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// Manifest files per version, in install order
pub const CRD_FILES: &[&str] = &[
    "crd-certificaterequests.yaml",
    "crd-certificates.yaml",
    "crd-challenges.yaml",
    "crd-clusterissuers.yaml",
    "crd-issuers.yaml",
    "crd-orders.yaml",
];

#[derive(Debug, Error)]
pub enum CrdSourceError {
    #[error("no CRD manifests for unsupported version {0}")]
    UnsupportedVersion(String),
    #[error("CRD manifest {} is missing", .0.display())]
    MissingFile(PathBuf),
    #[error("failed to read CRD manifest {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode CRD manifest {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Provider of the CRD set for a version
pub trait CrdSource: Send + Sync {
    /// Decoded CRDs for `version`, in [`CRD_FILES`] order
    ///
    /// # Errors
    ///
    /// Fails when the version is unsupported or a document is missing or
    /// does not decode.
    fn load(&self, version: &str) -> Result<Vec<CustomResourceDefinition>, CrdSourceError>;
}

/// Reads manifests from a directory tree
#[derive(Debug, Clone)]
pub struct FileCrdSource {
    root: PathBuf,
}

impl FileCrdSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Paths that make up the CRD set for `version`
    ///
    /// # Errors
    ///
    /// Returns [`CrdSourceError::UnsupportedVersion`] for unknown versions.
    pub fn paths(&self, version: &str) -> Result<Vec<PathBuf>, CrdSourceError> {
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(CrdSourceError::UnsupportedVersion(version.to_string()));
        }
        let dir = self.root.join(version);
        Ok(CRD_FILES.iter().map(|file| dir.join(file)).collect())
    }
}

impl CrdSource for FileCrdSource {
    fn load(&self, version: &str) -> Result<Vec<CustomResourceDefinition>, CrdSourceError> {
        self.paths(version)?
            .into_iter()
            .map(|path| {
                let raw = std::fs::read_to_string(&path).map_err(|source| {
                    if source.kind() == std::io::ErrorKind::NotFound {
                        CrdSourceError::MissingFile(path.clone())
                    } else {
                        CrdSourceError::Read {
                            path: path.clone(),
                            source,
                        }
                    }
                })?;
                debug!("Loaded CRD manifest {}", path.display());
                serde_yaml::from_str(&raw).map_err(|source| CrdSourceError::Decode { path, source })
            })
            .collect()
    }
}
