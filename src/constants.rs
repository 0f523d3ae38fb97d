//! # Constants
//!
//! Shared constants used throughout the operator.
//!
//! Names in this module are part of the operator's compatibility surface:
//! existing clusters are looked up by them, so they must not drift.

/// Name of the only `CertManager` resource that is ever reconciled
pub const RESERVED_CR_NAME: &str = "cluster";

/// Namespace every namespaced operand object lives in
pub const OPERAND_NAMESPACE: &str = "cert-manager";

/// Prefix shared by every operand object name
pub const BASE_NAME: &str = "cert-manager";

/// Field manager / event reporter name
pub const OPERATOR_NAME: &str = "cert-manager-operator";

/// Image repository operand images are pulled from
pub const IMAGE_REPOSITORY: &str = "quay.io/jetstack";

/// Version used when the CR does not request one
pub const DEFAULT_VERSION: &str = "v1.6.1";

/// Every version the operator knows how to install, oldest first
pub const SUPPORTED_VERSIONS: &[&str] = &["v1.4.4", "v1.5.5", "v1.6.1"];

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default directory holding `<version>/crd-*.yaml` manifests
pub const DEFAULT_CRD_MANIFESTS_DIR: &str = "/manifests/crds";

/// Default periodic resync interval (seconds)
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 300;

/// Default Fibonacci backoff floor (minutes)
pub const DEFAULT_BACKOFF_MIN_MINUTES: u64 = 1;

/// Default Fibonacci backoff ceiling (minutes)
pub const DEFAULT_BACKOFF_MAX_MINUTES: u64 = 10;

/// Condition reported for CRD health
pub const CONDITION_CRDS_READY: &str = "CRDsAreReady";

/// Condition reported for Deployment health
pub const CONDITION_DEPLOYMENTS_READY: &str = "DeploymentsAreReady";
