//! # Custom Resource Definitions
//!
//! CRD types for the cert-manager operator.
//!
//! ## Module Structure
//!
//! - `spec.rs` - `CertManager` specification and override knobs
//! - `status.rs` - Status types reported back by the status aggregator

mod spec;
mod status;

pub use spec::{CertManager, CertManagerSpec, DangerZone, ImagePullPolicy};
pub use status::{CertManagerPhase, CertManagerStatus, Condition, ObjectConditions};
