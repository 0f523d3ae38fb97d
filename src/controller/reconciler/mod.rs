//! # Reconciler
//!
//! Reconciles the `CertManager` resource against the cluster.

mod converge;
mod reconcile;
mod status;
mod types;

pub use converge::{converge_object, ConvergeOutcome};
pub use reconcile::reconcile;
pub use status::{aggregate_status, crd_ready, deployment_ready};
pub use types::{BackoffState, Reconciler, ReconcilerError};
