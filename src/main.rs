//! # cert-manager Operator
//!
//! A Kubernetes operator that installs the cert-manager suite and keeps it
//! converged with a single `CertManager` resource.
//!
//! ## Overview
//!
//! 1. **Version resolution** - `spec.version` selects one of the supported releases
//! 2. **Synthesis** - every Namespace, CRD, RBAC object, Deployment, Service and
//!    webhook configuration is derived from the version and the CR overrides
//! 3. **Convergence** - missing objects are created; drifted managed fields are
//!    rewritten, leaving everything else on the live object untouched
//! 4. **Status** - CRD and Deployment health is reduced to a phase on the CR
//!
//! ## Endpoints
//!
//! - `/metrics`, `/healthz`, `/readyz` on `METRICS_PORT`

use anyhow::Result;
use cert_manager_operator::runtime::{initialization::initialize, watch_loop::run_watch_loop};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialize().await?;

    run_watch_loop(init.client, init.reconciler, init.server_state).await?;

    info!("cert-manager operator stopped");
    Ok(())
}
