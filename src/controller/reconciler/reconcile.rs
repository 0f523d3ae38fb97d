//! # Reconcile
//!
//! One full pass for the `CertManager` resource: resolve the version,
//! synthesize the desired objects, converge each of them, then publish the
//! aggregated status.

use super::converge::{converge_object, ConvergeOutcome};
use super::status::aggregate_status;
use super::types::{Reconciler, ReconcilerError};
use crate::constants::RESERVED_CR_NAME;
use crate::crd::{CertManager, CertManagerStatus};
use crate::observability::metrics;
use crate::registry::SupportedVersion;
use crate::synth::synthesize;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn, Instrument};

/// Reconcile the `CertManager` resource
///
/// # Errors
///
/// Store, CRD loading and encoding failures end the pass early; the error
/// policy schedules the retry.
pub async fn reconcile(cr: Arc<CertManager>, ctx: Arc<Reconciler>) -> Result<Action, ReconcilerError> {
    let name = cr.metadata.name.clone().unwrap_or_default();
    let span = tracing::span!(
        tracing::Level::INFO,
        "reconcile",
        resource.name = name.as_str(),
        resource.kind = "CertManager"
    );
    reconcile_pass(&cr, &ctx, &name).instrument(span).await
}

async fn reconcile_pass(
    cr: &CertManager,
    ctx: &Reconciler,
    name: &str,
) -> Result<Action, ReconcilerError> {
    if name != RESERVED_CR_NAME {
        debug!(
            "Ignoring CertManager {}: only '{}' is reconciled",
            name, RESERVED_CR_NAME
        );
        metrics::increment_skipped_reconciliations("foreign-name");
        return Ok(Action::await_change());
    }

    if cr.metadata.deletion_timestamp.is_some() {
        info!("🗑️  CertManager {} is being deleted; owned objects are garbage collected", name);
        return Ok(Action::await_change());
    }

    let version = match SupportedVersion::resolve(cr.requested_version()) {
        Ok(version) => version,
        Err(e) => {
            warn!("⚠️  {}; nothing will be installed until the version is changed", e);
            metrics::increment_skipped_reconciliations("unsupported-version");
            return Ok(Action::await_change());
        }
    };

    let start = Instant::now();
    metrics::increment_reconciliations();
    info!("🔄 Reconciling CertManager {} at {}", name, version.as_str());

    let desired = synthesize(cr, &version, ctx.crds.as_ref())?;

    let (mut created, mut updated) = (0_usize, 0_usize);
    for object in &desired {
        match converge_object(ctx.store.as_ref(), ctx.events.as_ref(), cr, object).await? {
            ConvergeOutcome::Created => created += 1,
            ConvergeOutcome::Updated(_) => updated += 1,
            ConvergeOutcome::Unchanged => {}
        }
    }

    let status = aggregate_status(ctx.store.as_ref(), &version, &desired).await?;
    write_status_if_changed(ctx, cr, name, &status).await?;

    ctx.reset_backoff(name);
    metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
    info!(
        "✅ Reconciled CertManager {}: {} objects, {} created, {} updated, phase {:?}",
        name,
        desired.len(),
        created,
        updated,
        status.phase
    );
    Ok(Action::requeue(ctx.config.resync_interval()))
}

async fn write_status_if_changed(
    ctx: &Reconciler,
    cr: &CertManager,
    name: &str,
    status: &CertManagerStatus,
) -> Result<(), ReconcilerError> {
    if cr
        .status
        .as_ref()
        .is_some_and(|current| current.same_observation(status))
    {
        debug!("Status unchanged, skipping update");
        return Ok(());
    }
    ctx.store.patch_status(name, status).await?;
    metrics::increment_status_writes();
    Ok(())
}
