//! # Error Policy
//!
//! Error handling and backoff logic for the controller watch loop.

use crate::controller::reconciler::{Reconciler, ReconcilerError};
use crate::crd::CertManager;
use crate::observability;
use kube_runtime::controller::Action;
use std::sync::Arc;
use tracing::{error, info};

/// Handle reconciliation errors with Fibonacci backoff
///
/// Backoff state is tracked per resource name and reset by the next
/// successful pass.
pub fn handle_reconciliation_error(
    obj: Arc<CertManager>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let name = obj.metadata.name.as_deref().unwrap_or("unknown");

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        resource.name = name,
        error = %error
    );
    let _error_guard = error_span.enter();

    error!("Reconciliation error for {}: {:?}", name, error);
    observability::metrics::increment_reconciliation_errors();

    let (backoff_seconds, error_count) = ctx.record_failure(name);
    let next_trigger_time = chrono::Utc::now()
        + chrono::Duration::seconds(i64::try_from(backoff_seconds).unwrap_or(i64::MAX));

    info!(
        "🔄 Retrying with Fibonacci backoff: {}s (error count: {}, trigger source: error-backoff)",
        backoff_seconds, error_count
    );
    info!(
        "📅 Next retry scheduled: {} (in {}s, trigger source: error-backoff)",
        next_trigger_time.to_rfc3339(),
        backoff_seconds
    );

    observability::metrics::increment_requeues_total("error-backoff");
    Action::requeue(std::time::Duration::from_secs(backoff_seconds))
}
