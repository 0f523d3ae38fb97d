//! # Metrics
//!
//! Prometheus metrics for monitoring the operator.
//!
//! ## Metrics Exposed
//!
//! - `cert_manager_operator_reconciliations_total` - Total number of reconciliation passes
//! - `cert_manager_operator_reconciliation_errors_total` - Total number of failed passes
//! - `cert_manager_operator_reconciliation_duration_seconds` - Duration of successful passes
//! - `cert_manager_operator_objects_created_total{kind}` - Objects created by kind
//! - `cert_manager_operator_objects_updated_total{kind}` - Objects updated by kind
//! - `cert_manager_operator_skipped_reconciliations_total{reason}` - Passes that did nothing
//! - `cert_manager_operator_status_writes_total` - Status subresource writes
//! - `cert_manager_operator_requeues_total{reason}` - Requeues scheduled by the error policy

use anyhow::Result;
use prometheus::proto::MetricFamily;
use prometheus::{Histogram, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cert_manager_operator_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cert_manager_operator_reconciliation_errors_total",
        "Total number of reconciliation errors",
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "cert_manager_operator_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static OBJECTS_CREATED_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "cert_manager_operator_objects_created_total",
            "Total number of operand objects created by kind",
        ),
        &["kind"],
    )
    .expect("Failed to create OBJECTS_CREATED_TOTAL metric - this should never happen")
});

static OBJECTS_UPDATED_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "cert_manager_operator_objects_updated_total",
            "Total number of operand objects updated by kind",
        ),
        &["kind"],
    )
    .expect("Failed to create OBJECTS_UPDATED_TOTAL metric - this should never happen")
});

static SKIPPED_RECONCILIATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "cert_manager_operator_skipped_reconciliations_total",
            "Total number of reconciliations that installed nothing, by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create SKIPPED_RECONCILIATIONS_TOTAL metric - this should never happen")
});

static STATUS_WRITES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cert_manager_operator_status_writes_total",
        "Total number of CertManager status updates",
    )
    .expect("Failed to create STATUS_WRITES_TOTAL metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "cert_manager_operator_requeues_total",
            "Total number of requeues scheduled, by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

/// Register every metric with the operator registry
///
/// Fails when called twice.
#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(OBJECTS_CREATED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(OBJECTS_UPDATED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SKIPPED_RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(STATUS_WRITES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;

    Ok(())
}

/// Snapshot of every registered metric family
#[must_use]
pub fn gather() -> Vec<MetricFamily> {
    REGISTRY.gather()
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors() {
    RECONCILIATION_ERRORS_TOTAL.inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_objects_created(kind: &str) {
    OBJECTS_CREATED_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_objects_updated(kind: &str) {
    OBJECTS_UPDATED_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_skipped_reconciliations(reason: &str) {
    SKIPPED_RECONCILIATIONS_TOTAL
        .with_label_values(&[reason])
        .inc();
}

pub fn increment_status_writes() {
    STATUS_WRITES_TOTAL.inc();
}

pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Encoder;

    #[test]
    fn test_register_metrics() {
        // Registering twice is rejected by the registry; either way the
        // families must be exposed afterwards
        let _ = register_metrics();
        increment_reconciliations();
        let mut buffer = Vec::new();
        prometheus::TextEncoder::new()
            .encode(&gather(), &mut buffer)
            .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("cert_manager_operator_reconciliations_total"));
    }

    #[test]
    fn test_increment_reconciliations() {
        let before = RECONCILIATIONS_TOTAL.get();
        increment_reconciliations();
        let after = RECONCILIATIONS_TOTAL.get();
        assert!(after > before);
    }

    #[test]
    fn test_increment_reconciliation_errors() {
        let before = RECONCILIATION_ERRORS_TOTAL.get();
        increment_reconciliation_errors();
        let after = RECONCILIATION_ERRORS_TOTAL.get();
        assert!(after > before);
    }

    #[test]
    fn test_observe_reconciliation_duration() {
        let before = RECONCILIATION_DURATION.get_sample_count();
        observe_reconciliation_duration(1.5);
        assert!(RECONCILIATION_DURATION.get_sample_count() > before);
    }

    #[test]
    fn test_objects_counted_per_kind() {
        let before = OBJECTS_CREATED_TOTAL.with_label_values(&["Lease"]).get();
        increment_objects_created("Lease");
        increment_objects_created("Lease");
        let after = OBJECTS_CREATED_TOTAL.with_label_values(&["Lease"]).get();
        assert!(after >= before + 2);
    }

    #[test]
    fn test_skipped_reconciliations_by_reason() {
        let before = SKIPPED_RECONCILIATIONS_TOTAL
            .with_label_values(&["test-reason"])
            .get();
        increment_skipped_reconciliations("test-reason");
        let after = SKIPPED_RECONCILIATIONS_TOTAL
            .with_label_values(&["test-reason"])
            .get();
        assert_eq!(after, before + 1);
    }
}
