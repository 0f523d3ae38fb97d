//! Integration tests for whole reconciliation passes
//!
//! Drives `reconcile` over the in-memory store and the shipped CRD manifests.

mod common;

use cert_manager_operator::constants::{OPERAND_NAMESPACE, RESERVED_CR_NAME};
use cert_manager_operator::controller::reconciler::ReconcilerError;
use cert_manager_operator::crd::{CertManager, CertManagerSpec};
use cert_manager_operator::store::{ObjectKey, ResourceKind};
use common::{harness, harness_with_crds, named_cr, MissingCrds};
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Duration;

fn spec_with_version(version: &str) -> CertManagerSpec {
    CertManagerSpec {
        version: Some(version.to_string()),
        ..CertManagerSpec::default()
    }
}

#[tokio::test]
async fn test_first_pass_installs_the_suite() {
    let h = harness();

    let action = h.pass(CertManagerSpec::default()).await.unwrap();

    assert_eq!(action, Action::requeue(Duration::from_secs(300)));
    assert!(h
        .store
        .object(&ObjectKey::new(ResourceKind::Namespace, None, OPERAND_NAMESPACE))
        .is_some());
    assert_eq!(h.store.keys(ResourceKind::CustomResourceDefinition).len(), 6);

    let deployments: Vec<String> = h
        .store
        .keys(ResourceKind::Deployment)
        .into_iter()
        .map(|k| k.name)
        .collect();
    assert_eq!(
        deployments,
        vec![
            "cert-manager-cainjector",
            "cert-manager-controller",
            "cert-manager-webhook",
        ]
    );
    assert_eq!(h.store.keys(ResourceKind::Service).len(), 2);
    assert_eq!(h.store.keys(ResourceKind::MutatingWebhookConfiguration).len(), 1);
    assert_eq!(h.store.keys(ResourceKind::ValidatingWebhookConfiguration).len(), 1);

    let writes = h.store.writes();
    assert_eq!(writes.creates, h.store.len());
    assert_eq!(writes.updates, 0);
    assert_eq!(writes.status_writes, 1);
}

#[tokio::test]
async fn test_second_pass_issues_no_writes() {
    let h = harness();
    h.pass(CertManagerSpec::default()).await.unwrap();
    h.store.reset_writes();
    h.events.clear();

    h.pass(CertManagerSpec::default()).await.unwrap();

    let writes = h.store.writes();
    assert_eq!(writes.object_writes(), 0);
    assert_eq!(writes.status_writes, 0);
    assert!(h.events.events().is_empty());
}

#[tokio::test]
async fn test_every_supported_version_converges() {
    for version in ["v1.4.4", "v1.5.5", "v1.6.1"] {
        let h = harness();
        h.pass(spec_with_version(version)).await.unwrap();
        h.store.reset_writes();
        h.pass(spec_with_version(version)).await.unwrap();

        assert_eq!(h.store.writes().object_writes(), 0, "{version}");
        assert_eq!(
            h.store.status(RESERVED_CR_NAME).unwrap().version.as_deref(),
            Some(version)
        );
    }
}

#[tokio::test]
async fn test_legacy_version_has_no_csr_cluster_role() {
    let h = harness();
    h.pass(spec_with_version("v1.4.4")).await.unwrap();

    let cluster_roles: Vec<String> = h
        .store
        .keys(ResourceKind::ClusterRole)
        .into_iter()
        .map(|k| k.name)
        .collect();
    assert!(!cluster_roles.iter().any(|n| n.contains("certificatesigningrequests")));
    assert!(cluster_roles.iter().any(|n| n.contains("approve")));
}

#[tokio::test]
async fn test_unsupported_version_installs_nothing() {
    let h = harness();

    let action = h.pass(spec_with_version("v0.0.0")).await.unwrap();

    assert_eq!(action, Action::await_change());
    assert!(h.store.is_empty());
    assert!(h.store.status(RESERVED_CR_NAME).is_none());
    assert!(h.events.events().is_empty());
}

#[tokio::test]
async fn test_foreign_cr_name_is_ignored() {
    let h = harness();

    let action = h
        .run(named_cr("my-cert-manager", CertManagerSpec::default()))
        .await
        .unwrap();

    assert_eq!(action, Action::await_change());
    assert!(h.store.is_empty());
    assert!(h.store.status("my-cert-manager").is_none());
}

#[tokio::test]
async fn test_deleting_cr_is_left_to_garbage_collection() {
    let h = harness();
    let cr: CertManager = serde_json::from_value(serde_json::json!({
        "apiVersion": "operator.cert-manager.io/v1alpha1",
        "kind": "CertManager",
        "metadata": {
            "name": "cluster",
            "uid": common::CR_UID,
            "deletionTimestamp": "2026-01-01T00:00:00Z",
        },
        "spec": {},
    }))
    .unwrap();

    let action = h.run(cr).await.unwrap();

    assert_eq!(action, Action::await_change());
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn test_missing_crd_manifests_fail_the_pass() {
    let h = harness_with_crds(Arc::new(MissingCrds));

    let err = h.pass(CertManagerSpec::default()).await.unwrap_err();

    assert!(matches!(err, ReconcilerError::Synthesis(_)));
    assert!(h.store.is_empty());
    assert!(h.store.status(RESERVED_CR_NAME).is_none());
}

#[tokio::test]
async fn test_failure_then_success_resets_backoff() {
    let h = harness();
    h.ctx.record_failure(RESERVED_CR_NAME);
    assert_eq!(h.ctx.error_count(RESERVED_CR_NAME), 1);

    h.pass(CertManagerSpec::default()).await.unwrap();

    assert_eq!(h.ctx.error_count(RESERVED_CR_NAME), 0);
}
