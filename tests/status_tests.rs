//! Integration tests for status aggregation

mod common;

use cert_manager_operator::constants::{
    CONDITION_CRDS_READY, CONDITION_DEPLOYMENTS_READY, OPERAND_NAMESPACE, RESERVED_CR_NAME,
};
use cert_manager_operator::crd::{CertManagerPhase, CertManagerSpec};
use cert_manager_operator::store::ResourceKind;
use common::harness;
use kube::api::DynamicObject;
use serde_json::json;

#[tokio::test]
async fn test_fresh_install_is_pending() {
    let h = harness();
    h.pass(CertManagerSpec::default()).await.unwrap();

    let status = h.store.status(RESERVED_CR_NAME).unwrap();
    assert_eq!(status.phase, Some(CertManagerPhase::Pending));
    assert_eq!(status.version.as_deref(), Some("v1.6.1"));

    let types: Vec<&str> = status.conditions.iter().map(|c| c.r#type.as_str()).collect();
    assert_eq!(types, vec![CONDITION_CRDS_READY, CONDITION_DEPLOYMENTS_READY]);
    assert_eq!(status.condition(CONDITION_DEPLOYMENTS_READY).unwrap().status, "False");
    assert_eq!(status.condition(CONDITION_CRDS_READY).unwrap().status, "False");
    assert_eq!(status.deployment_conditions.len(), 3);
    assert_eq!(status.crd_conditions.len(), 6);
}

#[tokio::test]
async fn test_ready_suite_is_running() {
    let h = harness();
    h.pass(CertManagerSpec::default()).await.unwrap();
    h.mark_deployments_ready();
    h.mark_crds_ready();
    h.store.reset_writes();

    h.pass(CertManagerSpec::default()).await.unwrap();

    let status = h.store.status(RESERVED_CR_NAME).unwrap();
    assert_eq!(status.phase, Some(CertManagerPhase::Running));
    assert!(status.condition(CONDITION_DEPLOYMENTS_READY).unwrap().is_true());
    assert!(status.condition(CONDITION_CRDS_READY).unwrap().is_true());
    assert!(status
        .deployment_conditions
        .iter()
        .all(|d| d.conditions.iter().any(|c| c.r#type == "Available")));

    let writes = h.store.writes();
    assert_eq!(writes.object_writes(), 0);
    assert_eq!(writes.status_writes, 1);
}

#[tokio::test]
async fn test_crds_alone_do_not_make_the_suite_run() {
    let h = harness();
    h.pass(CertManagerSpec::default()).await.unwrap();
    h.mark_crds_ready();

    h.pass(CertManagerSpec::default()).await.unwrap();

    let status = h.store.status(RESERVED_CR_NAME).unwrap();
    assert_eq!(status.phase, Some(CertManagerPhase::Pending));
    assert!(status.condition(CONDITION_CRDS_READY).unwrap().is_true());
    assert!(!status.condition(CONDITION_DEPLOYMENTS_READY).unwrap().is_true());
}

#[tokio::test]
async fn test_rolling_deployment_drops_back_to_pending() {
    let h = harness();
    h.pass(CertManagerSpec::default()).await.unwrap();
    h.mark_deployments_ready();
    h.mark_crds_ready();
    h.pass(CertManagerSpec::default()).await.unwrap();

    let key = h
        .store
        .keys(ResourceKind::Deployment)
        .into_iter()
        .find(|k| k.name == "cert-manager-webhook" && k.namespace.as_deref() == Some(OPERAND_NAMESPACE))
        .unwrap();
    h.store.mutate(&key, |obj: &mut DynamicObject| {
        obj.data["status"]["availableReplicas"] = json!(0);
    });

    h.pass(CertManagerSpec::default()).await.unwrap();

    let status = h.store.status(RESERVED_CR_NAME).unwrap();
    assert_eq!(status.phase, Some(CertManagerPhase::Pending));
    let condition = status.condition(CONDITION_DEPLOYMENTS_READY).unwrap();
    assert_eq!(condition.status, "False");
    assert_eq!(condition.message.as_deref(), Some("2/3 Deployments ready"));
}
