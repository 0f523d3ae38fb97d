//! # Status
//!
//! Reduces the health of the owned Deployments and installed CRDs to the
//! `CertManager` status.

use crate::constants::{CONDITION_CRDS_READY, CONDITION_DEPLOYMENTS_READY};
use crate::crd::{CertManagerPhase, CertManagerStatus, Condition, ObjectConditions};
use crate::registry::SupportedVersion;
use crate::store::{ObjectKey, ObjectStore, ResourceKind, StoreError};
use crate::synth::DesiredObject;
use kube::api::DynamicObject;
use serde::Deserialize;
use serde_json::Value;

/// Condition as found on Deployments and CRDs
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObservedCondition {
    #[serde(rename = "type")]
    type_: String,
    status: String,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    last_update_time: Option<String>,
    #[serde(default)]
    last_transition_time: Option<String>,
}

impl From<ObservedCondition> for Condition {
    fn from(c: ObservedCondition) -> Self {
        Condition {
            r#type: c.type_,
            status: c.status,
            reason: c.reason,
            message: c.message,
            last_update_time: c.last_update_time.or(c.last_transition_time),
        }
    }
}

/// Compute the status for the desired object set
///
/// Only reads; the caller decides whether the result is written.
///
/// # Errors
///
/// Fails on any store error other than not-found.
pub async fn aggregate_status(
    store: &dyn ObjectStore,
    version: &SupportedVersion,
    desired: &[DesiredObject],
) -> Result<CertManagerStatus, StoreError> {
    let now = chrono::Utc::now().to_rfc3339();

    let expected_deployments = keys_of(desired, ResourceKind::Deployment);
    let expected_crds = keys_of(desired, ResourceKind::CustomResourceDefinition);
    let deployments = fetch_found(store, &expected_deployments).await?;
    let crds = fetch_found(store, &expected_crds).await?;

    let crds_ready = readiness(
        CONDITION_CRDS_READY,
        "CRDs",
        expected_crds.len(),
        &crds,
        crd_ready,
        &now,
    );
    let deployments_ready = readiness(
        CONDITION_DEPLOYMENTS_READY,
        "Deployments",
        expected_deployments.len(),
        &deployments,
        deployment_ready,
        &now,
    );
    let phase = if crds_ready.is_true() && deployments_ready.is_true() {
        CertManagerPhase::Running
    } else {
        CertManagerPhase::Pending
    };

    Ok(CertManagerStatus {
        phase: Some(phase),
        version: Some(version.as_str().to_string()),
        conditions: vec![crds_ready, deployments_ready],
        deployment_conditions: deployments.iter().map(object_conditions).collect(),
        crd_conditions: crds.iter().map(object_conditions).collect(),
    })
}

fn keys_of(desired: &[DesiredObject], kind: ResourceKind) -> Vec<&ObjectKey> {
    desired
        .iter()
        .filter(|d| d.kind == kind)
        .map(|d| &d.key)
        .collect()
}

async fn fetch_found(
    store: &dyn ObjectStore,
    keys: &[&ObjectKey],
) -> Result<Vec<DynamicObject>, StoreError> {
    let mut found = Vec::with_capacity(keys.len());
    for key in keys {
        if let Some(obj) = store.get(key).await? {
            found.push(obj);
        }
    }
    Ok(found)
}

fn readiness(
    type_: &str,
    noun: &str,
    expected: usize,
    found: &[DynamicObject],
    ready: fn(&DynamicObject) -> bool,
    now: &str,
) -> Condition {
    let healthy = found.iter().filter(|obj| ready(obj)).count();
    let (status, reason, message) = if found.len() != expected {
        (
            "Unknown",
            format!("{noun}Missing"),
            format!("found {} of {expected} expected {noun}", found.len()),
        )
    } else if healthy == expected {
        (
            "True",
            format!("{noun}Ready"),
            format!("{healthy}/{expected} {noun} ready"),
        )
    } else {
        (
            "False",
            format!("{noun}NotReady"),
            format!("{healthy}/{expected} {noun} ready"),
        )
    };
    Condition {
        r#type: type_.to_string(),
        status: status.to_string(),
        reason: Some(reason),
        message: Some(message),
        last_update_time: Some(now.to_string()),
    }
}

fn int_at(obj: &DynamicObject, pointer: &str) -> Option<i64> {
    obj.data.pointer(pointer).and_then(Value::as_i64)
}

/// Available, ready and desired replica counts all agree
#[must_use]
pub fn deployment_ready(obj: &DynamicObject) -> bool {
    let desired = int_at(obj, "/spec/replicas").unwrap_or(1);
    let ready = int_at(obj, "/status/readyReplicas").unwrap_or(0);
    let available = int_at(obj, "/status/availableReplicas").unwrap_or(0);
    available == ready && ready == desired
}

/// Both `Established` and `NamesAccepted` are `True`
#[must_use]
pub fn crd_ready(obj: &DynamicObject) -> bool {
    let conditions = observed_conditions(obj);
    let is_true = |type_: &str| {
        conditions
            .iter()
            .any(|c| c.r#type == type_ && c.is_true())
    };
    is_true("Established") && is_true("NamesAccepted")
}

fn observed_conditions(obj: &DynamicObject) -> Vec<Condition> {
    obj.data
        .pointer("/status/conditions")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value::<ObservedCondition>(item.clone()).ok())
                .map(Condition::from)
                .collect()
        })
        .unwrap_or_default()
}

fn object_conditions(obj: &DynamicObject) -> ObjectConditions {
    ObjectConditions {
        name: obj.metadata.name.clone().unwrap_or_default(),
        conditions: observed_conditions(obj),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(data: Value) -> DynamicObject {
        let mut obj: DynamicObject = serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "Any",
            "metadata": {"name": "x"},
        }))
        .unwrap();
        obj.data = data;
        obj
    }

    #[test]
    fn test_deployment_ready_when_counts_agree() {
        let obj = object(json!({
            "spec": {"replicas": 2},
            "status": {"readyReplicas": 2, "availableReplicas": 2},
        }));
        assert!(deployment_ready(&obj));
    }

    #[test]
    fn test_deployment_defaults_to_one_replica() {
        let obj = object(json!({"status": {"readyReplicas": 1, "availableReplicas": 1}}));
        assert!(deployment_ready(&obj));
        let fresh = object(json!({"spec": {}}));
        assert!(!deployment_ready(&fresh));
    }

    #[test]
    fn test_deployment_not_ready_while_rolling() {
        let obj = object(json!({
            "spec": {"replicas": 1},
            "status": {"readyReplicas": 1, "availableReplicas": 0},
        }));
        assert!(!deployment_ready(&obj));
    }

    #[test]
    fn test_crd_needs_both_conditions() {
        let established_only = object(json!({"status": {"conditions": [
            {"type": "Established", "status": "True"},
        ]}}));
        assert!(!crd_ready(&established_only));

        let both = object(json!({"status": {"conditions": [
            {"type": "NamesAccepted", "status": "True", "lastTransitionTime": "2021-01-01T00:00:00Z"},
            {"type": "Established", "status": "True"},
        ]}}));
        assert!(crd_ready(&both));

        let rejected = object(json!({"status": {"conditions": [
            {"type": "NamesAccepted", "status": "False"},
            {"type": "Established", "status": "True"},
        ]}}));
        assert!(!crd_ready(&rejected));
    }

    #[test]
    fn test_object_conditions_copy_transition_time() {
        let obj = object(json!({"status": {"conditions": [
            {"type": "Available", "status": "True", "reason": "MinimumReplicasAvailable",
             "lastTransitionTime": "2021-01-01T00:00:00Z"},
        ]}}));
        let snapshot = object_conditions(&obj);
        assert_eq!(snapshot.name, "x");
        assert_eq!(snapshot.conditions.len(), 1);
        assert_eq!(
            snapshot.conditions[0].last_update_time.as_deref(),
            Some("2021-01-01T00:00:00Z")
        );
    }

    #[test]
    fn test_readiness_unknown_on_count_mismatch() {
        let found = vec![object(json!({"status": {"readyReplicas": 1, "availableReplicas": 1}}))];
        let condition = readiness("DeploymentsAreReady", "Deployments", 3, &found, deployment_ready, "t");
        assert_eq!(condition.status, "Unknown");
        assert_eq!(condition.reason.as_deref(), Some("DeploymentsMissing"));
    }

    #[test]
    fn test_readiness_vacuously_true_when_nothing_expected() {
        let condition = readiness("CRDsAreReady", "CRDs", 0, &[], crd_ready, "t");
        assert!(condition.is_true());
    }
}
