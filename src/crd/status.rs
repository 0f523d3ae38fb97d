//! # CertManager Status
//!
//! Status types written back by the status aggregator.

use serde::{Deserialize, Serialize};

/// Status of the CertManager resource
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertManagerStatus {
    /// Coarse health summary
    /// Unset until the first successful pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<CertManagerPhase>,
    /// Version that was resolved and installed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// `CRDsAreReady` and `DeploymentsAreReady`, rebuilt every pass
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Conditions copied from each operand Deployment
    #[serde(default)]
    pub deployment_conditions: Vec<ObjectConditions>,
    /// Conditions copied from each installed CRD
    #[serde(default)]
    pub crd_conditions: Vec<ObjectConditions>,
}

/// Coarse-grained phase
///
/// `Progressing` is part of the API but nothing assigns it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
pub enum CertManagerPhase {
    Unknown,
    Pending,
    Progressing,
    Running,
}

/// Condition represents a condition of a resource
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    pub r#type: String,
    /// Status of the condition (True, False, Unknown)
    pub status: String,
    /// Reason for the condition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Message describing the condition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Last time the condition was computed (RFC3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<String>,
}

/// Snapshot of one owned object's conditions
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectConditions {
    pub name: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Condition {
    #[must_use]
    pub fn is_true(&self) -> bool {
        self.status == "True"
    }
}

impl CertManagerStatus {
    /// Look up a condition by type
    #[must_use]
    pub fn condition(&self, type_: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.r#type == type_)
    }

    /// Compare two statuses ignoring condition timestamps
    ///
    /// Used to skip status writes that would only bump `lastUpdateTime`;
    /// every status write triggers a watch event on the CR.
    #[must_use]
    pub fn same_observation(&self, other: &CertManagerStatus) -> bool {
        fn strip(conditions: &[Condition]) -> Vec<Condition> {
            conditions
                .iter()
                .map(|c| Condition {
                    last_update_time: None,
                    ..c.clone()
                })
                .collect()
        }
        fn strip_objects(objects: &[ObjectConditions]) -> Vec<ObjectConditions> {
            objects
                .iter()
                .map(|o| ObjectConditions {
                    name: o.name.clone(),
                    conditions: strip(&o.conditions),
                })
                .collect()
        }

        self.phase == other.phase
            && self.version == other.version
            && strip(&self.conditions) == strip(&other.conditions)
            && strip_objects(&self.deployment_conditions) == strip_objects(&other.deployment_conditions)
            && strip_objects(&self.crd_conditions) == strip_objects(&other.crd_conditions)
    }
}
