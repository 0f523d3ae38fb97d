//! # CertManager Spec
//!
//! The single declarative resource driving the operator.

use crate::constants::SUPPORTED_VERSIONS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// CertManager Custom Resource Definition
///
/// Describes which cert-manager version should run in the cluster and a small
/// set of override knobs. Only the instance named `cluster` is reconciled.
///
/// # Example
///
/// ```yaml
/// apiVersion: operator.cert-manager.io/v1alpha1
/// kind: CertManager
/// metadata:
///   name: cluster
/// spec:
///   version: v1.6.1
///   imagePullPolicy: IfNotPresent
///   dangerZone:
///     imageOverrides:
///       webhook: registry.example.com/cert-manager-webhook:v1.6.1-patched
///     containerArgOverrides:
///       controller:
///         enable-certificate-owner-ref: true
/// ```
#[derive(kube::CustomResource, Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "CertManager",
    group = "operator.cert-manager.io",
    version = "v1alpha1",
    status = "crate::crd::CertManagerStatus",
    shortname = "certmanager",
    printcolumn = r#"{"name":"Version", "type":"string", "jsonPath":".status.version"}"#,
    printcolumn = r#"{"name":"Phase", "type":"string", "jsonPath":".status.phase"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct CertManagerSpec {
    /// Requested cert-manager version
    /// Omit to install the operator's default version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "version_schema")]
    pub version: Option<String>,
    /// Pull policy applied to every operand container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_policy: Option<ImagePullPolicy>,
    /// Unsupported overrides; use at your own risk
    #[serde(default)]
    pub danger_zone: DangerZone,
}

/// Overrides that bypass the versioned defaults
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DangerZone {
    /// Component name (`controller`, `cainjector`, `webhook`) to image reference
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub image_overrides: BTreeMap<String, String>,
    /// Component name to a raw flag document layered over the default flags
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[schemars(schema_with = "raw_overrides_schema")]
    pub container_arg_overrides: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
pub enum ImagePullPolicy {
    Always,
    IfNotPresent,
    Never,
}

impl ImagePullPolicy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ImagePullPolicy::Always => "Always",
            ImagePullPolicy::IfNotPresent => "IfNotPresent",
            ImagePullPolicy::Never => "Never",
        }
    }
}

fn version_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schemars::json_schema!({
        "type": "string",
        "nullable": true,
        "enum": SUPPORTED_VERSIONS,
    })
}

fn raw_overrides_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schemars::json_schema!({
        "type": "object",
        "additionalProperties": {
            "x-kubernetes-preserve-unknown-fields": true,
        },
    })
}

impl CertManager {
    /// Version requested by the spec, if any
    #[must_use]
    pub fn requested_version(&self) -> Option<&str> {
        self.spec.version.as_deref()
    }

    /// Image override configured for a component
    #[must_use]
    pub fn image_override(&self, component: &str) -> Option<&str> {
        self.spec
            .danger_zone
            .image_overrides
            .get(component)
            .map(String::as_str)
    }

    /// Raw argument override document configured for a component
    #[must_use]
    pub fn arg_override(&self, component: &str) -> Option<&serde_json::Value> {
        self.spec.danger_zone.container_arg_overrides.get(component)
    }
}
