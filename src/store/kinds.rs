//! # Managed Kinds
//!
//! One table of every resource kind the operator touches: API identity,
//! scope, ownership policy and the sub-fields convergence compares.

use crate::crd::CertManager;
use k8s_openapi::api::admissionregistration::v1::{
    MutatingWebhookConfiguration, ValidatingWebhookConfiguration,
};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Service, ServiceAccount};
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, Role, RoleBinding};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::discovery::ApiResource;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    Namespace,
    CustomResourceDefinition,
    ServiceAccount,
    Role,
    RoleBinding,
    ClusterRole,
    ClusterRoleBinding,
    Service,
    Deployment,
    MutatingWebhookConfiguration,
    ValidatingWebhookConfiguration,
    CertManager,
}

/// Whether an object is garbage collected together with the CR
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Carries a controller owner reference to the CR
    Owned,
    /// Never owned; survives deletion of the CR
    Unowned,
}

/// How a mismatching sub-field is written back onto the live object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStrategy {
    /// Overwrite the whole sub-field
    Replace,
    /// Recursive merge; unmanaged live fields survive
    Merge,
}

/// A sub-field compared and overwritten independently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagedField {
    pub path: &'static [&'static str],
    pub strategy: FieldStrategy,
}

impl ManagedField {
    const fn replace(path: &'static [&'static str]) -> Self {
        Self {
            path,
            strategy: FieldStrategy::Replace,
        }
    }

    const fn merge(path: &'static [&'static str]) -> Self {
        Self {
            path,
            strategy: FieldStrategy::Merge,
        }
    }

    /// Dotted path, for logs
    #[must_use]
    pub fn name(&self) -> String {
        self.path.join(".")
    }
}

const LABELS: ManagedField = ManagedField::replace(&["metadata", "labels"]);
const ANNOTATIONS: ManagedField = ManagedField::replace(&["metadata", "annotations"]);
const RULES: ManagedField = ManagedField::replace(&["rules"]);
const AGGREGATION: ManagedField = ManagedField::replace(&["aggregationRule"]);
const ROLE_REF: ManagedField = ManagedField::replace(&["roleRef"]);
const SUBJECTS: ManagedField = ManagedField::replace(&["subjects"]);
const WEBHOOKS: ManagedField = ManagedField::replace(&["webhooks"]);
const SPEC: ManagedField = ManagedField::replace(&["spec"]);
const SPEC_MERGED: ManagedField = ManagedField::merge(&["spec"]);

impl ResourceKind {
    /// Kinds synthesized for the operand, in convergence order
    pub const OPERAND: [ResourceKind; 11] = [
        ResourceKind::Namespace,
        ResourceKind::CustomResourceDefinition,
        ResourceKind::ServiceAccount,
        ResourceKind::Role,
        ResourceKind::RoleBinding,
        ResourceKind::ClusterRole,
        ResourceKind::ClusterRoleBinding,
        ResourceKind::Service,
        ResourceKind::Deployment,
        ResourceKind::MutatingWebhookConfiguration,
        ResourceKind::ValidatingWebhookConfiguration,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Namespace => "Namespace",
            ResourceKind::CustomResourceDefinition => "CustomResourceDefinition",
            ResourceKind::ServiceAccount => "ServiceAccount",
            ResourceKind::Role => "Role",
            ResourceKind::RoleBinding => "RoleBinding",
            ResourceKind::ClusterRole => "ClusterRole",
            ResourceKind::ClusterRoleBinding => "ClusterRoleBinding",
            ResourceKind::Service => "Service",
            ResourceKind::Deployment => "Deployment",
            ResourceKind::MutatingWebhookConfiguration => "MutatingWebhookConfiguration",
            ResourceKind::ValidatingWebhookConfiguration => "ValidatingWebhookConfiguration",
            ResourceKind::CertManager => "CertManager",
        }
    }

    /// Dynamic API descriptor for this kind
    #[must_use]
    pub fn api_resource(self) -> ApiResource {
        match self {
            ResourceKind::Namespace => ApiResource::erase::<Namespace>(&()),
            ResourceKind::CustomResourceDefinition => {
                ApiResource::erase::<CustomResourceDefinition>(&())
            }
            ResourceKind::ServiceAccount => ApiResource::erase::<ServiceAccount>(&()),
            ResourceKind::Role => ApiResource::erase::<Role>(&()),
            ResourceKind::RoleBinding => ApiResource::erase::<RoleBinding>(&()),
            ResourceKind::ClusterRole => ApiResource::erase::<ClusterRole>(&()),
            ResourceKind::ClusterRoleBinding => ApiResource::erase::<ClusterRoleBinding>(&()),
            ResourceKind::Service => ApiResource::erase::<Service>(&()),
            ResourceKind::Deployment => ApiResource::erase::<Deployment>(&()),
            ResourceKind::MutatingWebhookConfiguration => {
                ApiResource::erase::<MutatingWebhookConfiguration>(&())
            }
            ResourceKind::ValidatingWebhookConfiguration => {
                ApiResource::erase::<ValidatingWebhookConfiguration>(&())
            }
            ResourceKind::CertManager => ApiResource::erase::<CertManager>(&()),
        }
    }

    #[must_use]
    pub fn is_namespaced(self) -> bool {
        matches!(
            self,
            ResourceKind::ServiceAccount
                | ResourceKind::Role
                | ResourceKind::RoleBinding
                | ResourceKind::Service
                | ResourceKind::Deployment
        )
    }

    /// CRDs stay behind when the CR is deleted so user certificates survive
    #[must_use]
    pub fn ownership(self) -> Ownership {
        match self {
            ResourceKind::CustomResourceDefinition | ResourceKind::CertManager => {
                Ownership::Unowned
            }
            _ => Ownership::Owned,
        }
    }

    /// Sub-fields compared and written by convergence, in write order
    #[must_use]
    pub fn managed_fields(self) -> &'static [ManagedField] {
        match self {
            ResourceKind::Namespace | ResourceKind::ServiceAccount => &[LABELS],
            ResourceKind::CustomResourceDefinition => &[LABELS, ANNOTATIONS, SPEC],
            ResourceKind::Role => &[LABELS, RULES],
            ResourceKind::ClusterRole => &[LABELS, RULES, AGGREGATION],
            ResourceKind::RoleBinding | ResourceKind::ClusterRoleBinding => {
                &[LABELS, ROLE_REF, SUBJECTS]
            }
            ResourceKind::Service | ResourceKind::Deployment => &[LABELS, SPEC_MERGED],
            ResourceKind::MutatingWebhookConfiguration
            | ResourceKind::ValidatingWebhookConfiguration => &[LABELS, ANNOTATIONS, WEBHOOKS],
            ResourceKind::CertManager => &[],
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_crds_and_cr_are_unowned() {
        assert_eq!(
            ResourceKind::CustomResourceDefinition.ownership(),
            Ownership::Unowned
        );
        assert_eq!(ResourceKind::Deployment.ownership(), Ownership::Owned);
        assert_eq!(ResourceKind::ClusterRole.ownership(), Ownership::Owned);
    }

    #[test]
    fn test_api_resource_identity() {
        let ar = ResourceKind::Deployment.api_resource();
        assert_eq!(ar.group, "apps");
        assert_eq!(ar.plural, "deployments");

        let ar = ResourceKind::CertManager.api_resource();
        assert_eq!(ar.group, "operator.cert-manager.io");
        assert_eq!(ar.kind, "CertManager");
    }

    #[test]
    fn test_workloads_merge_spec() {
        let spec = ResourceKind::Deployment
            .managed_fields()
            .iter()
            .find(|f| f.name() == "spec")
            .unwrap();
        assert_eq!(spec.strategy, FieldStrategy::Merge);
    }
}
