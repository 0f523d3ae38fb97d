//! # Resource Synthesizer
//!
//! Turns resolved [`Component`]s plus the `CertManager` override fields into
//! the concrete desired objects, in convergence order:
//!
//! 1. the operand Namespace
//! 2. the version's CRDs
//! 3. per component: ServiceAccount, Roles, RoleBindings, ClusterRoles,
//!    ClusterRoleBindings, Service, Deployment, webhook configurations
//!
//! For a fixed version and CR spec the output is always identical.

mod rbac;
mod webhooks;
mod workload;

pub use rbac::{cluster_role_bindings, cluster_roles, role_bindings, roles};
pub use webhooks::{mutating_webhooks, validating_webhooks};
pub use workload::{deployment, service, DeploymentCustomization};

use crate::constants::OPERAND_NAMESPACE;
use crate::crd::CertManager;
use crate::crd_source::{CrdSource, CrdSourceError};
use crate::registry::{resolve_all, Component, ComponentName, Labels, SupportedVersion};
use crate::store::{ObjectKey, ResourceKind, StoreError};
use k8s_openapi::api::core::v1::{Namespace, ServiceAccount};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::DynamicObject;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error(transparent)]
    Crds(#[from] CrdSourceError),
    #[error("failed to encode desired object: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Identity(#[from] StoreError),
}

/// One object the cluster should contain
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredObject {
    pub kind: ResourceKind,
    pub key: ObjectKey,
    pub object: DynamicObject,
}

impl DesiredObject {
    /// Wrap a typed object
    ///
    /// # Errors
    ///
    /// Fails when the object cannot be encoded or has no name.
    pub fn from_typed<K: Serialize>(kind: ResourceKind, obj: &K) -> Result<Self, SynthesisError> {
        let object: DynamicObject = serde_json::from_value(serde_json::to_value(obj)?)?;
        let key = ObjectKey::of(kind, &object)?;
        Ok(Self { kind, key, object })
    }
}

/// Name of the CR, used for the instance label
pub(crate) fn instance_name(cr: &CertManager) -> &str {
    cr.metadata.name.as_deref().unwrap_or_default()
}

/// Labels carried by every object of `component`
#[must_use]
pub fn object_labels(component: &Component, cr: &CertManager) -> Labels {
    Labels::standard()
        .merged(&component.labels)
        .merged(&Labels::instance(instance_name(cr)))
}

/// Pod selector of `component`: identity plus instance
#[must_use]
pub fn selector_labels(component: &Component, cr: &CertManager) -> Labels {
    component
        .labels
        .merged(&Labels::instance(instance_name(cr)))
}

pub(crate) fn namespaced_meta(name: &str, labels: &Labels) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(OPERAND_NAMESPACE.to_string()),
        labels: Some(labels.to_map()),
        ..Default::default()
    }
}

pub(crate) fn cluster_meta(name: &str, labels: &Labels) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        labels: Some(labels.to_map()),
        ..Default::default()
    }
}

#[must_use]
pub fn namespace(cr: &CertManager) -> Namespace {
    let labels = Labels::standard()
        .merged(&Labels::instance(instance_name(cr)))
        .with("name", OPERAND_NAMESPACE);
    Namespace {
        metadata: cluster_meta(OPERAND_NAMESPACE, &labels),
        ..Default::default()
    }
}

#[must_use]
pub fn service_account(component: &Component, cr: &CertManager) -> ServiceAccount {
    ServiceAccount {
        metadata: namespaced_meta(&component.service_account, &object_labels(component, cr)),
        ..Default::default()
    }
}

/// Every desired object of one component, in convergence order
///
/// # Errors
///
/// Fails when an object cannot be encoded.
pub fn component_objects(
    component: &Component,
    cr: &CertManager,
) -> Result<Vec<DesiredObject>, SynthesisError> {
    let custom = DeploymentCustomization::for_component(cr, component.name);
    let mut out = vec![DesiredObject::from_typed(
        ResourceKind::ServiceAccount,
        &service_account(component, cr),
    )?];
    for role in roles(component, cr) {
        out.push(DesiredObject::from_typed(ResourceKind::Role, &role)?);
    }
    for binding in role_bindings(component, cr) {
        out.push(DesiredObject::from_typed(ResourceKind::RoleBinding, &binding)?);
    }
    for role in cluster_roles(component, cr) {
        out.push(DesiredObject::from_typed(ResourceKind::ClusterRole, &role)?);
    }
    for binding in cluster_role_bindings(component, cr) {
        out.push(DesiredObject::from_typed(
            ResourceKind::ClusterRoleBinding,
            &binding,
        )?);
    }
    if let Some(svc) = service(component, cr) {
        out.push(DesiredObject::from_typed(ResourceKind::Service, &svc)?);
    }
    out.push(DesiredObject::from_typed(
        ResourceKind::Deployment,
        &deployment(component, cr, &custom),
    )?);
    for webhook in mutating_webhooks(component, cr) {
        out.push(DesiredObject::from_typed(
            ResourceKind::MutatingWebhookConfiguration,
            &webhook,
        )?);
    }
    for webhook in validating_webhooks(component, cr) {
        out.push(DesiredObject::from_typed(
            ResourceKind::ValidatingWebhookConfiguration,
            &webhook,
        )?);
    }
    Ok(out)
}

/// The full desired object set for `cr` at `version`
///
/// # Errors
///
/// Fails when the CRD documents cannot be loaded or an object cannot be
/// encoded.
pub fn synthesize(
    cr: &CertManager,
    version: &SupportedVersion,
    crds: &dyn CrdSource,
) -> Result<Vec<DesiredObject>, SynthesisError> {
    warn_unknown_override_keys(cr);

    let mut out = vec![DesiredObject::from_typed(
        ResourceKind::Namespace,
        &namespace(cr),
    )?];
    for crd in crds.load(version.as_str())? {
        out.push(DesiredObject::from_typed(
            ResourceKind::CustomResourceDefinition,
            &crd,
        )?);
    }
    for component in resolve_all(version) {
        out.extend(component_objects(&component, cr)?);
    }
    Ok(out)
}

fn warn_unknown_override_keys(cr: &CertManager) {
    let danger = &cr.spec.danger_zone;
    let keys = danger
        .image_overrides
        .keys()
        .chain(danger.container_arg_overrides.keys());
    for key in keys {
        if key.parse::<ComponentName>().is_err() {
            warn!("⚠️  Ignoring override for unknown component '{}'", key);
        }
    }
}
