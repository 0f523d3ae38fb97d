//! Deployments and Services.

use super::{namespaced_meta, object_labels, selector_labels};
use crate::args::{merge_args, ConfigSchema};
use crate::crd::CertManager;
use crate::registry::{Component, ComponentName};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use serde_json::{json, Value};
use tracing::warn;

/// Per-pass overrides for one component's Deployment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeploymentCustomization {
    /// Replaces the first container's image
    pub image: Option<String>,
    /// Raw `flags` document layered over the versioned defaults
    pub arg_override: Option<Value>,
}

impl DeploymentCustomization {
    #[must_use]
    pub fn for_component(cr: &CertManager, name: ComponentName) -> Self {
        Self {
            image: cr.image_override(name.as_str()).map(str::to_string),
            arg_override: cr.arg_override(name.as_str()).cloned(),
        }
    }

    /// Override document in configuration shape
    fn override_document(&self) -> Value {
        match &self.arg_override {
            None | Some(Value::Null) => Value::Null,
            Some(raw) => json!({ "flags": raw }),
        }
    }
}

/// Container arguments for `component` after user overrides
#[must_use]
pub fn container_args(component: &Component, custom: &DeploymentCustomization) -> Vec<String> {
    let merged = merge_args(
        &ConfigSchema::Open,
        &component.default_config,
        &custom.override_document(),
    );
    if let Some(reason) = &merged.fallback_reason {
        warn!(
            "⚠️  Ignoring malformed argument override for {}: {}",
            component.name, reason
        );
    }
    for flag in &merged.rejected {
        warn!(
            "⚠️  Skipping flag --{} for {}: {}",
            flag.name, component.name, flag.reason
        );
    }
    for name in &merged.pruned {
        warn!("⚠️  Dropping unknown flag --{} for {}", name, component.name);
    }
    merged.args
}

/// The component's Deployment
///
/// Selector and pod template labels are always the same set.
#[must_use]
pub fn deployment(
    component: &Component,
    cr: &CertManager,
    custom: &DeploymentCustomization,
) -> Deployment {
    let mut deployment = component.deployment.clone();
    let name = component.name.resource_name();
    deployment.metadata = namespaced_meta(&name, &object_labels(component, cr));

    let selector = selector_labels(component, cr).to_map();
    let args = container_args(component, custom);
    let pull_policy = cr.spec.image_pull_policy.map(|p| p.as_str().to_string());

    if let Some(spec) = deployment.spec.as_mut() {
        spec.selector.match_labels = Some(selector.clone());
        spec.template
            .metadata
            .get_or_insert_with(Default::default)
            .labels = Some(selector);

        if let Some(pod) = spec.template.spec.as_mut() {
            pod.service_account_name = Some(component.service_account.clone());
            if let Some(first) = pod.containers.first_mut() {
                if let Some(image) = &custom.image {
                    first.image = Some(image.clone());
                }
                first.args = (!args.is_empty()).then_some(args);
            }
            if let Some(policy) = &pull_policy {
                for container in &mut pod.containers {
                    container.image_pull_policy = Some(policy.clone());
                }
            }
        }
    }
    deployment
}

/// The component's Service, if it exposes one
#[must_use]
pub fn service(component: &Component, cr: &CertManager) -> Option<Service> {
    let mut service = component.service.clone()?;
    service.metadata = namespaced_meta(&component.name.resource_name(), &object_labels(component, cr));
    if let Some(spec) = service.spec.as_mut() {
        spec.selector = Some(selector_labels(component, cr).to_map());
    }
    Some(service)
}
