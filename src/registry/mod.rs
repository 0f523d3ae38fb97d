//! # Component Registry
//!
//! Pure functions mapping a component identity and a version to an immutable
//! description of that component: labels, service account, RBAC, workload
//! template, optional service and optional webhooks.
//!
//! A [`Component`] is built fresh on every call from the latest baseline and
//! then patched towards the requested version (see [`versions`]). Nothing in
//! this module keeps state between calls.

mod cainjector;
mod controller;
pub mod labels;
mod template;
pub mod versions;
mod webhook;

pub use labels::Labels;
pub use versions::{SupportedVersion, UnsupportedVersion, VersionPatch};

use crate::args::ComponentConfig;
use crate::constants::{BASE_NAME, IMAGE_REPOSITORY};
use k8s_openapi::api::admissionregistration::v1::{MutatingWebhook, ValidatingWebhook};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::rbac::v1::PolicyRule;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One deployable sub-application of the suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentName {
    Controller,
    CAInjector,
    Webhook,
}

impl ComponentName {
    pub const ALL: [ComponentName; 3] = [
        ComponentName::Controller,
        ComponentName::CAInjector,
        ComponentName::Webhook,
    ];

    /// Short name used as the override map key
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentName::Controller => "controller",
            ComponentName::CAInjector => "cainjector",
            ComponentName::Webhook => "webhook",
        }
    }

    /// `<base>-<component>`: name of the Deployment, ServiceAccount and Service
    #[must_use]
    pub fn resource_name(self) -> String {
        format!("{BASE_NAME}-{}", self.as_str())
    }

    /// `<base>-<component>:<purpose>`
    #[must_use]
    pub fn scoped_name(self, purpose: &str) -> String {
        format!("{}:{purpose}", self.resource_name())
    }

    /// Default container image for a version
    #[must_use]
    pub fn default_image(self, version: &SupportedVersion) -> String {
        format!("{IMAGE_REPOSITORY}/{}:{version}", self.resource_name())
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentName::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown component '{s}'"))
    }
}

/// A Role or ClusterRole the component needs
#[derive(Debug, Clone, PartialEq)]
pub struct RoleData {
    pub name: String,
    /// Aggregate roles exist for aggregation only and are never bound
    pub is_aggregate: bool,
    pub labels: Labels,
    pub rules: Vec<PolicyRule>,
}

pub type ClusterRoleData = RoleData;

/// Admission webhooks served by a component
///
/// Mutating and validating rules share a name and annotations but are
/// installed as two separate configuration objects.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookData {
    pub name: String,
    pub annotations: BTreeMap<String, String>,
    pub mutating: Vec<MutatingWebhook>,
    pub validating: Vec<ValidatingWebhook>,
}

/// Versioned, immutable description of one component
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub name: ComponentName,
    pub version: SupportedVersion,
    pub service_account: String,
    pub labels: Labels,
    pub roles: Vec<RoleData>,
    pub cluster_roles: Vec<ClusterRoleData>,
    pub deployment: Deployment,
    pub service: Option<Service>,
    /// Empty when the component serves no webhooks
    pub webhooks: Vec<WebhookData>,
    /// Versioned default flags, before user overrides
    pub default_config: ComponentConfig,
}

impl Component {
    /// Build the description of `name` at `version`
    #[must_use]
    pub fn resolve(name: ComponentName, version: &SupportedVersion) -> Component {
        let baseline = match name {
            ComponentName::Controller => controller::baseline(version),
            ComponentName::CAInjector => cainjector::baseline(version),
            ComponentName::Webhook => webhook::baseline(version),
        };
        versions::apply_patches(baseline, version)
    }

    /// Identity labels shared by every object of this component
    pub(crate) fn identity_labels(name: ComponentName) -> Labels {
        Labels::new()
            .with(labels::APP_LABEL, &name.resource_name())
            .with(labels::NAME_LABEL, &name.resource_name())
            .with(labels::COMPONENT_LABEL, name.as_str())
    }
}

/// Resolve a component from an optional requested version
///
/// `None` selects the default version.
///
/// # Panics
///
/// Panics when the version is not supported. Callers must check the version
/// with [`SupportedVersion::resolve`] before reconciling anything; reaching
/// this with an unsupported version is a programming error.
#[must_use]
pub fn resolve_component(name: ComponentName, version: Option<&str>) -> Component {
    let version = SupportedVersion::resolve(version)
        .unwrap_or_else(|e| panic!("resolve_component called with {e}"));
    Component::resolve(name, &version)
}

/// Every component at `version`, in install order
#[must_use]
pub fn resolve_all(version: &SupportedVersion) -> Vec<Component> {
    ComponentName::ALL
        .into_iter()
        .map(|name| Component::resolve(name, version))
        .collect()
}

pub(crate) fn rule(groups: &[&str], resources: &[&str], verbs: &[&str]) -> PolicyRule {
    PolicyRule {
        api_groups: Some(strings(groups)),
        resources: Some(strings(resources)),
        verbs: strings(verbs),
        ..Default::default()
    }
}

pub(crate) fn named_rule(
    groups: &[&str],
    resources: &[&str],
    names: &[&str],
    verbs: &[&str],
) -> PolicyRule {
    PolicyRule {
        resource_names: Some(strings(names)),
        ..rule(groups, resources, verbs)
    }
}

pub(crate) fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}
