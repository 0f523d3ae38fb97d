//! Baseline for the CA injector.

use super::labels::Labels;
use super::{rule, template, Component, ComponentName, RoleData, SupportedVersion};
use crate::args::ComponentConfig;
use crate::constants::OPERAND_NAMESPACE;

const NAME: ComponentName = ComponentName::CAInjector;

pub(super) fn baseline(version: &SupportedVersion) -> Component {
    Component {
        name: NAME,
        version: version.clone(),
        service_account: NAME.resource_name(),
        labels: Component::identity_labels(NAME),
        roles: vec![RoleData {
            name: NAME.scoped_name("leaderelection"),
            is_aggregate: false,
            labels: Labels::new(),
            rules: vec![rule(
                &["coordination.k8s.io"],
                &["leases"],
                &["get", "create", "update", "patch"],
            )],
        }],
        cluster_roles: vec![RoleData {
            name: NAME.scoped_name("injection"),
            is_aggregate: false,
            labels: Labels::new(),
            rules: vec![
                rule(&["cert-manager.io"], &["certificates"], &["get", "list", "watch"]),
                rule(&[""], &["secrets"], &["get", "list", "watch"]),
                rule(&[""], &["events"], &["get", "create", "update", "patch"]),
                rule(
                    &["admissionregistration.k8s.io"],
                    &["validatingwebhookconfigurations", "mutatingwebhookconfigurations"],
                    &["get", "list", "watch", "update"],
                ),
                rule(
                    &["apiregistration.k8s.io"],
                    &["apiservices"],
                    &["get", "list", "watch", "update"],
                ),
                rule(
                    &["apiextensions.k8s.io"],
                    &["customresourcedefinitions"],
                    &["get", "list", "watch", "update"],
                ),
            ],
        }],
        deployment: template::deployment(NAME, template::container(NAME, version)),
        service: None,
        webhooks: Vec::new(),
        default_config: ComponentConfig::new()
            .with_flag("v", 2)
            .with_flag("leader-election-namespace", OPERAND_NAMESPACE),
    }
}
