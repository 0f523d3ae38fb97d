//! Baseline for the certificate controller.

use super::labels::Labels;
use super::{named_rule, rule, template, Component, ComponentName, RoleData, SupportedVersion};
use crate::args::ComponentConfig;
use crate::constants::{BASE_NAME, OPERAND_NAMESPACE};
use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

const NAME: ComponentName = ComponentName::Controller;
const METRICS_PORT: i32 = 9402;

pub(super) fn baseline(version: &SupportedVersion) -> Component {
    let mut container = template::container(NAME, version);
    container.ports = Some(vec![template::port("http-metrics", METRICS_PORT)]);

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
        cluster_roles: cluster_roles(),
        deployment: template::deployment(NAME, container),
        service: Some(service()),
        webhooks: Vec::new(),
        default_config: ComponentConfig::new()
            .with_flag("v", 2)
            .with_flag("cluster-resource-namespace", "$(POD_NAMESPACE)")
            .with_flag("leader-election-namespace", OPERAND_NAMESPACE)
            .with_flag("max-concurrent-challenges", 60),
    }
}

fn cluster_role(purpose: &str, rules: Vec<k8s_openapi::api::rbac::v1::PolicyRule>) -> RoleData {
    RoleData {
        name: NAME.scoped_name(purpose),
        is_aggregate: false,
        labels: Labels::new(),
        rules,
    }
}

fn events() -> k8s_openapi::api::rbac::v1::PolicyRule {
    rule(&[""], &["events"], &["create", "patch"])
}

fn read_secrets() -> k8s_openapi::api::rbac::v1::PolicyRule {
    rule(&[""], &["secrets"], &["get", "list", "watch"])
}

#[allow(clippy::too_many_lines, reason = "flat RBAC table")]
fn cluster_roles() -> Vec<RoleData> {
    let manage_secrets = rule(
        &[""],
        &["secrets"],
        &["get", "list", "watch", "create", "update", "delete", "patch"],
    );
    let read_issuers = rule(
        &["cert-manager.io"],
        &["issuers", "clusterissuers"],
        &["get", "list", "watch"],
    );

    vec![
        cluster_role(
            "issuers",
            vec![
                rule(&["cert-manager.io"], &["issuers", "issuers/status"], &["update", "patch"]),
                rule(&["cert-manager.io"], &["issuers"], &["get", "list", "watch"]),
                manage_secrets.clone(),
                events(),
            ],
        ),
        cluster_role(
            "clusterissuers",
            vec![
                rule(
                    &["cert-manager.io"],
                    &["clusterissuers", "clusterissuers/status"],
                    &["update", "patch"],
                ),
                rule(&["cert-manager.io"], &["clusterissuers"], &["get", "list", "watch"]),
                manage_secrets.clone(),
                events(),
            ],
        ),
        cluster_role(
            "certificates",
            vec![
                rule(
                    &["cert-manager.io"],
                    &[
                        "certificates",
                        "certificates/status",
                        "certificaterequests",
                        "certificaterequests/status",
                    ],
                    &["update", "patch"],
                ),
                rule(
                    &["cert-manager.io"],
                    &["certificates", "certificaterequests", "clusterissuers", "issuers"],
                    &["get", "list", "watch"],
                ),
                rule(
                    &["cert-manager.io"],
                    &["certificates/finalizers", "certificaterequests/finalizers"],
                    &["update"],
                ),
                rule(
                    &["acme.cert-manager.io"],
                    &["orders"],
                    &["create", "delete", "get", "list", "watch"],
                ),
                manage_secrets,
                events(),
            ],
        ),
        cluster_role(
            "orders",
            vec![
                rule(
                    &["acme.cert-manager.io"],
                    &["orders", "orders/status"],
                    &["update", "patch"],
                ),
                rule(
                    &["acme.cert-manager.io"],
                    &["orders", "challenges"],
                    &["get", "list", "watch"],
                ),
                read_issuers.clone(),
                rule(&["acme.cert-manager.io"], &["challenges"], &["create", "delete"]),
                rule(&["acme.cert-manager.io"], &["orders/finalizers"], &["update"]),
                read_secrets(),
                events(),
            ],
        ),
        cluster_role(
            "challenges",
            vec![
                rule(
                    &["acme.cert-manager.io"],
                    &["challenges", "challenges/status"],
                    &["update", "patch"],
                ),
                rule(&["acme.cert-manager.io"], &["challenges"], &["get", "list", "watch"]),
                read_issuers.clone(),
                read_secrets(),
                events(),
                rule(
                    &[""],
                    &["pods", "services"],
                    &["get", "list", "watch", "create", "delete"],
                ),
                rule(
                    &["networking.k8s.io"],
                    &["ingresses"],
                    &["get", "list", "watch", "create", "delete", "update"],
                ),
                rule(
                    &["gateway.networking.k8s.io"],
                    &["httproutes"],
                    &["get", "list", "watch", "create", "delete", "update"],
                ),
                rule(&["route.openshift.io"], &["routes/custom-host"], &["create"]),
                rule(&["acme.cert-manager.io"], &["challenges/finalizers"], &["update"]),
            ],
        ),
        cluster_role(
            "ingress-shim",
            vec![
                rule(
                    &["cert-manager.io"],
                    &["certificates", "certificaterequests"],
                    &["create", "update", "delete"],
                ),
                rule(
                    &["cert-manager.io"],
                    &["certificates", "certificaterequests", "issuers", "clusterissuers"],
                    &["get", "list", "watch"],
                ),
                rule(&["networking.k8s.io"], &["ingresses"], &["get", "list", "watch"]),
                rule(&["networking.k8s.io"], &["ingresses/finalizers"], &["update"]),
                rule(
                    &["gateway.networking.k8s.io"],
                    &["gateways", "httproutes"],
                    &["get", "list", "watch"],
                ),
                events(),
            ],
        ),
        cluster_role(
            "approve",
            vec![named_rule(
                &["cert-manager.io"],
                &["signers"],
                &["issuers.cert-manager.io/*", "clusterissuers.cert-manager.io/*"],
                &["approve"],
            )],
        ),
        cluster_role(
            "certificatesigningrequests",
            vec![
                rule(
                    &["certificates.k8s.io"],
                    &["certificatesigningrequests"],
                    &["get", "list", "watch", "update"],
                ),
                rule(
                    &["certificates.k8s.io"],
                    &["certificatesigningrequests/status"],
                    &["update", "patch"],
                ),
                named_rule(
                    &["certificates.k8s.io"],
                    &["signers"],
                    &["issuers.cert-manager.io/*", "clusterissuers.cert-manager.io/*"],
                    &["sign"],
                ),
                rule(&["authorization.k8s.io"], &["subjectaccessreviews"], &["create"]),
            ],
        ),
        aggregate(
            "view",
            &["view", "edit", "admin", "cluster-reader"],
            &["get", "list", "watch"],
        ),
        aggregate(
            "edit",
            &["edit", "admin"],
            &["create", "delete", "deletecollection", "patch", "update"],
        ),
    ]
}

/// `<base>-<purpose>` role folded into the built-in roles named in `into`
fn aggregate(purpose: &str, into: &[&str], verbs: &[&str]) -> RoleData {
    let labels = into.iter().fold(Labels::new(), |labels, role| {
        labels.with(&format!("rbac.authorization.k8s.io/aggregate-to-{role}"), "true")
    });
    RoleData {
        name: format!("{BASE_NAME}-{purpose}"),
        is_aggregate: true,
        labels,
        rules: vec![
            rule(
                &["cert-manager.io"],
                &["certificates", "certificaterequests", "issuers"],
                verbs,
            ),
            rule(&["acme.cert-manager.io"], &["challenges", "orders"], verbs),
        ],
    }
}

fn service() -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(NAME.resource_name()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some("ClusterIP".to_string()),
            ports: Some(vec![ServicePort {
                name: Some("tcp-prometheus-servicemonitor".to_string()),
                port: METRICS_PORT,
                protocol: Some("TCP".to_string()),
                target_port: Some(IntOrString::Int(METRICS_PORT)),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}
