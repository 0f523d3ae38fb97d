//! Baseline for the admission webhook.

use super::labels::Labels;
use super::{
    named_rule, rule, strings, template, Component, ComponentName, RoleData, SupportedVersion,
    WebhookData,
};
use crate::args::ComponentConfig;
use crate::constants::{BASE_NAME, OPERAND_NAMESPACE};
use k8s_openapi::api::admissionregistration::v1::{
    MutatingWebhook, RuleWithOperations, ServiceReference, ValidatingWebhook, WebhookClientConfig,
};
use k8s_openapi::api::core::v1::{HTTPGetAction, Probe, Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{
    LabelSelector, LabelSelectorRequirement, ObjectMeta,
};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;

const NAME: ComponentName = ComponentName::Webhook;
const SECURE_PORT: i32 = 10250;
const HEALTH_PORT: i32 = 6080;
const WEBHOOK_NAME: &str = "webhook.cert-manager.io";

fn ca_secret_name() -> String {
    format!("{}-ca", NAME.resource_name())
}

pub(super) fn baseline(version: &SupportedVersion) -> Component {
    let mut container = template::container(NAME, version);
    container.ports = Some(vec![template::port("https", SECURE_PORT)]);
    container.liveness_probe = Some(probe("/livez", 60));
    container.readiness_probe = Some(probe("/healthz", 5));

    let service_name = NAME.resource_name();
    let dns_names = vec![
        service_name.clone(),
        format!("{service_name}.{OPERAND_NAMESPACE}"),
        format!("{service_name}.{OPERAND_NAMESPACE}.svc"),
    ];

    Component {
        name: NAME,
        version: version.clone(),
        service_account: NAME.resource_name(),
        labels: Component::identity_labels(NAME),
        roles: vec![RoleData {
            name: NAME.scoped_name("dynamic-serving"),
            is_aggregate: false,
            labels: Labels::new(),
            rules: vec![
                named_rule(
                    &[""],
                    &["secrets"],
                    &[&ca_secret_name()],
                    &["get", "list", "watch", "update"],
                ),
                rule(&[""], &["secrets"], &["create"]),
            ],
        }],
        cluster_roles: vec![RoleData {
            name: NAME.scoped_name("subjectaccessreviews"),
            is_aggregate: false,
            labels: Labels::new(),
            rules: vec![rule(
                &["authorization.k8s.io"],
                &["subjectaccessreviews"],
                &["create"],
            )],
        }],
        deployment: template::deployment(NAME, container),
        service: Some(service()),
        webhooks: vec![webhooks()],
        default_config: ComponentConfig::new()
            .with_flag("v", 2)
            .with_flag("secure-port", SECURE_PORT)
            .with_flag("dynamic-serving-ca-secret-namespace", "$(POD_NAMESPACE)")
            .with_flag("dynamic-serving-ca-secret-name", ca_secret_name())
            .with_flag("dynamic-serving-dns-names", dns_names),
    }
}

fn probe(path: &str, initial_delay: i32) -> Probe {
    Probe {
        http_get: Some(HTTPGetAction {
            path: Some(path.to_string()),
            port: IntOrString::Int(HEALTH_PORT),
            scheme: Some("HTTP".to_string()),
            ..Default::default()
        }),
        initial_delay_seconds: Some(initial_delay),
        period_seconds: Some(10),
        timeout_seconds: Some(1),
        success_threshold: Some(1),
        failure_threshold: Some(3),
        ..Default::default()
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
                name: Some("https".to_string()),
                port: 443,
                protocol: Some("TCP".to_string()),
                target_port: Some(IntOrString::String("https".to_string())),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn admission_rules() -> Vec<RuleWithOperations> {
    vec![RuleWithOperations {
        api_groups: Some(strings(&["cert-manager.io", "acme.cert-manager.io"])),
        api_versions: Some(strings(&["v1"])),
        operations: Some(strings(&["CREATE", "UPDATE"])),
        resources: Some(strings(&["*/*"])),
        ..Default::default()
    }]
}

// The service namespace is rewritten to the operand namespace by the
// synthesizer; the template value is never used as-is.
fn client_config(path: &str) -> WebhookClientConfig {
    WebhookClientConfig {
        service: Some(ServiceReference {
            name: NAME.resource_name(),
            namespace: String::new(),
            path: Some(path.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn webhooks() -> WebhookData {
    let mut annotations = BTreeMap::new();
    annotations.insert(
        "cert-manager.io/inject-ca-from-secret".to_string(),
        format!("{OPERAND_NAMESPACE}/{}", ca_secret_name()),
    );

    WebhookData {
        name: format!("{BASE_NAME}-webhook"),
        annotations,
        mutating: vec![MutatingWebhook {
            name: WEBHOOK_NAME.to_string(),
            rules: Some(admission_rules()),
            admission_review_versions: strings(&["v1"]),
            match_policy: Some("Equivalent".to_string()),
            timeout_seconds: Some(10),
            failure_policy: Some("Fail".to_string()),
            side_effects: "None".to_string(),
            client_config: client_config("/mutate"),
            ..Default::default()
        }],
        validating: vec![ValidatingWebhook {
            name: WEBHOOK_NAME.to_string(),
            namespace_selector: Some(LabelSelector {
                match_expressions: Some(vec![
                    LabelSelectorRequirement {
                        key: "cert-manager.io/disable-validation".to_string(),
                        operator: "NotIn".to_string(),
                        values: Some(strings(&["true"])),
                    },
                    LabelSelectorRequirement {
                        key: "name".to_string(),
                        operator: "NotIn".to_string(),
                        values: Some(strings(&[BASE_NAME])),
                    },
                ]),
                ..Default::default()
            }),
            rules: Some(admission_rules()),
            admission_review_versions: strings(&["v1"]),
            match_policy: Some("Equivalent".to_string()),
            timeout_seconds: Some(10),
            failure_policy: Some("Fail".to_string()),
            side_effects: "None".to_string(),
            client_config: client_config("/validate"),
            ..Default::default()
        }],
    }
}
