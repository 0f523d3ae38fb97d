//! Admission webhook configurations.
//!
//! Each [`WebhookData`](crate::registry::WebhookData) becomes one mutating
//! and one validating configuration with the same name and annotations. The
//! client-config service namespace is always the operand namespace.

use super::{cluster_meta, object_labels};
use crate::constants::OPERAND_NAMESPACE;
use crate::crd::CertManager;
use crate::registry::Component;
use k8s_openapi::api::admissionregistration::v1::{
    MutatingWebhookConfiguration, ValidatingWebhookConfiguration, WebhookClientConfig,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

fn pin_namespace(mut config: WebhookClientConfig) -> WebhookClientConfig {
    if let Some(service) = config.service.as_mut() {
        service.namespace = OPERAND_NAMESPACE.to_string();
    }
    config
}

fn meta(component: &Component, cr: &CertManager, data: &crate::registry::WebhookData) -> ObjectMeta {
    let mut meta = cluster_meta(&data.name, &object_labels(component, cr));
    meta.annotations = (!data.annotations.is_empty()).then(|| data.annotations.clone());
    meta
}

#[must_use]
pub fn mutating_webhooks(component: &Component, cr: &CertManager) -> Vec<MutatingWebhookConfiguration> {
    component
        .webhooks
        .iter()
        .filter(|data| !data.mutating.is_empty())
        .map(|data| MutatingWebhookConfiguration {
            metadata: meta(component, cr, data),
            webhooks: Some(
                data.mutating
                    .iter()
                    .cloned()
                    .map(|mut w| {
                        w.client_config = pin_namespace(w.client_config);
                        w
                    })
                    .collect(),
            ),
        })
        .collect()
}

#[must_use]
pub fn validating_webhooks(
    component: &Component,
    cr: &CertManager,
) -> Vec<ValidatingWebhookConfiguration> {
    component
        .webhooks
        .iter()
        .filter(|data| !data.validating.is_empty())
        .map(|data| ValidatingWebhookConfiguration {
            metadata: meta(component, cr, data),
            webhooks: Some(
                data.validating
                    .iter()
                    .cloned()
                    .map(|mut w| {
                        w.client_config = pin_namespace(w.client_config);
                        w
                    })
                    .collect(),
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::CertManagerSpec;
    use crate::registry::{ComponentName, SupportedVersion};
    use crate::synth::tests::cluster_cr;

    fn webhook() -> Component {
        Component::resolve(ComponentName::Webhook, &SupportedVersion::default_version())
    }

    #[test]
    fn test_split_into_two_objects_with_same_annotations() {
        let cr = cluster_cr(CertManagerSpec::default());
        let mutating = mutating_webhooks(&webhook(), &cr);
        let validating = validating_webhooks(&webhook(), &cr);
        assert_eq!(mutating.len(), 1);
        assert_eq!(validating.len(), 1);
        assert_eq!(mutating[0].metadata.name, validating[0].metadata.name);
        assert_eq!(
            mutating[0].metadata.annotations,
            validating[0].metadata.annotations
        );
        assert_eq!(
            mutating[0]
                .metadata
                .annotations
                .as_ref()
                .and_then(|a| a.get("cert-manager.io/inject-ca-from-secret"))
                .map(String::as_str),
            Some("cert-manager/cert-manager-webhook-ca")
        );
    }

    #[test]
    fn test_service_namespace_rewritten() {
        let cr = cluster_cr(CertManagerSpec::default());
        for config in mutating_webhooks(&webhook(), &cr) {
            for w in config.webhooks.unwrap() {
                assert_eq!(w.client_config.service.unwrap().namespace, OPERAND_NAMESPACE);
            }
        }
        for config in validating_webhooks(&webhook(), &cr) {
            for w in config.webhooks.unwrap() {
                assert_eq!(w.client_config.service.unwrap().namespace, OPERAND_NAMESPACE);
            }
        }
    }

    #[test]
    fn test_components_without_webhooks_emit_nothing() {
        let cr = cluster_cr(CertManagerSpec::default());
        let controller =
            Component::resolve(ComponentName::Controller, &SupportedVersion::default_version());
        assert!(mutating_webhooks(&controller, &cr).is_empty());
        assert!(validating_webhooks(&controller, &cr).is_empty());
    }
}
