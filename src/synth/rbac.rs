//! Roles, cluster roles and their bindings.
//!
//! Every non-aggregate role is bound to the component's single service
//! account. Aggregate cluster roles only feed the built-in roles and are
//! never bound.

use super::{cluster_meta, namespaced_meta, object_labels};
use crate::constants::OPERAND_NAMESPACE;
use crate::crd::CertManager;
use crate::registry::{Component, RoleData};
use k8s_openapi::api::rbac::v1::{
    ClusterRole, ClusterRoleBinding, Role, RoleBinding, RoleRef, Subject,
};

const RBAC_GROUP: &str = "rbac.authorization.k8s.io";

#[must_use]
pub fn roles(component: &Component, cr: &CertManager) -> Vec<Role> {
    component
        .roles
        .iter()
        .map(|role| Role {
            metadata: namespaced_meta(&role.name, &role_labels(component, cr, role)),
            rules: Some(role.rules.clone()),
        })
        .collect()
}

#[must_use]
pub fn role_bindings(component: &Component, cr: &CertManager) -> Vec<RoleBinding> {
    component
        .roles
        .iter()
        .filter(|role| !role.is_aggregate)
        .map(|role| RoleBinding {
            metadata: namespaced_meta(&role.name, &object_labels(component, cr)),
            role_ref: role_ref("Role", &role.name),
            subjects: Some(vec![subject(component)]),
        })
        .collect()
}

#[must_use]
pub fn cluster_roles(component: &Component, cr: &CertManager) -> Vec<ClusterRole> {
    component
        .cluster_roles
        .iter()
        .map(|role| ClusterRole {
            metadata: cluster_meta(&role.name, &role_labels(component, cr, role)),
            rules: Some(role.rules.clone()),
            aggregation_rule: None,
        })
        .collect()
}

#[must_use]
pub fn cluster_role_bindings(component: &Component, cr: &CertManager) -> Vec<ClusterRoleBinding> {
    component
        .cluster_roles
        .iter()
        .filter(|role| !role.is_aggregate)
        .map(|role| ClusterRoleBinding {
            metadata: cluster_meta(&role.name, &object_labels(component, cr)),
            role_ref: role_ref("ClusterRole", &role.name),
            subjects: Some(vec![subject(component)]),
        })
        .collect()
}

fn role_labels(component: &Component, cr: &CertManager, role: &RoleData) -> crate::registry::Labels {
    object_labels(component, cr).merged(&role.labels)
}

fn role_ref(kind: &str, name: &str) -> RoleRef {
    RoleRef {
        api_group: RBAC_GROUP.to_string(),
        kind: kind.to_string(),
        name: name.to_string(),
    }
}

fn subject(component: &Component) -> Subject {
    Subject {
        kind: "ServiceAccount".to_string(),
        name: component.service_account.clone(),
        namespace: Some(OPERAND_NAMESPACE.to_string()),
        ..Default::default()
    }
}
