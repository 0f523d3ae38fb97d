//! # Object Store
//!
//! The cluster API seen as an abstract versioned object store.
//!
//! Every call is keyed by [`ObjectKey`] (kind, namespace, name). Updates use
//! optimistic concurrency: the object handed to [`ObjectStore::update`] must
//! carry the `resourceVersion` of a fresh read, otherwise the store answers
//! [`StoreError::Conflict`].
//!
//! - [`KubeObjectStore`] talks to the API server through `DynamicObject`
//! - [`InMemoryStore`] keeps objects in a map and counts writes

mod cluster;
pub mod kinds;
mod memory;

pub use cluster::KubeObjectStore;
pub use kinds::{FieldStrategy, ManagedField, Ownership, ResourceKind};
pub use memory::{InMemoryStore, WriteCounts};

use crate::crd::CertManagerStatus;
use crate::registry::Labels;
use async_trait::async_trait;
use kube::api::DynamicObject;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} was modified concurrently")]
    Conflict(ObjectKey),
    #[error("{0} already exists")]
    AlreadyExists(ObjectKey),
    #[error("{0} not found")]
    NotFound(ObjectKey),
    #[error("{0} object has no metadata.name")]
    MissingName(ResourceKind),
    #[error("API request failed: {0}")]
    Api(#[from] kube::Error),
    #[error("failed to (de)serialize object: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Identity of one cluster object
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey {
    pub kind: ResourceKind,
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectKey {
    #[must_use]
    pub fn new(kind: ResourceKind, namespace: Option<&str>, name: &str) -> Self {
        Self {
            kind,
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
        }
    }

    /// Key of an existing object
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingName`] when the object has no name.
    pub fn of(kind: ResourceKind, obj: &DynamicObject) -> Result<Self, StoreError> {
        let name = obj
            .metadata
            .name
            .as_deref()
            .ok_or(StoreError::MissingName(kind))?;
        Ok(Self::new(kind, obj.metadata.namespace.as_deref(), name))
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{} {ns}/{}", self.kind, self.name),
            None => write!(f, "{} {}", self.kind, self.name),
        }
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object; `Ok(None)` when it does not exist
    async fn get(&self, key: &ObjectKey) -> Result<Option<DynamicObject>, StoreError>;

    async fn create(
        &self,
        kind: ResourceKind,
        obj: &DynamicObject,
    ) -> Result<DynamicObject, StoreError>;

    /// Replace an object; `obj` must carry a fresh `resourceVersion`
    async fn update(
        &self,
        kind: ResourceKind,
        obj: &DynamicObject,
    ) -> Result<DynamicObject, StoreError>;

    /// List objects of a kind, optionally in one namespace, carrying `labels`
    async fn list(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        labels: &Labels,
    ) -> Result<Vec<DynamicObject>, StoreError>;

    /// Write the status subresource of a `CertManager`
    async fn patch_status(&self, name: &str, status: &CertManagerStatus)
        -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        let key = ObjectKey::new(
            ResourceKind::Deployment,
            Some("cert-manager"),
            "cert-manager-webhook",
        );
        assert_eq!(key.to_string(), "Deployment cert-manager/cert-manager-webhook");

        let key = ObjectKey::new(ResourceKind::ClusterRole, None, "cert-manager-view");
        assert_eq!(key.to_string(), "ClusterRole cert-manager-view");
    }

    #[test]
    fn test_key_of_requires_name() {
        let obj = DynamicObject::new("", &ResourceKind::Namespace.api_resource());
        assert!(matches!(
            ObjectKey::of(ResourceKind::Namespace, &obj),
            Err(StoreError::MissingName(ResourceKind::Namespace))
        ));
    }
}
