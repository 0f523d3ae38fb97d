//! Object store backed by the API server.

use super::{ObjectKey, ObjectStore, ResourceKind, StoreError};
use crate::crd::{CertManager, CertManagerStatus};
use crate::registry::Labels;
use async_trait::async_trait;
use kube::api::{Api, DynamicObject, ListParams, Patch, PatchParams, PostParams};
use kube::Client;
use tracing::debug;

#[derive(Clone)]
pub struct KubeObjectStore {
    client: Client,
    field_manager: String,
}

impl std::fmt::Debug for KubeObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeObjectStore")
            .field("field_manager", &self.field_manager)
            .finish_non_exhaustive()
    }
}

impl KubeObjectStore {
    #[must_use]
    pub fn new(client: Client, field_manager: &str) -> Self {
        Self {
            client,
            field_manager: field_manager.to_string(),
        }
    }

    fn api(&self, kind: ResourceKind, namespace: Option<&str>) -> Api<DynamicObject> {
        let ar = kind.api_resource();
        match namespace {
            Some(ns) if kind.is_namespaced() => Api::namespaced_with(self.client.clone(), ns, &ar),
            _ => Api::all_with(self.client.clone(), &ar),
        }
    }

    fn post_params(&self) -> PostParams {
        PostParams {
            field_manager: Some(self.field_manager.clone()),
            ..Default::default()
        }
    }

    fn status_patch_params(&self) -> PatchParams {
        PatchParams::apply(&self.field_manager)
    }
}

/// Map API status codes onto the store's error classes
fn classify(err: kube::Error, key: ObjectKey) -> StoreError {
    match err {
        kube::Error::Api(ref api_err) if api_err.code == 409 && api_err.reason == "AlreadyExists" => {
            StoreError::AlreadyExists(key)
        }
        kube::Error::Api(ref api_err) if api_err.code == 409 => StoreError::Conflict(key),
        kube::Error::Api(ref api_err) if api_err.code == 404 => StoreError::NotFound(key),
        other => StoreError::Api(other),
    }
}

#[async_trait]
impl ObjectStore for KubeObjectStore {
    async fn get(&self, key: &ObjectKey) -> Result<Option<DynamicObject>, StoreError> {
        let api = self.api(key.kind, key.namespace.as_deref());
        Ok(api.get_opt(&key.name).await?)
    }

    async fn create(
        &self,
        kind: ResourceKind,
        obj: &DynamicObject,
    ) -> Result<DynamicObject, StoreError> {
        let key = ObjectKey::of(kind, obj)?;
        debug!("Creating {}", key);
        self.api(kind, key.namespace.as_deref())
            .create(&self.post_params(), obj)
            .await
            .map_err(|e| classify(e, key))
    }

    async fn update(
        &self,
        kind: ResourceKind,
        obj: &DynamicObject,
    ) -> Result<DynamicObject, StoreError> {
        let key = ObjectKey::of(kind, obj)?;
        debug!(
            "Replacing {} at resourceVersion {:?}",
            key, obj.metadata.resource_version
        );
        self.api(kind, key.namespace.as_deref())
            .replace(&key.name, &self.post_params(), obj)
            .await
            .map_err(|e| classify(e, key))
    }

    async fn list(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        labels: &Labels,
    ) -> Result<Vec<DynamicObject>, StoreError> {
        let params = ListParams::default().labels(&labels.to_selector());
        let list = self.api(kind, namespace).list(&params).await?;
        Ok(list.items)
    }

    async fn patch_status(
        &self,
        name: &str,
        status: &CertManagerStatus,
    ) -> Result<(), StoreError> {
        let api: Api<CertManager> = Api::all(self.client.clone());
        let patch = serde_json::json!({ "status": status });
        api.patch_status(name, &self.status_patch_params(), &Patch::Merge(patch))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_client() -> Client {
        let _ = rustls::crypto::ring::default_provider().install_default();
        let config = kube::Config::new("http://127.0.0.1:6443".parse().unwrap());
        Client::try_from(config).unwrap()
    }

    #[tokio::test]
    async fn test_writes_use_configured_field_manager() {
        let store = KubeObjectStore::new(offline_client(), "custom-operator");
        assert_eq!(
            store.post_params().field_manager.as_deref(),
            Some("custom-operator")
        );
        assert_eq!(
            store.status_patch_params().field_manager.as_deref(),
            Some("custom-operator")
        );
    }
}
