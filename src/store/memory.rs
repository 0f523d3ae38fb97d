//! In-memory object store.
//!
//! Behaves like the API server where the operator can observe it:
//! `resourceVersion` is assigned on every write and checked on update,
//! creating an existing object fails, and every write is counted.

use super::{ObjectKey, ObjectStore, ResourceKind, StoreError};
use crate::crd::CertManagerStatus;
use crate::registry::Labels;
use async_trait::async_trait;
use kube::api::DynamicObject;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Write calls observed by an [`InMemoryStore`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteCounts {
    pub creates: usize,
    pub updates: usize,
    pub status_writes: usize,
}

impl WriteCounts {
    /// Object writes, status excluded
    #[must_use]
    pub fn object_writes(&self) -> usize {
        self.creates + self.updates
    }
}

#[derive(Debug, Default)]
struct State {
    objects: BTreeMap<ObjectKey, DynamicObject>,
    statuses: BTreeMap<String, CertManagerStatus>,
    last_version: u64,
    counts: WriteCounts,
}

impl State {
    fn next_version(&mut self) -> String {
        self.last_version += 1;
        self.last_version.to_string()
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed an object without counting a write
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingName`] when the object has no name.
    pub fn insert(&self, kind: ResourceKind, mut obj: DynamicObject) -> Result<(), StoreError> {
        let key = ObjectKey::of(kind, &obj)?;
        let mut state = self.lock();
        obj.metadata.resource_version = Some(state.next_version());
        state.objects.insert(key, obj);
        Ok(())
    }

    /// Snapshot of a stored object
    #[must_use]
    pub fn object(&self, key: &ObjectKey) -> Option<DynamicObject> {
        self.lock().objects.get(key).cloned()
    }

    /// Modify a stored object the way another actor would
    ///
    /// Bumps `resourceVersion` and does not count as an operator write.
    /// Returns `false` when the object does not exist.
    pub fn mutate(&self, key: &ObjectKey, f: impl FnOnce(&mut DynamicObject)) -> bool {
        let mut state = self.lock();
        let version = state.next_version();
        match state.objects.get_mut(key) {
            Some(obj) => {
                f(obj);
                obj.metadata.resource_version = Some(version);
                true
            }
            None => false,
        }
    }

    /// Keys of every stored object of `kind`
    #[must_use]
    pub fn keys(&self, kind: ResourceKind) -> Vec<ObjectKey> {
        self.lock()
            .objects
            .keys()
            .filter(|k| k.kind == kind)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().objects.is_empty()
    }

    #[must_use]
    pub fn writes(&self) -> WriteCounts {
        self.lock().counts
    }

    pub fn reset_writes(&self) {
        self.lock().counts = WriteCounts::default();
    }

    /// Last status written for a `CertManager`
    #[must_use]
    pub fn status(&self, name: &str) -> Option<CertManagerStatus> {
        self.lock().statuses.get(name).cloned()
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn get(&self, key: &ObjectKey) -> Result<Option<DynamicObject>, StoreError> {
        Ok(self.object(key))
    }

    async fn create(
        &self,
        kind: ResourceKind,
        obj: &DynamicObject,
    ) -> Result<DynamicObject, StoreError> {
        let key = ObjectKey::of(kind, obj)?;
        let mut state = self.lock();
        if state.objects.contains_key(&key) {
            return Err(StoreError::AlreadyExists(key));
        }
        let mut stored = obj.clone();
        stored.metadata.resource_version = Some(state.next_version());
        state.objects.insert(key, stored.clone());
        state.counts.creates += 1;
        Ok(stored)
    }

    async fn update(
        &self,
        kind: ResourceKind,
        obj: &DynamicObject,
    ) -> Result<DynamicObject, StoreError> {
        let key = ObjectKey::of(kind, obj)?;
        let mut state = self.lock();
        let current = state
            .objects
            .get(&key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        if current.metadata.resource_version != obj.metadata.resource_version {
            return Err(StoreError::Conflict(key));
        }
        let mut stored = obj.clone();
        stored.metadata.resource_version = Some(state.next_version());
        state.objects.insert(key, stored.clone());
        state.counts.updates += 1;
        Ok(stored)
    }

    async fn list(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        labels: &Labels,
    ) -> Result<Vec<DynamicObject>, StoreError> {
        let state = self.lock();
        Ok(state
            .objects
            .iter()
            .filter(|(key, _)| key.kind == kind)
            .filter(|(key, _)| namespace.is_none() || key.namespace.as_deref() == namespace)
            .filter(|(_, obj)| {
                obj.metadata
                    .labels
                    .as_ref()
                    .map_or(labels.is_empty(), |l| labels.is_subset_of(l))
            })
            .map(|(_, obj)| obj.clone())
            .collect())
    }

    async fn patch_status(
        &self,
        name: &str,
        status: &CertManagerStatus,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.statuses.insert(name.to_string(), status.clone());
        state.counts.status_writes += 1;
        Ok(())
    }
}
