//! Common test utilities for reconciler integration tests
//!
//! Builds a reconciler over the in-memory store, the recording event sink
//! and the CRD manifests shipped with the crate.

#![allow(dead_code, reason = "Each test binary uses a different subset of helpers")]

use async_trait::async_trait;
use cert_manager_operator::config::ControllerConfig;
use cert_manager_operator::constants::{OPERAND_NAMESPACE, RESERVED_CR_NAME};
use cert_manager_operator::controller::reconciler::{reconcile, Reconciler, ReconcilerError};
use cert_manager_operator::crd::{CertManager, CertManagerSpec, CertManagerStatus};
use cert_manager_operator::crd_source::{CrdSource, CrdSourceError, FileCrdSource};
use cert_manager_operator::events::{EventSink, RecordingEventSink};
use cert_manager_operator::registry::Labels;
use cert_manager_operator::store::{
    InMemoryStore, ObjectKey, ObjectStore, ResourceKind, StoreError,
};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::DynamicObject;
use kube_runtime::controller::Action;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const SHIPPED_CRDS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/manifests/crds");

pub const CR_UID: &str = "6f1d8a52-3c0e-4f4b-9a57-0d2f4c8e7b10";

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub events: Arc<RecordingEventSink>,
    pub ctx: Arc<Reconciler>,
}

/// Reconciler backed by the shipped CRD manifests
pub fn harness() -> Harness {
    harness_with_crds(Arc::new(FileCrdSource::new(SHIPPED_CRDS)))
}

pub fn harness_with_crds(crds: Arc<dyn CrdSource>) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let backend = Arc::clone(&store) as Arc<dyn ObjectStore>;
    build(store, backend, crds)
}

/// Reconciler talking to `backend`, with `store` holding the cluster state
pub fn harness_over(store: Arc<InMemoryStore>, backend: Arc<dyn ObjectStore>) -> Harness {
    build(store, backend, Arc::new(FileCrdSource::new(SHIPPED_CRDS)))
}

fn build(
    store: Arc<InMemoryStore>,
    backend: Arc<dyn ObjectStore>,
    crds: Arc<dyn CrdSource>,
) -> Harness {
    let events = Arc::new(RecordingEventSink::new());
    let ctx = Arc::new(Reconciler::with_collaborators(
        backend,
        Arc::clone(&events) as Arc<dyn EventSink>,
        crds,
        ControllerConfig::default(),
    ));
    Harness { store, events, ctx }
}

pub fn named_cr(name: &str, spec: CertManagerSpec) -> CertManager {
    let mut cr = CertManager::new(name, spec);
    cr.metadata.uid = Some(CR_UID.to_string());
    cr
}

impl Harness {
    /// One pass for the reserved CR, carrying the status the store last saw
    pub async fn pass(&self, spec: CertManagerSpec) -> Result<Action, ReconcilerError> {
        let mut cr = named_cr(RESERVED_CR_NAME, spec);
        cr.status = self.store.status(RESERVED_CR_NAME);
        self.run(cr).await
    }

    pub async fn run(&self, cr: CertManager) -> Result<Action, ReconcilerError> {
        reconcile(Arc::new(cr), Arc::clone(&self.ctx)).await
    }

    pub fn typed<K: DeserializeOwned>(&self, kind: ResourceKind, namespace: Option<&str>, name: &str) -> K {
        let obj = self
            .store
            .object(&ObjectKey::new(kind, namespace, name))
            .unwrap_or_else(|| panic!("{kind} {name} was not created"));
        serde_json::from_value(serde_json::to_value(obj).unwrap()).unwrap()
    }

    pub fn deployment(&self, name: &str) -> k8s_openapi::api::apps::v1::Deployment {
        self.typed(ResourceKind::Deployment, Some(OPERAND_NAMESPACE), name)
    }

    /// Report every Deployment as fully rolled out
    pub fn mark_deployments_ready(&self) {
        for key in self.store.keys(ResourceKind::Deployment) {
            self.store.mutate(&key, |obj: &mut DynamicObject| {
                obj.data["status"] = json!({
                    "replicas": 1,
                    "readyReplicas": 1,
                    "availableReplicas": 1,
                    "conditions": [
                        {"type": "Available", "status": "True", "reason": "MinimumReplicasAvailable"},
                    ],
                });
            });
        }
    }

    /// Report every CRD as established with accepted names
    pub fn mark_crds_ready(&self) {
        for key in self.store.keys(ResourceKind::CustomResourceDefinition) {
            self.store.mutate(&key, |obj: &mut DynamicObject| {
                obj.data["status"] = json!({
                    "conditions": [
                        {"type": "NamesAccepted", "status": "True"},
                        {"type": "Established", "status": "True"},
                    ],
                });
            });
        }
    }
}

impl Harness {
    /// Fill in the fields the API server defaults on admission
    pub fn apply_server_defaults(&self) {
        self.for_each(ResourceKind::Namespace, |obj| {
            let name = obj.metadata.name.clone().unwrap_or_default();
            obj.metadata
                .labels
                .get_or_insert_with(Default::default)
                .insert("kubernetes.io/metadata.name".to_string(), name);
            obj.data["spec"] = json!({"finalizers": ["kubernetes"]});
        });
        self.for_each(ResourceKind::CustomResourceDefinition, |obj| {
            let client = &mut obj.data["spec"]["conversion"]["webhook"]["clientConfig"];
            client["caBundle"] = json!(CA_BUNDLE);
            client["service"]["port"] = json!(443);
        });
        for kind in [ResourceKind::RoleBinding, ResourceKind::ClusterRoleBinding] {
            self.for_each(kind, |obj| {
                for subject in items(&mut obj.data["subjects"]) {
                    subject["apiGroup"] = json!("");
                }
            });
        }
        self.for_each(ResourceKind::Service, |obj| {
            let spec = &mut obj.data["spec"];
            spec["clusterIP"] = json!("10.96.41.7");
            spec["clusterIPs"] = json!(["10.96.41.7"]);
            spec["sessionAffinity"] = json!("None");
            spec["ipFamilies"] = json!(["IPv4"]);
            spec["ipFamilyPolicy"] = json!("SingleStack");
            spec["internalTrafficPolicy"] = json!("Cluster");
        });
        self.for_each(ResourceKind::Deployment, |obj| {
            let spec = &mut obj.data["spec"];
            spec["strategy"] = json!({
                "type": "RollingUpdate",
                "rollingUpdate": {"maxSurge": "25%", "maxUnavailable": "25%"},
            });
            spec["revisionHistoryLimit"] = json!(10);
            spec["progressDeadlineSeconds"] = json!(600);
            let pod = &mut spec["template"]["spec"];
            pod["restartPolicy"] = json!("Always");
            pod["dnsPolicy"] = json!("ClusterFirst");
            pod["schedulerName"] = json!("default-scheduler");
            pod["terminationGracePeriodSeconds"] = json!(30);
            for container in items(&mut pod["containers"]) {
                container["terminationMessagePath"] = json!("/dev/termination-log");
                container["terminationMessagePolicy"] = json!("File");
                container["imagePullPolicy"] = json!("IfNotPresent");
                for var in items(&mut container["env"]) {
                    if var["valueFrom"]["fieldRef"].is_object() {
                        var["valueFrom"]["fieldRef"]["apiVersion"] = json!("v1");
                    }
                }
            }
        });
        for kind in [
            ResourceKind::MutatingWebhookConfiguration,
            ResourceKind::ValidatingWebhookConfiguration,
        ] {
            self.for_each(kind, |obj| {
                for webhook in items(&mut obj.data["webhooks"]) {
                    webhook["clientConfig"]["caBundle"] = json!(CA_BUNDLE);
                    webhook["clientConfig"]["service"]["port"] = json!(443);
                    webhook["objectSelector"] = json!({});
                    if webhook["namespaceSelector"].is_null() {
                        webhook["namespaceSelector"] = json!({});
                    }
                }
            });
        }
    }

    fn for_each(&self, kind: ResourceKind, mut f: impl FnMut(&mut DynamicObject)) {
        for key in self.store.keys(kind) {
            self.store.mutate(&key, &mut f);
        }
    }
}

const CA_BUNDLE: &str = "LS0tLS1CRUdJTiBDRVJUSUZJQ0FURS0tLS0tCg==";

fn items(value: &mut Value) -> impl Iterator<Item = &mut Value> {
    value.as_array_mut().into_iter().flatten()
}

/// Store that forwards to an [`InMemoryStore`] until its fault triggers
#[derive(Debug)]
pub struct FaultyStore {
    inner: Arc<InMemoryStore>,
    reads_left: AtomicUsize,
    conflict_on_update: bool,
}

impl FaultyStore {
    /// The first `n` reads succeed, every later one fails at the transport
    pub fn failing_reads_after(inner: Arc<InMemoryStore>, n: usize) -> Self {
        Self {
            inner,
            reads_left: AtomicUsize::new(n),
            conflict_on_update: false,
        }
    }

    /// Every replace loses the resourceVersion race
    pub fn conflicting_updates(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            reads_left: AtomicUsize::new(usize::MAX),
            conflict_on_update: true,
        }
    }
}

fn connection_reset() -> kube::Error {
    kube::Error::Service(std::io::Error::other("connection reset by peer").into())
}

#[async_trait]
impl ObjectStore for FaultyStore {
    async fn get(&self, key: &ObjectKey) -> Result<Option<DynamicObject>, StoreError> {
        let granted = self
            .reads_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if !granted {
            return Err(StoreError::Api(connection_reset()));
        }
        self.inner.get(key).await
    }

    async fn create(
        &self,
        kind: ResourceKind,
        obj: &DynamicObject,
    ) -> Result<DynamicObject, StoreError> {
        self.inner.create(kind, obj).await
    }

    async fn update(
        &self,
        kind: ResourceKind,
        obj: &DynamicObject,
    ) -> Result<DynamicObject, StoreError> {
        if self.conflict_on_update {
            return Err(StoreError::Conflict(ObjectKey::of(kind, obj)?));
        }
        self.inner.update(kind, obj).await
    }

    async fn list(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        labels: &Labels,
    ) -> Result<Vec<DynamicObject>, StoreError> {
        self.inner.list(kind, namespace, labels).await
    }

    async fn patch_status(
        &self,
        name: &str,
        status: &CertManagerStatus,
    ) -> Result<(), StoreError> {
        self.inner.patch_status(name, status).await
    }
}

/// CRD source whose manifests are never found
#[derive(Debug)]
pub struct MissingCrds;

impl CrdSource for MissingCrds {
    fn load(&self, version: &str) -> Result<Vec<CustomResourceDefinition>, CrdSourceError> {
        Err(CrdSourceError::MissingFile(
            PathBuf::from("/missing").join(version).join("crd-orders.yaml"),
        ))
    }
}
