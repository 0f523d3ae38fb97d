//! # Types
//!
//! Core types for the reconciler.

use crate::config::ControllerConfig;
use crate::controller::backoff::FibonacciBackoff;
use crate::crd_source::{CrdSource, FileCrdSource};
use crate::events::{EventSink, KubeEventSink};
use crate::store::{KubeObjectStore, ObjectStore, StoreError};
use crate::synth::SynthesisError;
use kube::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("object store error: {0}")]
    Store(#[from] StoreError),
    #[error("failed to synthesize desired objects: {0}")]
    Synthesis(#[from] SynthesisError),
}

/// Backoff state for a specific resource
/// Tracks error count and backoff calculator for progressive retries
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl BackoffState {
    #[must_use]
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            backoff: FibonacciBackoff::new(min_minutes, max_minutes),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count += 1;
    }

    pub fn reset(&mut self) {
        self.error_count = 0;
        self.backoff.reset();
    }
}

/// Shared reconciliation context
#[derive(Clone)]
pub struct Reconciler {
    pub store: Arc<dyn ObjectStore>,
    pub events: Arc<dyn EventSink>,
    pub crds: Arc<dyn CrdSource>,
    pub config: ControllerConfig,
    // Backoff state per resource name, owned by the error policy
    pub backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Context backed by the API server and the on-disk CRD manifests
    #[must_use]
    pub fn new(client: Client, config: ControllerConfig) -> Self {
        let store = Arc::new(KubeObjectStore::new(
            client.clone(),
            &config.operator_name,
        ));
        let events = Arc::new(KubeEventSink::new(client, &config.operator_name));
        let crds = Arc::new(FileCrdSource::new(config.crd_manifests_dir.clone()));
        Self::with_collaborators(store, events, crds, config)
    }

    /// Context over arbitrary collaborators
    #[must_use]
    pub fn with_collaborators(
        store: Arc<dyn ObjectStore>,
        events: Arc<dyn EventSink>,
        crds: Arc<dyn CrdSource>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            store,
            events,
            crds,
            config,
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn backoff_states(&self) -> MutexGuard<'_, HashMap<String, BackoffState>> {
        self.backoff_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a failure for `name`; returns (delay seconds, error count)
    pub fn record_failure(&self, name: &str) -> (u64, u32) {
        let (min, max) = (self.config.backoff_min_minutes, self.config.backoff_max_minutes);
        let mut states = self.backoff_states();
        let state = states
            .entry(name.to_string())
            .or_insert_with(|| BackoffState::new(min, max));
        state.increment_error();
        (state.backoff.next_backoff_seconds(), state.error_count)
    }

    /// Forget earlier failures for `name`
    pub fn reset_backoff(&self, name: &str) {
        if let Some(state) = self.backoff_states().get_mut(name) {
            state.reset();
        }
    }

    #[must_use]
    pub fn error_count(&self, name: &str) -> u32 {
        self.backoff_states()
            .get(name)
            .map_or(0, |state| state.error_count)
    }
}
