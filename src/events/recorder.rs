//! Event sink implementations.

use super::{EventSink, OperatorEvent};
use crate::crd::CertManager;
use async_trait::async_trait;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::{Client, Resource};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// Publishes through the API server's events API
#[derive(Clone)]
pub struct KubeEventSink {
    recorder: Recorder,
}

impl std::fmt::Debug for KubeEventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeEventSink").finish_non_exhaustive()
    }
}

impl KubeEventSink {
    #[must_use]
    pub fn new(client: Client, reporter: &str) -> Self {
        let reporter = Reporter {
            controller: reporter.to_string(),
            instance: std::env::var("POD_NAME").ok(),
        };
        Self {
            recorder: Recorder::new(client, reporter),
        }
    }
}

#[async_trait]
impl EventSink for KubeEventSink {
    async fn publish(&self, subject: &CertManager, event: OperatorEvent) {
        let reference = subject.object_ref(&());
        let ev = Event {
            type_: EventType::Normal,
            reason: event.reason.clone(),
            note: Some(event.message.clone()),
            action: event.action.as_str().to_string(),
            secondary: None,
        };
        if let Err(e) = self.recorder.publish(&ev, &reference).await {
            warn!("Failed to publish event {}: {}", event.reason, e);
        }
    }
}

/// An event captured by [`RecordingEventSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub subject: String,
    pub event: OperatorEvent,
}

/// Keeps every published event in memory
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingEventSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reasons in publish order
    #[must_use]
    pub fn reasons(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|r| r.event.reason)
            .collect()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[async_trait]
impl EventSink for RecordingEventSink {
    async fn publish(&self, subject: &CertManager, event: OperatorEvent) {
        let subject = subject.metadata.name.clone().unwrap_or_default();
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedEvent { subject, event });
    }
}
