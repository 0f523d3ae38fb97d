//! # Events
//!
//! Kubernetes events emitted on the `CertManager` resource for every object
//! mutation.
//!
//! The catalog is fixed: one `(reason, message)` pair per
//! ([`ResourceKind`], [`EventAction`]). Publishing is best effort; a failed
//! publish is logged and never fails a reconciliation.

mod recorder;

pub use recorder::{KubeEventSink, RecordedEvent, RecordingEventSink};

use crate::crd::CertManager;
use crate::store::{ObjectKey, ResourceKind};
use async_trait::async_trait;
use std::fmt;

/// Lifecycle step of one object mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventAction {
    Creating,
    Updating,
    Updated,
}

impl EventAction {
    pub const ALL: [EventAction; 3] = [
        EventAction::Creating,
        EventAction::Updating,
        EventAction::Updated,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EventAction::Creating => "Creating",
            EventAction::Updating => "Updating",
            EventAction::Updated => "Updated",
        }
    }
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One catalog entry rendered for a concrete object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorEvent {
    pub action: EventAction,
    /// `<Action><Kind>`, e.g. `CreatingDeployment`
    pub reason: String,
    pub message: String,
}

impl OperatorEvent {
    #[must_use]
    pub fn new(action: EventAction, key: &ObjectKey) -> Self {
        Self {
            action,
            reason: reason(action, key.kind),
            message: message(action, key),
        }
    }
}

/// Catalog reason for an action on a kind
#[must_use]
pub fn reason(action: EventAction, kind: ResourceKind) -> String {
    format!("{action}{kind}")
}

fn message(action: EventAction, key: &ObjectKey) -> String {
    let target = match &key.namespace {
        Some(ns) => format!("{ns}/{}", key.name),
        None => key.name.clone(),
    };
    match action {
        EventAction::Creating => format!("Creating {} {target}", key.kind),
        EventAction::Updating => format!("Updating {} {target}", key.kind),
        EventAction::Updated => format!("Updated {} {target}", key.kind),
    }
}

#[async_trait]
pub trait EventSink: Send + Sync {
    /// Publish `event` against the `CertManager` resource
    async fn publish(&self, subject: &CertManager, event: OperatorEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_entries() {
        let key = ObjectKey::new(
            ResourceKind::Deployment,
            Some("cert-manager"),
            "cert-manager-webhook",
        );
        let ev = OperatorEvent::new(EventAction::Creating, &key);
        assert_eq!(ev.reason, "CreatingDeployment");
        assert_eq!(ev.message, "Creating Deployment cert-manager/cert-manager-webhook");

        let key = ObjectKey::new(ResourceKind::ClusterRole, None, "cert-manager-view");
        let ev = OperatorEvent::new(EventAction::Updated, &key);
        assert_eq!(ev.reason, "UpdatedClusterRole");
        assert_eq!(ev.message, "Updated ClusterRole cert-manager-view");
    }

    #[test]
    fn test_reasons_are_distinct_per_action() {
        let reasons: std::collections::HashSet<_> = EventAction::ALL
            .into_iter()
            .map(|a| reason(a, ResourceKind::Service))
            .collect();
        assert_eq!(reasons.len(), 3);
    }
}
