//! # Convergence
//!
//! Drives one live object toward its desired shape: create when absent,
//! otherwise overwrite only the managed sub-fields that no longer match.

use crate::crd::CertManager;
use crate::diff::{declares_nothing, matches, merge_into};
use crate::events::{EventAction, EventSink, OperatorEvent};
use crate::observability::metrics;
use crate::store::{FieldStrategy, ManagedField, ObjectStore, Ownership, StoreError};
use crate::synth::DesiredObject;
use kube::api::DynamicObject;
use kube::Resource;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// What convergence did to one object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvergeOutcome {
    Created,
    /// Dotted paths of the sub-fields that were rewritten
    Updated(Vec<String>),
    Unchanged,
}

/// Converge a single desired object
///
/// # Errors
///
/// Any store error other than not-found on the initial read is returned
/// unchanged; the pass is expected to be retried from scratch.
pub async fn converge_object(
    store: &dyn ObjectStore,
    events: &dyn EventSink,
    cr: &CertManager,
    desired: &DesiredObject,
) -> Result<ConvergeOutcome, StoreError> {
    let key = &desired.key;
    let mut object = desired.object.clone();
    if desired.kind.ownership() == Ownership::Owned {
        attach_owner(&mut object, cr);
    }

    let Some(live) = store.get(key).await? else {
        events
            .publish(cr, OperatorEvent::new(EventAction::Creating, key))
            .await;
        store.create(desired.kind, &object).await?;
        metrics::increment_objects_created(desired.kind.as_str());
        info!("✅ Created {}", key);
        return Ok(ConvergeOutcome::Created);
    };

    let wanted = serde_json::to_value(&object)?;
    let mut current = serde_json::to_value(&live)?;
    let stale = stale_fields(desired.kind.managed_fields(), &wanted, &current);
    if stale.is_empty() {
        debug!("{} is up to date", key);
        return Ok(ConvergeOutcome::Unchanged);
    }

    for field in &stale {
        write_field(&mut current, field, &wanted);
    }
    let updated: DynamicObject = serde_json::from_value(current)?;
    let names: Vec<String> = stale.iter().map(ManagedField::name).collect();

    events
        .publish(cr, OperatorEvent::new(EventAction::Updating, key))
        .await;
    store.update(desired.kind, &updated).await?;
    events
        .publish(cr, OperatorEvent::new(EventAction::Updated, key))
        .await;
    metrics::increment_objects_updated(desired.kind.as_str());
    info!("🔄 Updated {} ({})", key, names.join(", "));
    Ok(ConvergeOutcome::Updated(names))
}

fn attach_owner(object: &mut DynamicObject, cr: &CertManager) {
    match cr.controller_owner_ref(&()) {
        Some(owner) => object.metadata.owner_references = Some(vec![owner]),
        None => warn!(
            "⚠️  CertManager has no uid yet; {} will be created without an owner",
            object.metadata.name.as_deref().unwrap_or_default()
        ),
    }
}

/// Managed sub-fields whose desired value is not matched by the live object
pub(crate) fn stale_fields(
    fields: &'static [ManagedField],
    wanted: &Value,
    current: &Value,
) -> Vec<ManagedField> {
    fields
        .iter()
        .filter(|field| {
            let Some(desired) = lookup(wanted, field.path) else {
                return false;
            };
            if declares_nothing(desired) {
                return false;
            }
            !matches(desired, lookup(current, field.path).unwrap_or(&Value::Null))
        })
        .copied()
        .collect()
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |v, segment| v.get(segment))
}

fn write_field(target: &mut Value, field: &ManagedField, wanted: &Value) {
    let Some(desired) = lookup(wanted, field.path) else {
        return;
    };
    let mut slot = target;
    for segment in field.path {
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        slot = &mut slot[*segment];
    }
    match field.strategy {
        FieldStrategy::Replace => *slot = desired.clone(),
        FieldStrategy::Merge => merge_into(slot, desired),
    }
}
