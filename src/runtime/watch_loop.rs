//! # Watch Loop
//!
//! Controller watch loop over the `CertManager` resource. Changes to any
//! managed object requeue the reserved instance so drift is corrected.

use crate::constants::RESERVED_CR_NAME;
use crate::controller::reconciler::{reconcile, Reconciler};
use crate::controller::server::ServerState;
use crate::crd::CertManager;
use crate::registry::Labels;
use crate::runtime::error_policy::handle_reconciliation_error;
use crate::store::ResourceKind;
use futures::StreamExt;
use kube::api::{Api, DynamicObject};
use kube::Client;
use kube_runtime::reflector::ObjectRef;
use kube_runtime::{watcher, Controller};
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

/// CRD group suffix shared by every cert-manager API
const CRD_GROUP_SUFFIX: &str = ".cert-manager.io";

/// Run the controller until a shutdown signal arrives
///
/// # Errors
///
/// Returns an error only if the controller cannot be constructed.
pub async fn run_watch_loop(
    client: Client,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
) -> Result<(), anyhow::Error> {
    let watch_span = tracing::span!(
        tracing::Level::INFO,
        "controller.watch",
        operation = "watch_loop"
    );

    let managed = watcher::Config::default().labels(&Labels::standard().to_selector());
    let mut controller = Controller::new(
        Api::<CertManager>::all(client.clone()),
        watcher::Config::default().any_semantic(),
    );

    for kind in ResourceKind::OPERAND {
        let ar = kind.api_resource();
        let api = Api::<DynamicObject>::all_with(client.clone(), &ar);
        controller = if kind == ResourceKind::CustomResourceDefinition {
            controller.watches_with(api, ar, watcher::Config::default(), |crd: DynamicObject| {
                crd.metadata
                    .name
                    .as_deref()
                    .is_some_and(|name| name.ends_with(CRD_GROUP_SUFFIX))
                    .then(reserved_instance)
            })
        } else {
            controller.watches_with(api, ar, managed.clone(), |_: DynamicObject| {
                Some(reserved_instance())
            })
        };
    }

    info!("Starting controller watch loop...");
    server_state.mark_ready(true);

    controller
        .shutdown_on_signal()
        .run(reconcile, handle_reconciliation_error, reconciler)
        .for_each(|result| {
            match result {
                Ok((obj, _)) => debug!("Reconciled {}", obj.name),
                Err(e) => warn!("Controller stream error: {}", e),
            }
            futures::future::ready(())
        })
        .instrument(watch_span)
        .await;

    server_state.mark_ready(false);
    info!("Controller watch loop stopped");
    Ok(())
}

fn reserved_instance() -> ObjectRef<CertManager> {
    ObjectRef::new(RESERVED_CR_NAME)
}
