//! Controller watching Endpoints that back NetworkFilesystem shares

use futures::StreamExt;
use k8s_openapi::api::core::v1::Endpoints;
use kube::{
    runtime::{
        controller::{Action, Controller},
        watcher::Config,
    },
    Api, ResourceExt,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::controllers::Context;
use crate::metrics::prometheus::{
    CONTROLLER_HEALTH, RECONCILE_DURATION, RECONCILIATIONS, RECONCILIATION_ERRORS,
    SKIPPED_EVENTS, STATUS_UPDATES,
};
use crate::reconcilers::endpoint::Outcome;
use crate::Error;

/// Name the endpoint handler is registered under
pub const HANDLER_NAME: &str = "harvester-netfs-endpoint-handler";

/// Run the endpoint controller
pub async fn run(ctx: Arc<Context>) {
    let endpoints: Api<Endpoints> = Api::all(ctx.client.clone());

    info!(
        handler = HANDLER_NAME,
        namespace = ctx.reconciler.namespace(),
        node = ctx.node_name.as_deref().unwrap_or_default(),
        "Starting endpoint controller"
    );
    CONTROLLER_HEALTH.set(1.0);

    Controller::new(endpoints, Config::default().any_semantic())
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|res| async move {
            match res {
                Ok(o) => info!("Reconciled {:?}", o),
                Err(e) => error!("Reconcile failed: {:?}", e),
            }
        })
        .await;

    CONTROLLER_HEALTH.set(0.0);
    info!("Endpoint controller stopped");
}

/// Reconcile one Endpoints object
#[instrument(skip(endpoint, ctx), fields(name = %endpoint.name_any(), namespace = endpoint.namespace().unwrap_or_default()))]
async fn reconcile(endpoint: Arc<Endpoints>, ctx: Arc<Context>) -> Result<Action, Error> {
    let start = std::time::Instant::now();
    let name = endpoint.name_any();

    RECONCILIATIONS.with_label_values(&[HANDLER_NAME]).inc();

    let result = ctx
        .reconciler
        .on_endpoint_change(&name, Some(endpoint.as_ref()))
        .await;

    RECONCILE_DURATION
        .with_label_values(&[HANDLER_NAME])
        .observe(start.elapsed().as_secs_f64());

    match result {
        Ok(Outcome::Skipped(reason)) => {
            SKIPPED_EVENTS.with_label_values(&[reason.as_str()]).inc();
        }
        Ok(Outcome::Updated) => {
            STATUS_UPDATES.with_label_values(&[HANDLER_NAME]).inc();
        }
        Ok(Outcome::Unchanged) => {}
        Err(e) => {
            RECONCILIATION_ERRORS
                .with_label_values(&[HANDLER_NAME, e.metric_label()])
                .inc();
            return Err(e);
        }
    }

    // Level triggered: the next endpoint change brings us back
    Ok(Action::await_change())
}

/// Error policy for the controller
fn error_policy(endpoint: Arc<Endpoints>, err: &Error, _ctx: Arc<Context>) -> Action {
    let name = endpoint.name_any();
    if err.is_not_found() {
        warn!("NetworkFilesystem dependency for {} not found yet: {}", name, err);
    } else {
        error!("Reconciliation error for endpoint {}: {}", name, err);
    }
    Action::requeue(requeue_after(err))
}

/// How long to wait before retrying after `err`
pub fn requeue_after(err: &Error) -> Duration {
    match err {
        _ if err.is_conflict() => Duration::from_secs(1),
        Error::Update { .. } => Duration::from_secs(5),
        Error::Lookup { .. } => Duration::from_secs(15),
        Error::Config(_) => Duration::from_secs(300),
    }
}
