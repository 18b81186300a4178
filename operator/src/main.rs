use clap::Parser;
use futures::stream::StreamExt;
use kube::{
    api::ListParams, client::Client, runtime::controller::Action, runtime::Controller, Api,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod bucket;
mod caches;
mod cluster;
mod conditions;
mod config;
mod context;
mod delete;
mod finalizer;
mod patch;
mod reconciler;
mod sync;
mod util;

#[cfg(feature = "metrics")]
mod metrics;

use bucket::{Bucket, BucketDescriptor, BucketManagerFactory, BucketServiceController, FakeCloud};
use caches::{InMemoryAccountCache, InMemoryNamespaceCache};
use cluster::KubeCluster;
use config::{Cli, Config};
use reconciler::Reconciler;

/// Runs the `Bucket` controller loop until the process exits.
async fn run(client: Client, config: Arc<Config>) {
    tracing::info!("starting Bucket controller");

    let cloud = Arc::new(FakeCloud::new());
    let reconciler = Arc::new(Reconciler::new(
        client.clone(),
        config,
        Arc::new(InMemoryNamespaceCache::new()),
        Arc::new(InMemoryAccountCache::new()),
        BucketDescriptor,
        BucketManagerFactory,
        BucketServiceController::new(cloud),
        KubeCluster::new(client.clone()),
    ));

    let api: Api<Bucket> = Api::all(client);
    Controller::new(api, ListParams::default())
        .run(reconcile, on_error, reconciler)
        .for_each(|result| async move {
            if let Err(err) = result {
                tracing::warn!(error = %err, "reconcile error surfaced by controller-manager");
            }
        })
        .await;
}

async fn reconcile(
    obj: Arc<Bucket>,
    ctx: Arc<
        Reconciler<Bucket, BucketDescriptor, BucketManagerFactory, BucketServiceController, KubeCluster>,
    >,
) -> Result<Action, ackr_types::ReconcileError> {
    let namespace = obj.metadata.namespace.clone().unwrap_or_default();
    let name = obj.metadata.name.clone().unwrap_or_default();

    #[cfg(feature = "metrics")]
    let timer = metrics::RECONCILE_DURATION
        .with_label_values(&["Bucket"])
        .start_timer();
    let outcome = Reconciler::reconcile(ctx, &namespace, &name).await;
    #[cfg(feature = "metrics")]
    timer.observe_duration();

    #[cfg(feature = "metrics")]
    metrics::record_outcome("Bucket", outcome_label(&outcome));

    match outcome {
        ackr_types::ReconcileOutcome::Done => Ok(Action::await_change()),
        ackr_types::ReconcileOutcome::RequeueImmediate => Ok(Action::requeue(Duration::ZERO)),
        ackr_types::ReconcileOutcome::RequeueAfter(duration) => Ok(Action::requeue(duration)),
        ackr_types::ReconcileOutcome::Fatal(err) => Err(err),
    }
}

#[cfg(feature = "metrics")]
fn outcome_label(outcome: &ackr_types::ReconcileOutcome) -> &'static str {
    match outcome {
        ackr_types::ReconcileOutcome::Done => "done",
        ackr_types::ReconcileOutcome::RequeueImmediate => "requeue_immediate",
        ackr_types::ReconcileOutcome::RequeueAfter(_) => "requeue_after",
        ackr_types::ReconcileOutcome::Fatal(_) => "fatal",
    }
}

fn on_error(
    obj: Arc<Bucket>,
    error: &ackr_types::ReconcileError,
    _ctx: Arc<
        Reconciler<Bucket, BucketDescriptor, BucketManagerFactory, BucketServiceController, KubeCluster>,
    >,
) -> Action {
    tracing::error!(error = %error, resource = ?obj.metadata.name, "reconciliation error");
    Action::requeue(Duration::from_secs(5))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        default_panic(info);
        std::process::exit(1);
    }));

    #[cfg(feature = "metrics")]
    if let Some(metrics_port) = cli.metrics_port {
        tokio::spawn(metrics::run_server(metrics_port));
    }

    let config = Arc::new(Config::from(&cli));

    let client: Client = Client::try_default()
        .await
        .expect("expected a valid KUBECONFIG environment variable");

    run(client, config).await;

    panic!("controller exited unexpectedly");
}
