//! Prometheus metrics server: a single kind-agnostic set of counters and
//! histograms keyed by a `kind` label, plus the HTTP scrape endpoint.

use const_format::concatcp;
use hyper::{
    header::CONTENT_TYPE,
    service::{make_service_fn, service_fn},
    Body, Request, Response, Server,
};
use lazy_static::lazy_static;
use prometheus::{
    labels, opts, register_counter, register_counter_vec, register_histogram_vec,
};
use prometheus::{Counter, CounterVec, Encoder, HistogramVec, TextEncoder};

const METRICS_PREFIX: &str = "ackr_";

lazy_static! {
    pub static ref RECONCILE_COUNTER: CounterVec = register_counter_vec!(
        concatcp!(METRICS_PREFIX, "reconcile_total"),
        "Number of reconciliations, by kind and outcome.",
        &["kind", "outcome"]
    )
    .unwrap();
    pub static ref RECONCILE_DURATION: HistogramVec = register_histogram_vec!(
        concatcp!(METRICS_PREFIX, "reconcile_duration_seconds"),
        "Time spent in a single reconcile call, by kind.",
        &["kind"]
    )
    .unwrap();
    pub static ref RM_CALL_DURATION: HistogramVec = register_histogram_vec!(
        concatcp!(METRICS_PREFIX, "resource_manager_call_duration_seconds"),
        "Time spent in a single resource manager operation, by kind and operation.",
        &["kind", "operation"]
    )
    .unwrap();
    static ref HTTP_COUNTER: Counter = register_counter!(opts!(
        concatcp!(METRICS_PREFIX, "http_requests_total"),
        "Number of HTTP requests made to the metrics server.",
        labels! {"handler" => "all",}
    ))
    .unwrap();
}

/// Records the outcome label for one reconcile call.
pub fn record_outcome(kind: &str, outcome: &str) {
    RECONCILE_COUNTER.with_label_values(&[kind, outcome]).inc();
}

async fn serve_req(_req: Request<Body>) -> Result<Response<Body>, hyper::Error> {
    let encoder = TextEncoder::new();
    HTTP_COUNTER.inc();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer).unwrap();
    let response = Response::builder()
        .status(200)
        .header(CONTENT_TYPE, encoder.format_type())
        .body(Body::from(buffer))
        .unwrap();
    Ok(response)
}

/// Runs the prometheus metrics server on the given port until the process
/// exits.
pub async fn run_server(port: u16) {
    let addr = ([0, 0, 0, 0], port).into();
    tracing::info!(%addr, "metrics server listening");

    let serve_future = Server::bind(&addr).serve(make_service_fn(|_| async {
        Ok::<_, hyper::Error>(service_fn(serve_req))
    }));

    if let Err(err) = serve_future.await {
        tracing::error!(error = %err, "metrics server exited");
    }
}
