//! Prometheus metrics definitions and HTTP server for metrics and probes

use std::net::SocketAddr;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};
use tokio::net::TcpListener;
use tracing::{error, info};

lazy_static::lazy_static! {
    /// Total number of endpoint events handled
    pub static ref RECONCILIATIONS: CounterVec = register_counter_vec!(
        "networkfs_endpoint_controller_reconciliations_total",
        "Total number of endpoint events handled",
        &["controller"]
    ).unwrap();

    /// Total number of failed reconciliations by error kind
    pub static ref RECONCILIATION_ERRORS: CounterVec = register_counter_vec!(
        "networkfs_endpoint_controller_reconciliation_errors_total",
        "Total number of reconciliation errors",
        &["controller", "kind"]
    ).unwrap();

    /// Reconciliation duration histogram
    pub static ref RECONCILE_DURATION: HistogramVec = register_histogram_vec!(
        "networkfs_endpoint_controller_reconcile_duration_seconds",
        "Duration of reconciliations in seconds",
        &["controller"],
        vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    ).unwrap();

    /// Endpoint events ignored, by reason
    pub static ref SKIPPED_EVENTS: CounterVec = register_counter_vec!(
        "networkfs_endpoint_controller_skipped_events_total",
        "Number of endpoint events skipped by reason",
        &["reason"]
    ).unwrap();

    /// Status subresource writes
    pub static ref STATUS_UPDATES: CounterVec = register_counter_vec!(
        "networkfs_endpoint_controller_status_updates_total",
        "Number of NetworkFilesystem status writes",
        &["controller"]
    ).unwrap();

    /// Controller health (1 = healthy, 0 = unhealthy)
    pub static ref CONTROLLER_HEALTH: prometheus::Gauge = prometheus::register_gauge!(
        "networkfs_endpoint_controller_health",
        "Controller health status (1 = healthy, 0 = unhealthy)"
    ).unwrap();
}

/// Start the metrics HTTP server
pub async fn serve(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on {}", addr);

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);

        tokio::spawn(async move {
            if let Err(e) = http1::Builder::new()
                .serve_connection(io, service_fn(handle_request))
                .await
            {
                error!("Error serving connection: {}", e);
            }
        });
    }
}

/// Handle HTTP requests
async fn handle_request(
    req: Request<hyper::body::Incoming>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    Ok(route(req.uri().path()))
}

fn route(path: &str) -> Response<Full<Bytes>> {
    match path {
        "/metrics" => metrics_response(),
        "/healthz" | "/health" => text_response(StatusCode::OK, "ok"),
        "/readyz" | "/ready" => ready_response(),
        _ => text_response(StatusCode::NOT_FOUND, "Not Found"),
    }
}

/// Generate metrics response
fn metrics_response() -> Response<Full<Bytes>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return text_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics");
    }

    let mut response = Response::new(Full::new(Bytes::from(buffer)));
    if let Ok(value) = HeaderValue::from_str(encoder.format_type()) {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}

/// Ready once the controller has started watching
fn ready_response() -> Response<Full<Bytes>> {
    if CONTROLLER_HEALTH.get() >= 1.0 {
        text_response(StatusCode::OK, "ok")
    } else {
        text_response(StatusCode::SERVICE_UNAVAILABLE, "controller not running")
    }
}

fn text_response(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_path_is_not_found() {
        assert_eq!(route("/nope").status(), StatusCode::NOT_FOUND);
        assert_eq!(route("/healthz").status(), StatusCode::OK);
    }

    #[test]
    fn metrics_are_exposed_in_text_format() {
        RECONCILIATIONS.with_label_values(&["test"]).inc();
        let response = route("/metrics");
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/plain")));
    }
}
