//! Prometheus scrape endpoint and HTTP request metrics
//!
//! `GET /metrics` renders the process-wide `metrics-exporter-prometheus`
//! recorder. The middleware records, per request:
//!
//! - **`http_requests_total`**: counter labelled `service`, `method`, `path`, `status`
//! - **`http_request_duration_seconds`**: histogram labelled `service`, `method`, `path`

use std::time::Instant;

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct MetricsState {
    pub handle: PrometheusHandle,
}

/// `GET /metrics` (no auth)
pub async fn prometheus_metrics(State(state): State<MetricsState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        state.handle.render(),
    )
}

pub async fn http_metrics_middleware(
    State(service): State<&'static str>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    // Unmatched requests share one label so probes cannot blow up cardinality.
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let start = Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed().as_secs_f64();

    let status = response.status().as_u16().to_string();

    metrics::counter!(
        "http_requests_total",
        "service" => service,
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "http_request_duration_seconds",
        "service" => service,
        "method" => method,
        "path" => path
    )
    .record(duration);

    response
}
