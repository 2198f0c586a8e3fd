//! Prometheus metrics for the API server.

use std::sync::LazyLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex::Regex;

static IDENTIFY_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/api/identify/[^/]+").expect("valid path pattern"));

/// Install the Prometheus recorder.
/// Returns a handle that renders the scrape body.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "reelid_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "reelid_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "reelid_http_requests_in_flight";

    pub const SSE_STREAMS_OPENED: &str = "reelid_sse_streams_opened_total";
    pub const SSE_EVENTS_SENT: &str = "reelid_sse_events_sent_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record an SSE stream handed to a client.
pub fn record_sse_stream_opened() {
    counter!(names::SSE_STREAMS_OPENED).increment(1);
}

/// Record an event written to an SSE stream.
pub fn record_sse_event(event_type: &'static str) {
    counter!(names::SSE_EVENTS_SENT, "type" => event_type).increment(1);
}

/// Collapse session and video ids so label cardinality stays bounded.
fn sanitize_path(path: &str) -> String {
    IDENTIFY_ID.replace(path, "/api/identify/:id").into_owned()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    record_http_request(&method, &path, status, start.elapsed().as_secs_f64());

    response
}
