use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use lazy_static::lazy_static;
use prometheus::core::Collector;
use prometheus::{
    CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

use crate::recommend::RecommendError;

/// Metric name prefix for all recommender metrics
const PREFIX: &str = "recommender";

/// Routes served by the API, anything else is reported as "other".
const KNOWN_ENDPOINTS: &[&str] = &["/", "/recommend", "/recommend_mood", "/moods", "/trending"];

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "HTTP requests served, by route and status"),
        &["method", "path", "status"]
    ).expect("http_requests_total metric options are valid");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "Time spent answering HTTP requests, in seconds"
        )
        .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["method", "path"]
    ).expect("http_request_duration_seconds metric options are valid");

    // Recommendation Metrics
    pub static ref RECOMMENDATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_recommendations_total"), "Recommendation requests by kind and outcome"),
        &["kind", "outcome"]
    ).expect("recommendations_total metric options are valid");

    // Catalog Metrics
    pub static ref CATALOG_SONGS_TOTAL: Gauge = Gauge::new(
        format!("{PREFIX}_catalog_songs_total"),
        "Number of songs in the loaded catalog"
    ).expect("catalog_songs_total metric options are valid");
}

/// Registers every collector with [`REGISTRY`].
///
/// Safe to call more than once: collectors already registered are skipped,
/// which lets unit tests share the process-wide registry.
pub fn init_metrics() {
    let collectors: Vec<Box<dyn Collector>> = vec![
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()),
        Box::new(RECOMMENDATIONS_TOTAL.clone()),
        Box::new(CATALOG_SONGS_TOTAL.clone()),
    ];
    for collector in collectors {
        if let Err(err) = REGISTRY.register(collector) {
            if !matches!(err, prometheus::Error::AlreadyReg) {
                tracing::warn!("Failed to register metric: {}", err);
            }
        }
    }
    tracing::info!("Metrics registered under the \"{}\" prefix", PREFIX);
}

pub fn init_catalog_metrics(num_songs: usize) {
    CATALOG_SONGS_TOTAL.set(num_songs as f64);
    tracing::info!("Catalog metrics initialized: {} songs", num_songs);
}

/// Collapses unknown paths so scanners can't blow up label cardinality.
pub fn endpoint_label(path: &str) -> &str {
    KNOWN_ENDPOINTS
        .iter()
        .find(|known| **known == path)
        .copied()
        .unwrap_or("other")
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let path = endpoint_label(path);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Record the outcome of a recommendation of the given kind ("similar", "mood", "trending").
pub fn record_recommendation_outcome(kind: &str, outcome: &str) {
    RECOMMENDATIONS_TOTAL
        .with_label_values(&[kind, outcome])
        .inc();
}

pub fn record_recommendation<T>(kind: &str, result: &Result<T, RecommendError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(err) => err.kind(),
    };
    record_recommendation_outcome(kind, outcome);
}

/// Serves [`REGISTRY`] in the Prometheus text exposition format.
pub async fn metrics_handler() -> Response {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", err);
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    (
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}
