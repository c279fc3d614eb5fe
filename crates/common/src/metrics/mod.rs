//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with standardized naming conventions.
//! The exporter is installed by the gateway binary.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all DocQA metrics
pub const METRICS_PREFIX: &str = "docqa";

/// Buckets for inference latency (remote model calls are slow)
pub const INFERENCE_BUCKETS: &[f64] = &[
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.000,  // 2s
    5.000,  // 5s
    10.00,  // 10s
    30.00,  // 30s
    60.00,  // 60s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Upload metrics
    describe_counter!(
        format!("{}_uploads_total", METRICS_PREFIX),
        Unit::Count,
        "Total uploads by file kind and outcome"
    );

    describe_histogram!(
        format!("{}_extraction_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Extraction latency in seconds"
    );

    // Query metrics
    describe_counter!(
        format!("{}_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total questions by outcome"
    );

    describe_histogram!(
        format!("{}_inference_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Inference endpoint latency in seconds"
    );

    describe_counter!(
        format!("{}_inference_errors_total", METRICS_PREFIX),
        Unit::Count,
        "Total failed inference calls"
    );

    // Telemetry metrics
    describe_counter!(
        format!("{}_telemetry_snapshots_total", METRICS_PREFIX),
        Unit::Count,
        "Browser telemetry submissions by outcome"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record upload metrics
pub fn record_upload(kind: &str, outcome: &str) {
    counter!(
        format!("{}_uploads_total", METRICS_PREFIX),
        "kind" => kind.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Helper to record extraction latency
pub fn record_extraction(duration_secs: f64, kind: &str) {
    histogram!(
        format!("{}_extraction_duration_seconds", METRICS_PREFIX),
        "kind" => kind.to_string()
    )
    .record(duration_secs);
}

/// Helper to record query metrics
pub fn record_query(outcome: &str) {
    counter!(
        format!("{}_queries_total", METRICS_PREFIX),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Helper to record inference metrics
pub fn record_inference(duration_secs: f64, provider: &str, success: bool) {
    if success {
        histogram!(
            format!("{}_inference_duration_seconds", METRICS_PREFIX),
            "provider" => provider.to_string()
        )
        .record(duration_secs);
    } else {
        counter!(
            format!("{}_inference_errors_total", METRICS_PREFIX),
            "provider" => provider.to_string()
        )
        .increment(1);
    }
}

/// Helper to record telemetry snapshot outcomes
pub fn record_telemetry(outcome: &str) {
    counter!(
        format!("{}_telemetry_snapshots_total", METRICS_PREFIX),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inference_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in INFERENCE_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
    }

    #[test]
    fn test_request_metrics() {
        let metrics = RequestMetrics::start("POST", "/query/{org_id}");
        std::thread::sleep(std::time::Duration::from_millis(5));
        metrics.finish(200);
        // No recorder installed; just verify it runs without panic
    }
}
