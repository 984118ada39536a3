//! Prometheus metrics for lexlite-service.
//!
//! Recording goes through the `metrics` facade; until [`init_metrics`] installs
//! the Prometheus recorder every call below is a no-op.

use crate::models::ActionKind;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

const LATENCY_BUCKETS: &[f64] = &[0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0];
const HTTP_BUCKETS: &[f64] = &[0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Install the Prometheus recorder. Later calls reuse the first handle.
///
/// Panics if another global recorder was installed outside this function.
pub fn init_metrics() -> &'static PrometheusHandle {
    METRICS_HANDLE.get_or_init(|| {
        let handle = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Full("lexlite_provider_latency_seconds".to_string()),
                LATENCY_BUCKETS,
            )
            .and_then(|b| {
                b.set_buckets_for_metric(
                    Matcher::Full("http_request_duration_seconds".to_string()),
                    HTTP_BUCKETS,
                )
            })
            .expect("invalid histogram buckets")
            .install_recorder()
            .expect("failed to install Prometheus recorder");

        tracing::info!("Prometheus metrics initialized");
        handle
    })
}

/// Current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

/// Record the outcome of one action attempt.
///
/// `outcome` is one of `content`, `quota_exceeded`, `invalid_request`,
/// `no_document`, `llm_error`.
pub fn record_action(kind: ActionKind, outcome: &'static str) {
    metrics::counter!("lexlite_actions_total", "kind" => kind.as_str(), "outcome" => outcome)
        .increment(1);
}

/// Record the latency of a successful provider call.
pub fn record_provider_latency(model: &str, duration_secs: f64) {
    metrics::histogram!("lexlite_provider_latency_seconds", "model" => model.to_string())
        .record(duration_secs);
}

/// Record a failed provider attempt.
pub fn record_provider_error(error_type: &'static str) {
    metrics::counter!("lexlite_provider_errors_total", "error_type" => error_type).increment(1);
}

/// Record an upload: `loaded`, `replaced`, `ignored` or `rejected`.
pub fn record_document(outcome: &'static str) {
    metrics::counter!("lexlite_documents_total", "outcome" => outcome).increment(1);
}

pub fn set_sessions_active(count: usize) {
    metrics::gauge!("lexlite_sessions_active").set(count as f64);
}
