//! Counters exported on `/metrics`.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use numbers_api::{PipelineMetrics, PurchaseError, ValidationErrors};
use std::time::Duration;

pub const SEARCH_REQUESTS: &str = "memorable_search_requests_total";
pub const UPSTREAM_FAILURES: &str = "upstream_failures_total";
pub const BACKGROUND_LOG_FAILURES: &str = "background_log_failures_total";
pub const PURCHASE_REQUESTS: &str = "purchase_requests_total";
pub const PIPELINE_LATENCY: &str = "pipeline_stage_latency_seconds";

/// Install the global Prometheus recorder.
///
/// Returns `None` when a recorder is already installed, which happens when
/// several routers are built in one process.
pub fn install_recorder() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(err) => {
            tracing::warn!(error = %err, "metrics_recorder_unavailable");
            None
        }
    }
}

pub fn record_search(outcome: &'static str) {
    metrics::counter!(SEARCH_REQUESTS, "outcome" => outcome).increment(1);
}

pub fn record_upstream_failure(call: &'static str) {
    metrics::counter!(UPSTREAM_FAILURES, "call" => call).increment(1);
}

pub fn record_background_failure(call: &'static str) {
    metrics::counter!(BACKGROUND_LOG_FAILURES, "call" => call).increment(1);
}

pub fn record_purchase(outcome: &'static str) {
    metrics::counter!(PURCHASE_REQUESTS, "outcome" => outcome).increment(1);
}

/// Feeds pipeline stage timings into the metrics facade.
#[derive(Debug, Default)]
pub struct PrometheusPipelineMetrics;

impl PipelineMetrics for PrometheusPipelineMetrics {
    fn record_search(&self, latency: Duration, result: Result<(), ValidationErrors>) {
        let outcome = if result.is_ok() { "ok" } else { "rejected" };
        metrics::histogram!(PIPELINE_LATENCY, "stage" => "search", "outcome" => outcome)
            .record(latency.as_secs_f64());
    }

    fn record_purchase(&self, latency: Duration, result: Result<(), PurchaseError>) {
        let outcome = if result.is_ok() { "ok" } else { "rejected" };
        metrics::histogram!(PIPELINE_LATENCY, "stage" => "purchase", "outcome" => outcome)
            .record(latency.as_secs_f64());
    }
}
