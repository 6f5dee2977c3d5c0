//! Observability infrastructure for the pricing service
//!
//! Provides:
//! - Prometheus metrics (prediction latency, model load latency, request counters)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Encoder, Histogram,
    IntCounter, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

struct ServiceMetricsInner {
    prediction_latency_seconds: Histogram,
    model_load_latency_seconds: Histogram,
    predictions_served: IntCounter,
    similarity_lookups: IntCounter,
    request_errors: IntCounterVec,
    request_log_failures: IntCounter,
    models_saved: IntCounter,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "diamond_prediction_latency_seconds",
                "Time spent resolving, loading and running a model for one prediction",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            model_load_latency_seconds: register_histogram!(
                "diamond_model_load_latency_seconds",
                "Time spent reading and deserializing a model artifact",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register model_load_latency_seconds"),

            predictions_served: register_int_counter!(
                "diamond_predictions_served_total",
                "Total number of successful price predictions"
            )
            .expect("Failed to register predictions_served"),

            similarity_lookups: register_int_counter!(
                "diamond_similarity_lookups_total",
                "Total number of successful similar-diamond lookups"
            )
            .expect("Failed to register similarity_lookups"),

            request_errors: register_int_counter_vec!(
                "diamond_request_errors_total",
                "Requests answered with an error, by endpoint and status",
                &["endpoint", "status"]
            )
            .expect("Failed to register request_errors"),

            request_log_failures: register_int_counter!(
                "diamond_request_log_failures_total",
                "Request/response pairs that could not be written to api_history"
            )
            .expect("Failed to register request_log_failures"),

            models_saved: register_int_counter!(
                "diamond_models_saved_total",
                "Model versions written to the registry by this process"
            )
            .expect("Failed to register models_saved"),
        }
    }
}

/// Service metrics for Prometheus exposition
///
/// A lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct ServiceMetrics {
    inner: &'static ServiceMetricsInner,
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServiceMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceMetrics").finish_non_exhaustive()
    }
}

impl ServiceMetrics {
    /// Create a metrics handle (registers global metrics on first call)
    pub fn new() -> Self {
        Self {
            inner: GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new),
        }
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner.prediction_latency_seconds.observe(duration_secs);
    }

    pub fn observe_model_load_latency(&self, duration_secs: f64) {
        self.inner.model_load_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions_served(&self) {
        self.inner.predictions_served.inc();
    }

    pub fn inc_similarity_lookups(&self) {
        self.inner.similarity_lookups.inc();
    }

    pub fn inc_request_errors(&self, endpoint: &str, status: u16) {
        self.inner
            .request_errors
            .with_label_values(&[endpoint, &status.to_string()])
            .inc();
    }

    pub fn inc_request_log_failures(&self) {
        self.inner.request_log_failures.inc();
    }

    pub fn inc_models_saved(&self) {
        self.inner.models_saved.inc();
    }

    pub fn predictions_served(&self) -> u64 {
        self.inner.predictions_served.get()
    }

    /// Render every registered metric in the Prometheus text format
    pub fn render() -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
            warn!(error = %e, "Failed to encode metrics");
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Structured logger for service events
///
/// Emits every significant event with a stable `event` field so JSON logs
/// can be filtered by it.
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_startup(&self, version: &str, address: &str, dataset_rows: usize) {
        info!(
            event = "service_started",
            instance = %self.instance,
            service_version = %version,
            address = %address,
            dataset_rows = dataset_rows,
            "Diamond pricing service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_stopped",
            instance = %self.instance,
            reason = %reason,
            "Diamond pricing service shutting down"
        );
    }

    pub fn log_model_trained(&self, model_name: &str, dataset: &str, rows: usize, r2: f64, mae: f64) {
        info!(
            event = "model_trained",
            instance = %self.instance,
            model_name = %model_name,
            dataset = %dataset,
            rows = rows,
            r2 = r2,
            mae = mae,
            "Model trained"
        );
    }

    pub fn log_model_saved(&self, model_name: &str, version: u32, path: &str) {
        info!(
            event = "model_saved",
            instance = %self.instance,
            model_name = %model_name,
            model_version = version,
            path = %path,
            "Model version saved"
        );
    }

    pub fn log_model_load_failed(&self, model_name: &str, version: Option<u32>, error: &str) {
        warn!(
            event = "model_load_failed",
            instance = %self.instance,
            model_name = %model_name,
            model_version = ?version,
            error = %error,
            "Model could not be loaded"
        );
    }

    pub fn log_prediction(&self, model_name: &str, version: Option<u32>, price: f64, latency_secs: f64) {
        info!(
            event = "prediction_served",
            instance = %self.instance,
            model_name = %model_name,
            model_version = ?version,
            price = price,
            latency_secs = latency_secs,
            "Served price prediction"
        );
    }

    pub fn log_request_log_failed(&self, endpoint: &str, error: &str) {
        warn!(
            event = "request_log_failed",
            instance = %self.instance,
            endpoint = %endpoint,
            error = %error,
            "Failed to record request history, response was not affected"
        );
    }

    pub fn log_artifacts_purged(&self, removed: usize, dangling_records: usize) {
        warn!(
            event = "artifacts_purged",
            instance = %self.instance,
            removed = removed,
            dangling_records = dangling_records,
            "Model artifacts purged, history records now point to missing files"
        );
    }
}
