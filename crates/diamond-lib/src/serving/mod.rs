//! HTTP serving facade
//!
//! `/predict_price` and `/similar_diamonds` accept GET or POST with a JSON
//! body. Bodies are parsed by hand so every malformed request gets the same
//! `{"error": ...}` shape as a validation failure.

pub mod request_log;
pub mod similarity;

pub use request_log::RequestLog;
pub use similarity::find_similar;

use crate::dataset::Dataset;
use crate::error::{ModelError, RegistryError, ValidationError};
use crate::model::{ModelKind, SupervisedModel};
use crate::observability::{ServiceMetrics, StructuredLogger};
use crate::registry::ModelRegistry;
use crate::validation::{parse_predict_request, parse_similar_request};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

pub const PREDICT_PATH: &str = "/predict_price";
pub const SIMILAR_PATH: &str = "/similar_diamonds";

/// Shared application state
pub struct AppState {
    pub registry: Arc<ModelRegistry>,
    /// Canonical dataset searched by `/similar_diamonds`
    pub dataset: Arc<Dataset>,
    pub request_log: RequestLog,
    pub metrics: ServiceMetrics,
    pub logger: StructuredLogger,
    /// Model used when a prediction request names none
    pub default_model: String,
}

impl AppState {
    pub fn new(
        registry: Arc<ModelRegistry>,
        dataset: Arc<Dataset>,
        default_model: impl Into<String>,
        logger: StructuredLogger,
    ) -> Self {
        let request_log = RequestLog::new(registry.db_path());
        Self {
            registry,
            dataset,
            request_log,
            metrics: ServiceMetrics::new(),
            logger,
            default_model: default_model.into(),
        }
    }
}

/// Error returned to API clients as `{"error": message}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    fn body(&self) -> Value {
        json!({ "error": self.message })
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: e.to_string(),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        let status = match &e {
            RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
            RegistryError::Conflict { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl From<ModelError> for ApiError {
    fn from(e: ModelError) -> Self {
        Self::internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body())).into_response()
    }
}

/// Build the response, queue the request log entry and count errors
fn respond(
    state: &AppState,
    endpoint: &'static str,
    request: &[u8],
    outcome: Result<Value, ApiError>,
) -> Response {
    let (status, body) = match outcome {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => {
            state.metrics.inc_request_errors(endpoint, e.status.as_u16());
            if e.status.is_server_error() {
                error!(endpoint = endpoint, error = %e.message, "Request failed");
            } else {
                debug!(endpoint = endpoint, status = %e.status, error = %e.message, "Request rejected");
            }
            (e.status, e.body())
        }
    };

    state.request_log.record(
        endpoint,
        String::from_utf8_lossy(request).into_owned(),
        body.to_string(),
        state.metrics.clone(),
        state.logger.clone(),
    );

    (status, Json(body)).into_response()
}

async fn predict_price(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let outcome = predict(&state, &body).await;
    respond(&state, PREDICT_PATH, &body, outcome)
}

async fn predict(state: &Arc<AppState>, body: &[u8]) -> Result<Value, ApiError> {
    let started = Instant::now();
    let request = parse_predict_request(body)?;

    let requested = request
        .model_name
        .unwrap_or_else(|| state.default_model.clone());
    // Unknown names cannot have records, so they are NotFound here
    let kind = requested.parse::<ModelKind>().map_err(|_| {
        ApiError::from(RegistryError::NotFound(format!(
            "Model '{}' does not exist",
            requested
        )))
    })?;
    let name = kind.canonical_name();
    let version = request.model_version;
    let diamond = request.diamond;

    let worker = Arc::clone(state);
    let prices = tokio::task::spawn_blocking(move || {
        let load_started = Instant::now();
        let loaded = worker.registry.load(name, version);
        worker
            .metrics
            .observe_model_load_latency(load_started.elapsed().as_secs_f64());

        let mut model = loaded.map_err(|e| {
            worker
                .logger
                .log_model_load_failed(name, version, &e.to_string());
            e
        })?;
        Ok::<_, ApiError>(model.execution_pipeline(std::slice::from_ref(&diamond))?)
    })
    .await
    .map_err(|e| ApiError::internal(format!("Prediction task failed: {}", e)))??;

    let latency = started.elapsed().as_secs_f64();
    state.metrics.observe_prediction_latency(latency);
    state.metrics.inc_predictions_served();
    if let Some(price) = prices.get(0) {
        state.logger.log_prediction(name, version, *price, latency);
    }

    Ok(json!({ "result": prices.to_vec() }))
}

async fn similar_diamonds(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let outcome = similar(&state, &body);
    respond(&state, SIMILAR_PATH, &body, outcome)
}

fn similar(state: &AppState, body: &[u8]) -> Result<Value, ApiError> {
    let request = parse_similar_request(body)?;
    let rows: Vec<Vec<Value>> = find_similar(state.dataset.rows(), &request.diamond, request.count)
        .into_iter()
        .map(|row| row.values())
        .collect();

    state.metrics.inc_similarity_lookups();
    Ok(json!({ "result": rows }))
}

/// Liveness plus a summary of what the service has loaded
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "dataset": state.dataset.name(),
            "dataset_rows": state.dataset.len(),
            "default_model": state.default_model,
        })),
    )
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        ServiceMetrics::render(),
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(PREDICT_PATH, get(predict_price).post(predict_price))
        .route(SIMILAR_PATH, get(similar_diamonds).post(similar_diamonds))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (
                ApiError::from(ValidationError::MissingFields(vec!["x".to_string()])),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(RegistryError::NotFound("gone".to_string())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(RegistryError::Conflict {
                    name: "m".to_string(),
                }),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::from(RegistryError::Serialization("bad".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::from(ModelError::NotFitted("m".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.status(), status);
            assert!(error.body()["error"].is_string());
        }
    }
}
