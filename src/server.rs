//! HTTP surface: landing page, detection and health endpoints

use crate::artifact::ArtifactStore;
use crate::config::AppConfig;
use crate::error::{InferenceError, StartupError, ValidationError};
use crate::metrics::ServiceMetrics;
use crate::models::{HealthMonitor, InferenceService, ModelProvider};
use crate::types::{HealthStatus, Message, PredictionResult};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

const INDEX_HTML: &str = include_str!("../templates/index.html");

/// Shared, immutable state handed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub inference: Arc<InferenceService>,
    pub health: Arc<HealthMonitor>,
    pub metrics: Arc<ServiceMetrics>,
}

/// Resolve and load the model, then assemble the handler state.
///
/// Runs to completion before any listener is bound; an error here means the
/// service never becomes ready.
pub async fn bootstrap(config: &AppConfig) -> Result<AppState, StartupError> {
    let store = ArtifactStore::new(&config.model_path, config.model_url.clone());
    let artifact = store.ensure().await?;
    let provider = ModelProvider::load(&artifact, config.onnx_threads)?;
    info!(path = %provider.path().display(), "Model ready");

    Ok(AppState {
        inference: Arc::new(InferenceService::new(provider.model())),
        health: Arc::new(HealthMonitor::new(provider.model())),
        metrics: Arc::new(ServiceMetrics::new()),
    })
}

/// Per-request failure rendered as `{"error": ...}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn router<P: AsRef<Path>>(state: AppState, static_dir: P) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/detect", post(detect))
        .route("/health", get(health_check))
        .nest_service("/static", ServeDir::new(static_dir.as_ref()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn home() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn detect(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PredictionResult>, ApiError> {
    let message = parse_message(&body).inspect_err(|_| {
        state.metrics.record_validation_failure();
    })?;

    // Model calls are CPU bound; keep them off the async workers.
    let start = Instant::now();
    let inference = Arc::clone(&state.inference);
    let outcome = tokio::task::spawn_blocking(move || inference.predict(&message))
        .await
        .unwrap_or_else(|e| {
            Err(InferenceError::runtime(format!(
                "Inference task failed: {}",
                e
            )))
        });

    match outcome {
        Ok(prediction) => {
            state.metrics.record_prediction(
                start.elapsed(),
                prediction.label,
                prediction.probabilities.fraudulent,
            );
            Ok(Json(prediction))
        }
        Err(e) => {
            error!(error = %e, "Inference failed");
            state.metrics.record_inference_failure();
            Err(e.into())
        }
    }
}

/// Read `message` from a JSON body. A body that is not a JSON object, or whose
/// `message` is not a string, counts as no message.
fn parse_message(body: &[u8]) -> Result<Message, ValidationError> {
    let payload: Value = serde_json::from_slice(body).unwrap_or_else(|e| {
        debug!(error = %e, "Request body is not valid JSON");
        Value::Null
    });
    Message::parse(payload.get("message").and_then(Value::as_str))
}

async fn health_check(State(state): State<AppState>) -> Response {
    let health = Arc::clone(&state.health);
    let status = tokio::task::spawn_blocking(move || health.check())
        .await
        .unwrap_or_else(|e| HealthStatus::unhealthy(format!("Health check task failed: {}", e)));
    state.metrics.record_health_check(status.ok);

    if status.ok {
        Json(json!({
            "status": "ok",
            "model_loaded": true,
            "test_prediction": status.detail,
        }))
        .into_response()
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "status": "error",
                "error": status.detail,
            })),
        )
            .into_response()
    }
}
