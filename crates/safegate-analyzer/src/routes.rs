//! HTTP routes and handlers

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use safegate_classifiers::{BatchReport, SUPPORTED_MODELS};
use safegate_core::{
    BackendMode, BatchRequest, ClassificationRequest, ClassificationResult, ModelPullState,
    PullAck,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/analyze", post(analyze))
        .route("/analyze/batch", post(analyze_batch))
        .route("/models", get(list_models))
        .route("/models/pull", post(pull_model))
        .route("/models/pull/progress", get(pull_progress))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "backend": state.mode() }))
}

async fn metrics(State(state): State<AppState>) -> String {
    state
        .metrics_handle
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}

// ============================================================================
// Classification
// ============================================================================

async fn analyze(
    State(state): State<AppState>,
    body: Result<Json<ClassificationRequest>, JsonRejection>,
) -> Result<Json<ClassificationResult>, AppError> {
    let Json(request) = body?;
    debug!("Analyze request: {} bytes", request.payload.len());

    Ok(Json(state.router.classify(&request).await))
}

async fn analyze_batch(
    State(state): State<AppState>,
    body: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BatchReport>, AppError> {
    let Json(request) = body?;
    info!("Batch request: {} payloads", request.payloads.len());

    Ok(Json(state.batch.run(&request).await))
}

// ============================================================================
// Models
// ============================================================================

#[derive(Debug, Serialize)]
struct ModelsResponse {
    available: Vec<String>,
    recommended: Vec<&'static str>,
}

async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let available = if state.mode() == BackendMode::Ollama {
        match state.backend.list_models().await {
            Ok(models) => models,
            Err(e) => {
                warn!("Model listing failed: {}", e);
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    Json(ModelsResponse {
        available,
        recommended: SUPPORTED_MODELS.to_vec(),
    })
}

#[derive(Debug, Deserialize)]
struct PullRequest {
    model: String,
}

async fn pull_model(
    State(state): State<AppState>,
    body: Result<Json<PullRequest>, JsonRejection>,
) -> Result<Json<PullAck>, AppError> {
    let Json(request) = body?;
    Ok(Json(state.tracker.request_pull(&request.model)))
}

#[derive(Debug, Deserialize)]
struct ProgressQuery {
    model: String,
}

async fn pull_progress(
    State(state): State<AppState>,
    query: Result<Query<ProgressQuery>, QueryRejection>,
) -> Result<Json<ModelPullState>, AppError> {
    let Query(query) = query?;
    Ok(Json(state.tracker.progress(&query.model)))
}

async fn fallback() -> AppError {
    AppError::NotFound
}

// ============================================================================
// Errors
// ============================================================================

/// Error handling
#[derive(Debug)]
enum AppError {
    InvalidRequest(String),
    NotFound,
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request_error", msg)
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, "not_found", "Not found".to_string()),
        };

        let body = json!({
            "error": {
                "message": message,
                "type": kind,
            }
        });

        (status, Json(body)).into_response()
    }
}
