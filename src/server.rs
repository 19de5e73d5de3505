//! HTTP analysis server.
//!
//! Exposes the incremental analysis pipeline over a small JSON API for
//! browser editors that re-submit the whole document as the user types.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/analyze` | Highlight a document, reusing the client's cached scores |
//! | `GET`  | `/health` | Health check (returns version and model) |
//!
//! # `POST /analyze`
//!
//! ```json
//! { "text": "The cat sat. A robot wrote this.", "oldResults": { "3f1c…": 0.12 } }
//! ```
//!
//! responds with
//!
//! ```json
//! { "html": "<span data-id='…' style='…'>The cat sat.</span> …", "results": { "…": 0.1 } }
//! ```
//!
//! `results` is the cache to send back as `oldResults` on the next call.
//! `oldResults` is untrusted: malformed entries are dropped, never
//! rejected.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "…" } }
//! ```
//!
//! Only an unparseable request body is an error (`400 bad_request`).
//! Classifier failures degrade single sentences, not the response.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so that editors served
//! from another origin can call the API.

use std::sync::Arc;

use ai_detector_core::cache::ScoreCache;
use ai_detector_core::classifier::Classifier;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use crate::analyze::Coordinator;
use crate::config::Config;
use crate::model::load_classifier;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    coordinator: Arc<Coordinator>,
}

/// Starts the analysis server with the model configured in `[model].path`.
///
/// The model is loaded before binding; a load failure returns an error
/// and the server never starts listening.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let classifier = load_classifier(&config.model.path)?;
    run_server_with_classifier(config, classifier).await
}

/// Starts the server with an already-constructed classifier.
///
/// Used by tests and by embedders that bring their own model.
pub async fn run_server_with_classifier(
    config: &Config,
    classifier: Arc<dyn Classifier>,
) -> anyhow::Result<()> {
    let coordinator = Arc::new(Coordinator::with_classifier(classifier, &config.analysis));
    let app = router(coordinator.clone());

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(
        bind = %config.server.bind,
        model = coordinator.classifier_name(),
        max_concurrency = config.analysis.max_concurrency,
        "analysis server listening"
    );

    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the router around a coordinator.
pub fn router(coordinator: Arc<Coordinator>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/analyze", post(handle_analyze))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState { coordinator })
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    model: String,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.coordinator.classifier_name().to_string(),
    })
}

// ============ POST /analyze ============

#[derive(Deserialize)]
struct AnalyzeRequest {
    #[serde(default)]
    text: String,
    /// Kept as raw JSON; sanitized by [`ScoreCache::from_untrusted`].
    #[serde(default, rename = "oldResults")]
    old_results: serde_json::Value,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    html: String,
    results: ScoreCache,
}

/// Handler for `POST /analyze`.
///
/// Returns `400` only when the body is not a JSON object with a string
/// `text`. Everything else degrades gracefully.
async fn handle_analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let Json(request) = payload.map_err(|e| bad_request(e.body_text()))?;

    let prior = ScoreCache::from_untrusted(&request.old_results);
    if prior.rejected > 0 {
        debug!(rejected = prior.rejected, "ignored malformed cache entries");
    }

    let analysis = state.coordinator.analyze(&request.text, &prior.cache).await;

    Ok(Json(AnalyzeResponse {
        html: analysis.html(),
        results: analysis.cache,
    }))
}
