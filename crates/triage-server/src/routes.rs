//! HTTP routes and handlers

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderValue},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use triage_core::{Prediction, PredictionId};

use crate::config::CorsConfig;
use crate::error::{AppError, CORRECTION_FIELDS_REQUIRED, ISSUE_BODY_REQUIRED};
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors);

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/api/predict", post(predict))
        .route("/api/correct", post(correct))
        .route("/api/predictions/:id", get(get_prediction))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.allow_any_origin {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, triage_telemetry::metrics::CONTENT_TYPE)],
        state.metrics.snapshot(),
    )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub id: String,
    pub predicted_label: String,
    pub confidence_score: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CorrectResponse {
    pub id: String,
    pub original_label: String,
    pub corrected_label: String,
}

/// Parse the raw body as JSON.
///
/// Bodies that are not JSON at all count as internal failures rather than
/// validation errors, so extraction happens here instead of in `Json<T>`.
fn parse_body(body: &Bytes) -> Result<Value, AppError> {
    Ok(serde_json::from_slice(body)?)
}

/// A present, non-blank string field of a JSON object
fn required_str<'a>(payload: &'a Value, field: &str) -> Option<&'a str> {
    payload
        .as_object()?
        .get(field)?
        .as_str()
        .filter(|value| !value.trim().is_empty())
}

/// Classify issue text and store the prediction
async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PredictResponse>, AppError> {
    let payload = parse_body(&body)?;
    let issue_body =
        required_str(&payload, "issue_body").ok_or(AppError::Validation(ISSUE_BODY_REQUIRED))?;

    let result = state.classifier.classify(issue_body).await?;
    debug!(
        "Classifier '{}' returned {} ({:.3}) in {}us",
        state.classifier.name(),
        result.label,
        result.score,
        result.latency_us
    );

    // Fail before persisting if the label cannot be counted.
    state.metrics.admit(&result.label)?;

    let prediction = state.store.create(issue_body, result.label).await?;
    let confidence = f64::from(result.score);
    state
        .metrics
        .record_prediction(&prediction.predicted_label, confidence)?;

    info!(
        id = %prediction.id,
        label = %prediction.predicted_label,
        confidence,
        "Prediction stored"
    );

    Ok(Json(PredictResponse {
        id: prediction.id.to_string(),
        predicted_label: prediction.predicted_label,
        confidence_score: confidence,
    }))
}

/// Record a reviewer's label for an earlier prediction
async fn correct(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CorrectResponse>, AppError> {
    let payload = parse_body(&body)?;
    let (id, corrected_label) = match (
        required_str(&payload, "id"),
        required_str(&payload, "corrected_label"),
    ) {
        (Some(id), Some(label)) => (PredictionId::from(id), label.to_string()),
        _ => return Err(AppError::Validation(CORRECTION_FIELDS_REQUIRED)),
    };

    let existing = state.store.get(&id).await?.ok_or(AppError::NotFound)?;
    state.metrics.admit(&existing.predicted_label)?;

    let updated = state.store.apply_correction(&id, corrected_label).await?;
    let was_correct = updated.was_correct().unwrap_or(false);
    state
        .metrics
        .record_correction(&updated.predicted_label, was_correct)?;

    info!(
        id = %updated.id,
        original = %updated.predicted_label,
        was_correct,
        "Correction stored"
    );

    Ok(Json(CorrectResponse {
        id: updated.id.to_string(),
        original_label: updated.predicted_label,
        corrected_label: updated.corrected_label.unwrap_or_default(),
    }))
}

/// Fetch a stored prediction
async fn get_prediction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Prediction>, AppError> {
    let prediction = state
        .store
        .get(&PredictionId::from(id))
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(prediction))
}
