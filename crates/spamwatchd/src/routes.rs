//! API routes for spamwatchd

use crate::error::ApiError;
use crate::server::AppState;
use crate::upload::{parse_messages, UploadFormat};
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use spamwatch_common::history::HISTORY_PREVIEW_CHARS;
use spamwatch_common::schemas::{
    ActionResponse, ApiInfo, BatchItem, BatchMessageRequest, BatchPredictionResponse,
    FilePredictionResponse, HealthResponse, MessageRequest, PredictionResponse,
    StatisticsResponse, ValidationIssue,
};
use spamwatch_common::{now_iso, predict_spam, preview, round_to, ModelBundle, Prediction, VERSION};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

type AppStateArc = Arc<AppState>;

/// Characters of the message echoed back by `/predict`
const RESPONSE_PREVIEW_CHARS: usize = 100;

/// Entries returned by `/statistics`
const RECENT_PREDICTIONS: usize = 10;

/// Run the model over messages on the blocking pool.
async fn classify(
    state: &AppState,
    bundle: Arc<ModelBundle>,
    messages: Vec<String>,
) -> Result<Vec<Prediction>, ApiError> {
    let max_length = state.config.model.max_length;
    let threshold = state.config.model.threshold;

    let predictions = tokio::task::spawn_blocking(move || {
        messages
            .iter()
            .map(|m| predict_spam(&bundle, m, max_length, threshold))
            .collect::<Result<Vec<_>, _>>()
    })
    .await
    .map_err(|e| {
        error!("Inference task failed: {}", e);
        ApiError::PredictionFailed
    })??;

    Ok(predictions)
}

async fn require_model(state: &AppState) -> Result<Arc<ModelBundle>, ApiError> {
    state.current_model().await.ok_or_else(|| {
        warn!("Prediction requested while no model is loaded");
        ApiError::ModelNotLoaded
    })
}

fn elapsed_secs(start: Instant) -> f64 {
    round_to(start.elapsed().as_secs_f64(), 4)
}

fn batch_items(messages: &[String], predictions: &[Prediction]) -> Vec<BatchItem> {
    messages
        .iter()
        .zip(predictions)
        .map(|(m, p)| BatchItem {
            message: preview(m, HISTORY_PREVIEW_CHARS),
            prediction: p.label,
            confidence: p.confidence,
        })
        .collect()
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
}

async fn root() -> Json<ApiInfo> {
    let endpoints: Vec<(String, String)> = [
        ("POST /predict", "Predict single message"),
        ("POST /predict/batch", "Predict multiple messages"),
        ("POST /predict/file", "Predict from file"),
        ("GET /statistics", "Get model statistics"),
        ("GET /health", "Health check"),
        ("DELETE /history", "Clear prediction history"),
        ("PUT /model/reload", "Reload model"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    Json(ApiInfo {
        message: "Spam Detection API".to_string(),
        version: VERSION.to_string(),
        endpoints,
    })
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    let loaded = state.model_loaded().await;
    Json(HealthResponse {
        status: if loaded { "healthy" } else { "unhealthy" }.to_string(),
        model_loaded: loaded,
        timestamp: now_iso(),
        uptime_seconds: state.uptime_seconds(),
    })
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

// ============================================================================
// Predict Routes
// ============================================================================

pub fn predict_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/predict", post(predict_message))
        .route("/predict/batch", post(predict_batch))
        .route("/predict/file", post(predict_file))
}

async fn predict_message(
    State(state): State<AppStateArc>,
    payload: Result<Json<MessageRequest>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let Json(req) = payload?;
    let message = req.validate(&state.config.limits)?;
    let bundle = require_model(&state).await?;

    let start = Instant::now();
    let predictions = classify(&state, bundle, vec![message.clone()]).await?;
    let prediction = predictions[0];

    state
        .history
        .write()
        .await
        .record(&message, &prediction, now_iso());

    debug!("Predicted {} ({:.2}%)", prediction.label, prediction.confidence);

    Ok(Json(PredictionResponse {
        prediction: prediction.label,
        confidence: prediction.confidence,
        timestamp: now_iso(),
        message_preview: preview(&message, RESPONSE_PREVIEW_CHARS),
        processing_time: elapsed_secs(start),
    }))
}

async fn predict_batch(
    State(state): State<AppStateArc>,
    payload: Result<Json<BatchMessageRequest>, JsonRejection>,
) -> Result<Json<BatchPredictionResponse>, ApiError> {
    let Json(req) = payload?;
    req.validate(&state.config.limits)?;
    let bundle = require_model(&state).await?;

    let start = Instant::now();
    let messages: Vec<String> = req.non_blank().map(str::to_string).collect();
    let predictions = classify(&state, bundle, messages.clone()).await?;

    {
        let mut history = state.history.write().await;
        for (message, prediction) in messages.iter().zip(&predictions) {
            history.record(message, prediction, now_iso());
        }
    }

    let results = batch_items(&messages, &predictions);
    info!(
        "Batch classified {} of {} messages",
        results.len(),
        req.messages.len()
    );

    Ok(Json(BatchPredictionResponse {
        total_processed: results.len(),
        processing_time: elapsed_secs(start),
        results,
    }))
}

async fn predict_file(
    State(state): State<AppStateArc>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<FilePredictionResponse>, ApiError> {
    let bundle = require_model(&state).await?;
    let mut multipart = multipart?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;
            upload = Some((filename, bytes));
            break;
        }
    }
    let (filename, bytes) =
        upload.ok_or_else(|| ValidationIssue::body("file", "Field required"))?;

    let format = UploadFormat::from_filename(&filename).ok_or_else(|| {
        ApiError::BadRequest("Unsupported file format. Use CSV or TXT.".to_string())
    })?;
    let text = std::str::from_utf8(&bytes)
        .map_err(|_| ApiError::BadRequest("File must be UTF-8 encoded".to_string()))?;
    let mut messages = parse_messages(format, text)
        .map_err(|e| ApiError::BadRequest(format!("Malformed CSV: {}", e)))?;

    let limit = state.config.limits.max_file_messages;
    if messages.len() > limit {
        info!("{} holds {} messages, classifying the first {}", filename, messages.len(), limit);
        messages.truncate(limit);
    }

    let predictions = classify(&state, bundle, messages.clone()).await?;
    let results = batch_items(&messages, &predictions);

    Ok(Json(FilePredictionResponse {
        filename,
        total_processed: results.len(),
        results,
    }))
}

// ============================================================================
// Management Routes
// ============================================================================

pub fn management_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/statistics", get(get_statistics))
        .route("/history", delete(clear_history))
        .route("/model/reload", put(reload_model))
}

async fn get_statistics(State(state): State<AppStateArc>) -> Json<StatisticsResponse> {
    let metrics = &state.config.metrics;
    let history = state.history.read().await;
    let (spam_count, ham_count) = history.counts();

    Json(StatisticsResponse {
        accuracy: metrics.accuracy,
        precision: metrics.precision,
        recall: metrics.recall,
        f1_score: metrics.f1_score,
        total_predictions: history.len(),
        spam_count,
        ham_count,
        recent_predictions: history.recent(RECENT_PREDICTIONS),
    })
}

async fn clear_history(State(state): State<AppStateArc>) -> Json<ActionResponse> {
    state.history.write().await.clear();
    info!("Prediction history cleared");
    Json(ActionResponse {
        message: "Prediction history cleared successfully".to_string(),
        timestamp: now_iso(),
    })
}

async fn reload_model(State(state): State<AppStateArc>) -> Result<Json<ActionResponse>, ApiError> {
    match state.reload_model().await {
        Ok(()) => {
            info!("Model reloaded");
            Ok(Json(ActionResponse {
                message: "Model reloaded successfully".to_string(),
                timestamp: now_iso(),
            }))
        }
        Err(e) => {
            error!("Model reload failed: {}", e);
            Err(ApiError::ReloadFailed)
        }
    }
}
