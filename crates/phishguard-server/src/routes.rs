//! HTTP routes and handlers

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use phishguard_core::{round_probability, Label, PredictionOutcome};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Instant;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

use crate::config::CorsConfig;
use crate::state::AppState;

/// Message returned when the model could not score the input
pub const PREDICTION_FAILED: &str = "Failed to generate prediction";

pub fn create_router(state: AppState, cors: &CorsConfig) -> anyhow::Result<Router> {
    Ok(Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .fallback(fallback)
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors)?)
        .with_state(state))
}

/// CORS restricted to the configured origins, with credentials
fn cors_layer(config: &CorsConfig) -> anyhow::Result<CorsLayer> {
    let origins = config
        .allowed_origins
        .iter()
        .map(|origin| {
            if origin == "*" {
                anyhow::bail!("wildcard origin cannot be combined with credentials");
            }
            HeaderValue::from_str(origin)
                .map_err(|e| anyhow::anyhow!("invalid CORS origin {}: {}", origin, e))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

/// Classification request
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictRequest {
    pub text: String,
}

/// Response envelope; success and failure share status 200
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictResponse {
    Prediction {
        text: String,
        predictions: Vec<PredictionEntry>,
    },
    Error {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionEntry {
    pub class: Label,
    pub probability: f64,
}

impl PredictResponse {
    /// Build the success envelope for a phishing probability
    pub fn prediction(text: String, probability: f64, threshold: f64) -> Self {
        Self::Prediction {
            text,
            predictions: vec![PredictionEntry {
                class: Label::decide(probability, threshold),
                probability: round_probability(probability),
            }],
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }
}

/// Classify one text
async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Json<PredictResponse> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("predict", %request_id);

    async move {
        let Json(request) = match payload {
            Ok(payload) => payload,
            Err(rejection) => {
                warn!("Malformed predict request: {}", rejection.body_text());
                metrics::counter!("phishguard_malformed_requests_total").increment(1);
                return Json(PredictResponse::error(rejection.body_text()));
            }
        };

        debug!(chars = request.text.chars().count(), "Received predict request");

        let classifier = state.classifier.clone();
        let start = Instant::now();
        let joined = tokio::task::spawn_blocking(move || {
            let outcome = classifier.predict(&request.text);
            (request.text, outcome)
        })
        .await;

        let (text, outcome) = match joined {
            Ok(result) => result,
            Err(e) => {
                error!("Prediction task failed: {}", e);
                metrics::counter!("phishguard_prediction_failures_total").increment(1);
                return Json(PredictResponse::error(e.to_string()));
            }
        };

        metrics::histogram!("phishguard_inference_latency_us")
            .record(start.elapsed().as_micros() as f64);

        match outcome {
            PredictionOutcome::Success { probability } => {
                let response =
                    PredictResponse::prediction(text, probability, state.classifier.threshold());
                if let PredictResponse::Prediction { predictions, .. } = &response {
                    for entry in predictions {
                        info!(class = %entry.class, probability = entry.probability, "Prediction");
                        metrics::counter!(
                            "phishguard_predictions_total",
                            "class" => entry.class.as_str()
                        )
                        .increment(1);
                    }
                }
                Json(response)
            }
            PredictionOutcome::Failure { reason } => {
                warn!("Prediction failed: {}", reason);
                metrics::counter!("phishguard_prediction_failures_total").increment(1);
                Json(PredictResponse::error(PREDICTION_FAILED))
            }
        }
    }
    .instrument(span)
    .await
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "model": state.classifier.name(),
        "device": state.classifier.device(),
        "labels": state.classifier.labels(),
    }))
}

async fn metrics(State(state): State<AppState>) -> String {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}

async fn fallback() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}
