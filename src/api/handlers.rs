use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::api::models::{
    default_parameters, ApiError, GenerateBody, GenerateResponse, GenerationMetadata,
    HealthChecks, HealthResponse, ModelInfoResponse, ParametersUsed,
};
use crate::app::AppState;
use crate::chat::{Dispatch, Update};
use crate::inference::params;
use crate::types::generation::GenerationError;

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let mut endpoints = json!({
        "GET /": "Service descriptor",
        "GET /health": "Readiness of the inference binary and model",
        "GET /model/info": "Resolved paths and supported parameter ranges",
        "POST /generate": "Generate text from a prompt",
    });
    if state.chat.is_some() {
        endpoints["POST /webhook"] = json!("Chat bot webhook");
    }
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "status": "online",
        "endpoints": endpoints,
    }))
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let paths = state.coordinator.paths();
    let ready = paths.is_ready();
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if ready { "healthy" } else { "unhealthy" }.to_string(),
            checks: HealthChecks {
                binary_found: paths.binary_found(),
                model_found: paths.model_found(),
                initialized: ready,
            },
        }),
    )
}

pub async fn model_info(State(state): State<AppState>) -> Result<Json<ModelInfoResponse>, ApiError> {
    let paths = state.coordinator.paths();
    let (Some(binary_path), Some(model_path)) = (paths.binary_path.clone(), paths.model_path.clone())
    else {
        return Err(GenerationError::NotInitialized.into());
    };

    Ok(Json(ModelInfoResponse {
        binary_path,
        model_path,
        model_size_bytes: paths.model_size_bytes(),
        timeout_seconds: state.coordinator.timeout().as_secs(),
        parameter_ranges: params::parameter_ranges(),
        defaults: default_parameters(),
    }))
}

pub async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::invalid(e.body_text()))?;
    let request = body
        .into_request()
        .ok_or_else(|| ApiError::invalid("prompt is required"))?;

    if !state.coordinator.is_ready() {
        return Err(GenerationError::NotInitialized.into());
    }

    let parameters_used = ParametersUsed::from(&params::clamp(request.clone()));
    let result = state.coordinator.generate(request).await;

    if let Some(err) = result.error {
        return Err(err.into());
    }

    Ok(Json(GenerateResponse {
        success: true,
        text: result.text,
        metadata: GenerationMetadata {
            tokens_generated: result.tokens_generated,
            generation_time: result.elapsed_seconds,
            parameters_used,
        },
    }))
}

/// Accept a chat update and answer it in the background
///
/// Always acknowledges so the platform does not redeliver, including when the
/// backlog is full.
pub async fn webhook(
    State(state): State<AppState>,
    payload: Result<Json<Update>, JsonRejection>,
) -> Json<Value> {
    tracing::info!("Received webhook update");
    let ack = Json(json!({ "status": "ok" }));

    let update = match payload {
        Ok(Json(update)) => update,
        Err(e) => {
            tracing::warn!("Ignoring malformed webhook update: {}", e.body_text());
            return ack;
        }
    };
    let (Some(bot), Some(message)) = (state.chat.as_ref(), update.message) else {
        return ack;
    };

    let text = message.text.unwrap_or_default();
    if bot.dispatch(message.chat.id, &text) == Dispatch::Busy {
        tracing::warn!("Webhook update {} answered as busy", update.update_id);
    }

    ack
}
