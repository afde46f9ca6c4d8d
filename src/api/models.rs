use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::inference::params::ParameterRanges;
use crate::types::generation::{
    GenerationError, GenerationRequest, DEFAULT_MAX_TOKENS, DEFAULT_REPEAT_PENALTY,
    DEFAULT_TEMPERATURE, DEFAULT_TOP_P,
};

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    pub prompt: Option<String>,
    pub max_tokens: Option<i64>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub repeat_penalty: Option<f32>,
}

impl GenerateBody {
    /// Request with defaults filled in, or `None` without a usable prompt
    pub fn into_request(self) -> Option<GenerationRequest> {
        let prompt = self.prompt.filter(|p| !p.trim().is_empty())?;
        Some(GenerationRequest {
            prompt,
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            top_p: self.top_p.unwrap_or(DEFAULT_TOP_P),
            repeat_penalty: self.repeat_penalty.unwrap_or(DEFAULT_REPEAT_PENALTY),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParametersUsed {
    pub max_tokens: i64,
    pub temperature: f32,
    pub top_p: f32,
    pub repeat_penalty: f32,
}

impl From<&GenerationRequest> for ParametersUsed {
    fn from(req: &GenerationRequest) -> Self {
        Self {
            max_tokens: req.max_tokens,
            temperature: req.temperature,
            top_p: req.top_p,
            repeat_penalty: req.repeat_penalty,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationMetadata {
    pub tokens_generated: usize,
    /// Seconds
    pub generation_time: f64,
    pub parameters_used: ParametersUsed,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub text: String,
    pub metadata: GenerationMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthChecks {
    pub binary_found: bool,
    pub model_found: bool,
    pub initialized: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfoResponse {
    pub binary_path: PathBuf,
    pub model_path: PathBuf,
    pub model_size_bytes: Option<u64>,
    pub timeout_seconds: u64,
    pub parameter_ranges: ParameterRanges,
    pub defaults: ParametersUsed,
}

pub fn default_parameters() -> ParametersUsed {
    ParametersUsed {
        max_tokens: DEFAULT_MAX_TOKENS,
        temperature: DEFAULT_TEMPERATURE,
        top_p: DEFAULT_TOP_P,
        repeat_penalty: DEFAULT_REPEAT_PENALTY,
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
}

/// Failure leaving the HTTP boundary
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "InvalidParameter",
            message: message.into(),
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        let status = match err {
            GenerationError::NotInitialized => StatusCode::SERVICE_UNAVAILABLE,
            GenerationError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            success: false,
            error: self.kind.to_string(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
