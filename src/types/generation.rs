//! Generation types
//!
//! Request, result, and error types for a single text generation.

use thiserror::Error;

pub const DEFAULT_MAX_TOKENS: i64 = 512;
pub const DEFAULT_TEMPERATURE: f32 = 0.8;
pub const DEFAULT_TOP_P: f32 = 0.9;
pub const DEFAULT_REPEAT_PENALTY: f32 = 1.1;

/// Parameters of one generation
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_tokens: i64,
    pub temperature: f32,
    pub top_p: f32,
    pub repeat_penalty: f32,
}

impl GenerationRequest {
    /// Request with default sampling parameters
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            repeat_penalty: DEFAULT_REPEAT_PENALTY,
        }
    }
}

/// Generation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("Inference binary or model file not found")]
    NotInitialized,
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Generation exceeded the {0}s time limit")]
    TimeoutExceeded(u64),
    #[error("Inference process failed ({})", describe_exit(.0))]
    ExecutionFailed(Option<i32>),
    #[error("Model produced an empty response")]
    EmptyOutput,
    #[error("Unexpected error: {0}")]
    UnexpectedError(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

impl GenerationError {
    /// Stable machine-readable code
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotInitialized => "NotInitialized",
            Self::InvalidParameter(_) => "InvalidParameter",
            Self::TimeoutExceeded(_) => "TimeoutExceeded",
            Self::ExecutionFailed(_) => "ExecutionFailed",
            Self::EmptyOutput => "EmptyOutput",
            Self::UnexpectedError(_) => "UnexpectedError",
        }
    }
}

/// Outcome of one generation
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub success: bool,
    pub text: String,
    /// Whitespace-separated word count, not a tokenizer count
    pub tokens_generated: usize,
    pub elapsed_seconds: f64,
    pub error: Option<GenerationError>,
}

impl GenerationResult {
    pub fn success(text: String, elapsed_seconds: f64) -> Self {
        let tokens_generated = text.split_whitespace().count();
        Self {
            success: true,
            text,
            tokens_generated,
            elapsed_seconds,
            error: None,
        }
    }

    pub fn failure(error: GenerationError, elapsed_seconds: f64) -> Self {
        Self {
            success: false,
            text: String::new(),
            tokens_generated: 0,
            elapsed_seconds,
            error: Some(error),
        }
    }
}
