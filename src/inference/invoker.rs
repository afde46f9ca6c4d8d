//! One inference invocation
//!
//! Builds the llama.cpp command line, runs it through an [`InferenceRunner`],
//! and classifies the outcome into a [`GenerationResult`].

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::Duration;

use crate::inference::paths::ExecutablePaths;
use crate::inference::runner::{InferenceRunner, RunError, RunOutput};
use crate::types::generation::{GenerationError, GenerationRequest, GenerationResult};

pub struct ProcessInvoker {
    runner: Arc<dyn InferenceRunner>,
}

impl ProcessInvoker {
    pub fn new(runner: Arc<dyn InferenceRunner>) -> Self {
        Self { runner }
    }

    /// Run one generation without any locking
    ///
    /// Elapsed time covers launch through classification and is attached to
    /// every outcome.
    pub async fn run(
        &self,
        paths: &ExecutablePaths,
        req: &GenerationRequest,
        limit: Duration,
    ) -> GenerationResult {
        let started = Instant::now();

        let (Some(binary), Some(model)) = (paths.binary_path.as_deref(), paths.model_path.as_deref())
        else {
            return GenerationResult::failure(
                GenerationError::NotInitialized,
                started.elapsed().as_secs_f64(),
            );
        };

        let args = build_args(model, req);
        tracing::info!(
            "Running llama.cpp with prompt: {}...",
            req.prompt.chars().take(50).collect::<String>()
        );

        let outcome = self.runner.run(binary, &args, limit).await;
        let result = classify(outcome, &req.prompt, limit);
        let elapsed = started.elapsed().as_secs_f64();

        match result {
            Ok(text) => GenerationResult::success(text, elapsed),
            Err(err) => GenerationResult::failure(err, elapsed),
        }
    }
}

/// Command line for a llama.cpp CLI binary
pub fn build_args(model: &Path, req: &GenerationRequest) -> Vec<String> {
    vec![
        "-m".to_string(),
        model.display().to_string(),
        "-p".to_string(),
        req.prompt.clone(),
        "-n".to_string(),
        req.max_tokens.to_string(),
        "--temp".to_string(),
        req.temperature.to_string(),
        "--top-p".to_string(),
        req.top_p.to_string(),
        "--repeat-penalty".to_string(),
        req.repeat_penalty.to_string(),
        "--no-display-prompt".to_string(),
        "--log-disable".to_string(),
    ]
}

fn classify(
    outcome: Result<RunOutput, RunError>,
    prompt: &str,
    limit: Duration,
) -> Result<String, GenerationError> {
    let output = match outcome {
        Ok(output) => output,
        Err(RunError::Timeout) => {
            tracing::warn!("Generation timed out after {:?}", limit);
            return Err(GenerationError::TimeoutExceeded(limit.as_secs()));
        }
        Err(e) => {
            tracing::error!("Unexpected error during generation: {}", e);
            return Err(GenerationError::UnexpectedError(e.to_string()));
        }
    };

    if output.exit_code != Some(0) {
        tracing::error!(
            "Process exited with non-zero status: {:?}",
            output.exit_code
        );
        tracing::error!("STDERR: {}", output.stderr.trim());
        return Err(GenerationError::ExecutionFailed(output.exit_code));
    }

    let text = strip_prompt_echo(&output.stdout, prompt);
    if text.is_empty() {
        return Err(GenerationError::EmptyOutput);
    }
    Ok(text)
}

/// Trim output and drop one leading copy of the prompt
///
/// Binaries that ignore `--no-display-prompt` repeat the prompt first; a
/// prompt appearing anywhere else is kept.
pub fn strip_prompt_echo(output: &str, prompt: &str) -> String {
    let trimmed = output.trim();
    match trimmed.strip_prefix(prompt) {
        Some(rest) if !prompt.is_empty() => rest.trim().to_string(),
        _ => trimmed.to_string(),
    }
}
