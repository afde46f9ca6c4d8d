//! Generation coordinator
//!
//! Owns the resolved paths and the generation lock. The inference binary is a
//! singleton resource, so at most one generation runs at any time; waiters are
//! granted the lock in arrival order by [`tokio::sync::Mutex`].

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

use crate::inference::invoker::ProcessInvoker;
use crate::inference::params;
use crate::inference::paths::ExecutablePaths;
use crate::inference::runner::{InferenceRunner, ProcessRunner};
use crate::types::config::ServerConfig;
use crate::types::generation::{GenerationError, GenerationRequest, GenerationResult};

pub struct GenerationCoordinator {
    paths: ExecutablePaths,
    invoker: ProcessInvoker,
    timeout: Duration,
    lock: Mutex<()>,
}

impl GenerationCoordinator {
    pub fn new(paths: ExecutablePaths, runner: Arc<dyn InferenceRunner>, timeout: Duration) -> Self {
        Self {
            paths,
            invoker: ProcessInvoker::new(runner),
            timeout,
            lock: Mutex::new(()),
        }
    }

    /// Probe the configured candidates and run the binary as a child process
    pub fn from_config(config: &ServerConfig) -> Self {
        let paths = ExecutablePaths::resolve(&config.binary_candidates(), &config.model_candidates());
        Self::new(
            paths,
            Arc::new(ProcessRunner),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn paths(&self) -> &ExecutablePaths {
        &self.paths
    }

    pub fn is_ready(&self) -> bool {
        self.paths.is_ready()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Validate, serialize, and run one generation
    ///
    /// Never fails outright; every problem is reported in the result.
    pub async fn generate(&self, raw: GenerationRequest) -> GenerationResult {
        let span = tracing::info_span!("generate", request_id = %Uuid::new_v4());
        self.generate_inner(raw).instrument(span).await
    }

    async fn generate_inner(&self, raw: GenerationRequest) -> GenerationResult {
        let started = Instant::now();
        let req = params::clamp(raw);
        if req.prompt.is_empty() {
            return GenerationResult::failure(
                GenerationError::InvalidParameter("prompt must not be empty".to_string()),
                started.elapsed().as_secs_f64(),
            );
        }
        if !self.is_ready() {
            tracing::warn!("Generation requested before binary and model were found");
            return GenerationResult::failure(
                GenerationError::NotInitialized,
                started.elapsed().as_secs_f64(),
            );
        }

        let _guard = self.lock.lock().await;
        tracing::debug!("Acquired generation lock after {:?}", started.elapsed());

        let result = self.invoker.run(&self.paths, &req, self.timeout).await;
        match &result.error {
            None => tracing::info!(
                "Generated ~{} tokens in {:.2}s",
                result.tokens_generated,
                result.elapsed_seconds
            ),
            Some(err) => tracing::warn!(
                "Generation failed after {:.2}s: {}",
                result.elapsed_seconds,
                err
            ),
        }
        result
    }
}
