//! Local inference
//!
//! This module locates the llama.cpp binary and model, and drives generations
//! through it one at a time.

pub mod coordinator;
pub mod invoker;
pub mod params;
pub mod paths;
pub mod runner;

pub use coordinator::GenerationCoordinator;
pub use invoker::ProcessInvoker;
pub use paths::ExecutablePaths;
pub use runner::{InferenceRunner, ProcessRunner, RunError, RunOutput};
