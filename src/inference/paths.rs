//! Binary and model discovery
//!
//! Probes ordered candidate lists; the first usable entry of each list wins.

use std::fs;
use std::path::{Path, PathBuf};

/// Models at or below this size are treated as placeholders.
pub const MIN_MODEL_SIZE_BYTES: u64 = 1024 * 1024;

/// Resolved runtime dependencies
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutablePaths {
    pub binary_path: Option<PathBuf>,
    pub model_path: Option<PathBuf>,
}

impl ExecutablePaths {
    /// Probe both candidate lists against the filesystem
    pub fn resolve(binary_candidates: &[PathBuf], model_candidates: &[PathBuf]) -> Self {
        tracing::info!("Searching for llama.cpp binary...");
        let binary_path = binary_candidates.iter().find(|p| is_executable(p)).cloned();
        match &binary_path {
            Some(path) => tracing::info!("Binary found at {}", path.display()),
            None => tracing::warn!(
                "No executable binary among {} candidates",
                binary_candidates.len()
            ),
        }

        tracing::info!("Searching for model file...");
        let model_path = model_candidates.iter().find(|p| is_usable_model(p)).cloned();
        match &model_path {
            Some(path) => tracing::info!("Model found at {}", path.display()),
            None => tracing::warn!(
                "No model larger than {} bytes among {} candidates",
                MIN_MODEL_SIZE_BYTES,
                model_candidates.len()
            ),
        }

        Self {
            binary_path,
            model_path,
        }
    }

    pub fn binary_found(&self) -> bool {
        self.binary_path.is_some()
    }

    pub fn model_found(&self) -> bool {
        self.model_path.is_some()
    }

    pub fn is_ready(&self) -> bool {
        self.binary_found() && self.model_found()
    }

    /// Size of the resolved model, if it is still readable
    pub fn model_size_bytes(&self) -> Option<u64> {
        self.model_path
            .as_deref()
            .and_then(|p| fs::metadata(p).ok())
            .map(|m| m.len())
    }
}

/// Regular file the current process may execute
fn is_executable(path: &Path) -> bool {
    let is_file = fs::metadata(path).map(|m| m.is_file()).unwrap_or(false);
    is_file && has_execute_access(path)
}

#[cfg(unix)]
fn has_execute_access(path: &Path) -> bool {
    use nix::unistd::{access, AccessFlags};
    access(path, AccessFlags::X_OK).is_ok()
}

#[cfg(not(unix))]
fn has_execute_access(_path: &Path) -> bool {
    true
}

fn is_usable_model(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.len() > MIN_MODEL_SIZE_BYTES)
        .unwrap_or(false)
}
