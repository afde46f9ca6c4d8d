//! Configuration types
//!
//! Server configuration, read once from the environment at startup.

use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

/// Binary locations probed in order when no override is given.
pub const DEFAULT_BINARY_CANDIDATES: &[&str] = &[
    "/app/llama.cpp/build/bin/llama-cli",
    "/app/llama.cpp/build/bin/main",
    "/app/llama.cpp/llama-cli",
    "/app/llama.cpp/main",
];

/// Model locations probed in order when no override is given.
pub const DEFAULT_MODEL_CANDIDATES: &[&str] = &[
    "/app/models/model.gguf",
    "/app/models/tinyllama-1.1b-chat-v1.0.Q4_K_M.gguf",
];

const DEFAULT_PORT: u16 = 7860;
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const DEFAULT_CHAT_MAX_PENDING: usize = 8;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Server configuration
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: IpAddr,
    /// Listening port
    pub port: u16,
    /// Explicit inference binary, probed before the defaults
    pub binary_override: Option<PathBuf>,
    /// Explicit model file, probed before the defaults
    pub model_override: Option<PathBuf>,
    /// Wall-clock budget for a single generation
    pub timeout_secs: u64,
    /// Enables the chat webhook when present
    #[serde(skip_serializing)]
    pub telegram_token: Option<String>,
    pub telegram_api_base: String,
    /// Chat generations allowed to queue or run before replies turn to "busy"
    pub chat_max_pending: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            binary_override: None,
            model_override: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            telegram_token: None,
            telegram_api_base: DEFAULT_TELEGRAM_API_BASE.to_string(),
            chat_max_pending: DEFAULT_CHAT_MAX_PENDING,
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        if let Some(host) = get("HOST") {
            config.host = host.parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::InvalidValue {
                    key: "HOST",
                    value: host.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        if let Some(port) = get("PORT") {
            config.port = port.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    key: "PORT",
                    value: port.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        if let Some(secs) = get("GENERATION_TIMEOUT_SECS") {
            let parsed: u64 = secs.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    key: "GENERATION_TIMEOUT_SECS",
                    value: secs.clone(),
                    reason: e.to_string(),
                }
            })?;
            if parsed == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "GENERATION_TIMEOUT_SECS",
                    value: secs,
                    reason: "must be at least 1".to_string(),
                });
            }
            config.timeout_secs = parsed;
        }

        if let Some(pending) = get("CHAT_MAX_PENDING") {
            let parsed: usize = pending.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    key: "CHAT_MAX_PENDING",
                    value: pending.clone(),
                    reason: e.to_string(),
                }
            })?;
            if parsed == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "CHAT_MAX_PENDING",
                    value: pending,
                    reason: "must be at least 1".to_string(),
                });
            }
            config.chat_max_pending = parsed;
        }

        config.binary_override = get("LLAMA_CPP_PATH").map(PathBuf::from);
        config.model_override = get("MODEL_PATH").map(PathBuf::from);
        config.telegram_token = get("TELEGRAM_BOT_TOKEN");
        if let Some(base) = get("TELEGRAM_API_BASE") {
            config.telegram_api_base = base.trim_end_matches('/').to_string();
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Binary candidates, override first
    pub fn binary_candidates(&self) -> Vec<PathBuf> {
        self.binary_override
            .iter()
            .cloned()
            .chain(DEFAULT_BINARY_CANDIDATES.iter().map(PathBuf::from))
            .collect()
    }

    /// Model candidates: override, built-in locations, then the user data directory
    pub fn model_candidates(&self) -> Vec<PathBuf> {
        let mut candidates: Vec<PathBuf> = self
            .model_override
            .iter()
            .cloned()
            .chain(DEFAULT_MODEL_CANDIDATES.iter().map(PathBuf::from))
            .collect();

        if let Some(dirs) = directories::ProjectDirs::from("", "", "llama-gate") {
            candidates.push(dirs.data_dir().join("models").join("model.gguf"));
        }

        candidates
    }
}
