//! Application state
//!
//! Built once at startup and shared by every request handler.

use std::sync::Arc;

use crate::chat::{ChatBot, ChatError, TelegramSender};
use crate::inference::GenerationCoordinator;
use crate::types::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<GenerationCoordinator>,
    /// Present only when a bot token is configured
    pub chat: Option<Arc<ChatBot>>,
}

impl AppState {
    pub fn new(coordinator: Arc<GenerationCoordinator>, chat: Option<Arc<ChatBot>>) -> Self {
        Self { coordinator, chat }
    }

    /// Resolve paths and set up the chat client from configuration
    pub fn from_config(config: &ServerConfig) -> Result<Self, ChatError> {
        let coordinator = Arc::new(GenerationCoordinator::from_config(config));
        if !coordinator.is_ready() {
            tracing::warn!("Service starting without a usable binary and model");
        }

        let chat = match config.telegram_token.as_deref() {
            Some(token) => {
                tracing::info!("Chat webhook enabled");
                let sender = Arc::new(TelegramSender::new(&config.telegram_api_base, token)?);
                Some(Arc::new(ChatBot::new(
                    coordinator.clone(),
                    sender,
                    config.chat_max_pending,
                )))
            }
            None => None,
        };

        tracing::info!("AppState initialized");
        Ok(Self::new(coordinator, chat))
    }
}
