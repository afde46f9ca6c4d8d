//! Chat bot integration
//!
//! Turns inbound chat messages into generations and sends the reply back.

pub mod telegram;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::inference::GenerationCoordinator;
use crate::types::generation::{GenerationError, GenerationRequest, GenerationResult};

pub use telegram::{TelegramSender, Update};

pub const EMPTY_MESSAGE_REPLY: &str = "Please send a text message to get a response.";
pub const BUSY_REPLY: &str = "Too many requests are waiting. Please try again in a moment.";

/// Chat delivery errors
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Platform rejected message (status {status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Delivers a text reply to a chat
#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), ChatError>;
}

/// Reply text for a finished generation
pub fn reply_text(result: &GenerationResult) -> String {
    match &result.error {
        None => result.text.clone(),
        Some(GenerationError::TimeoutExceeded(_)) => {
            "The request timed out. The model may be too slow for this prompt.".to_string()
        }
        Some(GenerationError::EmptyOutput) => "The model produced an empty response.".to_string(),
        Some(GenerationError::NotInitialized) => {
            "The model is not available right now.".to_string()
        }
        Some(GenerationError::InvalidParameter(_)) => EMPTY_MESSAGE_REPLY.to_string(),
        Some(GenerationError::ExecutionFailed(_)) | Some(GenerationError::UnexpectedError(_)) => {
            "Model execution failed. Please try again later.".to_string()
        }
    }
}

/// Answers chat messages with at most `max_pending` generations queued or running
pub struct ChatBot {
    coordinator: Arc<GenerationCoordinator>,
    sender: Arc<dyn ChatSender>,
    pending: Arc<Semaphore>,
}

/// How an inbound message was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Queued,
    Empty,
    Busy,
}

impl ChatBot {
    pub fn new(
        coordinator: Arc<GenerationCoordinator>,
        sender: Arc<dyn ChatSender>,
        max_pending: usize,
    ) -> Self {
        Self {
            coordinator,
            sender,
            pending: Arc::new(Semaphore::new(max_pending)),
        }
    }

    /// Answer one message in the background
    ///
    /// A full backlog gets an immediate busy reply instead of a generation.
    pub fn dispatch(&self, chat_id: i64, text: &str) -> Dispatch {
        let sender = self.sender.clone();
        let prompt = text.trim();

        if prompt.is_empty() {
            tokio::spawn(deliver(sender, chat_id, EMPTY_MESSAGE_REPLY.to_string()));
            return Dispatch::Empty;
        }

        let Ok(permit) = self.pending.clone().try_acquire_owned() else {
            tracing::warn!("Chat backlog full, rejecting message from chat {}", chat_id);
            tokio::spawn(deliver(sender, chat_id, BUSY_REPLY.to_string()));
            return Dispatch::Busy;
        };

        let coordinator = self.coordinator.clone();
        let request = GenerationRequest::new(prompt);
        tokio::spawn(async move {
            let result = coordinator.generate(request).await;
            drop(permit);
            deliver(sender, chat_id, reply_text(&result)).await;
        });
        Dispatch::Queued
    }
}

/// Send a reply; failures are logged and dropped
async fn deliver(sender: Arc<dyn ChatSender>, chat_id: i64, text: String) {
    match sender.send_message(chat_id, &text).await {
        Ok(()) => tracing::info!("Reply sent to chat {}", chat_id),
        Err(e) => tracing::error!("Failed to send reply to chat {}: {}", chat_id, e),
    }
}
