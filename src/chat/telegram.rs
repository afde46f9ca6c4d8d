//! Telegram Bot API
//!
//! Webhook payload types and a `sendMessage` client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::chat::{ChatError, ChatSender};

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Inbound webhook update (only the fields we read)
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

pub struct TelegramSender {
    client: reqwest::Client,
    endpoint: String,
}

impl TelegramSender {
    pub fn new(api_base: &str, token: &str) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder().timeout(SEND_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/bot{}/sendMessage", api_base.trim_end_matches('/'), token),
        })
    }
}

#[async_trait]
impl ChatSender for TelegramSender {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), ChatError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&SendMessage { chat_id, text })
            .send()
            .await
            // The endpoint carries the token; keep it out of error messages.
            .map_err(|e| ChatError::Http(e.without_url()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(ChatError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_update() {
        let update: Update = serde_json::from_value(serde_json::json!({
            "update_id": 1,
            "message": {"message_id": 5, "chat": {"id": 99, "type": "private"}, "text": "hi"}
        }))
        .unwrap();
        let message = update.message.unwrap();
        assert_eq!(message.chat.id, 99);
        assert_eq!(message.text.as_deref(), Some("hi"));
    }

    #[test]
    fn test_parse_update_without_message() {
        let update: Update =
            serde_json::from_value(serde_json::json!({"update_id": 2, "edited_message": {}}))
                .unwrap();
        assert!(update.message.is_none());
    }

    #[test]
    fn test_endpoint_format() {
        let sender = TelegramSender::new("http://localhost:9000/", "123:abc").unwrap();
        assert_eq!(sender.endpoint, "http://localhost:9000/bot123:abc/sendMessage");
    }
}
