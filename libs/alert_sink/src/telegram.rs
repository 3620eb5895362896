//! Telegram Bot API sink

use crate::{AlertSink, SinkError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub api_base: String,
    pub request_timeout: Duration,
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Read credentials from the given environment variables.
    ///
    /// Returns `None` when either is unset or blank.
    pub fn from_env(token_var: &str, chat_var: &str) -> Option<Self> {
        let token = std::env::var(token_var).ok().filter(|v| !v.trim().is_empty())?;
        let chat = std::env::var(chat_var).ok().filter(|v| !v.trim().is_empty())?;
        Some(Self::new(token, chat))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.bot_token
        )
    }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug)]
pub struct TelegramSink {
    config: TelegramConfig,
    client: reqwest::Client,
}

impl TelegramSink {
    pub fn new(config: TelegramConfig) -> Result<Self, SinkError> {
        if config.bot_token.is_empty() || config.chat_id.is_empty() {
            return Err(SinkError::invalid_config("telegram token and chat id are required"));
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SinkError::invalid_config(e.to_string()))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl AlertSink for TelegramSink {
    async fn notify(&self, text: &str) -> Result<(), SinkError> {
        let body = SendMessageRequest {
            chat_id: &self.config.chat_id,
            text,
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(self.config.send_message_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SinkError::Timeout(self.config.request_timeout.as_millis() as u64)
                } else {
                    SinkError::from(e)
                }
            })?;

        let status = response.status();
        if status.is_success() {
            let api: ApiResponse = response.json().await?;
            if api.ok {
                debug!("Telegram alert delivered");
                return Ok(());
            }
            return Err(SinkError::Rejected(
                api.description.unwrap_or_else(|| "ok=false".to_string()),
            ));
        }

        let detail = response.text().await.unwrap_or_default();
        Err(SinkError::http_status(
            format!("telegram returned {}: {}", status, detail),
            status.as_u16(),
        ))
    }

    fn name(&self) -> &str {
        "telegram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_message_url() {
        let mut config = TelegramConfig::new("123:abc", "42");
        assert_eq!(
            config.send_message_url(),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );

        config.api_base = "http://localhost:8081/".to_string();
        assert_eq!(config.send_message_url(), "http://localhost:8081/bot123:abc/sendMessage");
    }

    #[test]
    fn test_request_body_shape() {
        let body = SendMessageRequest {
            chat_id: "42",
            text: "LONG BTC",
            disable_web_page_preview: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["chat_id"], "42");
        assert_eq!(json["text"], "LONG BTC");
        assert_eq!(json["disable_web_page_preview"], true);
    }

    #[test]
    fn test_empty_credentials_rejected() {
        let result = TelegramSink::new(TelegramConfig::new("", "42"));
        assert!(matches!(result, Err(SinkError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_env_requires_both_vars() {
        std::env::set_var("ALERT_SINK_TEST_TOKEN", "t");
        std::env::remove_var("ALERT_SINK_TEST_CHAT");
        assert!(TelegramConfig::from_env("ALERT_SINK_TEST_TOKEN", "ALERT_SINK_TEST_CHAT").is_none());

        std::env::set_var("ALERT_SINK_TEST_CHAT", "99");
        let config = TelegramConfig::from_env("ALERT_SINK_TEST_TOKEN", "ALERT_SINK_TEST_CHAT").unwrap();
        assert_eq!(config.chat_id, "99");

        std::env::remove_var("ALERT_SINK_TEST_TOKEN");
        std::env::remove_var("ALERT_SINK_TEST_CHAT");
    }
}
