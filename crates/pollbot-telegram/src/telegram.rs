//! Telegram Bot API adapter.
//!
//! Requests are JSON `POST`s to `<api_base>/bot<token>/<method>`; responses
//! are decoded from the `{ok, result, description}` envelope. The bot token is
//! kept out of every log line and error message.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::gateway::{ChatGateway, GatewayError, GatewayResult, SentPoll, Update};

pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct TelegramGatewayConfig {
    pub api_base: String,
    pub bot_token: String,
    pub http_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    ok: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct PollMessage {
    message_id: i64,
    #[serde(default)]
    poll: Option<PollRef>,
}

#[derive(Debug, Deserialize)]
struct PollRef {
    id: String,
}

/// Blocking [`ChatGateway`] over the Telegram Bot API.
#[derive(Debug, Clone)]
pub struct TelegramGateway {
    client: Client,
    api_base: String,
    bot_token: String,
}

impl TelegramGateway {
    pub fn new(config: TelegramGatewayConfig) -> GatewayResult<Self> {
        let bot_token = config.bot_token.trim().to_string();
        if bot_token.is_empty() {
            return Err(GatewayError::Client(
                "telegram bot token cannot be empty".to_string(),
            ));
        }
        let api_base = config.api_base.trim().trim_end_matches('/').to_string();
        if api_base.is_empty() {
            return Err(GatewayError::Client(
                "telegram api base cannot be empty".to_string(),
            ));
        }
        if config.http_timeout_ms == 0 {
            return Err(GatewayError::Client(
                "telegram http timeout must be greater than 0".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(config.http_timeout_ms))
            .build()
            .map_err(|error| GatewayError::Client(error.without_url().to_string()))?;
        Ok(Self {
            client,
            api_base,
            bot_token,
        })
    }

    fn call<T: DeserializeOwned>(&self, method: &'static str, body: &Value) -> GatewayResult<T> {
        let endpoint = format!("{}/bot{}/{method}", self.api_base, self.bot_token);
        tracing::debug!(method, "calling telegram api");
        let response = self
            .client
            .post(endpoint.as_str())
            .json(body)
            .send()
            .map_err(|error| classify_transport_error(method, error))?;
        let status = response.status();
        let body_raw = response
            .text()
            .map_err(|error| classify_transport_error(method, error))?;

        let envelope = serde_json::from_str::<ApiEnvelope>(&body_raw).ok();
        if !status.is_success() {
            let description = envelope
                .and_then(|envelope| envelope.description)
                .unwrap_or_else(|| truncate_detail(&body_raw));
            return Err(classify_provider_status(method, status, description));
        }
        let envelope = envelope.ok_or_else(|| GatewayError::Decode {
            method,
            detail: truncate_detail(&body_raw),
        })?;
        if !envelope.ok {
            return Err(GatewayError::Rejected {
                method,
                status: envelope.error_code.unwrap_or(status.as_u16()),
                description: envelope
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }
        let result = envelope.result.unwrap_or(Value::Null);
        serde_json::from_value::<T>(result).map_err(|error| GatewayError::Decode {
            method,
            detail: error.to_string(),
        })
    }
}

impl ChatGateway for TelegramGateway {
    fn send_message(&self, chat_id: &str, text: &str) -> GatewayResult<()> {
        self.call::<Value>(
            "sendMessage",
            &json!({
                "chat_id": chat_id.trim(),
                "text": text,
                "disable_web_page_preview": true
            }),
        )?;
        Ok(())
    }

    fn send_poll(
        &self,
        chat_id: &str,
        question: &str,
        options: &[String],
    ) -> GatewayResult<SentPoll> {
        let options = options
            .iter()
            .map(|option| json!({ "text": option }))
            .collect::<Vec<_>>();
        let message = self.call::<PollMessage>(
            "sendPoll",
            &json!({
                "chat_id": chat_id.trim(),
                "question": question,
                "options": options,
                "is_anonymous": false,
                "type": "regular",
                "allows_multiple_answers": false
            }),
        )?;
        let poll = message.poll.ok_or_else(|| GatewayError::Decode {
            method: "sendPoll",
            detail: "sent message carries no poll".to_string(),
        })?;
        Ok(SentPoll {
            message_id: message.message_id,
            poll_id: poll.id,
        })
    }

    fn stop_poll(&self, chat_id: &str, message_id: i64) -> GatewayResult<()> {
        self.call::<Value>(
            "stopPoll",
            &json!({
                "chat_id": chat_id.trim(),
                "message_id": message_id
            }),
        )?;
        Ok(())
    }

    fn get_updates(&self, offset: Option<i64>) -> GatewayResult<Vec<Update>> {
        let body = match offset {
            Some(offset) => {
                tracing::info!(offset, "fetching updates since offset");
                json!({ "offset": offset, "timeout": 0 })
            }
            None => {
                tracing::info!("no update offset given, fetching all retained updates");
                json!({ "timeout": 0 })
            }
        };
        self.call::<Vec<Update>>("getUpdates", &body)
    }
}

fn classify_transport_error(method: &'static str, error: reqwest::Error) -> GatewayError {
    let error = error.without_url();
    if error.is_decode() {
        return GatewayError::Decode {
            method,
            detail: error.to_string(),
        };
    }
    if error.is_builder() {
        return GatewayError::Client(error.to_string());
    }
    GatewayError::Transient {
        method,
        detail: error.to_string(),
    }
}

fn classify_provider_status(
    method: &'static str,
    status: StatusCode,
    description: String,
) -> GatewayError {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        return GatewayError::Transient {
            method,
            detail: format!("status {}: {description}", status.as_u16()),
        };
    }
    GatewayError::Rejected {
        method,
        status: status.as_u16(),
        description,
    }
}

fn truncate_detail(raw: &str) -> String {
    const LIMIT: usize = 512;
    let trimmed = raw.trim();
    if trimmed.chars().count() <= LIMIT {
        return trimmed.to_string();
    }
    let mut output = trimmed.chars().take(LIMIT).collect::<String>();
    output.push_str("...");
    output
}
