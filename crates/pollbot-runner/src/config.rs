use std::path::PathBuf;

use pollbot_telegram::{TelegramGatewayConfig, DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_TELEGRAM_API_BASE};
use thiserror::Error;

pub const BOT_TOKEN_ENV: &str = "BOT_TOKEN";
pub const GROUP_ID_ENV: &str = "GROUP_ID";
pub const STATE_DIR_ENV: &str = "POLLBOT_STATE_DIR";
pub const API_BASE_ENV: &str = "POLLBOT_API_BASE";
pub const HTTP_TIMEOUT_MS_ENV: &str = "POLLBOT_HTTP_TIMEOUT_MS";
pub const QUESTION_PREFIX_ENV: &str = "POLLBOT_QUESTION_PREFIX";
pub const OPTIONS_ENV: &str = "POLLBOT_OPTIONS";
pub const ANNOUNCE_RESULTS_ENV: &str = "POLLBOT_ANNOUNCE_RESULTS";

const DEFAULT_QUESTION_PREFIX: &str = "Abfrage";
const DEFAULT_OPTIONS: [&str; 2] = ["Ja", "Nein"];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Environment variables 'BOT_TOKEN' and 'GROUP_ID' must be set")]
    MissingCredentials,
    #[error("POLLBOT_OPTIONS must list at least two comma-separated options, got {0}")]
    TooFewOptions(usize),
}

/// Poll wording and target chat, handed to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    pub group_id: String,
    pub question_prefix: String,
    pub options: Vec<String>,
    pub announce_results: bool,
}

impl PollSettings {
    pub fn new(group_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            question_prefix: DEFAULT_QUESTION_PREFIX.to_string(),
            options: DEFAULT_OPTIONS.iter().map(|option| option.to_string()).collect(),
            announce_results: false,
        }
    }
}

/// Process configuration, read once at start-up.
#[derive(Clone, PartialEq, Eq)]
pub struct PollBotConfig {
    pub bot_token: String,
    pub state_dir: PathBuf,
    pub api_base: String,
    pub http_timeout_ms: u64,
    pub poll: PollSettings,
}

impl std::fmt::Debug for PollBotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollBotConfig")
            .field("bot_token", &"<redacted>")
            .field("state_dir", &self.state_dir)
            .field("api_base", &self.api_base)
            .field("http_timeout_ms", &self.http_timeout_ms)
            .field("poll", &self.poll)
            .finish()
    }
}

impl PollBotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let (Some(bot_token), Some(group_id)) = (non_empty(BOT_TOKEN_ENV), non_empty(GROUP_ID_ENV))
        else {
            return Err(ConfigError::MissingCredentials);
        };

        let state_dir = non_empty(STATE_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let api_base =
            non_empty(API_BASE_ENV).unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE.to_string());
        let http_timeout_ms = non_empty(HTTP_TIMEOUT_MS_ENV)
            .and_then(|raw| raw.parse::<u64>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_MS);

        let mut poll = PollSettings::new(group_id);
        if let Some(prefix) = non_empty(QUESTION_PREFIX_ENV) {
            poll.question_prefix = prefix;
        }
        if let Some(raw) = non_empty(OPTIONS_ENV) {
            let options = raw
                .split(',')
                .map(str::trim)
                .filter(|option| !option.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>();
            if options.len() < 2 {
                return Err(ConfigError::TooFewOptions(options.len()));
            }
            poll.options = options;
        }
        poll.announce_results = non_empty(ANNOUNCE_RESULTS_ENV)
            .map(|raw| parse_flag(&raw))
            .unwrap_or(false);

        Ok(Self {
            bot_token,
            state_dir,
            api_base,
            http_timeout_ms,
            poll,
        })
    }

    pub fn gateway_config(&self) -> TelegramGatewayConfig {
        TelegramGatewayConfig {
            api_base: self.api_base.clone(),
            bot_token: self.bot_token.clone(),
            http_timeout_ms: self.http_timeout_ms,
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
