use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::hooks::activity::ActivityPatterns;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Groq,
    Openrouter,
    Ollama,
    Openai,
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::Groq => write!(f, "groq"),
            LlmProvider::Openrouter => write!(f, "openrouter"),
            LlmProvider::Ollama => write!(f, "ollama"),
            LlmProvider::Openai => write!(f, "openai"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Persona text sent as the system turn.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: default_model(),
            base_url: String::new(),
            api_key: String::new(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            system_prompt: default_system_prompt(),
        }
    }
}

impl LlmConfig {
    /// Returns the effective base_url: if the stored value is empty,
    /// fall back to the canonical URL for the configured provider.
    pub fn effective_base_url(&self) -> &str {
        if !self.base_url.is_empty() {
            return &self.base_url;
        }
        match self.provider {
            LlmProvider::Groq => "https://api.groq.com/openai/v1",
            LlmProvider::Openrouter => "https://openrouter.ai/api/v1",
            LlmProvider::Ollama => "http://localhost:11434/v1",
            LlmProvider::Openai => "https://api.openai.com/v1",
        }
    }

    pub fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.effective_base_url().trim_end_matches('/')
        )
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DiscordConfig {
    /// Sent verbatim as the Authorization header. Bot tokens need the "Bot " prefix.
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub channel_id: String,
    /// Author id of the account we post as; its messages are never answered.
    #[serde(default)]
    pub bot_user_id: String,
    #[serde(default)]
    pub ignore_user_ids: Vec<String>,
    #[serde(default = "default_discord_api_base_url")]
    pub api_base_url: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            channel_id: String::new(),
            bot_user_id: String::new(),
            ignore_user_ids: Vec::new(),
            api_base_url: default_discord_api_base_url(),
        }
    }
}

/// Loop pacing. All durations are in (fractional) seconds.
#[derive(Debug, Deserialize, Clone)]
pub struct ResponderConfig {
    #[serde(default = "default_max_messages")]
    pub max_messages: u32,
    #[serde(default = "default_message_cooldown")]
    pub message_cooldown_secs: f64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: f64,
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_secs: f64,
    #[serde(default = "default_error_backoff")]
    pub error_backoff_secs: f64,
    /// 0 disables the long pause after repeated failures.
    #[serde(default)]
    pub max_consecutive_failures: u32,
    #[serde(default = "default_failure_pause")]
    pub failure_pause_secs: f64,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            message_cooldown_secs: default_message_cooldown(),
            poll_interval_secs: default_poll_interval(),
            retry_backoff_secs: default_retry_backoff(),
            error_backoff_secs: default_error_backoff(),
            max_consecutive_failures: 0,
            failure_pause_secs: default_failure_pause(),
        }
    }
}

impl ResponderConfig {
    pub fn message_cooldown(&self) -> Duration {
        secs(self.message_cooldown_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        secs(self.poll_interval_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        secs(self.retry_backoff_secs)
    }

    pub fn error_backoff(&self) -> Duration {
        secs(self.error_backoff_secs)
    }

    pub fn failure_pause(&self) -> Duration {
        secs(self.failure_pause_secs)
    }
}

/// Optional behaviours layered on top of the core loop. Everything is off by default.
#[derive(Debug, Deserialize, Clone)]
pub struct ExtensionsConfig {
    /// Only answer inside these local-time windows.
    #[serde(default)]
    pub activity: Option<ActivityPatterns>,
    #[serde(default = "default_response_probability")]
    pub response_probability: f64,
    /// Messages starting with this prefix are treated as commands and not answered.
    #[serde(default)]
    pub command_prefix: Option<String>,
    #[serde(default)]
    pub id_cache_capacity: Option<usize>,
    #[serde(default)]
    pub sensitive_words: Vec<String>,
    #[serde(default)]
    pub typing_simulation: bool,
}

impl Default for ExtensionsConfig {
    fn default() -> Self {
        Self {
            activity: None,
            response_probability: default_response_probability(),
            command_prefix: None,
            id_cache_capacity: None,
            sensitive_words: Vec::new(),
            typing_simulation: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub responder: ResponderConfig,
    #[serde(default)]
    pub extensions: ExtensionsConfig,
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}

fn default_model() -> String {
    "meta-llama/llama-4-scout-17b-16e-instruct".to_string()
}

fn default_temperature() -> f32 {
    0.9
}

fn default_max_tokens() -> u32 {
    150
}

fn default_system_prompt() -> String {
    "You are a friendly, casual Discord chat participant. Be yourself and chat naturally, \
     as if you're just another person in the server.\n\n\
     Style guide:\n\
     - Be conversational and relaxed\n\
     - Use natural language patterns\n\
     - Feel free to use common Discord expressions and casual language\n\
     - Vary your response length based on context\n\
     - React to emotions and context appropriately\n\
     - Don't be afraid to show personality\n\
     - Occasionally use emojis, but don't overdo it\n\
     - Sometimes use lowercase for entire messages to seem casual\n\n\
     Remember: Just be a natural part of the conversation, like any other Discord user would be."
        .to_string()
}

fn default_discord_api_base_url() -> String {
    "https://discord.com/api/v9".to_string()
}

fn default_max_messages() -> u32 {
    20
}

fn default_message_cooldown() -> f64 {
    31.0
}

fn default_poll_interval() -> f64 {
    1.0
}

fn default_retry_backoff() -> f64 {
    5.0
}

fn default_error_backoff() -> f64 {
    5.0
}

fn default_failure_pause() -> f64 {
    60.0
}

fn default_response_probability() -> f64 {
    1.0
}

/// Splits a comma-separated id list, dropping blanks.
pub fn parse_id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    /// Load `path` if it exists, then apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            info!(
                "No config file at {}, using environment only",
                path.display()
            );
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid TOML configuration")
    }

    /// Environment variables win over the file. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("DISCORD_TOKEN") {
            self.discord.token = token;
        }
        if let Some(key) = get("GROQ_API_KEY").or_else(|| get("LLM_API_KEY")) {
            self.llm.api_key = key;
        }
        if let Some(channel) = get("CHANNEL_ID") {
            self.discord.channel_id = channel;
        }
        if let Some(id) = get("BOT_USER_ID") {
            self.discord.bot_user_id = id;
        }
        if let Some(ids) = get("IGNORE_USER_IDS") {
            self.discord.ignore_user_ids = parse_id_list(&ids);
        }
    }

    pub fn validate(&self) -> Result<()> {
        let required = [
            ("discord.token (DISCORD_TOKEN)", &self.discord.token),
            ("llm.api_key (GROQ_API_KEY)", &self.llm.api_key),
            ("discord.channel_id (CHANNEL_ID)", &self.discord.channel_id),
            ("discord.bot_user_id (BOT_USER_ID)", &self.discord.bot_user_id),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            anyhow::bail!(
                "Missing required configuration: {}",
                missing.join(", ")
            );
        }

        let r = &self.responder;
        let durations = [
            ("message_cooldown_secs", r.message_cooldown_secs),
            ("poll_interval_secs", r.poll_interval_secs),
            ("retry_backoff_secs", r.retry_backoff_secs),
            ("error_backoff_secs", r.error_backoff_secs),
            ("failure_pause_secs", r.failure_pause_secs),
        ];
        for (name, value) in durations {
            if !value.is_finite() || value < 0.0 {
                anyhow::bail!("responder.{} must be a non-negative number, got {}", name, value);
            }
        }
        if r.max_messages == 0 || r.max_messages > 100 {
            anyhow::bail!(
                "responder.max_messages must be between 1 and 100, got {}",
                r.max_messages
            );
        }

        let p = self.extensions.response_probability;
        if !(0.0..=1.0).contains(&p) {
            anyhow::bail!("extensions.response_probability must be within 0.0..=1.0, got {}", p);
        }
        if let Some(activity) = &self.extensions.activity {
            activity.validate()?;
        }

        Ok(())
    }
}
