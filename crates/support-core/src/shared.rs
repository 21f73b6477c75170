//! Shared types used across all support crates.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default Anthropic model used for the fallback path.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

/// Default cap on fallback response length (tokens).
pub const DEFAULT_MAX_TOKENS: u32 = 512;

/// Default Messages API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Speaker of a single conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One prior turn of dialogue, passed through unmodified to the fallback path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Global application configuration (gateway + fallback model). Load from TOML or env.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Title shown by the chat widget and status endpoint.
    pub app_name: String,
    /// HTTP port for the gateway.
    pub port: u16,
    /// Model identifier sent to the provider on fallback.
    pub model: String,
    /// Maximum output tokens requested on fallback.
    pub max_tokens: u32,
    /// Messages API endpoint.
    pub api_url: String,
    /// Optional JSON file replacing the built-in knowledge base.
    #[serde(default)]
    pub knowledge_base_path: Option<String>,
    /// If true, the gateway serves the chat widget at `/`.
    #[serde(default)]
    pub frontend_enabled: bool,
    /// When true, provider errors during fallback turn into the static message instead of an error.
    pub degrade_on_provider_error: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            app_name: "Thoughtful AI Support".to_string(),
            port: 8001,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            api_url: DEFAULT_API_URL.to_string(),
            knowledge_base_path: None,
            frontend_enabled: true,
            degrade_on_provider_error: true,
        }
    }
}

impl CoreConfig {
    /// Load config from file and environment. Precedence: env `SUPPORT__*` > `SUPPORT_CONFIG` path
    /// (default `config/gateway.toml`) > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("SUPPORT_CONFIG").unwrap_or_else(|_| "config/gateway.toml".to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Same as [`CoreConfig::load`] with an explicit file path. A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        let builder = config::Config::builder()
            .set_default("app_name", defaults.app_name)?
            .set_default("port", defaults.port as i64)?
            .set_default("model", defaults.model)?
            .set_default("max_tokens", defaults.max_tokens as i64)?
            .set_default("api_url", defaults.api_url)?
            .set_default("frontend_enabled", defaults.frontend_enabled)?
            .set_default("degrade_on_provider_error", defaults.degrade_on_provider_error)?;

        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("SUPPORT").separator("__"))
            .build()?;

        built.try_deserialize()
    }
}
