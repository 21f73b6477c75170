//! Model Router: sends fallback conversations to the Anthropic Messages API.

use reqwest::Client;
use serde::Deserialize;
use support_core::{CompletionRequest, LlmError, LlmProvider, DEFAULT_API_URL};

const PROVIDER_NAME: &str = "anthropic";
pub const ENV_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages API client.
pub struct ModelRouter {
    client: Client,
    api_key: String,
    api_url: String,
}

impl ModelRouter {
    pub fn new(api_key: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey(ENV_API_KEY.to_string()));
        }
        Ok(Self {
            client: Client::new(),
            api_key,
            api_url: DEFAULT_API_URL.to_string(),
        })
    }

    /// Reads the key from `ANTHROPIC_API_KEY`; missing or empty is an error.
    pub fn from_env() -> Result<Self, LlmError> {
        let api_key = std::env::var(ENV_API_KEY)
            .map_err(|_| LlmError::MissingApiKey(ENV_API_KEY.to_string()))?;
        Self::new(api_key)
    }

    pub fn with_base_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait::async_trait]
impl LlmProvider for ModelRouter {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(target: "support::agent", status = status.as_u16(), "Messages API returned an error");
            return Err(LlmError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;
        first_text_block(&body)
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

/// Extracts the first text block from a Messages API response body.
fn first_text_block(body: &str) -> Result<String, LlmError> {
    let parsed: MessagesResponse =
        serde_json::from_str(body).map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
    parsed
        .content
        .into_iter()
        .find_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other => None,
        })
        .ok_or_else(|| LlmError::InvalidResponse("no text content in response".to_string()))
}
