//! Support agent: knowledge base lookup with an LLM fallback.

use crate::error::{LlmError, SupportError};
use crate::knowledge::{KnowledgeBase, SimilarityIndex};
use crate::shared::{ConversationTurn, CoreConfig, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

/// Minimum cosine similarity for a knowledge base answer. Not configurable.
pub const SIMILARITY_THRESHOLD: f64 = 0.35;

/// Returned for empty or whitespace-only input.
pub const EMPTY_INPUT_MESSAGE: &str = "Please enter a question and I'll do my best to help.";

/// Returned when no LLM client is available.
pub const STATIC_FALLBACK_MESSAGE: &str = "I don't have specific information about that in my knowledge base. \
I can help with questions about Thoughtful AI's agents like EVA \
(Eligibility Verification), CAM (Claims Processing), and PHIL \
(Payment Posting). What would you like to know?";

/// System prompt sent with every fallback request.
pub const SYSTEM_PROMPT: &str = "You are a helpful customer support agent for Thoughtful AI, a company \
that builds AI-powered automation agents for healthcare revenue cycle \
management. Their main products are EVA (Eligibility Verification), \
CAM (Claims Processing), and PHIL (Payment Posting). Be concise and helpful.";

pub fn meets_threshold(score: f64) -> bool {
    score >= SIMILARITY_THRESHOLD
}

/// A single fallback request handed to an [`LlmProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub max_tokens: u32,
    pub system: String,
    pub messages: Vec<ConversationTurn>,
}

/// Trait implemented by external text-generation backends.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logs and status.
    fn name(&self) -> &str;

    /// Sends `request` and returns the first text block of the reply.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

/// Result of the one-time client construction.
#[derive(Clone)]
pub enum ClientState {
    Live(Arc<dyn LlmProvider>),
    Unavailable(String),
}

impl std::fmt::Debug for ClientState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientState::Live(p) => f.debug_tuple("Live").field(&p.name()).finish(),
            ClientState::Unavailable(reason) => f.debug_tuple("Unavailable").field(reason).finish(),
        }
    }
}

/// Builds the provider on first use.
pub type ProviderFactory = Box<dyn Fn() -> Result<Arc<dyn LlmProvider>, LlmError> + Send + Sync>;

/// Parameters for the fallback path.
#[derive(Debug, Clone)]
pub struct FallbackSettings {
    pub model: String,
    pub max_tokens: u32,
    pub system_prompt: String,
    /// When true, provider errors yield [`STATIC_FALLBACK_MESSAGE`] instead of an error.
    pub degrade_on_provider_error: bool,
}

impl FallbackSettings {
    pub fn from_config(config: &CoreConfig) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            system_prompt: SYSTEM_PROMPT.to_string(),
            degrade_on_provider_error: config.degrade_on_provider_error,
        }
    }
}

impl Default for FallbackSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: SYSTEM_PROMPT.to_string(),
            degrade_on_provider_error: true,
        }
    }
}

/// Where a reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    /// Empty input; the user was prompted for a question.
    Prompt,
    KnowledgeBase,
    Llm,
    StaticFallback,
}

/// Reply text plus routing details.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
    /// Best similarity score, absent for empty input.
    pub score: Option<f64>,
}

/// Answers support questions from a fixed knowledge base, falling back to an LLM.
pub struct SupportAgent {
    knowledge: KnowledgeBase,
    index: SimilarityIndex,
    settings: FallbackSettings,
    factory: ProviderFactory,
    client: OnceLock<ClientState>,
}

impl SupportAgent {
    pub fn new(knowledge: KnowledgeBase, settings: FallbackSettings, factory: ProviderFactory) -> Self {
        let index = SimilarityIndex::fit(knowledge.questions());
        tracing::debug!(
            target: "support::agent",
            entries = knowledge.len(),
            vocabulary = index.vocabulary_size(),
            "Similarity index fitted"
        );
        Self {
            knowledge,
            index,
            settings,
            factory,
            client: OnceLock::new(),
        }
    }

    /// Agent with no LLM client; every fallback returns the static message.
    pub fn offline(knowledge: KnowledgeBase) -> Self {
        Self::new(
            knowledge,
            FallbackSettings::default(),
            Box::new(|| Err(LlmError::MissingApiKey("ANTHROPIC_API_KEY".to_string()))),
        )
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn settings(&self) -> &FallbackSettings {
        &self.settings
    }

    /// Best knowledge base answer for `input`, or `None` with the sub-threshold score.
    pub fn find_best_match(&self, input: &str) -> (Option<&str>, f64) {
        let Some((idx, score)) = self.index.best(input) else {
            return (None, 0.0);
        };
        tracing::debug!(target: "support::agent", idx, score, "Best knowledge base match");
        if meets_threshold(score) {
            (self.knowledge.answer(idx), score)
        } else {
            (None, score)
        }
    }

    /// Initializes the client now instead of on the first fallback.
    pub fn warm_up(&self) -> &ClientState {
        self.client_state()
    }

    /// True once the client has been built successfully.
    pub fn client_live(&self) -> bool {
        matches!(self.client.get(), Some(ClientState::Live(_)))
    }

    fn client_state(&self) -> &ClientState {
        self.client.get_or_init(|| match (self.factory)() {
            Ok(provider) => {
                tracing::info!(target: "support::agent", provider = provider.name(), "LLM client ready");
                ClientState::Live(provider)
            }
            Err(e) => {
                tracing::warn!(target: "support::agent", error = %e, "LLM client unavailable; using static fallback");
                ClientState::Unavailable(e.to_string())
            }
        })
    }

    /// Free-form answer from the LLM, or the static message when no client exists.
    pub async fn llm_fallback(
        &self,
        input: &str,
        history: &[ConversationTurn],
    ) -> Result<String, SupportError> {
        Ok(self.fallback_reply(input, history).await?.0)
    }

    async fn fallback_reply(
        &self,
        input: &str,
        history: &[ConversationTurn],
    ) -> Result<(String, ReplySource), SupportError> {
        let provider = match self.client_state() {
            ClientState::Live(p) => Arc::clone(p),
            ClientState::Unavailable(_) => {
                return Ok((STATIC_FALLBACK_MESSAGE.to_string(), ReplySource::StaticFallback))
            }
        };

        let mut messages = history.to_vec();
        messages.push(ConversationTurn::user(input));
        let request = CompletionRequest {
            model: self.settings.model.clone(),
            max_tokens: self.settings.max_tokens,
            system: self.settings.system_prompt.clone(),
            messages,
        };

        tracing::info!(
            target: "support::agent",
            turns = request.messages.len(),
            model = %request.model,
            "Routing to LLM fallback"
        );
        match provider.complete(&request).await {
            Ok(text) => Ok((text, ReplySource::Llm)),
            Err(e) if self.settings.degrade_on_provider_error => {
                tracing::warn!(target: "support::agent", error = %e, "LLM request failed; using static fallback");
                Ok((STATIC_FALLBACK_MESSAGE.to_string(), ReplySource::StaticFallback))
            }
            Err(e) => Err(SupportError::Provider(e)),
        }
    }

    /// Reply text for `input` given prior `history`.
    pub async fn respond(
        &self,
        input: &str,
        history: &[ConversationTurn],
    ) -> Result<String, SupportError> {
        Ok(self.respond_detailed(input, history).await?.text)
    }

    /// Like [`SupportAgent::respond`], also reporting source and score.
    pub async fn respond_detailed(
        &self,
        input: &str,
        history: &[ConversationTurn],
    ) -> Result<Reply, SupportError> {
        if input.trim().is_empty() {
            return Ok(Reply {
                text: EMPTY_INPUT_MESSAGE.to_string(),
                source: ReplySource::Prompt,
                score: None,
            });
        }

        let (answer, score) = self.find_best_match(input);
        if let Some(answer) = answer {
            return Ok(Reply {
                text: answer.to_string(),
                source: ReplySource::KnowledgeBase,
                score: Some(score),
            });
        }

        let (text, source) = self.fallback_reply(input, history).await?;
        Ok(Reply {
            text,
            source,
            score: Some(score),
        })
    }
}
