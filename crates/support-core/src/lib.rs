//! support-core: knowledge base, TF-IDF matching, and the support agent.
//!
//! The gateway and provider crates depend only on this public API.

mod agent;
mod error;
mod knowledge;
mod shared;

pub use shared::{
    ChatRole, ConversationTurn, CoreConfig, DEFAULT_API_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
};

pub use error::{KnowledgeError, LlmError, SupportError};

pub use knowledge::{
    is_stop_word, KnowledgeBase, KnowledgeEntry, SimilarityIndex, SUGGESTED_PROMPTS,
};

pub use agent::{
    meets_threshold, ClientState, CompletionRequest, FallbackSettings, LlmProvider,
    ProviderFactory, Reply, ReplySource, SupportAgent, EMPTY_INPUT_MESSAGE,
    SIMILARITY_THRESHOLD, STATIC_FALLBACK_MESSAGE, SYSTEM_PROMPT,
};
