//! Error types for the support responder.

use thiserror::Error;

/// Errors raised by an [`LlmProvider`](crate::LlmProvider) while constructing a client or completing a request.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("missing API key: set {0}")]
    MissingApiKey(String),

    #[error("provider request failed with status {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors raised while loading a knowledge base.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("knowledge base must contain at least one entry")]
    Empty,

    #[error("knowledge base entry {index} has a blank answer")]
    BlankAnswer { index: usize },

    #[error("failed to read knowledge base {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse knowledge base {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors surfaced by [`SupportAgent`](crate::SupportAgent) to its caller.
#[derive(Debug, Error)]
pub enum SupportError {
    /// Only returned when provider errors are configured to propagate.
    #[error("fallback provider failed: {0}")]
    Provider(#[from] LlmError),
}
