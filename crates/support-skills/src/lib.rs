//! LLM providers plugged into the support agent's fallback path.

pub use support_core::LlmProvider;

mod model_router;

pub use model_router::{ModelRouter, ANTHROPIC_VERSION, ENV_API_KEY};
