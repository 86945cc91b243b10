//! Conversation engine for the legal-information bot.
//!
//! - `conversation` - keyword intent classifier honouring menu selections
//! - `prompts` - Tera prompt templates, including both document analyses
//! - `llm` - text-generation gateway with rate-limit backoff
//! - `session` - per-conversation state behind per-conversation locks
//! - `runtime` - [`AgentRuntime`], the transport-neutral event handlers
//!
//! The model only ever explains. Routing, state and fallbacks are decided
//! here, deterministically.

pub mod conversation;
pub mod llm;
pub mod prompts;
pub mod replies;
pub mod runtime;
pub mod session;

pub use conversation::{classify, Classification, IntentClassifier};
pub use llm::{GeminiClient, LlmClient, LlmFailure, LlmGateway, RetryPolicy};
pub use prompts::{DocumentAnalysis, PromptBuilder, PromptError};
pub use runtime::AgentRuntime;
pub use session::SessionStore;
