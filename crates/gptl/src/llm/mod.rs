//! LLM providers and the chat session built on them.

pub mod anthropic;
pub mod azure;
mod error;
pub mod openai;
mod provider;
mod registry;
mod session;
mod types;

pub use anthropic::AnthropicProvider;
pub use azure::AzureOpenAIProvider;
pub use error::LLMError;
pub use openai::OpenAIProvider;
pub use provider::LLMProvider;
pub use registry::{ProviderFactory, ProviderRegistry};
pub use session::{ChatError, ChatOptions, ChatSession, DEFAULT_HISTORY_FORMAT};
pub use types::{Conversation, Message, Role};
