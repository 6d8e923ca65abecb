//! Provider registry mapping provider names to factories.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;
use tracing::{debug, info};

use super::provider::LLMProvider;
use super::session::ChatSession;
use super::{anthropic, azure, openai};
use crate::config::{Config, ConfigError};
use crate::store::HistoryStore;

/// Builds a provider from config, applying the provider's defaults.
pub type ProviderFactory = fn(Config, Client) -> Result<Box<dyn LLMProvider>, ConfigError>;

/// Registry of provider factories, keyed by provider name.
///
/// Constructed explicitly at startup; each provider module contributes its
/// factory through its own `register` function.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    factories: HashMap<String, ProviderFactory>,
    client: Client,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose providers share `client`.
    pub fn with_client(client: Client) -> Self {
        Self {
            factories: HashMap::new(),
            client,
        }
    }

    /// Registry with the OpenAI, Azure OpenAI, and Claude providers, all
    /// sharing one HTTP client.
    pub fn with_builtin() -> Self {
        let mut registry = Self::with_client(Client::new());
        registry.register_builtin();
        registry
    }

    pub fn register_builtin(&mut self) {
        openai::register(self);
        azure::register(self);
        anthropic::register(self);
    }

    /// Register a factory, replacing any previous one with the same name.
    pub fn register(&mut self, name: impl Into<String>, factory: ProviderFactory) {
        let name = name.into();
        debug!(provider = %name, "Registered provider factory");
        self.factories.insert(name, factory);
    }

    /// Registered provider names in lexicographic order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Construct the provider named by `config.provider`.
    pub fn create(
        &self,
        config: Config,
        history: Arc<dyn HistoryStore>,
    ) -> Result<ChatSession, ConfigError> {
        let Some(factory) = self.factories.get(&config.provider) else {
            return Err(ConfigError::UnknownProvider(config.provider));
        };

        let name = config.provider.clone();
        let backend = factory(config, self.client.clone())?;
        info!(provider = %name, "Created provider");
        Ok(ChatSession::new(name, backend, history))
    }
}
