//! Azure OpenAI provider.
//!
//! Same chat completion schema as OpenAI, but the deployment (model) is part of
//! the URL, the API version is a query parameter, and auth uses `api-key`.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::error::LLMError;
use super::openai;
use super::provider::{LLMProvider, endpoint_url};
use super::registry::ProviderRegistry;
use super::types::Message;
use crate::config::{Config, ConfigError, ProviderDefaults, require};

pub const NAME: &str = "azure-openai";

pub const API_VERSION: &str = "2023-05-15";

/// No default endpoint: every Azure resource has its own host.
pub const DEFAULTS: ProviderDefaults = ProviderDefaults {
    endpoint: None,
    model: "gpt-4o-mini",
    max_tokens: None,
};

pub fn register(registry: &mut ProviderRegistry) {
    registry.register(NAME, create);
}

fn create(config: Config, client: Client) -> Result<Box<dyn LLMProvider>, ConfigError> {
    let config = config.with_defaults(&DEFAULTS);
    let url = deployment_url(require("endpoint", &config.endpoint)?, &config.model)?;
    let api_key = require("api_key", &config.api_key)?.to_string();

    Ok(Box::new(AzureOpenAIProvider {
        client,
        url,
        api_key,
        model: config.model,
    }))
}

fn deployment_url(endpoint: &str, deployment: &str) -> Result<Url, ConfigError> {
    let mut url = endpoint_url(
        endpoint,
        &["openai", "deployments", deployment, "chat", "completions"],
    )?;
    url.query_pairs_mut().append_pair("api-version", API_VERSION);
    Ok(url)
}

/// Azure OpenAI provider, authenticated with an `api-key` header.
pub struct AzureOpenAIProvider {
    client: Client,
    url: Url,
    api_key: String,
    model: String,
}

#[async_trait]
impl LLMProvider for AzureOpenAIProvider {
    async fn chat(&self, messages: &[Message]) -> Result<Vec<Message>, LLMError> {
        debug!(url = %self.url, model = %self.model, "Sending Azure chat completion request");

        let builder = self
            .client
            .post(self.url.clone())
            .header("api-key", &self.api_key);

        openai::exchange(builder, &self.model, messages).await
    }
}
