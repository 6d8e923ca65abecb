//! Claude provider using the native Anthropic Messages API.
//!
//! The request body is `{model, messages, max_tokens}`. The Messages API has no
//! `system` role, so system turns are joined into a top-level `system` field
//! instead of being sent inside `messages`; that field is absent otherwise.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

use super::error::{LLMError, vendor_message};
use super::provider::{LLMProvider, endpoint_url, post_json};
use super::registry::ProviderRegistry;
use super::types::{Message, Role};
use crate::config::{Config, ConfigError, ProviderDefaults, require};

pub const NAME: &str = "claude";

pub const DEFAULTS: ProviderDefaults = ProviderDefaults {
    endpoint: Some("https://api.anthropic.com/v1"),
    model: "claude-3-5-sonnet-20240620",
    max_tokens: Some(1024),
};

pub fn register(registry: &mut ProviderRegistry) {
    registry.register(NAME, create);
}

fn create(config: Config, client: Client) -> Result<Box<dyn LLMProvider>, ConfigError> {
    let config = config.with_defaults(&DEFAULTS);
    let url = endpoint_url(require("endpoint", &config.endpoint)?, &["messages"])?;
    let api_key = require("api_key", &config.api_key)?.to_string();

    Ok(Box::new(AnthropicProvider {
        client,
        url,
        api_key,
        api_version: AnthropicProvider::DEFAULT_API_VERSION.to_string(),
        model: config.model,
        // Set by `with_defaults`.
        max_tokens: config.max_tokens.unwrap_or_default(),
    }))
}

/// Anthropic provider with native API format.
pub struct AnthropicProvider {
    client: Client,
    url: Url,
    api_key: String,
    api_version: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicProvider {
    pub const DEFAULT_API_VERSION: &'static str = "2023-06-01";
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    async fn chat(&self, messages: &[Message]) -> Result<Vec<Message>, LLMError> {
        debug!(url = %self.url, model = %self.model, "Sending messages request");

        let builder = self
            .client
            .post(self.url.clone())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version);

        let request = to_request(&self.model, self.max_tokens, messages);
        let (status, response): (_, Response) = post_json(builder, &request).await?;

        if status != StatusCode::OK {
            let error = response.error.unwrap_or_default();
            return Err(LLMError::Api {
                status: status.as_u16(),
                message: vendor_message(error.message, &[error.error_type.as_deref()]),
            });
        }

        Ok(from_response(response))
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(serde::Serialize)]
struct Request<'a> {
    model: &'a str,
    messages: Vec<&'a Message>,
    max_tokens: u32,
    /// Omitted unless the conversation carries system messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Default, serde::Deserialize)]
#[serde(default)]
struct Response {
    role: Option<Role>,
    content: Vec<ResponseContent>,
    error: Option<ApiError>,
}

#[derive(serde::Deserialize)]
struct ResponseContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Default, serde::Deserialize)]
#[serde(default)]
struct ApiError {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: Option<String>,
}

// ============================================================================
// Conversions
// ============================================================================

/// The Messages API only accepts user/assistant turns; system text moves to
/// the top-level `system` field.
fn to_request<'a>(model: &'a str, max_tokens: u32, messages: &'a [Message]) -> Request<'a> {
    let mut system = Vec::new();
    let mut turns = Vec::with_capacity(messages.len());

    for msg in messages {
        match msg.role {
            Role::System => system.push(msg.content.as_str()),
            _ => turns.push(msg),
        }
    }

    Request {
        model,
        messages: turns,
        max_tokens,
        system: (!system.is_empty()).then(|| system.join("\n\n")),
    }
}

/// Each text block becomes its own message, in response order.
fn from_response(response: Response) -> Vec<Message> {
    let role = response.role.unwrap_or(Role::Assistant);
    response
        .content
        .into_iter()
        .filter(|c| c.content_type == "text")
        .map(|c| Message::new(role.clone(), c.text.unwrap_or_default()))
        .collect()
}
