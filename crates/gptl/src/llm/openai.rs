//! OpenAI chat completions provider.
//!
//! The request/response exchange is shared with the Azure OpenAI provider,
//! which differs only in URL shape and auth header.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::{debug, warn};
use url::Url;

use super::error::{LLMError, vendor_message};
use super::provider::{LLMProvider, endpoint_url, post_json};
use super::registry::ProviderRegistry;
use super::types::{Message, Role};
use crate::config::{Config, ConfigError, ProviderDefaults, require};

pub const NAME: &str = "openai";

pub const DEFAULTS: ProviderDefaults = ProviderDefaults {
    endpoint: Some("https://api.openai.com/v1"),
    model: "gpt-4o-mini",
    max_tokens: None,
};

pub fn register(registry: &mut ProviderRegistry) {
    registry.register(NAME, create);
}

fn create(config: Config, client: Client) -> Result<Box<dyn LLMProvider>, ConfigError> {
    let config = config.with_defaults(&DEFAULTS);
    let url = endpoint_url(
        require("endpoint", &config.endpoint)?,
        &["chat", "completions"],
    )?;
    let api_key = require("api_key", &config.api_key)?.to_string();

    Ok(Box::new(OpenAIProvider {
        client,
        url,
        api_key,
        model: config.model,
    }))
}

/// OpenAI provider, authenticated with a bearer token.
pub struct OpenAIProvider {
    client: Client,
    url: Url,
    api_key: String,
    model: String,
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn chat(&self, messages: &[Message]) -> Result<Vec<Message>, LLMError> {
        debug!(url = %self.url, model = %self.model, "Sending chat completion request");

        let builder = self
            .client
            .post(self.url.clone())
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key));

        exchange(builder, &self.model, messages).await
    }
}

/// Send an OpenAI-schema chat completion and collect every choice's message.
pub(crate) async fn exchange(
    builder: RequestBuilder,
    model: &str,
    messages: &[Message],
) -> Result<Vec<Message>, LLMError> {
    let request = Request { model, messages };
    let (status, response): (_, Response) = post_json(builder, &request).await?;

    if status != StatusCode::OK {
        let error = response.error.unwrap_or_default();
        let code = error.code.as_ref().and_then(code_str);
        return Err(LLMError::Api {
            status: status.as_u16(),
            message: vendor_message(
                error.message,
                &[code.as_deref(), error.error_type.as_deref()],
            ),
        });
    }

    if response.choices.is_empty() {
        warn!("Chat completion returned no choices");
    }

    Ok(response
        .choices
        .into_iter()
        .map(|choice| Message {
            role: choice.message.role,
            content: choice.message.content.unwrap_or_default(),
        })
        .collect())
}

/// Error codes are usually strings but some deployments send numbers.
fn code_str(code: &serde_json::Value) -> Option<String> {
    match code {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(serde::Serialize)]
struct Request<'a> {
    model: &'a str,
    messages: &'a [Message],
}

#[derive(Default, serde::Deserialize)]
#[serde(default)]
struct Response {
    choices: Vec<Choice>,
    error: Option<ApiError>,
}

#[derive(serde::Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(serde::Deserialize)]
struct ChoiceMessage {
    #[serde(default = "assistant_role")]
    role: Role,
    #[serde(default)]
    content: Option<String>,
}

fn assistant_role() -> Role {
    Role::Assistant
}

#[derive(Default, serde::Deserialize)]
#[serde(default)]
struct ApiError {
    message: Option<String>,
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<serde_json::Value>,
}
