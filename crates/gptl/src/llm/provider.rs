//! LLM provider trait and shared HTTP plumbing.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::error::LLMError;
use super::types::Message;
use crate::config::ConfigError;

/// Trait for LLM vendors with different API formats.
///
/// Implementations own endpoint construction, authentication headers, and the
/// request/response schema. Conversation handling lives in [`super::ChatSession`].
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Send the conversation and return the assistant replies in the order received.
    async fn chat(&self, messages: &[Message]) -> Result<Vec<Message>, LLMError>;
}

/// Append path segments to an endpoint URL, tolerating a trailing slash.
pub(crate) fn endpoint_url(endpoint: &str, segments: &[&str]) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };

    let mut url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| invalid("not a base URL".to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// POST a JSON body and decode the JSON response, whatever the status.
///
/// Vendors return an error object in the body on failure, so decoding happens
/// before the caller inspects the status.
pub(crate) async fn post_json<B, T>(
    builder: RequestBuilder,
    body: &B,
) -> Result<(StatusCode, T), LLMError>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let body = serde_json::to_vec(body).map_err(LLMError::Encode)?;

    let response = builder
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await?;

    let status = response.status();
    let bytes = response.bytes().await?;
    let decoded = serde_json::from_slice(&bytes).map_err(|source| LLMError::Decode {
        status: status.as_u16(),
        source,
    })?;
    Ok((status, decoded))
}
