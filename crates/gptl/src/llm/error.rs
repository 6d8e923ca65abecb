//! LLM error types.

use thiserror::Error;

/// Errors that can occur when making LLM API calls.
#[derive(Debug, Error)]
pub enum LLMError {
    /// Request body could not be serialized
    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    /// HTTP request failed
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Response body was not the expected JSON
    #[error("failed to decode response (status {status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    /// API returned an error response
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// Compose a vendor error message as `message (detail/detail)`.
///
/// Empty or absent details are dropped; the parenthesis is omitted when none remain.
pub(crate) fn vendor_message(message: Option<String>, details: &[Option<&str>]) -> String {
    let message = message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "unknown error".to_string());
    let details: Vec<&str> = details
        .iter()
        .flatten()
        .copied()
        .filter(|d| !d.is_empty())
        .collect();

    if details.is_empty() {
        message
    } else {
        format!("{message} ({})", details.join("/"))
    }
}
