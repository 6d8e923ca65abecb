use std::path::Path;

use tokio::fs;
use tokio::io::AsyncWriteExt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Config
// ============================================================================

/// Client configuration, loaded once at startup.
///
/// Empty fields are filled from the selected provider's defaults when the
/// provider is constructed (see [`Config::with_defaults`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref()).await?;
        Ok(serde_saphyr::from_str(&contents)?)
    }

    /// Write the config as YAML, creating the parent directory if needed.
    ///
    /// On unix the file is created with mode 0600 since it holds the API key.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let yaml =
            serde_saphyr::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(path).await?;
        file.write_all(yaml.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Fill empty fields from provider defaults.
    #[must_use]
    pub fn with_defaults(mut self, defaults: &ProviderDefaults) -> Self {
        if self.endpoint.is_empty()
            && let Some(endpoint) = defaults.endpoint
        {
            self.endpoint = endpoint.to_string();
        }
        if self.model.is_empty() {
            self.model = defaults.model.to_string();
        }
        if self.max_tokens.is_none_or(|n| n == 0) {
            self.max_tokens = defaults.max_tokens;
        }
        self
    }
}

/// Fail with [`ConfigError::MissingField`] if `value` is blank.
pub fn require<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingField(field));
    }
    Ok(value)
}

// ============================================================================
// ProviderDefaults
// ============================================================================

/// Values a provider applies to empty config fields.
#[derive(Debug, Clone, Copy)]
pub struct ProviderDefaults {
    pub endpoint: Option<&'static str>,
    pub model: &'static str,
    pub max_tokens: Option<u32>,
}

// ============================================================================
// ConfigError
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(String),

    #[error("missing config field: {0}")]
    MissingField(&'static str),

    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("provider not found: {0}")]
    UnknownProvider(String),
}

// ============================================================================
// Tests
// ============================================================================
