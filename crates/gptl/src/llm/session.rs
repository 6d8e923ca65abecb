//! Chat session: the conversation-continuation flow shared by all providers.
//!
//! Load history, append the caller's turn, ask the provider, write and append
//! every reply, then persist. History is only written after a fully successful
//! exchange, so any earlier failure leaves the stored conversation untouched.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use super::error::LLMError;
use super::provider::LLMProvider;
use super::types::{Conversation, Message};
use crate::store::{HistoryStore, StorageError, load_template};

/// `chrono` format of the default history id (one conversation per day).
pub const DEFAULT_HISTORY_FORMAT: &str = "%Y%m%d";

/// Per-invocation options for [`ChatSession::chat`].
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    /// History id; defaults to today's date.
    pub history: Option<String>,
    /// Template used to seed a conversation that has no history yet.
    pub template: Option<String>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_history(mut self, history: impl Into<String>) -> Self {
        self.history = Some(history.into());
        self
    }

    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// The explicit history id, or today's date when none (or an empty one) is given.
    pub fn history_id(&self) -> String {
        self.history
            .clone()
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| Local::now().format(DEFAULT_HISTORY_FORMAT).to_string())
    }
}

/// Errors from a single chat invocation.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to read input: {0}")]
    Input(#[source] std::io::Error),

    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),

    #[error(transparent)]
    LLM(#[from] LLMError),
}

/// A provider bound to a history store.
pub struct ChatSession {
    name: String,
    backend: Box<dyn LLMProvider>,
    history: Arc<dyn HistoryStore>,
    template_root: Option<PathBuf>,
}

impl ChatSession {
    pub fn new(
        name: impl Into<String>,
        backend: Box<dyn LLMProvider>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            name: name.into(),
            backend,
            history,
            template_root: None,
        }
    }

    /// Directory holding `{provider}/{template}.yaml` seed conversations.
    #[must_use]
    pub fn with_template_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.template_root = Some(root.into());
        self
    }

    /// Provider name, also the history subdirectory.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run one exchange: the whole of `input` is the new turn, each reply is
    /// written to `output` as one line.
    pub async fn chat<R, W>(
        &self,
        input: &mut R,
        output: &mut W,
        options: &ChatOptions,
    ) -> Result<(), ChatError>
    where
        R: AsyncRead + Unpin + ?Sized,
        W: AsyncWrite + Unpin + ?Sized,
    {
        let history_id = options.history_id();
        let mut conversation = self.history.load(&self.name, &history_id).await?;

        if conversation.is_empty()
            && let Some(template) = &options.template
        {
            conversation = self.load_template(template).await?;
        }

        let mut raw = String::new();
        input
            .read_to_string(&mut raw)
            .await
            .map_err(ChatError::Input)?;
        conversation.push(Message::from_input(&raw));

        debug!(
            provider = %self.name,
            history = %history_id,
            messages = conversation.len(),
            "Sending conversation"
        );
        let replies = self.backend.chat(&conversation).await?;

        for reply in replies {
            write_line(output, &reply.content).await?;
            conversation.push(reply);
        }
        output.flush().await.map_err(ChatError::Output)?;

        self.history
            .save(&self.name, &history_id, &conversation)
            .await?;
        Ok(())
    }

    async fn load_template(&self, template: &str) -> Result<Conversation, StorageError> {
        let Some(root) = &self.template_root else {
            return Err(StorageError::TemplateNotFound(PathBuf::from(template)));
        };
        load_template(root, &self.name, template).await
    }
}

async fn write_line<W>(output: &mut W, line: &str) -> Result<(), ChatError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    output
        .write_all(line.as_bytes())
        .await
        .map_err(ChatError::Output)?;
    output.write_all(b"\n").await.map_err(ChatError::Output)
}
