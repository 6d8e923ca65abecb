//! Conversation persistence.
//!
//! A conversation is addressed by `(provider, history_id)`. Loading a key that
//! was never written yields an empty conversation; saving rewrites the whole
//! document.

use async_trait::async_trait;

use crate::llm::Conversation;

mod error;
mod file;

pub use error::{StorageError, StorageResult};
pub use file::{FileHistoryStore, load_template};

/// Storage for per-provider conversation histories.
///
/// No locking: concurrent writers to the same key race and the last rename wins.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Load a conversation. A missing history is an empty conversation, not an error.
    async fn load(&self, provider: &str, history_id: &str) -> StorageResult<Conversation>;

    /// Replace a conversation with `conversation`.
    async fn save(
        &self,
        provider: &str,
        history_id: &str,
        conversation: &Conversation,
    ) -> StorageResult<()>;
}

/// Check that `key` is usable as a single file-name component.
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    let invalid = key.is_empty()
        || key == "."
        || key == ".."
        || key.contains(['/', '\\'])
        || key.contains('\0');
    if invalid {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}
