//! File-based history storage.
//!
//! Layout: `{root}/{provider}/{history_id}.yaml`, each file a YAML sequence of
//! `{role, content}` mappings. Writes go through a temp file + rename so a
//! crash never leaves a truncated history behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::error::{StorageError, StorageResult};
use super::{HistoryStore, validate_key};
use crate::llm::Conversation;

const FILE_EXTENSION: &str = "yaml";

/// Conversation histories stored as YAML files under a root directory.
#[derive(Debug, Clone)]
pub struct FileHistoryStore {
    root: PathBuf,
}

impl FileHistoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the file backing `(provider, history_id)`.
    pub fn path_for(&self, provider: &str, history_id: &str) -> StorageResult<PathBuf> {
        document_path(&self.root, provider, history_id)
    }
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
    async fn load(&self, provider: &str, history_id: &str) -> StorageResult<Conversation> {
        let path = self.path_for(provider, history_id)?;
        debug!(path = %path.display(), "Loading history");
        Ok(read_conversation(&path).await?.unwrap_or_default())
    }

    async fn save(
        &self,
        provider: &str,
        history_id: &str,
        conversation: &Conversation,
    ) -> StorageResult<()> {
        let path = self.path_for(provider, history_id)?;
        if let Some(dir) = path.parent() {
            // create_dir_all already tolerates an existing directory.
            fs::create_dir_all(dir)
                .await
                .map_err(|e| StorageError::file_io(dir, e))?;
        }

        let encoded = encode_conversation(conversation)?;
        atomic_write_file(&path, encoded.as_bytes()).await?;

        info!(
            path = %path.display(),
            messages = conversation.len(),
            "Saved history"
        );
        Ok(())
    }
}

/// Load a seed conversation from `{root}/{provider}/{name}.yaml`.
///
/// Unlike history, a missing template is an error: the caller asked for it by name.
pub async fn load_template(root: &Path, provider: &str, name: &str) -> StorageResult<Conversation> {
    let path = document_path(root, provider, name)?;
    debug!(path = %path.display(), "Loading template");
    read_conversation(&path)
        .await?
        .ok_or(StorageError::TemplateNotFound(path))
}

fn document_path(root: &Path, provider: &str, name: &str) -> StorageResult<PathBuf> {
    validate_key(provider)?;
    validate_key(name)?;
    Ok(root
        .join(provider)
        .join(format!("{name}.{FILE_EXTENSION}")))
}

/// Render a conversation for disk.
///
/// Block YAML drops trailing whitespace from plain scalars, so the output is
/// parsed back and checked. When it does not reproduce the conversation, the
/// file is written as JSON instead, which any YAML reader also accepts.
fn encode_conversation(conversation: &Conversation) -> StorageResult<String> {
    let yaml = serde_saphyr::to_string(conversation)
        .map_err(|e| StorageError::Serialize(e.to_string()))?;
    let reparsed: Option<Conversation> = serde_saphyr::from_str(&yaml).ok();
    if reparsed.as_ref() == Some(conversation) {
        return Ok(yaml);
    }

    debug!("History does not survive block YAML, writing JSON form");
    let mut json = serde_json::to_string_pretty(conversation)
        .map_err(|e| StorageError::Serialize(e.to_string()))?;
    json.push('\n');
    Ok(json)
}

/// Read and parse a conversation file. `None` if the file does not exist.
async fn read_conversation(path: &Path) -> StorageResult<Option<Conversation>> {
    let contents = match fs::read_to_string(path).await {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StorageError::file_io(path, e)),
    };

    if contents.trim().is_empty() {
        return Ok(Some(Conversation::new()));
    }

    serde_saphyr::from_str(&contents)
        .map(Some)
        .map_err(|e| StorageError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Write data to a temp file, fsync it, then atomically rename to the final path.
///
/// The temp file name carries a ULID so concurrent writers never share one.
async fn atomic_write_file(final_path: &Path, data: &[u8]) -> StorageResult<()> {
    let file_name = final_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("history");
    let temp_path = final_path.with_file_name(format!(".{}.{}.tmp", file_name, ulid::Ulid::new()));

    let mut file = fs::File::create(&temp_path)
        .await
        .map_err(|e| StorageError::file_io(&temp_path, e))?;
    file.write_all(data)
        .await
        .map_err(|e| StorageError::file_io(&temp_path, e))?;
    file.sync_all()
        .await
        .map_err(|e| StorageError::file_io(&temp_path, e))?;
    fs::rename(&temp_path, final_path)
        .await
        .map_err(|e| StorageError::file_io(final_path, e))?;
    Ok(())
}
