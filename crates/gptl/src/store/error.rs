//! Storage error types.

use std::path::{Path, PathBuf};

use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

/// Errors from reading or writing conversation files.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("history file {path}: {source}")]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse history file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("failed to serialize history: {0}")]
    Serialize(String),

    #[error("invalid history name: {0:?}")]
    InvalidKey(String),

    #[error("template not found: {0}")]
    TemplateNotFound(PathBuf),
}

impl StorageError {
    pub fn file_io(path: &Path, source: std::io::Error) -> Self {
        Self::FileIo {
            path: path.to_path_buf(),
            source,
        }
    }
}
