use std::path::PathBuf;

use thiserror::Error;

/// Main error type for dingdex operations
#[derive(Error, Debug)]
pub enum DingdexError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store error: {0}")]
    Store(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("bad UTF-8 sequence at byte offset {0}")]
    BadSequence(usize),

    #[error("incomplete UTF-8 sequence at byte offset {0}")]
    IncompleteSequence(usize),

    #[error("no dictionary installed under {0}")]
    NotInstalled(PathBuf),

    #[error("index is not usable: {0}")]
    CorruptIndex(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type alias for dingdex operations
pub type Result<T> = std::result::Result<T, DingdexError>;

impl DingdexError {
    /// Check if this error reports malformed UTF-8 in the input data
    pub fn is_encoding(&self) -> bool {
        matches!(
            self,
            DingdexError::BadSequence(_) | DingdexError::IncompleteSequence(_)
        )
    }
}
