//! Error types for token parsing and reconciliation.

use std::path::PathBuf;

/// Errors that can occur while reading tokens or building a change-set.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A color string matched none of the supported notations.
    #[error("invalid color format: {0}")]
    InvalidColorFormat(String),

    /// Two modifiable collections in the remote snapshot share a name.
    #[error("duplicate variable collection in file: {0}")]
    DuplicateCollectionName(String),

    /// A token file is not valid JSON.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A node carried `$value` but is not a well-formed token.
    #[error("invalid token '{path}': {detail}")]
    InvalidToken { path: String, detail: String },

    /// A token file or directory does not exist.
    #[error("not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// I/O error reading or writing token files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, SyncError>;
