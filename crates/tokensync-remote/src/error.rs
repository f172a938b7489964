//! Remote backend error types.

use tokensync_core::SyncError;

/// Errors that can occur while talking to a variables store.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("variables API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The access token environment variable is not set.
    #[error("access token not set: export {var}")]
    MissingToken { var: String },

    /// The local store has no snapshot for this file.
    #[error("no local snapshot for file '{file_key}'")]
    SnapshotNotFound { file_key: String },

    /// A change refers to an id that is neither real nor created earlier in the change-set.
    #[error("unknown id '{id}' in change-set")]
    UnknownTempId { id: String },

    /// A change cannot be applied as written.
    #[error("invalid change: {detail}")]
    InvalidChange { detail: String },

    /// Token or reconciliation error.
    #[error(transparent)]
    Core(#[from] SyncError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for remote operations.
pub type Result<T> = std::result::Result<T, RemoteError>;
