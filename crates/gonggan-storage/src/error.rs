//! Archive error types

use thiserror::Error;

/// Errors that abort an export or an import as a whole.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Invalid Gonggan file: missing metadata")]
    MissingMetadata,

    #[error("Malformed archive entry {entry}: {source}")]
    MalformedEntry {
        entry: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Not a .gonggan file: {0}")]
    InvalidExtension(String),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result type alias for archive operations
pub type Result<T> = std::result::Result<T, ArchiveError>;
