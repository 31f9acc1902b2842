//! Error types for store edits, user input and the operations built on them.

use gonggan_ai::AiError;
use gonggan_storage::ArchiveError;
use thiserror::Error;

/// A path-scoped update addressed something that does not exist, or could
/// not be applied. The collection is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Space not found: {0}")]
    SpaceNotFound(String),

    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Image not found: {0}")]
    ImageNotFound(String),

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Image {0} has already been resolved")]
    ImageAlreadySettled(String),

    #[error("Message {0} already exists in this thread")]
    DuplicateMessage(String),

    #[error("Message {0} cannot be streaming: only AI text replies stream")]
    StreamingNotAllowed(String),
}

/// User input rejected before any state changes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("At most {max} reference images are allowed, got {count}")]
    TooManyReferenceImages { count: usize, max: usize },

    #[error("Image count must be between 1 and {max}, got {count}")]
    InvalidImageCount { count: usize, max: usize },

    #[error("The first message of a thread cannot be regenerated")]
    NothingToRegenerate,

    #[error("Message {0} is not an AI reply")]
    NotAnAiReply(String),

    #[error("Message is empty")]
    EmptyMessage,
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Ai(#[from] AiError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
