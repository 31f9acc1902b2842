//! Gonggan Models - shared entity shapes
//!
//! A [`Space`] exclusively owns its files, threads, generated images and
//! notes. Children are held behind `Arc` so that path-scoped updates can
//! replace a single branch and keep every untouched sibling pointer-equal to
//! the previous snapshot.

use chrono::{DateTime, SubsecRound, Utc};

mod encoding;
mod file;
mod image;
mod message;
mod note;
mod space;
mod thread;

pub use encoding::base64_bytes;
pub use file::{FileKind, SpaceFile, infer_file_kind, size_label};
pub use image::{DataUrlError, GeneratedImage, ImageData, ImageStatus, PNG_MIME};
pub use message::{
    ContentKind, Message, MessageContent, QUESTION_LABEL, QUOTED_CONTEXT_LABEL, Sender,
    compose_quoted_text,
};
pub use note::Note;
pub use space::{DEFAULT_SPACE_TITLE, Space};
pub use thread::Thread;

/// Mint a fresh opaque identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current time, truncated to the millisecond precision archives store.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
