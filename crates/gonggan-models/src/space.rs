use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "ts")]
use ts_rs::TS;

use crate::{GeneratedImage, Note, SpaceFile, Thread};

pub const DEFAULT_SPACE_TITLE: &str = "새로운 공간";

/// One workspace and everything it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Space {
    pub id: String,
    pub title: String,
    pub description: String,
    pub last_active: DateTime<Utc>,
    pub is_private: bool,
    /// System persona sent with every generation request.
    pub instructions: String,
    pub web_search_enabled: bool,
    #[serde(default)]
    pub files: Vec<Arc<SpaceFile>>,
    #[serde(default)]
    pub threads: Vec<Arc<Thread>>,
    #[serde(default)]
    pub generated_images: Vec<Arc<GeneratedImage>>,
    #[serde(default)]
    pub notes: Vec<Arc<Note>>,
}

impl Space {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: crate::new_id(),
            title: title.into(),
            description: String::new(),
            last_active: crate::now(),
            is_private: true,
            instructions: String::new(),
            web_search_enabled: true,
            files: Vec::new(),
            threads: Vec::new(),
            generated_images: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn thread(&self, thread_id: &str) -> Option<&Arc<Thread>> {
        self.threads.iter().find(|t| t.id == thread_id)
    }

    pub fn file(&self, file_id: &str) -> Option<&Arc<SpaceFile>> {
        self.files.iter().find(|f| f.id == file_id)
    }

    pub fn image(&self, image_id: &str) -> Option<&Arc<GeneratedImage>> {
        self.generated_images.iter().find(|i| i.id == image_id)
    }

    pub fn note(&self, note_id: &str) -> Option<&Arc<Note>> {
        self.notes.iter().find(|n| n.id == note_id)
    }
}

impl Default for Space {
    fn default() -> Self {
        Self::new(DEFAULT_SPACE_TITLE)
    }
}
