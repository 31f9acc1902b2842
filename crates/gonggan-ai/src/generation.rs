//! Generation contracts
//!
//! The text collaborator answers with a lazy, finite, non-restartable stream
//! of [`ResponseFragment`]s. The image collaborator answers with one image or
//! an explicit absence.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;
use gonggan_models::{ImageData, Message, SpaceFile};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";

/// Upper bound on reference images sent with one image request.
pub const MAX_REFERENCE_IMAGES: usize = 7;

/// One source entry attached to a response.
///
/// Entries missing either field are dropped when sources are rendered.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Citation {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Citation {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            url: Some(url.into()),
        }
    }
}

/// A text delta plus the citation set seen with it, if any.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResponseFragment {
    pub text: String,
    pub citations: Option<Vec<Citation>>,
}

impl ResponseFragment {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            citations: None,
        }
    }

    pub fn with_citations(mut self, citations: Vec<Citation>) -> Self {
        self.citations = Some(citations);
        self
    }
}

pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<ResponseFragment>> + Send>>;

/// Everything a text backend needs for one turn.
#[derive(Debug, Clone, Default)]
pub struct TextRequest {
    pub prompt: String,
    /// Text the user quoted into this turn.
    pub quoted_context: Option<String>,
    /// Persistent space files, in space order.
    pub context_files: Vec<Arc<SpaceFile>>,
    pub instructions: String,
    pub web_search_enabled: bool,
    /// Messages preceding this turn; backends keep only the most recent ones.
    pub history: Vec<Arc<Message>>,
    /// Per-turn attachments that are not persisted in the space.
    pub attachments: Vec<SpaceFile>,
    pub model: String,
}

impl TextRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: DEFAULT_TEXT_MODEL.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    pub aspect_ratio: String,
    pub quality: String,
    pub model: String,
    pub reference_images: Vec<ImageData>,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            aspect_ratio: "1:1".to_string(),
            quality: "1K".to_string(),
            model: DEFAULT_IMAGE_MODEL.to_string(),
            reference_images: Vec::new(),
        }
    }
}

/// Streaming text generation backend
pub trait TextGenerator: Send + Sync {
    fn provider(&self) -> &str;

    /// Start a response stream. Failures surface as stream items.
    fn stream_text(&self, request: TextRequest) -> FragmentStream;
}

/// Image generation backend
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    fn provider(&self) -> &str;

    /// Generate one image. `Ok(None)` means the backend produced no image.
    async fn generate_image(&self, request: ImageRequest) -> Result<Option<ImageData>>;
}
