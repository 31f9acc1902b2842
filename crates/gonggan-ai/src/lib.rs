//! Gonggan AI - generation collaborators
//!
//! This crate provides:
//! - The text generation contract: a request and a lazy stream of response fragments
//! - The image generation contract with aspect-ratio normalization
//! - Prompt assembly shared by every text backend
//! - A Gemini REST client and scripted mock generators

pub mod aspect_ratio;
pub mod error;
pub mod gemini;
pub mod generation;
mod http_client;
pub mod mock;
pub mod prompt;
mod sse;

pub use aspect_ratio::normalize_aspect_ratio;
pub use error::{AiError, Result};
pub use gemini::GeminiClient;
pub use generation::{
    Citation, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL, FragmentStream, ImageGenerator,
    ImageRequest, MAX_REFERENCE_IMAGES, ResponseFragment, TextGenerator, TextRequest,
};
pub use mock::{MockImageGenerator, MockImageStep, MockStep, MockTextGenerator};
pub use prompt::{HISTORY_LIMIT, PromptPart, build_prompt_parts};
