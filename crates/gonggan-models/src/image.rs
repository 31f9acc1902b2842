//! Image payloads and generated gallery images.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
#[cfg(feature = "ts")]
use ts_rs::TS;

pub const PNG_MIME: &str = "image/png";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("not a data URL")]
    MissingScheme,

    #[error("data URL is not base64 encoded")]
    NotBase64,

    #[error("invalid base64 payload: {0}")]
    Decode(String),
}

/// Decoded image bytes plus their MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    pub mime_type: String,
    #[serde(with = "crate::encoding::base64_bytes")]
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub bytes: Vec<u8>,
}

impl ImageData {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn png(bytes: Vec<u8>) -> Self {
        Self::new(PNG_MIME, bytes)
    }

    /// Render as `data:<mime>;base64,<payload>`.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            STANDARD.encode(&self.bytes)
        )
    }

    /// Parse a `data:` URL. A missing MIME type falls back to PNG.
    pub fn from_data_url(url: &str) -> Result<Self, DataUrlError> {
        let rest = url.strip_prefix("data:").ok_or(DataUrlError::MissingScheme)?;
        let (header, payload) = rest.split_once(',').ok_or(DataUrlError::NotBase64)?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or(DataUrlError::NotBase64)?;
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| DataUrlError::Decode(e.to_string()))?;
        let mime = if mime.is_empty() { PNG_MIME } else { mime };
        Ok(Self::new(mime, bytes))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum ImageStatus {
    #[default]
    Generating,
    Completed,
    Failed,
}

impl ImageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageStatus::Generating => "generating",
            ImageStatus::Completed => "completed",
            ImageStatus::Failed => "failed",
        }
    }
}

/// Gallery image produced by the image studio.
///
/// Created as a `generating` placeholder and settled exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub id: String,
    #[serde(default)]
    pub image: Option<ImageData>,
    pub prompt: String,
    pub aspect_ratio: String,
    pub quality: String,
    pub created_at: DateTime<Utc>,
    pub status: ImageStatus,
}

impl GeneratedImage {
    pub fn placeholder(
        prompt: impl Into<String>,
        aspect_ratio: impl Into<String>,
        quality: impl Into<String>,
    ) -> Self {
        Self {
            id: crate::new_id(),
            image: None,
            prompt: prompt.into(),
            aspect_ratio: aspect_ratio.into(),
            quality: quality.into(),
            created_at: crate::now(),
            status: ImageStatus::Generating,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.status != ImageStatus::Generating
    }

    /// Settle as completed. Returns false if the image was already settled.
    pub fn complete(&mut self, image: ImageData) -> bool {
        if self.is_settled() {
            return false;
        }
        self.image = Some(image);
        self.status = ImageStatus::Completed;
        true
    }

    /// Settle as failed. Returns false if the image was already settled.
    pub fn fail(&mut self) -> bool {
        if self.is_settled() {
            return false;
        }
        self.status = ImageStatus::Failed;
        true
    }
}
