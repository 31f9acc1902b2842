//! Image studio: batch generation into a space's gallery.

use std::sync::Arc;

use futures::future::join_all;
use gonggan_ai::{ImageGenerator, ImageRequest, MAX_REFERENCE_IMAGES};
use gonggan_models::{GeneratedImage, ImageData, ImageStatus};
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError, ValidationError};
use crate::store::SpaceStore;

/// Most images one batch may request.
pub const MAX_BATCH_SIZE: usize = 4;

#[derive(Debug, Clone)]
pub struct ImageBatchRequest {
    pub prompt: String,
    pub aspect_ratio: String,
    pub quality: String,
    pub count: usize,
    /// Overrides the configured image model.
    pub model: Option<String>,
    pub reference_images: Vec<ImageData>,
}

impl ImageBatchRequest {
    pub fn new(prompt: impl Into<String>, count: usize) -> Self {
        Self {
            prompt: prompt.into(),
            aspect_ratio: "1:1".to_string(),
            quality: "1K".to_string(),
            count,
            model: None,
            reference_images: Vec::new(),
        }
    }

    pub fn with_aspect_ratio(mut self, ratio: impl Into<String>) -> Self {
        self.aspect_ratio = ratio.into();
        self
    }

    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = quality.into();
        self
    }

    pub fn with_references(mut self, images: Vec<ImageData>) -> Self {
        self.reference_images = images;
        self
    }

    /// Rejects the request before anything is written.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.count == 0 || self.count > MAX_BATCH_SIZE {
            return Err(ValidationError::InvalidImageCount {
                count: self.count,
                max: MAX_BATCH_SIZE,
            });
        }
        if self.reference_images.len() > MAX_REFERENCE_IMAGES {
            return Err(ValidationError::TooManyReferenceImages {
                count: self.reference_images.len(),
                max: MAX_REFERENCE_IMAGES,
            });
        }
        Ok(())
    }
}

/// Final state of one placeholder in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub image_id: String,
    pub status: ImageStatus,
}

pub struct ImageStudio {
    store: Arc<SpaceStore>,
    generator: Arc<dyn ImageGenerator>,
    default_model: String,
}

impl ImageStudio {
    pub fn new(
        store: Arc<SpaceStore>,
        generator: Arc<dyn ImageGenerator>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            store,
            generator,
            default_model: default_model.into(),
        }
    }

    /// Insert `count` placeholders, then generate them concurrently.
    ///
    /// Each request settles only its own placeholder, so one failure leaves
    /// the rest of the batch untouched. Items come back in placeholder order.
    pub async fn generate_batch(
        &self,
        space_id: &str,
        request: ImageBatchRequest,
    ) -> Result<Vec<BatchItem>> {
        request.validate()?;

        let placeholders: Vec<GeneratedImage> = (0..request.count)
            .map(|_| {
                GeneratedImage::placeholder(
                    request.prompt.clone(),
                    request.aspect_ratio.clone(),
                    request.quality.clone(),
                )
            })
            .collect();
        let ids = self.store.insert_image_placeholders(space_id, placeholders)?;
        info!(
            space_id,
            count = ids.len(),
            references = request.reference_images.len(),
            "Image batch started"
        );

        let image_request = ImageRequest {
            prompt: request.prompt,
            aspect_ratio: request.aspect_ratio,
            quality: request.quality,
            model: request.model.unwrap_or_else(|| self.default_model.clone()),
            reference_images: request.reference_images,
        };

        let runs = ids
            .into_iter()
            .map(|image_id| self.generate_one(space_id, image_id, image_request.clone()));
        let items = join_all(runs).await;

        let completed = items
            .iter()
            .filter(|i| i.status == ImageStatus::Completed)
            .count();
        info!(space_id, completed, total = items.len(), "Image batch finished");
        Ok(items)
    }

    async fn generate_one(
        &self,
        space_id: &str,
        image_id: String,
        request: ImageRequest,
    ) -> BatchItem {
        let image = match self.generator.generate_image(request).await {
            Ok(Some(image)) => Some(image),
            Ok(None) => {
                warn!(space_id, image_id = %image_id, "No image returned");
                None
            }
            Err(e) => {
                warn!(space_id, image_id = %image_id, error = %e, "Image generation failed");
                None
            }
        };
        let status = if image.is_some() {
            ImageStatus::Completed
        } else {
            ImageStatus::Failed
        };

        if let Err(e) = self.store.resolve_image(space_id, &image_id, image) {
            // Deleted while generating.
            debug!(space_id, image_id = %image_id, error = %e, "Placeholder not resolved");
            return BatchItem {
                image_id,
                status: ImageStatus::Failed,
            };
        }
        BatchItem { image_id, status }
    }

    /// A completed gallery image, ready to send back as a reference.
    pub fn reference_from_gallery(
        &self,
        space_id: &str,
        image_id: &str,
    ) -> Result<Option<ImageData>> {
        let space = self.store.space(space_id)?;
        let image = space
            .image(image_id)
            .ok_or_else(|| StoreError::ImageNotFound(image_id.to_string()))?;
        Ok(image.image.clone())
    }
}
