//! Gonggan Core - spaces, conversations and the image studio
//!
//! [`GongganCore`] wires the [`store::SpaceStore`] to the generation
//! collaborators. Every edit goes through the store, so observers only ever
//! see whole, consistent snapshots.

pub mod config;
pub mod conversation;
pub mod error;
pub mod gallery;
pub mod paths;
pub mod services;
pub mod store;

use std::sync::Arc;

use gonggan_ai::{
    GeminiClient, ImageGenerator, MockImageGenerator, MockTextGenerator, TextGenerator,
};
use tracing::info;

pub use config::GongganConfig;
pub use conversation::{ChatCoordinator, ChatMode, ChatSettings, SendOutcome, SendRequest};
pub use error::{CoreError, Result, StoreError, ValidationError};
pub use gallery::{BatchItem, ImageBatchRequest, ImageStudio};
pub use store::{SpaceCollection, SpaceStore};

/// Application state shared by every front end.
pub struct GongganCore {
    pub config: GongganConfig,
    pub store: Arc<SpaceStore>,
    pub chat: ChatCoordinator,
    pub studio: ImageStudio,
}

impl GongganCore {
    pub fn new(
        config: GongganConfig,
        text_generator: Arc<dyn TextGenerator>,
        image_generator: Arc<dyn ImageGenerator>,
    ) -> Self {
        let store = Arc::new(SpaceStore::default());
        let chat = ChatCoordinator::new(
            store.clone(),
            text_generator.clone(),
            image_generator.clone(),
            ChatSettings::from(&config),
        );
        let studio = ImageStudio::new(store.clone(), image_generator, config.image_model.clone());

        info!(
            text_provider = text_generator.provider(),
            text_model = %config.text_model,
            image_model = %config.image_model,
            "Initializing Gonggan"
        );

        Self {
            config,
            store,
            chat,
            studio,
        }
    }

    /// Use the Gemini API for both text and images.
    pub fn with_gemini(config: GongganConfig) -> Self {
        let mut client = GeminiClient::new(config.gemini.api_key.clone());
        if let Some(url) = &config.gemini.base_url {
            client = client.with_base_url(url.clone());
        }
        let client = Arc::new(client);
        Self::new(config, client.clone(), client)
    }

    /// Offline mode backed by the scripted mock generators.
    pub fn with_mocks(config: GongganConfig) -> Self {
        Self::new(
            config,
            Arc::new(MockTextGenerator::new()),
            Arc::new(MockImageGenerator::default()),
        )
    }
}
