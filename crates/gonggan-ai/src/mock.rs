//! Deterministic mock generators for tests and offline demos.

use std::collections::VecDeque;
use std::sync::Arc;

use async_stream::try_stream;
use async_trait::async_trait;
use gonggan_models::ImageData;
use tokio::sync::Mutex;
use tokio::time::{Duration, sleep};

use crate::error::{AiError, Result};
use crate::generation::{
    Citation, FragmentStream, ImageGenerator, ImageRequest, ResponseFragment, TextGenerator,
    TextRequest,
};

/// One scripted stream item.
#[derive(Debug, Clone)]
pub enum MockStep {
    Fragment(ResponseFragment),
    /// Fail the stream at this point.
    Error(String),
}

impl MockStep {
    pub fn text(text: impl Into<String>) -> Self {
        MockStep::Fragment(ResponseFragment::text(text))
    }

    pub fn cited(text: impl Into<String>, citations: Vec<Citation>) -> Self {
        MockStep::Fragment(ResponseFragment::text(text).with_citations(citations))
    }

    pub fn error(message: impl Into<String>) -> Self {
        MockStep::Error(message.into())
    }
}

/// A text generator that replays one scripted response per call.
///
/// Calls beyond the script echo the prompt back as a single fragment.
#[derive(Debug, Clone, Default)]
pub struct MockTextGenerator {
    responses: Arc<Mutex<VecDeque<Vec<MockStep>>>>,
    requests: Arc<Mutex<Vec<TextRequest>>>,
    delay_ms: u64,
}

impl MockTextGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_responses(responses: Vec<Vec<MockStep>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            ..Self::default()
        }
    }

    /// Pause between fragments, to interleave with other work.
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub async fn push_response(&self, steps: Vec<MockStep>) {
        self.responses.lock().await.push_back(steps);
    }

    /// Requests received so far, in call order.
    pub async fn requests(&self) -> Vec<TextRequest> {
        self.requests.lock().await.clone()
    }
}

impl TextGenerator for MockTextGenerator {
    fn provider(&self) -> &str {
        "mock"
    }

    fn stream_text(&self, request: TextRequest) -> FragmentStream {
        let generator = self.clone();
        Box::pin(try_stream! {
            let echo = format!("mock-echo: {}", request.prompt);
            generator.requests.lock().await.push(request);
            let steps = generator
                .responses
                .lock()
                .await
                .pop_front()
                .unwrap_or_else(|| vec![MockStep::text(echo)]);

            for step in steps {
                if generator.delay_ms > 0 {
                    sleep(Duration::from_millis(generator.delay_ms)).await;
                }
                match step {
                    MockStep::Fragment(fragment) => yield fragment,
                    MockStep::Error(message) => Err::<(), _>(AiError::Llm(message))?,
                }
            }
        })
    }
}

/// Scripted outcome of one image request.
#[derive(Debug, Clone)]
pub struct MockImageStep {
    pub delay_ms: u64,
    pub outcome: std::result::Result<Option<ImageData>, String>,
}

impl MockImageStep {
    pub fn image(image: ImageData) -> Self {
        Self {
            delay_ms: 0,
            outcome: Ok(Some(image)),
        }
    }

    pub fn absent() -> Self {
        Self {
            delay_ms: 0,
            outcome: Ok(None),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            delay_ms: 0,
            outcome: Err(message.into()),
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

/// An image generator that answers calls from a script, in call order.
#[derive(Debug, Clone, Default)]
pub struct MockImageGenerator {
    script: Arc<Mutex<VecDeque<MockImageStep>>>,
    requests: Arc<Mutex<Vec<ImageRequest>>>,
}

impl MockImageGenerator {
    pub fn from_steps(steps: Vec<MockImageStep>) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::from(steps))),
            requests: Arc::default(),
        }
    }

    pub async fn requests(&self) -> Vec<ImageRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    fn provider(&self) -> &str {
        "mock"
    }

    async fn generate_image(&self, request: ImageRequest) -> Result<Option<ImageData>> {
        self.requests.lock().await.push(request);
        let step = self.script.lock().await.pop_front();
        let Some(step) = step else {
            return Ok(None);
        };

        if step.delay_ms > 0 {
            sleep(Duration::from_millis(step.delay_ms)).await;
        }

        step.outcome.map_err(AiError::Llm)
    }
}
